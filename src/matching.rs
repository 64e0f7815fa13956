//! Fuzzy card-name matching against a set's card listing
//!
//! Pure functions over normalized strings so the ranking is unit-testable
//! without network access. Tie-break rule: the shortest normalized name wins,
//! which favors the base printing over alternate-art variants unless the
//! query text names the variant.

use crate::api::CardResume;

/// Normalize a card name for comparison: case-fold, drop punctuation,
/// collapse whitespace.
pub fn normalize_card_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        if c.is_alphanumeric() {
            out.push(c);
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove parenthetical qualifiers: "Charizard ex (Alt Art)" -> "Charizard ex"
pub fn strip_qualifiers(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0u32;
    for c in name.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Collector numbers compare numerically when possible so "057" matches "57"
fn number_eq(local_id: &str, hint: &str) -> bool {
    let a = local_id.trim().trim_start_matches('0');
    let b = hint.trim().trim_start_matches('0');
    !b.is_empty() && a.eq_ignore_ascii_case(b)
}

/// Loose agreement check used to confirm a number-hint hit: the first word
/// of the query name must appear in the candidate's name.
fn names_agree(query: &str, candidate: &str) -> bool {
    let query_norm = normalize_card_name(query);
    let candidate_norm = normalize_card_name(candidate);
    match query_norm.split_whitespace().next() {
        Some(first) => candidate_norm.contains(first),
        None => false,
    }
}

/// Find the best-matching card for a collection entry within a set listing.
///
/// Ranking:
/// 1. collector-number hint, confirmed by loose name agreement
/// 2. exact normalized name (qualifiers included, then stripped)
/// 3. substring containment either direction, shortest name first
pub fn find_best_match<'a>(
    card_name: &str,
    number_hint: &str,
    cards: &'a [CardResume],
) -> Option<&'a CardResume> {
    if !number_hint.is_empty() {
        if let Some(card) = cards.iter().find(|c| number_eq(&c.local_id, number_hint)) {
            if names_agree(card_name, &card.name) {
                return Some(card);
            }
            log::debug!(
                "Number {} matched {} but name disagrees with {:?}, falling back",
                number_hint,
                card.name,
                card_name
            );
        }
    }

    let full = normalize_card_name(card_name);
    if full.is_empty() {
        return None;
    }
    let base = normalize_card_name(&strip_qualifiers(card_name));

    for query in [full.as_str(), base.as_str()] {
        if query.is_empty() {
            continue;
        }
        if let Some(card) = cards
            .iter()
            .find(|c| normalize_card_name(&c.name) == query)
        {
            return Some(card);
        }
    }

    let mut candidates: Vec<(&CardResume, String)> = cards
        .iter()
        .map(|c| (c, normalize_card_name(&c.name)))
        .filter(|(_, norm)| {
            !norm.is_empty() && (full.contains(norm.as_str()) || norm.contains(base.as_str()))
        })
        .collect();

    candidates.sort_by(|(a, a_norm), (b, b_norm)| {
        a_norm
            .len()
            .cmp(&b_norm.len())
            .then_with(|| a.local_id.cmp(&b.local_id))
    });

    candidates.first().map(|(card, _)| *card)
}
