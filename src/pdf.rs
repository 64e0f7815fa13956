//! PDF catalog rendering
//!
//! Title page with store branding, then a 3x3 grid of card images for
//! enriched entries, then a plain table of the entries that have no image.

use std::collections::HashMap;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point,
};

use crate::config::StoreConfig;
use crate::enrich::EnrichmentResult;
use crate::models::SaleableEntry;

// US letter
const PAGE_W: f32 = 215.9;
const PAGE_H: f32 = 279.4;
const MARGIN: f32 = 15.0;

const GRID_COLS: usize = 3;
const GRID_ROWS: usize = 3;
const CELL_W: f32 = (PAGE_W - 2.0 * MARGIN) / GRID_COLS as f32;
const CELL_H: f32 = (PAGE_H - 2.0 * MARGIN) / GRID_ROWS as f32;
const IMAGE_H: f32 = CELL_H - 18.0;
const IMAGE_DPI: f32 = 300.0;

/// Options for one catalog rendering
#[derive(Debug, Clone)]
pub struct PdfOptions {
    pub title: String,
    pub show_prices: bool,
}

/// Generates PDF catalogs styled with the store configuration
pub struct PdfGenerator {
    config: StoreConfig,
}

impl PdfGenerator {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Render the catalog. Returns the output path and a list of non-fatal
    /// warnings (e.g. image files that could not be embedded).
    pub fn generate_catalog(
        &self,
        entries: &[SaleableEntry],
        results: &HashMap<String, EnrichmentResult>,
        options: &PdfOptions,
        output_path: &Path,
    ) -> Result<(PathBuf, Vec<String>)> {
        let mut warnings = Vec::new();

        let (doc, page1, layer1) =
            PdfDocument::new(&options.title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .context("Failed to load builtin font")?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .context("Failed to load builtin font")?;

        let title_layer = doc.get_page(page1).get_layer(layer1);
        self.draw_title_page(&title_layer, entries, options, &font, &font_bold, &mut warnings);

        // entries with a cached image go on grid pages, the rest in a table
        let (with_images, without_images): (Vec<&SaleableEntry>, Vec<&SaleableEntry>) =
            entries.iter().partition(|s| {
                results
                    .get(&s.entry.id)
                    .map(|r| r.is_enriched())
                    .unwrap_or(false)
            });

        for chunk in with_images.chunks(GRID_COLS * GRID_ROWS) {
            let (page, layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            let layer = doc.get_page(page).get_layer(layer);
            for (i, saleable) in chunk.iter().enumerate() {
                let col = i % GRID_COLS;
                let row = i / GRID_COLS;
                let x = MARGIN + col as f32 * CELL_W;
                // grid fills top-down
                let y = PAGE_H - MARGIN - (row + 1) as f32 * CELL_H;
                let Some(image_path) = results
                    .get(&saleable.entry.id)
                    .and_then(|r| r.image_path())
                else {
                    continue;
                };
                self.draw_card_cell(
                    &layer,
                    saleable,
                    image_path,
                    x,
                    y,
                    options.show_prices,
                    &font,
                    &font_bold,
                    &mut warnings,
                );
            }
        }

        if !without_images.is_empty() {
            self.draw_text_pages(&doc, &without_images, options.show_prices, &font, &font_bold);
        }

        doc.save(&mut std::io::BufWriter::new(
            std::fs::File::create(output_path)
                .with_context(|| format!("Failed to create {:?}", output_path))?,
        ))
        .context("Failed to write PDF")?;

        log::info!("Catalog written: {:?}", output_path);
        Ok((output_path.to_path_buf(), warnings))
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_title_page(
        &self,
        layer: &PdfLayerReference,
        entries: &[SaleableEntry],
        options: &PdfOptions,
        font: &IndirectFontRef,
        font_bold: &IndirectFontRef,
        warnings: &mut Vec<String>,
    ) {
        let mut y = PAGE_H - 50.0;

        if let Some(logo_path) = &self.config.logo_path {
            match embed_image(layer, logo_path, PAGE_W / 2.0 - 20.0, y - 30.0, 40.0, 30.0) {
                Ok(()) => y -= 40.0,
                Err(e) => warnings.push(format!("Could not embed logo: {}", e)),
            }
        }

        layer.use_text(&options.title, 22.0, Mm(MARGIN), Mm(y), font_bold);
        y -= 12.0;
        layer.use_text(&self.config.store_name, 14.0, Mm(MARGIN), Mm(y), font);
        y -= 8.0;
        layer.use_text(
            chrono::Local::now().format("%Y-%m-%d").to_string(),
            10.0,
            Mm(MARGIN),
            Mm(y),
            font,
        );
        y -= 16.0;

        layer.use_text(&self.config.welcome_message, 11.0, Mm(MARGIN), Mm(y), font);
        y -= 14.0;

        let total_copies: u32 = entries.iter().map(|s| s.quantity_for_sale).sum();
        layer.use_text(
            format!("{} cards ({} copies)", entries.len(), total_copies),
            10.0,
            Mm(MARGIN),
            Mm(y),
            font,
        );
        if options.show_prices {
            y -= 7.0;
            let total_value: f64 = entries.iter().map(|s| s.total_value()).sum();
            layer.use_text(
                format!("Total value: ${:.2}", total_value),
                10.0,
                Mm(MARGIN),
                Mm(y),
                font,
            );
        }
        y -= 16.0;

        layer.use_text(&self.config.contact_message, 10.0, Mm(MARGIN), Mm(y), font);
        y -= 10.0;
        for network in &self.config.social_networks {
            layer.use_text(
                format!("{}: {} ({})", network.platform, network.handle, network.url),
                9.0,
                Mm(MARGIN),
                Mm(y),
                font,
            );
            y -= 6.0;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_card_cell(
        &self,
        layer: &PdfLayerReference,
        saleable: &SaleableEntry,
        image_path: &Path,
        x: f32,
        y: f32,
        show_prices: bool,
        font: &IndirectFontRef,
        font_bold: &IndirectFontRef,
        warnings: &mut Vec<String>,
    ) {
        let image_y = y + CELL_H - IMAGE_H - 2.0;
        if let Err(e) = embed_image(layer, image_path, x + 2.0, image_y, CELL_W - 4.0, IMAGE_H) {
            warnings.push(format!(
                "Could not embed image for {}: {}",
                saleable.entry.product_name, e
            ));
        }

        let mut text_y = image_y - 4.0;
        layer.use_text(
            truncate(saleable.entry.card_name(), 28),
            7.0,
            Mm(x + 2.0),
            Mm(text_y),
            font_bold,
        );
        text_y -= 3.5;
        let number = saleable.entry.card_number();
        let set_line = if number.is_empty() {
            truncate(&saleable.entry.console_name, 34)
        } else {
            truncate(
                &format!("{} #{}", saleable.entry.console_name, number),
                34,
            )
        };
        layer.use_text(set_line, 6.0, Mm(x + 2.0), Mm(text_y), font);
        text_y -= 4.0;
        let qty_line = if show_prices {
            format!(
                "x{}  ${:.2}",
                saleable.quantity_for_sale,
                saleable.entry.price_dollars()
            )
        } else {
            format!("x{}", saleable.quantity_for_sale)
        };
        layer.use_text(qty_line, 8.0, Mm(x + 2.0), Mm(text_y), font_bold);
    }

    fn draw_text_pages(
        &self,
        doc: &printpdf::PdfDocumentReference,
        entries: &[&SaleableEntry],
        show_prices: bool,
        font: &IndirectFontRef,
        font_bold: &IndirectFontRef,
    ) {
        let mut remaining = entries;
        while !remaining.is_empty() {
            let (page, layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            let layer = doc.get_page(page).get_layer(layer);
            let mut y = PAGE_H - MARGIN - 10.0;

            layer.use_text("Cards without images", 14.0, Mm(MARGIN), Mm(y), font_bold);
            y -= 8.0;
            layer.use_text("Name", 9.0, Mm(MARGIN), Mm(y), font_bold);
            layer.use_text("Set", 9.0, Mm(95.0), Mm(y), font_bold);
            layer.use_text("Qty", 9.0, Mm(160.0), Mm(y), font_bold);
            if show_prices {
                layer.use_text("Price", 9.0, Mm(175.0), Mm(y), font_bold);
            }
            y -= 2.0;
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(MARGIN), Mm(y)), false),
                    (Point::new(Mm(PAGE_W - MARGIN), Mm(y)), false),
                ],
                is_closed: false,
            });
            y -= 6.0;

            let mut used = 0;
            for saleable in remaining {
                if y < MARGIN + 5.0 {
                    break;
                }
                layer.use_text(
                    truncate(saleable.entry.card_name(), 48),
                    9.0,
                    Mm(MARGIN),
                    Mm(y),
                    font,
                );
                layer.use_text(
                    truncate(&saleable.entry.console_name, 38),
                    9.0,
                    Mm(95.0),
                    Mm(y),
                    font,
                );
                layer.use_text(
                    saleable.quantity_for_sale.to_string(),
                    9.0,
                    Mm(160.0),
                    Mm(y),
                    font,
                );
                if show_prices {
                    layer.use_text(
                        format!("${:.2}", saleable.entry.price_dollars()),
                        9.0,
                        Mm(175.0),
                        Mm(y),
                        font,
                    );
                }
                y -= 6.0;
                used += 1;
            }
            remaining = &remaining[used..];
        }
    }
}

/// Embed an image file scaled to fit a box, preserving aspect ratio.
/// JPEG and PNG are supported, chosen by extension.
fn embed_image(
    layer: &PdfLayerReference,
    path: &Path,
    x: f32,
    y: f32,
    box_w: f32,
    box_h: f32,
) -> Result<()> {
    let file =
        std::fs::File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let mut reader = BufReader::new(file);

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let image = match ext.as_str() {
        "png" => Image::try_from(
            printpdf::image_crate::codecs::png::PngDecoder::new(&mut reader)
                .context("Failed to decode PNG")?,
        )
        .context("Unsupported PNG format")?,
        _ => Image::try_from(
            printpdf::image_crate::codecs::jpeg::JpegDecoder::new(&mut reader)
                .context("Failed to decode JPEG")?,
        )
        .context("Unsupported JPEG format")?,
    };

    let natural_w = px_to_mm(image.image.width.0);
    let natural_h = px_to_mm(image.image.height.0);
    let scale = (box_w / natural_w).min(box_h / natural_h);

    // center horizontally within the box
    let offset_x = (box_w - natural_w * scale) / 2.0;

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x + offset_x)),
            translate_y: Some(Mm(y)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
    Ok(())
}

fn px_to_mm(px: usize) -> f32 {
    px as f32 * 25.4 / IMAGE_DPI
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(2)).collect();
        format!("{}..", cut)
    }
}
