//! External card database API client

pub mod tcgdex;

pub use tcgdex::{CardResume, SetDetail, SetResume, TcgdexClient};
