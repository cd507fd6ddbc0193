// src/services/mod.rs

//! External service clients and small allocation helpers.

pub mod idgen;
pub mod language;

pub use idgen::generate_item_id;
pub use language::{HttpLanguageIdentifier, LanguageIdentifier, StaticLanguage};
