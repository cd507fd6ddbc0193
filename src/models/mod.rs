// src/models/mod.rs

//! Domain models for the catalog engine.
//!
//! This module contains the configuration structures, the ephemeral
//! incoming listing and the persisted catalog item.

mod config;
mod item;
mod listing;

// Re-export all public types
pub use config::{
    CategoryConfig, Config, CurationConfig, LanguageConfig, MediaConfig, PriceRangeConfig,
    ProcessingConfig,
};
pub use item::{Item, UpdateOutcome};
pub use listing::{Listing, ListingPayload, SaleListing};
