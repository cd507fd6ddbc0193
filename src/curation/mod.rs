// src/curation/mod.rs

//! The curation decision: is a listing sellable content worth publishing?
//!
//! Curation combines three layers of heuristics, in order: a global
//! "seems sold" list, a global blacklist, and an ordered set of acceptance
//! categories, each with its own price window, blacklist and whitelist.
//! The first category accepting the listing wins; category declaration
//! order is significant.

mod category;

use std::path::Path;

use log::debug;

use crate::error::{AppError, Result};
use crate::models::{CurationConfig, SaleListing};
use crate::tagger::KeywordList;

pub use category::{Category, PriceRange};

use category::load_list;

/// Curation strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurationMode {
    /// First-pass check on incomplete listings: whitelists are not enforced.
    Shallow,
    /// Full check on complete listings.
    Deep,
}

/// The curation rule set: global lists plus ordered categories.
#[derive(Debug, Clone)]
pub struct Curator {
    sold: KeywordList,
    blacklist: KeywordList,
    categories: Vec<Category>,
}

impl Curator {
    /// Create a curator from already-loaded parts.
    pub fn new(sold: KeywordList, blacklist: KeywordList, categories: Vec<Category>) -> Self {
        Self {
            sold,
            blacklist,
            categories,
        }
    }

    /// Load the global `sold` and `blacklist` lists plus every declared
    /// category from the lists directory.
    pub fn load(cfg: &CurationConfig, lists_dir: &Path) -> Result<Self> {
        let sold = load_list(lists_dir, "sold")?;
        let blacklist = load_list(lists_dir, "blacklist")?;
        let categories = cfg
            .categories
            .iter()
            .map(|c| Category::load(c, lists_dir))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(sold, blacklist, categories))
    }

    /// The categories, in declaration order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Does the text say the item is already sold?
    pub fn seems_sold(&self, text: &str, language: &str) -> bool {
        self.sold.matches(text, language)
    }

    /// Curate a listing. Sold listings are rejected.
    pub fn passes(&self, listing: &SaleListing, language: &str, mode: CurationMode) -> Result<bool> {
        self.passes_with(listing, language, mode, true)
    }

    /// Curate a listing, optionally keeping seemingly-sold ones.
    pub fn passes_with(
        &self,
        listing: &SaleListing,
        language: &str,
        mode: CurationMode,
        skip_sold: bool,
    ) -> Result<bool> {
        let text = listing.text();

        if skip_sold && self.seems_sold(&text, language) {
            debug!("Listing seems already sold");
            return Ok(false);
        }

        if self.blacklist.matches(&text, language) {
            debug!("Listing fails global blacklist check");
            return Ok(false);
        }

        let price = listing
            .price
            .ok_or_else(|| AppError::invalid_data("listing has no price"))?;
        let currency = listing
            .currency
            .as_deref()
            .ok_or_else(|| AppError::invalid_data("listing has no currency"))?;

        for cat in &self.categories {
            if !price_ok(price, currency, cat)? {
                debug!("Listing fails price check on category {}", cat.name);
                continue;
            }
            if cat.blacklist.matches(&text, language) {
                debug!("Listing fails blacklist check on category {}", cat.name);
                continue;
            }
            if mode == CurationMode::Deep && !cat.whitelist.matches(&text, language) {
                debug!("Listing fails whitelist check on category {}", cat.name);
                continue;
            }

            debug!("Listing passes all checks on category {}", cat.name);
            return Ok(true);
        }

        Ok(false)
    }
}

/// Check the price against the category's window, falling back to the
/// built-in per-currency table. A currency known to neither is a
/// configuration error. Prices whose decimal rendering contains the
/// literal "1234" are rejected as placeholder/fraud prices.
fn price_ok(price: f64, currency: &str, category: &Category) -> Result<bool> {
    let (min, max) = category
        .price_bounds(currency)
        .or_else(|| default_price_bounds(currency))
        .ok_or_else(|| {
            AppError::config(format!(
                "no price interval defined for currency {currency}"
            ))
        })?;

    if price < min {
        debug!("Price is under {min} {currency}");
        return Ok(false);
    }
    if price > max {
        debug!("Price is over {max} {currency}");
        return Ok(false);
    }
    if price.to_string().contains("1234") {
        debug!("Price contains 1234");
        return Ok(false);
    }

    Ok(true)
}

fn default_price_bounds(currency: &str) -> Option<(f64, f64)> {
    match currency.to_uppercase().as_str() {
        "SEK" => Some((400.0, 100_000.0)),
        "EUR" | "USD" | "GBP" => Some((40.0, 10_000.0)),
        _ => None,
    }
}
