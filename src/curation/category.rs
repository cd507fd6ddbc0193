// src/curation/category.rs

//! Acceptance categories.
//!
//! Categories are a coarse classification axis used only for accept/reject
//! decisions, independent of the tag tree. Each category couples currency
//! price windows with a whitelist and a blacklist.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::CategoryConfig;
use crate::tagger::KeywordList;

/// A currency-scoped price window.
#[derive(Debug, Clone)]
pub struct PriceRange {
    pub currency: String,
    pub min: f64,
    pub max: f64,
}

/// One acceptance category: price windows plus white/blacklist.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub prices: Vec<PriceRange>,
    pub whitelist: KeywordList,
    pub blacklist: KeywordList,
}

impl Category {
    /// Create a category from already-loaded parts.
    pub fn new(
        name: impl Into<String>,
        prices: Vec<PriceRange>,
        whitelist: KeywordList,
        blacklist: KeywordList,
    ) -> Self {
        Self {
            name: name.into(),
            prices,
            whitelist,
            blacklist,
        }
    }

    /// Load a declared category, resolving `<name>-whitelist` and
    /// `<name>-blacklist` resources in the lists directory.
    pub fn load(cfg: &CategoryConfig, lists_dir: &Path) -> Result<Self> {
        let whitelist = load_list(lists_dir, &format!("{}-whitelist", cfg.name))?;
        let blacklist = load_list(lists_dir, &format!("{}-blacklist", cfg.name))?;
        let prices = cfg
            .prices
            .iter()
            .map(|p| PriceRange {
                currency: p.currency.to_uppercase(),
                min: p.min,
                max: p.max,
            })
            .collect();
        Ok(Self::new(cfg.name.clone(), prices, whitelist, blacklist))
    }

    /// This category's price window for a currency, if it declares one.
    pub fn price_bounds(&self, currency: &str) -> Option<(f64, f64)> {
        self.prices
            .iter()
            .find(|p| p.currency.eq_ignore_ascii_case(currency))
            .map(|p| (p.min, p.max))
    }

    /// Whitelist words that match this text.
    pub fn matching_words(&self, text: &str, language: &str) -> Vec<String> {
        self.whitelist.matching_words(text, language)
    }
}

/// Find `<stem>.txt` or `<stem>.html` under the lists directory. A missing
/// list is a fatal configuration error.
pub(crate) fn load_list(dir: &Path, stem: &str) -> Result<KeywordList> {
    for ext in ["txt", "html"] {
        let path = dir.join(format!("{stem}.{ext}"));
        if path.exists() {
            return KeywordList::load(&path);
        }
    }
    Err(AppError::config(format!(
        "keyword list '{stem}' not found in {}",
        dir.display()
    )))
}
