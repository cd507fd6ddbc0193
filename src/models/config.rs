//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Curation rules: resource locations and category declarations
    #[serde(default)]
    pub curation: CurationConfig,

    /// Language-identification service settings
    #[serde(default)]
    pub language: LanguageConfig,

    /// Picture URL derivation settings
    #[serde(default)]
    pub media: MediaConfig,

    /// Listing processing behavior
    #[serde(default)]
    pub processing: ProcessingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.curation.categories.is_empty() {
            return Err(AppError::validation("No categories defined"));
        }
        let mut seen = std::collections::HashSet::new();
        for cat in &self.curation.categories {
            if cat.name.trim().is_empty() {
                return Err(AppError::validation("Category with empty name"));
            }
            if !seen.insert(cat.name.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate category '{}'",
                    cat.name
                )));
            }
            for price in &cat.prices {
                if price.min > price.max {
                    return Err(AppError::validation(format!(
                        "Category '{}' has min > max for {}",
                        cat.name, price.currency
                    )));
                }
            }
        }
        if self.language.default.trim().is_empty() {
            return Err(AppError::validation("language.default is empty"));
        }
        if self.language.timeout_secs == 0 {
            return Err(AppError::validation("language.timeout_secs must be > 0"));
        }
        if self.media.base_url.trim().is_empty() {
            return Err(AppError::validation("media.base_url is empty"));
        }
        if self.processing.max_concurrent == 0 {
            return Err(AppError::validation("processing.max_concurrent must be > 0"));
        }
        Ok(())
    }
}

/// Curation rule locations and category declarations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationConfig {
    /// Directory of white/blacklist resources, relative to the data dir
    #[serde(default = "defaults::lists_dir")]
    pub lists_dir: String,

    /// Directory of tag-graph resources, relative to the data dir
    #[serde(default = "defaults::tags_dir")]
    pub tags_dir: String,

    /// Categories in evaluation order. Order is significant: the first
    /// category accepting a listing wins.
    #[serde(default = "defaults::categories")]
    pub categories: Vec<CategoryConfig>,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            lists_dir: defaults::lists_dir(),
            tags_dir: defaults::tags_dir(),
            categories: defaults::categories(),
        }
    }
}

/// One declared acceptance category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Category name; also the stem of its list resources
    pub name: String,

    /// Currency price windows; currencies not listed here fall back to the
    /// built-in table
    #[serde(default)]
    pub prices: Vec<PriceRangeConfig>,
}

/// A declared currency price window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRangeConfig {
    pub currency: String,
    pub min: f64,
    pub max: f64,
}

/// Language-identification service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Identification endpoint URL; empty disables the HTTP client and the
    /// default language is assumed instead
    #[serde(default)]
    pub endpoint: String,

    /// Language assumed when no endpoint is configured
    #[serde(default = "defaults::default_language")]
    pub default: String,

    /// User-Agent header for service requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            default: defaults::default_language(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Picture URL derivation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Base URL under which item pictures and their resized variants live
    #[serde(default = "defaults::media_base_url")]
    pub base_url: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::media_base_url(),
        }
    }
}

/// Listing processing behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Maximum listings processed concurrently in a batch
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

mod defaults {
    use super::{CategoryConfig, PriceRangeConfig};

    pub fn lists_dir() -> String {
        "lists".into()
    }
    pub fn tags_dir() -> String {
        "tags".into()
    }

    pub fn default_language() -> String {
        "sv".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; catalog/1.0)".into()
    }
    pub fn timeout() -> u64 {
        10
    }

    pub fn media_base_url() -> String {
        "https://images.catalog.example".into()
    }

    pub fn max_concurrent() -> usize {
        4
    }

    fn sek(min: f64, max: f64) -> Vec<PriceRangeConfig> {
        vec![PriceRangeConfig {
            currency: "SEK".to_string(),
            min,
            max,
        }]
    }

    // Category defaults
    pub fn categories() -> Vec<CategoryConfig> {
        vec![
            CategoryConfig {
                name: "fashion".to_string(),
                prices: sek(699.0, 50_000.0),
            },
            CategoryConfig {
                name: "design".to_string(),
                prices: sek(800.0, 50_000.0),
            },
            CategoryConfig {
                name: "antiques".to_string(),
                prices: sek(800.0, 50_000.0),
            },
            CategoryConfig {
                name: "art".to_string(),
                prices: sek(800.0, 50_000.0),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_categories() {
        let mut config = Config::default();
        config.curation.categories.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_category() {
        let mut config = Config::default();
        let first = config.curation.categories[0].clone();
        config.curation.categories.push(first);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_price_window() {
        let mut config = Config::default();
        config.curation.categories[0].prices[0].min = 60_000.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.processing.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[curation]
lists_dir = "lists"

[[curation.categories]]
name = "fashion"

[[curation.categories.prices]]
currency = "SEK"
min = 699
max = 50000

[language]
default = "sv"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.curation.categories.len(), 1);
        assert_eq!(config.curation.categories[0].name, "fashion");
        assert_eq!(config.curation.categories[0].prices[0].min, 699.0);
        assert_eq!(config.language.default, "sv");
        // Unspecified sections fall back to defaults
        assert_eq!(config.processing.max_concurrent, 4);
    }
}
