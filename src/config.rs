// src/config.rs

//! Configuration and resource loading.
//!
//! Everything the engine needs is built once from a data directory at
//! startup: the TOML configuration, the tag tree and the curator. There is
//! no hidden global state; reloading edited resources means calling
//! [`load_all`] again and swapping the returned values in.

use std::path::Path;

use crate::curation::Curator;
use crate::error::{AppError, Result};
use crate::models::Config;
use crate::tagger::Tree;

/// Load configuration from a TOML file.
///
/// Falls back to defaults if loading fails.
pub fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).or_else(|e| {
        log::warn!("Failed to load config from {path:?}: {e}. Using defaults.");
        Ok(Config::default())
    })
}

/// Load and validate the whole startup bundle from a data directory:
/// `config.toml`, the tag resources and the curation lists.
pub fn load_all(base_path: &Path) -> Result<(Config, Tree, Curator)> {
    let config = load_config(&base_path.join("config.toml"))?;
    config
        .validate()
        .map_err(|e| AppError::config(format!("Invalid configuration: {e}")))?;

    let tree = Tree::load(&base_path.join(&config.curation.tags_dir))?;
    let curator = Curator::load(&config.curation, &base_path.join(&config.curation.lists_dir))?;

    Ok((config, tree, curator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_all_from_fixture_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let base = tmp.path();

        write(
            &base.join("config.toml"),
            r#"
[curation]
lists_dir = "lists"
tags_dir = "tags"

[[curation.categories]]
name = "fashion"

[[curation.categories.prices]]
currency = "SEK"
min = 699
max = 50000
"#,
        );

        let lists = base.join("lists");
        fs::create_dir_all(&lists).unwrap();
        write(&lists.join("sold.txt"), "sold\nsv:såld\n");
        write(&lists.join("blacklist.txt"), "fake\n");
        write(&lists.join("fashion-whitelist.txt"), "vuitton\nbag\n");
        write(&lists.join("fashion-blacklist.txt"), "replica\n");

        let tags = base.join("tags");
        fs::create_dir_all(&tags).unwrap();
        write(&tags.join("fashion.txt"), "fashion\n");
        write(
            &tags.join("bags.txt"),
            "# parents: fashion\n# grants: fashion\nbag\n",
        );

        let (config, tree, curator) = load_all(base).unwrap();
        assert_eq!(config.curation.categories.len(), 1);
        assert_eq!(tree.len(), 2);
        assert_eq!(curator.categories().len(), 1);
    }

    #[test]
    fn test_load_all_fails_on_missing_lists() {
        let tmp = tempfile::TempDir::new().unwrap();
        let base = tmp.path();
        fs::create_dir_all(base.join("tags")).unwrap();
        fs::create_dir_all(base.join("lists")).unwrap();
        // Default config validates, but the sold/blacklist resources are gone
        assert!(load_all(base).is_err());
    }
}
