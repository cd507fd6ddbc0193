// src/models/item.rs

//! The persisted, searchable catalog entity.
//!
//! An item is derived from an accepted listing and carries regenerable
//! fields (tags, slug, searchable string, picture URLs) next to the copied
//! sale payload. Regeneration reruns the derivations after a create or a
//! field update.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::curation::Curator;
use crate::models::{Listing, SaleListing};
use crate::tagger::Tree;
use crate::utils::{cleanup_string, collapse_whitespace, decode_html_text, fold_ascii};

/// A catalog item derived from an accepted listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Generated identifier, prefixed with the source name
    pub item_id: String,

    /// Unique secondary key: at most one live item per native URL
    pub native_url: String,

    /// Source marketplace identifier
    pub source: String,

    pub date_created: DateTime<Utc>,
    pub date_last_check: DateTime<Utc>,

    /// Classification tags, sorted and deduplicated
    #[serde(default)]
    pub tags: Vec<String>,

    /// URL-safe identifier built from title, price, currency and item id
    #[serde(default)]
    pub slug: String,

    /// Flattened text blob fed to the search index
    #[serde(default)]
    pub searchable_string: String,

    #[serde(default = "default_display_priority")]
    pub display_priority: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_url_w200: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_url_w400: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_url_w600: Option<String>,

    /// The copied sale payload
    pub sale: SaleListing,
}

fn default_display_priority() -> i32 {
    1
}

/// Outcome of merging an updated listing into an existing item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Any mutable field changed
    pub changed: bool,
    /// The native picture URL changed; picture derivatives need a refresh
    pub picture_changed: bool,
}

impl Item {
    /// Allocate a new item from an accepted listing. Derived fields start
    /// empty; call [`Item::regenerate`] before persisting.
    pub fn from_listing(listing: &Listing, item_id: String) -> Self {
        let mut sale = listing.sale().clone();
        if sale.price_is_fixed.is_none() {
            sale.price_is_fixed = Some(false);
        }
        let now = Utc::now();
        Self {
            item_id,
            native_url: listing.native_url.clone(),
            source: listing.source.clone(),
            date_created: now,
            date_last_check: now,
            tags: Vec::new(),
            slug: String::new(),
            searchable_string: String::new(),
            display_priority: default_display_priority(),
            picture_url: None,
            picture_url_w200: None,
            picture_url_w400: None,
            picture_url_w600: None,
            sale,
        }
    }

    /// Recompute the derived fields: tags, slug and searchable string, and
    /// the picture URL variants when the picture changed.
    pub fn regenerate(&mut self, tree: &Tree, curator: &Curator, media_base: &str, update_picture: bool) {
        self.set_tags(tree, curator);
        self.slug = self.make_slug();
        self.searchable_string = self.make_searchable_string();
        if update_picture {
            self.set_picture_urls(media_base);
        }
    }

    /// Tag the item: tree tags plus, per matching category, the matched
    /// whitelist words and the upper-cased category name.
    pub fn set_tags(&mut self, tree: &Tree, curator: &Curator) {
        let text = self.sale.text();
        let language = self.sale.language.as_deref().unwrap_or_default();

        let mut tags: BTreeSet<String> = BTreeSet::new();
        for cat in curator.categories() {
            let words = cat.matching_words(&text, language);
            if !words.is_empty() {
                tags.extend(words);
                tags.insert(cat.name.to_uppercase());
            }
        }
        tags.extend(tree.matching_tags(&text, language));

        self.tags = tags.into_iter().collect();
        log::debug!("Tagged item {} with {:?}", self.item_id, self.tags);
    }

    /// Build the item's slug: transliterated title, price, currency and
    /// item id.
    pub fn make_slug(&self) -> String {
        let title = self.sale.title.as_deref().unwrap_or_default();
        let title = fold_ascii(&decode_html_text(title));
        let title = non_alnum_re()
            .replace_all(&title, "-")
            .trim_matches('-')
            .to_string();
        format!(
            "{}_{}_{}__{}",
            title,
            format_price(self.sale.price),
            self.sale.currency.as_deref().unwrap_or_default(),
            self.item_id
        )
    }

    /// Build the flattened text blob the search index consumes.
    pub fn make_searchable_string(&self) -> String {
        let sale = &self.sale;
        let mut parts: Vec<String> = vec![
            sale.title.as_deref().map(cleanup_string).unwrap_or_default(),
            sale.description
                .as_deref()
                .map(cleanup_string)
                .unwrap_or_default(),
            format!("SOURCE_{}", self.source.to_uppercase()),
            sale.location
                .as_deref()
                .map(cleanup_string)
                .unwrap_or_default(),
            format!("COUNTRY_{}", sale.country.as_deref().unwrap_or_default()),
            format!("CURRENCY_{}", sale.currency.as_deref().unwrap_or_default()),
            if sale.price_is_fixed == Some(true) {
                "FIXED_PRICE".to_string()
            } else {
                String::new()
            },
            sale.native_doc_id.clone().unwrap_or_default(),
            sale.native_seller_id.clone().unwrap_or_default(),
            sale.native_group_id.clone().unwrap_or_default(),
            self.item_id.clone(),
        ];
        for tag in &self.tags {
            parts.push(format!(":{}:", tag.to_uppercase()));
        }
        collapse_whitespace(&parts.join(" "))
    }

    /// Derive the picture URL and its resized variants from the media base.
    /// Resizing itself happens elsewhere; only the addresses are derived.
    pub fn set_picture_urls(&mut self, media_base: &str) {
        let base = media_base.trim_end_matches('/');
        self.picture_url = Some(format!("{base}/{}.jpg", self.item_id));
        self.picture_url_w200 = Some(format!("{base}/{}_w200.jpg", self.item_id));
        self.picture_url_w400 = Some(format!("{base}/{}_w400.jpg", self.item_id));
        self.picture_url_w600 = Some(format!("{base}/{}_w600.jpg", self.item_id));
    }

    /// Merge an updated listing payload into this item. The native URL is
    /// never updated. Returns what changed so the caller can decide whether
    /// to regenerate and persist.
    pub fn apply_update(&mut self, obj: &SaleListing) -> UpdateOutcome {
        let mut outcome = UpdateOutcome::default();

        merge(&mut self.sale.title, &obj.title, &mut outcome.changed);
        merge(
            &mut self.sale.description,
            &obj.description,
            &mut outcome.changed,
        );
        merge(&mut self.sale.price, &obj.price, &mut outcome.changed);
        merge(&mut self.sale.currency, &obj.currency, &mut outcome.changed);
        merge(&mut self.sale.language, &obj.language, &mut outcome.changed);
        merge(&mut self.sale.country, &obj.country, &mut outcome.changed);
        merge(&mut self.sale.location, &obj.location, &mut outcome.changed);
        merge(
            &mut self.sale.price_is_fixed,
            &obj.price_is_fixed,
            &mut outcome.changed,
        );
        merge(
            &mut self.sale.native_doc_id,
            &obj.native_doc_id,
            &mut outcome.changed,
        );
        merge(
            &mut self.sale.native_seller_id,
            &obj.native_seller_id,
            &mut outcome.changed,
        );
        merge(
            &mut self.sale.native_seller_name,
            &obj.native_seller_name,
            &mut outcome.changed,
        );
        merge(
            &mut self.sale.native_seller_is_shop,
            &obj.native_seller_is_shop,
            &mut outcome.changed,
        );
        merge(
            &mut self.sale.native_group_id,
            &obj.native_group_id,
            &mut outcome.changed,
        );

        if self.sale.native_picture_url != obj.native_picture_url {
            log::info!("Updating picture of item {}", self.item_id);
            self.sale.native_picture_url = obj.native_picture_url.clone();
            outcome.changed = true;
            outcome.picture_changed = true;
        }

        outcome
    }

    /// Mark the item as ended, copying sold details from the listing when
    /// present. A sold item without a sold date gets the end date.
    pub fn mark_as_ended(&mut self, update: &SaleListing) {
        log::info!("Marking item {} as ended", self.item_id);
        self.sale.has_ended = true;
        self.sale.date_ended = Some(Utc::now());

        if update.date_ended.is_some() {
            self.sale.date_ended = update.date_ended;
        }
        if update.is_sold.is_some() {
            self.sale.is_sold = update.is_sold;
        }
        if update.price_sold.is_some() {
            self.sale.price_sold = update.price_sold;
        }
        if update.date_sold.is_some() {
            self.sale.date_sold = update.date_sold;
        }

        if self.sale.is_sold == Some(true) && self.sale.date_sold.is_none() {
            self.sale.date_sold = self.sale.date_ended;
        }
    }
}

/// Shortest decimal rendering of the price; whole prices drop the fraction.
fn format_price(price: Option<f64>) -> String {
    price.map(|p| p.to_string()).unwrap_or_else(|| "0".to_string())
}

fn merge<T: Clone + PartialEq>(dst: &mut Option<T>, src: &Option<T>, changed: &mut bool) {
    if let Some(value) = src {
        if dst.as_ref() != Some(value) {
            *dst = Some(value.clone());
            *changed = true;
        }
    }
}

static NON_ALNUM: OnceLock<Regex> = OnceLock::new();

fn non_alnum_re() -> &'static Regex {
    NON_ALNUM.get_or_init(|| Regex::new("[^0-9a-zA-Z]+").expect("static regex"))
}
