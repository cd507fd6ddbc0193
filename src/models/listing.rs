// src/models/listing.rs

//! Incoming scraped listings.
//!
//! A listing is ephemeral input: it is validated, classified and then
//! discarded after producing a lifecycle action. Only the derived
//! [`Item`](crate::models::Item) is ever persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::stores::ScrapeTask;

/// A scraped marketplace listing, prior to acceptance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Stable URL of the listing on its source site; the external identity key
    pub native_url: String,

    /// Whether the scraper has already fetched everything it ever will
    #[serde(default)]
    pub is_complete: bool,

    /// Source marketplace identifier (e.g. "blocket")
    pub source: String,

    /// Opaque scraper state handed back on a re-scrape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraper_data: Option<String>,

    /// The listing payload, one variant per supported subtype
    #[serde(flatten)]
    pub payload: ListingPayload,
}

/// Supported listing subtypes. Dispatch is exhaustive: adding a variant
/// forces every match site to handle it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ListingPayload {
    /// An item for sale
    #[serde(rename = "sale")]
    Sale(SaleListing),
}

impl Listing {
    /// The sale payload of this listing.
    pub fn sale(&self) -> &SaleListing {
        match &self.payload {
            ListingPayload::Sale(sale) => sale,
        }
    }

    /// Mutable access to the sale payload.
    pub fn sale_mut(&mut self) -> &mut SaleListing {
        match &mut self.payload {
            ListingPayload::Sale(sale) => sale,
        }
    }

    /// Make sure this listing carries all the data its completeness and
    /// sold state require. Violations are input-validation errors surfaced
    /// to the caller, never silently dropped.
    pub fn validate_for_processing(&self) -> Result<()> {
        if self.native_url.trim().is_empty() {
            return Err(AppError::invalid_data("listing has no native_url"));
        }
        if self.source.trim().is_empty() {
            return Err(AppError::invalid_data(format!(
                "listing has no source ({})",
                self.native_url
            )));
        }
        self.sale()
            .validate_for_processing(&self.native_url, self.is_complete)
    }

    /// The task queued when this listing needs a deeper scrape.
    pub fn to_scrape_task(&self) -> ScrapeTask {
        ScrapeTask {
            source: self.source.clone(),
            native_url: self.native_url.clone(),
            scraper_data: self.scraper_data.clone(),
        }
    }
}

/// An item-for-sale payload: the one subtype currently scraped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleListing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_is_fixed: Option<bool>,

    /// Listing language; identified externally when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// The announce is gone from its source site
    #[serde(default)]
    pub has_ended: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_sold: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_sold: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_ended: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_sold: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_picture_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_doc_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_seller_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_seller_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_seller_is_shop: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_group_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch_published: Option<i64>,
}

impl SaleListing {
    /// All the text parts of this listing, concatenated.
    pub fn text(&self) -> String {
        let mut s = String::new();
        if let Some(title) = &self.title {
            s.push_str(title);
            s.push(' ');
        }
        if let Some(description) = &self.description {
            s.push_str(description);
        }
        s.trim().to_string()
    }

    /// Field requirements depend on state: a not-yet-ended listing needs
    /// title, price and currency; a completely scraped one additionally
    /// needs description, picture and country.
    pub fn validate_for_processing(&self, native_url: &str, is_complete: bool) -> Result<()> {
        let mut required: Vec<(&str, bool)> = Vec::new();
        if !self.has_ended {
            required.push(("title", self.title.is_none()));
            required.push(("price", self.price.is_none()));
            required.push(("currency", self.currency.is_none()));
        }
        if is_complete {
            required.push(("description", self.description.is_none()));
            required.push(("native_picture_url", self.native_picture_url.is_none()));
            required.push(("country", self.country.is_none()));
        }
        for (field, missing) in required {
            if missing {
                return Err(AppError::invalid_data(format!(
                    "listing has no {field} ({native_url})"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_listing() -> Listing {
        Listing {
            native_url: "https://www.blocket.se/annons/123".to_string(),
            is_complete: true,
            source: "blocket".to_string(),
            scraper_data: None,
            payload: ListingPayload::Sale(SaleListing {
                title: Some("louis vuitton".to_string()),
                description: Some("nice bag".to_string()),
                price: Some(1000.0),
                currency: Some("SEK".to_string()),
                language: Some("sv".to_string()),
                country: Some("SE".to_string()),
                native_picture_url: Some("https://img.blocket.se/123.jpg".to_string()),
                ..SaleListing::default()
            }),
        }
    }

    #[test]
    fn test_text_concatenation() {
        let listing = sample_listing();
        assert_eq!(listing.sale().text(), "louis vuitton nice bag");

        let bare = SaleListing {
            title: Some("only title".to_string()),
            ..SaleListing::default()
        };
        assert_eq!(bare.text(), "only title");
        assert_eq!(SaleListing::default().text(), "");
    }

    #[test]
    fn test_validate_complete_listing() {
        assert!(sample_listing().validate_for_processing().is_ok());
    }

    #[test]
    fn test_validate_missing_fields() {
        let mut listing = sample_listing();
        listing.sale_mut().title = None;
        let err = listing.validate_for_processing().unwrap_err();
        assert!(err.to_string().contains("no title"));

        let mut listing = sample_listing();
        listing.sale_mut().description = None;
        let err = listing.validate_for_processing().unwrap_err();
        assert!(err.to_string().contains("no description"));

        // Incomplete listings do not need a description or picture
        let mut listing = sample_listing();
        listing.is_complete = false;
        listing.sale_mut().description = None;
        listing.sale_mut().native_picture_url = None;
        assert!(listing.validate_for_processing().is_ok());

        // Ended listings do not need anything beyond their identity
        let mut listing = sample_listing();
        listing.is_complete = false;
        *listing.sale_mut() = SaleListing {
            has_ended: true,
            ..SaleListing::default()
        };
        assert!(listing.validate_for_processing().is_ok());
    }

    #[test]
    fn test_deserialize_wire_format() {
        let json = r#"{
            "native_url": "https://example.com/1",
            "is_complete": false,
            "source": "tradera",
            "sale": {
                "title": "gucci bag",
                "price": 900,
                "currency": "SEK",
                "has_ended": false
            }
        }"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.source, "tradera");
        assert_eq!(listing.sale().price, Some(900.0));
        assert!(!listing.sale().has_ended);
    }

    #[test]
    fn test_deserialize_without_payload_fails() {
        let json = r#"{"native_url": "https://example.com/1", "source": "tradera"}"#;
        assert!(serde_json::from_str::<Listing>(json).is_err());
    }

    #[test]
    fn test_scrape_task() {
        let mut listing = sample_listing();
        listing.scraper_data = Some("page=2".to_string());
        let task = listing.to_scrape_task();
        assert_eq!(task.source, "blocket");
        assert_eq!(task.native_url, listing.native_url);
        assert_eq!(task.scraper_data.as_deref(), Some("page=2"));
    }
}
