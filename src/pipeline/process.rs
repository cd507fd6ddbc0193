// src/pipeline/process.rs

//! The listing lifecycle state machine.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};
use serde::Serialize;

use crate::curation::{CurationMode, Curator};
use crate::error::Result;
use crate::models::{Config, Item, Listing};
use crate::services::{LanguageIdentifier, generate_item_id};
use crate::stores::{ItemStore, ScrapeQueue, SearchIndex};
use crate::tagger::Tree;
use crate::utils::host_of;

/// The closed set of lifecycle actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Drop the listing
    Skip,
    /// Queue the listing for a deeper re-fetch
    Scrape,
    /// Create a new catalog item
    Index,
    /// Mutate the existing item
    Update,
    /// Move the item to the archive and out of the live index
    Archive,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Skip => "SKIP",
            Action::Scrape => "SCRAPE",
            Action::Index => "INDEX",
            Action::Update => "UPDATE",
            Action::Archive => "ARCHIVE",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle decision, carrying the matched item where one exists.
#[derive(Debug, Clone)]
pub enum Decision {
    Skip,
    Scrape,
    Index,
    Update(Item),
    Archive(Item),
}

impl Decision {
    /// The flat action label of this decision.
    pub fn action(&self) -> Action {
        match self {
            Decision::Skip => Action::Skip,
            Decision::Scrape => Action::Scrape,
            Decision::Index => Action::Index,
            Decision::Update(_) => Action::Update,
            Decision::Archive(_) => Action::Archive,
        }
    }
}

/// Result of processing one listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

/// Drives listings through curation, tagging and the item stores.
///
/// The tree and curator are immutable after startup; a processor can be
/// shared freely across concurrent workers.
pub struct Processor {
    tree: Tree,
    curator: Curator,
    media_base: String,
    max_concurrent: usize,
    store: Arc<dyn ItemStore>,
    search: Arc<dyn SearchIndex>,
    queue: Arc<dyn ScrapeQueue>,
    language: Arc<dyn LanguageIdentifier>,
}

impl Processor {
    pub fn new(
        config: &Config,
        tree: Tree,
        curator: Curator,
        store: Arc<dyn ItemStore>,
        search: Arc<dyn SearchIndex>,
        queue: Arc<dyn ScrapeQueue>,
        language: Arc<dyn LanguageIdentifier>,
    ) -> Self {
        Self {
            tree,
            curator,
            media_base: config.media.base_url.clone(),
            max_concurrent: config.processing.max_concurrent,
            store,
            search,
            queue,
            language,
        }
    }

    /// The tag tree this processor classifies against.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The curation rule set this processor applies.
    pub fn curator(&self) -> &Curator {
        &self.curator
    }

    pub(crate) fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Resolve the listing's language, identifying it when absent. The
    /// language is needed before any keyword matching.
    async fn resolve_language(&self, listing: &mut Listing) -> Result<String> {
        if let Some(language) = &listing.sale().language {
            return Ok(language.clone());
        }
        let language = self.language.identify(&listing.sale().text()).await?;
        info!(
            "Identified listing language: {} ({})",
            language, listing.native_url
        );
        listing.sale_mut().language = Some(language.clone());
        Ok(language)
    }

    /// Decide what to do with a listing, without dispatching anything.
    ///
    /// Transition rules, in order: an ended listing archives its item (or is
    /// skipped when none exists); an incomplete listing is shallow-curated
    /// into scrape-or-skip; a complete listing is deep-curated into
    /// update-or-index (or skipped).
    pub async fn decide(&self, listing: &mut Listing) -> Result<Decision> {
        listing.validate_for_processing()?;

        if listing.sale().has_ended {
            info!("Listing has ended ({})", listing.native_url);
            return match self.store.find_by_native_url(&listing.native_url).await? {
                None => {
                    info!("No item derived from this listing - ignoring it");
                    Ok(Decision::Skip)
                }
                Some(item) => {
                    info!("Found item {} - archiving it", item.item_id);
                    Ok(Decision::Archive(item))
                }
            };
        }

        if !listing.is_complete {
            debug!("Listing is not complete ({})", listing.native_url);
            let language = self.resolve_language(listing).await?;
            return if self
                .curator
                .passes(listing.sale(), &language, CurationMode::Shallow)?
            {
                info!("Listing passed first curation - queuing it up");
                Ok(Decision::Scrape)
            } else {
                info!("Listing failed first curation - skipping it");
                Ok(Decision::Skip)
            };
        }

        // The listing has all the data we will ever scrape: the real deal
        let language = self.resolve_language(listing).await?;
        if !self
            .curator
            .passes(listing.sale(), &language, CurationMode::Deep)?
        {
            info!("Listing failed deep curation - skipping it");
            return Ok(Decision::Skip);
        }

        match self.store.find_by_native_url(&listing.native_url).await? {
            Some(item) => {
                info!("Listing is already indexed as item {}", item.item_id);
                Ok(Decision::Update(item))
            }
            None => Ok(Decision::Index),
        }
    }

    /// Decide and dispatch: queue, create, update or archive as needed.
    pub async fn process(&self, mut listing: Listing) -> Result<ProcessOutcome> {
        debug!(
            "Processing listing {} (host {:?})",
            listing.native_url,
            host_of(&listing.native_url)
        );

        match self.decide(&mut listing).await? {
            Decision::Skip => Ok(ProcessOutcome {
                action: Action::Skip,
                item_id: None,
            }),

            Decision::Scrape => {
                self.queue.enqueue(listing.to_scrape_task()).await?;
                Ok(ProcessOutcome {
                    action: Action::Scrape,
                    item_id: None,
                })
            }

            Decision::Index => {
                let item_id = generate_item_id(self.store.as_ref(), &listing.source).await?;
                let mut item = Item::from_listing(&listing, item_id);
                item.regenerate(&self.tree, &self.curator, &self.media_base, true);
                self.store.create(&item).await?;
                self.search.index(&item).await?;
                info!("Indexed new item {} ({})", item.item_id, item.slug);
                Ok(ProcessOutcome {
                    action: Action::Index,
                    item_id: Some(item.item_id),
                })
            }

            Decision::Update(mut item) => {
                let outcome = item.apply_update(listing.sale());
                if outcome.changed {
                    item.date_last_check = Utc::now();
                    item.regenerate(
                        &self.tree,
                        &self.curator,
                        &self.media_base,
                        outcome.picture_changed,
                    );
                    self.store.update(&item).await?;
                    self.search.index(&item).await?;
                    info!("Updated item {} ({})", item.item_id, item.slug);
                } else {
                    debug!("Item {} unchanged", item.item_id);
                }
                Ok(ProcessOutcome {
                    action: Action::Update,
                    item_id: Some(item.item_id),
                })
            }

            Decision::Archive(mut item) => {
                item.mark_as_ended(listing.sale());
                self.store.archive(&item).await?;
                self.search.remove(&item.item_id).await?;
                info!("Archived item {}", item.item_id);
                Ok(ProcessOutcome {
                    action: Action::Archive,
                    item_id: Some(item.item_id),
                })
            }
        }
    }
}
