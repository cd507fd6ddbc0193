// src/pipeline/batch.rs

//! Batch processing with bounded concurrency.
//!
//! Listings in a batch are independent, so they are processed concurrently
//! up to the configured limit. A failing listing does not abort the batch;
//! its error is reported next to the successful outcomes.

use futures::stream::{self, StreamExt};
use log::warn;

use super::process::{ProcessOutcome, Processor};
use crate::models::Listing;

/// Summary of a batch run.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Outcomes of successfully processed listings, in input order
    pub outcomes: Vec<ProcessOutcome>,
    /// Listings that failed, with their errors
    pub failures: Vec<BatchFailure>,
}

/// One failed listing in a batch.
#[derive(Debug)]
pub struct BatchFailure {
    pub native_url: String,
    pub error: String,
}

impl Processor {
    /// Process a batch of listings with bounded concurrency.
    pub async fn process_batch(&self, listings: Vec<Listing>) -> BatchOutcome {
        let concurrency = self.max_concurrent().max(1);
        let total = listings.len();

        let mut slots: Vec<Option<ProcessOutcome>> = Vec::new();
        slots.resize_with(total, || None);
        let mut failures = Vec::new();

        let mut jobs = stream::iter(listings.into_iter().enumerate())
            .map(|(position, listing)| async move {
                let native_url = listing.native_url.clone();
                (position, native_url, self.process(listing).await)
            })
            .buffer_unordered(concurrency);

        while let Some((position, native_url, result)) = jobs.next().await {
            match result {
                Ok(outcome) => slots[position] = Some(outcome),
                Err(error) => {
                    warn!("Failed to process listing {}: {}", native_url, error);
                    failures.push(BatchFailure {
                        native_url,
                        error: error.to_string(),
                    });
                }
            }
        }

        BatchOutcome {
            outcomes: slots.into_iter().flatten().collect(),
            failures,
        }
    }
}
