// src/pipeline/mod.rs

//! Listing lifecycle processing.
//!
//! The pipeline ties classification output to store actions: each incoming
//! listing is validated, curated and resolved to exactly one lifecycle
//! action (skip, queue for scraping, index, update or archive), which is
//! then dispatched to the configured collaborators.

mod batch;
mod process;

pub use batch::{BatchFailure, BatchOutcome};
pub use process::{Action, Decision, ProcessOutcome, Processor};
