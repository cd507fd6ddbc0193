// src/tagger/mod.rs

//! Keyword-based hierarchical tagging.
//!
//! Free text is matched against a graph of keyword lists (the tag tree);
//! the result is a set of flat tag names plus `path:` tags encoding each
//! satisfied root-to-node chain.

mod keyword;
mod tree;

pub use keyword::{Keyword, KeywordList};
pub use tree::{Node, NodeId, TagPath, Tree};
