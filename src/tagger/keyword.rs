// src/tagger/keyword.rs

//! Keywords and keyword lists.
//!
//! A keyword list is parsed from a line-oriented resource file. `.txt`
//! resources hold plain UTF-8 keywords; `.html` resources hold HTML-entity
//! encoded keywords and are decoded at load time. Optional header
//! directives link lists into the tag graph:
//!
//! ```text
//! # parents: bags, glasses      -> tags under which matching items are found
//! # grants: fashion             -> tags attached to any matching item
//! # name: Louis Vuitton         -> display label for this tag
//! keyword1
//! keyword2                      -> matches whatever the language
//! en:keyword3                   -> matches only English listings
//! ```

use std::fs;
use std::path::Path;

use log::debug;

use crate::error::{AppError, Result};
use crate::utils::decode_html_text;

/// A single match token, optionally scoped to one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    /// The word or phrase to match, lower-cased
    pub word: String,

    /// Two-letter language code; `None` matches any language
    pub language: Option<String>,
}

impl Keyword {
    /// Parse a keyword line, honoring an optional `lang:` prefix.
    pub fn new(line: &str) -> Self {
        let bytes = line.as_bytes();
        if line.len() > 3
            && bytes[0].is_ascii_lowercase()
            && bytes[1].is_ascii_lowercase()
            && bytes[2] == b':'
        {
            return Self {
                word: line[3..].to_string(),
                language: Some(line[..2].to_string()),
            };
        }
        Self {
            word: line.to_string(),
            language: None,
        }
    }

    /// True iff this keyword applies to the given language and its word
    /// appears as a whitespace-delimited substring of the text.
    ///
    /// Matching pads both the keyword and the text with a single space and
    /// checks substring containment. That gives exact word matching (for
    /// multi-word phrases too) without punctuation-aware tokenization, so
    /// callers are expected to normalize the text first.
    pub fn matches(&self, text: &str, language: &str) -> bool {
        if let Some(lang) = &self.language {
            if lang != language {
                return false;
            }
        }
        let padded = format!(" {} ", text.to_lowercase());
        padded.contains(&format!(" {} ", self.word))
    }
}

/// An ordered list of keywords loaded from one tagged resource file.
#[derive(Debug, Clone)]
pub struct KeywordList {
    /// Base filename of the resource, without extension
    pub name: String,

    /// Display label; defaults to `name`
    pub label: String,

    /// Whether the resource was HTML-entity encoded
    pub is_html_encoded: bool,

    /// Names of parent tags, in declaration order
    pub parent_tags: Vec<String>,

    /// Names of granted tags, in declaration order
    pub grant_tags: Vec<String>,

    /// The keywords, in declaration order
    pub keywords: Vec<Keyword>,
}

impl KeywordList {
    /// Load a keyword list from a `.txt` or `.html` resource file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading keyword list from {}", path.display());
        let content = fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let is_html_encoded = path.extension().and_then(|s| s.to_str()) == Some("html");
        Self::parse(&name, is_html_encoded, &content, &path.display().to_string())
    }

    /// Parse resource content. `origin` is only used in error messages.
    pub fn parse(name: &str, is_html_encoded: bool, content: &str, origin: &str) -> Result<Self> {
        let mut list = Self {
            name: name.to_string(),
            label: name.to_string(),
            is_html_encoded,
            parent_tags: Vec::new(),
            grant_tags: Vec::new(),
            keywords: Vec::new(),
        };

        for line in content.lines() {
            if let Some(rest) = line.strip_prefix('#') {
                if let Some(names) = rest.strip_prefix(" parents:") {
                    list.parent_tags = parse_name_list(names);
                } else if let Some(names) = rest.strip_prefix(" grants:") {
                    list.grant_tags = parse_name_list(names);
                } else if let Some(label) = rest.strip_prefix(" name:") {
                    list.label = label.trim().to_string();
                } else {
                    return Err(AppError::malformed_resource(origin, line));
                }
                continue;
            }

            let mut word = line.to_lowercase();
            if is_html_encoded {
                word = decode_html_text(&word);
            }
            let word = word.trim();
            if !word.is_empty() {
                list.keywords.push(Keyword::new(word));
            }
        }

        Ok(list)
    }

    /// True iff any contained keyword matches.
    pub fn matches(&self, text: &str, language: &str) -> bool {
        for keyword in &self.keywords {
            if keyword.matches(text, language) {
                debug!("Text matches [{}] in list {}", keyword.word, self.name);
                return true;
            }
        }
        false
    }

    /// The words of every keyword that matches this text.
    pub fn matching_words(&self, text: &str, language: &str) -> Vec<String> {
        self.keywords
            .iter()
            .filter(|k| k.matches(text, language))
            .map(|k| k.word.clone())
            .collect()
    }
}

fn parse_name_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}
