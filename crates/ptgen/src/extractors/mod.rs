// ABOUTME: Shared extraction utilities used by every site extractor.
// ABOUTME: Document queries, value normalization and HTML to BBCode conversion.

//! Extraction helpers.
//!
//! Submodules:
//! - `fields`: selector-based queries over parsed documents.
//! - `normalize`: dates, aliases, ratings and whitespace rules.
//! - `bbcode`: HTML sub-tree to BBCode conversion.

pub mod bbcode;
pub mod fields;
pub mod normalize;
