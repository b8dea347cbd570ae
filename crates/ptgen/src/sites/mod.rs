// ABOUTME: Site extractor trait and helpers shared by the six per-site pipelines.
// ABOUTME: Each submodule fetches one upstream, detects nonexistence and builds a typed record.

//! Site extractors.
//!
//! Every extractor follows the same skeleton:
//!
//! 1. Build the canonical upstream URL from the subject id.
//! 2. Fetch the primary document; a known marker, redirect or 404 yields an
//!    unsuccessful [`Record`] and nothing else is fetched.
//! 3. Start auxiliary fetches in the background before parsing the primary
//!    document, and join them only where their fields are consumed.
//! 4. Parse with absence-tolerant queries and normalize.
//!
//! Parsed documents (`scraper::Html`) are not `Send`, so parsing happens in
//! synchronous helpers that return owned data and never live across an
//! `.await`.

pub mod bangumi;
pub mod douban;
pub mod epic;
pub mod imdb;
pub mod indienova;
pub mod steam;

use serde::{Deserialize, Deserializer};

use crate::client::Client;
use crate::error::GenError;
use crate::record::{Credit, Record};
use crate::site::Site;

/// One upstream pipeline.
#[allow(async_fn_in_trait)]
pub trait SiteExtractor {
    /// The site tag this extractor serves.
    const SITE: Site;

    /// Produce the record for `sid`.
    async fn extract(&self, client: &Client, sid: &str) -> Result<Record, GenError>;
}

/// Credited people from a JSON-LD value that may be one object or a list.
///
/// With `persons_only`, entries whose `@type` is not `Person` are dropped.
pub(crate) fn credits(value: &serde_json::Value, persons_only: bool) -> Vec<Credit> {
    let entries: Vec<&serde_json::Value> = match value {
        serde_json::Value::Array(items) => items.iter().collect(),
        serde_json::Value::Object(_) => vec![value],
        _ => Vec::new(),
    };
    entries
        .into_iter()
        .filter(|e| !persons_only || e.get("@type").and_then(|t| t.as_str()) == Some("Person"))
        .filter_map(|e| serde_json::from_value::<Credit>(e.clone()).ok())
        .filter(|c| !c.name.is_empty())
        .collect()
}

/// Deserialize a field that may be `null`, mapping `null` to the default.
///
/// Pair with `#[serde(default)]` so a missing key behaves the same.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A string field of a JSON value, if present and non-empty.
pub(crate) fn json_str(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
