// ABOUTME: Inbound query routing, the JSON response envelope and the edge-cache round trip.
// ABOUTME: Converts request-shape errors and internal faults into envelopes; faults are never cached.

//! The gateway in front of the [`Client`].
//!
//! A [`Query`] is routed either to a search extractor (`search` present) or
//! through the identifier resolver to a site extractor. Every outcome is
//! wrapped in an [`Envelope`]:
//!
//! - records and search lists are cached when a cache directory is configured
//! - request-shape errors become minimal error envelopes
//! - internal faults become an "Internal Error" envelope, optionally with a
//!   `debug` payload, and are never written to the cache

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::cache::EdgeCache;
use crate::client::Client;
use crate::error::{GenError, RequestError};
use crate::options::GatewayOptions;
use crate::record::{Record, SearchItem};
use crate::search::SearchSource;
use crate::site::{resolve, Resolution, Target, Unresolved};

/// Crate version reported in every envelope.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const CACHE_KEY_PREFIX: &str = "ptgen/v1?";

/// The inbound request, one field per HTTP query parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub debug: bool,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Query {
    /// Parse an `application/x-www-form-urlencoded` query string.
    ///
    /// `debug` is enabled only by the value `1`; unknown keys are ignored.
    pub fn from_query_string(qs: &str) -> Self {
        let mut query = Query::default();
        for (key, value) in url::form_urlencoded::parse(qs.trim_start_matches('?').as_bytes()) {
            let value = value.into_owned();
            match key.as_ref() {
                "url" => query.url = Some(value),
                "site" => query.site = Some(value),
                "sid" => query.sid = Some(value),
                "search" => query.search = Some(value),
                "source" => query.source = Some(value),
                "debug" => query.debug = value == "1",
                _ => {}
            }
        }
        query
    }

    /// Request identity for the edge cache. `debug` does not take part.
    pub fn cache_key(&self) -> String {
        let mut pairs = url::form_urlencoded::Serializer::new(String::new());
        let fields = [
            ("search", &self.search),
            ("source", &self.source),
            ("url", &self.url),
            ("site", &self.site),
            ("sid", &self.sid),
        ];
        for (key, value) in fields {
            if let Some(value) = present(value) {
                pairs.append_pair(key, value);
            }
        }
        format!("{}{}", CACHE_KEY_PREFIX, pairs.finish())
    }
}

/// Where a query is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Search { source: SearchSource, query: String },
    Generate(Resolution),
}

/// Decide the dispatch target, or the request-shape error to report.
pub fn route(query: &Query) -> Result<Route, RequestError> {
    if let Some(search) = present(&query.search) {
        let source = match present(&query.source) {
            Some(source) => SearchSource::parse(source)?,
            None => SearchSource::default(),
        };
        return Ok(Route::Search {
            source,
            query: search.to_string(),
        });
    }

    let target = match (present(&query.url), present(&query.site), present(&query.sid)) {
        (Some(url), _, _) => Target::Url(url),
        (None, Some(site), Some(sid)) => Target::Explicit { site, sid },
        _ => return Err(RequestError::MissingParameters),
    };
    match resolve(target) {
        Ok(resolution) => Ok(Route::Generate(resolution)),
        Err(Unresolved::NoMatch) => Err(RequestError::MissingParameters),
        Err(Unresolved::UnknownSite(site)) => Err(RequestError::UnsupportedSite(site)),
    }
}

/// The public JSON response body.
///
/// The common fields are always present; extractor fields are flattened in
/// beside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub error: Option<String>,
    pub format: String,
    pub copyright: String,
    pub version: String,
    /// Milliseconds since the UNIX epoch.
    pub generate_at: i64,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Envelope {
    fn base(author: &str) -> Self {
        Self {
            success: false,
            error: None,
            format: String::new(),
            copyright: format!("Powered by @{}", author),
            version: VERSION.to_string(),
            generate_at: chrono::Utc::now().timestamp_millis(),
            payload: Map::new(),
        }
    }

    /// An unsuccessful envelope carrying only an error message.
    pub fn failure(author: &str, message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::base(author)
        }
    }

    /// Wrap a record, moving its common fields up into the envelope.
    pub fn from_record(author: &str, record: &Record) -> Result<Self, GenError> {
        let mut payload = match serde_json::to_value(record) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => {
                return Err(GenError::decode(
                    format!("{}:{}", record.site, record.sid),
                    "Envelope",
                    Some(e.into()),
                ))
            }
        };
        for key in ["success", "error", "format"] {
            payload.remove(key);
        }
        Ok(Self {
            success: record.success,
            error: record.error.clone(),
            format: record.format.clone(),
            payload,
            ..Self::base(author)
        })
    }

    /// Wrap a search result list under `data`.
    pub fn from_search(author: &str, items: Vec<SearchItem>) -> Result<Self, GenError> {
        let data = serde_json::to_value(items)
            .map_err(|e| GenError::decode("search", "Envelope", Some(e.into())))?;
        let mut payload = Map::new();
        payload.insert("data".to_string(), data);
        Ok(Self {
            success: true,
            payload,
            ..Self::base(author)
        })
    }
}

/// Diagnostics attached to an internal-error envelope when `debug=1`.
#[derive(Debug, Clone, Serialize)]
pub struct DebugInfo {
    pub message: String,
    /// The error and each of its sources, outermost first.
    pub frames: Vec<String>,
    /// Seconds since the UNIX epoch.
    pub timestamp: f64,
    pub request: Query,
}

impl DebugInfo {
    fn capture(err: &GenError, query: &Query) -> Self {
        let frames = std::iter::successors(
            Some(err as &(dyn std::error::Error + 'static)),
            |e| e.source(),
        )
        .map(|e| e.to_string())
        .collect();
        Self {
            message: err.to_string(),
            frames,
            timestamp: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
            request: query.clone(),
        }
    }
}

/// Routes queries, builds envelopes and maintains the edge cache.
#[derive(Debug, Clone)]
pub struct Gateway {
    client: Client,
    opts: GatewayOptions,
    cache: Option<EdgeCache>,
}

impl Gateway {
    pub fn new(client: Client, opts: GatewayOptions) -> Self {
        let cache = opts.cache_dir.clone().map(EdgeCache::new);
        Self {
            client,
            opts,
            cache,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Answer one query. Never fails: faults are reported inside the envelope.
    pub async fn handle(&self, query: &Query) -> Envelope {
        let key = query.cache_key();

        if let Some(cache) = &self.cache {
            match cache.get(&key).await {
                Ok(Some(envelope)) => {
                    info!(key = %key, "edge cache hit");
                    return envelope;
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "edge cache read failed"),
            }
        }

        match self.dispatch(query).await {
            Ok(envelope) => {
                if let Some(cache) = &self.cache {
                    match cache.put(&key, &envelope).await {
                        Ok(()) => info!(key = %key, "edge cache write"),
                        Err(e) => warn!(error = %e, "edge cache write failed"),
                    }
                }
                envelope
            }
            Err(err) => self.fault(query, &err),
        }
    }

    async fn dispatch(&self, query: &Query) -> Result<Envelope, GenError> {
        let author = self.opts.author.as_str();
        match route(query) {
            Err(request_error) => {
                debug!(error = %request_error, "rejected request");
                Ok(Envelope::failure(author, request_error.to_string()))
            }
            Ok(Route::Search { source, query }) => {
                let items = self.client.search(source, &query).await?;
                Envelope::from_search(author, items)
            }
            Ok(Route::Generate(Resolution { site, sid })) => {
                let record = self.client.generate(site, &sid).await?;
                Envelope::from_record(author, &record)
            }
        }
    }

    fn fault(&self, query: &Query, err: &GenError) -> Envelope {
        warn!(error = %err, "internal fault");
        let mut envelope = Envelope::failure(
            &self.opts.author,
            format!(
                "Internal Error, Please contact @{}. Exception: {}",
                self.opts.author, err
            ),
        );
        if query.debug {
            if let Ok(info) = serde_json::to_value(DebugInfo::capture(err, query)) {
                envelope.payload.insert("debug".to_string(), info);
            }
        }
        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::Site;
    use pretty_assertions::assert_eq;

    fn query(qs: &str) -> Query {
        Query::from_query_string(qs)
    }

    #[test]
    fn parses_query_strings() {
        let q = query("?site=douban&sid=1292052&debug=1");
        assert_eq!(q.site.as_deref(), Some("douban"));
        assert_eq!(q.sid.as_deref(), Some("1292052"));
        assert!(q.debug);
        assert!(!query("debug=true").debug);
    }

    #[test]
    fn cache_key_ignores_debug_and_order() {
        assert_eq!(
            query("sid=1&site=douban&debug=1").cache_key(),
            query("site=douban&sid=1").cache_key()
        );
        assert_eq!(
            query("search=a b&source=imdb").cache_key(),
            "ptgen/v1?search=a+b&source=imdb"
        );
    }

    #[test]
    fn routes_search_with_default_source() {
        assert_eq!(
            route(&query("search=matrix")),
            Ok(Route::Search {
                source: SearchSource::Douban,
                query: "matrix".to_string()
            })
        );
        assert_eq!(
            route(&query("search=matrix&source=epic")),
            Err(RequestError::MissingSearch("epic".to_string()))
        );
        assert_eq!(
            route(&query("search=matrix&source=nope")),
            Err(RequestError::UnknownSource("nope".to_string()))
        );
    }

    #[test]
    fn routes_generation() {
        assert_eq!(
            route(&query("url=https://bgm.tv/subject/253")),
            Ok(Route::Generate(Resolution {
                site: Site::Bangumi,
                sid: "253".to_string()
            }))
        );
        assert_eq!(
            route(&query("site=netflix&sid=1")),
            Err(RequestError::UnsupportedSite("netflix".to_string()))
        );
        assert_eq!(route(&query("site=douban")), Err(RequestError::MissingParameters));
        assert_eq!(
            route(&query("url=https://example.com/x")),
            Err(RequestError::MissingParameters)
        );
    }

    #[test]
    fn record_envelope_flattens_fields() {
        let record = Record::not_found(Site::Steam, "1");
        let envelope = Envelope::from_record("Rhilip", &record).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.copyright, "Powered by @Rhilip");
        assert_eq!(envelope.version, VERSION);
        assert_eq!(envelope.payload.get("site"), Some(&Value::from("steam")));
        assert!(!envelope.payload.contains_key("success"));

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["error"], "The corresponding resource does not exist.");
        assert_eq!(json["sid"], "1");
        assert_eq!(json["format"], "");
    }

    #[test]
    fn debug_frames_follow_the_source_chain() {
        let err = GenError::fetch("https://x.test", "Fetch", Some(anyhow::anyhow!("refused")));
        let info = DebugInfo::capture(&err, &query("site=douban&sid=1&debug=1"));
        assert_eq!(info.frames.len(), 2);
        assert_eq!(info.frames[1], "refused");
        assert_eq!(info.request.sid.as_deref(), Some("1"));
    }
}
