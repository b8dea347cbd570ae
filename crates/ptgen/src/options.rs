// ABOUTME: Configuration options for ptgen including Endpoints, Options and ClientBuilder.
// ABOUTME: ClientBuilder provides a fluent API for constructing Client instances with custom settings.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::Client;

/// Default browser-like user agent; several upstreams refuse obvious bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Base URLs of every upstream host.
///
/// Only the fetch target changes when an endpoint is overridden; links
/// written into records always point at the public production site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub douban: String,
    pub imdb: String,
    pub imdb_ratings: String,
    pub imdb_suggest: String,
    pub bangumi: String,
    pub bangumi_api: String,
    pub steam: String,
    pub steam_localization: String,
    pub indienova: String,
    pub epic_content: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            douban: "https://movie.douban.com".to_string(),
            imdb: "https://www.imdb.com".to_string(),
            imdb_ratings: "https://p.media-imdb.com".to_string(),
            imdb_suggest: "https://v2.sg.media-imdb.com".to_string(),
            bangumi: "https://bgm.tv".to_string(),
            bangumi_api: "https://api.bgm.tv".to_string(),
            steam: "https://store.steampowered.com".to_string(),
            steam_localization: "https://steamdb.keylol.com".to_string(),
            indienova: "https://indienova.com".to_string(),
            epic_content: "https://store-content.ak.epicgames.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every upstream at a single base URL, as a mock server would serve them.
    pub fn all(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            douban: base.clone(),
            imdb: base.clone(),
            imdb_ratings: base.clone(),
            imdb_suggest: base.clone(),
            bangumi: base.clone(),
            bangumi_api: base.clone(),
            steam: base.clone(),
            steam_localization: base.clone(),
            indienova: base.clone(),
            epic_content: base,
        }
    }
}

/// Configuration options for the ptgen client.
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    pub http_client: Option<reqwest::Client>,
    pub headers: HashMap<String, String>,
    pub endpoints: Endpoints,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_client: None,
            headers: HashMap::new(),
            endpoints: Endpoints::default(),
        }
    }
}

/// Builder for constructing Client instances with custom configuration.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    /// Create a new ClientBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Use a custom HTTP client for redirect-following fetches.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Override upstream base URLs.
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.opts.endpoints = endpoints;
        self
    }

    /// Build the Client with the configured options.
    pub fn build(self) -> Client {
        Client::new(self.opts)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for the inbound gateway that wraps the client.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Name shown in the envelope copyright and in internal-error messages.
    pub author: String,
    /// Directory of the on-disk edge cache. `None` disables caching.
    pub cache_dir: Option<std::path::PathBuf>,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            author: "Rhilip".to_string(),
            cache_dir: None,
        }
    }
}
