// ABOUTME: The main Client struct for ptgen that owns the HTTP clients and upstream endpoints.
// ABOUTME: Provides generate() for site extraction and search() for suggestion lookups.

use std::collections::HashMap;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::GenError;
use crate::options::{ClientBuilder, Endpoints, Options};
use crate::record::{Record, SearchItem};
use crate::resource::{fetch, FetchOptions, FetchResult};
use crate::search::SearchSource;
use crate::site::Site;
use crate::sites::{self, SiteExtractor};

/// An upstream fetch started ahead of when its result is needed.
///
/// Dropping it without joining aborts the background task, so an extractor
/// that returns early leaves nothing running.
#[derive(Debug)]
pub(crate) struct PendingFetch {
    handle: JoinHandle<Result<FetchResult, GenError>>,
}

impl Drop for PendingFetch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Client for generating metadata records from upstream sites.
///
/// Cloning is cheap; the underlying connection pools are shared.
#[derive(Debug, Clone)]
pub struct Client {
    opts: Options,
    http_client: reqwest::Client,
    no_redirect_client: reqwest::Client,
}

impl Client {
    /// Create a new ClientBuilder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    pub fn new(opts: Options) -> Self {
        let http_client = opts
            .http_client
            .clone()
            .unwrap_or_else(|| build_http_client(&opts, reqwest::redirect::Policy::limited(10)));
        let no_redirect_client = build_http_client(&opts, reqwest::redirect::Policy::none());

        Self {
            opts,
            http_client,
            no_redirect_client,
        }
    }

    /// Upstream base URLs in use.
    pub fn endpoints(&self) -> &Endpoints {
        &self.opts.endpoints
    }

    /// Generate the metadata record for one subject.
    ///
    /// Nonexistent subjects come back as unsuccessful records; only
    /// unexpected failures are errors.
    pub async fn generate(&self, site: Site, sid: &str) -> Result<Record, GenError> {
        debug!(%site, sid, "dispatching site extractor");
        match site {
            Site::Douban => sites::douban::Douban.extract(self, sid).await,
            Site::Imdb => sites::imdb::Imdb.extract(self, sid).await,
            Site::Bangumi => sites::bangumi::Bangumi.extract(self, sid).await,
            Site::Steam => sites::steam::Steam.extract(self, sid).await,
            Site::Indienova => sites::indienova::Indienova.extract(self, sid).await,
            Site::Epic => sites::epic::Epic.extract(self, sid).await,
        }
    }

    /// Query one upstream suggestion endpoint.
    pub async fn search(
        &self,
        source: SearchSource,
        query: &str,
    ) -> Result<Vec<SearchItem>, GenError> {
        debug!(?source, query, "dispatching search extractor");
        crate::search::search(self, source, query).await
    }

    fn merged(&self, opts: FetchOptions) -> FetchOptions {
        let mut headers: HashMap<String, String> = self.opts.headers.clone();
        headers.extend(opts.headers);
        FetchOptions {
            headers,
            parse_non_200: opts.parse_non_200,
        }
    }

    /// Fetch following redirects.
    pub(crate) async fn get(&self, url: &str, opts: FetchOptions) -> Result<FetchResult, GenError> {
        fetch(&self.http_client, url, &self.merged(opts)).await
    }

    /// Fetch without following redirects so a 3xx status is observable.
    pub(crate) async fn get_no_redirect(
        &self,
        url: &str,
        opts: FetchOptions,
    ) -> Result<FetchResult, GenError> {
        fetch(&self.no_redirect_client, url, &self.merged(opts)).await
    }

    /// Start a fetch in the background; join it with [`Client::join`].
    pub(crate) fn spawn_get(&self, url: String, opts: FetchOptions) -> PendingFetch {
        let http = self.http_client.clone();
        let opts = self.merged(opts);
        PendingFetch {
            handle: tokio::spawn(async move { fetch(&http, &url, &opts).await }),
        }
    }

    /// Wait for a background fetch.
    pub(crate) async fn join(
        mut pending: PendingFetch,
        url: &str,
    ) -> Result<FetchResult, GenError> {
        match (&mut pending.handle).await {
            Ok(result) => result,
            Err(e) => Err(GenError::fetch(
                url,
                "Join",
                Some(anyhow::anyhow!("background fetch failed: {}", e)),
            )),
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

fn build_http_client(opts: &Options, redirect: reqwest::redirect::Policy) -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(redirect)
        .user_agent(&opts.user_agent)
        .timeout(opts.timeout)
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default HTTP client");
            reqwest::Client::new()
        })
}
