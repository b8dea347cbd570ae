// ABOUTME: Main library entry point for ptgen, the media metadata description generator.
// ABOUTME: Re-exports the public API: Client, ClientBuilder, Gateway, Query, Envelope, Record, Site and errors.

//! ptgen - generates BBCode release descriptions from public media databases.
//!
//! Given a resource URL or an explicit `(site, sid)` pair, the client fetches
//! the upstream pages for douban, IMDb, Bangumi, Steam, indienova or the Epic
//! Games Store, extracts a typed record and renders it into a fixed-layout
//! BBCode description.
//!
//! # Example
//!
//! ```no_run
//! use ptgen_core::{Client, GenError, Site};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), GenError> {
//!     let client = Client::builder().build();
//!     let record = client.generate(Site::Bangumi, "253").await?;
//!     println!("{}", record.format);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod error;
pub mod extractors;
pub mod formats;
pub mod gateway;
pub mod options;
pub mod record;
pub mod resource;
pub mod search;
pub mod site;
pub mod sites;

pub use crate::client::Client;
pub use crate::error::{ErrorCode, GenError, RequestError};
pub use crate::gateway::{Envelope, Gateway, Query};
pub use crate::options::{ClientBuilder, Endpoints, GatewayOptions, Options};
pub use crate::record::{Record, SearchItem, SiteDetails};
pub use crate::search::SearchSource;
pub use crate::site::{resolve, resolve_url, Resolution, Site, Target, Unresolved};
