//! # charitymap-client
//!
//! Async I/O for the CharityMap project map:
//!
//! - **Projects**: full-list loading against `GET /api/projects` with bearer auth
//! - **Search**: debounced free-text or per-column search with sequence tags,
//!   so a slow response for an old query never overwrites a newer one
//! - **Geolocation**: one-shot position requests with a timeout and fix caching
//!
//! Every backend is reached through a trait ([`ProjectSource`],
//! [`LocationProvider`]) so the map core runs against in-memory sources in
//! tests and offline demos.
//!
//! ## Example
//!
//! ```rust,no_run
//! use charitymap_client::{ApiClient, DataFetcher};
//! use charitymap_core::config::ApiConfig;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ApiClient::new(&ApiConfig::default())?.with_token("secret");
//!     let fetcher = DataFetcher::new(Arc::new(client));
//!
//!     let projects = fetcher.load_all().await;
//!     println!("{} projects", projects.len());
//!     Ok(())
//! }
//! ```

pub mod api_client;
pub mod fetcher;
pub mod geolocation;
pub mod search;
pub mod source;

// Re-export commonly used types
pub use api_client::ApiClient;
pub use fetcher::DataFetcher;
pub use geolocation::{FixedLocationProvider, GeolocationService, LocationProvider, PositionOptions};
pub use search::{SearchColumn, SearchOutcome, SearchQuery, SearchScheduler, SearchSequence};
pub use source::{ProjectSource, StaticProjectSource};
