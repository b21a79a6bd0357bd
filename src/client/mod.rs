//! HTTP clients for the naglasupan.is backend.
//!
//! [`ApiClient`] owns the transport, the [`TokenStore`] and the refresh logic;
//! feature clients ([`AuthClient`], [`DiscussionsClient`]) share one
//! `Arc<ApiClient>` so a login in one place authenticates every call.
//!
//! ```no_run
//! use naglasupan::client::{ApiClient, AuthClient, ClientConfig, DiscussionsClient};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), naglasupan::client::ApiError> {
//! let api = Arc::new(ApiClient::new(ClientConfig::from_env())?);
//! let auth = AuthClient::new(Arc::clone(&api));
//! let discussions = DiscussionsClient::new(api);
//!
//! auth.login("jon@naglasupan.is", "hunter2").await?;
//! let threads = discussions.list("hnitmidill").await?;
//! # let _ = threads;
//! # Ok(())
//! # }
//! ```

mod api;
pub mod auth;
pub mod config;
pub mod discussions;
mod errors;
mod token;

pub use api::{ApiClient, REFRESH_PATH, RequestOptions};
pub use auth::AuthClient;
pub use config::ClientConfig;
pub use discussions::{DiscussionBoard, DiscussionsClient};
pub use errors::ApiError;
pub use token::{TokenPair, TokenStore};
