//! Auth feature: login, registration, profile and password recovery calls.
//! Payloads carry passwords, codes and tokens, so nothing here may be logged.

pub(crate) mod client;
pub mod types;

pub use client::AuthClient;
