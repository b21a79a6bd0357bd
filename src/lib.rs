//! # Naglasúpan (session & access control)
//!
//! `naglasupan` holds the parts of the naglasupan.is front end that carry real
//! control flow: the bearer-token API client, the password recovery flow and
//! the edge gate that runs before any page renders.
//!
//! ## Sessions
//!
//! Sessions are never inspected locally. The API client attaches the stored
//! access token and lets the backend decide; a `401` triggers a single silent
//! refresh and one retry. If the refresh fails the stored tokens are cleared
//! and the caller has to log in again.
//!
//! ## Password recovery
//!
//! The login page is a four state machine (`login`, `forgot`, `code`, `reset`)
//! modelled as a pure transition function in [`flow`], with an async controller
//! that drives [`client::AuthClient`].
//!
//! ## Edge gate
//!
//! The [`edge`] server normalizes the IDN alias to the canonical host, trades a
//! maintenance bypass query parameter for an `HttpOnly` cookie and keeps
//! anonymous visitors out of protected pages. The `logged_in` cookie it checks is
//! only a hint; the API authorizes every call on its own.

pub mod cli;
pub mod client;
pub mod edge;
pub mod flow;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
