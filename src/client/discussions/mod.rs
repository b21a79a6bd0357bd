//! Project discussions: the HTTP calls plus the local board the UI mutates
//! optimistically after each call succeeds.

mod board;
pub(crate) mod client;
pub mod types;

pub use board::DiscussionBoard;
pub use client::DiscussionsClient;
