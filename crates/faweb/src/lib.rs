//! Scraping client for FurAffinity's rendered markup pages.
//!
//! The site exposes no formal API; everything here is recovered from
//! parsed HTML via the handler-based extraction engine in
//! [`faweb_extract`], fed by a rate-limited, cookie-carrying transport.
//!
//! Typical use: build a [`Client`] from a [`Config`] (session cookies
//! included), then go through the domain entry points [`Client::user`]
//! and [`Client::search`] and the lazily-fetching records they return.

mod client;
mod config;
mod error;
mod handlers;
mod journal;
mod limiter;
mod search;
mod submission;
mod user;

pub use client::Client;
pub use config::{Config, Cookie};
pub use error::{Error, Result};
pub use journal::{Journal, JournalContent};
pub use search::Search;
pub use submission::{Rating, Submission, SubmissionDetails};
pub use user::User;
