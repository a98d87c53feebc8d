use reqwest::StatusCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced by the transport boundary.
///
/// Extraction itself never errors: missing structure degrades to empty
/// fields, so callers always get either a (possibly partial) result or
/// one of these.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The session cookies did not produce a logged-in page. This is a
    /// sentinel condition, not a transport failure.
    #[error("not logged in")]
    NotLoggedIn,

    #[error("invalid client configuration: {0}")]
    Config(String),

    #[error("request for {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-200 response. Never retried here; the caller decides.
    #[error("unexpected HTTP status {status} for {url}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    /// The response was not the markup we asked for.
    #[error("unexpected content-type {content_type:?} for {url}")]
    ContentType {
        url: String,
        content_type: String,
        body: String,
    },
}
