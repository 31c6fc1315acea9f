//! Caller-level errors.
//!
//! Nothing inside the resolution or extraction path returns these: strategy
//! and fetch failures are folded into `None` where they happen. The variants
//! here cover the caller's side, such as an unreadable config file or a feed
//! that will not parse.

use thiserror::Error;

/// Errors surfaced to the code driving the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file was read but is not valid YAML for [`crate::config::PipelineConfig`].
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Filesystem failure while writing output.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Building the HTTP client, or a feed request, failed.
    #[error("http error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// A configured header value (user agent, locale) is not a valid HTTP header.
    #[error("invalid header value in config: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    /// The feed document is not RSS we can read.
    #[error("failed to parse feed {url}: {source}")]
    Feed {
        url: String,
        #[source]
        source: quick_xml::DeError,
    },

    /// A link supplied on the command line does not parse.
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Output could not be serialized.
    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
