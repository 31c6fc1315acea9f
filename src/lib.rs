//! # news_link_resolver
//!
//! Turns Google News RSS redirect links into publisher URLs and pulls the
//! readable article text out of the publisher page.
//!
//! ## Architecture
//!
//! 1. **Feed**: fetch a topic feed and map items into [`models::FeedEntry`] ([`feed`])
//! 2. **Resolution**: token decode, redirect follow, `url=` parameter ([`resolver`])
//! 3. **Extraction**: selector cascade with paragraph fallback ([`extractor`])
//! 4. **Ingestion**: per-category batches written as JSON ([`ingest`], [`outputs`])
//!
//! [`pipeline::Pipeline`] ties resolution and extraction together for a
//! single link; nothing in it returns an error.

pub mod config;
pub mod error;
pub mod extractor;
pub mod feed;
pub mod http;
pub mod ingest;
pub mod models;
pub mod outputs;
pub mod pipeline;
pub mod resolver;
pub mod utils;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use http::HttpSession;
pub use pipeline::Pipeline;
