//! Command-line interface definitions.
//!
//! Every option can also come from an environment variable. Options given
//! here override the matching values in the YAML config.

use clap::Parser;

/// Resolve Google News feed links to publisher URLs and extract article text.
///
/// # Examples
///
/// ```sh
/// # Ingest every configured category into ./out/{date}/{edition}.json
/// news_link_resolver -o ./out
///
/// # Only two categories, three articles each, custom config
/// news_link_resolver -o ./out -c config.yaml --category business --category science --per-category 3
///
/// # Resolve and extract single links, printing JSON to stdout
/// news_link_resolver --link 'https://news.google.com/rss/articles/CBMi...?oc=5'
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for the JSON batch file (required unless --link is given)
    #[arg(short, long, env = "NEWS_OUTPUT_DIR", required_unless_present = "link")]
    pub output_dir: Option<String>,

    /// Optional path to a YAML config file
    #[arg(short, long, env = "NEWS_CONFIG")]
    pub config: Option<String>,

    /// Category to ingest; repeat for several (defaults to the config's list)
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Newest articles kept per category
    #[arg(long)]
    pub per_category: Option<usize>,

    /// Skip the pause before each article fetch
    #[arg(long, env = "NEWS_NO_COURTESY_DELAY")]
    pub no_courtesy_delay: bool,

    /// Resolve and extract this feed link instead of ingesting; repeatable
    #[arg(long)]
    pub link: Vec<String>,
}
