//! Command-line interface definitions for Climate Scraper.
//!
//! All arguments can be provided via command-line flags or environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Climate Scraper application.
///
/// # Examples
///
/// ```sh
/// # Run every spider from the config
/// climate_scraper -c config.yaml -o ./out
///
/// # Run a single spider against a remote index service
/// climate_scraper -c config.yaml -o ./out -s gismeteo_ua --index-url https://idx.example/{spider}
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "CLIMATE_SCRAPER_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Output directory for session JSON files
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Spider to run (repeatable); all configured spiders when omitted
    #[arg(short, long = "spider")]
    pub spiders: Vec<String>,

    /// Index service URL returning a JSON array of scraped indexes;
    /// `{spider}` is replaced with the spider name
    #[arg(long, env = "CLIMATE_SCRAPER_INDEX_URL", conflicts_with = "no_dedup")]
    pub index_url: Option<String>,

    /// Do not filter out articles scraped by earlier runs
    #[arg(long)]
    pub no_dedup: bool,

    /// Article pages fetched at the same time (overrides the config file)
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "climate_scraper",
            "--config",
            "sites.yaml",
            "--output-dir",
            "./out",
        ]);

        assert_eq!(cli.config, PathBuf::from("sites.yaml"));
        assert_eq!(cli.output_dir, PathBuf::from("./out"));
        assert!(cli.spiders.is_empty());
        assert!(!cli.no_dedup);
    }

    #[test]
    fn test_cli_short_flags_and_spiders() {
        let cli = Cli::parse_from([
            "climate_scraper",
            "-c",
            "/etc/scraper.yaml",
            "-o",
            "/tmp/out",
            "-s",
            "gismeteo_ua",
            "-s",
            "gismeteo_ru",
            "--concurrency",
            "4",
        ]);

        assert_eq!(cli.spiders, vec!["gismeteo_ua", "gismeteo_ru"]);
        assert_eq!(cli.concurrency, Some(4));
    }

    #[test]
    fn test_index_url_conflicts_with_no_dedup() {
        let result = Cli::try_parse_from([
            "climate_scraper",
            "-o",
            "out",
            "--no-dedup",
            "--index-url",
            "http://idx",
        ]);
        assert!(result.is_err());
    }
}
