// src/config.rs
//! Command-line surface and resolved run configurations.

use crate::constants::{DEFAULT_FETCH_DEPTH, DEFAULT_MAX_REQUESTS_PER_SECOND, MANIFEST_DIR_NAME};
use crate::error::AppError;
use crate::types::{ApiKey, NotionId, PropertyName};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl a workspace root and build or update its link manifest
    Manifest(ManifestArgs),
    /// Export one page as JSON with internal links resolved to published URLs
    Export(ExportArgs),
}

#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Notion database/page URL or ID to crawl from
    pub notion_input: String,

    #[command(flatten)]
    pub shared: SharedArgs,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Notion page URL or ID to export
    pub notion_input: String,

    /// Root whose manifest file resolves this page's links
    /// (defaults to the page itself)
    #[arg(long)]
    pub manifest_root: Option<String>,

    /// Emit only the path component of resolved URLs
    #[arg(long, default_value_t = false)]
    pub use_url_path: bool,

    /// Log reference failures and keep exporting instead of aborting
    #[arg(long, default_value_t = false)]
    pub fail_forward: bool,

    /// Output file for the exported document (stdout when omitted)
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// Pipe mode - suppress summaries, write only the document to stdout
    #[arg(short = 'p', long, default_value_t = false)]
    pub pipe: bool,

    #[command(flatten)]
    pub shared: SharedArgs,
}

/// Flags both subcommands take.
#[derive(Args, Debug)]
pub struct SharedArgs {
    /// Page property holding the published URL
    #[arg(long, default_value = "Publish URL")]
    pub url_property: String,

    /// Directory holding manifest files
    #[arg(long)]
    pub manifest_dir: Option<PathBuf>,

    /// Maximum API requests per second
    #[arg(long, default_value_t = DEFAULT_MAX_REQUESTS_PER_SECOND)]
    pub max_rps: usize,

    /// Maximum nesting depth when walking block trees
    #[arg(long, default_value_t = DEFAULT_FETCH_DEPTH)]
    pub depth: u8,
}

/// Validated configuration for one manifest build.
#[derive(Debug, Clone)]
pub struct ManifestRunConfig {
    pub root: NotionId,
    pub api_key: ApiKey,
    pub url_property: PropertyName,
    pub manifest_dir: PathBuf,
    pub max_rps: usize,
    pub depth: u8,
}

impl ManifestRunConfig {
    /// Resolves a manifest build configuration from CLI input and
    /// environment.
    pub fn resolve(args: ManifestArgs) -> Result<Self, AppError> {
        let api_key = api_key_from_env()?;
        let root = NotionId::parse(&args.notion_input)?;
        Ok(Self {
            root,
            api_key,
            url_property: require_url_property(&args.shared)?,
            manifest_dir: manifest_dir(&args.shared),
            max_rps: args.shared.max_rps,
            depth: args.shared.depth,
        })
    }
}

/// Validated configuration for one page export.
#[derive(Debug, Clone)]
pub struct ExportRunConfig {
    pub page: NotionId,
    /// Names the manifest file loaded for resolution.
    pub manifest_root: NotionId,
    pub api_key: ApiKey,
    pub url_property: PropertyName,
    pub use_url_path: bool,
    pub fail_forward: bool,
    pub manifest_dir: PathBuf,
    pub max_rps: usize,
    pub depth: u8,
    pub output_file: Option<PathBuf>,
    pub pipe: bool,
}

impl ExportRunConfig {
    /// Resolves an export configuration from CLI input and environment.
    pub fn resolve(args: ExportArgs) -> Result<Self, AppError> {
        let api_key = api_key_from_env()?;
        let page = NotionId::parse(&args.notion_input)?;
        let manifest_root = match &args.manifest_root {
            Some(input) => NotionId::parse(input)?,
            None => page.clone(),
        };
        Ok(Self {
            page,
            manifest_root,
            api_key,
            url_property: require_url_property(&args.shared)?,
            use_url_path: args.use_url_path,
            fail_forward: args.fail_forward,
            manifest_dir: manifest_dir(&args.shared),
            max_rps: args.shared.max_rps,
            depth: args.shared.depth,
            output_file: args.output_file,
            pipe: args.pipe,
        })
    }
}

fn api_key_from_env() -> Result<ApiKey, AppError> {
    let raw = std::env::var("NOTION_API_KEY").map_err(|_| {
        AppError::MissingConfiguration("NOTION_API_KEY environment variable not set".to_string())
    })?;
    Ok(ApiKey::new(raw)?)
}

fn require_url_property(shared: &SharedArgs) -> Result<PropertyName, AppError> {
    let name = shared.url_property.trim();
    if name.is_empty() {
        return Err(AppError::MissingConfiguration(
            "--url-property must not be empty".to_string(),
        ));
    }
    Ok(PropertyName::from(name))
}

fn manifest_dir(shared: &SharedArgs) -> PathBuf {
    shared
        .manifest_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(MANIFEST_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_both_subcommands() {
        let cli = CommandLineInput::try_parse_from([
            "notion2docs",
            "manifest",
            "1107e9d7682d455287113965a3979313",
            "--url-property",
            "Published",
            "--max-rps",
            "2",
        ])
        .unwrap();
        match cli.command {
            Command::Manifest(args) => {
                assert_eq!(args.shared.url_property, "Published");
                assert_eq!(args.shared.max_rps, 2);
            }
            other => panic!("expected manifest subcommand, got {:?}", other),
        }

        let cli = CommandLineInput::try_parse_from([
            "notion2docs",
            "export",
            "https://www.notion.so/My-Page-1107e9d7682d455287113965a3979313",
            "--use-url-path",
            "--pipe",
        ])
        .unwrap();
        match cli.command {
            Command::Export(args) => {
                assert!(args.use_url_path);
                assert!(args.pipe);
                assert_eq!(args.shared.depth, DEFAULT_FETCH_DEPTH);
            }
            other => panic!("expected export subcommand, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_url_property_is_rejected() {
        let shared = SharedArgs {
            url_property: "   ".to_string(),
            manifest_dir: None,
            max_rps: DEFAULT_MAX_REQUESTS_PER_SECOND,
            depth: DEFAULT_FETCH_DEPTH,
        };
        assert!(require_url_property(&shared).is_err());
    }
}
