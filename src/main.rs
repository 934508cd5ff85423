// src/main.rs

use std::fs;
use std::sync::Arc;

use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};

use notion2docs::config::{
    Command, CommandLineInput, ExportRunConfig, ManifestRunConfig,
};
use notion2docs::output::{deliver, DeliveryTarget, OutputPlan, OutputReport};
use notion2docs::pipeline::{ContentSource, DocumentDelivery, ReferenceResolver};
use notion2docs::types::{NotionId, PortableDocument};
use notion2docs::{
    AppError, ManifestBuilder, ManifestBuilderConfig, ManifestStore, NotionHttpClient,
    PageExport, PageFetcher, PageRefConfig, PageReferenceHandler, RateLimiter,
};

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("notion2docs.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Builds or updates the manifest for a workspace root.
async fn run_manifest(config: ManifestRunConfig) -> Result<(), AppError> {
    let repo = Arc::new(NotionHttpClient::new(&config.api_key)?);
    let limiter = Arc::new(RateLimiter::new(config.max_rps));

    let builder = ManifestBuilder::new(
        repo,
        limiter,
        ManifestBuilderConfig {
            url_property_name: config.url_property.clone(),
            manifest_dir: config.manifest_dir.clone(),
            max_depth: config.depth,
        },
    );
    let report = builder.build(&config.root).await?;

    println!(
        "Manifest updated: {} databases scanned, {} of {} pages had a '{}' URL.",
        report.databases_scanned, report.entries_written, report.pages_visited, config.url_property
    );
    if report.branches_skipped > 0 {
        eprintln!(
            "⚠️  {} branch(es) skipped after errors; their pages keep any previous entries.",
            report.branches_skipped
        );
    }
    Ok(())
}

/// Exports one page with references resolved: fetch → resolve → deliver.
async fn run_export(config: ExportRunConfig) -> Result<(), AppError> {
    let run = PageExportRun::new(&config)?;

    let mut store = ManifestStore::initialize(&config.manifest_dir, &config.manifest_root)?;
    let mut export = run.fetch(&config.page).await?;
    run.resolve(&mut store, &mut export)?;
    // Self-registration may have added an entry for this page.
    store.save()?;

    let document = compose(&export)?;
    let report = run.deliver(document)?;
    run.report_completion(&export, &report);

    if !report.is_success() {
        return Err(AppError::DeliveryFailed {
            failures: report.failed.iter().map(|f| f.error.clone()).collect(),
        });
    }
    Ok(())
}

/// Serializes the rewritten export as the portable document.
fn compose(export: &PageExport) -> Result<PortableDocument, AppError> {
    let json = serde_json::to_string_pretty(export).map_err(|err| AppError::InternalError {
        message: "Failed to serialize page export".to_string(),
        source: Some(Box::new(err)),
    })?;
    Ok(PortableDocument::new(json))
}

/// Orchestrates one page export run.
struct PageExportRun<'a> {
    config: &'a ExportRunConfig,
    fetcher: PageFetcher,
    handler: PageReferenceHandler,
}

impl<'a> PageExportRun<'a> {
    fn new(config: &'a ExportRunConfig) -> Result<Self, AppError> {
        let repo = Arc::new(NotionHttpClient::new(&config.api_key)?);
        let limiter = Arc::new(RateLimiter::new(config.max_rps));
        let fetcher = PageFetcher::new(repo, limiter, config.depth);

        let mut ref_config = PageRefConfig::new(config.url_property.clone());
        ref_config.use_url_path = config.use_url_path;
        ref_config.fail_forward = config.fail_forward;
        let handler = PageReferenceHandler::new(ref_config)?;

        Ok(Self {
            config,
            fetcher,
            handler,
        })
    }

    fn report_completion(&self, export: &PageExport, report: &OutputReport) {
        if self.config.pipe {
            return;
        }

        for warning in &export.warnings {
            eprintln!("⚠️  {}", warning);
        }
        println!(
            "📄 Exported '{}' ({} top-level blocks).",
            export.page.title,
            export.blocks.len()
        );
        for completed in &report.completed {
            if let DeliveryTarget::WriteFile { path, .. } = &completed.operation {
                println!("✓ Document saved to {}", path.display());
            }
        }
    }
}

#[async_trait::async_trait]
impl ContentSource for PageExportRun<'_> {
    async fn fetch(&self, id: &NotionId) -> Result<PageExport, AppError> {
        self.fetcher.fetch(id).await
    }
}

impl ReferenceResolver for PageExportRun<'_> {
    fn resolve(
        &self,
        store: &mut ManifestStore,
        export: &mut PageExport,
    ) -> Result<(), AppError> {
        self.handler.process(store, export)
    }
}

impl DocumentDelivery for PageExportRun<'_> {
    fn deliver(&self, document: PortableDocument) -> Result<OutputReport, AppError> {
        let content = document.into_string();
        let mut plan = OutputPlan::new();

        match (&self.config.output_file, self.config.pipe) {
            (_, true) => {
                plan = plan.with_operation(DeliveryTarget::PrintToStdout { content });
            }
            (Some(path), false) => {
                plan = plan.with_operation(DeliveryTarget::WriteFile {
                    path: path.clone(),
                    content,
                });
            }
            (None, false) => {
                plan = plan.with_operation(DeliveryTarget::PrintToStdout { content });
            }
        }

        deliver(plan)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    match cli.command {
        Command::Manifest(args) => run_manifest(ManifestRunConfig::resolve(args)?).await?,
        Command::Export(args) => run_export(ExportRunConfig::resolve(args)?).await?,
    }

    Ok(())
}
