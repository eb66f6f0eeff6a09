mod logging;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use export_logging::{export_info, export_warn};
use log::LevelFilter;
use thread_exporter::{
    export_filename, handle_request, ExportRequest, ExportResponse, ExporterConfig,
    JsonExportWriter, PageContext, ThreadExporter,
};

use crate::logging::LogDestination;

/// Export a NodeBB thread as JSON with every post converted to Markdown
#[derive(Parser, Debug)]
#[command(name = "nodebb-export")]
#[command(version, about, long_about = None)]
struct Args {
    /// URL of a page in the thread, e.g. https://forum.example/topic/42/slug
    #[arg(value_name = "URL")]
    url: String,

    /// Thread id, for URLs that do not carry `topic/<id>`
    #[arg(long, value_name = "TID")]
    tid: Option<String>,

    /// Thread title (skips the title lookup)
    #[arg(long)]
    title: Option<String>,

    /// Saved HTML of the thread page, searched for the title element
    #[arg(long, value_name = "FILE")]
    html: Option<PathBuf>,

    /// Title to use when neither --title nor the page HTML provides one
    #[arg(long, value_name = "TITLE")]
    document_title: Option<String>,

    /// RON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the response to this file instead of stdout
    #[arg(short, long, value_name = "FILE", conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Write the response into this directory under a name derived from the title
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Also log to ./export.log
    #[arg(long)]
    log_file: bool,

    /// Only log to the log file
    #[arg(short, long, requires = "log_file")]
    quiet: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,

    /// Single-line JSON
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(LogDestination::from_flags(args.log_file, args.quiet), level);

    match run(&args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the export succeeded. `Err` is reserved for problems with
/// the command line itself (config, input or output files).
async fn run(args: &Args) -> anyhow::Result<bool> {
    let config = load_config(args.config.as_deref())?;
    let request = ExportRequest::export(build_context(args)?);
    let exporter = ThreadExporter::from_config(config)?;

    let response = handle_request(&exporter, &request)
        .await
        .unwrap_or_else(|| ExportResponse::failure("unsupported action"));
    write_response(args, &response)?;
    Ok(response.success)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ExporterConfig> {
    let Some(path) = path else {
        return Ok(ExporterConfig::default());
    };
    if !path.exists() {
        export_warn!("config {} not found, using defaults", path.display());
        return Ok(ExporterConfig::default());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&text).with_context(|| format!("invalid config {}", path.display()))
}

fn parse_config(text: &str) -> Result<ExporterConfig, ron::error::SpannedError> {
    ron::from_str(text)
}

fn build_context(args: &Args) -> anyhow::Result<PageContext> {
    let mut context =
        PageContext::new(args.url.trim()).with_state(args.tid.clone(), args.title.clone());
    if let Some(path) = &args.html {
        let html = fs::read_to_string(path)
            .with_context(|| format!("failed to read page HTML {}", path.display()))?;
        context = context.with_dom_html(html);
    }
    if let Some(title) = &args.document_title {
        context = context.with_document_title(title.clone());
    }
    Ok(context)
}

fn write_response(args: &Args, response: &ExportResponse) -> anyhow::Result<()> {
    let target = match (&args.output, &args.output_dir) {
        (Some(path), _) => Some(JsonExportWriter::for_file(path)),
        (None, Some(dir)) => {
            let title = response
                .data
                .as_ref()
                .map(|data| data.title.as_str())
                .unwrap_or_default();
            Some((JsonExportWriter::new(dir), export_filename(title, &args.url)))
        }
        (None, None) => None,
    };

    let Some((writer, filename)) = target else {
        let body = if args.compact {
            serde_json::to_string(response)?
        } else {
            serde_json::to_string_pretty(response)?
        };
        println!("{body}");
        return Ok(());
    };

    let writer = if args.compact { writer.compact() } else { writer };
    let path = writer
        .write(&filename, response)
        .with_context(|| format!("failed to write {filename}"))?;
    export_info!("wrote {}", path.display());
    Ok(())
}
