use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::{ColoredString, Colorize};
use passport_extraction::ai::OpenAiExtractionService;
use passport_extraction::{
    ExtractOutcome, ExtractionOrchestrator, PassportData, RawImage, ServiceConfig, Snapshot,
    StateKind, WorkflowState,
};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Extract the data page fields from a passport image.
#[derive(Parser, Debug)]
#[command(name = "passport", version, about)]
struct Args {
    /// Image file (JPEG, PNG, WebP, ...)
    image: PathBuf,

    /// Model to use (overrides PASSPORT_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// OpenAI-compatible API base URL (overrides OPENAI_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in seconds (overrides PASSPORT_TIMEOUT_SECS)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    /// Print the record as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env first so RUST_LOG and the service settings can come from it
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,passport_extraction=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    tracing::info!(model = %config.model, base_url = %config.base_url, "Starting passport extraction");

    let service = OpenAiExtractionService::from_config(&config)
        .context("Failed to build extraction service")?;
    let orchestrator = ExtractionOrchestrator::new(service);

    let printer = tokio::spawn(print_transitions(orchestrator.subscribe()));

    if orchestrator.on_image_selected(RawImage::from_path(args.image.clone())).await == StateKind::Ready {
        let outcome = orchestrator
            .extract()
            .await
            .context("Extraction could not start")?;
        tracing::debug!(outcome = ?outcome, "Extraction returned");
        if outcome == ExtractOutcome::AlreadyInFlight {
            anyhow::bail!("an extraction was already running");
        }
    }

    let state = orchestrator.state();

    // Dropping the orchestrator closes the channel and ends the printer
    drop(orchestrator);
    printer.await.context("Status printer panicked")?;

    match state {
        WorkflowState::Succeeded { record, .. } => {
            if args.json {
                let rendered =
                    serde_json::to_string_pretty(&record).context("Failed to render JSON")?;
                println!("{}", rendered);
            } else {
                print_table(&record);
            }
            Ok(ExitCode::SUCCESS)
        }
        WorkflowState::Failed { message } => {
            eprintln!("{} {}", "✗".bright_red().bold(), message.red());
            Ok(ExitCode::FAILURE)
        }
        other => {
            eprintln!("{} ended in unexpected state: {}", "✗".bright_red(), other.kind());
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Environment first, then flags on top.
fn load_config(args: &Args) -> Result<ServiceConfig> {
    let mut config = ServiceConfig::from_env().context("Invalid service configuration")?;

    if let Some(model) = &args.model {
        config = config.with_model(model.clone());
    }
    if let Some(base_url) = &args.base_url {
        config = config.with_base_url(base_url.clone());
    }
    if let Some(secs) = args.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    Ok(config)
}

/// One status line per observed state. Intermediate states may be coalesced.
async fn print_transitions(mut rx: watch::Receiver<Snapshot>) {
    while rx.changed().await.is_ok() {
        let kind = rx.borrow_and_update().state.kind();
        let line = match kind {
            StateKind::Idle => "idle".dimmed(),
            StateKind::Ready => "image ready".cyan(),
            StateKind::Extracting => "extracting...".yellow(),
            StateKind::Succeeded => "extracted".bright_green(),
            StateKind::Failed => "failed".bright_red(),
        };
        eprintln!("{} {}", "→".bright_blue(), line);
    }
}

fn print_table(record: &PassportData) {
    let fields = record.fields();
    let width = fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

    println!();
    for (label, value) in fields {
        let label = format!("{:<width$}", label, width = width);
        println!("  {}  {}", label.bright_cyan(), field_cell(value));
    }
    println!();

    let blank = record.blank_count();
    if blank > 0 {
        println!("  {}", format!("{} field(s) could not be read", blank).yellow());
    }
}

/// Whitespace-only values count as unread, same as `blank_count`.
fn field_cell(value: &str) -> ColoredString {
    if value.trim().is_empty() {
        "(not visible)".dimmed()
    } else {
        value.bold()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_field_is_not_visible() {
        assert!(field_cell("   ").to_string().contains("(not visible)"));
        assert!(field_cell("").to_string().contains("(not visible)"));
        assert!(field_cell("JANE DOE").to_string().contains("JANE DOE"));
    }

    #[test]
    fn test_table_and_blank_count_agree() {
        let record = PassportData {
            name: "JANE DOE".to_string(),
            sex: "  ".to_string(),
            ..PassportData::default()
        };

        let unread = record
            .fields()
            .iter()
            .filter(|(_, value)| field_cell(value).to_string().contains("(not visible)"))
            .count();
        assert_eq!(unread, record.blank_count());
        assert_eq!(unread, 8);
    }
}
