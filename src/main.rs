// Year Planner - printable one-page yearly overview from calendar data
// Command line entry point

use anyhow::{anyhow, bail, Context};
use chrono::{Local, Month};
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use yearplanner::calendar::build_authorization_url;
use yearplanner::config::load_settings;
use yearplanner::models::{parse_month_name, Orientation, PlannerSettings, MONTHS};
use yearplanner::utils::logging::{init_logging, log_error_with_context};
use yearplanner::{
    DocumentHeader, HttpCalendarExchange, ImportSummary, PlannerError, PlannerSession, RenderedDocument,
    Theme,
};

#[derive(Parser)]
#[command(name = "yearplanner")]
#[command(about = "Turn a calendar into a printable yearly planner")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the per-user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct PageArgs {
    /// Output PDF
    #[arg(short, long, value_name = "PATH")]
    output: PathBuf,

    /// Month notes, e.g. --note "March=Book the venue"
    #[arg(long = "note", value_name = "MONTH=TEXT")]
    notes: Vec<String>,

    /// Replace one event's line, e.g. --override "March:evt-1=Review (online)"
    #[arg(long = "override", value_name = "MONTH:EVENT_ID=TEXT")]
    overrides: Vec<String>,

    /// A4 portrait instead of landscape
    #[arg(long)]
    portrait: bool,

    /// List every event instead of a short preview per month
    #[arg(long)]
    all_events: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Import a calendar file and print its events by month
    Inspect {
        file: PathBuf,
    },
    /// Import a calendar file and write the planner PDF
    Export {
        file: PathBuf,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Import through the calendar exchange service and write the planner PDF
    GoogleExport {
        /// Authorization code from the consent screen
        #[arg(long)]
        code: String,
        /// Seconds to wait for the exchange (defaults to the configured timeout)
        #[arg(long)]
        timeout: Option<u64>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Print the consent URL for read-only calendar access
    AuthUrl {
        #[arg(long)]
        client_id: String,
        #[arg(long)]
        redirect_uri: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_logging() {
        eprintln!("Logging unavailable: {}", e);
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log_error_with_context(&err, "yearplanner");
            match err.downcast_ref::<PlannerError>() {
                Some(planner) => eprintln!("{}", planner.user_message()),
                None => eprintln!("{:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Inspect { file } => {
            let session = PlannerSession::new();
            let summary = session.import_ics_file(&file).await?;
            print_inspection(&session, &summary).await;
        }
        Command::Export { file, page } => {
            let session = PlannerSession::new();
            let summary = session.import_ics_file(&file).await?;
            println!("{}", summary.message());
            write_planner(&session, &summary, &settings, &page).await?;
        }
        Command::GoogleExport { code, timeout, page } => {
            let exchange = HttpCalendarExchange::from_settings(&settings.exchange)?;
            let timeout = Duration::from_secs(timeout.unwrap_or(settings.exchange.timeout_secs));
            let session = PlannerSession::new();
            let summary = session.import_remote(&exchange, &code, timeout).await?;
            println!("{}", summary.message());
            write_planner(&session, &summary, &settings, &page).await?;
        }
        Command::AuthUrl {
            client_id,
            redirect_uri,
        } => {
            let redirect_uri = redirect_uri.unwrap_or_else(|| settings.exchange.redirect_uri.clone());
            println!("{}", build_authorization_url(&client_id, &redirect_uri)?);
        }
    }
    Ok(())
}

async fn print_inspection(session: &PlannerSession, summary: &ImportSummary) {
    println!("{}", summary.message());
    for month in MONTHS {
        let events = session.events(month).await;
        if events.is_empty() {
            continue;
        }
        println!("\n{} ({})", month.name(), events.len());
        for event in &events {
            println!("  {}  [{}]", event.detail_line(), event.id);
        }
    }
}

async fn write_planner(
    session: &PlannerSession,
    summary: &ImportSummary,
    settings: &PlannerSettings,
    page: &PageArgs,
) -> anyhow::Result<()> {
    for raw in &page.notes {
        let (month, text) = parse_note(raw)?;
        session.set_month_notes(summary.generation, month, &text).await?;
    }
    for raw in &page.overrides {
        let (month, event_id, text) = parse_override(raw)?;
        if !session.events(month).await.iter().any(|e| e.id == event_id) {
            log::warn!("No event '{}' in {}; override kept but unused", event_id, month.name());
        }
        session
            .set_event_override(summary.generation, month, &event_id, &text)
            .await?;
    }

    let mut layout = settings.layout.clone();
    if page.portrait {
        layout.orientation = Orientation::Portrait;
    }
    if page.all_events {
        layout.max_events_per_cell = None;
    }

    let header = DocumentHeader {
        title: settings.document_title.clone(),
        subtitle: Some(format!("Generated on {}", Local::now().format("%Y-%m-%d"))),
    };
    let document = session
        .export_pdf(&page.output, &layout, &header, &Theme::default())
        .await
        .with_context(|| format!("writing {}", page.output.display()))?;
    report(&page.output, &document);
    Ok(())
}

fn report(path: &Path, document: &RenderedDocument) {
    info!("Export complete: {}", path.display());
    println!(
        "Wrote {} ({} page{})",
        path.display(),
        document.page_count,
        if document.page_count == 1 { "" } else { "s" }
    );
    if let Some(warning) = &document.warning {
        println!("{}", warning);
    }
}

fn month_arg(name: &str) -> anyhow::Result<Month> {
    parse_month_name(name.trim()).ok_or_else(|| anyhow!("'{}' is not a month name", name.trim()))
}

/// `Month=text`
fn parse_note(raw: &str) -> anyhow::Result<(Month, String)> {
    let Some((month, text)) = raw.split_once('=') else {
        bail!("expected MONTH=TEXT, got '{}'", raw);
    };
    Ok((month_arg(month)?, text.to_string()))
}

/// `Month:eventId=text`
fn parse_override(raw: &str) -> anyhow::Result<(Month, String, String)> {
    let Some((target, text)) = raw.split_once('=') else {
        bail!("expected MONTH:EVENT_ID=TEXT, got '{}'", raw);
    };
    let Some((month, event_id)) = target.split_once(':') else {
        bail!("expected MONTH:EVENT_ID=TEXT, got '{}'", raw);
    };
    if event_id.trim().is_empty() {
        bail!("missing event id in '{}'", raw);
    }
    Ok((month_arg(month)?, event_id.trim().to_string(), text.to_string()))
}
