use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::info;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use meetup_rsvp_sheets::app::{self, RunOptions};
use meetup_rsvp_sheets::config;
use meetup_rsvp_sheets::meetup::MeetupClient;
use meetup_rsvp_sheets::spreadsheet::GoogleDriveClient;
use meetup_rsvp_sheets::utils;

/// Export the yes RSVPs of the next Meetup event to a shared Google spreadsheet
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Args {
    /// Path to config file
    #[clap(short, long, value_parser, default_value = "config.toml")]
    config: PathBuf,

    /// Write a sample config file to the given path and exit
    #[clap(long)]
    init_config: bool,

    /// Do not delete the temporary CSV file
    #[clap(long)]
    keep_csv: bool,

    /// Only write the CSV file; skip upload and sharing
    #[clap(long)]
    no_upload: bool,
}

/// アプリケーションのロギングを初期化
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let args = Args::parse();

    // サンプル設定を書き出して終了
    if args.init_config {
        config::generate_sample_config(&args.config)?;
        info!("Sample config written to {}", args.config.display());
        return Ok(());
    }

    let config_path = utils::resolve_config_path(&args.config);
    let config = config::load_config(&config_path)
        .context("Failed to load configuration")?;

    info!("Starting meetup_rsvp_sheets v{}", env!("CARGO_PKG_VERSION"));

    let timeout = Duration::from_secs(config.general.request_timeout_secs);
    let meetup = MeetupClient::new(&config.meetup, timeout)?;
    let drive = GoogleDriveClient::new(&config.google, timeout)?;

    let options = RunOptions {
        keep_csv: args.keep_csv,
        no_upload: args.no_upload,
    };

    let summary = app::run(&config, &meetup, &drive, options).await?;

    match &summary.document {
        Some(document) => info!(
            "Event {}: {} attendees uploaded as '{}' and shared with {} collaborators",
            summary.event_id, summary.attendees, document.title, summary.shared
        ),
        None => info!(
            "Event {}: {} attendees, no spreadsheet was uploaded",
            summary.event_id, summary.attendees
        ),
    }

    if summary.csv_kept {
        info!("CSV file: {}", summary.csv_path.display());
    }

    Ok(())
}
