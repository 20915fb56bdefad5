use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::attendee::collect_attendees;
use crate::config::AppConfig;
use crate::csv_writer::write_to_temp_file;
use crate::meetup::MeetupApi;
use crate::spreadsheet::{spreadsheet_title, DocumentHandle, DocumentService, Spreadsheet};

/// 実行時のオプション
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// CSVの一時ファイルを削除しない
    pub keep_csv: bool,

    /// アップロードと共有を行わない（CSVは残す）
    pub no_upload: bool,
}

/// 実行結果
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub event_id: String,
    pub attendees: usize,
    pub csv_path: PathBuf,
    pub csv_kept: bool,
    pub document: Option<DocumentHandle>,
    pub shared: usize,
}

/// イベント検索からスプレッドシート共有までを順番に実行する
pub async fn run<M, D>(
    config: &AppConfig,
    meetup: &M,
    documents: &D,
    options: RunOptions,
) -> Result<RunSummary>
where
    M: MeetupApi + ?Sized,
    D: DocumentService + ?Sized,
{
    let group = &config.meetup.group_urlname;

    let event_id = meetup
        .next_event_id(group)
        .await
        .context("Failed to look up the next event")?;

    let rsvps = meetup
        .fetch_rsvps(&event_id)
        .await
        .context("Failed to download RSVPs")?;

    let attendees = collect_attendees(&rsvps);
    info!("{} attendees answered yes for event {}", attendees.len(), event_id);

    let temp_dir = config.general.temp_dir.as_deref().map(Path::new);
    let csv_path = write_to_temp_file(&attendees, temp_dir)?;

    let mut summary = RunSummary {
        event_id: event_id.clone(),
        attendees: attendees.len(),
        csv_path: csv_path.clone(),
        csv_kept: true,
        document: None,
        shared: 0,
    };

    if options.no_upload {
        info!("Upload skipped, CSV left at {}", csv_path.display());
        return Ok(summary);
    }

    let title = spreadsheet_title(group, &event_id, Utc::now());
    let sheet = Spreadsheet::new(title, csv_path.clone());

    summary.document = sheet.upload(documents).await?;

    match &summary.document {
        Some(document) => {
            summary.shared = sheet
                .share(documents, document, &config.collaborators)
                .await?;
        }
        None => warn!("No spreadsheet was created, skipping sharing"),
    }

    if options.keep_csv {
        info!("CSV kept at {}", csv_path.display());
    } else {
        std::fs::remove_file(&csv_path)
            .with_context(|| format!("Failed to remove {}", csv_path.display()))?;
        summary.csv_kept = false;
    }

    Ok(summary)
}
