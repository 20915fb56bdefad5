use anyhow::{Context, Result};
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::attendee::Attendee;

/// 参加者を "name,answer" の行として書き出す
///
/// ヘッダー行はなく、カンマや改行のエスケープもしない。
pub fn write_attendees<W: Write>(writer: &mut W, attendees: &[Attendee]) -> Result<()> {
    for attendee in attendees {
        writeln!(writer, "{},{}", attendee.name, attendee.answer)
            .context("Failed to write attendee line")?;
    }
    Ok(())
}

/// 一時ファイルにCSVを書き出し、そのパスを返す
///
/// ファイルは削除されずに残るので、呼び出し側が片付ける。
pub fn write_to_temp_file(attendees: &[Attendee], dir: Option<&Path>) -> Result<PathBuf> {
    let mut builder = tempfile::Builder::new();
    builder.suffix("csv");

    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .context("Failed to create temporary CSV file")?;

    write_attendees(&mut file, attendees)?;
    file.flush().context("Failed to flush temporary CSV file")?;

    let path = file
        .into_temp_path()
        .keep()
        .context("Failed to keep temporary CSV file")?;

    info!("Wrote {} attendees to {}", attendees.len(), path.display());
    Ok(path)
}
