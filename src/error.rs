use thiserror::Error;

/// Meetup APIとのやり取りで発生するエラー
#[derive(Debug, Error)]
pub enum RsvpError {
    /// 200以外のHTTPステータス
    #[error("HTTP status code: {status}")]
    Http { status: u16, url: String },

    /// 次回イベントが存在しない
    #[error("No upcoming event found for group '{0}'")]
    NoUpcomingEvent(String),

    /// イベントURLからIDを取り出せない
    #[error("Malformed event url: {0}")]
    MalformedEventUrl(String),
}

impl RsvpError {
    /// HTTPエラーの場合はステータスコードを返す
    pub fn status(&self) -> Option<u16> {
        match self {
            RsvpError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
