use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::config::MeetupConfig;
use crate::error::RsvpError;
use crate::utils::redact_key;

/// イベント一覧レスポンス
#[derive(Debug, Deserialize)]
pub struct EventsResponse {
    pub results: Vec<Event>,
}

/// Meetupのイベント
#[derive(Debug, Deserialize)]
pub struct Event {
    /// 例: https://www.meetup.com/group/events/123456789/
    pub event_url: String,
}

/// RSVP一覧レスポンス
#[derive(Debug, Deserialize)]
pub struct RsvpsResponse {
    pub results: Vec<Rsvp>,
}

/// 出欠回答
#[derive(Debug, Clone, Deserialize)]
pub struct Rsvp {
    /// "yes" / "no" / "waitlist"
    pub response: String,

    pub member: Member,

    /// 参加登録時の質問への回答（主催者にのみ返される）
    #[serde(default)]
    pub answers: Option<Vec<String>>,
}

/// RSVPしたメンバー
#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    /// プロフィール上の表示名
    pub name: String,
}

impl Rsvp {
    pub fn is_yes(&self) -> bool {
        self.response == "yes"
    }

    /// 最初の質問への回答、なければ空文字
    pub fn first_answer(&self) -> &str {
        self.answers
            .as_ref()
            .and_then(|answers| answers.first())
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Meetup APIへのアクセス
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeetupApi: Send + Sync {
    /// グループの次回イベントIDを取得
    async fn next_event_id(&self, group_urlname: &str) -> Result<String>;

    /// イベントのRSVP一覧を取得
    async fn fetch_rsvps(&self, event_id: &str) -> Result<Vec<Rsvp>>;
}

/// MeetupのAPIクライアント
#[derive(Debug, Clone)]
pub struct MeetupClient {
    api_key: String,
    events_uri: String,
    rsvps_uri: String,
    client: reqwest::Client,
}

impl MeetupClient {
    /// 新しいMeetupクライアントを作成
    pub fn new(config: &MeetupConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key: config.api_key.clone(),
            events_uri: config.events_uri.clone(),
            rsvps_uri: config.rsvps_uri.clone(),
            client,
        })
    }

    /// 次回イベント検索用のURL
    pub fn events_url(&self, group_urlname: &str) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.events_uri)
            .with_context(|| format!("Invalid events uri: {}", self.events_uri))?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("sign", "true")
            .append_pair("status", "upcoming")
            .append_pair("group_urlname", group_urlname);
        Ok(url)
    }

    /// RSVP取得用のURL
    pub fn rsvps_url(&self, event_id: &str) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.rsvps_uri)
            .with_context(|| format!("Invalid rsvps uri: {}", self.rsvps_uri))?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("sign", "true")
            .append_pair("event_id", event_id);
        Ok(url)
    }

    /// GETしてJSONを返す。200以外はRsvpError::Http
    async fn get_json<T: DeserializeOwned>(&self, url: url::Url) -> Result<T> {
        let shown = redact_key(url.as_str());
        debug!("APIリクエスト送信: GET {}", shown);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", shown))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            error!(
                "Meetup APIエラー: HTTP {} {} ({})",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status"),
                shown
            );
            return Err(RsvpError::Http {
                status: status.as_u16(),
                url: shown,
            }
            .into());
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse response from {}", shown))
    }
}

#[async_trait]
impl MeetupApi for MeetupClient {
    async fn next_event_id(&self, group_urlname: &str) -> Result<String> {
        let url = self.events_url(group_urlname)?;
        let events: EventsResponse = self.get_json(url).await?;
        let event_id = next_event_id_from(group_urlname, &events)?;
        info!("Next event of {}: {}", group_urlname, event_id);
        Ok(event_id)
    }

    async fn fetch_rsvps(&self, event_id: &str) -> Result<Vec<Rsvp>> {
        let url = self.rsvps_url(event_id)?;
        let rsvps: RsvpsResponse = self.get_json(url).await?;
        info!("Retrieved {} RSVPs for event {}", rsvps.results.len(), event_id);
        Ok(rsvps.results)
    }
}

/// 先頭のイベントのURLからIDを取り出す
pub fn next_event_id_from(group_urlname: &str, events: &EventsResponse) -> Result<String> {
    let first = events
        .results
        .first()
        .ok_or_else(|| RsvpError::NoUpcomingEvent(group_urlname.to_string()))?;
    Ok(event_id_from_url(&first.event_url)?)
}

/// URLを"/"で分割し、最後から2番目の要素を返す
pub fn event_id_from_url(event_url: &str) -> Result<String, RsvpError> {
    let components: Vec<&str> = event_url.split('/').collect();
    if components.len() < 2 {
        return Err(RsvpError::MalformedEventUrl(event_url.to_string()));
    }
    Ok(components[components.len() - 2].to_string())
}
