use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::GoogleConfig;
use crate::google::obtain_access_token;

pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// アップロード時にCSVをGoogleスプレッドシートへ変換させるためのMIMEタイプ
pub const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

const MULTIPART_BOUNDARY: &str = "meetup_rsvp_sheets_part_boundary";

/// アップロード済みドキュメント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    pub id: String,
    pub title: String,

    /// 共有設定（ACL）を追加するためのURL
    pub acl_link: String,
}

/// アクセス権の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    /// 対象の種類（"user"）
    #[serde(rename = "type")]
    pub scope_type: String,

    /// 対象のメールアドレス
    #[serde(rename = "emailAddress")]
    pub scope_value: String,

    /// "reader" / "commenter" / "writer" など
    pub role: String,
}

impl AclEntry {
    pub fn user(email: &str, role: &str) -> Self {
        Self {
            scope_type: "user".to_string(),
            scope_value: email.to_string(),
            role: role.to_string(),
        }
    }
}

/// ドキュメントサービスへのアクセス
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// 認証を行う
    async fn authenticate(&self) -> Result<()>;

    /// ファイルを新しいドキュメントとしてアップロード
    async fn upload(&self, title: &str, path: &Path, content_type: &str) -> Result<DocumentHandle>;

    /// ドキュメントにアクセス権を追加
    async fn share(&self, document: &DocumentHandle, entry: &AclEntry) -> Result<AclEntry>;
}

/// Drive APIのファイル情報
#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

/// Drive APIの権限情報（emailAddress は省略されることがある）
#[derive(Debug, Deserialize)]
struct DrivePermission {
    #[serde(rename = "type")]
    scope_type: Option<String>,
    #[serde(rename = "emailAddress")]
    email_address: Option<String>,
    role: Option<String>,
}

/// Google DriveのAPIクライアント
pub struct GoogleDriveClient {
    config: GoogleConfig,
    client: reqwest::Client,
    token: OnceCell<String>,
}

impl GoogleDriveClient {
    /// 新しいGoogle Driveクライアントを作成（認証は最初の利用時）
    pub fn new(config: &GoogleConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            config: config.clone(),
            client,
            token: OnceCell::new(),
        })
    }

    /// 取得済みのアクセストークンで作成
    #[cfg(test)]
    fn with_token(config: &GoogleConfig, token: &str) -> Self {
        Self {
            config: config.clone(),
            client: reqwest::Client::new(),
            token: OnceCell::from(token.to_string()),
        }
    }

    async fn access_token(&self) -> Result<&str> {
        let token = self
            .token
            .get_or_try_init(|| obtain_access_token(&self.config, &self.client))
            .await?;
        Ok(token.as_str())
    }

    /// ファイルIDから共有設定のURLを作る
    pub fn acl_link(&self, file_id: &str) -> String {
        acl_link(&self.config.files_uri, file_id)
    }
}

#[async_trait]
impl DocumentService for GoogleDriveClient {
    async fn authenticate(&self) -> Result<()> {
        self.access_token().await?;
        debug!("Authenticated to Google Drive");
        Ok(())
    }

    async fn upload(&self, title: &str, path: &Path, content_type: &str) -> Result<DocumentHandle> {
        let token = self.access_token().await?;

        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let metadata = serde_json::json!({
            "name": title,
            "mimeType": SPREADSHEET_MIME_TYPE,
        });
        let body = multipart_related_body(MULTIPART_BOUNDARY, &metadata, content_type, &content);

        let mut url = url::Url::parse(&self.config.upload_uri)
            .with_context(|| format!("Invalid upload uri: {}", self.config.upload_uri))?;
        url.query_pairs_mut().append_pair("uploadType", "multipart");

        debug!("APIリクエスト送信: POST {} ({} bytes)", url, body.len());

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", MULTIPART_BOUNDARY),
            )
            .body(body)
            .send()
            .await
            .context("Failed to send upload request")?;

        let status = response.status();
        if !status.is_success() {
            let err_text = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Failed to upload document: HTTP status {}, response: {}",
                status,
                err_text
            ));
        }

        let file: DriveFile = response
            .json()
            .await
            .context("Failed to parse upload response")?;

        Ok(DocumentHandle {
            acl_link: self.acl_link(&file.id),
            title: file.name.unwrap_or_else(|| title.to_string()),
            id: file.id,
        })
    }

    async fn share(&self, document: &DocumentHandle, entry: &AclEntry) -> Result<AclEntry> {
        let token = self.access_token().await?;

        debug!("APIリクエスト送信: POST {}", document.acl_link);

        let response = self
            .client
            .post(&document.acl_link)
            .bearer_auth(token)
            .json(entry)
            .send()
            .await
            .context("Failed to send permission request")?;

        let status = response.status();
        if !status.is_success() {
            let err_text = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Failed to share document with {}: HTTP status {}, response: {}",
                entry.scope_value,
                status,
                err_text
            ));
        }

        let granted: DrivePermission = response
            .json()
            .await
            .context("Failed to parse permission response")?;

        // 返されなかった項目は要求した値で補う
        Ok(AclEntry {
            scope_type: granted.scope_type.unwrap_or_else(|| entry.scope_type.clone()),
            scope_value: granted.email_address.unwrap_or_else(|| entry.scope_value.clone()),
            role: granted.role.unwrap_or_else(|| entry.role.clone()),
        })
    }
}

/// アップロードするスプレッドシート
#[derive(Debug, Clone)]
pub struct Spreadsheet {
    pub title: String,
    pub path: PathBuf,
}

impl Spreadsheet {
    pub fn new(title: String, path: PathBuf) -> Self {
        Self { title, path }
    }

    /// CSVをアップロードする
    ///
    /// 認証の失敗はエラーとして返すが、アップロード自体の失敗はログに残して `None` を返す。
    pub async fn upload<D: DocumentService + ?Sized>(&self, service: &D) -> Result<Option<DocumentHandle>> {
        service
            .authenticate()
            .await
            .context("Failed to authenticate to the document service")?;

        match service.upload(&self.title, &self.path, CSV_CONTENT_TYPE).await {
            Ok(document) => {
                info!("Uploaded spreadsheet '{}' ({})", document.title, document.id);
                Ok(Some(document))
            }
            Err(e) => {
                error!("Failed to upload spreadsheet '{}': {:#}", self.title, e);
                Ok(None)
            }
        }
    }

    /// 共有相手を順番に追加する。最初の失敗で中断する
    pub async fn share<D: DocumentService + ?Sized>(
        &self,
        service: &D,
        document: &DocumentHandle,
        collaborators: &BTreeMap<String, String>,
    ) -> Result<usize> {
        let mut shared = 0;

        for (email, role) in collaborators {
            let entry = AclEntry::user(email, role);
            let granted = service
                .share(document, &entry)
                .await
                .with_context(|| format!("Failed to share '{}' with {}", document.title, email))?;

            info!(
                "{} {} added as a {}",
                granted.scope_type, granted.scope_value, granted.role
            );
            shared += 1;
        }

        Ok(shared)
    }
}

/// "グループ名-イベントID-UNIX時刻" 形式のタイトル
pub fn spreadsheet_title(group_urlname: &str, event_id: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{}.{:06}",
        group_urlname,
        event_id,
        now.timestamp(),
        now.timestamp_subsec_micros()
    )
}

pub fn acl_link(files_uri: &str, file_id: &str) -> String {
    format!(
        "{}/{}/permissions",
        files_uri.trim_end_matches('/'),
        urlencoding::encode(file_id)
    )
}

/// Drive APIのマルチパートアップロード用ボディ（メタデータ + 本体）
pub fn multipart_related_body(
    boundary: &str,
    metadata: &serde_json::Value,
    content_type: &str,
    content: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 256);
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{m}\r\n--{b}\r\nContent-Type: {ct}\r\n\r\n",
            b = boundary,
            m = metadata,
            ct = content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}
