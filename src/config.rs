use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

/// 環境変数で設定を上書きする際のプレフィックス（例: MEETUP_RSVP__MEETUP__API_KEY）
pub const ENV_PREFIX: &str = "MEETUP_RSVP";

/// アプリケーション全体の設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// アプリケーション全般の設定
    #[serde(default)]
    pub general: GeneralConfig,

    /// Meetup API の設定
    pub meetup: MeetupConfig,

    /// Google Drive API の設定
    pub google: GoogleConfig,

    /// 共有相手（メールアドレス → ロール）
    #[serde(default)]
    pub collaborators: BTreeMap<String, String>,
}

/// 一般設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// HTTPリクエストのタイムアウト（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// CSVの一時ファイルを作るディレクトリ（未指定ならOSの一時ディレクトリ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            temp_dir: None,
        }
    }
}

/// Meetup API 設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetupConfig {
    /// MeetupのURLに含まれるグループ名
    pub group_urlname: String,

    /// Meetup API キー
    pub api_key: String,

    #[serde(default = "default_events_uri")]
    pub events_uri: String,

    #[serde(default = "default_rsvps_uri")]
    pub rsvps_uri: String,
}

/// Google Drive API 設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// クライアントID
    pub client_id: String,

    /// クライアントシークレット
    pub client_secret: String,

    /// リフレッシュトークン（空の場合はブラウザ認証）
    #[serde(default)]
    pub refresh_token: String,

    /// アップロード用エンドポイント
    #[serde(default = "default_upload_uri")]
    pub upload_uri: String,

    /// ファイル操作用エンドポイント
    #[serde(default = "default_files_uri")]
    pub files_uri: String,
}

// デフォルト値
fn default_request_timeout() -> u64 {
    30
}

fn default_events_uri() -> String {
    "https://api.meetup.com/2/events".to_string()
}

fn default_rsvps_uri() -> String {
    "https://api.meetup.com/2/rsvps".to_string()
}

fn default_upload_uri() -> String {
    "https://www.googleapis.com/upload/drive/v3/files".to_string()
}

fn default_files_uri() -> String {
    "https://www.googleapis.com/drive/v3/files".to_string()
}

/// 設定ファイルを読み込み、環境変数で上書きする
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();

    let settings = config::Config::builder()
        .add_source(config::File::from(path).format(config::FileFormat::Toml))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config: AppConfig = settings
        .try_deserialize()
        .context("Failed to parse config file")?;

    Ok(config)
}

/// デフォルトの設定を作成する
pub fn create_default_config() -> AppConfig {
    let mut collaborators = BTreeMap::new();
    collaborators.insert("co-organizer@example.com".to_string(), "writer".to_string());

    AppConfig {
        general: GeneralConfig::default(),
        meetup: MeetupConfig {
            group_urlname: "your-group-urlname".to_string(),
            api_key: "your_meetup_api_key".to_string(),
            events_uri: default_events_uri(),
            rsvps_uri: default_rsvps_uri(),
        },
        google: GoogleConfig {
            client_id: "your_google_client_id".to_string(),
            client_secret: "your_google_client_secret".to_string(),
            refresh_token: String::new(),
            upload_uri: default_upload_uri(),
            files_uri: default_files_uri(),
        },
        collaborators,
    }
}

/// サンプル設定ファイルを作成する（既存のファイルは上書きしない）
pub fn generate_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let config = create_default_config();
    let toml_str = toml::to_string_pretty(&config)
        .context("Failed to serialize config")?;

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            bail!("Config file {} already exists, refusing to overwrite it", path.display());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to create {}", path.display()));
        }
    };

    file.write_all(toml_str.as_bytes())
        .context("Failed to write sample config file")?;

    Ok(())
}
