use anyhow::Result;
use std::path::{Path, PathBuf};

/// ユーザーホームディレクトリのパスを取得
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// XDG設定ディレクトリを取得（作成はしない）
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(dir)
    } else {
        get_home_dir()?.join(".config")
    };

    Ok(config_dir.join("meetup_rsvp_sheets"))
}

/// 設定ファイルの場所を決める
///
/// 指定されたパスが存在しなければXDG設定ディレクトリの同名ファイルを探す。
pub fn resolve_config_path(requested: &Path) -> PathBuf {
    if requested.exists() || requested.is_absolute() {
        return requested.to_path_buf();
    }

    match get_config_dir() {
        Ok(dir) => {
            let candidate = dir.join(requested);
            if candidate.exists() {
                candidate
            } else {
                requested.to_path_buf()
            }
        }
        Err(_) => requested.to_path_buf(),
    }
}

/// ログ出力用にURLのクエリからAPIキーを伏せる
pub fn redact_key(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            let pairs: Vec<(String, String)> = parsed
                .query_pairs()
                .map(|(k, v)| {
                    let v = if k == "key" { "***".to_string() } else { v.into_owned() };
                    (k.into_owned(), v)
                })
                .collect();
            if pairs.is_empty() {
                return parsed.to_string();
            }
            parsed.query_pairs_mut().clear().extend_pairs(pairs);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}
