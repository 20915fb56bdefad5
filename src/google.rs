use anyhow::{anyhow, Context, Result};
use log::{debug, error, warn};
use serde::Deserialize;
use yup_oauth2::InstalledFlowAuthenticator;

use crate::config::GoogleConfig;

const AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// アップロードしたファイルの作成と共有に必要なスコープ
pub const DRIVE_SCOPES: &[&str] = &["https://www.googleapis.com/auth/drive.file"];

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

fn application_secret(config: &GoogleConfig) -> yup_oauth2::ApplicationSecret {
    yup_oauth2::ApplicationSecret {
        client_id: config.client_id.clone(),
        client_secret: config.client_secret.clone(),
        auth_uri: AUTH_URI.to_string(),
        token_uri: TOKEN_URI.to_string(),
        redirect_uris: vec!["http://localhost".to_string()],
        project_id: None,
        client_email: None,
        auth_provider_x509_cert_url: None,
        client_x509_cert_url: None,
    }
}

/// Google APIのアクセストークンを取得
///
/// リフレッシュトークンが設定されていればそれを使い、なければブラウザ認証を行う。
pub async fn obtain_access_token(config: &GoogleConfig, client: &reqwest::Client) -> Result<String> {
    if config.refresh_token.is_empty() {
        warn!("Refresh token is empty. Browser authentication will be required");
        return browser_flow_token(config).await;
    }

    debug!("Sending token refresh request to {}", TOKEN_URI);

    let form_data = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("refresh_token", config.refresh_token.as_str()),
        ("grant_type", "refresh_token"),
    ];

    let response = client
        .post(TOKEN_URI)
        .form(&form_data)
        .send()
        .await
        .context("Failed to send token refresh request")?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());
        error!("Token refresh request failed: {} - {}", status, error_text);
        return Err(anyhow!("Token refresh request failed with status: {}", status));
    }

    let token: TokenResponse = response
        .json()
        .await
        .context("Failed to parse token response")?;

    debug!("Access token obtained, length: {}", token.access_token.len());
    Ok(token.access_token)
}

async fn browser_flow_token(config: &GoogleConfig) -> Result<String> {
    let auth = InstalledFlowAuthenticator::builder(
        application_secret(config),
        yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
    )
    .build()
    .await
    .context("Failed to create authenticator")?;

    let token = auth
        .token(DRIVE_SCOPES)
        .await
        .context("Failed to obtain access token")?;

    token
        .token()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Authenticator returned no access token"))
}
