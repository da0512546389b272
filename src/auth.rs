// src/auth.rs
//! One-time LinkedIn OAuth 2.0 authorization-code flow.
//!
//! Used only by the `linkedin_auth` binary to obtain the access token and
//! person URN the publisher reads from its configuration.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use rand::Rng;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};

pub const ENV_CLIENT_ID: &str = "LINKEDIN_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "LINKEDIN_CLIENT_SECRET";
pub const SCOPES: &str = "openid profile w_member_social";
pub const CALLBACK_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:3000/callback";

#[derive(Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Authorization + token host.
    pub oauth_base: String,
    /// Profile lookup host.
    pub api_base: String,
}

impl AuthConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            oauth_base: "https://www.linkedin.com".to_string(),
            api_base: "https://api.linkedin.com".to_string(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let get = |k: &str| std::env::var(k).ok().filter(|v| !v.trim().is_empty());
        match (get(ENV_CLIENT_ID), get(ENV_CLIENT_SECRET)) {
            (Some(id), Some(secret)) => Ok(Self::new(id, secret)),
            _ => bail!(
                "{ENV_CLIENT_ID} and {ENV_CLIENT_SECRET} must be set (see .env.example)"
            ),
        }
    }

    pub fn authorization_url(&self, state: &str) -> Result<String> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/oauth/v2/authorization", self.oauth_base),
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", SCOPES),
                ("state", state),
            ],
        )
        .context("building authorization URL")?;
        Ok(url.into())
    }
}

/// 16 hex chars of randomness for the OAuth `state` parameter.
pub fn random_state() -> String {
    let bytes: [u8; 8] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub fn person_urn(sub: &str) -> String {
    format!("urn:li:person:{sub}")
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_token: String,
    pub person_urn: String,
    pub name: Option<String>,
    pub expires_in_days: u64,
}

impl Credentials {
    /// Lines ready to paste into `.env`.
    pub fn env_lines(&self) -> String {
        format!(
            "LINKEDIN_ACCESS_TOKEN={}\nLINKEDIN_PERSON_URN={}",
            self.access_token, self.person_urn
        )
    }
}

pub async fn exchange_code(
    http: &reqwest::Client,
    cfg: &AuthConfig,
    code: &str,
) -> Result<TokenResponse> {
    let resp = http
        .post(format!("{}/oauth/v2/accessToken", cfg.oauth_base))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", cfg.redirect_uri.as_str()),
            ("client_id", cfg.client_id.as_str()),
            ("client_secret", cfg.client_secret.as_str()),
        ])
        .send()
        .await
        .context("token exchange request")?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("token exchange failed {status}: {body}");
    }
    resp.json().await.context("decoding token response")
}

pub async fn fetch_userinfo(
    http: &reqwest::Client,
    cfg: &AuthConfig,
    access_token: &str,
) -> Result<UserInfo> {
    let resp = http
        .get(format!("{}/v2/userinfo", cfg.api_base))
        .bearer_auth(access_token)
        .send()
        .await
        .context("userinfo request")?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("userinfo lookup failed {status}: {body}");
    }
    resp.json().await.context("decoding userinfo response")
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Clone)]
struct CallbackState {
    cfg: Arc<AuthConfig>,
    http: reqwest::Client,
    expected_state: Arc<str>,
    done: Arc<Mutex<Option<oneshot::Sender<Result<Credentials>>>>>,
}

async fn complete(st: &CallbackState, q: CallbackParams) -> Result<Credentials> {
    if let Some(err) = q.error {
        bail!(
            "authorization failed: {err}: {}",
            q.error_description.unwrap_or_default()
        );
    }
    if q.state.as_deref() != Some(&*st.expected_state) {
        bail!("state mismatch in callback");
    }
    let code = q.code.ok_or_else(|| anyhow!("no authorization code received"))?;

    let token = exchange_code(&st.http, &st.cfg, &code).await?;
    let info = fetch_userinfo(&st.http, &st.cfg, &token.access_token).await?;
    Ok(Credentials {
        person_urn: person_urn(&info.sub),
        access_token: token.access_token,
        name: info.name,
        expires_in_days: (token.expires_in + 43_200) / 86_400,
    })
}

async fn callback(
    State(st): State<CallbackState>,
    Query(q): Query<CallbackParams>,
) -> Html<String> {
    let outcome = complete(&st, q).await;
    let page = match &outcome {
        Ok(c) => format!(
            "<h2>Authorization complete!</h2><p>Hello, {}.</p>\
             <p>Check your terminal for the values to copy into .env. You can close this tab.</p>",
            html_escape::encode_text(c.name.as_deref().unwrap_or("there"))
        ),
        Err(e) => format!(
            "<h2>Authorization failed</h2><pre>{}</pre>",
            html_escape::encode_text(&format!("{e:#}"))
        ),
    };
    if let Some(tx) = st.done.lock().await.take() {
        let _ = tx.send(outcome);
    }
    Html(page)
}

/// Serve `GET /callback` on `listener` until the first callback arrives,
/// then shut down and return its outcome.
pub async fn wait_for_callback(
    listener: TcpListener,
    cfg: AuthConfig,
    http: reqwest::Client,
    expected_state: &str,
) -> Result<Credentials> {
    let (done_tx, done_rx) = oneshot::channel();
    let st = CallbackState {
        cfg: Arc::new(cfg),
        http,
        expected_state: Arc::from(expected_state),
        done: Arc::new(Mutex::new(Some(done_tx))),
    };
    let app = Router::new().route("/callback", get(callback)).with_state(st);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let outcome = done_rx
        .await
        .map_err(|_| anyhow!("callback listener stopped before a response"));
    let _ = shutdown_tx.send(());
    server
        .await
        .context("callback server task")?
        .context("callback server")?;
    outcome?
}
