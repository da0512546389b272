// src/publish/mod.rs
pub mod linkedin;

pub use linkedin::{build_post_body, LinkedInPublisher};

use async_trait::async_trait;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use reqwest::StatusCode;

/// Identifier used when the platform does not return one.
pub const UNKNOWN_URN: &str = "(URN not returned)";

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("posts_published_total", "Posts accepted by the platform.");
        describe_counter!("publish_errors_total", "Publish attempts that failed.");
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPost {
    pub urn: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("{0} is not set")]
    MissingCredential(&'static str),

    #[error("LinkedIn request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LinkedIn API error {status}: {body}{}", .hint.map(|h| format!(" (hint: {h})")).unwrap_or_default())]
    Api {
        status: u16,
        body: String,
        hint: Option<&'static str>,
    },
}

impl PublishError {
    pub fn status(&self) -> Option<u16> {
        match self {
            PublishError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Remediation hint for a failed publish. Informational only; nothing retries.
pub fn hint_for_status(status: StatusCode) -> Option<&'static str> {
    match status.as_u16() {
        401 => Some("access token may be expired; run the linkedin_auth binary again"),
        403 => Some("missing w_member_social scope on your LinkedIn app"),
        422 => Some("malformed request body"),
        429 => Some("LinkedIn rate limit hit; try again later"),
        s if s >= 500 => {
            Some("LinkedIn server error; check the request format and API version compatibility")
        }
        _ => None,
    }
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, text: &str) -> Result<PublishedPost, PublishError>;
    fn name(&self) -> &'static str;
}

/// Logs the post instead of sending it.
pub struct DryRunPublisher;

#[async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&self, text: &str) -> Result<PublishedPost, PublishError> {
        tracing::info!(chars = text.chars().count(), "dry run: post not published");
        Ok(PublishedPost {
            urn: UNKNOWN_URN.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}

pub(crate) fn record_success() {
    ensure_metrics_described();
    counter!("posts_published_total").increment(1);
}

pub(crate) fn record_failure() {
    ensure_metrics_described();
    counter!("publish_errors_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_cover_actionable_statuses() {
        assert!(hint_for_status(StatusCode::UNAUTHORIZED).unwrap().contains("expired"));
        assert!(hint_for_status(StatusCode::FORBIDDEN).unwrap().contains("scope"));
        assert!(hint_for_status(StatusCode::UNPROCESSABLE_ENTITY).is_some());
        assert!(hint_for_status(StatusCode::TOO_MANY_REQUESTS).is_some());
        assert!(hint_for_status(StatusCode::BAD_GATEWAY).is_some());
        assert!(hint_for_status(StatusCode::BAD_REQUEST).is_none());
        assert!(hint_for_status(StatusCode::NOT_FOUND).is_none());
    }

    #[test]
    fn api_error_message_includes_status_body_and_hint() {
        let e = PublishError::Api {
            status: 401,
            body: r#"{"message":"Expired"}"#.into(),
            hint: hint_for_status(StatusCode::UNAUTHORIZED),
        };
        let msg = e.to_string();
        assert!(msg.starts_with("LinkedIn API error 401: {\"message\":\"Expired\"}"));
        assert!(msg.contains("(hint: access token may be expired"));
        assert_eq!(e.status(), Some(401));

        let plain = PublishError::Api {
            status: 400,
            body: "bad".into(),
            hint: None,
        };
        assert_eq!(plain.to_string(), "LinkedIn API error 400: bad");
    }

    #[tokio::test]
    async fn dry_run_returns_sentinel() {
        let post = DryRunPublisher.publish("Hello").await.unwrap();
        assert_eq!(post.urn, UNKNOWN_URN);
    }
}
