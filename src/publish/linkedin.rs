//! LinkedIn Posts API client (`POST {api_base}/posts`).

use async_trait::async_trait;
use serde::Serialize;

use super::{
    hint_for_status, record_failure, record_success, PublishError, PublishedPost, Publisher,
    UNKNOWN_URN,
};
use crate::config::linkedin::{ENV_ACCESS_TOKEN, ENV_PERSON_URN};
use crate::config::LinkedInConfig;

pub const RESTLI_PROTOCOL_VERSION: &str = "2.0.0";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostBody<'a> {
    pub author: &'a str,
    pub lifecycle_state: &'static str,
    pub visibility: &'static str,
    pub commentary: &'a str,
    pub distribution: Distribution,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub feed_distribution: &'static str,
    pub target_entities: Vec<String>,
    pub third_party_distribution_channels: Vec<String>,
}

/// Public, published, main-feed post authored by `author`.
pub fn build_post_body<'a>(author: &'a str, text: &'a str) -> PostBody<'a> {
    PostBody {
        author,
        lifecycle_state: "PUBLISHED",
        visibility: "PUBLIC",
        commentary: text,
        distribution: Distribution {
            feed_distribution: "MAIN_FEED",
            target_entities: Vec::new(),
            third_party_distribution_channels: Vec::new(),
        },
    }
}

pub struct LinkedInPublisher {
    http: reqwest::Client,
    access_token: Option<String>,
    person_urn: Option<String>,
    api_base: String,
    api_version: String,
}

impl LinkedInPublisher {
    pub fn new(cfg: &LinkedInConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            access_token: cfg.access_token.clone().filter(|t| !t.trim().is_empty()),
            person_urn: cfg.person_urn.clone().filter(|u| !u.trim().is_empty()),
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            api_version: cfg.api_version.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/posts", self.api_base)
    }

    /// Headers sent with every publish request.
    fn request_headers(&self, token: &str) -> Vec<(&'static str, String)> {
        vec![
            ("Authorization", format!("Bearer {token}")),
            ("Content-Type", "application/json".to_string()),
            ("LinkedIn-Version", self.api_version.clone()),
            ("X-Restli-Protocol-Version", RESTLI_PROTOCOL_VERSION.to_string()),
        ]
    }

    fn credentials(&self) -> Result<(&str, &str), PublishError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(PublishError::MissingCredential(ENV_ACCESS_TOKEN))?;
        let urn = self
            .person_urn
            .as_deref()
            .ok_or(PublishError::MissingCredential(ENV_PERSON_URN))?;
        Ok((token, urn))
    }
}

/// Header list safe for logs: the bearer token is masked.
pub fn redact_headers(headers: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            if name.eq_ignore_ascii_case("authorization") {
                (*name, "Bearer <redacted>".to_string())
            } else {
                (*name, value.clone())
            }
        })
        .collect()
}

#[async_trait]
impl Publisher for LinkedInPublisher {
    async fn publish(&self, text: &str) -> Result<PublishedPost, PublishError> {
        let (token, urn) = match self.credentials() {
            Ok(c) => c,
            Err(e) => {
                record_failure();
                return Err(e);
            }
        };
        let body = build_post_body(urn, text);
        let payload = serde_json::to_string(&body).unwrap_or_default();
        let url = self.endpoint();
        let headers = self.request_headers(token);

        tracing::info!(author = urn, chars = text.chars().count(), "publishing to LinkedIn");
        let mut req = self.http.post(&url);
        for (name, value) in &headers {
            req = req.header(*name, value.as_str());
        }
        let resp = match req.body(payload.clone()).send().await {
            Ok(r) => r,
            Err(e) => {
                record_failure();
                tracing::error!(
                    %url,
                    headers = ?redact_headers(&headers),
                    request = %payload,
                    error = %e,
                    "LinkedIn request failed"
                );
                return Err(e.into());
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let err_body = resp.text().await.unwrap_or_default();
            record_failure();
            tracing::error!(
                %url,
                status = status.as_u16(),
                headers = ?redact_headers(&headers),
                request = %payload,
                response = %err_body,
                "LinkedIn rejected the post"
            );
            return Err(PublishError::Api {
                status: status.as_u16(),
                body: err_body,
                hint: hint_for_status(status),
            });
        }

        let urn = resp
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN_URN)
            .to_string();
        record_success();
        tracing::info!(%urn, "post published");
        Ok(PublishedPost { urn })
    }

    fn name(&self) -> &'static str {
        "linkedin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_shape() {
        let v = serde_json::to_value(build_post_body("urn:li:person:123", "Hello")).unwrap();
        assert_eq!(v["author"], "urn:li:person:123");
        assert_eq!(v["commentary"], "Hello");
        assert_eq!(v["lifecycleState"], "PUBLISHED");
        assert_eq!(v["visibility"], "PUBLIC");
        assert_eq!(v["distribution"]["feedDistribution"], "MAIN_FEED");
        assert_eq!(v["distribution"]["targetEntities"], serde_json::json!([]));
        assert_eq!(
            v["distribution"]["thirdPartyDistributionChannels"],
            serde_json::json!([])
        );
    }

    #[test]
    fn logged_headers_are_complete_and_redacted() {
        let cfg = LinkedInConfig {
            access_token: Some("s3cr3t".into()),
            person_urn: Some("urn:li:person:1".into()),
            ..LinkedInConfig::default()
        };
        let p = LinkedInPublisher::new(&cfg, reqwest::Client::new());
        let logged = redact_headers(&p.request_headers("s3cr3t"));

        let names: Vec<_> = logged.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "Authorization",
                "Content-Type",
                "LinkedIn-Version",
                "X-Restli-Protocol-Version"
            ]
        );
        assert!(logged.iter().all(|(_, v)| !v.contains("s3cr3t")));
        assert_eq!(logged[0].1, "Bearer <redacted>");
        assert_eq!(logged[1].1, "application/json");
        assert_eq!(logged[2].1, "202602");
        assert_eq!(logged[3].1, "2.0.0");
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_network() {
        let cfg = LinkedInConfig {
            access_token: None,
            person_urn: Some("urn:li:person:1".into()),
            // unroutable: a request would error with Http, not MissingCredential
            api_base: "http://127.0.0.1:9".into(),
            ..LinkedInConfig::default()
        };
        let p = LinkedInPublisher::new(&cfg, reqwest::Client::new());
        let err = p.publish("x").await.unwrap_err();
        assert!(matches!(err, PublishError::MissingCredential("LINKEDIN_ACCESS_TOKEN")));

        let cfg = LinkedInConfig {
            access_token: Some("t".into()),
            person_urn: Some("  ".into()),
            ..cfg
        };
        let p = LinkedInPublisher::new(&cfg, reqwest::Client::new());
        let err = p.publish("x").await.unwrap_err();
        assert!(matches!(err, PublishError::MissingCredential("LINKEDIN_PERSON_URN")));
    }
}
