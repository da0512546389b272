// src/config/linkedin.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use super::resolve_secret;

pub const ENV_ACCESS_TOKEN: &str = "LINKEDIN_ACCESS_TOKEN";
pub const ENV_PERSON_URN: &str = "LINKEDIN_PERSON_URN";

fn default_api_base() -> String {
    "https://api.linkedin.com/rest".to_string()
}
fn default_api_version() -> String {
    "202602".to_string()
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LinkedInConfig {
    /// Bearer token from the one-time OAuth flow. `"ENV"` reads LINKEDIN_ACCESS_TOKEN.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Author identity, e.g. `urn:li:person:abc123`. `"ENV"` reads LINKEDIN_PERSON_URN.
    #[serde(default)]
    pub person_urn: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Value of the `LinkedIn-Version` header (YYYYMM).
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for LinkedInConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            person_urn: None,
            api_base: default_api_base(),
            api_version: default_api_version(),
        }
    }
}

impl LinkedInConfig {
    pub(crate) fn apply_env<F>(&mut self, get: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = get(ENV_ACCESS_TOKEN).filter(|v| !v.trim().is_empty());
        self.access_token =
            token.or_else(|| resolve_secret(self.access_token.take(), ENV_ACCESS_TOKEN, get));
        let urn = get(ENV_PERSON_URN).filter(|v| !v.trim().is_empty());
        self.person_urn =
            urn.or_else(|| resolve_secret(self.person_urn.take(), ENV_PERSON_URN, get));
    }
}

impl fmt::Debug for LinkedInConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedInConfig")
            .field("access_token_len", &self.access_token.as_ref().map(|t| t.len()))
            .field("person_urn", &self.person_urn)
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .finish()
    }
}
