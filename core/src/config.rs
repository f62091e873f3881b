//! Client configuration.

use std::str::FromStr;

use serde::Deserialize;
use url::Url;

use crate::error::AjaxError;

/// Whether ambient credentials (stored cookies) go out with a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialsPolicy {
    Omit,
    #[default]
    SameOrigin,
    Include,
}

impl FromStr for CredentialsPolicy {
    type Err = AjaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "omit" => Ok(Self::Omit),
            "same-origin" => Ok(Self::SameOrigin),
            "include" => Ok(Self::Include),
            other => Err(AjaxError::Config(format!(
                "unknown credentials policy: {other}"
            ))),
        }
    }
}

impl CredentialsPolicy {
    /// Whether a request to `url` may carry ambient credentials (the
    /// transport's cookie store). Headers set by the caller are never
    /// affected.
    pub fn allows(self, origin: Option<&Url>, url: &str) -> bool {
        match self {
            Self::Include => true,
            Self::Omit => false,
            Self::SameOrigin => match origin {
                None => true,
                Some(origin) => Url::parse(url)
                    .map(|u| u.origin() == origin.origin())
                    .unwrap_or(false),
            },
        }
    }
}

/// Settings an `AjaxClient` is created with.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub credentials: CredentialsPolicy,
    /// Origin used by `SameOrigin`; without one every URL counts as same-origin.
    pub origin: Option<Url>,
    /// Extra default headers, added on top of the built-in pair.
    pub headers: Vec<(String, String)>,
}

impl ClientConfig {
    /// Read `AJAX_CREDENTIALS` and `AJAX_ORIGIN`; unset variables keep defaults.
    pub fn from_env() -> Result<Self, AjaxError> {
        let mut config = Self::default();
        if let Ok(policy) = std::env::var("AJAX_CREDENTIALS") {
            config.credentials = policy.parse()?;
        }
        if let Ok(origin) = std::env::var("AJAX_ORIGIN") {
            config = config.with_origin(&origin)?;
        }
        Ok(config)
    }

    pub fn with_credentials(mut self, credentials: CredentialsPolicy) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_origin(mut self, origin: &str) -> Result<Self, AjaxError> {
        let url = Url::parse(origin)
            .map_err(|e| AjaxError::Config(format!("invalid origin {origin:?}: {e}")))?;
        self.origin = Some(url);
        Ok(self)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}
