//! Authentication strategies
//!
//! `auth_type` selects one variant; each variant carries exactly the
//! credentials it needs, so a half-specified configuration cannot be built.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::properties::ConnectionProperties;
use crate::secret::SensitiveString;

/// Value of the `auth_type` option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthType {
    /// Personal access token
    #[default]
    Pat,
    /// OAuth machine-to-machine (service principal client credentials)
    OAuthM2m,
}

impl AuthType {
    /// Option value as written in configuration
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pat => "pat",
            Self::OAuthM2m => "oauth-m2m",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pat" => Ok(Self::Pat),
            "oauth-m2m" => Ok(Self::OAuthM2m),
            other => Err(Error::config_option(
                "auth_type",
                format!("has invalid value '{}': expected 'pat' or 'oauth-m2m'", other),
            )),
        }
    }
}

/// Credentials for one authentication strategy
#[derive(Debug, Clone, PartialEq)]
pub enum AuthStrategy {
    /// Personal access token
    Pat {
        /// Token value
        token: SensitiveString,
    },
    /// OAuth machine-to-machine
    OAuthM2m {
        /// Service principal application id
        client_id: String,
        /// Service principal secret
        client_secret: SensitiveString,
    },
}

fn require<T>(value: Option<T>, option: &str, auth_type: AuthType) -> Result<T> {
    value.ok_or_else(|| {
        Error::config_option(
            option,
            format!("is required when auth_type is '{}'", auth_type),
        )
    })
}

impl AuthStrategy {
    /// Build the strategy for `auth_type` from the optional credential fields.
    ///
    /// Blank values count as missing. The error names the first missing option.
    pub fn from_parts(
        auth_type: AuthType,
        personal_access_token: Option<&SensitiveString>,
        client_id: Option<&str>,
        client_secret: Option<&SensitiveString>,
    ) -> Result<Self> {
        let token = personal_access_token.filter(|t| !t.is_blank()).cloned();
        let client_id = client_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let client_secret = client_secret.filter(|s| !s.is_blank()).cloned();

        match auth_type {
            AuthType::Pat => Ok(Self::Pat {
                token: require(token, "personal_access_token", auth_type)?,
            }),
            AuthType::OAuthM2m => Ok(Self::OAuthM2m {
                client_id: require(client_id, "oauth2_client_id", auth_type)?,
                client_secret: require(client_secret, "oauth2_client_secret", auth_type)?,
            }),
        }
    }

    /// Selected `auth_type`
    pub fn auth_type(&self) -> AuthType {
        match self {
            Self::Pat { .. } => AuthType::Pat,
            Self::OAuthM2m { .. } => AuthType::OAuthM2m,
        }
    }

    /// Write the authentication block into driver properties
    pub fn apply(&self, props: &mut ConnectionProperties) {
        match self {
            Self::Pat { token } => {
                props.set("AuthMech", "3");
                props.set("UID", "token");
                props.set_secret("PWD", token.clone());
            }
            Self::OAuthM2m {
                client_id,
                client_secret,
            } => {
                props.set("AuthMech", "11");
                props.set("Auth_Flow", "1");
                props.set("OAuth2ClientId", client_id.as_str());
                props.set_secret("OAuth2Secret", client_secret.clone());
            }
        }
    }
}
