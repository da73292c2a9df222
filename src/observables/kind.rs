//! Observable kinds
//!
//! Well-known kinds are closed variants; anything else is carried verbatim in
//! `ObservableKind::Other` so caller-defined kinds still round-trip.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a matched string represents
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObservableKind {
    Url,
    Ipv4,
    EmailAddress,
    EmailConversation,
    Fqdn,
    Hostname,
    FileName,
    Md5,
    Sha1,
    Sha256,
    User,
    Other(String),
}

impl ObservableKind {
    /// Wire name used in submitted observables
    pub fn as_str(&self) -> &str {
        match self {
            Self::Url => "url",
            Self::Ipv4 => "ipv4",
            Self::EmailAddress => "email_address",
            Self::EmailConversation => "email_conversation",
            Self::Fqdn => "fqdn",
            Self::Hostname => "hostname",
            Self::FileName => "file_name",
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::User => "user",
            Self::Other(name) => name,
        }
    }

    pub fn is_url(&self) -> bool {
        self.as_str() == Self::Url.as_str()
    }

    /// Fold an `Other` carrying a well-known wire name into its closed variant
    pub fn canonical(self) -> Self {
        match self {
            Self::Other(name) => Self::from(name),
            known => known,
        }
    }
}

impl From<&str> for ObservableKind {
    fn from(name: &str) -> Self {
        match name {
            "url" => Self::Url,
            "ipv4" => Self::Ipv4,
            "email_address" => Self::EmailAddress,
            "email_conversation" => Self::EmailConversation,
            "fqdn" => Self::Fqdn,
            "hostname" => Self::Hostname,
            "file_name" => Self::FileName,
            "md5" => Self::Md5,
            "sha1" => Self::Sha1,
            "sha256" => Self::Sha256,
            "user" => Self::User,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ObservableKind {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<ObservableKind> for String {
    fn from(kind: ObservableKind) -> Self {
        match kind {
            ObservableKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for ObservableKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for ObservableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
