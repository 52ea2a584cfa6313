//! BGP and policy primitives.

use crate::ParseError;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A 4-byte BGP autonomous system number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asn(pub u32);

impl Asn {
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Asn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Asn {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>()
            .map(Asn)
            .map_err(|_| ParseError::InvalidAsn(s.to_string()))
    }
}

/// The `remote-as` value of a neighbor.
///
/// FRR accepts either an explicit AS number or the `internal` / `external`
/// keywords, which match any iBGP or eBGP speaker respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RemoteAsRepr")]
pub enum RemoteAs {
    Number(Asn),
    Internal,
    External,
}

/// Accepts `remote_as = 64513` as well as `remote_as = "64513"` or `"internal"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RemoteAsRepr {
    Number(u32),
    Text(String),
}

impl TryFrom<RemoteAsRepr> for RemoteAs {
    type Error = ParseError;

    fn try_from(repr: RemoteAsRepr) -> Result<Self, Self::Error> {
        match repr {
            RemoteAsRepr::Number(n) => Ok(RemoteAs::Number(Asn(n))),
            RemoteAsRepr::Text(s) => s.parse(),
        }
    }
}

impl FromStr for RemoteAs {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internal" => Ok(RemoteAs::Internal),
            "external" => Ok(RemoteAs::External),
            other => other
                .parse::<Asn>()
                .map(RemoteAs::Number)
                .map_err(|_| ParseError::InvalidRemoteAs(s.to_string())),
        }
    }
}

impl fmt::Display for RemoteAs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteAs::Number(asn) => fmt::Display::fmt(asn, f),
            RemoteAs::Internal => f.write_str("internal"),
            RemoteAs::External => f.write_str("external"),
        }
    }
}

impl Serialize for RemoteAs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RemoteAs::Number(asn) => serializer.serialize_u32(asn.value()),
            keyword => serializer.collect_str(keyword),
        }
    }
}

/// Permit/deny action of a prefix-list or route-map entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Permit,
    Deny,
}

impl Action {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::Permit => "permit",
            Action::Deny => "deny",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Syslog severity used in the `log syslog <level>` directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Emergencies,
    Alerts,
    Critical,
    #[serde(alias = "error")]
    Errors,
    #[serde(alias = "warn", alias = "warning")]
    Warnings,
    Notifications,
    #[default]
    #[serde(alias = "info")]
    Informational,
    #[serde(alias = "debug")]
    Debugging,
}

impl LogLevel {
    /// Keyword as FRR expects it.
    pub const fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Emergencies => "emergencies",
            LogLevel::Alerts => "alerts",
            LogLevel::Critical => "critical",
            LogLevel::Errors => "errors",
            LogLevel::Warnings => "warnings",
            LogLevel::Notifications => "notifications",
            LogLevel::Informational => "informational",
            LogLevel::Debugging => "debugging",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Deserialize)]
    struct Holder {
        remote_as: RemoteAs,
        #[serde(default)]
        level: LogLevel,
    }

    #[test]
    fn test_remote_as_forms() {
        let h: Holder = toml::from_str("remote_as = 64513").unwrap();
        assert_eq!(h.remote_as, RemoteAs::Number(Asn(64513)));

        let h: Holder = toml::from_str(r#"remote_as = "64514""#).unwrap();
        assert_eq!(h.remote_as, RemoteAs::Number(Asn(64514)));

        let h: Holder = toml::from_str(r#"remote_as = "internal""#).unwrap();
        assert_eq!(h.remote_as, RemoteAs::Internal);
        assert_eq!(h.remote_as.to_string(), "internal");
    }

    #[test]
    fn test_remote_as_rejects_garbage() {
        assert!(toml::from_str::<Holder>(r#"remote_as = "spine""#).is_err());
        assert!("-1".parse::<RemoteAs>().is_err());
    }

    #[test]
    fn test_log_level_aliases() {
        let h: Holder = toml::from_str("remote_as = 1\nlevel = \"debug\"").unwrap();
        assert_eq!(h.level, LogLevel::Debugging);
        assert_eq!(h.level.to_string(), "debugging");

        let h: Holder = toml::from_str("remote_as = 1").unwrap();
        assert_eq!(h.level, LogLevel::Informational);
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::Permit.to_string(), "permit");
        assert_eq!(Action::Deny.to_string(), "deny");
    }
}
