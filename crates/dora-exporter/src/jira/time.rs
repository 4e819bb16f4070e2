//! Jira's `created` timestamp: `2022-09-15T05:57:02.000+0000`.
//!
//! Not RFC 3339 (no colon in the offset), so it gets its own parser. A JSON
//! `null` (or the string `"null"`) is the zero time, represented as `None`.
//! Payloads with an unparsable value still deserialize, as the zero time.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer};

pub const JIRA_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JiraTime(pub Option<DateTime<FixedOffset>>);

impl JiraTime {
    pub fn parse(s: &str) -> Result<Self, chrono::ParseError> {
        let s = s.trim_matches('"');
        if s == "null" {
            return Ok(Self(None));
        }
        DateTime::parse_from_str(s, JIRA_TIME_FORMAT).map(|t| Self(Some(t)))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_none()
    }
}

impl<'de> Deserialize<'de> for JiraTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => return Ok(Self(None)),
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        Ok(Self::parse(&raw).unwrap_or_else(|e| {
            tracing::warn!(created = %raw, error = %e, "unparsable jira time, using zero time");
            Self(None)
        }))
    }
}
