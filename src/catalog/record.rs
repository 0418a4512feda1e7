//! Package records as published by the registry
//!
//! Parsing is lenient: the registry feed is large and occasionally odd, and
//! a single unexpected field must not discard the whole listing. Absent and
//! `null` fields read as "not present", scalar values in string fields are
//! read as text, and malformed list elements are skipped.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Separator between owner and package name in `full_name`
/// and dependency identifiers
pub const OWNER_SEPARATOR: char = '-';

/// One package in the registry listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,

    /// `Owner-Name`
    #[serde(default, deserialize_with = "lenient::string")]
    pub full_name: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub owner: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub namespace: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub author: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub icon: Option<String>,

    /// Registry sends a bool; older mirrors send `"true"` / `"false"`
    #[serde(default, deserialize_with = "lenient::bool_like")]
    pub is_deprecated: Option<bool>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub package_url: Option<String>,

    #[serde(default, deserialize_with = "lenient::versions")]
    pub versions: Vec<VersionRecord>,
}

/// One published version of a package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub version_number: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub icon: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub download_url: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub package_url: Option<String>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub website_url: Option<String>,

    #[serde(default, deserialize_with = "lenient::bool_like")]
    pub is_active: Option<bool>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub date_created: Option<String>,

    /// `Owner-Name-1.2.3` identifiers
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub dependencies: Vec<String>,
}

impl PackageRecord {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn full_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("")
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// First of `owner`, `namespace`, `author` that is present
    pub fn author(&self) -> &str {
        first_present([&self.owner, &self.namespace, &self.author])
    }

    pub fn is_deprecated(&self) -> bool {
        self.is_deprecated.unwrap_or(false)
    }

    /// Part of `full_name` after the first owner separator
    pub fn suffix_after_owner(&self) -> Option<&str> {
        self.full_name
            .as_deref()?
            .split_once(OWNER_SEPARATOR)
            .map(|(_, rest)| rest)
    }

    /// The first version in registry order (not date-selected)
    pub fn first_version(&self) -> Option<&VersionRecord> {
        self.versions.first()
    }

    /// Version a summary is built from
    ///
    /// The newest active version by `date_created`; versions without a
    /// parsable date sort first. Falls back to the last listed version when
    /// none is active. Ties go to the earlier listed version.
    pub fn chosen_version(&self) -> Option<&VersionRecord> {
        self.versions
            .iter()
            .rev()
            .filter(|v| v.is_active())
            .max_by_key(|v| v.created_at())
            .or_else(|| self.versions.last())
    }

    /// Names the fuzzy matcher compares against, in preference order:
    /// `name`, `full_name`, first version `name`
    pub fn candidate_names(&self) -> impl Iterator<Item = &str> {
        [
            self.name.as_deref(),
            self.full_name.as_deref(),
            self.first_version().and_then(|v| v.name.as_deref()),
        ]
        .into_iter()
        .flatten()
    }
}

impl VersionRecord {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Absent means active
    pub fn is_active(&self) -> bool {
        self.is_active.unwrap_or(true)
    }

    /// Creation time, or `None` when missing or unparsable
    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        self.date_created
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d.trim()).ok())
    }

    /// First of `download_url`, `package_url`, `website_url` that is present
    pub fn download_link(&self) -> &str {
        first_present([&self.download_url, &self.package_url, &self.website_url])
    }
}

fn first_present<const N: usize>(fields: [&Option<String>; N]) -> &str {
    fields
        .into_iter()
        .find_map(|f| f.as_deref())
        .unwrap_or("")
}

mod lenient {
    use super::*;

    fn scalar_text(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(scalar_text(Value::deserialize(deserializer)?))
    }

    pub fn bool_like<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(b) => Some(b),
            Value::String(s) => Some(s.trim().eq_ignore_ascii_case("true")),
            _ => None,
        })
    }

    pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
    }

    pub fn versions<'de, D>(deserializer: D) -> Result<Vec<VersionRecord>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .filter(Value::is_object)
                .filter_map(|v| serde_json::from_value(v).ok())
                .collect(),
            _ => Vec::new(),
        })
    }
}
