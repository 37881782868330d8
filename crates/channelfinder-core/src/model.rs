//! Directory entities as the service returns them
//!
//! # Hierarchy
//! ```text
//! Channel (unique name, owner)
//! ├── tags: [Tag]              # labels, name + owner
//! └── properties: [Property]   # name + owner + per-channel value
//! ```
//!
//! The service owns every entity. Nothing here is cached; each value is a
//! snapshot of one response.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A label attachable to channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub owner: String,
    /// Only present on single-tag reads made with `withChannels=true`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<Channel>,
}

impl Tag {
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            channels: Vec::new(),
        }
    }
}

/// A name/value annotation attachable to channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(default)]
    pub owner: String,
    /// Set when the property is read as part of a channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<Channel>,
}

impl Property {
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            value: None,
            channels: Vec::new(),
        }
    }

    /// Set the per-channel value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl Channel {
    /// Look up the value of an attached property
    pub fn property_value(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value.as_deref())
    }

    /// Whether a tag with this name is attached
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }
}

/// Caller-side description of a channel to create
///
/// Carries no owner. The batch owner is applied to every channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelSpec {
    pub name: String,
    pub tags: Vec<String>,
    pub properties: BTreeMap<String, String>,
}

impl ChannelSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Parse one line of `name [tag | prop=value]...`
    ///
    /// Returns `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let mut spec = Self::new(parts.next()?);

        for part in parts {
            match part.split_once('=') {
                Some((name, value)) => {
                    spec.properties.insert(name.to_string(), value.to_string());
                }
                None => spec.tags.push(part.to_string()),
            }
        }

        Some(spec)
    }
}

/// Service metadata returned from the base URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Backend status block, free-form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elastic: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_decodes_server_shape() {
        let json = r#"{
            "name": "SR:C01-MG:G02A<VPU>",
            "owner": "cf-update",
            "properties": [
                {"name": "hostName", "owner": "cf-update", "value": "ioc01", "channels": []}
            ],
            "tags": [
                {"name": "archived", "owner": "admin", "channels": []}
            ]
        }"#;

        let channel: Channel = serde_json::from_str(json).unwrap();
        assert_eq!(channel.owner, "cf-update");
        assert_eq!(channel.property_value("hostName"), Some("ioc01"));
        assert!(channel.has_tag("archived"));
        assert!(!channel.has_tag("missing"));
    }

    #[test]
    fn channel_missing_lists_default_empty() {
        let channel: Channel = serde_json::from_str(r#"{"name": "ch1", "owner": "me"}"#).unwrap();
        assert!(channel.tags.is_empty());
        assert!(channel.properties.is_empty());
    }

    #[test]
    fn tag_list_decodes_name_owner_pairs() {
        let tags: Vec<Tag> =
            serde_json::from_str(r#"[{"name":"T1","owner":"a"},{"name":"T2","owner":"b"}]"#)
                .unwrap();
        assert_eq!(tags, vec![Tag::new("T1", "a"), Tag::new("T2", "b")]);
    }

    #[test]
    fn service_info_keeps_unknown_fields() {
        let info: ServiceInfo = serde_json::from_str(
            r#"{"name":"ChannelFinder Service","version":"4.7.0","elastic":{"status":"Connected"},"build":"abc"}"#,
        )
        .unwrap();

        assert_eq!(info.version.as_deref(), Some("4.7.0"));
        assert_eq!(info.elastic.unwrap()["status"], "Connected");
        assert_eq!(info.extra["build"], "abc");
    }

    #[test]
    fn channel_spec_parse_line() {
        let spec = ChannelSpec::parse("  ch1 T1  T2 P1=v1 P2=a=b ").unwrap();
        assert_eq!(spec.name, "ch1");
        assert_eq!(spec.tags, vec!["T1", "T2"]);
        assert_eq!(spec.properties["P1"], "v1");
        assert_eq!(spec.properties["P2"], "a=b");
    }

    #[test]
    fn channel_spec_parse_blank() {
        assert!(ChannelSpec::parse("   ").is_none());
    }

    #[test]
    fn channel_spec_builder() {
        let spec = ChannelSpec::new("ch1")
            .with_tag("T1")
            .with_property("P1", "v1");
        assert_eq!(spec.tags, vec!["T1"]);
        assert_eq!(spec.properties["P1"], "v1");
    }
}
