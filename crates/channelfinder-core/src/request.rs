//! Mutating operations
//!
//! Each operation has a sum type that makes its mode explicit, plus an
//! `*Args` struct with all selectors optional for callers holding loose input.
//! `TryFrom<*Args>` picks the mode (tag, then property, then channel) and
//! reports a missing selector before anything touches the network.

use serde::Serialize;

use crate::error::{ChannelFinderError, Result};
use crate::model::ChannelSpec;

const TAGS: &str = "tags";
const PROPERTIES: &str = "properties";
const CHANNELS: &str = "channels";

/// Create or overwrite a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateRequest {
    Tag { name: String, owner: String },
    Property { name: String, owner: String },
    ChannelBatch { channels: Vec<ChannelSpec>, owner: String },
}

/// Delete a resource by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteRequest {
    Tag(String),
    Property(String),
    Channel(String),
}

/// Attach a tag or property to channels in one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyRequest {
    Tag {
        name: String,
        owner: String,
        channels: Vec<String>,
    },
    Property {
        name: String,
        owner: String,
        value: String,
        channels: Vec<String>,
    },
}

/// Detach a tag or property, one request per channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveRequest {
    Tag { name: String, channels: Vec<String> },
    Property { name: String, channels: Vec<String> },
}

// ========== Loose arguments ==========

#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    pub tag: Option<String>,
    pub property: Option<String>,
    pub channels: Option<Vec<ChannelSpec>>,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteArgs {
    pub tag: Option<String>,
    pub property: Option<String>,
    pub channel: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ApplyArgs {
    pub tag: Option<String>,
    pub property: Option<String>,
    pub channel: Option<String>,
    pub channels: Option<Vec<String>>,
    pub owner: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RemoveArgs {
    pub tag: Option<String>,
    pub property: Option<String>,
    pub channel: Option<String>,
    pub channels: Option<Vec<String>>,
}

/// Blank strings count as absent
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn require(value: Option<String>, name: &'static str) -> Result<String> {
    present(value).ok_or(ChannelFinderError::MissingArgument { name })
}

/// Tag or property, whichever is set first
enum Selector {
    Tag(String),
    Property(String),
}

fn selector(tag: Option<String>, property: Option<String>) -> Result<Selector> {
    match (present(tag), present(property)) {
        (Some(name), _) => Ok(Selector::Tag(name)),
        (None, Some(name)) => Ok(Selector::Property(name)),
        (None, None) => Err(ChannelFinderError::MissingArgument {
            name: "tag or property",
        }),
    }
}

/// `channels` wins over `channel`; the result must not be empty
fn target_channels(channel: Option<String>, channels: Option<Vec<String>>) -> Result<Vec<String>> {
    let channels = match channels {
        Some(list) => list,
        None => present(channel).into_iter().collect(),
    };
    if channels.is_empty() {
        return Err(ChannelFinderError::MissingArgument { name: "channel" });
    }
    Ok(channels)
}

impl TryFrom<CreateArgs> for CreateRequest {
    type Error = ChannelFinderError;

    fn try_from(args: CreateArgs) -> Result<Self> {
        if let Some(name) = present(args.tag) {
            let owner = require(args.owner, "owner")?;
            Ok(Self::Tag { name, owner })
        } else if let Some(name) = present(args.property) {
            let owner = require(args.owner, "owner")?;
            Ok(Self::Property { name, owner })
        } else if let Some(channels) = args.channels {
            let owner = require(args.owner, "owner")?;
            Ok(Self::ChannelBatch { channels, owner })
        } else {
            Err(ChannelFinderError::MissingArgument {
                name: "tag, property or channels",
            })
        }
    }
}

impl TryFrom<DeleteArgs> for DeleteRequest {
    type Error = ChannelFinderError;

    fn try_from(args: DeleteArgs) -> Result<Self> {
        if let Some(name) = present(args.tag) {
            Ok(Self::Tag(name))
        } else if let Some(name) = present(args.property) {
            Ok(Self::Property(name))
        } else if let Some(name) = present(args.channel) {
            Ok(Self::Channel(name))
        } else {
            Err(ChannelFinderError::MissingArgument {
                name: "tag, property or channel",
            })
        }
    }
}

impl TryFrom<ApplyArgs> for ApplyRequest {
    type Error = ChannelFinderError;

    fn try_from(args: ApplyArgs) -> Result<Self> {
        let selector = selector(args.tag, args.property)?;
        let channels = target_channels(args.channel, args.channels)?;
        let owner = require(args.owner, "owner")?;

        Ok(match selector {
            Selector::Tag(name) => Self::Tag {
                name,
                owner,
                channels,
            },
            Selector::Property(name) => Self::Property {
                name,
                owner,
                value: require(args.value, "value")?,
                channels,
            },
        })
    }
}

impl TryFrom<RemoveArgs> for RemoveRequest {
    type Error = ChannelFinderError;

    fn try_from(args: RemoveArgs) -> Result<Self> {
        let selector = selector(args.tag, args.property)?;
        let channels = target_channels(args.channel, args.channels)?;

        Ok(match selector {
            Selector::Tag(name) => Self::Tag { name, channels },
            Selector::Property(name) => Self::Property { name, channels },
        })
    }
}

// ========== Wire bodies ==========

#[derive(Serialize)]
struct NameOwner<'a> {
    name: &'a str,
    owner: &'a str,
}

#[derive(Serialize)]
struct Name<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct NameValue<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct ChannelEntity<'a> {
    name: &'a str,
    owner: &'a str,
    tags: Vec<Name<'a>>,
    properties: Vec<NameValue<'a>>,
}

#[derive(Serialize)]
struct OwnedValue<'a> {
    name: &'a str,
    value: &'a str,
    owner: &'a str,
}

#[derive(Serialize)]
struct AttachChannel<'a> {
    name: &'a str,
    owner: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<[OwnedValue<'a>; 1]>,
}

#[derive(Serialize)]
struct AttachBody<'a> {
    name: &'a str,
    owner: &'a str,
    channels: Vec<AttachChannel<'a>>,
}

fn encode<T: Serialize>(body: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(body).map_err(ChannelFinderError::Encode)
}

impl CreateRequest {
    pub(crate) fn segments(&self) -> Vec<&str> {
        match self {
            Self::Tag { name, .. } => vec!["resources", TAGS, name.as_str()],
            Self::Property { name, .. } => vec!["resources", PROPERTIES, name.as_str()],
            Self::ChannelBatch { .. } => vec!["resources", CHANNELS],
        }
    }

    pub(crate) fn body(&self) -> Result<Vec<u8>> {
        match self {
            Self::Tag { name, owner } | Self::Property { name, owner } => {
                encode(&NameOwner { name, owner })
            }
            Self::ChannelBatch { channels, owner } => {
                let entities: Vec<ChannelEntity<'_>> = channels
                    .iter()
                    .map(|chan| ChannelEntity {
                        name: &chan.name,
                        owner,
                        tags: chan.tags.iter().map(|name| Name { name }).collect(),
                        properties: chan
                            .properties
                            .iter()
                            .map(|(name, value)| NameValue { name, value })
                            .collect(),
                    })
                    .collect();
                encode(&entities)
            }
        }
    }
}

impl DeleteRequest {
    pub(crate) fn segments(&self) -> Vec<&str> {
        match self {
            Self::Tag(name) => vec!["resources", TAGS, name.as_str()],
            Self::Property(name) => vec!["resources", PROPERTIES, name.as_str()],
            Self::Channel(name) => vec!["resources", CHANNELS, name.as_str()],
        }
    }
}

impl ApplyRequest {
    pub fn channels(&self) -> &[String] {
        match self {
            Self::Tag { channels, .. } | Self::Property { channels, .. } => channels,
        }
    }

    pub(crate) fn segments(&self) -> Vec<&str> {
        match self {
            Self::Tag { name, .. } => vec!["resources", TAGS, name.as_str()],
            Self::Property { name, .. } => vec!["resources", PROPERTIES, name.as_str()],
        }
    }

    pub(crate) fn body(&self) -> Result<Vec<u8>> {
        let (name, owner, value) = match self {
            Self::Tag { name, owner, .. } => (name, owner, None),
            Self::Property {
                name, owner, value, ..
            } => (name, owner, Some(value.as_str())),
        };

        let channels = self
            .channels()
            .iter()
            .map(|chan| AttachChannel {
                name: chan,
                owner,
                properties: value.map(|value| [OwnedValue { name, value, owner }]),
            })
            .collect();

        encode(&AttachBody {
            name,
            owner,
            channels,
        })
    }
}

impl RemoveRequest {
    pub fn channels(&self) -> &[String] {
        match self {
            Self::Tag { channels, .. } | Self::Property { channels, .. } => channels,
        }
    }

    /// Path of the detach request for one channel
    pub(crate) fn segments_for<'a>(&'a self, channel: &'a str) -> Vec<&'a str> {
        match self {
            Self::Tag { name, .. } => vec!["resources", TAGS, name.as_str(), channel],
            Self::Property { name, .. } => vec!["resources", PROPERTIES, name.as_str(), channel],
        }
    }
}
