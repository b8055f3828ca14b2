use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod feed;

pub use feed::Feed;

/// Identity of the channel that produced an item
///
/// Items whose raw record carries no channel are given a synthetic key derived from
/// their own identity, so they never count against another item's cap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelKey {
    Named(String),
    /// Singleton channel synthesized from the item id
    Synthetic(String),
    /// Singleton channel for an item lacking both id and channel, keyed by position
    Anonymous(usize),
}

impl Display for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKey::Named(key) => write!(f, "{}", key),
            ChannelKey::Synthetic(id) => write!(f, "unknown-{}", id),
            ChannelKey::Anonymous(position) => write!(f, "anonymous-{}", position),
        }
    }
}

/// A candidate video as seen by the selection engine
///
/// `payload` is the untouched raw record; the engine only ever reads `id` and `channel`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentItem {
    pub id: Option<String>,
    pub channel: Option<String>,
    pub payload: serde_json::Value,
}

impl ContentItem {
    pub fn new(id: impl Into<String>, channel: Option<&str>) -> Self {
        let id = id.into();
        Self {
            payload: serde_json::json!({ "id": id, "channel_id": channel }),
            id: Some(id),
            channel: channel.map(str::to_string),
        }
    }

    /// Selection identity; empty ids count as missing
    pub fn key(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Channel used for cap accounting; `position` only matters for id-less items
    pub fn channel_key(&self, position: usize) -> ChannelKey {
        match (self.channel.as_deref().filter(|c| !c.is_empty()), self.key()) {
            (Some(channel), _) => ChannelKey::Named(channel.to_string()),
            (None, Some(id)) => ChannelKey::Synthetic(id.to_string()),
            (None, None) => ChannelKey::Anonymous(position),
        }
    }
}

/// Fallback tier a candidate pool was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Primary,
    SecondaryMerged,
    FullPool,
    LastResort,
    Exhausted,
}

impl Tier {
    /// Next state of the fallback machine; `Exhausted` is terminal
    pub fn next(self) -> Tier {
        match self {
            Tier::Primary => Tier::SecondaryMerged,
            Tier::SecondaryMerged => Tier::FullPool,
            Tier::FullPool => Tier::LastResort,
            Tier::LastResort | Tier::Exhausted => Tier::Exhausted,
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::Primary => "primary",
            Tier::SecondaryMerged => "secondary_merged",
            Tier::FullPool => "full_pool",
            Tier::LastResort => "last_resort",
            Tier::Exhausted => "exhausted",
        };
        write!(f, "{}", name)
    }
}

/// Parameters for one selection pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRequest {
    pub target: usize,
    pub initial_cap: usize,
    pub max_relaxation_steps: usize,
    pub shuffle: bool,
    /// Seed for the pre-selection shuffle; drawn at random when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Ids removed from the pool before selection
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for SelectionRequest {
    fn default() -> Self {
        Self {
            target: 24,
            initial_cap: 1,
            max_relaxation_steps: 1,
            shuffle: false,
            seed: None,
            exclude: Vec::new(),
        }
    }
}

/// Output of the engine plus how it got there
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionResult {
    pub items: Vec<ContentItem>,
    /// Highest per-channel cap tried by the relaxation ladder
    pub final_cap: usize,
    /// Items appended by the cap-free backfill pass
    pub backfilled: usize,
    /// Seed actually used when the pool was shuffled
    pub seed: Option<u64>,
}

impl SelectionResult {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            final_cap: 0,
            backfilled: 0,
            seed: None,
        }
    }

    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().filter_map(ContentItem::key).collect()
    }
}

/// What the rendering layer receives for one feed request
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub items: Vec<serde_json::Value>,
    pub tier: Option<Tier>,
    /// Index of the supplied pool used, for selections over caller-provided pools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<usize>,
    pub final_cap: usize,
    pub backfilled: usize,
    pub seed: Option<u64>,
    /// Reason the list is empty when every tier failed
    pub error: Option<String>,
}
