use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

use super::SelectionRequest;

/// Named result lists shown by the client, each with its own selection preset
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Feed {
    /// Landing page grid - must be stable across refreshes
    Home,
    /// Discovery shelf - shuffled for variety
    Discover,
    /// "Up next" list beside the player
    Related,
    /// Trending shelf - popular channels may appear twice
    Trending,
}

const RELATED_TARGET: usize = 12;
const TRENDING_CAP: usize = 2;

impl Feed {
    /// Builds the feed's default request on top of the configured defaults
    pub fn preset(self, base: &SelectionRequest) -> SelectionRequest {
        let mut request = SelectionRequest {
            seed: None,
            exclude: Vec::new(),
            ..base.clone()
        };

        match self {
            Feed::Home => request.shuffle = false,
            Feed::Discover => request.shuffle = true,
            Feed::Related => {
                request.shuffle = false;
                request.target = request.target.min(RELATED_TARGET);
            }
            Feed::Trending => {
                request.shuffle = false;
                request.initial_cap = request.initial_cap.max(TRENDING_CAP);
            }
        }

        request
    }
}

impl FromStr for Feed {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "home" => Ok(Feed::Home),
            "discover" | "discovery" => Ok(Feed::Discover),
            "related" => Ok(Feed::Related),
            "trending" => Ok(Feed::Trending),
            other => Err(AppError::NotFound(format!("Unknown feed: {}", other))),
        }
    }
}

impl Display for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Feed::Home => "home",
            Feed::Discover => "discover",
            Feed::Related => "related",
            Feed::Trending => "trending",
        };
        write!(f, "{}", name)
    }
}
