use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// One segment of a generated sequence.
///
/// `motion` is a descriptive label only; renderers derive movement from
/// progress and element index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub description: String,
    pub elements: Vec<String>,
    pub colors: Vec<String>,
    pub motion: String,
}

impl SceneDescriptor {
    pub fn new(description: &str, elements: &[&str], colors: &[&str], motion: &str) -> Self {
        Self {
            description: description.to_owned(),
            elements: elements.iter().map(|item| (*item).to_owned()).collect(),
            colors: colors.iter().map(|item| (*item).to_owned()).collect(),
            motion: motion.to_owned(),
        }
    }
}

/// Immutable, shareable ordered list of scenes.
pub type SceneSequence = Arc<[SceneDescriptor]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    Cinematic,
    Animation,
    Realistic,
    Abstract,
    Retro,
}

impl Style {
    pub const ALL: [Style; 5] = [
        Style::Cinematic,
        Style::Animation,
        Style::Realistic,
        Style::Abstract,
        Style::Retro,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Cinematic => "cinematic",
            Self::Animation => "animation",
            Self::Realistic => "realistic",
            Self::Abstract => "abstract",
            Self::Retro => "retro",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Cinematic => "Cinematic",
            Self::Animation => "Animation",
            Self::Realistic => "Realistic",
            Self::Abstract => "Abstract",
            Self::Retro => "Retro",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Cinematic => "Movie-like visuals with dramatic lighting",
            Self::Animation => "Cartoon-style vibrant animations",
            Self::Realistic => "Photo-realistic rendering",
            Self::Abstract => "Artistic and conceptual visuals",
            Self::Retro => "Vintage film aesthetic",
        }
    }

    /// Exact, case-sensitive id lookup.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|style| style.id() == id)
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Style {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        Self::from_id(raw).ok_or_else(|| {
            anyhow!(
                "unknown style '{}'; expected one of: {}",
                raw,
                Self::ALL.map(Style::id).join(", ")
            )
        })
    }
}
