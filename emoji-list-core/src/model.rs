//! Data model for the emoji catalogue.
//!
//! The catalogue is a three-level tree (group → subgroup → emoji) plus the
//! timestamp of the last successful load. JSON field names follow the export
//! shape consumed by the CLI (`Name`, `Subgroups`, `Emoji`, ...).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EmojiError;

// ── Qualifier ───────────────────────────────────────────────────────────────

/// Unicode's classification of how complete an emoji sequence's presentation is.
///
/// The discriminants are the on-wire values used by the binary cache and the
/// JSON export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Qualifier {
    FullyQualified = 1,
    Unqualified = 2,
    MinimallyQualified = 3,
    Component = 4,
}

impl Qualifier {
    pub const ALL: [Qualifier; 4] = [
        Qualifier::FullyQualified,
        Qualifier::Unqualified,
        Qualifier::MinimallyQualified,
        Qualifier::Component,
    ];

    /// The integer value written to the cache and the JSON export.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Map an on-wire value back to a variant. Anything outside 1..=4 is `None`.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::FullyQualified),
            2 => Some(Self::Unqualified),
            3 => Some(Self::MinimallyQualified),
            4 => Some(Self::Component),
            _ => None,
        }
    }

    /// The hyphenated spelling used in the catalogue text.
    pub fn catalogue_name(self) -> &'static str {
        match self {
            Self::FullyQualified => "fully-qualified",
            Self::Unqualified => "unqualified",
            Self::MinimallyQualified => "minimally-qualified",
            Self::Component => "component",
        }
    }

    fn variant_name(self) -> &'static str {
        match self {
            Self::FullyQualified => "FullyQualified",
            Self::Unqualified => "Unqualified",
            Self::MinimallyQualified => "MinimallyQualified",
            Self::Component => "Component",
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalogue_name())
    }
}

/// Parse qualifier text such as `fully-qualified` or ` Component `.
///
/// Surrounding whitespace and hyphens are ignored and the comparison is
/// case-insensitive. Blank input is an `InvalidArgument`; unknown text is a
/// `Format` error.
impl FromStr for Qualifier {
    type Err = EmojiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EmojiError::invalid_argument("qualifier text is empty"));
        }
        let normalized = trimmed.replace('-', "");
        Self::ALL
            .into_iter()
            .find(|q| q.variant_name().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| EmojiError::format(format!("unrecognized qualifier '{trimmed}'")))
    }
}

impl Serialize for Qualifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Qualifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid qualifier value {value}")))
    }
}

// ── EmojiInfo ───────────────────────────────────────────────────────────────

/// One emoji sequence from the catalogue. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmojiInfo {
    name: String,
    #[serde(rename = "Emoji")]
    glyph: String,
    specification: String,
    qualifier: Qualifier,
    code_points: Vec<u32>,
}

impl EmojiInfo {
    /// Build an entry, rejecting an empty name or an empty codepoint sequence.
    pub fn new(
        name: impl Into<String>,
        glyph: impl Into<String>,
        specification: impl Into<String>,
        qualifier: Qualifier,
        code_points: Vec<u32>,
    ) -> Result<Self, EmojiError> {
        let name = name.into();
        if name.is_empty() {
            return Err(EmojiError::invalid_argument("emoji name is empty"));
        }
        if code_points.is_empty() {
            return Err(EmojiError::invalid_argument(format!(
                "emoji '{name}' has no codepoints"
            )));
        }
        Ok(Self {
            name,
            glyph: glyph.into(),
            specification: specification.into(),
            qualifier,
            code_points,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The literal emoji string, used as the lookup key.
    pub fn glyph(&self) -> &str {
        &self.glyph
    }

    /// Version tag from the catalogue, e.g. `E1.0`.
    pub fn specification(&self) -> &str {
        &self.specification
    }

    pub fn qualifier(&self) -> Qualifier {
        self.qualifier
    }

    /// Unicode scalar values in sequence order. Never empty.
    pub fn code_points(&self) -> &[u32] {
        &self.code_points
    }

    /// Codepoints formatted the way the catalogue writes them (`1F600 200D ...`).
    pub fn code_points_hex(&self) -> String {
        self.code_points
            .iter()
            .map(|cp| format!("{cp:04X}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ── Containers ──────────────────────────────────────────────────────────────

/// A named run of emoji within a group, in catalogue order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Subgroup {
    pub name: String,
    pub emoji: Vec<EmojiInfo>,
}

impl Subgroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emoji: Vec::new(),
        }
    }
}

/// A top-level category such as "Smileys & Emotion".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Group {
    pub name: String,
    pub subgroups: Vec<Subgroup>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subgroups: Vec::new(),
        }
    }
}

/// The full emoji dataset plus the time of the last successful load.
///
/// `last_update` is `None` until something has been loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalogue {
    pub last_update: Option<DateTime<Utc>>,
    pub groups: Vec<Group>,
}

impl Catalogue {
    pub fn new(last_update: Option<DateTime<Utc>>, groups: Vec<Group>) -> Self {
        Self {
            last_update,
            groups,
        }
    }

    /// Every entry in catalogue order (group, then subgroup, then entry).
    pub fn iter_emoji(&self) -> impl Iterator<Item = &EmojiInfo> {
        self.groups
            .iter()
            .flat_map(|g| g.subgroups.iter())
            .flat_map(|s| s.emoji.iter())
    }

    pub fn emoji_count(&self) -> usize {
        self.iter_emoji().count()
    }

    /// Build the glyph → entry index.
    ///
    /// The catalogue lists some glyphs more than once under different
    /// qualifiers; the last one in traversal order wins.
    pub fn build_index(&self) -> HashMap<String, EmojiInfo> {
        let mut index = HashMap::new();
        for info in self.iter_emoji() {
            index.insert(info.glyph().to_string(), info.clone());
        }
        index
    }
}
