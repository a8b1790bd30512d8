//! Parser for the Unicode emoji test list (`emoji-test.txt`).
//!
//! Format:
//! ```text
//! # group: Smileys & Emotion
//!
//! # subgroup: face-smiling
//! 1F600                                      ; fully-qualified     # 😀 E1.0 grinning face
//! 1F603                                      ; fully-qualified     # 😃 E0.6 grinning face with big mouth
//! ```
//!
//! Lines that fit none of the three shapes are skipped, as are subgroups that
//! appear before any group and data lines that appear before any subgroup.
//! Skips are counted in a [`ParseReport`] rather than treated as errors.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::EmojiError;
use crate::model::{Catalogue, EmojiInfo, Group, Qualifier, Subgroup};

static GROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\s*group:\s*(\S.*?)\s*$").expect("invalid group regex"));

static SUBGROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\s*subgroup:\s*(\S.*?)\s*$").expect("invalid subgroup regex"));

static DATA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*([0-9A-Fa-f]+(?:\s+[0-9A-Fa-f]+)*)\s*;([^#]*)#\s*(\S+)\s+(\S+)\s+(.+?)\s*$",
    )
    .expect("invalid data line regex")
});

static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\s*Version:\s*(\S+)").expect("invalid version regex"));

/// Counters describing what the parser kept and what it skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Value of the `# Version:` header, if the file has one.
    pub version: Option<String>,
    /// Emoji entries accepted into the catalogue.
    pub emoji: usize,
    /// Subgroup headers seen while no group was open.
    pub orphan_subgroups: usize,
    /// Data lines seen while no subgroup was open.
    pub orphan_lines: usize,
    /// Non-blank, non-comment lines that matched nothing.
    pub unrecognized_lines: usize,
}

impl ParseReport {
    /// Total number of lines dropped by the tolerance rules.
    pub fn skipped(&self) -> usize {
        self.orphan_subgroups + self.orphan_lines + self.unrecognized_lines
    }
}

/// Parse catalogue text into a [`Catalogue`] with no `last_update`.
pub fn parse(text: &str) -> Result<Catalogue, EmojiError> {
    parse_with_report(text).map(|(catalogue, _)| catalogue)
}

/// Parse catalogue text, also returning counters for skipped lines.
///
/// A data line with an unrecognized qualifier or unparseable codepoints
/// aborts the whole parse.
pub fn parse_with_report(text: &str) -> Result<(Catalogue, ParseReport), EmojiError> {
    let mut groups = Vec::new();
    let mut report = ParseReport::default();

    let mut current_group: Option<Group> = None;
    let mut current_subgroup: Option<Subgroup> = None;

    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    for (line_no, line) in text.lines().enumerate() {
        if let Some(caps) = GROUP_RE.captures(line) {
            if let Some(mut group) = current_group.take() {
                if let Some(subgroup) = current_subgroup.take() {
                    group.subgroups.push(subgroup);
                }
                groups.push(group);
            }
            current_group = Some(Group::new(&caps[1]));
            continue;
        }

        if let Some(caps) = SUBGROUP_RE.captures(line) {
            match current_group {
                Some(ref mut group) => {
                    if let Some(subgroup) = current_subgroup.take() {
                        group.subgroups.push(subgroup);
                    }
                    current_subgroup = Some(Subgroup::new(&caps[1]));
                }
                None => {
                    log::debug!(
                        "line {}: subgroup '{}' appears before any group, dropping it",
                        line_no + 1,
                        &caps[1]
                    );
                    report.orphan_subgroups += 1;
                }
            }
            continue;
        }

        if let Some(caps) = DATA_RE.captures(line) {
            match current_subgroup {
                Some(ref mut subgroup) => {
                    let info = parse_data_line(&caps).map_err(|e| at_line(e, line_no + 1))?;
                    subgroup.emoji.push(info);
                    report.emoji += 1;
                }
                None => report.orphan_lines += 1,
            }
            continue;
        }

        let trimmed = line.trim();
        if let Some(caps) = VERSION_RE.captures(trimmed) {
            if report.version.is_none() {
                report.version = Some(caps[1].to_string());
            }
        } else if !trimmed.is_empty() && !trimmed.starts_with('#') {
            report.unrecognized_lines += 1;
        }
    }

    if let Some(mut group) = current_group.take() {
        if let Some(subgroup) = current_subgroup.take() {
            group.subgroups.push(subgroup);
        }
        groups.push(group);
    }

    Ok((Catalogue::new(None, groups), report))
}

/// Turn the captures of a data line into an entry.
fn parse_data_line(caps: &regex::Captures<'_>) -> Result<EmojiInfo, EmojiError> {
    let code_points = parse_code_points(&caps[1])?;
    let qualifier: Qualifier = caps[2].parse()?;
    EmojiInfo::new(
        caps[5].trim(),
        caps[3].trim(),
        caps[4].trim(),
        qualifier,
        code_points,
    )
}

/// Prefix a line number onto a data-line error, keeping its variant.
fn at_line(err: EmojiError, line: usize) -> EmojiError {
    match err {
        EmojiError::Format(msg) => EmojiError::Format(format!("line {line}: {msg}")),
        EmojiError::InvalidArgument(msg) => {
            EmojiError::InvalidArgument(format!("line {line}: {msg}"))
        }
        other => other,
    }
}

/// Decode space-separated hex tokens into Unicode scalar values, keeping order.
fn parse_code_points(field: &str) -> Result<Vec<u32>, EmojiError> {
    field
        .split_whitespace()
        .map(|token| {
            let value = u32::from_str_radix(token, 16)
                .map_err(|e| EmojiError::format(format!("invalid codepoint '{token}': {e}")))?;
            if char::from_u32(value).is_none() {
                return Err(EmojiError::format(format!(
                    "codepoint '{token}' is not a Unicode scalar value"
                )));
            }
            Ok(value)
        })
        .collect()
}
