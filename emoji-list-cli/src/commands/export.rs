use std::fs;
use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use serde::Serialize;

use emoji_list_core::{EmojiService, Group};

use crate::error::CliError;

const GROUPS_FILE: &str = "groups.json";
const EMOJI_FILE: &str = "emoji.json";

/// Initialize the catalogue and write the group tree and glyph list as JSON.
pub(crate) fn run_export(service: &EmojiService, output_dir: &Path) -> Result<(), CliError> {
    let outcome = service.auto_initialize()?;
    log::debug!(
        "Initialized: cache={}, refreshed={}, persisted={}",
        outcome.loaded_from_cache,
        outcome.refreshed,
        outcome.persisted,
    );

    let groups = service.get_all_groups()?;
    let glyphs = service.get_all_emoji()?;
    let (groups_path, emoji_path) = write_export(&groups, &glyphs, output_dir)?;

    log::info!(
        "{} Exported {} groups to {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        groups.len(),
        groups_path.display(),
    );
    log::info!(
        "{} Exported {} emoji to {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        glyphs.len(),
        emoji_path.display(),
    );
    Ok(())
}

/// Write `groups.json` and `emoji.json` into `dir`, creating it if needed.
fn write_export(
    groups: &[Group],
    glyphs: &[String],
    dir: &Path,
) -> Result<(PathBuf, PathBuf), CliError> {
    fs::create_dir_all(dir)?;
    let groups_path = dir.join(GROUPS_FILE);
    let emoji_path = dir.join(EMOJI_FILE);
    write_json(&groups_path, groups)?;
    write_json(&emoji_path, glyphs)?;
    Ok((groups_path, emoji_path))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CliError> {
    let contents = serde_json::to_string_pretty(value)?;
    fs::write(path, contents)?;
    Ok(())
}
