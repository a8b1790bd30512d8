use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use emoji_list_core::{CacheKind, CacheLocations};

use crate::error::CliError;

/// List both cache locations in load order.
pub(crate) fn run_cache_list(locations: &CacheLocations) -> Result<(), CliError> {
    log::info!(
        "{}",
        "Emoji cache locations (load order):".if_supports_color(Stdout, |t| t.bold()),
    );
    for entry in locations.list() {
        let kind = match entry.kind {
            CacheKind::Portable => "portable",
            CacheKind::User => "user",
        };
        let status = match entry.file_size {
            Some(size) => format!("{size} bytes"),
            None => "missing".to_string(),
        };
        log::info!(
            "  {} {} ({})",
            kind.if_supports_color(Stdout, |t| t.cyan()),
            entry.path.display(),
            status,
        );
    }
    Ok(())
}

/// Delete both cache files.
pub(crate) fn run_cache_clear(locations: &CacheLocations) -> Result<(), CliError> {
    let freed = locations.clear()?;
    log::info!(
        "{} Cache cleared ({} bytes freed)",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        freed,
    );
    Ok(())
}

/// Print the file a save writes to.
pub(crate) fn run_cache_path(locations: &CacheLocations, portable: bool) {
    println!("{}", locations.save_target(portable).display());
}
