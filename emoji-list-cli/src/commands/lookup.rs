use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use emoji_list_core::EmojiService;

use crate::error::CliError;

/// Print what the catalogue knows about each glyph.
pub(crate) fn run_lookup(service: &EmojiService, glyphs: &[String]) -> Result<(), CliError> {
    service.auto_initialize()?;

    for glyph in glyphs {
        match service.get_emoji(glyph)? {
            Some(info) => {
                log::info!(
                    "{} {} [{}]",
                    info.glyph(),
                    info.name().if_supports_color(Stdout, |t| t.bold()),
                    info.qualifier().if_supports_color(Stdout, |t| t.cyan()),
                );
                log::info!(
                    "    Version: {}, Codepoints: {}",
                    info.specification(),
                    info.code_points_hex(),
                );
            }
            None => {
                log::info!(
                    "{} {}",
                    glyph,
                    "not a recognized emoji".if_supports_color(Stdout, |t| t.dimmed()),
                );
            }
        }
    }
    Ok(())
}
