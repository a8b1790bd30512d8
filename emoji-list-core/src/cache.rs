use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::EmojiError;

/// File name of the binary cache in either location.
pub const CACHE_FILE_NAME: &str = "emoji-cache.bin";

/// Directory under the per-user data dir that holds the cache.
const USER_CACHE_DIR: &str = "EmojiList";

/// Which of the two cache locations a path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    /// Next to the executable.
    Portable,
    /// Under the per-user application data dir.
    User,
}

/// Information about a cache file for display purposes.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub kind: CacheKind,
    pub path: PathBuf,
    /// Size in bytes, or `None` if the file does not exist.
    pub file_size: Option<u64>,
}

/// The two candidate cache files, in load order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocations {
    portable: PathBuf,
    user: PathBuf,
}

impl CacheLocations {
    /// Use `portable_dir` and `user_dir` as the directories holding the cache file.
    pub fn new(portable_dir: impl Into<PathBuf>, user_dir: impl Into<PathBuf>) -> Self {
        Self {
            portable: portable_dir.into().join(CACHE_FILE_NAME),
            user: user_dir.into().join(CACHE_FILE_NAME),
        }
    }

    /// Resolve the default locations, with optional per-directory overrides.
    ///
    /// Defaults are the executable's directory and `<data_dir>/EmojiList`.
    pub fn resolve(portable_dir: Option<&Path>, user_dir: Option<&Path>) -> Result<Self, EmojiError> {
        let portable = match portable_dir {
            Some(dir) => dir.to_path_buf(),
            None => app_base_dir()?,
        };
        let user = match user_dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::data_dir()
                .ok_or_else(|| EmojiError::config("Could not determine user data directory"))?
                .join(USER_CACHE_DIR),
        };
        Ok(Self::new(portable, user))
    }

    pub fn portable(&self) -> &Path {
        &self.portable
    }

    pub fn user(&self) -> &Path {
        &self.user
    }

    /// Paths in the order they are tried when loading: portable, then user.
    pub fn load_order(&self) -> [(CacheKind, &Path); 2] {
        [
            (CacheKind::Portable, self.portable.as_path()),
            (CacheKind::User, self.user.as_path()),
        ]
    }

    /// The single path written by a save.
    pub fn save_target(&self, portable: bool) -> &Path {
        if portable { &self.portable } else { &self.user }
    }

    /// Read the first cache file that can be opened.
    ///
    /// A file that cannot be opened is skipped. A file that opens but cannot
    /// be read is an error.
    pub fn read_first(&self) -> Result<Option<(PathBuf, Vec<u8>)>, EmojiError> {
        for (kind, path) in self.load_order() {
            let mut file = match fs::File::open(path) {
                Ok(f) => f,
                Err(e) => {
                    log::debug!("No {kind:?} emoji cache at {}: {e}", path.display());
                    continue;
                }
            };
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            return Ok(Some((path.to_path_buf(), bytes)));
        }
        Ok(None)
    }

    /// Write `bytes` to the save target, creating parent directories.
    ///
    /// The data goes to a temporary sibling first and is renamed into place so
    /// a failed write never leaves a half-written cache behind.
    pub fn write(&self, portable: bool, bytes: &[u8]) -> Result<PathBuf, EmojiError> {
        let path = self.save_target(portable);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("bin.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        Ok(path.to_path_buf())
    }

    /// Both cache files and whether they exist.
    pub fn list(&self) -> Vec<CacheEntry> {
        self.load_order()
            .into_iter()
            .map(|(kind, path)| CacheEntry {
                kind,
                path: path.to_path_buf(),
                file_size: fs::metadata(path)
                    .ok()
                    .filter(|m| m.is_file())
                    .map(|m| m.len()),
            })
            .collect()
    }

    /// Delete both cache files. Returns the number of bytes freed.
    pub fn clear(&self) -> Result<u64, EmojiError> {
        let mut total_size = 0u64;
        for (_, path) in self.load_order() {
            if path.is_file() {
                if let Ok(meta) = fs::metadata(path) {
                    total_size += meta.len();
                }
                fs::remove_file(path)?;
            }
        }
        Ok(total_size)
    }
}

/// Directory containing the running executable.
fn app_base_dir() -> Result<PathBuf, EmojiError> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| EmojiError::config("Could not determine executable directory"))
}
