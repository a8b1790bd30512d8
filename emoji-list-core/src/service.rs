//! Cache lifecycle and lookup service.
//!
//! [`EmojiService`] owns the one in-memory [`Catalogue`] and its glyph index.
//! Loading goes cache → network → cache: read the binary cache if one
//! exists, refresh from the network when it is missing or stale, and write a
//! fresh cache after a successful refresh.
//!
//! The catalogue is never mutated in place. Loads build a complete
//! [`Snapshot`] and publish it with a single `Arc` swap, so readers always
//! see either the old or the new catalogue. Writers (load, refresh, save) are
//! serialized by a separate mutex.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::cache::CacheLocations;
use crate::codec;
use crate::error::EmojiError;
use crate::model::{Catalogue, EmojiInfo, Group};
use crate::parser;
use crate::settings::Settings;
use crate::transport::{HttpTransport, Transport};

/// What `auto_initialize` ended up doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitOutcome {
    /// A cache file was found and decoded.
    pub loaded_from_cache: bool,
    /// New data was fetched from the network.
    pub refreshed: bool,
    /// The fetched data was written back to the cache.
    pub persisted: bool,
}

/// An immutable catalogue together with the index derived from it.
#[derive(Debug, Default)]
struct Snapshot {
    catalogue: Catalogue,
    index: HashMap<String, EmojiInfo>,
    /// Distinct glyphs in first-seen catalogue order.
    glyphs: Vec<String>,
}

impl Snapshot {
    fn build(catalogue: Catalogue) -> Self {
        let index = catalogue.build_index();
        let mut seen = HashSet::new();
        let glyphs = catalogue
            .iter_emoji()
            .map(EmojiInfo::glyph)
            .filter(|glyph| seen.insert(*glyph))
            .map(str::to_string)
            .collect();
        Self {
            catalogue,
            index,
            glyphs,
        }
    }
}

pub struct EmojiService {
    settings: Settings,
    locations: CacheLocations,
    transport: Box<dyn Transport>,
    current: RwLock<Arc<Snapshot>>,
    writer: Mutex<()>,
}

impl EmojiService {
    /// Create an empty, unloaded service.
    pub fn new(
        settings: Settings,
        locations: CacheLocations,
        transport: impl Transport + 'static,
    ) -> Self {
        Self {
            settings,
            locations,
            transport: Box::new(transport),
            current: RwLock::new(Arc::new(Snapshot::default())),
            writer: Mutex::new(()),
        }
    }

    /// Create a service that fetches over HTTP and caches in the configured locations.
    pub fn from_settings(settings: Settings) -> Result<Self, EmojiError> {
        let locations = settings.cache_locations()?;
        let transport = HttpTransport::new(settings.timeout())?;
        Ok(Self::new(settings, locations, transport))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn locations(&self) -> &CacheLocations {
        &self.locations
    }

    // -- Lifecycle ----------------------------------------------------------

    /// Load from cache, refresh if stale, and persist new data.
    ///
    /// Fails with [`EmojiError::FatalInit`] only when the refresh fails and
    /// nothing has ever been loaded. A failed refresh over existing data is
    /// logged and the existing data stays in use. A failed save after a
    /// successful refresh is logged; the fresh data is already installed.
    pub fn auto_initialize(&self) -> Result<InitOutcome, EmojiError> {
        let mut outcome = InitOutcome::default();

        match self.load_from_cache() {
            Ok(loaded) => outcome.loaded_from_cache = loaded,
            Err(e) => log::warn!("Ignoring unreadable emoji cache: {e}"),
        }

        match self.refresh_if_stale(self.settings.max_age()) {
            Ok(refreshed) => outcome.refreshed = refreshed,
            Err(e) => {
                if self.last_update().is_none() {
                    return Err(EmojiError::FatalInit(Box::new(e)));
                }
                log::warn!("Emoji catalogue refresh failed, using cached data: {e}");
                return Ok(outcome);
            }
        }

        if outcome.refreshed {
            match self.save_to_cache() {
                Ok(path) => {
                    log::info!("Saved emoji cache to {}", path.display());
                    outcome.persisted = true;
                }
                Err(e) => log::warn!("Failed to save emoji cache: {e}"),
            }
        }

        Ok(outcome)
    }

    /// Fetch and install a new catalogue unless the current one is younger
    /// than `max_age`. A zero `max_age` always fetches.
    ///
    /// Returns whether new data was installed.
    pub fn refresh_if_stale(&self, max_age: Duration) -> Result<bool, EmojiError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(last) = self.snapshot().catalogue.last_update {
            if is_fresh(last, max_age, Utc::now()) {
                log::debug!("Emoji catalogue from {last} is still fresh, skipping refresh");
                return Ok(false);
            }
        }

        let url = &self.settings.source_url;
        log::info!("Fetching emoji catalogue from {url}");
        let response = self.transport.get(url)?;
        if !response.is_success() {
            return Err(EmojiError::transport(format!(
                "HTTP {} for {url}",
                response.status
            )));
        }

        let (mut catalogue, report) = parser::parse_with_report(&response.body)?;
        log::debug!(
            "Parsed emoji catalogue (version {}): {} emoji, {} orphan subgroups, {} orphan lines, {} unrecognized lines",
            report.version.as_deref().unwrap_or("unknown"),
            report.emoji,
            report.orphan_subgroups,
            report.orphan_lines,
            report.unrecognized_lines,
        );
        if catalogue.groups.is_empty() {
            log::warn!("Emoji catalogue from {url} contains no groups");
        }

        catalogue.last_update = Some(codec::truncate_to_tick(Utc::now()));
        self.install(catalogue);
        Ok(true)
    }

    /// Install the first cache file that can be opened (portable, then user).
    ///
    /// Returns `false` if neither exists. A file that exists but fails to
    /// decode is an error; the second location is not tried.
    pub fn load_from_cache(&self) -> Result<bool, EmojiError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let Some((path, bytes)) = self.locations.read_first()? else {
            log::debug!("No emoji cache found");
            return Ok(false);
        };

        let catalogue = codec::decode(&bytes).map_err(|e| match e {
            EmojiError::InvalidData(msg) => {
                EmojiError::InvalidData(format!("{}: {msg}", path.display()))
            }
            other => other,
        })?;
        log::info!(
            "Loaded {} emoji from cache {}",
            catalogue.emoji_count(),
            path.display()
        );
        self.install(catalogue);
        Ok(true)
    }

    /// Write the current catalogue to the configured cache location.
    pub fn save_to_cache(&self) -> Result<PathBuf, EmojiError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let bytes = codec::encode(&self.snapshot().catalogue)?;
        self.locations.write(self.settings.portable, &bytes)
    }

    // -- Lookup -------------------------------------------------------------

    /// Entry for `glyph`, if it is a known emoji sequence.
    pub fn get_emoji(&self, glyph: &str) -> Result<Option<EmojiInfo>, EmojiError> {
        Ok(self.initialized()?.index.get(glyph).cloned())
    }

    pub fn is_emoji(&self, glyph: &str) -> Result<bool, EmojiError> {
        Ok(self.get_emoji(glyph)?.is_some())
    }

    /// Every known glyph, in catalogue order.
    pub fn get_all_emoji(&self) -> Result<Vec<String>, EmojiError> {
        Ok(self.initialized()?.glyphs.clone())
    }

    /// A copy of the full group tree.
    pub fn get_all_groups(&self) -> Result<Vec<Group>, EmojiError> {
        Ok(self.initialized()?.catalogue.groups.clone())
    }

    /// Time of the last successful load, if any.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.snapshot().catalogue.last_update
    }

    /// Number of distinct glyphs in the index.
    pub fn len(&self) -> usize {
        self.snapshot().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -- Internals ----------------------------------------------------------

    fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn install(&self, catalogue: Catalogue) {
        let snapshot = Arc::new(Snapshot::build(catalogue));
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    fn initialized(&self) -> Result<Arc<Snapshot>, EmojiError> {
        let snapshot = self.snapshot();
        if snapshot.catalogue.last_update.is_none() {
            return Err(EmojiError::NotLoaded);
        }
        if snapshot.catalogue.groups.is_empty() {
            return Err(EmojiError::EmptyCatalogue);
        }
        Ok(snapshot)
    }
}

/// Whether data stamped `last` is still within `max_age` of `now`.
fn is_fresh(last: DateTime<Utc>, max_age: Duration, now: DateTime<Utc>) -> bool {
    if max_age.is_zero() {
        return false;
    }
    match TimeDelta::from_std(max_age) {
        Ok(max_age) => now.signed_duration_since(last) < max_age,
        // Larger than chrono can represent: never stale.
        Err(_) => true,
    }
}
