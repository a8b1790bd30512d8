use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use emoji_list_core::{
    CacheLocations, Catalogue, EmojiError, EmojiService, Qualifier, Settings, Transport,
    TransportResponse, codec, parse,
};
use tempfile::TempDir;

const THIRTY_DAYS: Duration = Duration::from_secs(30 * 86_400);

const CATALOGUE_V1: &str = "\
# Version: 15.0
# group: Smileys & Emotion
# subgroup: face-smiling
1F600 ; fully-qualified # 😀 E1.0 grinning face
1F603 ; fully-qualified # 😃 E0.6 grinning face with big mouth
# subgroup: face-affection
263A FE0F ; fully-qualified # ☺️ E0.6 smiling face
";

const CATALOGUE_V2: &str = "\
# Version: 15.1
# group: Smileys & Emotion
# subgroup: face-smiling
1F600 ; fully-qualified # 😀 E1.0 grinning face
1F603 ; fully-qualified # 😃 E0.6 grinning face with big mouth
# subgroup: face-affection
263A FE0F ; fully-qualified # ☺️ E0.6 smiling face
# group: Flags
# subgroup: country-flag
1F1EF 1F1F5 ; fully-qualified # 🇯🇵 E0.6 flag: Japan
";

enum Reply {
    Body(String),
    Status(u16),
    Unreachable,
}

struct MockTransport {
    reply: Reply,
    calls: Arc<AtomicUsize>,
}

impl Transport for MockTransport {
    fn get(&self, _url: &str) -> Result<TransportResponse, EmojiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Body(body) => Ok(TransportResponse {
                status: 200,
                body: body.clone(),
            }),
            Reply::Status(status) => Ok(TransportResponse {
                status: *status,
                body: String::new(),
            }),
            Reply::Unreachable => Err(EmojiError::transport("connection refused")),
        }
    }
}

fn locations(tmp: &TempDir) -> CacheLocations {
    CacheLocations::new(tmp.path().join("app"), tmp.path().join("user"))
}

fn service(tmp: &TempDir, reply: Reply) -> (EmojiService, Arc<AtomicUsize>) {
    service_with(Settings::default(), locations(tmp), reply)
}

fn service_with(
    settings: Settings,
    locations: CacheLocations,
    reply: Reply,
) -> (EmojiService, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let transport = MockTransport {
        reply,
        calls: Arc::clone(&calls),
    };
    (EmojiService::new(settings, locations, transport), calls)
}

fn write_cache(path: &Path, text: &str, last_update: Option<DateTime<Utc>>) {
    let mut catalogue = parse(text).unwrap();
    catalogue.last_update = last_update.map(codec::truncate_to_tick);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, codec::encode(&catalogue).unwrap()).unwrap();
}

fn days_ago(days: i64) -> Option<DateTime<Utc>> {
    Some(Utc::now() - TimeDelta::days(days))
}

// -- auto_initialize --------------------------------------------------------

#[test]
fn auto_initialize_cold_start_without_network_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let (svc, calls) = service(&tmp, Reply::Unreachable);

    let err = svc.auto_initialize().unwrap_err();
    assert!(matches!(err, EmojiError::FatalInit(_)), "{err}");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(svc.is_emoji("😀"), Err(EmojiError::NotLoaded)));
}

#[test]
fn auto_initialize_stale_cache_without_network_uses_cache() {
    let tmp = TempDir::new().unwrap();
    let locs = locations(&tmp);
    write_cache(locs.portable(), CATALOGUE_V1, days_ago(90));
    let before = fs::read(locs.portable()).unwrap();

    let (svc, calls) = service(&tmp, Reply::Unreachable);
    let outcome = svc.auto_initialize().unwrap();

    assert!(outcome.loaded_from_cache);
    assert!(!outcome.refreshed);
    assert!(!outcome.persisted);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(svc.is_emoji("😀").unwrap());
    assert_eq!(fs::read(locs.portable()).unwrap(), before);
    assert!(!locs.user().exists());
}

#[test]
fn auto_initialize_fresh_cache_skips_network() {
    let tmp = TempDir::new().unwrap();
    let locs = locations(&tmp);
    write_cache(locs.user(), CATALOGUE_V1, days_ago(1));

    let (svc, calls) = service(&tmp, Reply::Body(CATALOGUE_V2.to_string()));
    let outcome = svc.auto_initialize().unwrap();

    assert!(outcome.loaded_from_cache);
    assert!(!outcome.refreshed);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(svc.get_all_groups().unwrap().len(), 1);
}

#[test]
fn auto_initialize_cold_start_fetches_and_persists() {
    let tmp = TempDir::new().unwrap();
    let locs = locations(&tmp);
    let (svc, calls) = service(&tmp, Reply::Body(CATALOGUE_V2.to_string()));

    let outcome = svc.auto_initialize().unwrap();
    assert!(!outcome.loaded_from_cache);
    assert!(outcome.refreshed);
    assert!(outcome.persisted);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Non-portable settings save to the per-user location only.
    assert!(locs.user().exists());
    assert!(!locs.portable().exists());

    let cached = codec::decode(&fs::read(locs.user()).unwrap()).unwrap();
    assert_eq!(cached.last_update, svc.last_update());
    assert_eq!(cached.groups, svc.get_all_groups().unwrap());
}

#[test]
fn auto_initialize_portable_saves_next_to_app() {
    let tmp = TempDir::new().unwrap();
    let locs = locations(&tmp);
    let settings = Settings {
        portable: true,
        ..Settings::default()
    };
    let (svc, _) = service_with(settings, locs.clone(), Reply::Body(CATALOGUE_V1.to_string()));

    assert!(svc.auto_initialize().unwrap().persisted);
    assert!(locs.portable().exists());
    assert!(!locs.user().exists());
}

#[test]
fn auto_initialize_keeps_fresh_data_when_save_fails() {
    let tmp = TempDir::new().unwrap();
    // A regular file where the user cache directory should be.
    let blocker = tmp.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();
    let locs = CacheLocations::new(tmp.path().join("app"), blocker.join("user"));
    let (svc, _) = service_with(
        Settings::default(),
        locs,
        Reply::Body(CATALOGUE_V2.to_string()),
    );

    let outcome = svc.auto_initialize().unwrap();
    assert!(outcome.refreshed);
    assert!(!outcome.persisted);
    assert!(svc.is_emoji("🇯🇵").unwrap());
}

#[test]
fn auto_initialize_recovers_from_corrupt_cache() {
    let tmp = TempDir::new().unwrap();
    let locs = locations(&tmp);
    fs::create_dir_all(locs.portable().parent().unwrap()).unwrap();
    fs::write(locs.portable(), b"garbage").unwrap();

    let (svc, _) = service(&tmp, Reply::Body(CATALOGUE_V1.to_string()));
    let outcome = svc.auto_initialize().unwrap();
    assert!(!outcome.loaded_from_cache);
    assert!(outcome.refreshed);
    assert!(svc.is_emoji("😃").unwrap());
}

#[test]
fn auto_initialize_forced_refresh_with_zero_max_age() {
    let tmp = TempDir::new().unwrap();
    let locs = locations(&tmp);
    write_cache(locs.user(), CATALOGUE_V1, days_ago(0));
    let settings = Settings {
        max_age_days: 0,
        ..Settings::default()
    };
    let (svc, calls) = service_with(settings, locs, Reply::Body(CATALOGUE_V2.to_string()));

    let outcome = svc.auto_initialize().unwrap();
    assert!(outcome.refreshed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(svc.get_all_groups().unwrap().len(), 2);
}

// -- refresh_if_stale -------------------------------------------------------

#[test]
fn refresh_is_noop_when_fresh() {
    let tmp = TempDir::new().unwrap();
    write_cache(locations(&tmp).user(), CATALOGUE_V1, days_ago(29));
    let (svc, calls) = service(&tmp, Reply::Body(CATALOGUE_V2.to_string()));
    assert!(svc.load_from_cache().unwrap());
    let last = svc.last_update();

    assert!(!svc.refresh_if_stale(THIRTY_DAYS).unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(svc.last_update(), last);
    assert_eq!(svc.get_all_groups().unwrap().len(), 1);
}

#[test]
fn refresh_fetches_when_stale() {
    let tmp = TempDir::new().unwrap();
    write_cache(locations(&tmp).user(), CATALOGUE_V1, days_ago(31));
    let (svc, calls) = service(&tmp, Reply::Body(CATALOGUE_V2.to_string()));
    assert!(svc.load_from_cache().unwrap());
    let last = svc.last_update().unwrap();

    assert!(svc.refresh_if_stale(THIRTY_DAYS).unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(svc.last_update().unwrap() > last);
    assert_eq!(svc.get_all_groups().unwrap().len(), 2);
    assert!(svc.is_emoji("🇯🇵").unwrap());
}

#[test]
fn refresh_fetches_when_never_loaded() {
    let tmp = TempDir::new().unwrap();
    let (svc, calls) = service(&tmp, Reply::Body(CATALOGUE_V1.to_string()));
    assert!(svc.last_update().is_none());

    assert!(svc.refresh_if_stale(THIRTY_DAYS).unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(svc.last_update().is_some());
    assert_eq!(svc.len(), 3);
}

#[test]
fn refresh_non_success_status_fails_and_keeps_state() {
    let tmp = TempDir::new().unwrap();
    write_cache(locations(&tmp).user(), CATALOGUE_V1, days_ago(60));
    let (svc, _) = service(&tmp, Reply::Status(503));
    svc.load_from_cache().unwrap();
    let last = svc.last_update();

    let err = svc.refresh_if_stale(THIRTY_DAYS).unwrap_err();
    assert!(matches!(err, EmojiError::Transport(_)), "{err}");
    assert_eq!(svc.last_update(), last);
    assert_eq!(svc.len(), 3);
}

#[test]
fn refresh_bad_qualifier_fails_and_keeps_state() {
    let tmp = TempDir::new().unwrap();
    write_cache(locations(&tmp).user(), CATALOGUE_V1, days_ago(60));
    let body = format!("{CATALOGUE_V2}1F436 ; half-qualified # 🐶 E0.6 dog face\n");
    let (svc, _) = service(&tmp, Reply::Body(body));
    svc.load_from_cache().unwrap();

    let err = svc.refresh_if_stale(Duration::ZERO).unwrap_err();
    assert!(matches!(err, EmojiError::Format(_)), "{err}");
    assert_eq!(svc.get_all_groups().unwrap().len(), 1);
    assert!(!svc.is_emoji("🇯🇵").unwrap());
}

// -- load_from_cache / save_to_cache ----------------------------------------

#[test]
fn load_from_cache_reports_absence() {
    let tmp = TempDir::new().unwrap();
    let (svc, _) = service(&tmp, Reply::Unreachable);
    assert!(!svc.load_from_cache().unwrap());
    assert!(svc.last_update().is_none());
}

#[test]
fn load_from_cache_prefers_portable_location() {
    let tmp = TempDir::new().unwrap();
    let locs = locations(&tmp);
    write_cache(locs.portable(), CATALOGUE_V1, days_ago(1));
    write_cache(locs.user(), CATALOGUE_V2, days_ago(1));

    let (svc, _) = service(&tmp, Reply::Unreachable);
    assert!(svc.load_from_cache().unwrap());
    assert_eq!(svc.get_all_groups().unwrap().len(), 1);
}

#[test]
fn load_from_cache_corruption_does_not_fall_through() {
    let tmp = TempDir::new().unwrap();
    let locs = locations(&tmp);
    write_cache(locs.portable(), CATALOGUE_V1, days_ago(1));
    write_cache(locs.user(), CATALOGUE_V2, days_ago(1));

    // Flip the first qualifier byte in the portable cache to an invalid value.
    let mut bytes = fs::read(locs.portable()).unwrap();
    let catalogue = codec::decode(&bytes).unwrap();
    let first = catalogue.iter_emoji().next().unwrap();
    let group = &catalogue.groups[0];
    let offset = 8
        + 4
        + 1
        + group.name.len()
        + 4
        + 1
        + group.subgroups[0].name.len()
        + 4
        + 1
        + first.name().len()
        + 1
        + first.glyph().len()
        + 1
        + first.specification().len();
    assert_eq!(bytes[offset], Qualifier::FullyQualified.as_u8());
    bytes[offset] = 9;
    fs::write(locs.portable(), &bytes).unwrap();

    let (svc, _) = service(&tmp, Reply::Unreachable);
    let err = svc.load_from_cache().unwrap_err();
    assert!(matches!(err, EmojiError::InvalidData(_)), "{err}");
    assert!(svc.last_update().is_none());
}

#[test]
fn save_then_load_round_trips() {
    let tmp = TempDir::new().unwrap();
    let (first, _) = service(&tmp, Reply::Body(CATALOGUE_V2.to_string()));
    first.refresh_if_stale(Duration::ZERO).unwrap();
    first.save_to_cache().unwrap();

    let (second, _) = service(&tmp, Reply::Unreachable);
    assert!(second.load_from_cache().unwrap());
    assert_eq!(second.last_update(), first.last_update());
    assert_eq!(
        second.get_all_groups().unwrap(),
        first.get_all_groups().unwrap()
    );
    assert_eq!(
        second.get_all_emoji().unwrap(),
        first.get_all_emoji().unwrap()
    );
}

// -- lookups ----------------------------------------------------------------

#[test]
fn lookups_before_load_are_not_loaded() {
    let tmp = TempDir::new().unwrap();
    let (svc, _) = service(&tmp, Reply::Unreachable);

    assert!(matches!(svc.get_emoji("😀"), Err(EmojiError::NotLoaded)));
    assert!(matches!(svc.is_emoji("😀"), Err(EmojiError::NotLoaded)));
    assert!(matches!(svc.get_all_emoji(), Err(EmojiError::NotLoaded)));
    assert!(matches!(svc.get_all_groups(), Err(EmojiError::NotLoaded)));
}

#[test]
fn lookups_on_empty_catalogue_are_distinct_error() {
    let tmp = TempDir::new().unwrap();
    let (svc, _) = service(&tmp, Reply::Body("# nothing here\n".to_string()));
    assert!(svc.refresh_if_stale(Duration::ZERO).unwrap());

    assert!(matches!(svc.get_emoji("😀"), Err(EmojiError::EmptyCatalogue)));
    assert!(matches!(svc.is_emoji("😀"), Err(EmojiError::EmptyCatalogue)));
    assert!(matches!(svc.get_all_emoji(), Err(EmojiError::EmptyCatalogue)));
    assert!(matches!(
        svc.get_all_groups(),
        Err(EmojiError::EmptyCatalogue)
    ));
    assert!(svc.get_all_groups().unwrap_err().is_invalid_state());
}

#[test]
fn lookup_returns_last_duplicate_glyph() {
    let tmp = TempDir::new().unwrap();
    let body = "\
# group: Smileys & Emotion
# subgroup: face-affection
263A ; fully-qualified # ☺ E0.6 smiling face
263A ; unqualified # ☺ E0.6 smiling face
";
    let (svc, _) = service(&tmp, Reply::Body(body.to_string()));
    svc.refresh_if_stale(Duration::ZERO).unwrap();

    let info = svc.get_emoji("☺").unwrap().unwrap();
    assert_eq!(info.qualifier(), Qualifier::Unqualified);
    assert_eq!(svc.get_all_emoji().unwrap(), vec!["☺"]);
    assert_eq!(svc.get_emoji("🙂").unwrap(), None);
}

#[test]
fn readers_never_observe_a_partial_catalogue() {
    let tmp = TempDir::new().unwrap();
    let locs = locations(&tmp);
    write_cache(locs.user(), CATALOGUE_V1, days_ago(1));
    let (svc, _) = service(&tmp, Reply::Body(CATALOGUE_V2.to_string()));
    svc.load_from_cache().unwrap();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..200 {
                    let glyphs = svc.get_all_emoji().unwrap();
                    let groups = svc.get_all_groups().unwrap();
                    assert!(glyphs.len() == 3 || glyphs.len() == 4);
                    assert!(groups.len() == 1 || groups.len() == 2);
                }
            });
        }
        s.spawn(|| {
            for _ in 0..20 {
                svc.refresh_if_stale(Duration::ZERO).unwrap();
            }
        });
    });

    assert_eq!(svc.len(), 4);
}

#[test]
fn empty_catalogue_default_is_unloaded() {
    let catalogue = Catalogue::default();
    assert!(catalogue.last_update.is_none());
    assert_eq!(catalogue.emoji_count(), 0);
}
