use std::sync::Once;

use super::*;
use crate::testing::SharedStorage;

const KEY: &str = "theme-preference";

fn store_with(storage: &SharedStorage) -> ThemeStore {
    ThemeStore::new(Box::new(storage.clone()), KEY)
}

thread_local! {
    static CAPTURED: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Global logger that files each record under the thread that emitted it,
/// so parallel tests never see each other's output.
struct CapturingLogger;

impl log::Log for CapturingLogger {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        CAPTURED.with(|c| c.borrow_mut().push((record.level(), record.args().to_string())));
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger;
static INSTALL: Once = Once::new();

/// Run `f` and return the warnings it logged on this thread.
fn warnings_from(f: impl FnOnce()) -> Vec<String> {
    INSTALL.call_once(|| {
        log::set_logger(&LOGGER).expect("no other logger in the test binary");
        log::set_max_level(log::LevelFilter::Trace);
    });
    CAPTURED.with(|c| c.borrow_mut().clear());
    f();
    CAPTURED.with(|c| {
        c.borrow_mut()
            .drain(..)
            .filter(|(level, _)| *level == log::Level::Warn)
            .map(|(_, message)| message)
            .collect()
    })
}

// =============================================================
// get()
// =============================================================

#[test]
fn get_defaults_to_auto_when_unset() {
    let storage = SharedStorage::new();
    assert_eq!(store_with(&storage).get(), ThemePreference::Auto);
}

#[test]
fn get_reads_valid_values() {
    for pref in ThemePreference::ALL {
        let storage = SharedStorage::new();
        storage.put_raw(KEY, pref.as_str());
        assert_eq!(store_with(&storage).get(), pref);
    }
}

#[test]
fn get_treats_bogus_value_as_auto() {
    let storage = SharedStorage::new();
    storage.put_raw(KEY, "bogus");
    let store = store_with(&storage);
    assert_eq!(store.get(), ThemePreference::Auto);
    // Repeated reads stay quiet and stable.
    assert_eq!(store.get(), ThemePreference::Auto);
    assert!(!store.is_session_only());
}

#[test]
fn get_treats_empty_value_as_auto() {
    let storage = SharedStorage::new();
    storage.put_raw(KEY, "");
    assert_eq!(store_with(&storage).get(), ThemePreference::Auto);
    storage.put_raw(KEY, "   ");
    assert_eq!(store_with(&storage).get(), ThemePreference::Auto);
}

#[test]
fn get_rejects_padded_values() {
    let storage = SharedStorage::new();
    storage.put_raw(KEY, " dark\n");
    assert_eq!(store_with(&storage).get(), ThemePreference::Auto);
    storage.put_raw(KEY, "Dark");
    assert_eq!(store_with(&storage).get(), ThemePreference::Auto);
}

#[test]
fn unrecognized_value_warns_once_per_store() {
    let storage = SharedStorage::new();
    storage.put_raw(KEY, "bogus");
    let store = store_with(&storage);

    let warnings = warnings_from(|| {
        for _ in 0..5 {
            assert_eq!(store.get(), ThemePreference::Auto);
        }
        store.cycle();
    });

    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(warnings[0].contains("bogus"));
}

#[test]
fn empty_value_reads_quietly() {
    let storage = SharedStorage::new();
    storage.put_raw(KEY, "");
    let store = store_with(&storage);
    let warnings = warnings_from(|| {
        assert_eq!(store.get(), ThemePreference::Auto);
        assert_eq!(store.get(), ThemePreference::Auto);
    });
    assert!(warnings.is_empty(), "{warnings:?}");
}

#[test]
fn memory_storage_seeded_entry_is_read() {
    let store = ThemeStore::new(Box::new(MemoryStorage::new().with_entry(KEY, "light")), KEY);
    assert_eq!(store.get(), ThemePreference::Light);
}

// =============================================================
// set() / cycle()
// =============================================================

#[test]
fn set_persists_plain_string() {
    let storage = SharedStorage::new();
    let store = store_with(&storage);
    store.set(ThemePreference::Dark);
    assert_eq!(storage.raw(KEY).as_deref(), Some("dark"));
    assert_eq!(store.get(), ThemePreference::Dark);
}

#[test]
fn cycle_follows_rotation_and_persists() {
    let storage = SharedStorage::new();
    let store = store_with(&storage);
    let seen: Vec<_> = (0..7).map(|_| store.cycle()).collect();
    assert_eq!(
        seen,
        vec![
            ThemePreference::Light,
            ThemePreference::Dark,
            ThemePreference::Auto,
            ThemePreference::Light,
            ThemePreference::Dark,
            ThemePreference::Auto,
            ThemePreference::Light,
        ]
    );
    assert_eq!(storage.raw(KEY).as_deref(), Some("light"));
}

#[test]
fn cycle_from_bogus_starts_at_auto() {
    let storage = SharedStorage::new();
    storage.put_raw(KEY, "bogus");
    let store = store_with(&storage);
    assert_eq!(store.cycle(), ThemePreference::Light);
}

// =============================================================
// Degraded storage
// =============================================================

#[test]
fn unreadable_storage_falls_back_to_session() {
    let storage = SharedStorage::new();
    storage.fail_reads(true);
    let store = store_with(&storage);
    assert_eq!(store.get(), ThemePreference::Auto);
    assert!(store.is_session_only());

    store.set(ThemePreference::Dark);
    assert_eq!(store.get(), ThemePreference::Dark);
}

#[test]
fn rejected_write_keeps_theme_for_session() {
    let storage = SharedStorage::new();
    storage.fail_writes(true);
    let store = store_with(&storage);
    assert_eq!(store.cycle(), ThemePreference::Light);
    assert!(store.is_session_only());
    assert_eq!(store.get(), ThemePreference::Light);
    assert_eq!(store.cycle(), ThemePreference::Dark);
    assert_eq!(store.cycle(), ThemePreference::Auto);
    assert_eq!(storage.raw(KEY), None);
}

#[test]
fn session_only_store_stops_touching_backend() {
    let storage = SharedStorage::new();
    storage.fail_writes(true);
    let store = store_with(&storage);
    store.set(ThemePreference::Dark);
    let writes = storage.write_attempts();
    store.set(ThemePreference::Light);
    store.cycle();
    assert_eq!(storage.write_attempts(), writes);
}

#[test]
fn degraded_storage_warns_once() {
    let storage = SharedStorage::new();
    storage.fail_reads(true);
    storage.fail_writes(true);
    let store = store_with(&storage);

    let warnings = warnings_from(|| {
        for _ in 0..5 {
            assert_eq!(store.get(), ThemePreference::Auto);
        }
        store.set(ThemePreference::Dark);
        store.cycle();
    });

    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(warnings[0].contains("unavailable"));
}

#[test]
fn failed_write_warns_once() {
    let storage = SharedStorage::new();
    storage.fail_writes(true);
    let store = store_with(&storage);

    let warnings = warnings_from(|| {
        store.set(ThemePreference::Dark);
        store.set(ThemePreference::Light);
        store.cycle();
        assert_eq!(store.get(), ThemePreference::Dark);
    });

    assert_eq!(warnings.len(), 1, "{warnings:?}");
}

#[test]
fn store_reports_its_key() {
    let store = store_with(&SharedStorage::new());
    assert_eq!(store.key(), KEY);
}
