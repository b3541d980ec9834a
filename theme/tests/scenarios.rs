//! End-to-end behavior of the theme chrome against in-memory hosts.

use theme::chrome::{ChromeHosts, ThemeChrome};
use theme::config::ThemeConfig;
use theme::controls::{ButtonKind, ButtonState, MountStatus};
use theme::preference::{self, ResolvedTheme, ThemePreference};
use theme::schedule::Timestamp;
use theme::store::ThemeStore;
use theme::testing::{FakeAmbientHost, FakeControlsHost, ManualScheduler, RecordingMarker, SharedStorage};

use std::cell::Cell;
use std::rc::Rc;

const KEY: &str = "theme-preference";

struct Page {
    scheduler: ManualScheduler,
    storage: SharedStorage,
    marker: RecordingMarker,
    controls: FakeControlsHost,
    ambient: FakeAmbientHost,
    chrome: ThemeChrome,
}

fn load_page(now: Timestamp, storage: SharedStorage, controls: FakeControlsHost) -> Page {
    let scheduler = ManualScheduler::starting_at(now);
    let marker = RecordingMarker::new();
    let ambient = FakeAmbientHost::new();
    let chrome = ThemeChrome::start(
        ThemeConfig::default(),
        ChromeHosts {
            storage: Box::new(storage.clone()),
            marker: Box::new(marker.clone()),
            scheduler: Rc::new(scheduler.clone()),
            controls: Box::new(controls.clone()),
            ambient: Box::new(ambient.clone()),
        },
        0.0,
        1,
    );
    Page { scheduler, storage, marker, controls, ambient, chrome }
}

fn page_at(hour: u8) -> Page {
    load_page(Timestamp::at_hour(hour, 0), SharedStorage::new(), FakeControlsHost::new())
}

// =============================================================
// Preference rotation and resolution
// =============================================================

#[test]
fn cycle_follows_fixed_rotation() {
    let storage = SharedStorage::new();
    let store = ThemeStore::new(Box::new(storage.clone()), KEY);

    let seen: Vec<ThemePreference> = (0..9).map(|_| store.cycle()).collect();

    let expected = [ThemePreference::Light, ThemePreference::Dark, ThemePreference::Auto].repeat(3);
    assert_eq!(seen, expected);
    assert_eq!(storage.raw(KEY).as_deref(), Some("auto"));
}

#[test]
fn resolve_is_pure() {
    for hour in 0..24 {
        let now = Timestamp::at_hour(hour, 30);
        for pref in ThemePreference::ALL {
            assert_eq!(preference::resolve(pref, now), preference::resolve(pref, now));
        }
    }
}

#[test]
fn auto_resolves_by_local_hour() {
    assert_eq!(preference::resolve(ThemePreference::Auto, Timestamp::at_hour(20, 0)), ResolvedTheme::Dark);
    assert_eq!(preference::resolve(ThemePreference::Auto, Timestamp::at_hour(10, 0)), ResolvedTheme::Light);

    assert_eq!(page_at(20).marker.attribute().as_deref(), Some("dark"));
    assert_eq!(page_at(10).marker.attribute(), None);
}

#[test]
fn bogus_stored_value_reads_as_auto() {
    let storage = SharedStorage::new();
    storage.put_raw(KEY, "bogus");
    let page = load_page(Timestamp::at_hour(20, 0), storage, FakeControlsHost::new());

    assert_eq!(page.chrome.applier().store().get(), ThemePreference::Auto);
    assert_eq!(page.chrome.applier().current(), Some(ResolvedTheme::Dark));
    assert!(page.chrome.applier().is_rechecking());
}

#[test]
fn stored_explicit_preference_wins_over_clock() {
    let storage = SharedStorage::new();
    storage.put_raw(KEY, "light");
    let page = load_page(Timestamp::at_hour(23, 0), storage, FakeControlsHost::new());

    assert_eq!(page.marker.attribute(), None);
    assert!(!page.chrome.applier().is_rechecking());
}

// =============================================================
// Applier guarantees
// =============================================================

#[test]
fn apply_same_theme_twice_notifies_once() {
    let page = page_at(10);
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    let _sub = page.chrome.applier().subscribe(move |_| counter.set(counter.get() + 1));

    page.chrome.applier().apply(ResolvedTheme::Dark);
    page.chrome.applier().apply(ResolvedTheme::Dark);

    assert_eq!(hits.get(), 1);
}

#[test]
fn system_scheme_change_rechecks_without_overriding_clock() {
    let page = page_at(10);
    let writes = page.marker.writes().len();

    page.chrome.refresh();

    assert_eq!(page.marker.writes().len(), writes);
    assert_eq!(page.chrome.applier().current(), Some(ResolvedTheme::Light));
}

#[test]
fn auto_page_turns_dark_at_nightfall() {
    let page = load_page(Timestamp::at_hour(17, 58), SharedStorage::new(), FakeControlsHost::new());
    assert_eq!(page.marker.attribute(), None);

    page.scheduler.advance(3 * 60_000);

    assert_eq!(page.marker.attribute().as_deref(), Some("dark"));
    assert_eq!(page.controls.toggle_icon(), Some(ResolvedTheme::Dark));
    assert_eq!(page.chrome.ambient().active_theme(), Some(ResolvedTheme::Dark));
}

// =============================================================
// Floating controls
// =============================================================

#[test]
fn reinit_leaves_exactly_one_of_each_button() {
    let page = page_at(10);
    for _ in 0..10 {
        page.chrome.reinit();
    }
    assert_eq!(page.controls.count(ButtonKind::ThemeToggle), 1);
    assert_eq!(page.controls.count(ButtonKind::BackToTop), 1);
    assert_eq!(page.ambient.live_scenes().len(), 1);
    // Icon listener plus ambient listener.
    assert_eq!(page.chrome.applier().listener_count(), 2);
}

#[test]
fn scroll_path_with_idle_gaps() {
    let page = page_at(10);
    let idle_ms = page.chrome.tracker().idle_ms();

    for y in [50.0, 150.0, 350.0, 150.0, 50.0] {
        page.chrome.record_scroll(y);
        page.scheduler.run_frame();
        assert!(!page.controls.is_visible(ButtonKind::ThemeToggle), "toggle shown mid-burst at {y}");
        assert!(!page.controls.is_visible(ButtonKind::BackToTop), "back-to-top shown mid-burst at {y}");

        page.scheduler.advance(idle_ms);
        assert_eq!(page.controls.is_visible(ButtonKind::BackToTop), y > 300.0, "back-to-top at {y}");
        assert_eq!(page.controls.is_visible(ButtonKind::ThemeToggle), y > 100.0, "toggle at {y}");
    }
}

#[test]
fn suppressed_is_distinct_from_hidden() {
    let page = page_at(10);
    page.chrome.record_scroll(200.0);
    page.scheduler.run_frame();

    assert_eq!(page.controls.state(ButtonKind::ThemeToggle), Some(ButtonState::Suppressed));
    assert_eq!(page.controls.state(ButtonKind::BackToTop), Some(ButtonState::Hidden));
}

#[test]
fn three_clicks_from_auto_by_day() {
    let page = page_at(10);
    let mut markers = vec![page.marker.attribute()];
    for _ in 0..3 {
        page.controls.click(ButtonKind::ThemeToggle);
        markers.push(page.marker.attribute());
    }

    assert_eq!(markers, vec![None, None, Some("dark".to_owned()), None]);
    assert_eq!(page.storage.raw(KEY).as_deref(), Some("auto"));
    assert_eq!(
        page.controls.toast_history(),
        vec!["☀️ Light theme".to_owned(), "🌙 Dark theme".to_owned(), "🔄 Auto theme".to_owned()]
    );
}

#[test]
fn three_clicks_from_auto_by_night() {
    let page = page_at(20);
    let mut markers = vec![page.marker.attribute()];
    for _ in 0..3 {
        page.chrome.cycle_theme();
        markers.push(page.marker.attribute());
    }

    let dark = Some("dark".to_owned());
    assert_eq!(markers, vec![dark.clone(), None, dark.clone(), dark]);
}

#[test]
fn late_container_is_picked_up() {
    let controls = FakeControlsHost::without_container();
    let page = load_page(Timestamp::at_hour(10, 0), SharedStorage::new(), controls);
    assert!(matches!(page.chrome.controls().status(), MountStatus::Pending { .. }));

    page.controls.insert_container();

    assert_eq!(page.chrome.controls().status(), MountStatus::Mounted);
    assert_eq!(page.controls.count(ButtonKind::ThemeToggle), 1);
}

// =============================================================
// Degraded storage
// =============================================================

#[test]
fn theme_works_for_the_session_without_storage() {
    let storage = SharedStorage::new();
    storage.fail_reads(true);
    storage.fail_writes(true);
    let page = load_page(Timestamp::at_hour(10, 0), storage, FakeControlsHost::new());

    page.controls.click(ButtonKind::ThemeToggle);
    page.controls.click(ButtonKind::ThemeToggle);

    assert_eq!(page.chrome.applier().store().get(), ThemePreference::Dark);
    assert_eq!(page.marker.attribute().as_deref(), Some("dark"));
    assert!(page.chrome.applier().store().is_session_only());
    assert_eq!(page.storage.write_attempts(), 0);
}

#[test]
fn dropping_chrome_releases_everything() {
    let page = page_at(12);
    page.chrome.record_scroll(400.0);
    let Page { scheduler, controls, ambient, chrome, .. } = page;

    drop(chrome);

    assert_eq!(controls.count(ButtonKind::ThemeToggle), 0);
    assert_eq!(controls.count(ButtonKind::BackToTop), 0);
    assert!(ambient.live_scenes().is_empty());
    assert_eq!(scheduler.pending_timers(), 0);
    assert_eq!(scheduler.pending_frames(), 0);
}
