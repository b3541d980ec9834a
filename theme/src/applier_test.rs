use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::schedule::Timestamp;
use crate::testing::{ManualScheduler, RecordingMarker, SharedStorage};

const KEY: &str = "theme-preference";
const RECHECK_MS: u32 = 60_000;

struct Fixture {
    scheduler: ManualScheduler,
    storage: SharedStorage,
    marker: RecordingMarker,
    applier: ThemeApplier,
}

fn fixture_at(now: Timestamp) -> Fixture {
    let scheduler = ManualScheduler::starting_at(now);
    let storage = SharedStorage::new();
    let marker = RecordingMarker::new();
    let store = Rc::new(ThemeStore::new(Box::new(storage.clone()), KEY));
    let applier = ThemeApplier::new(
        store,
        Box::new(marker.clone()),
        Rc::new(scheduler.clone()),
        DayBounds::default(),
        RECHECK_MS,
    );
    Fixture { scheduler, storage, marker, applier }
}

fn fixture() -> Fixture {
    fixture_at(Timestamp::at_hour(10, 0))
}

fn recorder(applier: &ThemeApplier) -> (Rc<RefCell<Vec<ResolvedTheme>>>, Disposer) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let sub = applier.subscribe(move |theme| sink.borrow_mut().push(theme));
    (seen, sub)
}

// =============================================================
// apply-only-on-change
// =============================================================

#[test]
fn apply_twice_notifies_once() {
    let f = fixture();
    let (seen, _sub) = recorder(&f.applier);

    f.applier.apply(ResolvedTheme::Dark);
    f.applier.apply(ResolvedTheme::Dark);

    assert_eq!(*seen.borrow(), vec![ResolvedTheme::Dark]);
    assert_eq!(f.marker.writes(), vec![ResolvedTheme::Dark]);
}

#[test]
fn first_apply_writes_marker_even_for_light() {
    let f = fixture();
    f.applier.apply(ResolvedTheme::Light);
    assert_eq!(f.marker.writes(), vec![ResolvedTheme::Light]);
    assert_eq!(f.marker.attribute(), None);
    assert_eq!(f.applier.current(), Some(ResolvedTheme::Light));
}

#[test]
fn marker_follows_each_change() {
    let f = fixture();
    f.applier.apply(ResolvedTheme::Dark);
    assert_eq!(f.marker.attribute().as_deref(), Some("dark"));
    f.applier.apply(ResolvedTheme::Light);
    assert_eq!(f.marker.attribute(), None);
}

// =============================================================
// Notification ordering
// =============================================================

#[test]
fn listeners_run_in_registration_order() {
    let f = fixture();
    let order = Rc::new(RefCell::new(Vec::new()));
    let subs: Vec<Disposer> = (0..3)
        .map(|i| {
            let order = Rc::clone(&order);
            f.applier.subscribe(move |_| order.borrow_mut().push(i))
        })
        .collect();

    f.applier.apply(ResolvedTheme::Dark);

    assert_eq!(*order.borrow(), vec![0, 1, 2]);
    drop(subs);
}

#[test]
fn listeners_see_marker_already_written() {
    let f = fixture();
    let marker = f.marker.clone();
    let observed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&observed);
    let _sub = f.applier.subscribe(move |_| sink.borrow_mut().push(marker.attribute()));

    f.applier.apply(ResolvedTheme::Dark);
    f.applier.apply(ResolvedTheme::Light);

    assert_eq!(*observed.borrow(), vec![Some("dark".to_owned()), None]);
}

#[test]
fn apply_from_listener_is_queued_not_interleaved() {
    let f = fixture();
    let applier = f.applier.clone();
    let flip_back = f.applier.subscribe(move |theme| {
        if theme == ResolvedTheme::Dark {
            applier.apply(ResolvedTheme::Light);
        }
    });
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let _late = f.applier.subscribe(move |theme| sink.borrow_mut().push(theme));

    f.applier.apply(ResolvedTheme::Dark);

    // The late listener sees the whole dark round before the light one starts.
    assert_eq!(*log.borrow(), vec![ResolvedTheme::Dark, ResolvedTheme::Light]);
    assert_eq!(f.marker.writes(), vec![ResolvedTheme::Dark, ResolvedTheme::Light]);
    assert_eq!(f.applier.current(), Some(ResolvedTheme::Light));
    drop(flip_back);
}

#[test]
fn listener_disposed_mid_round_is_skipped() {
    let f = fixture();
    let victim: Rc<RefCell<Option<Disposer>>> = Rc::new(RefCell::new(None));
    let killer_slot = Rc::clone(&victim);
    let _killer = f.applier.subscribe(move |_| {
        let sub = killer_slot.borrow_mut().take();
        drop(sub);
    });
    let (seen, sub) = recorder(&f.applier);
    *victim.borrow_mut() = Some(sub);

    f.applier.apply(ResolvedTheme::Dark);

    assert!(seen.borrow().is_empty());
    assert_eq!(f.applier.listener_count(), 1);
}

#[test]
fn disposer_detaches_listener() {
    let f = fixture();
    let (seen, sub) = recorder(&f.applier);
    assert_eq!(f.applier.listener_count(), 1);

    sub.dispose();
    f.applier.apply(ResolvedTheme::Dark);

    assert_eq!(f.applier.listener_count(), 0);
    assert!(seen.borrow().is_empty());
}

// =============================================================
// resolve / refresh
// =============================================================

#[test]
fn resolve_uses_scheduler_clock() {
    let f = fixture_at(Timestamp::at_hour(20, 0));
    assert_eq!(f.applier.resolve(ThemePreference::Auto), ResolvedTheme::Dark);
    f.scheduler.set_now(Timestamp::at_hour(10, 0));
    assert_eq!(f.applier.resolve(ThemePreference::Auto), ResolvedTheme::Light);
    assert_eq!(f.applier.resolve(ThemePreference::Dark), ResolvedTheme::Dark);
}

#[test]
fn refresh_applies_stored_preference() {
    let f = fixture();
    f.storage.put_raw(KEY, "dark");
    f.applier.refresh();
    assert_eq!(f.applier.current(), Some(ResolvedTheme::Dark));
    assert!(!f.applier.is_rechecking());
}

// =============================================================
// Auto recheck
// =============================================================

#[test]
fn recheck_armed_only_while_auto() {
    let f = fixture();
    f.applier.apply_preference(ThemePreference::Auto);
    assert!(f.applier.is_rechecking());
    assert_eq!(f.scheduler.pending_timers(), 1);

    f.applier.apply_preference(ThemePreference::Light);
    assert!(!f.applier.is_rechecking());
    assert_eq!(f.scheduler.pending_timers(), 0);

    f.applier.apply_preference(ThemePreference::Auto);
    assert!(f.applier.is_rechecking());
    assert_eq!(f.scheduler.pending_timers(), 1);
}

#[test]
fn repeated_auto_keeps_a_single_timer() {
    let f = fixture();
    f.applier.apply_preference(ThemePreference::Auto);
    f.applier.apply_preference(ThemePreference::Auto);
    f.applier.refresh();
    assert_eq!(f.scheduler.pending_timers(), 1);
}

#[test]
fn recheck_flips_at_night_boundary() {
    let f = fixture_at(Timestamp::at_hour(17, 59));
    let (seen, _sub) = recorder(&f.applier);
    f.applier.refresh();
    assert_eq!(f.applier.current(), Some(ResolvedTheme::Light));

    f.scheduler.advance(RECHECK_MS);

    assert_eq!(f.applier.current(), Some(ResolvedTheme::Dark));
    assert_eq!(*seen.borrow(), vec![ResolvedTheme::Light, ResolvedTheme::Dark]);
}

#[test]
fn recheck_without_boundary_is_silent() {
    let f = fixture_at(Timestamp::at_hour(10, 0));
    f.applier.refresh();
    let (seen, _sub) = recorder(&f.applier);

    f.scheduler.advance(RECHECK_MS * 5);

    assert!(seen.borrow().is_empty());
    assert_eq!(f.marker.writes().len(), 1);
}

#[test]
fn recheck_stops_itself_when_stored_preference_turns_explicit() {
    let f = fixture_at(Timestamp::at_hour(17, 59));
    f.applier.refresh();
    f.applier.store().set(ThemePreference::Light);

    f.scheduler.advance(RECHECK_MS);

    assert!(!f.applier.is_rechecking());
    assert_eq!(f.scheduler.pending_timers(), 0);
    assert_eq!(f.applier.current(), Some(ResolvedTheme::Light));
}

#[test]
fn dropping_applier_cancels_recheck() {
    let f = fixture();
    f.applier.refresh();
    assert_eq!(f.scheduler.pending_timers(), 1);
    let Fixture { scheduler, applier, .. } = f;
    drop(applier);
    assert_eq!(scheduler.pending_timers(), 0);
}
