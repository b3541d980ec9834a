use std::cell::RefCell;
use std::rc::Rc;

use super::*;

fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Disposer) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let log_for_make = Rc::clone(&log);
    let make = move |name: &'static str| {
        let log = Rc::clone(&log_for_make);
        Disposer::new(move || log.borrow_mut().push(name))
    };
    (log, make)
}

#[test]
fn dispose_runs_teardown_once() {
    let (log, make) = recorder();
    let d = make("a");
    d.dispose();
    assert_eq!(*log.borrow(), vec!["a"]);
}

#[test]
fn drop_runs_teardown() {
    let (log, make) = recorder();
    {
        let _d = make("a");
    }
    assert_eq!(*log.borrow(), vec!["a"]);
}

#[test]
fn noop_releases_nothing() {
    Disposer::noop().dispose();
}

#[test]
fn bag_releases_newest_first() {
    let (log, make) = recorder();
    let mut bag = DisposeBag::new();
    bag.push(make("first"));
    bag.push(make("second"));
    bag.push(make("third"));
    assert_eq!(bag.len(), 3);
    bag.clear();
    assert!(bag.is_empty());
    assert_eq!(*log.borrow(), vec!["third", "second", "first"]);
}

#[test]
fn dropping_bag_releases_everything() {
    let (log, make) = recorder();
    {
        let mut bag = DisposeBag::new();
        bag.push(make("a"));
        bag.push(make("b"));
    }
    assert_eq!(log.borrow().len(), 2);
}
