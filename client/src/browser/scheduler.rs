//! Event-loop services: gloo timers, `requestAnimationFrame`, and `Date`.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::{Interval, Timeout};
use js_sys::Date;
use theme::dispose::Disposer;
use theme::schedule::{Scheduler, Timestamp};
use wasm_bindgen::{JsCast, closure::Closure};

use super::describe;

pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    #[allow(clippy::cast_possible_truncation)]
    fn now(&self) -> Timestamp {
        let date = Date::new_0();
        // getTimezoneOffset() is minutes *behind* UTC.
        Timestamp::new(date.get_time() as i64, -(date.get_timezone_offset() as i32))
    }

    fn set_timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Disposer {
        let timeout = Timeout::new(delay_ms, task);
        Disposer::new(move || drop(timeout))
    }

    fn set_interval(&self, period_ms: u32, task: Box<dyn FnMut()>) -> Disposer {
        let interval = Interval::new(period_ms, task);
        Disposer::new(move || drop(interval))
    }

    fn request_frame(&self, task: Box<dyn FnOnce(f64)>) -> Disposer {
        let Some(window) = web_sys::window() else {
            log::warn!("theme: no window; animation frame dropped");
            return Disposer::noop();
        };

        let holder: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
        let holder_for_cb = Rc::clone(&holder);
        let mut task = Some(task);
        let cb = Closure::wrap(Box::new(move |ts: f64| {
            // Taking the closure marks the frame as spent for the disposer.
            let spent = holder_for_cb.borrow_mut().take();
            if let Some(task) = task.take() {
                task(ts);
            }
            drop(spent);
        }) as Box<dyn FnMut(f64)>);

        let id = match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => id,
            Err(err) => {
                log::warn!("theme: requestAnimationFrame failed: {}", describe(&err));
                return Disposer::noop();
            }
        };
        *holder.borrow_mut() = Some(cb);

        Disposer::new(move || {
            let pending = holder.borrow_mut().take();
            if let Some(cb) = pending {
                if let Err(err) = window.cancel_animation_frame(id) {
                    log::debug!("theme: cancelAnimationFrame failed: {}", describe(&err));
                }
                drop(cb);
            }
        })
    }
}
