pub mod prelude {
    pub use super::debounce::Debounce;
    pub use super::intersection_observer::{self, observe_visible};
    pub use super::interval::{self};
    pub use super::scroll::{is_in_viewport, scroll_window_to, window_scroll_y};
}

pub mod interval {
    use std::time::Duration;

    use gloo::timers::callback::Interval;
    use leptos::prelude::{StoredValue, UpdateValue, on_cleanup};
    use tracing::trace;

    #[derive(Debug, Clone, Copy)]
    pub struct IntervalHandle(StoredValue<Option<Interval>, leptos::prelude::LocalStorage>);

    impl IntervalHandle {
        pub fn clear(&self) -> bool {
            let mut cleared = false;
            self.0.update_value(|interval| {
                if let Some(interval) = interval.take() {
                    interval.cancel();
                    cleared = true;
                }
            });
            cleared
        }
    }

    /// Repeats `callback` until the owning component is disposed.
    #[track_caller]
    pub fn new<F>(callback: F, duration: Duration) -> IntervalHandle
    where
        F: FnMut() + 'static,
    {
        let caller_location = std::panic::Location::caller();
        let ms = duration.as_millis().min(u32::MAX as u128) as u32;
        let handle = IntervalHandle(StoredValue::new_local(Some(Interval::new(ms, callback))));

        on_cleanup(move || {
            if handle.clear() {
                trace!("interval from {caller_location} cleared");
            }
        });

        handle
    }
}

pub mod debounce {
    use std::time::Duration;

    use gloo::timers::callback::Timeout;
    use leptos::prelude::{LocalStorage, StoredValue, UpdateValue, on_cleanup};
    use showapp_shared::debounce::Debouncer;

    /// Timer plus ticket, a value fires only if nothing newer was pushed within `delay`.
    pub struct Debounce<T: 'static> {
        timer: StoredValue<Option<Timeout>, LocalStorage>,
        debouncer: StoredValue<Debouncer<T>, LocalStorage>,
    }

    impl<T: 'static> Clone for Debounce<T> {
        fn clone(&self) -> Self {
            *self
        }
    }

    impl<T: 'static> Copy for Debounce<T> {}

    impl<T: 'static> Debounce<T> {
        pub fn new() -> Self {
            let this = Self {
                timer: StoredValue::new_local(None),
                debouncer: StoredValue::new_local(Debouncer::new()),
            };
            on_cleanup(move || this.cancel());
            this
        }

        pub fn push<F>(&self, value: T, delay: Duration, callback: F)
        where
            F: FnOnce(T) + 'static,
        {
            let mut ticket = None;
            self.debouncer
                .update_value(|debouncer| ticket = Some(debouncer.push(value)));
            let Some(ticket) = ticket else {
                return;
            };
            let debouncer = self.debouncer;
            let ms = delay.as_millis().min(u32::MAX as u128) as u32;
            let timeout = Timeout::new(ms, move || {
                let mut value = None;
                debouncer.update_value(|debouncer| value = debouncer.fire(ticket));
                if let Some(value) = value {
                    callback(value);
                }
            });
            self.timer.update_value(|timer| {
                if let Some(previous) = timer.replace(timeout) {
                    previous.cancel();
                }
            });
        }

        pub fn cancel(&self) {
            self.debouncer.update_value(|debouncer| debouncer.cancel());
            self.timer.update_value(|timer| {
                if let Some(timer) = timer.take() {
                    timer.cancel();
                }
            });
        }
    }
}

pub mod scroll {
    use leptos::prelude::window;

    pub fn window_scroll_y() -> f64 {
        window().scroll_y().unwrap_or_default()
    }

    pub fn scroll_window_to(y: f64) {
        window().scroll_to_with_x_and_y(0.0, y);
    }

    pub fn is_in_viewport(elm: &web_sys::Element) -> bool {
        let rect = elm.get_bounding_client_rect();
        let height = window()
            .inner_height()
            .ok()
            .and_then(|height| height.as_f64())
            .unwrap_or_default();
        rect.top() < height && rect.bottom() >= 0.0
    }
}

pub mod intersection_observer {
    use leptos::html;
    use leptos::prelude::*;
    use send_wrapper::SendWrapper;
    use tracing::{error, trace};
    use wasm_bindgen::{JsCast, JsValue, prelude::Closure};
    use web_sys::{IntersectionObserver, IntersectionObserverEntry, js_sys::Array};

    /// Calls `callback` every time `target` scrolls into view.
    pub fn observe_visible<F>(target: NodeRef<html::Div>, callback: F)
    where
        F: Fn() + Clone + 'static,
    {
        let observer = StoredValue::new(None::<SendWrapper<IntersectionObserver>>);

        Effect::new(move || {
            let Some(elm) = target.get() else {
                return;
            };
            let callback = callback.clone();
            let new_observer = match new_raw(move |entries, _| {
                if entries.iter().any(|entry| entry.is_intersecting()) {
                    trace!("observed target is visible");
                    callback();
                }
            }) {
                Ok(observer) => observer,
                Err(err) => {
                    error!("failed to create intersection observer: {err:?}");
                    return;
                }
            };
            new_observer.observe(&elm);
            observer.update_value(|current| {
                if let Some(previous) = current.replace(SendWrapper::new(new_observer)) {
                    previous.disconnect();
                }
            });
        });

        on_cleanup(move || {
            observer.update_value(|current| {
                if let Some(observer) = current.take() {
                    observer.disconnect();
                }
            });
        });
    }

    pub fn new_closure(
        mut callback: impl FnMut(Vec<IntersectionObserverEntry>, IntersectionObserver) + 'static,
    ) -> JsValue {
        Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
            move |entries: Array, observer: IntersectionObserver| {
                let entries: Vec<IntersectionObserverEntry> = entries
                    .to_vec()
                    .into_iter()
                    .map(|v| v.unchecked_into::<IntersectionObserverEntry>())
                    .collect();
                callback(entries, observer);
            },
        )
        .into_js_value()
    }

    pub fn new_raw<F>(callback: F) -> Result<IntersectionObserver, JsValue>
    where
        F: FnMut(Vec<IntersectionObserverEntry>, IntersectionObserver) + 'static,
    {
        IntersectionObserver::new(new_closure(callback).as_ref().unchecked_ref())
    }
}
