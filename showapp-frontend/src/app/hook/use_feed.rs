use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_navigate, use_query_map};
use showapp_api::Api;
use showapp_shared::debounce::SEARCH_DEBOUNCE;
use showapp_shared::feed::{FeedFilter, FeedQuery, FeedState, FetchTicket};
use showapp_shared::model::{FeedKind, ItemId, SortBy};
use tracing::{error, trace};

use crate::api::{ApiWeb, SendWeb};
use crate::app::GlobalState;
use crate::path::{PATH_LOGIN, link_feed};
use crate::toolbox::prelude::*;

#[derive(Clone, Copy)]
pub struct Feed {
    pub kind: FeedKind,
    pub state: RwSignal<FeedState>,
    pub query: Memo<FeedQuery>,
    pub search: RwSignal<String>,
    pub sentinel: NodeRef<html::Div>,
    pub newest_id: RwSignal<Option<ItemId>>,
    pub on_like: StoredValue<Box<dyn Fn(ItemId) + Sync + Send + 'static>>,
    pub on_search: StoredValue<Box<dyn Fn(String) + Sync + Send + 'static>>,
    pub on_filter: StoredValue<Box<dyn Fn(FeedFilter) + Sync + Send + 'static>>,
    pub on_sort: StoredValue<Box<dyn Fn(SortBy) + Sync + Send + 'static>>,
    pub on_clear: StoredValue<Box<dyn Fn() + Sync + Send + 'static>>,
    pub on_refresh: StoredValue<Box<dyn Fn() + Sync + Send + 'static>>,
}

impl Feed {
    pub fn is_loading(&self) -> bool {
        self.state.with(|state| state.loading)
    }

    pub fn is_empty(&self) -> bool {
        self.state.with(|state| state.items.is_empty())
    }

    pub fn has_more(&self) -> bool {
        self.state.with(|state| state.has_more)
    }
}

/// Typing a search rewrites the current entry, every other query change is a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum History {
    Push,
    Replace,
}

impl History {
    pub fn options(self) -> NavigateOptions {
        NavigateOptions {
            replace: self == History::Replace,
            ..Default::default()
        }
    }
}

pub fn use_feed(kind: FeedKind) -> Feed {
    let global_state = expect_context::<GlobalState>();
    let api = ApiWeb::new();
    let query_map = use_query_map();
    let query = Memo::new(move |_| query_map.with(|q| FeedQuery::from_params(|key| q.get(key))));
    let initial_query = query.get_untracked();
    let search = RwSignal::new(initial_query.search.clone());
    let state = RwSignal::new(FeedState::new(initial_query));
    let newest_id = RwSignal::new(None::<ItemId>);
    let sentinel = NodeRef::<html::Div>::new();
    let scroll_y = StoredValue::new(0.0_f64);
    let debounce = Debounce::<String>::new();
    let navigate = StoredValue::new_local(
        Box::new(use_navigate()) as Box<dyn Fn(&str, NavigateOptions) + 'static>
    );

    let navigate_to = move |next: FeedQuery, history: History| {
        let url = link_feed(kind, &next);
        trace!("feed navigating to {url} ({history:?})");
        navigate.with_value(|navigate| navigate(&url, history.options()));
    };

    let fetch = move |ticket: FetchTicket| {
        let Some(request) = state.try_with_untracked(|state| state.request(ticket)) else {
            return;
        };
        trace!(
            "fetching {kind} page {} (generation {})",
            ticket.page, ticket.generation
        );
        api.get_items(kind, &request)
            .send_web(async move |result| {
                let result = result.map(|page| {
                    if ticket.page == 1 && page.newest_id.is_some() {
                        let _ = newest_id.try_set(page.newest_id);
                    }
                    page.items
                });
                let _ = state.try_update(|state| state.apply(ticket, result));
            });
    };

    {
        let key = state.with_untracked(|state| state.query.canonical_key());
        let cached = global_state.feeds.load(kind, &key);
        let ticket = state.try_update(|state| state.mount(cached)).flatten();
        if let Some(ticket) = ticket {
            fetch(ticket);
        }
    }

    Effect::new(move || {
        let query = query.get();
        let ticket = state.try_update(|state| state.change_query(query)).flatten();
        if let Some(ticket) = ticket {
            fetch(ticket);
        }
    });

    observe_visible(sentinel, move || {
        let ticket = state.try_update(|state| state.next_page()).flatten();
        if let Some(ticket) = ticket {
            fetch(ticket);
        }
    });

    // the observer only fires on changes, a sentinel that stays visible needs a nudge
    Effect::new(move |prev_len: Option<usize>| {
        let (loading, len) = state.with(|state| (state.loading, state.items.len()));
        if loading {
            return prev_len.unwrap_or_default();
        }
        if len > prev_len.unwrap_or_default() {
            request_animation_frame(move || {
                let visible = sentinel
                    .get_untracked()
                    .is_some_and(|elm| is_in_viewport(&elm));
                if !visible {
                    return;
                }
                let ticket = state.try_update(|state| state.next_page()).flatten();
                if let Some(ticket) = ticket {
                    fetch(ticket);
                }
            });
        }
        len
    });

    Effect::new(move || {
        let rendered = state.with(|state| !state.items.is_empty());
        if !rendered {
            return;
        }
        let Some(y) = state
            .try_update_untracked(|state| state.take_scroll_restore())
            .flatten()
        else {
            return;
        };
        trace!("restoring scroll to {y}");
        request_animation_frame(move || scroll_window_to(y));
    });

    let scroll_listener = window_event_listener(ev::scroll, move |_| {
        scroll_y.set_value(window_scroll_y());
    });

    on_cleanup(move || {
        scroll_listener.remove();
        let Some(entry) =
            state.try_with_untracked(|state| state.snapshot(scroll_y.get_value()))
        else {
            error!("feed state was disposed before the cache snapshot");
            return;
        };
        global_state.feeds.save(kind, entry);
    });

    let on_like = move |id: ItemId| {
        if !global_state.is_logged_in_untracked() {
            navigate.with_value(|navigate| navigate(PATH_LOGIN, NavigateOptions::default()));
            return;
        }
        let Some(change) = state.try_update(|state| state.toggle_like(id)).flatten() else {
            return;
        };
        let req = if change.requested.liked {
            api.add_item_like(kind, id)
        } else {
            api.delete_item_like(kind, id)
        };
        req.send_web(async move |result| {
            if let Err(err) = result {
                error!("like for {kind} {id} failed: {err}");
                let _ = state.try_update(|state| state.revert_like(id, &change));
            }
        });
    };

    let on_search = move |value: String| {
        search.set(value.clone());
        debounce.push(value, SEARCH_DEBOUNCE, move |value| {
            let Some(current) = query.try_get_untracked() else {
                return;
            };
            navigate_to(current.with_search(value), History::Replace);
        });
    };

    let on_filter = move |filter: FeedFilter| {
        navigate_to(query.get_untracked().with_filter_toggled(filter), History::Push);
    };

    let on_sort = move |sort_by: SortBy| {
        navigate_to(query.get_untracked().with_sort(sort_by), History::Push);
    };

    let on_clear = move || {
        debounce.cancel();
        search.set(String::new());
        navigate_to(query.get_untracked().cleared(), History::Push);
    };

    let on_refresh = move || {
        let ticket = state.try_update(|state| state.refresh()).flatten();
        if let Some(ticket) = ticket {
            scroll_window_to(0.0);
            fetch(ticket);
        }
    };

    Feed {
        kind,
        state,
        query,
        search,
        sentinel,
        newest_id,
        on_like: StoredValue::new(Box::new(on_like)),
        on_search: StoredValue::new(Box::new(on_search)),
        on_filter: StoredValue::new(Box::new(on_filter)),
        on_sort: StoredValue::new(Box::new(on_sort)),
        on_clear: StoredValue::new(Box::new(on_clear)),
        on_refresh: StoredValue::new(Box::new(on_refresh)),
    }
}

#[cfg(test)]
mod use_feed_tests {
    use crate::app::hook::use_feed::History;
    use pretty_assertions::assert_eq;
    use test_log::test;

    #[test]
    fn test_history_options() {
        assert_eq!(History::Replace.options().replace, true);
        assert_eq!(History::Push.options().replace, false);
        assert_eq!(History::Push.options().scroll, History::Replace.options().scroll);
    }
}
