use std::time::Duration;

use leptos::prelude::*;
use showapp_api::Api;
use showapp_shared::feed::{FeedQuery, FeedRequest};
use showapp_shared::model::{FeedKind, ItemId, SortBy};
use tracing::{debug, error, trace};

use crate::api::{ApiWeb, SendWeb};
use crate::toolbox::prelude::*;

pub const NEW_POSTS_POLL: Duration = Duration::from_secs(60);

#[derive(Clone, Copy)]
pub struct NewPosts {
    pub available: Memo<bool>,
    pub on_dismiss: StoredValue<Box<dyn Fn() + Sync + Send + 'static>>,
}

/// Polls the newest item id and compares it with the one the feed was loaded with.
pub fn use_new_posts(kind: FeedKind, seen_newest: RwSignal<Option<ItemId>>) -> NewPosts {
    let api = ApiWeb::new();
    let latest = RwSignal::new(None::<ItemId>);

    let available = Memo::new(move |_| match (seen_newest.get(), latest.get()) {
        (Some(seen), Some(latest)) => latest.0 > seen.0,
        _ => false,
    });

    let poll = move || {
        if api.is_pending_untracked() {
            trace!("new posts poll still pending, skipping");
            return;
        }
        let request = FeedRequest::new(FeedQuery::default().with_sort(SortBy::Newest), 1).with_limit(1);
        api.get_items(kind, &request)
            .send_web_busy(api.busy, async move |result| match result {
                Ok(page) => {
                    let newest = page
                        .newest_id
                        .or_else(|| page.items.first().map(|item| item.id));
                    trace!("newest {kind} id is {newest:?}");
                    let _ = latest.try_set(newest);
                }
                Err(err) => {
                    error!("polling for new {kind} failed: {err}");
                }
            });
    };

    if kind.is_apps() {
        debug!("polling for new {kind} every {}s", NEW_POSTS_POLL.as_secs());
        interval::new(poll, NEW_POSTS_POLL);
    }

    let on_dismiss = move || {
        let latest = latest.get_untracked();
        if latest.is_some() {
            seen_newest.set(latest);
        }
    };

    NewPosts {
        available,
        on_dismiss: StoredValue::new(Box::new(on_dismiss)),
    }
}
