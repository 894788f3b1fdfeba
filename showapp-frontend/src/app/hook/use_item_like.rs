use leptos::prelude::*;
use showapp_api::Api;
use showapp_shared::model::{FeedKind, ItemId, LikeState};
use showapp_shared::optimistic::Optimistic;
use tracing::{error, trace};

use crate::api::{ApiWeb, SendWeb};
use crate::app::GlobalState;

#[derive(Clone, Copy)]
pub struct ItemLike {
    pub state: RwSignal<LikeState>,
    pub on_like: StoredValue<Box<dyn Fn() + Sync + Send + 'static>>,
}

pub fn use_item_like(kind: FeedKind, item_id: Memo<Option<ItemId>>) -> ItemLike {
    let global_state = expect_context::<GlobalState>();
    let api = ApiWeb::new();
    let state = RwSignal::new(LikeState::default());

    let on_like = move || {
        let Some(id) = item_id.get_untracked() else {
            return;
        };
        if !global_state.is_logged_in_untracked() {
            trace!("ignoring like on {kind} {id}, not logged in");
            return;
        }
        let previous = state.get_untracked();
        let change = Optimistic::new(previous, previous.toggled());
        state.set(change.requested);
        // unrelated cached pages still hold the old count
        global_state.feeds.clear(kind);
        let req = if change.requested.liked {
            api.add_item_like(kind, id)
        } else {
            api.delete_item_like(kind, id)
        };
        req.send_web(async move |result| {
            if let Err(err) = result {
                error!("like for {kind} {id} failed: {err}");
                let _ = state.try_set(change.previous);
            }
        });
    };

    ItemLike {
        state,
        on_like: StoredValue::new(Box::new(on_like)),
    }
}
