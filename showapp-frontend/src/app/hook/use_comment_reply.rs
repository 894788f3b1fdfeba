use leptos::prelude::*;
use showapp_api::Api;
use showapp_shared::item::process_comment;
use showapp_shared::model::{CommentCreate, CommentId, FeedKind, ItemId};
use tracing::{error, trace};
use web_sys::SubmitEvent;

use crate::api::{ApiWeb, SendWeb};

#[derive(Clone, Copy)]
pub struct CommentReply {
    pub draft: RwSignal<String>,
    pub open: RwSignal<bool>,
    pub err: RwSignal<String>,
    pub api: ApiWeb,
    pub on_toggle: StoredValue<Box<dyn Fn() + Sync + Send + 'static>>,
    pub on_submit: StoredValue<Box<dyn Fn(SubmitEvent) + Sync + Send + 'static>>,
}

/// Reply form for `parent`, or the top level comment form when `parent` is `None`.
pub fn use_comment_reply(
    kind: FeedKind,
    item_id: Memo<Option<ItemId>>,
    parent: Option<CommentId>,
    on_posted: Callback<()>,
) -> CommentReply {
    let api = ApiWeb::new();
    let draft = RwSignal::new(String::new());
    let open = RwSignal::new(parent.is_none());
    let err = RwSignal::new(String::new());

    let on_toggle = move || {
        open.update(|open| *open = !*open);
        err.set(String::new());
    };

    let on_submit = move |e: SubmitEvent| {
        e.prevent_default();
        let Some(id) = item_id.get_untracked() else {
            return;
        };
        let content = match draft.with_untracked(|draft| process_comment(draft)) {
            Ok(content) => content,
            Err(msg) => {
                trace!("comment rejected before sending: {msg}");
                err.set(msg);
                return;
            }
        };
        err.set(String::new());
        let comment = CommentCreate {
            content,
            parent_id: parent,
        };
        api.add_comment(kind, id, &comment)
            .send_web_busy(api.busy, async move |result| match result {
                Ok(comment) => {
                    trace!("comment {} posted", comment.id);
                    let _ = draft.try_set(String::new());
                    if parent.is_some() {
                        let _ = open.try_set(false);
                    }
                    on_posted.run(());
                }
                Err(e) => {
                    error!("posting comment on {kind} {id} failed: {e}");
                    let _ = err.try_set(e.user_message("Failed to post comment"));
                }
            });
    };

    CommentReply {
        draft,
        open,
        err,
        api,
        on_toggle: StoredValue::new(Box::new(on_toggle)),
        on_submit: StoredValue::new(Box::new(on_submit)),
    }
}
