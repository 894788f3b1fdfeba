use std::collections::{HashMap, HashSet};

use leptos::prelude::*;
use showapp_api::Api;
use showapp_shared::comment::{CommentTree, RowLayout, ThreadRow, VoteOverlay};
use showapp_shared::model::{Comment, CommentId, FeedKind, ItemId};
use tracing::{error, trace};

use crate::api::{ApiWeb, SendWeb};

#[derive(Clone, Copy)]
pub struct CommentThread {
    pub comments: RwSignal<Vec<Comment>>,
    pub tree: Memo<CommentTree>,
    pub rows: Memo<Vec<ThreadRow>>,
    pub layouts: Memo<HashMap<CommentId, RowLayout>>,
    pub votes: RwSignal<VoteOverlay>,
    pub collapsed: RwSignal<HashSet<CommentId>>,
    pub loading: RwSignal<bool>,
    pub on_toggle: StoredValue<Box<dyn Fn(CommentId) + Sync + Send + 'static>>,
    pub on_refresh: StoredValue<Box<dyn Fn() + Sync + Send + 'static>>,
}

impl CommentThread {
    pub fn count(&self) -> usize {
        self.tree.with(|tree| tree.len())
    }

    pub fn layout(&self, id: CommentId) -> RowLayout {
        self.layouts
            .with(|layouts| layouts.get(&id).copied())
            .unwrap_or_default()
    }
}

pub fn use_comment_tree(kind: FeedKind, item_id: Memo<Option<ItemId>>) -> CommentThread {
    let api = ApiWeb::new();
    let comments = RwSignal::new(Vec::<Comment>::new());
    let collapsed = RwSignal::new(HashSet::<CommentId>::new());
    let loading = RwSignal::new(false);
    let tree = Memo::new(move |_| comments.with(|comments| CommentTree::build(comments)));
    let rows = Memo::new(move |_| {
        let tree = tree.read();
        collapsed.with(|collapsed| tree.rows(collapsed))
    });
    let layouts = Memo::new(move |_| {
        rows.with(|rows| {
            rows.iter()
                .map(|row| (row.comment.id, row.layout()))
                .collect::<HashMap<CommentId, RowLayout>>()
        })
    });
    let votes = RwSignal::new(VoteOverlay::default());

    let fetch = move |id: ItemId| {
        loading.set(true);
        api.get_comments(kind, id)
            .send_web(async move |result| {
                match result {
                    Ok(fetched) => {
                        trace!("fetched {} comments for {kind} {id}", fetched.len());
                        let _ = votes.try_update(|votes| votes.clear());
                        let _ = comments.try_set(fetched);
                    }
                    Err(err) => {
                        error!("fetching comments for {kind} {id} failed: {err}");
                    }
                }
                let _ = loading.try_set(false);
            });
    };

    Effect::new(move || {
        let Some(id) = item_id.get() else {
            return;
        };
        fetch(id);
    });

    let on_toggle = move |id: CommentId| {
        collapsed.update(|collapsed| {
            if !collapsed.remove(&id) {
                collapsed.insert(id);
            }
        });
    };

    let on_refresh = move || {
        let Some(id) = item_id.get_untracked() else {
            return;
        };
        fetch(id);
    };

    CommentThread {
        comments,
        tree,
        rows,
        layouts,
        votes,
        collapsed,
        loading,
        on_toggle: StoredValue::new(Box::new(on_toggle)),
        on_refresh: StoredValue::new(Box::new(on_refresh)),
    }
}
