use leptos::prelude::*;
use showapp_api::Api;
use showapp_shared::comment::{VoteState, VoteValue};
use showapp_shared::model::CommentId;
use tracing::{error, trace};

use crate::api::{ApiWeb, SendWeb};
use crate::app::GlobalState;
use crate::app::hook::use_comment_tree::CommentThread;

#[derive(Clone, Copy)]
pub struct CommentVote {
    pub state: Memo<VoteState>,
    pub on_vote: StoredValue<Box<dyn Fn(VoteValue) + Sync + Send + 'static>>,
}

/// Optimistic vote on a single comment, kept in the thread so it outlives the row.
pub fn use_comment_vote(thread: CommentThread, id: CommentId) -> CommentVote {
    let global_state = expect_context::<GlobalState>();
    let api = ApiWeb::new();
    let state = Memo::new(move |_| {
        thread
            .tree
            .with(|tree| {
                tree.get(id)
                    .map(|node| thread.votes.with(|votes| votes.state(&node.comment)))
            })
            .unwrap_or_default()
    });

    let on_vote = move |requested: VoteValue| {
        if !global_state.is_logged_in_untracked() {
            trace!("ignoring vote on {id}, not logged in");
            return;
        }
        let Some(comment) = thread
            .tree
            .with_untracked(|tree| tree.get(id).map(|node| node.comment.clone()))
        else {
            return;
        };
        let Some(change) = thread
            .votes
            .try_update(|votes| votes.vote(&comment, requested))
        else {
            return;
        };
        api.vote_comment(id, change.requested.vote)
            .send_web(async move |result| {
                if let Err(err) = result {
                    error!("vote on comment {id} failed: {err}");
                    let _ = thread.votes.try_update(|votes| votes.revert(id, &change));
                }
            });
    };

    CommentVote {
        state,
        on_vote: StoredValue::new(Box::new(on_vote)),
    }
}
