use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;
use showapp_api::Api;
use showapp_shared::feed::{FeedQuery, FeedRequest, FeedState};
use showapp_shared::model::{FeedKind, ItemId, UserId};
use tracing::{error, trace};

use crate::api::{ApiWeb, SendWeb};
use crate::app::GlobalState;
use crate::path::PATH_LOGIN;

pub const PROFILE_LIMIT: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ProfileList {
    Created,
    Liked,
}

impl ProfileList {
    pub fn scope(self, request: FeedRequest, user_id: UserId) -> FeedRequest {
        match self {
            ProfileList::Created => request.created_by(user_id),
            ProfileList::Liked => request.liked_by(user_id),
        }
    }
}

#[derive(Clone, Copy)]
pub struct UserItems {
    pub state: RwSignal<FeedState>,
    pub on_like: StoredValue<Box<dyn Fn(ItemId) + Sync + Send + 'static>>,
}

/// First page of apps a user built or liked.
pub fn use_user_items(user_id: Memo<Option<UserId>>, list: ProfileList) -> UserItems {
    let global_state = expect_context::<GlobalState>();
    let api = ApiWeb::new();
    let kind = FeedKind::Apps;
    let state = RwSignal::new(FeedState::new(FeedQuery::default()).with_limit(PROFILE_LIMIT));
    let navigate = StoredValue::new_local(
        Box::new(use_navigate()) as Box<dyn Fn(&str, NavigateOptions) + 'static>
    );

    Effect::new(move || {
        let Some(user_id) = user_id.get() else {
            return;
        };
        let ticket = state
            .try_update(|state| {
                *state = FeedState::new(FeedQuery::default()).with_limit(PROFILE_LIMIT);
                state.mount(None)
            })
            .flatten();
        let Some(ticket) = ticket else {
            return;
        };
        let request = state.with_untracked(|state| list.scope(state.request(ticket), user_id));
        trace!("fetching {list} apps of user {user_id}");
        api.get_items(kind, &request).send_web(async move |result| {
            let _ = state.try_update(|state| state.apply(ticket, result.map(|page| page.items)));
        });
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
        global_state.feeds.clear(kind);
    };

    UserItems {
        state,
        on_like: StoredValue::new(Box::new(on_like)),
    }
}

#[cfg(test)]
mod use_user_items_tests {
    use crate::app::hook::use_user_items::{PROFILE_LIMIT, ProfileList};
    use pretty_assertions::assert_eq;
    use showapp_shared::feed::{FeedQuery, FeedRequest};
    use showapp_shared::model::UserId;
    use test_log::test;

    #[test]
    fn test_profile_list_scope() {
        let request = FeedRequest::new(FeedQuery::default(), 1).with_limit(PROFILE_LIMIT);
        let created = ProfileList::Created.scope(request.clone(), UserId(3));
        assert_eq!(created.creator_id, Some(UserId(3)));
        assert_eq!(created.liked_by_user_id, None);
        let liked = ProfileList::Liked.scope(request, UserId(3));
        assert_eq!(liked.liked_by_user_id, Some(UserId(3)));
        assert_eq!(liked.creator_id, None);
        assert_eq!(liked.limit, 12);
        assert_eq!(ProfileList::Liked.to_string(), "liked");
    }
}
