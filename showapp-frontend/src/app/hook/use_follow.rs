use leptos::prelude::*;
use showapp_api::Api;
use showapp_shared::model::UserId;
use tracing::{error, trace};

use crate::api::{ApiWeb, SendWeb};
use crate::app::GlobalState;

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
    strum::EnumIs,
)]
#[strum(serialize_all = "lowercase")]
pub enum FollowStage {
    #[default]
    Loading,
    Following,
    NotFollowing,
}

#[derive(Clone, Copy)]
pub struct Follow {
    pub stage: RwSignal<FollowStage>,
    pub on_follow: StoredValue<Box<dyn Fn() + Sync + Send + 'static>>,
}

pub fn use_follow(user_id: Memo<Option<UserId>>) -> Follow {
    let global_state = expect_context::<GlobalState>();
    let api = ApiWeb::new();
    let stage = RwSignal::new(FollowStage::Loading);

    Effect::new(move || {
        let Some(user_id) = user_id.get() else {
            return;
        };
        if global_state.is_logged_in() != Some(true) {
            stage.set(FollowStage::NotFollowing);
            return;
        }
        api.get_follow_status(user_id)
            .send_web(async move |result| {
                let next = match result {
                    Ok(status) if status.is_following => FollowStage::Following,
                    Ok(_) => FollowStage::NotFollowing,
                    Err(err) => {
                        error!("follow status for {user_id} failed: {err}");
                        FollowStage::NotFollowing
                    }
                };
                let _ = stage.try_set(next);
            });
    });

    let on_follow = move || {
        let Some(user_id) = user_id.get_untracked() else {
            return;
        };
        if !global_state.is_logged_in_untracked() {
            trace!("ignoring follow of {user_id}, not logged in");
            return;
        }
        let previous = stage.get_untracked();
        let (req, next) = match previous {
            FollowStage::Loading => return,
            FollowStage::Following => (api.unfollow_user(user_id), FollowStage::NotFollowing),
            FollowStage::NotFollowing => (api.follow_user(user_id), FollowStage::Following),
        };
        stage.set(next);
        req.send_web(async move |result| {
            if let Err(err) = result {
                error!("follow toggle for {user_id} failed: {err}");
                let _ = stage.try_set(previous);
            }
        });
    };

    Follow {
        stage,
        on_follow: StoredValue::new(Box::new(on_follow)),
    }
}
