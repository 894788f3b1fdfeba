use leptos::prelude::*;
use leptos_meta::Title;
use leptos_router::hooks::use_params_map;
use showapp_api::Api;
use showapp_shared::model::{FeedKind, ItemId, User, UserId};
use tracing::{error, trace};

use crate::api::{ApiWeb, SendWeb};
use crate::app::GlobalState;
use crate::app::components::item_card::ItemCard;
use crate::app::components::nav::Nav;
use crate::app::hook::use_follow::{FollowStage, use_follow};
use crate::app::hook::use_user_items::{ProfileList, UserItems, use_user_items};
use crate::path::PATH_HOME;

#[component]
pub fn Page() -> impl IntoView {
    let global_state = expect_context::<GlobalState>();
    let api = ApiWeb::new();
    let params = use_params_map();
    let user_id = Memo::new(move |_| {
        params.with(|params| params.get("id").and_then(|id| id.parse::<UserId>().ok()))
    });
    let user = RwSignal::new(None::<User>);
    let not_found = RwSignal::new(false);
    let other_user = Memo::new(move |_| {
        let id = user_id.get()?;
        let own = global_state.acc.with(|acc| acc.as_ref().is_some_and(|acc| acc.id == id));
        (!own).then_some(id)
    });
    let follow = use_follow(other_user);
    let created = use_user_items(user_id, ProfileList::Created);
    let liked = use_user_items(user_id, ProfileList::Liked);

    Effect::new(move || {
        let Some(id) = user_id.get() else {
            not_found.set(true);
            return;
        };
        trace!("loading user {id}");
        api.get_user(id).send_web(async move |result| match result {
            Ok(fetched) => {
                let _ = not_found.try_set(false);
                let _ = user.try_set(Some(fetched));
            }
            Err(err) => {
                error!("loading user {id} failed: {err}");
                let _ = not_found.try_set(true);
            }
        });
    });

    let follow_text = move || match follow.stage.get() {
        FollowStage::Loading => "...",
        FollowStage::Following => "Unfollow",
        FollowStage::NotFollowing => "Follow",
    };
    let can_follow = move || {
        global_state.is_logged_in().unwrap_or_default() && other_user.get().is_some()
    };
    let title = move || {
        user.with(|user| {
            user.as_ref()
                .map(|user| format!("@{}", user.username))
                .unwrap_or_else(|| "User profile".to_string())
        })
    };
    let profile = move || {
        user.get().map(|user| {
            let reputation = format!("{} rep", user.reputation_score.unwrap_or_default());
            view! {
                <div class="flex flex-col gap-1">
                    <h1 class="text-[1.6rem] font-bold">{format!("@{}", user.username)}</h1>
                    {user.full_name.map(|name| view! { <p>{name}</p> })}
                    <p class="text-sm text-base04">{reputation}</p>
                    {user.bio.map(|bio| view! { <p class="whitespace-pre-line">{bio}</p> })}
                </div>
            }
        })
    };

    view! {
        <main class="grid grid-rows-[auto_1fr] min-h-screen bg-base00 text-base05">
            <Title text=title />
            <Nav />
            <div class="flex flex-col gap-4 max-w-[60rem] w-full mx-auto py-2 px-2">
                <Show
                    when=move || !not_found.get()
                    fallback=|| view! {
                        <div class="flex flex-col gap-2">
                            <p>"User not found or failed to load."</p>
                            <a href=PATH_HOME class="text-base0D">"Back to home"</a>
                        </div>
                    }
                >
                    {profile}
                    <button
                        class=move || format!("self-start border border-base03 px-2 {}", if can_follow() { "" } else { "hidden" })
                        on:click=move |_| follow.on_follow.with_value(|f| f())
                    >
                        {follow_text}
                    </button>
                    <ProfileItems heading="Apps" items=created />
                    <ProfileItems heading="Liked apps" items=liked />
                </Show>
            </div>
        </main>
    }
}

#[component]
fn ProfileItems(heading: &'static str, items: UserItems) -> impl IntoView {
    let on_like = Callback::new(move |id: ItemId| items.on_like.with_value(|f| f(id)));
    let empty = move || {
        items
            .state
            .with(|state| !state.loading && state.items.is_empty())
    };

    view! {
        <section class="flex flex-col gap-2">
            <h2 class="font-bold text-[1.2rem]">{heading}</h2>
            <p class=move || format!("text-base04 {}", if items.state.with(|state| state.loading) { "" } else { "hidden" })>"loading..."</p>
            <p class=move || format!("text-base04 {}", if empty() { "" } else { "hidden" })>"Nothing here yet."</p>
            <div class="grid grid-cols-[repeat(auto-fill,minmax(16rem,1fr))] gap-2">
                <For
                    each=move || items.state.with(|state| state.items.clone())
                    key=|item| (item.id, item.is_liked, item.likes_count)
                    children=move |item| view! { <ItemCard kind=FeedKind::Apps item on_like /> }
                />
            </div>
        </section>
    }
}
