use jiff::Timestamp;
use leptos::prelude::*;
use leptos_meta::Title;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_navigate, use_params_map};
use showapp_api::Api;
use showapp_shared::model::{FeedItem, FeedKind};
use showapp_shared::time::format_relative;
use tracing::{error, info, trace};

use crate::api::{ApiWeb, SendWeb};
use crate::app::GlobalState;
use crate::app::components::comment_section::CommentSection;
use crate::app::components::modal::{ClaimOwnershipModal, ConfirmDelete, ReportDeadModal};
use crate::app::components::nav::Nav;
use crate::app::hook::use_follow::{FollowStage, use_follow};
use crate::app::hook::use_item_like::use_item_like;
use crate::path::{link_feed_root, link_item_edit, link_user};

#[component]
pub fn Page(kind: FeedKind) -> impl IntoView {
    let global_state = expect_context::<GlobalState>();
    let api = ApiWeb::new();
    let api_delete = ApiWeb::new();
    let params = use_params_map();
    let navigate = StoredValue::new_local(
        Box::new(use_navigate()) as Box<dyn Fn(&str, NavigateOptions) + 'static>
    );
    let key = Memo::new(move |_| params.with(|params| params.get("key")));
    let item = RwSignal::new(None::<FeedItem>);
    let not_found = RwSignal::new(false);
    let item_id = Memo::new(move |_| item.with(|item| item.as_ref().map(|item| item.id)));
    let creator_id = Memo::new(move |_| {
        item.with(|item| {
            item.as_ref()
                .filter(|item| !item.is_owner)
                .map(|item| item.creator_id)
        })
    });
    let like = use_item_like(kind, item_id);
    let follow = use_follow(creator_id);
    let claim_open = RwSignal::new(false);
    let report_open = RwSignal::new(false);
    let delete_open = RwSignal::new(false);

    Effect::new(move || {
        let Some(key) = key.get() else {
            return;
        };
        trace!("loading {kind} \"{key}\"");
        api.get_item(kind, &key).send_web(async move |result| match result {
            Ok(fetched) => {
                let _ = like.state.try_set(fetched.like_state());
                let _ = not_found.try_set(false);
                let _ = item.try_set(Some(fetched));
            }
            Err(err) if err.is_not_found() => {
                info!("{kind} \"{key}\" not found");
                let _ = not_found.try_set(true);
            }
            Err(err) => {
                error!("loading {kind} \"{key}\" failed: {err}");
                let _ = not_found.try_set(true);
            }
        });
    });

    let on_delete = Callback::new(move |_: ()| {
        let Some(id) = item_id.get_untracked() else {
            return;
        };
        api_delete
            .delete_item(kind, id)
            .send_web_busy(api_delete.busy, async move |result| match result {
                Ok(()) => {
                    info!("{kind} {id} deleted");
                    global_state.feeds.clear(kind);
                    navigate.with_value(|navigate| {
                        navigate(link_feed_root(kind), NavigateOptions::default())
                    });
                }
                Err(err) => {
                    error!("deleting {kind} {id} failed: {err}");
                    let _ = delete_open.try_set(false);
                }
            });
    });

    let details = move || {
        item.get().map(|item| {
            view! { <ItemDetails kind item /> }
        })
    };
    let is_owner = move || item.with(|item| item.as_ref().is_some_and(|item| item.is_owner));
    let logged_in = move || global_state.is_logged_in().unwrap_or_default();
    let can_claim = move || kind.is_apps() && logged_in() && !is_owner();
    let can_report = move || {
        kind.is_apps()
            && logged_in()
            && item.with(|item| item.as_ref().is_some_and(|item| item.app_url.is_some()))
    };
    let like_text = move || {
        let state = like.state.get();
        format!("{} {}", if state.liked { "♥" } else { "♡" }, state.count)
    };
    let follow_text = move || match follow.stage.get() {
        FollowStage::Loading => "...",
        FollowStage::Following => "Unfollow",
        FollowStage::NotFollowing => "Follow",
    };
    let hidden = |visible: bool| if visible { "" } else { "hidden" };
    let edit_link = move || {
        item.with(|item| {
            item.as_ref()
                .map(|item| link_item_edit(kind, item.route_key()))
                .unwrap_or_default()
        })
    };

    view! {
        <main class="grid grid-rows-[auto_1fr] min-h-screen bg-base00 text-base05">
            <Title text=move || item.with(|item| item.as_ref().map(|item| item.display_title().to_string()).unwrap_or_default()) />
            <Nav />
            <div class="flex flex-col gap-4 max-w-[50rem] w-full mx-auto py-2 px-2">
                <a href=link_feed_root(kind) class="text-base04">{format!("< back to {kind}")}</a>
                <Show
                    when=move || !not_found.get()
                    fallback=move || view! { <p>{format!("This {} does not exist.", kind.singular())}</p> }
                >
                    {details}
                    <div class=move || format!("flex gap-2 flex-wrap {}", hidden(item_id.get().is_some()))>
                        <button class="border border-base03 px-2" on:click=move |_| like.on_like.with_value(|f| f())>{like_text}</button>
                        <button
                            class=move || format!("border border-base03 px-2 {}", hidden(logged_in() && creator_id.get().is_some()))
                            on:click=move |_| follow.on_follow.with_value(|f| f())
                        >
                            {follow_text}
                        </button>
                        <button class=move || format!("border border-base03 px-2 {}", hidden(can_claim())) on:click=move |_| claim_open.set(true)>"Claim ownership"</button>
                        <button class=move || format!("border border-base03 px-2 {}", hidden(can_report())) on:click=move |_| report_open.set(true)>"Report dead link"</button>
                        <a class=move || format!("border border-base03 px-2 {}", hidden(is_owner())) href=edit_link>"Edit"</a>
                        <button class=move || format!("border border-base08 text-base08 px-2 {}", hidden(is_owner())) on:click=move |_| delete_open.set(true)>"Delete"</button>
                    </div>
                    {move || item_id.get().map(|id| view! {
                        <ClaimOwnershipModal kind item_id=id open=claim_open />
                        <ReportDeadModal item_id=id open=report_open />
                    })}
                    <ConfirmDelete open=delete_open busy=Signal::derive(move || api_delete.is_pending_tracked()) on_confirm=on_delete />
                    <CommentSection kind item_id />
                </Show>
            </div>
        </main>
    }
}

#[component]
fn ItemDetails(kind: FeedKind, item: FeedItem) -> impl IntoView {
    let title = item.display_title().to_string();
    let creator = item.creator_name().to_string();
    let creator_link = link_user(item.creator_id);
    let created = format_relative(item.created_at, Timestamp::now());
    let status = item.status.to_string();
    let agent = item.is_agent_submitted.then_some("submitted by an agent");
    let media = item
        .media
        .iter()
        .map(|media| view! { <img src=media.media_url.clone() class="w-full object-contain max-h-[30rem]" /> })
        .collect_view();
    let labels = item
        .tags
        .iter()
        .map(|tag| tag.name.clone())
        .chain(item.tools.iter().map(|tool| format!("built with {}", tool.name)))
        .map(|label| view! { <span class="text-xs border border-base03 px-1">{label}</span> })
        .collect_view();
    let links = item
        .app_url
        .clone()
        .map(|url| view! { <a href=url target="_blank" class="text-base0D underline">{format!("Open {}", kind.singular())}</a> });
    let youtube = item
        .youtube_url
        .clone()
        .map(|url| view! { <a href=url target="_blank" class="text-base0D underline">"Watch demo"</a> });

    view! {
        <article class="flex flex-col gap-2">
            <h1 class="text-[1.6rem] font-bold">{title}</h1>
            <div class="flex gap-2 text-sm text-base04">
                <a href=creator_link class="text-base05 hover:underline">{creator}</a>
                <span>{created}</span>
                <span>{status}</span>
                <span>{agent}</span>
            </div>
            <div class="flex gap-1 flex-wrap">{labels}</div>
            {media}
            <div class="flex gap-4">{links}{youtube}</div>
            {item.prompt_text.map(|text| view! { <section><h2 class="font-bold">"Prompt"</h2><p class="whitespace-pre-line">{text}</p></section> })}
            {item.prd_text.map(|text| view! { <section><h2 class="font-bold">"Requirements"</h2><p class="whitespace-pre-line">{text}</p></section> })}
        </article>
    }
}
