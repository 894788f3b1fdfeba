use jiff::Timestamp;
use leptos::prelude::*;
use showapp_shared::comment::{ThreadRow, VoteValue};
use showapp_shared::model::{FeedKind, ItemId};
use showapp_shared::time::format_relative;
use web_sys::{MouseEvent, SubmitEvent};

use crate::app::GlobalState;
use crate::app::hook::use_comment_reply::{CommentReply, use_comment_reply};
use crate::app::hook::use_comment_tree::{CommentThread, use_comment_tree};
use crate::app::hook::use_comment_vote::use_comment_vote;

const INDENT_REM: usize = 1;

#[component]
pub fn CommentSection(kind: FeedKind, item_id: Memo<Option<ItemId>>) -> impl IntoView {
    let global_state = expect_context::<GlobalState>();
    let thread = use_comment_tree(kind, item_id);
    let on_posted = Callback::new(move |_: ()| thread.on_refresh.with_value(|f| f()));
    let reply = use_comment_reply(kind, item_id, None, on_posted);

    view! {
        <section class="flex flex-col gap-2">
            <h2 class="font-bold text-[1.2rem]">{move || format!("Comments ({})", thread.count())}</h2>
            <Show
                when=move || global_state.is_logged_in().unwrap_or_default()
                fallback=|| view! { <p class="text-base04">"Log in to comment."</p> }
            >
                <ReplyForm reply placeholder="Add a comment" />
            </Show>
            <p class=move || format!("text-base04 {}", if thread.loading.get() { "" } else { "hidden" })>"loading..."</p>
            <div class="flex flex-col gap-1">
                <For
                    each=move || thread.rows.get()
                    key=|row| row.comment.id
                    children=move |row| view! { <CommentRow kind item_id row thread /> }
                />
            </div>
        </section>
    }
}

#[component]
fn ReplyForm(reply: CommentReply, placeholder: &'static str) -> impl IntoView {
    let on_submit = move |e: SubmitEvent| reply.on_submit.with_value(|f| f(e));
    let submit_text = move || {
        if reply.api.is_pending_tracked() {
            "Posting..."
        } else {
            "Post"
        }
    };

    view! {
        <form class="flex flex-col gap-1" on:submit=on_submit>
            <textarea
                class="border border-base03 bg-base00 p-1"
                placeholder=placeholder
                prop:value=move || reply.draft.get()
                on:input=move |e| reply.draft.set(event_target_value(&e))
            />
            <p class="text-base08 whitespace-pre-line">{move || reply.err.get()}</p>
            <input type="submit" value=submit_text class="self-end border border-base05 px-2 cursor-pointer"/>
        </form>
    }
}

#[component]
fn CommentRow(
    kind: FeedKind,
    item_id: Memo<Option<ItemId>>,
    row: ThreadRow,
    thread: CommentThread,
) -> impl IntoView {
    let global_state = expect_context::<GlobalState>();
    let id = row.comment.id;
    let vote = use_comment_vote(thread, id);
    let on_posted = Callback::new(move |_: ()| thread.on_refresh.with_value(|f| f()));
    let reply = use_comment_reply(kind, item_id, Some(id), on_posted);

    let author = row.comment.author_name().to_string();
    let created = format_relative(row.comment.created_at, Timestamp::now());
    let content = row.comment.content.clone();
    let layout = Memo::new(move |_| thread.layout(id));
    let collapsed = move || layout.with(|layout| layout.collapsed);
    let padding = move || format!("padding-left: {}rem", layout.with(|layout| layout.indent) * INDENT_REM);

    let vote_class = move |value: VoteValue| {
        if vote.state.with(|state| state.vote == value) {
            "font-bold text-base0D"
        } else {
            "text-base04 hover:text-base05"
        }
    };
    let on_vote = move |value: VoteValue| vote.on_vote.with_value(|f| f(value));
    let on_toggle = move |_: MouseEvent| thread.on_toggle.with_value(|f| f(id));
    let on_reply = move |_: MouseEvent| reply.on_toggle.with_value(|f| f());

    let toggle_class = move || if layout.with(|layout| layout.has_children) { "" } else { "hidden" };
    let toggle_text = move || {
        let layout = layout.get();
        if layout.collapsed {
            format!("[+] {}", layout.descendants)
        } else {
            "[-]".to_string()
        }
    };
    let hidden_text = move || {
        let layout = layout.get();
        layout
            .collapsed
            .then(|| view! { <span>{format!("{} replies hidden", layout.descendants)}</span> })
    };

    view! {
        <div class="flex flex-col gap-1 border-l border-base02 pl-2" style=padding>
            <div class="flex gap-2 text-sm text-base04">
                <button class=toggle_class on:click=on_toggle>{toggle_text}</button>
                <span class="text-base05">{author}</span>
                <span>{created}</span>
                {hidden_text}
            </div>
            <Show when=move || !collapsed()>
                <p class="whitespace-pre-line">{content.clone()}</p>
                <div class="flex gap-2 text-sm items-center">
                    <button class=move || vote_class(VoteValue::Up) on:click=move |_| on_vote(VoteValue::Up)>"▲"</button>
                    <span>{move || vote.state.with(|state| state.score)}</span>
                    <button class=move || vote_class(VoteValue::Down) on:click=move |_| on_vote(VoteValue::Down)>"▼"</button>
                    <button
                        class=move || format!("text-base04 hover:text-base05 {}", if global_state.is_logged_in().unwrap_or_default() { "" } else { "hidden" })
                        on:click=on_reply
                    >
                        "Reply"
                    </button>
                </div>
                <Show when=move || reply.open.get()>
                    <ReplyForm reply placeholder="Write a reply" />
                </Show>
            </Show>
        </div>
    }
}
