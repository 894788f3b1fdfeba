pub mod comment_section;

pub mod item_form {
    use leptos::prelude::*;
    use showapp_shared::model::{FeedKind, ItemStatus};
    use strum::IntoEnumIterator;
    use web_sys::SubmitEvent;

    use crate::app::GlobalState;
    use crate::app::hook::use_item_submit::{ItemSubmit, toggle_id};

    fn chip_class(active: bool) -> &'static str {
        if active {
            "border border-base05 bg-base05 text-base01 px-2 text-sm"
        } else {
            "border border-base03 px-2 text-sm"
        }
    }

    #[component]
    pub fn ItemForm(form: ItemSubmit, heading: &'static str) -> impl IntoView {
        let global_state = expect_context::<GlobalState>();
        global_state.catalog.ensure_loaded();
        let on_submit = move |e: SubmitEvent| form.on_submit.with_value(|f| f(e));

        let kinds = FeedKind::iter()
            .map(|kind| {
                view! {
                    <option value=kind.to_string() selected=move || form.kind.get() == kind>
                        {kind.singular()}
                    </option>
                }
            })
            .collect_view();
        let statuses = ItemStatus::iter()
            .map(|status| {
                view! {
                    <option value=status.to_string() selected=move || form.status.get() == status>
                        {status.to_string()}
                    </option>
                }
            })
            .collect_view();
        let tags = move || {
            global_state
                .catalog
                .tags
                .get()
                .into_iter()
                .map(|tag| {
                    let id = tag.id;
                    view! {
                        <button
                            type="button"
                            class=move || chip_class(form.tags.with(|tags| tags.contains(&id)))
                            on:click=move |_| form.tags.update(|tags| toggle_id(tags, id))
                        >
                            {tag.name}
                        </button>
                    }
                })
                .collect_view()
        };
        let tools = move || {
            global_state
                .catalog
                .tools
                .get()
                .into_iter()
                .map(|tool| {
                    let id = tool.id;
                    view! {
                        <button
                            type="button"
                            class=move || chip_class(form.tools.with(|tools| tools.contains(&id)))
                            on:click=move |_| form.tools.update(|tools| toggle_id(tools, id))
                        >
                            {tool.name}
                        </button>
                    }
                })
                .collect_view()
        };
        let existing_media = move || {
            form.media
                .get()
                .into_iter()
                .map(|media| {
                    let id = media.id;
                    view! {
                        <div class="flex flex-col gap-1 w-[8rem]">
                            <img src=media.media_url class="w-full aspect-video object-cover" />
                            <button
                                type="button"
                                class="border border-base08 text-base08 px-1 text-sm"
                                disabled=move || form.api_media.is_pending_tracked()
                                on:click=move |_| form.on_remove_media.with_value(|f| f(id))
                            >
                                "Remove"
                            </button>
                        </div>
                    }
                })
                .collect_view()
        };
        let submit_text = move || match (form.api.is_pending_tracked(), form.is_editing()) {
            (true, _) => "Saving...",
            (false, true) => "Save changes",
            (false, false) => "Submit",
        };

        view! {
            <form class="flex flex-col gap-2 max-w-[40rem] w-full mx-auto py-4 px-2" on:submit=on_submit>
                <h1 class="text-[1.5rem] font-bold">{heading}</h1>
                <div class=move || format!("flex flex-col gap-2 {}", if form.is_editing() { "hidden" } else { "" })>
                    <label for="kind">"Kind"</label>
                    <select
                        id="kind"
                        class="border border-base03 bg-base01 px-2 py-1"
                        on:change=move |e| {
                            if let Ok(kind) = event_target_value(&e).parse::<FeedKind>() {
                                form.kind.set(kind);
                            }
                        }
                    >
                        {kinds}
                    </select>
                </div>
                <label for="title">"Title"</label>
                <input
                    id="title"
                    type="text"
                    class="border border-base03 bg-base01 px-2 py-1"
                    prop:value=move || form.title.get()
                    on:input=move |e| form.title.set(event_target_value(&e))
                />
                <p class="text-base08 whitespace-pre-line">{move || form.err_title.get()}</p>
                <label for="prompt">"Prompt"</label>
                <textarea
                    id="prompt"
                    class="border border-base03 bg-base01 px-2 py-1 min-h-[6rem]"
                    prop:value=move || form.prompt.get()
                    on:input=move |e| form.prompt.set(event_target_value(&e))
                />
                <label for="prd">"Requirements"</label>
                <textarea
                    id="prd"
                    class="border border-base03 bg-base01 px-2 py-1 min-h-[6rem]"
                    prop:value=move || form.prd.get()
                    on:input=move |e| form.prd.set(event_target_value(&e))
                />
                <label for="status">"Status"</label>
                <select
                    id="status"
                    class="border border-base03 bg-base01 px-2 py-1"
                    on:change=move |e| {
                        if let Ok(status) = event_target_value(&e).parse::<ItemStatus>() {
                            form.status.set(status);
                        }
                    }
                >
                    {statuses}
                </select>
                <label for="app_url">"App URL"</label>
                <input
                    id="app_url"
                    type="url"
                    class="border border-base03 bg-base01 px-2 py-1"
                    prop:value=move || form.app_url.get()
                    on:input=move |e| form.app_url.set(event_target_value(&e))
                />
                <label for="youtube_url">"Demo video URL"</label>
                <input
                    id="youtube_url"
                    type="url"
                    class="border border-base03 bg-base01 px-2 py-1"
                    prop:value=move || form.youtube_url.get()
                    on:input=move |e| form.youtube_url.set(event_target_value(&e))
                />
                <p class="text-base08">{move || form.err_url.get()}</p>
                <p>"Tags"</p>
                <div class="flex gap-1 flex-wrap">{tags}</div>
                <p>"Tools"</p>
                <div class="flex gap-1 flex-wrap">{tools}</div>
                <p>"Screenshots"</p>
                <div class="flex gap-2 flex-wrap">{existing_media}</div>
                <input node_ref=form.files type="file" accept="image/*" multiple=true class="text-sm" />
                <p class="text-base08 whitespace-pre-line">{move || form.err_general.get()}</p>
                <input type="submit" value=submit_text class="border border-base05 px-2 py-1 cursor-pointer"/>
            </form>
        }
    }
}

pub mod nav {
    use leptos::prelude::*;
    use web_sys::SubmitEvent;

    use crate::app::GlobalState;
    use crate::app::components::modal::FeedbackModal;
    use crate::path::{PATH_ADMIN, PATH_DREAMS, PATH_HOME, PATH_LOGIN, PATH_SUBMIT, link_user};

    #[component]
    pub fn Nav() -> impl IntoView {
        let global_state = expect_context::<GlobalState>();
        let feedback_open = RwSignal::new(false);
        let acc_link = move || {
            global_state
                .acc
                .with(|acc| acc.as_ref().map(|acc| link_user(acc.id)))
                .unwrap_or_default()
        };
        let acc_username = move || global_state.get_username_tracked().unwrap_or_default();
        let on_logout = move |e: SubmitEvent| {
            e.prevent_default();
            global_state.logout();
        };

        view! {
            <nav class="text-gray-200 flex gap-2 px-2 h-[3rem] items-center justify-between">
                <div class="flex gap-4 items-center">
                    <a href=PATH_HOME class="font-black text-[1.3rem]">
                        "Show Your App"
                    </a>
                    <a href=PATH_HOME>"Apps"</a>
                    <a href=PATH_DREAMS>"Dreams"</a>
                </div>
                <div class=move||format!("{}", if global_state.acc_pending() { "" } else { "hidden" })>
                    <p>"loading..."</p>
                </div>
                <div class=move||format!("{}", if global_state.is_logged_in().unwrap_or_default() || global_state.acc_pending() { "hidden" } else { "" })>
                    <a href=PATH_LOGIN>"Login"</a>
                </div>
                <div class=move||format!("flex gap-2 items-center {}", if global_state.is_logged_in().unwrap_or_default() { "" } else { "hidden" })>
                    <a href=PATH_SUBMIT>"Submit"</a>
                    <a href=PATH_ADMIN class=move||format!("{}", if global_state.is_admin().unwrap_or_default() { "" } else { "hidden" })>"Admin"</a>
                    <button class="cursor-pointer" on:click=move |_| feedback_open.set(true)>"Feedback"</button>
                    <a href=acc_link>{acc_username}</a>
                    <form method="POST" action="" on:submit=on_logout >
                        <input type="submit" value="Logout" class="transition-all duration-300 ease-in hover:font-bold cursor-pointer"/>
                    </form>
                </div>
                <FeedbackModal open=feedback_open />
            </nav>
        }
    }
}

pub mod item_card {
    use jiff::Timestamp;
    use leptos::prelude::*;
    use showapp_shared::model::{FeedItem, FeedKind, ItemId};
    use showapp_shared::time::format_relative;

    use crate::path::link_item;

    #[component]
    pub fn ItemCard(kind: FeedKind, item: FeedItem, on_like: Callback<ItemId>) -> impl IntoView {
        let id = item.id;
        let link = link_item(kind, item.route_key());
        let title = item.display_title().to_string();
        let creator = item.creator_name().to_string();
        let created = format_relative(item.created_at, Timestamp::now());
        let thumbnail = item.media.first().map(|media| media.media_url.clone());
        let like_text = format!(
            "{} {}",
            if item.is_liked { "♥" } else { "♡" },
            item.likes_count
        );
        let tags = item
            .tags
            .iter()
            .map(|tag| view! { <span class="text-xs border border-base03 px-1">{tag.name.clone()}</span> })
            .collect_view();
        let status = item.status.to_string();
        let comments_count = item.comments_count;

        view! {
            <div class="flex flex-col gap-2 border border-base02 bg-base01 p-2">
                <a href=link.clone() class="flex flex-col gap-1">
                    {thumbnail.map(|src| view! { <img src=src class="w-full aspect-video object-cover" /> })}
                    <h3 class="font-bold text-[1.1rem]">{title}</h3>
                </a>
                <div class="flex gap-2 text-sm text-base04">
                    <span>{creator}</span>
                    <span>{created}</span>
                    <span>{status}</span>
                </div>
                <div class="flex gap-1 flex-wrap">{tags}</div>
                <div class="flex gap-4 text-sm">
                    <button on:click=move |_| on_like.run(id) class="hover:font-bold">{like_text}</button>
                    <a href=link>{format!("{comments_count} comments")}</a>
                </div>
            </div>
        }
    }
}

pub mod filter_bar {
    use leptos::prelude::*;
    use showapp_shared::feed::FeedFilter;
    use showapp_shared::model::{ItemStatus, SortBy};
    use strum::IntoEnumIterator;

    use crate::app::GlobalState;
    use crate::app::hook::use_feed::Feed;

    fn chip_class(active: bool) -> &'static str {
        if active {
            "border border-base05 bg-base05 text-base01 px-2 text-sm"
        } else {
            "border border-base03 px-2 text-sm hover:border-base05"
        }
    }

    #[component]
    pub fn FilterBar(feed: Feed) -> impl IntoView {
        let global_state = expect_context::<GlobalState>();
        global_state.catalog.ensure_loaded();
        let query = feed.query;

        let toggle = move |filter: FeedFilter| feed.on_filter.with_value(|f| f(filter));
        let chip = move |filter: FeedFilter, name: String| {
            let active = move || query.with(|query| query.has_filter(&filter));
            view! {
                <button class=move || chip_class(active()) on:click=move |_| toggle(filter)>
                    {name}
                </button>
            }
        };

        let tags = move || {
            global_state
                .catalog
                .tags
                .get()
                .into_iter()
                .map(|tag| chip(FeedFilter::Tag(tag.id), tag.name))
                .collect_view()
        };
        let tools = move || {
            global_state
                .catalog
                .tools
                .get()
                .into_iter()
                .map(|tool| chip(FeedFilter::Tool(tool.id), tool.name))
                .collect_view()
        };
        let statuses = ItemStatus::iter()
            .map(|status| chip(FeedFilter::Status(status), status.to_string()))
            .collect_view();
        let sorts = SortBy::iter()
            .map(|sort_by| {
                view! {
                    <option value=sort_by.to_string() selected=move || query.with(|q| q.sort_by == sort_by)>
                        {sort_by.label()}
                    </option>
                }
            })
            .collect_view();

        let on_sort = move |e: leptos::ev::Event| {
            let value = event_target_value(&e);
            if let Ok(sort_by) = value.parse::<SortBy>() {
                feed.on_sort.with_value(|f| f(sort_by));
            }
        };
        let on_search = move |e: leptos::ev::Event| {
            let value = event_target_value(&e);
            feed.on_search.with_value(|f| f(value));
        };
        let on_clear = move |_: leptos::ev::MouseEvent| feed.on_clear.with_value(|f| f());

        view! {
            <div class="flex flex-col gap-2 px-2">
                <div class="flex gap-2">
                    <input
                        type="search"
                        placeholder="Search"
                        class="border border-base03 bg-base01 px-2 py-1 flex-grow"
                        prop:value=move || feed.search.get()
                        on:input=on_search
                    />
                    <select class="border border-base03 bg-base01 px-2" on:change=on_sort>
                        {sorts}
                    </select>
                    <button class="border border-base03 px-2" on:click=on_clear>"Clear"</button>
                </div>
                <div class="flex gap-1 flex-wrap">{statuses}</div>
                <div class="flex gap-1 flex-wrap">{tags}</div>
                <div class="flex gap-1 flex-wrap">{tools}</div>
            </div>
        }
    }
}

pub mod new_posts_banner {
    use leptos::prelude::*;

    #[component]
    pub fn NewPostsBanner(available: Memo<bool>, on_refresh: Callback<()>) -> impl IntoView {
        view! {
            <button
                class=move || format!("sticky top-2 mx-auto border border-base0D bg-base0D text-base01 px-4 py-1 {}", if available.get() { "" } else { "hidden" })
                on:click=move |_| on_refresh.run(())
            >
                "New posts available, refresh"
            </button>
        }
    }
}

pub mod modal {
    use leptos::prelude::*;
    use showapp_api::Api;
    use showapp_shared::item::{process_feedback, process_reason};
    use showapp_shared::model::{
        ClaimCreate, DeadReportCreate, FeedKind, Feedback, FeedbackKind, ItemId,
    };
    use strum::IntoEnumIterator;
    use tracing::{error, info};
    use web_sys::SubmitEvent;

    use crate::api::{ApiWeb, SendWeb};

    #[component]
    pub fn Modal(open: RwSignal<bool>, title: &'static str, children: ChildrenFn) -> impl IntoView {
        view! {
            <Show when=move || open.get()>
                <div class="fixed inset-0 bg-black/60 flex items-center justify-center" on:click=move |_| open.set(false)>
                    <div class="bg-base01 border border-base03 p-4 flex flex-col gap-2 min-w-[20rem]" on:click=|e| e.stop_propagation()>
                        <h2 class="font-bold text-[1.2rem]">{title}</h2>
                        {children()}
                    </div>
                </div>
            </Show>
        }
    }

    #[component]
    pub fn ClaimOwnershipModal(kind: FeedKind, item_id: ItemId, open: RwSignal<bool>) -> impl IntoView {
        let api = ApiWeb::new();
        let message = RwSignal::new(String::new());
        let err = RwSignal::new(String::new());
        let sent = RwSignal::new(false);

        let on_submit = move |e: SubmitEvent| {
            e.prevent_default();
            let message = match message.with_untracked(|message| process_reason(message)) {
                Ok(message) => message,
                Err(msg) => {
                    err.set(msg);
                    return;
                }
            };
            err.set(String::new());
            api.claim_ownership(kind, item_id, &ClaimCreate { message })
                .send_web_busy(api.busy, async move |result| match result {
                    Ok(claim) => {
                        info!("ownership claim {} submitted", claim.id);
                        let _ = sent.try_set(true);
                    }
                    Err(e) => {
                        error!("claiming {kind} {item_id} failed: {e}");
                        let _ = err.try_set(e.user_message("Failed to submit claim"));
                    }
                });
        };

        view! {
            <Modal open title="Claim ownership">
                <Show
                    when=move || !sent.get()
                    fallback=|| view! { <p>"Claim submitted, an admin will review it."</p> }
                >
                    <form class="flex flex-col gap-2" on:submit=on_submit>
                        <textarea
                            class="border border-base03 bg-base00 p-1"
                            placeholder="How can we verify you built this?"
                            prop:value=move || message.get()
                            on:input=move |e| message.set(event_target_value(&e))
                        />
                        <p class="text-base08 whitespace-pre-line">{move || err.get()}</p>
                        <input type="submit" value=move || if api.is_pending_tracked() { "Sending..." } else { "Submit claim" } class="border border-base05 px-2 cursor-pointer"/>
                    </form>
                </Show>
            </Modal>
        }
    }

    #[component]
    pub fn ReportDeadModal(item_id: ItemId, open: RwSignal<bool>) -> impl IntoView {
        let api = ApiWeb::new();
        let reason = RwSignal::new(String::new());
        let err = RwSignal::new(String::new());
        let sent = RwSignal::new(false);

        let on_submit = move |e: SubmitEvent| {
            e.prevent_default();
            let reason = match reason.with_untracked(|reason| process_reason(reason)) {
                Ok(reason) => reason,
                Err(msg) => {
                    err.set(msg);
                    return;
                }
            };
            err.set(String::new());
            api.report_dead(item_id, &DeadReportCreate { reason })
                .send_web_busy(api.busy, async move |result| match result {
                    Ok(report) => {
                        info!("dead link report {} submitted", report.id);
                        let _ = sent.try_set(true);
                    }
                    Err(e) => {
                        error!("reporting app {item_id} failed: {e}");
                        let _ = err.try_set(e.user_message("Failed to submit report"));
                    }
                });
        };

        view! {
            <Modal open title="Report dead link">
                <Show
                    when=move || !sent.get()
                    fallback=|| view! { <p>"Thanks, the report was sent."</p> }
                >
                    <form class="flex flex-col gap-2" on:submit=on_submit>
                        <textarea
                            class="border border-base03 bg-base00 p-1"
                            placeholder="What is wrong with the link? (optional)"
                            prop:value=move || reason.get()
                            on:input=move |e| reason.set(event_target_value(&e))
                        />
                        <p class="text-base08 whitespace-pre-line">{move || err.get()}</p>
                        <input type="submit" value=move || if api.is_pending_tracked() { "Sending..." } else { "Report" } class="border border-base05 px-2 cursor-pointer"/>
                    </form>
                </Show>
            </Modal>
        }
    }

    #[component]
    pub fn FeedbackModal(open: RwSignal<bool>) -> impl IntoView {
        let api = ApiWeb::new();
        let kind = RwSignal::new(FeedbackKind::default());
        let message = RwSignal::new(String::new());
        let err = RwSignal::new(String::new());
        let sent = RwSignal::new(false);

        Effect::new(move || {
            if open.get() {
                kind.set(FeedbackKind::default());
                message.set(String::new());
                err.set(String::new());
                sent.set(false);
            }
        });

        let on_submit = move |e: SubmitEvent| {
            e.prevent_default();
            let message = match message.with_untracked(|message| process_feedback(message)) {
                Ok(message) => message,
                Err(msg) => {
                    err.set(msg);
                    return;
                }
            };
            err.set(String::new());
            let feedback = Feedback {
                kind: kind.get_untracked(),
                message,
            };
            api.add_feedback(&feedback)
                .send_web_busy(api.busy, async move |result| match result {
                    Ok(()) => {
                        info!("{} feedback sent", feedback.kind);
                        let _ = sent.try_set(true);
                    }
                    Err(e) => {
                        error!("sending feedback failed: {e}");
                        let _ = err.try_set(e.user_message("Failed to submit feedback, try again"));
                    }
                });
        };

        let kinds = move || {
            FeedbackKind::iter()
                .map(|value| {
                    let class = move || {
                        if kind.get() == value {
                            "border border-base05 bg-base05 text-base01 px-2 text-sm"
                        } else {
                            "border border-base03 px-2 text-sm"
                        }
                    };
                    view! {
                        <button type="button" class=class on:click=move |_| kind.set(value)>
                            {value.label()}
                        </button>
                    }
                })
                .collect_view()
        };

        view! {
            <Modal open title="Send feedback">
                <Show
                    when=move || !sent.get()
                    fallback=|| view! { <p>"Thank you, your feedback was sent."</p> }
                >
                    <form class="flex flex-col gap-2" on:submit=on_submit>
                        <div class="flex gap-1 flex-wrap">{kinds}</div>
                        <textarea
                            class="border border-base03 bg-base00 p-1 min-h-[6rem]"
                            placeholder="Tell us what you think"
                            prop:value=move || message.get()
                            on:input=move |e| message.set(event_target_value(&e))
                        />
                        <p class="text-base08 whitespace-pre-line">{move || err.get()}</p>
                        <input type="submit" value=move || if api.is_pending_tracked() { "Sending..." } else { "Send" } class="border border-base05 px-2 cursor-pointer"/>
                    </form>
                </Show>
            </Modal>
        }
    }

    #[component]
    pub fn ConfirmDelete(open: RwSignal<bool>, busy: Signal<bool>, on_confirm: Callback<()>) -> impl IntoView {
        view! {
            <Modal open title="Delete permanently?">
                <p>"This can't be undone."</p>
                <div class="flex gap-2 justify-end">
                    <button class="border border-base03 px-2" on:click=move |_| open.set(false)>"Cancel"</button>
                    <button
                        class="border border-base08 text-base08 px-2"
                        disabled=move || busy.get()
                        on:click=move |_| on_confirm.run(())
                    >
                        {move || if busy.get() { "Deleting..." } else { "Delete" }}
                    </button>
                </div>
            </Modal>
        }
    }
}
