pub mod admin;
pub mod edit;
pub mod item;
pub mod submit;
pub mod user;

pub mod feed {
    use leptos::prelude::*;
    use leptos_meta::Title;
    use showapp_shared::model::{FeedKind, ItemId};

    use crate::app::components::filter_bar::FilterBar;
    use crate::app::components::item_card::ItemCard;
    use crate::app::components::nav::Nav;
    use crate::app::components::new_posts_banner::NewPostsBanner;
    use crate::app::hook::use_feed::use_feed;
    use crate::app::hook::use_new_posts::use_new_posts;

    #[component]
    pub fn Page(kind: FeedKind) -> impl IntoView {
        let feed = use_feed(kind);
        let new_posts = use_new_posts(kind, feed.newest_id);
        let on_like = Callback::new(move |id: ItemId| feed.on_like.with_value(|f| f(id)));
        let on_refresh = Callback::new(move |_: ()| {
            new_posts.on_dismiss.with_value(|f| f());
            feed.on_refresh.with_value(|f| f());
        });
        let title = match kind {
            FeedKind::Apps => "Apps people shipped",
            FeedKind::Dreams => "Apps people dream of",
        };
        let footer = move || {
            if feed.is_loading() {
                "loading..."
            } else if feed.is_empty() {
                "Nothing here yet."
            } else if !feed.has_more() {
                "You reached the end."
            } else {
                ""
            }
        };

        view! {
            <main class="grid grid-rows-[auto_1fr] min-h-screen bg-base00 text-base05">
                <Title text=title />
                <Nav />
                <div class="flex flex-col gap-4 max-w-[60rem] w-full mx-auto py-2">
                    <h1 class="text-[1.5rem] font-bold px-2">{title}</h1>
                    <NewPostsBanner available=new_posts.available on_refresh />
                    <FilterBar feed />
                    <div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-2 px-2">
                        <For
                            each=move || feed.state.with(|state| state.items.clone())
                            key=|item| (item.id, item.is_liked, item.likes_count, item.comments_count)
                            children=move |item| view! { <ItemCard kind item on_like /> }
                        />
                    </div>
                    <p class="text-center text-base04">{footer}</p>
                    <div node_ref=feed.sentinel class="h-4"></div>
                </div>
            </main>
        }
    }
}

pub mod login {
    use leptos::prelude::*;
    use leptos_router::hooks::use_navigate;
    use tracing::trace;
    use web_sys::SubmitEvent;

    use crate::app::GlobalState;
    use crate::app::components::nav::Nav;
    use crate::path::PATH_HOME;

    #[component]
    pub fn Page() -> impl IntoView {
        let global_state = expect_context::<GlobalState>();
        let navigate = use_navigate();
        let token = RwSignal::new(String::new());
        let err = RwSignal::new(String::new());

        let on_login = move |e: SubmitEvent| {
            e.prevent_default();
            let value = token.get_untracked().trim().to_string();
            if value.is_empty() {
                err.set("token is required".to_string());
                return;
            }
            trace!("storing access token");
            global_state.login(&value);
            navigate(PATH_HOME, Default::default());
        };

        view! {
            <main class="grid grid-rows-[auto_1fr] min-h-screen bg-base00 text-base05">
                <Nav />
                <form class="flex flex-col gap-2 max-w-[30rem] w-full mx-auto py-4" on:submit=on_login>
                    <h1 class="text-[1.5rem] font-bold">"Login"</h1>
                    <label for="token">"Access token"</label>
                    <input
                        id="token"
                        type="password"
                        class="border border-base03 bg-base01 px-2 py-1"
                        prop:value=move || token.get()
                        on:input=move |e| token.set(event_target_value(&e))
                    />
                    <p class="text-base08">{move || err.get()}</p>
                    <input type="submit" value="Login" class="border border-base05 px-2 cursor-pointer"/>
                </form>
            </main>
        }
    }
}
