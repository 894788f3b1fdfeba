use leptos::prelude::*;
use leptos_meta::Title;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_navigate, use_params_map};
use showapp_api::Api;
use showapp_shared::model::FeedKind;
use tracing::{error, info, trace};

use crate::api::{ApiWeb, SendWeb};
use crate::app::components::item_form::ItemForm;
use crate::app::components::nav::Nav;
use crate::app::hook::use_item_submit::use_item_submit;
use crate::path::link_item;

#[component]
pub fn Page(kind: FeedKind) -> impl IntoView {
    let api = ApiWeb::new();
    let params = use_params_map();
    let navigate = StoredValue::new_local(
        Box::new(use_navigate()) as Box<dyn Fn(&str, NavigateOptions) + 'static>
    );
    let key = Memo::new(move |_| params.with(|params| params.get("key")));
    let form = use_item_submit();
    let load_err = RwSignal::new(String::new());

    Effect::new(move || {
        let Some(key) = key.get() else {
            return;
        };
        trace!("loading {kind} \"{key}\" for editing");
        api.get_item(kind, &key).send_web(async move |result| match result {
            Ok(item) if item.is_owner => {
                form.fill(kind, &item);
            }
            Ok(item) => {
                info!("not the owner of {kind} {}, leaving the editor", item.id);
                let link = link_item(kind, item.route_key());
                navigate.with_value(|navigate| {
                    navigate(
                        &link,
                        NavigateOptions {
                            replace: true,
                            ..Default::default()
                        },
                    )
                });
            }
            Err(err) => {
                error!("loading {kind} \"{key}\" for editing failed: {err}");
                let _ = load_err.try_set(err.user_message(format!("Failed to load this {}.", kind.singular())));
            }
        });
    });

    let heading = match kind {
        FeedKind::Apps => "Edit app",
        FeedKind::Dreams => "Edit dream",
    };

    view! {
        <main class="grid grid-rows-[auto_1fr] min-h-screen bg-base00 text-base05">
            <Title text=heading />
            <Nav />
            <Show
                when=move || form.is_editing()
                fallback=move || view! {
                    <p class="mx-auto py-4">
                        {move || {
                            let err = load_err.get();
                            if err.is_empty() { "loading...".to_string() } else { err }
                        }}
                    </p>
                }
            >
                <ItemForm form heading />
            </Show>
        </main>
    }
}
