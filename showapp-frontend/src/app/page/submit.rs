use leptos::prelude::*;

use crate::app::components::item_form::ItemForm;
use crate::app::components::nav::Nav;
use crate::app::hook::use_item_submit::use_item_submit;

#[component]
pub fn Page() -> impl IntoView {
    let form = use_item_submit();

    view! {
        <main class="grid grid-rows-[auto_1fr] min-h-screen bg-base00 text-base05">
            <Nav />
            <ItemForm form heading="Submit" />
        </main>
    }
}
