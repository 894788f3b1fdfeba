use app::App;

pub mod api;
pub mod app;
pub mod logger;
pub mod path;
pub mod toolbox;

#[cfg(feature = "csr")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn mount() {
    console_error_panic_hook::set_once();
    logger::web_logger_init();
    tracing::debug!("mounting app");
    leptos::mount::mount_to_body(App);
}
