use gloo::storage::{LocalStorage, Storage};
use http::Method;
use leptos::{prelude::*, task::spawn_local};
use reqwest::RequestBuilder;
use showapp_api::{Api, ApiErr, ApiReq, settings::DEFAULT_API_URL};
use tracing::{error, trace, warn};

pub const TOKEN_KEY: &str = "token";

pub fn api_base_url() -> &'static str {
    option_env!("SHOWAPP_API_URL").unwrap_or(DEFAULT_API_URL)
}

pub fn load_token() -> Option<String> {
    LocalStorage::raw()
        .get_item(TOKEN_KEY)
        .ok()
        .flatten()
        .filter(|token| !token.is_empty())
}

pub fn store_token(token: &str) {
    if let Err(err) = LocalStorage::raw().set_item(TOKEN_KEY, token) {
        error!("failed to store token: {err:?}");
    }
}

pub fn remove_token() {
    LocalStorage::delete(TOKEN_KEY);
}

#[derive(Clone, Copy, Default)]
pub struct ApiWeb {
    pub busy: RwSignal<bool>,
}

impl ApiWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending_tracked(&self) -> bool {
        self.busy.get()
    }

    pub fn is_pending_untracked(&self) -> bool {
        self.busy.get_untracked()
    }
}

impl Api for ApiWeb {
    fn provide_builder(&self, method: Method, path: impl AsRef<str>) -> RequestBuilder {
        let origin = api_base_url().trim_end_matches('/');
        let path = path.as_ref();
        let url = format!("{origin}{path}");
        trace!("{method} {url}");
        reqwest::Client::new().request(method, url)
    }

    fn provide_token(&self) -> Option<String> {
        load_token()
    }
}

pub trait SendWeb<T> {
    fn send_web<F, Fut>(self, fut: F)
    where
        F: FnOnce(Result<T, ApiErr>) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static;

    /// Same as `send_web` but refuses to start while `busy` is set.
    fn send_web_busy<F, Fut>(self, busy: RwSignal<bool>, fut: F)
    where
        F: FnOnce(Result<T, ApiErr>) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static;
}

impl<T: 'static> SendWeb<T> for ApiReq<T> {
    fn send_web<F, Fut>(self, fut: F)
    where
        F: FnOnce(Result<T, ApiErr>) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        spawn_local(async move {
            let result = self.send_native().await;
            fut(result).await;
        });
    }

    fn send_web_busy<F, Fut>(self, busy: RwSignal<bool>, fut: F)
    where
        F: FnOnce(Result<T, ApiErr>) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        if busy.get_untracked() {
            warn!("trying to send while still pending");
            return;
        }
        busy.set(true);
        spawn_local(async move {
            let result = self.send_native().await;
            fut(result).await;
            let _ = busy.try_set(false);
        });
    }
}
