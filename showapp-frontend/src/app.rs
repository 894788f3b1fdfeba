use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};
use leptos_router::components::*;
use leptos_router::path;
use page::{admin, edit, feed, item, login, submit, user};
use showapp_api::Api;
use showapp_shared::feed::{FeedCache, FeedCacheEntry};
use showapp_shared::model::{FeedKind, Tag, Tool, User};
use tracing::{error, info, trace};

use crate::api::{ApiWeb, SendWeb, load_token, remove_token, store_token};
use crate::path::{PATH_HOME, PATH_LOGIN};

pub mod components;
pub mod hook;
pub mod page;

#[derive(Clone, Copy)]
pub struct GlobalState {
    pub acc: RwSignal<Option<User>>,
    pub acc_pending: RwSignal<bool>,
    pub feeds: FeedCacheStore,
    pub catalog: CatalogStore,
}

impl GlobalState {
    pub fn new() -> Self {
        Self {
            acc: RwSignal::new(None),
            acc_pending: RwSignal::new(true),
            feeds: FeedCacheStore::new(),
            catalog: CatalogStore::new(),
        }
    }

    pub fn is_logged_in(&self) -> Option<bool> {
        let pending = self.acc_pending.get();
        let has_data = self.acc.with(|v| v.is_some());
        if pending {
            return None;
        }
        Some(has_data)
    }

    pub fn is_logged_in_untracked(&self) -> bool {
        self.acc.with_untracked(|v| v.is_some())
    }

    pub fn is_admin(&self) -> Option<bool> {
        if self.acc_pending.get() {
            return None;
        }
        Some(self.acc.with(|v| v.as_ref().is_some_and(|acc| acc.is_admin)))
    }

    pub fn get_username_tracked(&self) -> Option<String> {
        self.acc
            .with(|acc| acc.as_ref().map(|acc| acc.username.clone()))
    }

    pub fn acc_pending(&self) -> bool {
        self.acc_pending.get()
    }

    pub fn update_auth(&self) {
        let this = *self;
        if load_token().is_none() {
            trace!("no token stored, staying logged out");
            let _ = this.acc.try_set(None);
            let _ = this.acc_pending.try_set(false);
            return;
        }
        ApiWeb::new().get_me().send_web(async move |result| {
            match result {
                Ok(user) => {
                    info!("logged in as {}", user.username);
                    if this.acc.try_set(Some(user)).is_some() {
                        error!("global state acc was disposed somehow");
                    }
                }
                Err(err) if err.is_unauthorized() => {
                    info!("stored token was rejected, removing it");
                    remove_token();
                    let _ = this.acc.try_set(None);
                }
                Err(err) => {
                    error!("fetching account failed: {err}");
                }
            }
            if this.acc_pending.try_set(false).is_some() {
                error!("global state acc_pending was disposed somehow");
            }
        });
    }

    pub fn login(&self, token: &str) {
        store_token(token);
        self.feeds.clear_all();
        self.acc_pending.set(true);
        self.update_auth();
    }

    pub fn logout(&self) {
        remove_token();
        self.acc.set(None);
        self.feeds.clear_all();
        self.catalog.invalidate();
    }
}

/// One cache slot per feed kind.
#[derive(Clone, Copy)]
pub struct FeedCacheStore {
    apps: StoredValue<FeedCache>,
    dreams: StoredValue<FeedCache>,
}

impl FeedCacheStore {
    pub fn new() -> Self {
        Self {
            apps: StoredValue::new(FeedCache::new()),
            dreams: StoredValue::new(FeedCache::new()),
        }
    }

    fn slot(&self, kind: FeedKind) -> StoredValue<FeedCache> {
        match kind {
            FeedKind::Apps => self.apps,
            FeedKind::Dreams => self.dreams,
        }
    }

    pub fn save(&self, kind: FeedKind, entry: FeedCacheEntry) {
        self.slot(kind).update_value(|cache| cache.save(entry));
    }

    pub fn load(&self, kind: FeedKind, key: &str) -> Option<FeedCacheEntry> {
        self.slot(kind)
            .try_with_value(|cache| cache.load(key))
            .flatten()
    }

    pub fn clear(&self, kind: FeedKind) {
        self.slot(kind).update_value(|cache| cache.clear());
    }

    pub fn clear_all(&self) {
        self.clear(FeedKind::Apps);
        self.clear(FeedKind::Dreams);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum CatalogStage {
    #[default]
    Empty,
    Loading,
    Loaded,
}

/// Tags and tools, fetched once per session.
#[derive(Clone, Copy)]
pub struct CatalogStore {
    pub tags: RwSignal<Vec<Tag>>,
    pub tools: RwSignal<Vec<Tool>>,
    stage: StoredValue<CatalogStage>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            tags: RwSignal::new(Vec::new()),
            tools: RwSignal::new(Vec::new()),
            stage: StoredValue::new(CatalogStage::Empty),
        }
    }

    pub fn ensure_loaded(&self) {
        if self.stage.get_value() != CatalogStage::Empty {
            return;
        }
        self.stage.set_value(CatalogStage::Loading);
        let this = *self;
        let api = ApiWeb::new();
        api.get_tags().send_web(async move |tags| {
            let tools = api.get_tools().send_native().await;
            match (tags, tools) {
                (Ok(tags), Ok(tools)) => {
                    trace!("catalog loaded: {} tags, {} tools", tags.len(), tools.len());
                    let _ = this.tags.try_set(tags);
                    let _ = this.tools.try_set(tools);
                    let _ = this.stage.try_update_value(|stage| *stage = CatalogStage::Loaded);
                }
                (Err(err), _) | (_, Err(err)) => {
                    error!("loading catalog failed: {err}");
                    let _ = this.stage.try_update_value(|stage| *stage = CatalogStage::Empty);
                }
            }
        });
    }

    pub fn invalidate(&self) {
        self.stage.set_value(CatalogStage::Empty);
    }
}

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();
    provide_context(GlobalState::new());
    let global_state = expect_context::<GlobalState>();

    Effect::new(move || {
        global_state.update_auth();
    });

    view! {
        <Title text="Show Your App" />
        <Router>
            <Routes fallback=|| "not found">
                <Route path=path!("") view=|| view! { <feed::Page kind=FeedKind::Apps /> } />
                <Route path=path!("/dreams") view=|| view! { <feed::Page kind=FeedKind::Dreams /> } />
                <Route path=path!("/apps/:key") view=|| view! { <item::Page kind=FeedKind::Apps /> } />
                <Route path=path!("/dreams/:key") view=|| view! { <item::Page kind=FeedKind::Dreams /> } />
                <ProtectedRoute path=path!("/apps/:key/edit") condition=move||global_state.is_logged_in() redirect_path=|| PATH_LOGIN view=|| view! { <edit::Page kind=FeedKind::Apps /> } />
                <ProtectedRoute path=path!("/dreams/:key/edit") condition=move||global_state.is_logged_in() redirect_path=|| PATH_LOGIN view=|| view! { <edit::Page kind=FeedKind::Dreams /> } />
                <Route path=path!("/users/:id") view=user::Page />
                <ProtectedRoute path=path!("/submit") condition=move||global_state.is_logged_in() redirect_path=|| PATH_LOGIN view=submit::Page />
                <ProtectedRoute path=path!("/admin") condition=move||global_state.is_admin() redirect_path=|| PATH_HOME view=admin::Page />
                <ProtectedRoute path=path!("/login") condition=move||global_state.is_logged_in().map(|v| !v) redirect_path=|| PATH_HOME view=login::Page />
            </Routes>
        </Router>
    }
}
