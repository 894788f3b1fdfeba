use jiff::Timestamp;
use leptos::prelude::*;
use showapp_api::{Api, ApiReq};
use showapp_shared::item::process_catalog_name;
use showapp_shared::model::{
    ClaimId, ClaimStatus, DeadReport, DeadReportResolve, OwnershipClaim, ReportId, TagId, ToolId,
};
use showapp_shared::time::format_relative;
use tracing::{error, info};
use web_sys::SubmitEvent;

use crate::api::{ApiWeb, SendWeb};
use crate::app::GlobalState;
use crate::app::components::nav::Nav;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CatalogKind {
    Tags,
    Tools,
}

/// Tag or tool with its usage count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogRow {
    pub id: i64,
    pub name: String,
    pub app_count: i64,
}

impl CatalogKind {
    fn fetch(&self, api: ApiWeb) -> impl Future<Output = Result<Vec<CatalogRow>, showapp_api::ApiErr>> {
        let kind = *self;
        async move {
            match kind {
                CatalogKind::Tags => api.get_tags_with_counts().send_native().await.map(|rows| {
                    rows.into_iter()
                        .map(|row| CatalogRow {
                            id: row.id.0,
                            name: row.name,
                            app_count: row.app_count,
                        })
                        .collect()
                }),
                CatalogKind::Tools => api.get_tools_with_counts().send_native().await.map(|rows| {
                    rows.into_iter()
                        .map(|row| CatalogRow {
                            id: row.id.0,
                            name: row.name,
                            app_count: row.app_count,
                        })
                        .collect()
                }),
            }
        }
    }

    fn create(&self, api: ApiWeb, name: String) -> ApiReq<()> {
        match self {
            CatalogKind::Tags => api.add_tag(name).into_empty(),
            CatalogKind::Tools => api.add_tool(name).into_empty(),
        }
    }

    fn rename(&self, api: ApiWeb, id: i64, name: String) -> ApiReq<()> {
        match self {
            CatalogKind::Tags => api.update_tag(TagId(id), name).into_empty(),
            CatalogKind::Tools => api.update_tool(ToolId(id), name).into_empty(),
        }
    }

    fn delete(&self, api: ApiWeb, id: i64) -> ApiReq<()> {
        match self {
            CatalogKind::Tags => api.delete_tag(TagId(id)),
            CatalogKind::Tools => api.delete_tool(ToolId(id)),
        }
    }
}

#[component]
pub fn Page() -> impl IntoView {
    view! {
        <main class="grid grid-rows-[auto_1fr] min-h-screen bg-base00 text-base05">
            <Nav />
            <div class="flex flex-col gap-6 max-w-[60rem] w-full mx-auto py-4 px-2">
                <h1 class="text-[1.5rem] font-bold">"Admin"</h1>
                <PendingClaims />
                <PendingDeadReports />
                <CatalogAdmin kind=CatalogKind::Tags />
                <CatalogAdmin kind=CatalogKind::Tools />
            </div>
        </main>
    }
}

#[component]
fn PendingClaims() -> impl IntoView {
    let api = ApiWeb::new();
    let claims = RwSignal::new(Vec::<OwnershipClaim>::new());
    let err = RwSignal::new(String::new());

    let load = move || {
        api.get_pending_claims().send_web(async move |result| match result {
            Ok(pending) => {
                let _ = claims.try_set(pending);
            }
            Err(e) => {
                error!("loading pending claims failed: {e}");
                let _ = err.try_set(e.user_message("Failed to load claims"));
            }
        });
    };
    load();

    let resolve = move |id: ClaimId, status: ClaimStatus| {
        api.resolve_claim(id, status)
            .send_web_busy(api.busy, async move |result| match result {
                Ok(claim) => {
                    info!("claim {} {}", claim.id, claim.status);
                    let _ = claims.try_update(|claims| claims.retain(|claim| claim.id != id));
                }
                Err(e) => {
                    error!("resolving claim {id} failed: {e}");
                    let _ = err.try_set(e.user_message("Failed to resolve claim"));
                }
            });
    };

    view! {
        <section class="flex flex-col gap-2">
            <h2 class="font-bold text-[1.2rem]">"Ownership claims"</h2>
            <p class="text-base08">{move || err.get()}</p>
            <For
                each=move || claims.get()
                key=|claim| claim.id
                children=move |claim| {
                    let id = claim.id;
                    let app = claim
                        .app
                        .as_ref()
                        .and_then(|app| app.title.clone())
                        .unwrap_or_else(|| format!("app {}", claim.app_id));
                    let claimant = claim
                        .claimant
                        .as_ref()
                        .map(|claimant| claimant.username.clone())
                        .unwrap_or_else(|| format!("user {}", claim.claimant_id));
                    let created = format_relative(claim.created_at, Timestamp::now());
                    view! {
                        <div class="flex flex-col gap-1 border border-base02 p-2">
                            <p>{format!("{claimant} claims \"{app}\" ({created})")}</p>
                            <p class="text-base04 whitespace-pre-line">{claim.message.clone().unwrap_or_default()}</p>
                            <div class="flex gap-2">
                                <button class="border border-base0B px-2" on:click=move |_| resolve(id, ClaimStatus::Approved)>"Approve"</button>
                                <button class="border border-base08 px-2" on:click=move |_| resolve(id, ClaimStatus::Rejected)>"Reject"</button>
                            </div>
                        </div>
                    }
                }
            />
            <p class=move || format!("text-base04 {}", if claims.with(|claims| claims.is_empty()) { "" } else { "hidden" })>"No pending claims."</p>
        </section>
    }
}

#[component]
fn PendingDeadReports() -> impl IntoView {
    let api = ApiWeb::new();
    let reports = RwSignal::new(Vec::<DeadReport>::new());
    let err = RwSignal::new(String::new());

    api.get_pending_dead_reports().send_web(async move |result| match result {
        Ok(pending) => {
            let _ = reports.try_set(pending);
        }
        Err(e) => {
            error!("loading dead link reports failed: {e}");
            let _ = err.try_set(e.user_message("Failed to load reports"));
        }
    });

    let resolve = move |id: ReportId, mark_as_dead: bool| {
        let resolve = DeadReportResolve {
            status: if mark_as_dead {
                ClaimStatus::Approved
            } else {
                ClaimStatus::Rejected
            },
            mark_as_dead,
        };
        api.resolve_dead_report(id, &resolve)
            .send_web_busy(api.busy, async move |result| match result {
                Ok(report) => {
                    info!("dead link report {} {}", report.id, report.status);
                    let _ = reports.try_update(|reports| reports.retain(|report| report.id != id));
                }
                Err(e) => {
                    error!("resolving dead link report {id} failed: {e}");
                    let _ = err.try_set(e.user_message("Failed to resolve report"));
                }
            });
    };

    view! {
        <section class="flex flex-col gap-2">
            <h2 class="font-bold text-[1.2rem]">"Dead link reports"</h2>
            <p class="text-base08">{move || err.get()}</p>
            <For
                each=move || reports.get()
                key=|report| report.id
                children=move |report| {
                    let id = report.id;
                    let created = format_relative(report.created_at, Timestamp::now());
                    view! {
                        <div class="flex flex-col gap-1 border border-base02 p-2">
                            <p>{format!("app {} reported {created}", report.app_id)}</p>
                            <p class="text-base04">{report.reason.clone().unwrap_or_default()}</p>
                            <div class="flex gap-2">
                                <button class="border border-base08 px-2" on:click=move |_| resolve(id, true)>"Mark dead"</button>
                                <button class="border border-base03 px-2" on:click=move |_| resolve(id, false)>"Dismiss"</button>
                            </div>
                        </div>
                    }
                }
            />
        </section>
    }
}

#[component]
fn CatalogAdmin(kind: CatalogKind) -> impl IntoView {
    let global_state = expect_context::<GlobalState>();
    let api = ApiWeb::new();
    let rows = RwSignal::new(Vec::<CatalogRow>::new());
    let new_name = RwSignal::new(String::new());
    let err = RwSignal::new(String::new());

    let load = move || {
        leptos::task::spawn_local(async move {
            match kind.fetch(api).await {
                Ok(fetched) => {
                    let _ = rows.try_set(fetched);
                }
                Err(e) => {
                    error!("loading {kind} failed: {e}");
                    let _ = err.try_set(e.user_message(format!("Failed to load {kind}")));
                }
            }
        });
    };
    load();

    let after_write = move |result: Result<(), showapp_api::ApiErr>, fallback: &'static str| {
        match result {
            Ok(()) => {
                let _ = err.try_set(String::new());
                global_state.catalog.invalidate();
                load();
            }
            Err(e) => {
                error!("{kind} update failed: {e}");
                let _ = err.try_set(e.user_message(fallback));
            }
        }
    };

    let on_create = move |e: SubmitEvent| {
        e.prevent_default();
        let name = match new_name.with_untracked(|name| process_catalog_name(name)) {
            Ok(name) => name,
            Err(msg) => {
                err.set(msg);
                return;
            }
        };
        kind.create(api, name)
            .send_web_busy(api.busy, async move |result| {
                if result.is_ok() {
                    let _ = new_name.try_set(String::new());
                }
                after_write(result, "Failed to create");
            });
    };

    let rename = move |id: i64, name: String| {
        let name = match process_catalog_name(name) {
            Ok(name) => name,
            Err(msg) => {
                err.set(msg);
                return;
            }
        };
        kind.rename(api, id, name)
            .send_web_busy(api.busy, async move |result| after_write(result, "Failed to rename"));
    };

    let delete = move |id: i64| {
        kind.delete(api, id)
            .send_web_busy(api.busy, async move |result| after_write(result, "Failed to delete"));
    };

    view! {
        <section class="flex flex-col gap-2">
            <h2 class="font-bold text-[1.2rem]">{kind.to_string()}</h2>
            <form class="flex gap-2" on:submit=on_create>
                <input
                    type="text"
                    placeholder="New name"
                    class="border border-base03 bg-base01 px-2 py-1 flex-grow"
                    prop:value=move || new_name.get()
                    on:input=move |e| new_name.set(event_target_value(&e))
                />
                <input type="submit" value="Add" class="border border-base05 px-2 cursor-pointer"/>
            </form>
            <p class="text-base08 whitespace-pre-line">{move || err.get()}</p>
            <For
                each=move || rows.get()
                key=|row| row.clone()
                children=move |row| {
                    let id = row.id;
                    let draft = RwSignal::new(row.name.clone());
                    view! {
                        <div class="flex gap-2 items-center">
                            <input
                                type="text"
                                class="border border-base03 bg-base01 px-2 flex-grow"
                                prop:value=move || draft.get()
                                on:input=move |e| draft.set(event_target_value(&e))
                            />
                            <span class="text-base04 text-sm">{format!("{} apps", row.app_count)}</span>
                            <button class="border border-base03 px-2" on:click=move |_| rename(id, draft.get_untracked())>"Rename"</button>
                            <button class="border border-base08 text-base08 px-2" on:click=move |_| delete(id)>"Delete"</button>
                        </div>
                    }
                }
            />
        </section>
    }
}
