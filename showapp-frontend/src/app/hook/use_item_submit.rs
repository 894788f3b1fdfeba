use gloo::file::futures::read_as_bytes;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;
use showapp_api::{Api, ApiErr};
use showapp_shared::item::{process_title, process_url};
use showapp_shared::model::{
    FeedItem, FeedKind, ItemCreate, ItemId, ItemStatus, ItemUpdate, Media, MediaId, TagId, ToolId,
};
use tracing::{error, info, trace};
use web_sys::SubmitEvent;

use crate::api::{ApiWeb, SendWeb};
use crate::app::GlobalState;
use crate::path::link_item;

/// Create form, switched to editing an existing item by [`ItemSubmit::fill`].
#[derive(Clone, Copy)]
pub struct ItemSubmit {
    pub kind: RwSignal<FeedKind>,
    pub title: RwSignal<String>,
    pub prompt: RwSignal<String>,
    pub prd: RwSignal<String>,
    pub status: RwSignal<ItemStatus>,
    pub app_url: RwSignal<String>,
    pub youtube_url: RwSignal<String>,
    pub tags: RwSignal<Vec<TagId>>,
    pub tools: RwSignal<Vec<ToolId>>,
    pub editing: RwSignal<Option<FeedItem>>,
    pub media: RwSignal<Vec<Media>>,
    pub files: NodeRef<html::Input>,
    pub err_title: RwSignal<String>,
    pub err_url: RwSignal<String>,
    pub err_general: RwSignal<String>,
    pub api: ApiWeb,
    pub api_media: ApiWeb,
    pub on_submit: StoredValue<Box<dyn Fn(SubmitEvent) + Sync + Send + 'static>>,
    pub on_remove_media: StoredValue<Box<dyn Fn(MediaId) + Sync + Send + 'static>>,
}

impl ItemSubmit {
    pub fn fill(&self, kind: FeedKind, item: &FeedItem) {
        self.kind.set(kind);
        self.title.set(item.title.clone().unwrap_or_default());
        self.prompt.set(item.prompt_text.clone().unwrap_or_default());
        self.prd.set(item.prd_text.clone().unwrap_or_default());
        self.status.set(item.status);
        self.app_url.set(item.app_url.clone().unwrap_or_default());
        self.youtube_url.set(item.youtube_url.clone().unwrap_or_default());
        self.tags.set(item.tags.iter().map(|tag| tag.id).collect());
        self.tools.set(item.tools.iter().map(|tool| tool.id).collect());
        self.media.set(item.media.clone());
        self.editing.set(Some(item.clone()));
    }

    pub fn is_editing(&self) -> bool {
        self.editing.with(|item| item.is_some())
    }
}

fn blank_to_none(value: String) -> Option<String> {
    let value = value.trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

pub fn toggle_id<T: PartialEq>(ids: &mut Vec<T>, id: T) {
    if let Some(pos) = ids.iter().position(|v| *v == id) {
        ids.remove(pos);
    } else {
        ids.push(id);
    }
}

fn picked_files(input: NodeRef<html::Input>) -> Vec<web_sys::File> {
    let Some(files) = input.get_untracked().and_then(|input| input.files()) else {
        return Vec::new();
    };
    (0..files.length())
        .filter_map(|i| files.get(i))
        .collect::<Vec<web_sys::File>>()
}

/// Presign, upload and link every file, stops at the first failure.
async fn upload_files(
    api: ApiWeb,
    kind: FeedKind,
    id: ItemId,
    files: Vec<web_sys::File>,
) -> Result<Vec<Media>, ApiErr> {
    let mut linked = Vec::with_capacity(files.len());
    for file in files {
        let file = gloo::file::File::from(file);
        let name = file.name();
        let content_type = file.raw_mime_type();
        let bytes = read_as_bytes(&file)
            .await
            .map_err(|err| ApiErr::Invalid(format!("failed to read {name}: {err}")))?;
        trace!("uploading {name} ({} bytes)", bytes.len());
        let upload = api
            .get_presigned_upload(&name, &content_type)
            .send_native()
            .await?;
        api.upload_media(&upload, &content_type, bytes)
            .send_native()
            .await?;
        let media = api
            .add_item_media(kind, id, upload.download_url)
            .send_native()
            .await?;
        linked.push(media);
    }
    Ok(linked)
}

async fn finish_uploads(api: ApiWeb, kind: FeedKind, id: ItemId, files: Vec<web_sys::File>) {
    if files.is_empty() {
        return;
    }
    match upload_files(api, kind, id, files).await {
        Ok(media) => info!("linked {} media to {kind} {id}", media.len()),
        Err(err) => error!("uploading media for {kind} {id} failed: {err}"),
    }
}

pub fn use_item_submit() -> ItemSubmit {
    let global_state = expect_context::<GlobalState>();
    let api = ApiWeb::new();
    let api_media = ApiWeb::new();
    let navigate = StoredValue::new_local(
        Box::new(use_navigate()) as Box<dyn Fn(&str, NavigateOptions) + 'static>
    );
    let kind = RwSignal::new(FeedKind::Apps);
    let title = RwSignal::new(String::new());
    let prompt = RwSignal::new(String::new());
    let prd = RwSignal::new(String::new());
    let status = RwSignal::new(ItemStatus::Live);
    let app_url = RwSignal::new(String::new());
    let youtube_url = RwSignal::new(String::new());
    let tags = RwSignal::new(Vec::<TagId>::new());
    let tools = RwSignal::new(Vec::<ToolId>::new());
    let editing = RwSignal::new(None::<FeedItem>);
    let media = RwSignal::new(Vec::<Media>::new());
    let files = NodeRef::<html::Input>::new();
    let err_title = RwSignal::new(String::new());
    let err_url = RwSignal::new(String::new());
    let err_general = RwSignal::new(String::new());

    let open_item = move |kind: FeedKind, key: String| {
        global_state.feeds.clear(kind);
        let link = link_item(kind, key);
        navigate.with_value(|navigate| navigate(&link, NavigateOptions::default()));
    };

    let on_submit = move |e: SubmitEvent| {
        e.prevent_default();
        let title_result = process_title(title.get_untracked());
        let app_url_result = process_url(app_url.get_untracked());
        let youtube_result = process_url(youtube_url.get_untracked());

        err_title.set(title_result.as_ref().err().cloned().unwrap_or_default());
        err_url.set(
            app_url_result
                .as_ref()
                .err()
                .or(youtube_result.as_ref().err())
                .cloned()
                .unwrap_or_default(),
        );
        err_general.set(String::new());

        let (Ok(title), Ok(app_url), Ok(youtube_url)) = (title_result, app_url_result, youtube_result)
        else {
            return;
        };
        let kind = kind.get_untracked();
        let item = ItemCreate {
            title,
            prompt_text: blank_to_none(prompt.get_untracked()),
            prd_text: blank_to_none(prd.get_untracked()),
            status: status.get_untracked(),
            app_url,
            youtube_url,
            is_agent_submitted: false,
            tag_ids: tags.get_untracked(),
            tool_ids: tools.get_untracked(),
        };
        let picked = picked_files(files);

        let Some(original) = editing.get_untracked() else {
            api.add_item(kind, &item)
                .send_web_busy(api.busy, async move |result| match result {
                    Ok(created) => {
                        info!("{kind} {} created", created.id);
                        finish_uploads(api_media, kind, created.id, picked).await;
                        open_item(kind, created.route_key());
                    }
                    Err(err) => {
                        error!("creating {kind} failed: {err}");
                        let _ = err_general.try_set(err.user_message("Failed to submit, try again later"));
                    }
                });
            return;
        };

        let update = ItemUpdate::changes(&original, &item);
        if update.is_empty() {
            trace!("{kind} {} unchanged", original.id);
            if picked.is_empty() {
                open_item(kind, original.route_key());
                return;
            }
            api.busy.set(true);
            spawn_local(async move {
                finish_uploads(api_media, kind, original.id, picked).await;
                let _ = api.busy.try_set(false);
                open_item(kind, original.route_key());
            });
            return;
        }
        api.update_item(kind, original.id, &update)
            .send_web_busy(api.busy, async move |result| match result {
                Ok(updated) => {
                    info!("{kind} {} updated", updated.id);
                    finish_uploads(api_media, kind, updated.id, picked).await;
                    open_item(kind, updated.route_key());
                }
                Err(err) => {
                    error!("updating {kind} {} failed: {err}", original.id);
                    let _ = err_general.try_set(err.user_message("Something went wrong during update, try again"));
                }
            });
    };

    let on_remove_media = move |media_id: MediaId| {
        let Some(id) = editing.with_untracked(|item| item.as_ref().map(|item| item.id)) else {
            return;
        };
        let kind = kind.get_untracked();
        api_media
            .delete_item_media(kind, id, media_id)
            .send_web_busy(api_media.busy, async move |result| match result {
                Ok(()) => {
                    trace!("media {media_id} removed from {kind} {id}");
                    let _ = media.try_update(|media| media.retain(|media| media.id != media_id));
                }
                Err(err) => {
                    error!("removing media {media_id} from {kind} {id} failed: {err}");
                    let _ = err_general.try_set(err.user_message("Failed to delete media, try again"));
                }
            });
    };

    ItemSubmit {
        kind,
        title,
        prompt,
        prd,
        status,
        app_url,
        youtube_url,
        tags,
        tools,
        editing,
        media,
        files,
        err_title,
        err_url,
        err_general,
        api,
        api_media,
        on_submit: StoredValue::new(Box::new(on_submit)),
        on_remove_media: StoredValue::new(Box::new(on_remove_media)),
    }
}

#[cfg(test)]
mod use_item_submit_tests {
    use crate::app::hook::use_item_submit::{blank_to_none, toggle_id};
    use pretty_assertions::assert_eq;
    use test_log::test;

    #[test]
    fn test_toggle_id() {
        let mut ids = vec![1, 2];
        toggle_id(&mut ids, 3);
        assert_eq!(ids, vec![1, 2, 3]);
        toggle_id(&mut ids, 1);
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_blank_to_none() {
        assert_eq!(blank_to_none("  ".to_string()), None);
        assert_eq!(blank_to_none(" a ".to_string()), Some("a".to_string()));
    }
}
