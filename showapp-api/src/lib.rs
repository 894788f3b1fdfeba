use std::fmt::Display;

use http::{HeaderMap, Method, header::CONTENT_TYPE};
use reqwest::RequestBuilder;
use serde::{Serialize, de::DeserializeOwned};
use showapp_shared::{
    comment::VoteValue,
    feed::FeedRequest,
    model::{
        ClaimCreate, ClaimId, ClaimStatus, Comment, CommentCreate, CommentId, DeadReport,
        DeadReportCreate, DeadReportResolve, FeedItem, FeedKind, Feedback, FollowStatus, ItemCreate,
        ItemId, ItemUpdate, Media, MediaId, OwnershipClaim, PresignedUpload, ReportId, Tag, TagId,
        TagWithCount, Tool, ToolId, ToolWithCount, User, UserId,
    },
};
use thiserror::Error;
use tracing::{debug, error, trace};

pub mod path;

#[cfg(test)]
mod tests;

pub mod settings {
    use config::{Config, ConfigError, Environment, File};

    pub const DEFAULT_API_URL: &str = "http://localhost:8000";

    #[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
    pub struct Settings {
        pub api: Backend,
        pub feed: Feed,
    }

    #[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
    pub struct Backend {
        pub base_url: String,
        pub token: Option<String>,
    }

    #[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
    pub struct Feed {
        pub page_size: u32,
    }

    impl Settings {
        /// `showapp.toml` (optional) overlaid by `SHOWAPP__API__BASE_URL` style variables.
        pub fn new_from_file() -> Result<Self, ConfigError> {
            Self::new_from_named_file("showapp")
        }

        pub fn new_from_named_file(name: &str) -> Result<Self, ConfigError> {
            Config::builder()
                .set_default("api.base_url", DEFAULT_API_URL)?
                .set_default("feed.page_size", showapp_shared::feed::PAGE_SIZE as i64)?
                .add_source(File::with_name(name).required(false))
                .add_source(Environment::with_prefix("SHOWAPP").separator("__"))
                .build()?
                .try_deserialize()
        }

        pub fn new_testing(base_url: impl Into<String>) -> Self {
            Self {
                api: Backend {
                    base_url: base_url.into(),
                    token: None,
                },
                feed: Feed {
                    page_size: showapp_shared::feed::PAGE_SIZE,
                },
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ApiErr {
    #[error("failed to send request: {0}")]
    Send(String),

    #[error("server responded with {status}: {}", detail.as_deref().unwrap_or("no detail"))]
    Status { status: u16, detail: Option<String> },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("{0}")]
    Invalid(String),
}

impl ApiErr {
    /// Server `detail` or validation text when present, the fallback otherwise.
    pub fn user_message(&self, fallback: impl Into<String>) -> String {
        match self {
            ApiErr::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ApiErr::Invalid(msg) => msg.clone(),
            _ => fallback.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiErr::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    pub newest_id: Option<ItemId>,
}

pub type Decoder<T> = fn(&HeaderMap, &[u8]) -> Result<T, ApiErr>;

pub const HEADER_NEWEST_ID: &str = "x-newest-app-id";

pub fn decode_json<T: DeserializeOwned>(_headers: &HeaderMap, bytes: &[u8]) -> Result<T, ApiErr> {
    serde_json::from_slice::<T>(bytes)
        .inspect_err(|err| error!("client failed to decode body: {err}"))
        .map_err(|err| ApiErr::Decode(err.to_string()))
}

pub fn decode_empty(_headers: &HeaderMap, _bytes: &[u8]) -> Result<(), ApiErr> {
    Ok(())
}

pub fn decode_feed_page(headers: &HeaderMap, bytes: &[u8]) -> Result<FeedPage, ApiErr> {
    let items = decode_json::<Vec<FeedItem>>(headers, bytes)?;
    let newest_id = headers
        .get(HEADER_NEWEST_ID)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<ItemId>().ok());

    Ok(FeedPage { items, newest_id })
}

/// FastAPI style `detail`, either a message or a list of `{msg}` objects.
pub fn extract_detail(bytes: &[u8]) -> Option<String> {
    let body = serde_json::from_slice::<serde_json::Value>(bytes).ok()?;
    match body.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        serde_json::Value::Array(entries) => {
            let detail = entries
                .iter()
                .filter_map(|entry| entry.get("msg").and_then(|msg| msg.as_str()))
                .collect::<Vec<&str>>()
                .join("\n");
            Some(detail).filter(|detail| !detail.is_empty())
        }
        _ => None,
    }
}

pub trait Api {
    fn provide_builder(&self, method: Method, path: impl AsRef<str>) -> RequestBuilder;
    fn provide_token(&self) -> Option<String> {
        None
    }

    fn into_req<T>(&self, method: Method, path: impl AsRef<str>, decode: Decoder<T>) -> ApiReq<T> {
        ApiReq::from_api(self, method, path, decode)
    }

    fn into_json_req<T: DeserializeOwned>(
        &self,
        method: Method,
        path: impl AsRef<str>,
    ) -> ApiReq<T> {
        self.into_req(method, path, decode_json::<T>)
    }

    fn into_empty_req(&self, method: Method, path: impl AsRef<str>) -> ApiReq<()> {
        self.into_req(method, path, decode_empty)
    }

    // items

    fn get_items(&self, kind: FeedKind, request: &FeedRequest) -> ApiReq<FeedPage> {
        self.into_req(Method::GET, path::items(kind), decode_feed_page)
            .query(&request.api_params())
    }

    /// `key` is either the numeric id or the slug.
    fn get_item(&self, kind: FeedKind, key: impl Display) -> ApiReq<FeedItem> {
        self.into_json_req(Method::GET, path::item(kind, key))
    }

    fn add_item(&self, kind: FeedKind, item: &ItemCreate) -> ApiReq<FeedItem> {
        self.into_json_req(Method::POST, path::items(kind)).json(item)
    }

    fn update_item(&self, kind: FeedKind, id: ItemId, update: &ItemUpdate) -> ApiReq<FeedItem> {
        self.into_json_req(Method::PATCH, path::item(kind, id))
            .json(update)
    }

    fn delete_item(&self, kind: FeedKind, id: ItemId) -> ApiReq<()> {
        self.into_empty_req(Method::DELETE, path::item(kind, id))
    }

    // item like

    fn add_item_like(&self, kind: FeedKind, id: ItemId) -> ApiReq<()> {
        self.into_empty_req(Method::POST, path::item_child(kind, id, "like"))
    }

    fn delete_item_like(&self, kind: FeedKind, id: ItemId) -> ApiReq<()> {
        self.into_empty_req(Method::DELETE, path::item_child(kind, id, "like"))
    }

    // comments

    fn get_comments(&self, kind: FeedKind, id: ItemId) -> ApiReq<Vec<Comment>> {
        self.into_json_req(Method::GET, path::item_child(kind, id, "comments"))
    }

    fn add_comment(&self, kind: FeedKind, id: ItemId, comment: &CommentCreate) -> ApiReq<Comment> {
        self.into_json_req(Method::POST, path::item_child(kind, id, "comments"))
            .json(comment)
    }

    fn vote_comment(&self, id: CommentId, value: VoteValue) -> ApiReq<()> {
        self.into_empty_req(Method::POST, path::comment_child(id, "vote"))
            .query(&[("value", value.to_string())])
    }

    // ownership claims

    fn claim_ownership(
        &self,
        kind: FeedKind,
        id: ItemId,
        claim: &ClaimCreate,
    ) -> ApiReq<OwnershipClaim> {
        self.into_json_req(Method::POST, path::item_child(kind, id, "claim-ownership"))
            .json(claim)
    }

    fn get_pending_claims(&self) -> ApiReq<Vec<OwnershipClaim>> {
        self.into_json_req(Method::GET, path::PATH_CLAIMS)
    }

    fn resolve_claim(&self, id: ClaimId, status: ClaimStatus) -> ApiReq<OwnershipClaim> {
        self.into_json_req(Method::PUT, path::claim_resolve(id))
            .query(&[("status", status.to_string())])
    }

    // dead link reports

    fn report_dead(&self, id: ItemId, report: &DeadReportCreate) -> ApiReq<DeadReport> {
        self.into_json_req(
            Method::POST,
            path::item_child(FeedKind::Apps, id, "report-dead"),
        )
        .json(report)
    }

    fn get_pending_dead_reports(&self) -> ApiReq<Vec<DeadReport>> {
        self.into_json_req(Method::GET, path::PATH_DEAD_REPORTS_PENDING)
    }

    fn resolve_dead_report(&self, id: ReportId, resolve: &DeadReportResolve) -> ApiReq<DeadReport> {
        self.into_json_req(Method::PUT, path::dead_report_resolve(id))
            .json(resolve)
    }

    // tags

    fn get_tags(&self) -> ApiReq<Vec<Tag>> {
        self.into_json_req(Method::GET, path::PATH_TAGS)
    }

    fn get_tags_with_counts(&self) -> ApiReq<Vec<TagWithCount>> {
        self.into_json_req(Method::GET, path::catalog_with_counts(path::PATH_TAGS))
    }

    fn add_tag(&self, name: impl Into<String>) -> ApiReq<Tag> {
        self.into_json_req(Method::POST, path::PATH_TAGS)
            .json(&NameBody { name: name.into() })
    }

    fn update_tag(&self, id: TagId, name: impl Into<String>) -> ApiReq<Tag> {
        self.into_json_req(Method::PUT, path::catalog_entry(path::PATH_TAGS, id))
            .json(&NameBody { name: name.into() })
    }

    fn delete_tag(&self, id: TagId) -> ApiReq<()> {
        self.into_empty_req(Method::DELETE, path::catalog_entry(path::PATH_TAGS, id))
    }

    // tools

    fn get_tools(&self) -> ApiReq<Vec<Tool>> {
        self.into_json_req(Method::GET, path::PATH_TOOLS)
    }

    fn get_tools_with_counts(&self) -> ApiReq<Vec<ToolWithCount>> {
        self.into_json_req(Method::GET, path::catalog_with_counts(path::PATH_TOOLS))
    }

    fn add_tool(&self, name: impl Into<String>) -> ApiReq<Tool> {
        self.into_json_req(Method::POST, path::PATH_TOOLS)
            .json(&NameBody { name: name.into() })
    }

    fn update_tool(&self, id: ToolId, name: impl Into<String>) -> ApiReq<Tool> {
        self.into_json_req(Method::PUT, path::catalog_entry(path::PATH_TOOLS, id))
            .json(&NameBody { name: name.into() })
    }

    fn delete_tool(&self, id: ToolId) -> ApiReq<()> {
        self.into_empty_req(Method::DELETE, path::catalog_entry(path::PATH_TOOLS, id))
    }

    // media

    fn get_presigned_upload(
        &self,
        filename: impl Into<String>,
        content_type: impl Into<String>,
    ) -> ApiReq<PresignedUpload> {
        self.into_json_req(Method::POST, path::PATH_MEDIA_PRESIGNED)
            .json(&PresignBody {
                filename: filename.into(),
                content_type: content_type.into(),
            })
    }

    /// Goes straight to the storage url, without the api token.
    fn upload_media(
        &self,
        upload: &PresignedUpload,
        content_type: impl AsRef<str>,
        bytes: Vec<u8>,
    ) -> ApiReq<()> {
        let builder = reqwest::Client::new()
            .put(&upload.upload_url)
            .header(CONTENT_TYPE, content_type.as_ref())
            .body(bytes);
        ApiReq::new(builder, None, decode_empty)
    }

    fn add_item_media(
        &self,
        kind: FeedKind,
        id: ItemId,
        media_url: impl Into<String>,
    ) -> ApiReq<Media> {
        self.into_json_req(Method::POST, path::item_child(kind, id, "media"))
            .json(&MediaBody {
                media_url: media_url.into(),
            })
    }

    fn delete_item_media(&self, kind: FeedKind, id: ItemId, media_id: MediaId) -> ApiReq<()> {
        self.into_empty_req(Method::DELETE, path::item_media(kind, id, media_id))
    }

    // users

    fn get_me(&self) -> ApiReq<User> {
        self.into_json_req(Method::GET, path::PATH_AUTH_ME)
    }

    fn get_user(&self, id: UserId) -> ApiReq<User> {
        self.into_json_req(Method::GET, path::user(id))
    }

    fn follow_user(&self, id: UserId) -> ApiReq<()> {
        self.into_empty_req(Method::POST, path::user_follow(id))
    }

    fn unfollow_user(&self, id: UserId) -> ApiReq<()> {
        self.into_empty_req(Method::DELETE, path::user_follow(id))
    }

    fn get_follow_status(&self, id: UserId) -> ApiReq<FollowStatus> {
        self.into_json_req(Method::GET, path::user_follow_status(id))
    }

    // feedback

    fn add_feedback(&self, feedback: &Feedback) -> ApiReq<()> {
        self.into_empty_req(Method::POST, path::PATH_FEEDBACK)
            .json(feedback)
    }
}

#[derive(Serialize)]
struct NameBody {
    name: String,
}

#[derive(Serialize)]
struct PresignBody {
    filename: String,
    content_type: String,
}

#[derive(Serialize)]
struct MediaBody {
    media_url: String,
}

pub struct ApiReq<T> {
    pub builder: RequestBuilder,
    pub token: Option<String>,
    pub decode: Decoder<T>,
}

impl<T> ApiReq<T> {
    pub fn new(builder: RequestBuilder, token: Option<String>, decode: Decoder<T>) -> Self {
        Self {
            builder,
            token,
            decode,
        }
    }

    pub fn from_api<A>(api: &A, method: Method, path: impl AsRef<str>, decode: Decoder<T>) -> Self
    where
        A: Api + ?Sized,
    {
        let builder = api.provide_builder(method, path.as_ref());
        let token = api.provide_token();
        Self::new(builder, token, decode)
    }

    pub fn query<Q: Serialize + ?Sized>(self, query: &Q) -> Self {
        Self {
            builder: self.builder.query(query),
            ..self
        }
    }

    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> Self {
        Self {
            builder: self.builder.json(body),
            ..self
        }
    }

    /// Same request, response body ignored.
    pub fn into_empty(self) -> ApiReq<()> {
        ApiReq {
            builder: self.builder,
            token: self.token,
            decode: decode_empty,
        }
    }

    pub async fn send_native(self) -> Result<T, ApiErr> {
        send(self.builder, self.token.as_deref(), self.decode).await
    }

    pub async fn send_native_with_token(self, token: impl AsRef<str>) -> Result<T, ApiErr> {
        send(self.builder, Some(token.as_ref()), self.decode).await
    }
}

pub async fn send<T>(
    mut builder: RequestBuilder,
    token: Option<&str>,
    decode: Decoder<T>,
) -> Result<T, ApiErr> {
    if let Some(token) = token {
        builder = builder.bearer_auth(token);
    }
    let res = builder
        .send()
        .await
        .inspect_err(|err| error!("client failed to send {err}"))
        .map_err(|err| ApiErr::Send(err.to_string()))?;

    let status = res.status();
    let url = res.url().to_string();
    let headers = res.headers().clone();
    let bytes = res
        .bytes()
        .await
        .map_err(|err| ApiErr::Decode(err.to_string()))
        .inspect_err(|err| error!("client byte stream status {status}\nurl: {url}\nerr: {err}"))?;

    debug!(
        "CLIENT RECV:\nstatus: {status}\nurl: {url}\n{}",
        String::from_utf8_lossy(&bytes)
    );

    if !status.is_success() {
        let detail = extract_detail(&bytes);
        trace!("request to {url} failed with {status}: {detail:?}");
        return Err(ApiErr::Status {
            status: status.as_u16(),
            detail,
        });
    }

    decode(&headers, &bytes)
}

#[derive(Clone, Debug, Default)]
pub struct ApiNative {
    pub base_url: String,
    pub token: Option<String>,
    pub client: reqwest::Client,
}

impl Api for ApiNative {
    fn provide_builder(&self, method: Method, path: impl AsRef<str>) -> RequestBuilder {
        let base_url = self.base_url.trim_end_matches('/');
        let path = path.as_ref();
        let url = format!("{base_url}{path}");
        self.client.request(method, url)
    }

    fn provide_token(&self) -> Option<String> {
        self.token.clone()
    }
}

impl ApiNative {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_token(self, token: Option<String>) -> Self {
        Self { token, ..self }
    }

    pub fn from_settings(settings: &settings::Settings) -> Self {
        Self::new(settings.api.base_url.clone()).with_token(settings.api.token.clone())
    }
}
