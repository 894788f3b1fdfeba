use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State},
    http::{
        HeaderMap, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE, HOST},
    },
    response::IntoResponse,
    routing::{delete, get, post, put},
    body::Bytes,
};
use axum_test::TestServer;
use http::Method;
use pretty_assertions::assert_eq;
use reqwest::RequestBuilder;
use serde_json::{Value, json};
use showapp_shared::{
    comment::{CommentTree, VoteValue},
    feed::{FeedFilter, FeedQuery, FeedRequest, PAGE_SIZE},
    model::{
        ClaimId, ClaimStatus, CommentCreate, CommentId, FeedKind, Feedback, FeedbackKind, ItemId,
        ItemStatus, ItemUpdate, MediaId, SortBy, TagId, UserId,
    },
};
use test_log::test;
use tracing::trace;

use crate::{Api, ApiErr, HEADER_NEWEST_ID, extract_detail};

#[derive(Clone, Default)]
struct Recorded {
    queries: Arc<Mutex<Vec<String>>>,
    auth: Arc<Mutex<Vec<String>>>,
    bodies: Arc<Mutex<Vec<String>>>,
}

impl Recorded {
    fn query(&self, query: Option<String>) {
        self.queries
            .lock()
            .unwrap()
            .push(query.unwrap_or_default());
    }

    fn auth(&self, headers: &HeaderMap) {
        let auth = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.auth.lock().unwrap().push(auth);
    }

    fn body(&self, body: impl Into<String>) {
        self.bodies.lock().unwrap().push(body.into());
    }

    fn bodies(&self) -> Vec<String> {
        self.bodies.lock().unwrap().clone()
    }

    fn last_query(&self) -> String {
        self.queries.lock().unwrap().last().cloned().unwrap_or_default()
    }

    fn last_auth(&self) -> String {
        self.auth.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

struct ApiTest {
    server: TestServer,
    token: Option<String>,
}

impl Api for ApiTest {
    fn provide_builder(&self, method: Method, path: impl AsRef<str>) -> RequestBuilder {
        let path = path.as_ref();
        match method {
            Method::POST => self.server.reqwest_post(path),
            Method::PUT => self.server.reqwest_put(path),
            Method::PATCH => self.server.reqwest_patch(path),
            Method::DELETE => self.server.reqwest_delete(path),
            _ => self.server.reqwest_get(path),
        }
    }

    fn provide_token(&self) -> Option<String> {
        self.token.clone()
    }
}

fn app_json(id: i64) -> Value {
    json!({
        "id": id,
        "slug": format!("app-{id}"),
        "title": format!("App {id}"),
        "status": "Live",
        "creator_id": 1,
        "creator": {"id": 1, "username": "maker"},
        "created_at": "2024-01-05T10:00:00.123456",
        "likes_count": 3,
        "comments_count": 1,
        "is_liked": false,
        "tags": [{"id": 1, "name": "games"}],
    })
}

fn comment_json(id: i64, parent_id: Option<i64>) -> Value {
    json!({
        "id": id,
        "app_id": 7,
        "user_id": 2,
        "content": format!("comment {id}"),
        "created_at": "2024-01-05T10:00:00",
        "score": id,
        "parent_id": parent_id,
        "user_vote": null,
        "user": {"id": 2, "username": "reader"},
    })
}

async fn list_apps(State(recorded): State<Recorded>, RawQuery(query): RawQuery) -> impl IntoResponse {
    let skip_first = query
        .as_deref()
        .map(|query| query.contains("skip=0"))
        .unwrap_or_default();
    recorded.query(query);
    let count = if skip_first { PAGE_SIZE as i64 } else { 7 };
    let items = (0..count).map(app_json).collect::<Vec<Value>>();
    ([(HEADER_NEWEST_ID, "42")], Json(items))
}

async fn get_comments(Path(id): Path<i64>) -> impl IntoResponse {
    trace!("listing comments for {id}");
    Json(vec![
        comment_json(3, None),
        comment_json(4, Some(3)),
        comment_json(5, Some(99)),
        comment_json(6, Some(4)),
    ])
}

async fn add_comment(Path(id): Path<i64>, Json(body): Json<Value>) -> impl IntoResponse {
    let content = body["content"].as_str().unwrap_or_default().to_string();
    if content.trim().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": [
                {"loc": ["body", "content"], "msg": "content too short"},
                {"loc": ["body", "content"], "msg": "content required"},
            ]})),
        );
    }
    let mut comment = comment_json(10, body["parent_id"].as_i64());
    comment["content"] = Value::String(content);
    comment["app_id"] = json!(id);
    (StatusCode::OK, Json(comment))
}

async fn vote_comment(
    State(recorded): State<Recorded>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    recorded.auth(&headers);
    recorded.query(query);
    if id == 404 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Comment not found"})),
        );
    }
    (StatusCode::OK, Json(json!({"score": 1})))
}

async fn delete_app(Path(id): Path<i64>) -> impl IntoResponse {
    trace!("deleting {id}");
    StatusCode::NO_CONTENT
}

async fn resolve_claim(
    State(recorded): State<Recorded>,
    Path(id): Path<i64>,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    let status = query
        .as_deref()
        .and_then(|query| query.strip_prefix("status="))
        .unwrap_or("pending")
        .to_string();
    recorded.query(query);
    Json(json!({
        "id": id,
        "app_id": 7,
        "claimant_id": 3,
        "message": "it's mine",
        "status": status,
        "created_at": "2024-01-05T10:00:00",
        "resolved_at": "2024-01-06T10:00:00Z",
    }))
}

async fn add_tag(Json(body): Json<Value>) -> impl IntoResponse {
    let name = body["name"].as_str().unwrap_or_default();
    if name == "games" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Tag already exists"})),
        );
    }
    (StatusCode::OK, Json(json!({"id": 2, "name": name})))
}

async fn get_me(headers: HeaderMap) -> impl IntoResponse {
    let authorized = headers
        .get(AUTHORIZATION)
        .map(|value| value == "Bearer secret")
        .unwrap_or_default();
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Not authenticated"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"id": 1, "username": "maker", "is_admin": true})),
    )
}

async fn follow_user(
    State(recorded): State<Recorded>,
    Path(id): Path<i64>,
    method: Method,
) -> StatusCode {
    recorded.query(Some(format!("{method} {id}")));
    StatusCode::NO_CONTENT
}

async fn follow_status(Path(id): Path<i64>) -> Json<Value> {
    Json(json!({"is_following": id == 3}))
}

async fn update_app(
    State(recorded): State<Recorded>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    recorded.body(body.to_string());
    let mut app = app_json(id);
    if let Some(title) = body.get("title") {
        app["title"] = title.clone();
    }
    if let Some(status) = body.get("status") {
        app["status"] = status.clone();
    }
    Json(app)
}

async fn presign(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let filename = body["filename"].as_str().unwrap_or_default();
    Json(json!({
        "upload_url": format!("http://{host}/storage/{filename}"),
        "download_url": format!("https://cdn.example.com/{filename}"),
        "file_key": filename,
    }))
}

async fn storage_put(
    State(recorded): State<Recorded>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    recorded.auth(&headers);
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    recorded.body(format!("{key} {content_type} {}", body.len()));
    StatusCode::OK
}

async fn add_media(Path(id): Path<i64>, Json(body): Json<Value>) -> impl IntoResponse {
    trace!("linking media to {id}");
    Json(json!({"id": 8, "media_url": body["media_url"]}))
}

async fn delete_media(
    State(recorded): State<Recorded>,
    Path((id, media_id)): Path<(i64, i64)>,
) -> StatusCode {
    recorded.query(Some(format!("{id}/{media_id}")));
    StatusCode::NO_CONTENT
}

async fn add_feedback(State(recorded): State<Recorded>, Json(body): Json<Value>) -> impl IntoResponse {
    if body["message"].as_str().unwrap_or_default().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": "Message is required"})),
        );
    }
    recorded.body(body.to_string());
    (StatusCode::CREATED, Json(json!({"id": 1})))
}

async fn get_user(Path(id): Path<i64>) -> impl IntoResponse {
    if id != 3 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "User not found"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"id": 3, "username": "builder", "bio": "makes robots", "reputation_score": 12})),
    )
}

fn mock_router(recorded: Recorded) -> Router {
    Router::new()
        .route("/apps/", get(list_apps))
        .route("/apps/{id}", delete(delete_app).patch(update_app))
        .route("/apps/{id}/media", post(add_media))
        .route("/apps/{id}/media/{media_id}", delete(delete_media))
        .route("/media/presigned-url", post(presign))
        .route("/storage/{key}", put(storage_put))
        .route("/feedback/", post(add_feedback))
        .route("/users/{id}", get(get_user))
        .route("/apps/{id}/comments", get(get_comments).post(add_comment))
        .route("/comments/{id}/vote", post(vote_comment))
        .route("/ownership-claims/{id}/resolve", put(resolve_claim))
        .route("/tags/", post(add_tag))
        .route("/auth/me", get(get_me))
        .route("/users/{id}/follow", post(follow_user).delete(follow_user))
        .route("/users/{id}/follow/status", get(follow_status))
        .with_state(recorded)
}

fn new_api(token: Option<&str>) -> (ApiTest, Recorded) {
    let _ = tracing_subscriber::fmt()
        .event_format(
            tracing_subscriber::fmt::format()
                .with_file(true)
                .with_line_number(true),
        )
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let recorded = Recorded::default();
    let server = TestServer::builder()
        .http_transport()
        .build(mock_router(recorded.clone()))
        .unwrap();
    let api = ApiTest {
        server,
        token: token.map(str::to_string),
    };
    (api, recorded)
}

#[test(tokio::test)]
async fn test_get_items_with_filters() {
    let (api, recorded) = new_api(None);
    let query = FeedQuery::default()
        .with_filter_toggled(FeedFilter::Tag(TagId(1)))
        .with_filter_toggled(FeedFilter::Tag(TagId(2)))
        .with_sort(SortBy::Newest)
        .with_search("robot");

    let page = api
        .get_items(FeedKind::Apps, &FeedRequest::new(query.clone(), 1))
        .send_native()
        .await
        .unwrap();
    assert_eq!(page.items.len(), PAGE_SIZE as usize);
    assert_eq!(page.newest_id, Some(ItemId(42)));
    assert_eq!(page.items[0].creator_name(), "maker");
    assert_eq!(
        recorded.last_query(),
        "skip=0&limit=20&tag_id=1&tag_id=2&search=robot&sort_by=newest"
    );

    let page = api
        .get_items(FeedKind::Apps, &FeedRequest::new(query, 2))
        .send_native()
        .await
        .unwrap();
    assert_eq!(page.items.len(), 7);
    assert!(recorded.last_query().starts_with("skip=20&limit=20"));
}

#[test(tokio::test)]
async fn test_comments_into_tree() {
    let (api, _) = new_api(None);
    let comments = api
        .get_comments(FeedKind::Apps, ItemId(7))
        .send_native()
        .await
        .unwrap();
    let tree = CommentTree::build(&comments);

    let roots = tree
        .roots()
        .map(|node| node.comment.id)
        .collect::<Vec<CommentId>>();
    assert_eq!(roots, vec![CommentId(3), CommentId(5)]);
    assert_eq!(tree.descendant_count(CommentId(3)), 2);
    let rows = tree.rows(&HashSet::new());
    assert_eq!(rows.iter().map(|row| row.depth).collect::<Vec<usize>>(), vec![0, 1, 2, 0]);
}

#[test(tokio::test)]
async fn test_add_comment() {
    let (api, _) = new_api(Some("secret"));
    let reply = api
        .add_comment(
            FeedKind::Apps,
            ItemId(7),
            &CommentCreate {
                content: "agreed".to_string(),
                parent_id: Some(CommentId(3)),
            },
        )
        .send_native()
        .await
        .unwrap();
    assert_eq!(reply.parent_id, Some(CommentId(3)));
    assert_eq!(reply.content, "agreed");

    let err = api
        .add_comment(
            FeedKind::Apps,
            ItemId(7),
            &CommentCreate {
                content: " ".to_string(),
                parent_id: None,
            },
        )
        .send_native()
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(422));
    assert_eq!(
        err.user_message("Failed to post comment"),
        "content too short\ncontent required"
    );
}

#[test(tokio::test)]
async fn test_vote_comment() {
    let (api, recorded) = new_api(Some("secret"));
    api.vote_comment(CommentId(3), VoteValue::Down)
        .send_native()
        .await
        .unwrap();
    assert_eq!(recorded.last_query(), "value=-1");
    assert_eq!(recorded.last_auth(), "Bearer secret");

    let err = api
        .vote_comment(CommentId(404), VoteValue::Up)
        .send_native()
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiErr::Status {
            status: 404,
            detail: Some("Comment not found".to_string())
        }
    );
    assert!(err.is_not_found());
}

#[test(tokio::test)]
async fn test_delete_no_content() {
    let (api, _) = new_api(Some("secret"));
    let result = api.delete_item(FeedKind::Apps, ItemId(7)).send_native().await;
    assert_eq!(result, Ok(()));
}

#[test(tokio::test)]
async fn test_resolve_claim() {
    let (api, recorded) = new_api(Some("secret"));
    let claim = api
        .resolve_claim(ClaimId(5), ClaimStatus::Approved)
        .send_native()
        .await
        .unwrap();
    assert_eq!(recorded.last_query(), "status=approved");
    assert_eq!(claim.status, ClaimStatus::Approved);
    assert_eq!(claim.claimant_id, UserId(3));
    assert!(claim.resolved_at.is_some());
}

#[test(tokio::test)]
async fn test_add_tag_conflict() {
    let (api, _) = new_api(Some("secret"));
    let tag = api.add_tag("tools").send_native().await.unwrap();
    assert_eq!(tag.id, TagId(2));

    let err = api.add_tag("games").send_native().await.unwrap_err();
    assert_eq!(err.user_message("Failed to create tag"), "Tag already exists");
}

#[test(tokio::test)]
async fn test_auth_me() {
    let (anonymous, _) = new_api(None);
    let err = anonymous.get_me().send_native().await.unwrap_err();
    assert!(err.is_unauthorized());

    let (api, _) = new_api(None);
    let user = api.get_me().send_native_with_token("secret").await.unwrap();
    assert_eq!(user.username, "maker");
    assert!(user.is_admin);
}

#[test(tokio::test)]
async fn test_follow_user() {
    let (api, recorded) = new_api(Some("secret"));
    api.follow_user(UserId(3)).send_native().await.unwrap();
    assert_eq!(recorded.last_query(), "POST 3");
    api.unfollow_user(UserId(3)).send_native().await.unwrap();
    assert_eq!(recorded.last_query(), "DELETE 3");

    let following = api.get_follow_status(UserId(3)).send_native().await.unwrap();
    assert!(following.is_following);
    let other = api.get_follow_status(UserId(4)).send_native().await.unwrap();
    assert!(!other.is_following);
}

#[test(tokio::test)]
async fn test_update_item_sends_partial_body() {
    let (api, recorded) = new_api(Some("secret"));
    let update = ItemUpdate {
        title: Some("Robot chef 2".to_string()),
        status: Some(ItemStatus::Wip),
        ..Default::default()
    };
    let updated = api
        .update_item(FeedKind::Apps, ItemId(7), &update)
        .send_native()
        .await
        .unwrap();
    assert_eq!(updated.display_title(), "Robot chef 2");
    assert_eq!(updated.status, ItemStatus::Wip);
    let sent = serde_json::from_str::<Value>(&recorded.bodies()[0]).unwrap();
    assert_eq!(sent, json!({"title": "Robot chef 2", "status": "WIP"}));
}

#[test(tokio::test)]
async fn test_media_upload_flow() {
    let (api, recorded) = new_api(Some("secret"));
    let upload = api
        .get_presigned_upload("shot.png", "image/png")
        .send_native()
        .await
        .unwrap();
    assert_eq!(upload.file_key, "shot.png");
    assert!(upload.upload_url.ends_with("/storage/shot.png"));

    api.upload_media(&upload, "image/png", vec![1, 2, 3, 4])
        .send_native()
        .await
        .unwrap();
    assert_eq!(recorded.bodies(), vec!["shot.png image/png 4".to_string()]);
    assert_eq!(recorded.last_auth(), "");

    let media = api
        .add_item_media(FeedKind::Apps, ItemId(7), upload.download_url.clone())
        .send_native()
        .await
        .unwrap();
    assert_eq!(media.id, MediaId(8));
    assert_eq!(media.media_url, "https://cdn.example.com/shot.png");

    api.delete_item_media(FeedKind::Apps, ItemId(7), MediaId(8))
        .send_native()
        .await
        .unwrap();
    assert_eq!(recorded.last_query(), "7/8");
}

#[test(tokio::test)]
async fn test_add_feedback() {
    let (api, recorded) = new_api(Some("secret"));
    let feedback = Feedback {
        kind: FeedbackKind::Bug,
        message: "search ignores tools".to_string(),
    };
    api.add_feedback(&feedback).send_native().await.unwrap();
    let sent = serde_json::from_str::<Value>(&recorded.bodies()[0]).unwrap();
    assert_eq!(sent, json!({"type": "bug", "message": "search ignores tools"}));

    let err = api
        .add_feedback(&Feedback {
            kind: FeedbackKind::default(),
            message: String::new(),
        })
        .send_native()
        .await
        .unwrap_err();
    assert_eq!(err.user_message("Failed to send feedback"), "Message is required");
}

#[test(tokio::test)]
async fn test_get_user() {
    let (api, _) = new_api(None);
    let user = api.get_user(UserId(3)).send_native().await.unwrap();
    assert_eq!(user.username, "builder");
    assert_eq!(user.bio.as_deref(), Some("makes robots"));
    assert!(!user.is_admin);

    let err = api.get_user(UserId(4)).send_native().await.unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_extract_detail() {
    assert_eq!(extract_detail(br#"{"detail":"nope"}"#), Some("nope".to_string()));
    assert_eq!(extract_detail(br#"{"detail":[]}"#), None);
    assert_eq!(extract_detail(b"<html>"), None);
    assert_eq!(
        ApiErr::Send("offline".to_string()).user_message("Failed to load"),
        "Failed to load"
    );
}
