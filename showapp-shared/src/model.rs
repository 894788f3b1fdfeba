use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIs, EnumIter, EnumString};

use crate::comment::VoteValue;

macro_rules! id_type {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub i64);

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    self.0.fmt(f)
                }
            }

            impl std::str::FromStr for $name {
                type Err = std::num::ParseIntError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    s.trim().parse::<i64>().map(Self)
                }
            }

            impl From<i64> for $name {
                fn from(value: i64) -> Self {
                    Self(value)
                }
            }
        )*
    };
}

id_type!(
    ItemId, CommentId, UserId, TagId, ToolId, MediaId, ClaimId, ReportId
);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
    EnumIs,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    #[default]
    Apps,
    Dreams,
}

impl FeedKind {
    /// Collection segment of the REST path, `/apps` or `/dreams`.
    pub fn path(&self) -> &'static str {
        match self {
            FeedKind::Apps => "/apps",
            FeedKind::Dreams => "/dreams",
        }
    }

    pub fn singular(&self) -> &'static str {
        match self {
            FeedKind::Apps => "app",
            FeedKind::Dreams => "dream",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
    EnumIs,
    Serialize,
    Deserialize,
)]
pub enum ItemStatus {
    #[default]
    Concept,
    #[strum(serialize = "WIP")]
    #[serde(rename = "WIP")]
    Wip,
    Live,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
    EnumIs,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Trending,
    Newest,
    TopRated,
    Likes,
}

impl SortBy {
    pub fn label(&self) -> &'static str {
        match self {
            SortBy::Trending => "Trending",
            SortBy::Newest => "Newest",
            SortBy::TopRated => "Top rated",
            SortBy::Likes => "Most liked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub id: MediaId,
    pub media_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tool {
    pub id: ToolId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagWithCount {
    pub id: TagId,
    pub name: String,
    #[serde(default)]
    pub app_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolWithCount {
    pub id: ToolId,
    pub name: String,
    #[serde(default)]
    pub app_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LikeState {
    pub liked: bool,
    pub count: i64,
}

impl LikeState {
    pub fn toggled(&self) -> Self {
        if self.liked {
            Self {
                liked: false,
                count: (self.count - 1).max(0),
            }
        } else {
            Self {
                liked: true,
                count: self.count + 1,
            }
        }
    }
}

/// An app or a dream as returned by the feed and detail endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: ItemId,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub prompt_text: Option<String>,
    #[serde(default)]
    pub prd_text: Option<String>,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub app_url: Option<String>,
    #[serde(default)]
    pub youtube_url: Option<String>,
    #[serde(default)]
    pub is_agent_submitted: bool,
    pub creator_id: UserId,
    #[serde(default)]
    pub creator: Option<Creator>,
    #[serde(with = "crate::time::lenient")]
    pub created_at: Timestamp,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub tools: Vec<Tool>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub comments_count: i64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_owner: bool,
}

impl FeedItem {
    pub fn like_state(&self) -> LikeState {
        LikeState {
            liked: self.is_liked,
            count: self.likes_count,
        }
    }

    pub fn set_like_state(&mut self, state: LikeState) {
        self.is_liked = state.liked;
        self.likes_count = state.count;
    }

    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or("Untitled")
    }

    pub fn creator_name(&self) -> &str {
        self.creator
            .as_ref()
            .map(|creator| creator.username.as_str())
            .unwrap_or("Anonymous")
    }

    /// Slug when the backend provides one, the numeric id otherwise.
    pub fn route_key(&self) -> String {
        if self.slug.is_empty() {
            self.id.to_string()
        } else {
            self.slug.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemCreate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prd_text: Option<String>,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    pub is_agent_submitted: bool,
    pub tag_ids: Vec<TagId>,
    pub tool_ids: Vec<ToolId>,
}

/// Partial update, only the present fields are sent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prd_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<TagId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_ids: Option<Vec<ToolId>>,
}

impl ItemUpdate {
    /// Fields of `edited` that differ from `original`, a cleared text field is sent empty.
    pub fn changes(original: &FeedItem, edited: &ItemCreate) -> Self {
        fn text(old: &Option<String>, new: &Option<String>) -> Option<String> {
            (old != new).then(|| new.clone().unwrap_or_default())
        }
        fn ids<T: Ord + Copy>(old: impl Iterator<Item = T>, new: &[T]) -> Option<Vec<T>> {
            let mut old = old.collect::<Vec<T>>();
            let mut sorted = new.to_vec();
            old.sort();
            sorted.sort();
            (old != sorted).then(|| new.to_vec())
        }

        Self {
            title: (original.title.as_deref() != Some(edited.title.as_str()))
                .then(|| edited.title.clone()),
            prompt_text: text(&original.prompt_text, &edited.prompt_text),
            prd_text: text(&original.prd_text, &edited.prd_text),
            status: (original.status != edited.status).then_some(edited.status),
            app_url: text(&original.app_url, &edited.app_url),
            youtube_url: text(&original.youtube_url, &edited.youtube_url),
            tag_ids: ids(original.tags.iter().map(|tag| tag.id), &edited.tag_ids),
            tool_ids: ids(original.tools.iter().map(|tool| tool.id), &edited.tool_ids),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    #[serde(default, alias = "dream_id")]
    pub app_id: Option<ItemId>,
    pub user_id: UserId,
    pub content: String,
    #[serde(with = "crate::time::lenient")]
    pub created_at: Timestamp,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub parent_id: Option<CommentId>,
    #[serde(default)]
    pub user_vote: Option<VoteValue>,
    #[serde(default)]
    pub user: Option<CommentAuthor>,
}

impl Comment {
    pub fn author_name(&self) -> &str {
        self.user
            .as_ref()
            .map(|user| user.username.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("Anonymous")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentCreate {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
    EnumIs,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimApp {
    pub id: ItemId,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipClaim {
    pub id: ClaimId,
    pub app_id: ItemId,
    pub claimant_id: UserId,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: ClaimStatus,
    #[serde(with = "crate::time::lenient")]
    pub created_at: Timestamp,
    #[serde(default, with = "crate::time::lenient_opt")]
    pub resolved_at: Option<Timestamp>,
    #[serde(default)]
    pub claimant: Option<Creator>,
    #[serde(default)]
    pub app: Option<ClaimApp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadReport {
    pub id: ReportId,
    pub app_id: ItemId,
    pub reporter_id: UserId,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub status: ClaimStatus,
    #[serde(with = "crate::time::lenient")]
    pub created_at: Timestamp,
    #[serde(default, with = "crate::time::lenient_opt")]
    pub resolved_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadReportCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadReportResolve {
    pub status: ClaimStatus,
    pub mark_as_dead: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub reputation_score: Option<i64>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FollowStatus {
    pub is_following: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignedUpload {
    pub upload_url: String,
    pub download_url: String,
    pub file_key: String,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Bug,
    #[default]
    Feature,
    Other,
}

impl FeedbackKind {
    pub fn label(&self) -> &'static str {
        match self {
            FeedbackKind::Bug => "Bug report",
            FeedbackKind::Feature => "Feature request",
            FeedbackKind::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub message: String,
}
