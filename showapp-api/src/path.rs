use std::fmt::Display;

use showapp_shared::model::{ClaimId, CommentId, FeedKind, ItemId, MediaId, ReportId, UserId};

pub const PATH_TAGS: &str = "/tags/";
pub const PATH_TOOLS: &str = "/tools/";
pub const PATH_CLAIMS: &str = "/ownership-claims";
pub const PATH_DEAD_REPORTS_PENDING: &str = "/apps/dead-reports/pending";
pub const PATH_MEDIA_PRESIGNED: &str = "/media/presigned-url";
pub const PATH_AUTH_ME: &str = "/auth/me";
pub const PATH_FEEDBACK: &str = "/feedback/";

pub fn items(kind: FeedKind) -> String {
    format!("{}/", kind.path())
}

pub fn item(kind: FeedKind, key: impl Display) -> String {
    format!("{}/{key}", kind.path())
}

pub fn item_child(kind: FeedKind, id: ItemId, child: &str) -> String {
    format!("{}/{id}/{child}", kind.path())
}

pub fn item_media(kind: FeedKind, id: ItemId, media_id: MediaId) -> String {
    format!("{}/{id}/media/{media_id}", kind.path())
}

pub fn comment_child(id: CommentId, child: &str) -> String {
    format!("/comments/{id}/{child}")
}

pub fn claim_resolve(id: ClaimId) -> String {
    format!("{PATH_CLAIMS}/{id}/resolve")
}

pub fn dead_report_resolve(id: ReportId) -> String {
    format!("/apps/dead-reports/{id}/resolve")
}

pub fn catalog_with_counts(collection: &str) -> String {
    format!("{collection}with-counts")
}

pub fn catalog_entry(collection: &str, id: impl Display) -> String {
    format!("{collection}{id}")
}

pub fn user(id: UserId) -> String {
    format!("/users/{id}")
}

pub fn user_follow(id: UserId) -> String {
    format!("/users/{id}/follow")
}

pub fn user_follow_status(id: UserId) -> String {
    format!("/users/{id}/follow/status")
}

#[cfg(test)]
mod path_tests {
    use crate::path::{
        PATH_TAGS, catalog_entry, catalog_with_counts, claim_resolve, comment_child,
        dead_report_resolve, item, item_child, item_media, items, user_follow_status,
    };
    use pretty_assertions::assert_eq;
    use showapp_shared::model::{
        ClaimId, CommentId, FeedKind, ItemId, MediaId, ReportId, TagId, UserId,
    };
    use test_log::test;

    #[test]
    fn test_paths() {
        assert_eq!(items(FeedKind::Dreams), "/dreams/");
        assert_eq!(item(FeedKind::Apps, "robot-chef"), "/apps/robot-chef");
        assert_eq!(item_child(FeedKind::Apps, ItemId(4), "like"), "/apps/4/like");
        assert_eq!(catalog_with_counts(PATH_TAGS), "/tags/with-counts");
        assert_eq!(catalog_entry(PATH_TAGS, TagId(9)), "/tags/9");
        assert_eq!(item_child(FeedKind::Dreams, ItemId(2), "media"), "/dreams/2/media");
        assert_eq!(item_media(FeedKind::Apps, ItemId(4), MediaId(8)), "/apps/4/media/8");
        assert_eq!(comment_child(CommentId(3), "vote"), "/comments/3/vote");
        assert_eq!(claim_resolve(ClaimId(5)), "/ownership-claims/5/resolve");
        assert_eq!(dead_report_resolve(ReportId(6)), "/apps/dead-reports/6/resolve");
        assert_eq!(user_follow_status(UserId(1)), "/users/1/follow/status");
    }
}
