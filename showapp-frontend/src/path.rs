use std::fmt::Display;

use showapp_shared::{
    feed::FeedQuery,
    model::{FeedKind, UserId},
};

pub const PATH_HOME: &str = "/";
pub const PATH_DREAMS: &str = "/dreams";
pub const PATH_SUBMIT: &str = "/submit";
pub const PATH_ADMIN: &str = "/admin";
pub const PATH_LOGIN: &str = "/login";

pub fn link_feed_root(kind: FeedKind) -> &'static str {
    match kind {
        FeedKind::Apps => PATH_HOME,
        FeedKind::Dreams => PATH_DREAMS,
    }
}

pub fn link_feed(kind: FeedKind, query: &FeedQuery) -> String {
    let root = link_feed_root(kind);
    let query = query.to_query_string();
    if query.is_empty() {
        root.to_string()
    } else {
        format!("{root}?{query}")
    }
}

pub fn link_item(kind: FeedKind, key: impl Display) -> String {
    format!("{}/{key}", kind.path())
}

pub fn link_item_edit(kind: FeedKind, key: impl Display) -> String {
    format!("{}/{key}/edit", kind.path())
}

pub fn link_user(id: UserId) -> String {
    format!("/users/{id}")
}

#[cfg(test)]
mod path_tests {
    use crate::path::{link_feed, link_item, link_item_edit, link_user};
    use pretty_assertions::assert_eq;
    use showapp_shared::{
        feed::{FeedFilter, FeedQuery},
        model::{FeedKind, SortBy, ToolId, UserId},
    };
    use test_log::test;

    #[test]
    fn test_links() {
        assert_eq!(link_feed(FeedKind::Apps, &FeedQuery::default()), "/");
        let query = FeedQuery::default()
            .with_filter_toggled(FeedFilter::Tool(ToolId(3)))
            .with_sort(SortBy::Likes);
        assert_eq!(
            link_feed(FeedKind::Dreams, &query),
            "/dreams?tool_id=3&sort_by=likes"
        );
        assert_eq!(link_item(FeedKind::Apps, "robot-chef"), "/apps/robot-chef");
        assert_eq!(link_item_edit(FeedKind::Dreams, "moon-base"), "/dreams/moon-base/edit");
        assert_eq!(link_user(UserId(3)), "/users/3");
    }
}
