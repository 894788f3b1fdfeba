use jiff::Timestamp;
use showapp_shared::comment::{ThreadRow, VoteValue};
use showapp_shared::model::{FeedItem, OwnershipClaim, TagWithCount, ToolWithCount};
use showapp_shared::time::format_relative;

pub fn feed_line(item: &FeedItem, now: Timestamp) -> String {
    let liked = if item.is_liked { "♥" } else { "♡" };
    format!(
        "#{:<6} {} {:<4} 💬{:<4} {} by {} ({}, {})",
        item.id,
        liked,
        item.likes_count,
        item.comments_count,
        item.display_title(),
        item.creator_name(),
        item.status,
        format_relative(item.created_at, now)
    )
}

/// Two spaces per indent level, collapsed rows show how many replies they hide.
pub fn comment_line(row: &ThreadRow, now: Timestamp) -> String {
    let pad = "  ".repeat(row.indent);
    let vote = match row.comment.user_vote {
        Some(VoteValue::Up) => "▲",
        Some(VoteValue::Down) => "▼",
        Some(VoteValue::Neutral) | None => " ",
    };
    let hidden = if row.collapsed && row.descendants > 0 {
        format!(" [+{} hidden]", row.descendants)
    } else {
        String::new()
    };
    format!(
        "{pad}{vote}{:>3} #{} {} {}: {}{hidden}",
        row.comment.score,
        row.comment.id,
        row.comment.author_name(),
        format_relative(row.comment.created_at, now),
        row.comment.content.replace('\n', " ")
    )
}

pub fn claim_line(claim: &OwnershipClaim, now: Timestamp) -> String {
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
    format!(
        "#{} {claimant} claims \"{app}\" ({}) {}",
        claim.id,
        format_relative(claim.created_at, now),
        claim.message.as_deref().unwrap_or_default()
    )
}

pub fn tag_line(tag: &TagWithCount) -> String {
    format!("#{:<4} {} ({} apps)", tag.id, tag.name, tag.app_count)
}

pub fn tool_line(tool: &ToolWithCount) -> String {
    format!("#{:<4} {} ({} apps)", tool.id, tool.name, tool.app_count)
}

#[cfg(test)]
mod render_tests {
    use std::collections::HashSet;

    use jiff::Timestamp;
    use pretty_assertions::assert_eq;
    use showapp_shared::comment::{CommentTree, VoteValue};
    use showapp_shared::model::{Comment, CommentAuthor, CommentId, UserId};
    use test_log::test;

    use crate::render::comment_line;

    fn comment(id: i64, parent: Option<i64>, content: &str) -> Comment {
        Comment {
            id: CommentId(id),
            app_id: None,
            user_id: UserId(1),
            content: content.to_string(),
            created_at: Timestamp::from_second(0).unwrap(),
            score: 2,
            parent_id: parent.map(CommentId),
            user_vote: None,
            user: Some(CommentAuthor {
                id: UserId(1),
                username: "ada".to_string(),
                avatar: None,
            }),
        }
    }

    #[test]
    fn test_comment_lines_indent_and_collapse() {
        let now = Timestamp::from_second(30).unwrap();
        let mut reply = comment(2, Some(1), "second\nline");
        reply.user_vote = Some(VoteValue::Up);
        let comments = vec![comment(1, None, "first"), reply, comment(3, Some(2), "third")];
        let tree = CommentTree::build(&comments);

        let lines = tree
            .rows(&HashSet::new())
            .iter()
            .map(|row| comment_line(row, now))
            .collect::<Vec<String>>();
        assert_eq!(
            lines,
            vec![
                "   2 #1 ada just now: first".to_string(),
                "  ▲  2 #2 ada just now: second line".to_string(),
                "       2 #3 ada just now: third".to_string(),
            ]
        );

        let collapsed = HashSet::from([CommentId(1)]);
        let lines = tree
            .rows(&collapsed)
            .iter()
            .map(|row| comment_line(row, now))
            .collect::<Vec<String>>();
        assert_eq!(lines, vec!["   2 #1 ada just now: first [+2 hidden]".to_string()]);
    }
}
