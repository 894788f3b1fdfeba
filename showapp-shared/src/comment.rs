use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{trace, warn};

use crate::{
    model::{Comment, CommentId},
    optimistic::Optimistic,
};

/// Rows deeper than this keep the same indentation.
pub const MAX_INDENT_DEPTH: usize = 5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VoteValueErr {
    #[error("vote value must be -1, 0 or 1, got {0}")]
    OutOfRange(i8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum VoteValue {
    Down,
    #[default]
    Neutral,
    Up,
}

impl VoteValue {
    pub fn as_i64(&self) -> i64 {
        i8::from(*self) as i64
    }
}

impl TryFrom<i8> for VoteValue {
    type Error = VoteValueErr;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(VoteValue::Down),
            0 => Ok(VoteValue::Neutral),
            1 => Ok(VoteValue::Up),
            value => Err(VoteValueErr::OutOfRange(value)),
        }
    }
}

impl From<VoteValue> for i8 {
    fn from(value: VoteValue) -> Self {
        match value {
            VoteValue::Down => -1,
            VoteValue::Neutral => 0,
            VoteValue::Up => 1,
        }
    }
}

impl std::fmt::Display for VoteValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        i8::from(*self).fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteState {
    pub vote: VoteValue,
    pub score: i64,
}

impl VoteState {
    pub fn from_comment(comment: &Comment) -> Self {
        Self {
            vote: comment.user_vote.unwrap_or_default(),
            score: comment.score,
        }
    }

    /// Voting the same way twice clears the vote.
    pub fn toggle(&self, requested: VoteValue) -> Optimistic<VoteState> {
        let vote = if requested == self.vote {
            VoteValue::Neutral
        } else {
            requested
        };
        let score = self.score + vote.as_i64() - self.vote.as_i64();

        Optimistic::new(*self, VoteState { vote, score })
    }
}

/// Votes cast locally, layered over the server copy of a thread.
///
/// Rows come and go as replies are collapsed, the overlay outlives them so a
/// remounted row shows the vote the user already cast.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VoteOverlay {
    votes: HashMap<CommentId, VoteState>,
}

impl VoteOverlay {
    pub fn state(&self, comment: &Comment) -> VoteState {
        self.votes
            .get(&comment.id)
            .copied()
            .unwrap_or_else(|| VoteState::from_comment(comment))
    }

    pub fn vote(&mut self, comment: &Comment, requested: VoteValue) -> Optimistic<VoteState> {
        let change = self.state(comment).toggle(requested);
        self.votes.insert(comment.id, change.requested);
        change
    }

    pub fn revert(&mut self, id: CommentId, change: &Optimistic<VoteState>) {
        self.votes.insert(id, change.previous);
    }

    /// Fresh server data replaces every local vote.
    pub fn clear(&mut self) {
        self.votes.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub comment: Comment,
    pub children: Vec<usize>,
}

/// One visible line of a flattened thread.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadRow {
    pub comment: Comment,
    pub depth: usize,
    pub indent: usize,
    pub collapsed: bool,
    pub descendants: usize,
    pub has_children: bool,
}

/// The parts of a row that change when the thread is collapsed or expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowLayout {
    pub indent: usize,
    pub collapsed: bool,
    pub descendants: usize,
    pub has_children: bool,
}

impl ThreadRow {
    pub fn layout(&self) -> RowLayout {
        RowLayout {
            indent: self.indent,
            collapsed: self.collapsed,
            descendants: self.descendants,
            has_children: self.has_children,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommentTree {
    nodes: Vec<CommentNode>,
    roots: Vec<usize>,
    index: HashMap<CommentId, usize>,
    descendants: Vec<usize>,
}

impl CommentTree {
    /// Links a flat, server ordered comment list into a forest.
    ///
    /// Sibling order follows the input order. Comments whose parent is missing
    /// become roots, a self reference counts as missing, and any parent cycle is
    /// cut at its first member in input order so every comment stays reachable.
    pub fn build(comments: &[Comment]) -> Self {
        let mut nodes = Vec::with_capacity(comments.len());
        let mut index = HashMap::with_capacity(comments.len());
        for comment in comments {
            if index.contains_key(&comment.id) {
                warn!("duplicate comment {} ignored", comment.id);
                continue;
            }
            index.insert(comment.id, nodes.len());
            nodes.push(CommentNode {
                comment: comment.clone(),
                children: Vec::new(),
            });
        }

        let mut parents = nodes
            .iter()
            .map(|node| {
                node.comment
                    .parent_id
                    .filter(|parent_id| *parent_id != node.comment.id)
                    .and_then(|parent_id| index.get(&parent_id).copied())
            })
            .collect::<Vec<Option<usize>>>();

        link(&mut nodes, &parents);
        let mut reachable = vec![false; nodes.len()];
        for root in (0..nodes.len()).filter(|i| parents[*i].is_none()) {
            mark_reachable(&nodes, root, &mut reachable);
        }
        let mut cut = false;
        for i in 0..nodes.len() {
            if reachable[i] {
                continue;
            }
            let Some(first) = cycle_start(&parents, i) else {
                continue;
            };
            trace!("breaking comment cycle at {}", nodes[first].comment.id);
            parents[first] = None;
            cut = true;
            mark_reachable(&nodes, first, &mut reachable);
        }
        if cut {
            link(&mut nodes, &parents);
        }

        let roots = (0..nodes.len())
            .filter(|i| parents[*i].is_none())
            .collect::<Vec<usize>>();
        let descendants = count_descendants(&nodes, &roots);

        Self {
            nodes,
            roots,
            index,
            descendants,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> impl Iterator<Item = &CommentNode> {
        self.roots.iter().map(|i| &self.nodes[*i])
    }

    pub fn get(&self, id: CommentId) -> Option<&CommentNode> {
        self.index.get(&id).map(|i| &self.nodes[*i])
    }

    pub fn children(&self, id: CommentId) -> impl Iterator<Item = &CommentNode> {
        self.get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|i| &self.nodes[*i])
    }

    pub fn descendant_count(&self, id: CommentId) -> usize {
        self.index
            .get(&id)
            .map(|i| self.descendants[*i])
            .unwrap_or_default()
    }

    /// Pre-order walk, collapsed comments keep their own row but hide their replies.
    pub fn rows(&self, collapsed: &HashSet<CommentId>) -> Vec<ThreadRow> {
        let mut rows = Vec::with_capacity(self.nodes.len());
        let mut stack = self
            .roots
            .iter()
            .rev()
            .map(|i| (*i, 0_usize))
            .collect::<Vec<(usize, usize)>>();

        while let Some((i, depth)) = stack.pop() {
            let node = &self.nodes[i];
            let is_collapsed = collapsed.contains(&node.comment.id);
            rows.push(ThreadRow {
                comment: node.comment.clone(),
                depth,
                indent: depth.min(MAX_INDENT_DEPTH),
                collapsed: is_collapsed,
                descendants: self.descendants[i],
                has_children: !node.children.is_empty(),
            });
            if !is_collapsed {
                stack.extend(node.children.iter().rev().map(|child| (*child, depth + 1)));
            }
        }

        rows
    }
}

fn link(nodes: &mut [CommentNode], parents: &[Option<usize>]) {
    for node in nodes.iter_mut() {
        node.children.clear();
    }
    for (i, parent) in parents.iter().enumerate() {
        if let Some(parent) = parent {
            nodes[*parent].children.push(i);
        }
    }
}

fn mark_reachable(nodes: &[CommentNode], start: usize, reachable: &mut [bool]) {
    let mut stack = vec![start];
    while let Some(i) = stack.pop() {
        if reachable[i] {
            continue;
        }
        reachable[i] = true;
        stack.extend(nodes[i].children.iter().copied());
    }
}

/// Walks up from an unreachable node and returns the lowest input index on the
/// cycle the walk ends in.
fn cycle_start(parents: &[Option<usize>], from: usize) -> Option<usize> {
    let mut position = HashMap::new();
    let mut path = Vec::new();
    let mut current = from;
    loop {
        if let Some(start) = position.get(&current) {
            return path[*start..].iter().copied().min();
        }
        position.insert(current, path.len());
        path.push(current);
        current = parents[current]?;
    }
}

fn count_descendants(nodes: &[CommentNode], roots: &[usize]) -> Vec<usize> {
    let mut order = Vec::with_capacity(nodes.len());
    let mut stack = roots.to_vec();
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(nodes[i].children.iter().copied());
    }

    let mut counts = vec![0_usize; nodes.len()];
    for i in order.into_iter().rev() {
        counts[i] = nodes[i]
            .children
            .iter()
            .map(|child| counts[*child] + 1)
            .sum();
    }
    counts
}

#[cfg(test)]
mod comment_tests {
    use std::collections::HashSet;

    use crate::comment::{
        CommentTree, MAX_INDENT_DEPTH, RowLayout, VoteOverlay, VoteState, VoteValue,
    };
    use crate::model::{Comment, CommentId, UserId};
    use pretty_assertions::assert_eq;
    use test_log::test;

    fn comment(id: i64, parent_id: Option<i64>) -> Comment {
        Comment {
            id: CommentId(id),
            app_id: None,
            user_id: UserId(1),
            content: format!("comment {id}"),
            created_at: "2024-01-05T10:00:00Z".parse().unwrap(),
            score: 0,
            parent_id: parent_id.map(CommentId),
            user_vote: None,
            user: None,
        }
    }

    fn ids<'a>(nodes: impl Iterator<Item = &'a crate::comment::CommentNode>) -> Vec<i64> {
        nodes.map(|node| node.comment.id.0).collect()
    }

    fn row_ids(tree: &CommentTree, collapsed: &HashSet<CommentId>) -> Vec<(i64, usize)> {
        tree.rows(collapsed)
            .into_iter()
            .map(|row| (row.comment.id.0, row.depth))
            .collect()
    }

    #[test]
    fn test_build_links_and_keeps_orphans() {
        let comments = vec![comment(1, None), comment(2, Some(1)), comment(3, Some(99))];
        let tree = CommentTree::build(&comments);

        assert_eq!(ids(tree.roots()), vec![1, 3]);
        assert_eq!(ids(tree.children(CommentId(1))), vec![2]);
        assert_eq!(ids(tree.children(CommentId(3))), Vec::<i64>::new());
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_build_is_idempotent() {
        let comments = vec![
            comment(5, None),
            comment(4, Some(5)),
            comment(3, Some(5)),
            comment(2, Some(4)),
            comment(1, Some(42)),
        ];
        let first = CommentTree::build(&comments);
        let second = CommentTree::build(&comments);
        assert_eq!(first, second);
        assert_eq!(ids(first.children(CommentId(5))), vec![4, 3]);
        assert_eq!(
            row_ids(&first, &HashSet::new()),
            vec![(5, 0), (4, 1), (2, 2), (3, 1), (1, 0)]
        );
    }

    #[test]
    fn test_build_breaks_cycles() {
        let comments = vec![
            comment(1, Some(2)),
            comment(2, Some(1)),
            comment(3, Some(3)),
            comment(4, Some(2)),
        ];
        let tree = CommentTree::build(&comments);

        assert_eq!(ids(tree.roots()), vec![1, 3]);
        assert_eq!(ids(tree.children(CommentId(1))), vec![2]);
        assert_eq!(ids(tree.children(CommentId(2))), vec![4]);
        assert_eq!(tree.rows(&HashSet::new()).len(), 4);
    }

    #[test]
    fn test_build_keeps_present_parent_outside_cycle() {
        let comments = vec![comment(4, Some(2)), comment(1, Some(2)), comment(2, Some(1))];
        let tree = CommentTree::build(&comments);

        assert_eq!(ids(tree.roots()), vec![1]);
        assert_eq!(ids(tree.children(CommentId(1))), vec![2]);
        assert_eq!(ids(tree.children(CommentId(2))), vec![4]);
        assert_eq!(tree.descendant_count(CommentId(1)), 2);
        assert_eq!(
            row_ids(&tree, &HashSet::new()),
            vec![(1, 0), (2, 1), (4, 2)]
        );
    }

    #[test]
    fn test_build_ignores_duplicate_ids() {
        let mut duplicate = comment(1, None);
        duplicate.content = "second copy".to_string();
        let tree = CommentTree::build(&[comment(1, None), duplicate]);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(CommentId(1)).unwrap().comment.content, "comment 1");
    }

    #[test]
    fn test_rows_collapse_and_counts() {
        let comments = vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, Some(2)),
            comment(4, Some(1)),
            comment(5, None),
        ];
        let tree = CommentTree::build(&comments);
        assert_eq!(tree.descendant_count(CommentId(1)), 3);
        assert_eq!(tree.descendant_count(CommentId(2)), 1);
        assert_eq!(tree.descendant_count(CommentId(5)), 0);
        assert_eq!(tree.descendant_count(CommentId(77)), 0);

        let collapsed = HashSet::from([CommentId(2)]);
        assert_eq!(row_ids(&tree, &collapsed), vec![(1, 0), (2, 1), (4, 1), (5, 0)]);

        let collapsed = HashSet::from([CommentId(1)]);
        let rows = tree.rows(&collapsed);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].collapsed);
        assert_eq!(rows[0].descendants, 3);
    }

    #[test]
    fn test_rows_cap_indent_on_deep_threads() {
        let mut comments = vec![comment(0, None)];
        comments.extend((1..20_000).map(|id| comment(id, Some(id - 1))));
        let tree = CommentTree::build(&comments);
        let rows = tree.rows(&HashSet::new());

        assert_eq!(rows.len(), 20_000);
        assert_eq!(rows[3].indent, 3);
        assert_eq!(rows[MAX_INDENT_DEPTH].indent, MAX_INDENT_DEPTH);
        assert_eq!(rows[19_999].depth, 19_999);
        assert_eq!(rows[19_999].indent, MAX_INDENT_DEPTH);
        assert_eq!(tree.descendant_count(CommentId(0)), 19_999);
    }

    #[test]
    fn test_vote_toggle() {
        let start = VoteState {
            vote: VoteValue::Neutral,
            score: 7,
        };

        let up = start.toggle(VoteValue::Up);
        assert_eq!(up.previous, start);
        assert_eq!(
            up.requested,
            VoteState {
                vote: VoteValue::Up,
                score: 8
            }
        );

        let again = up.requested.toggle(VoteValue::Up);
        assert_eq!(again.requested, start);

        let down = up.requested.toggle(VoteValue::Down);
        assert_eq!(
            down.requested,
            VoteState {
                vote: VoteValue::Down,
                score: 6
            }
        );
        assert_eq!(down.previous, up.requested);
    }

    #[test]
    fn test_vote_overlay_survives_collapse() {
        let mut reply = comment(2, Some(1));
        reply.score = 4;
        let comments = vec![comment(1, None), reply.clone()];
        let tree = CommentTree::build(&comments);
        let mut overlay = VoteOverlay::default();

        assert_eq!(overlay.state(&reply), VoteState::from_comment(&reply));
        let change = overlay.vote(&reply, VoteValue::Up);
        assert_eq!(change.requested.score, 5);

        let collapsed = HashSet::from([CommentId(1)]);
        assert_eq!(tree.rows(&collapsed).len(), 1);
        let rows = tree.rows(&HashSet::new());
        assert_eq!(
            overlay.state(&rows[1].comment),
            VoteState {
                vote: VoteValue::Up,
                score: 5
            }
        );

        overlay.revert(reply.id, &change);
        assert_eq!(overlay.state(&reply).score, 4);

        overlay.vote(&reply, VoteValue::Down);
        overlay.clear();
        assert_eq!(overlay.state(&reply), VoteState::from_comment(&reply));
    }

    #[test]
    fn test_row_layout_follows_collapse() {
        let comments = vec![comment(1, None), comment(2, Some(1)), comment(3, Some(2))];
        let tree = CommentTree::build(&comments);

        let open = tree.rows(&HashSet::new());
        let closed = tree.rows(&HashSet::from([CommentId(1)]));
        assert_eq!(open[0].comment, closed[0].comment);
        assert_eq!(
            open[0].layout(),
            RowLayout {
                indent: 0,
                collapsed: false,
                descendants: 2,
                has_children: true,
            }
        );
        assert_eq!(
            closed[0].layout(),
            RowLayout {
                indent: 0,
                collapsed: true,
                descendants: 2,
                has_children: true,
            }
        );
        assert_eq!(open[2].layout().indent, 2);
    }

    #[test]
    fn test_vote_value_wire_format() {
        assert_eq!(VoteValue::try_from(-1).unwrap(), VoteValue::Down);
        assert!(VoteValue::try_from(2).is_err());
        assert_eq!(VoteValue::Up.to_string(), "1");
        assert_eq!(serde_json::to_string(&VoteValue::Down).unwrap(), "-1");
    }
}
