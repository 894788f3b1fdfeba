pub mod use_comment_reply;
pub mod use_comment_tree;
pub mod use_comment_vote;
pub mod use_feed;
pub mod use_follow;
pub mod use_item_like;
pub mod use_item_submit;
pub mod use_new_posts;
pub mod use_user_items;
