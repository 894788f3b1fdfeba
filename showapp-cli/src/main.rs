use std::collections::HashSet;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use clap::{ArgMatches, Command, arg};
use jiff::Timestamp;
use showapp_api::settings::Settings;
use showapp_api::{Api, ApiNative};
use showapp_shared::comment::{CommentTree, VoteValue};
use showapp_shared::feed::{FeedFilter, FeedQuery, FeedRequest};
use showapp_shared::model::{
    ClaimId, ClaimStatus, CommentId, FeedKind, ItemId, ItemStatus, SortBy, TagId, ToolId,
};
use tracing::{debug, info};

mod render;

fn command() -> Command {
    let kind = || arg!(--"kind" <KIND> "apps or dreams").default_value("apps");
    Command::new("showapp")
        .about("Show Your App command line client")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(arg!(--"token" <TOKEN> "access token, overrides the settings file"))
        .arg(arg!(--"url" <URL> "api base url, overrides the settings file"))
        .subcommand(
            Command::new("feed")
                .about("list a feed page")
                .arg(kind())
                .arg(arg!(--"tag" <IDS> "comma separated tag ids"))
                .arg(arg!(--"tool" <IDS> "comma separated tool ids"))
                .arg(arg!(--"status" <STATUSES> "comma separated: Concept, WIP, Live"))
                .arg(arg!(--"sort" <SORT> "trending, newest, top_rated or likes"))
                .arg(arg!(--"search" <TEXT>))
                .arg(arg!(--"page" <PAGE>).default_value("1")),
        )
        .subcommand(
            Command::new("comments")
                .about("print the comment thread of an item")
                .arg(kind())
                .arg(arg!(<ITEM> "item id"))
                .arg(arg!(--"collapse" <IDS> "comma separated comment ids to fold")),
        )
        .subcommand(
            Command::new("vote")
                .about("vote on a comment")
                .arg(arg!(<COMMENT> "comment id"))
                .arg(arg!(<VALUE> "up, down or clear").allow_hyphen_values(true)),
        )
        .subcommand(
            Command::new("like")
                .about("like an item")
                .arg(kind())
                .arg(arg!(<ITEM> "item id")),
        )
        .subcommand(
            Command::new("unlike")
                .about("remove a like from an item")
                .arg(kind())
                .arg(arg!(<ITEM> "item id")),
        )
        .subcommand(Command::new("claims").about("list pending ownership claims"))
        .subcommand(
            Command::new("resolve-claim")
                .about("approve or reject an ownership claim")
                .arg(arg!(<CLAIM> "claim id"))
                .arg(arg!(<STATUS> "approved or rejected")),
        )
        .subcommand(Command::new("tags").about("list tags with usage counts"))
        .subcommand(Command::new("tools").about("list tools with usage counts"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .event_format(
            tracing_subscriber::fmt::format()
                .with_file(true)
                .with_line_number(true),
        )
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .map_err(|err| anyhow!("failed to init logger: {err}"))?;

    let matches = command().get_matches();
    let mut settings = Settings::new_from_file().context("failed to read settings")?;
    if let Some(url) = matches.get_one::<String>("url") {
        settings.api.base_url = url.clone();
    }
    if let Some(token) = matches.get_one::<String>("token") {
        settings.api.token = Some(token.clone());
    }
    debug!("using api at {}", settings.api.base_url);
    let api = ApiNative::from_settings(&settings);
    let now = Timestamp::now();

    match matches.subcommand() {
        Some(("feed", sub)) => {
            let kind = parse_arg::<FeedKind>(sub, "kind")?;
            let page = parse_arg::<u32>(sub, "page")?.max(1);
            let query = feed_query(sub)?;
            let request = FeedRequest::new(query, page).with_limit(settings.feed.page_size);
            let feed = api.get_items(kind, &request).send_native().await?;
            if feed.items.is_empty() {
                info!("no {kind} on page {page}");
            }
            for item in &feed.items {
                println!("{}", render::feed_line(item, now));
            }
        }
        Some(("comments", sub)) => {
            let kind = parse_arg::<FeedKind>(sub, "kind")?;
            let item = parse_arg::<ItemId>(sub, "ITEM")?;
            let collapsed = parse_list::<CommentId>(sub, "collapse")?
                .into_iter()
                .collect::<HashSet<CommentId>>();
            let comments = api.get_comments(kind, item).send_native().await?;
            let tree = CommentTree::build(&comments);
            println!("{} comments", tree.len());
            for row in tree.rows(&collapsed) {
                println!("{}", render::comment_line(&row, now));
            }
        }
        Some(("vote", sub)) => {
            let comment = parse_arg::<CommentId>(sub, "COMMENT")?;
            let value = sub
                .get_one::<String>("VALUE")
                .map(|value| parse_vote(value))
                .transpose()?
                .unwrap_or_default();
            api.vote_comment(comment, value).send_native().await?;
            info!("voted {value} on comment {comment}");
        }
        Some(("like", sub)) => {
            let kind = parse_arg::<FeedKind>(sub, "kind")?;
            let item = parse_arg::<ItemId>(sub, "ITEM")?;
            api.add_item_like(kind, item).send_native().await?;
            info!("liked {kind} {item}");
        }
        Some(("unlike", sub)) => {
            let kind = parse_arg::<FeedKind>(sub, "kind")?;
            let item = parse_arg::<ItemId>(sub, "ITEM")?;
            api.delete_item_like(kind, item).send_native().await?;
            info!("unliked {kind} {item}");
        }
        Some(("claims", _)) => {
            let claims = api.get_pending_claims().send_native().await?;
            if claims.is_empty() {
                println!("no pending claims");
            }
            for claim in &claims {
                println!("{}", render::claim_line(claim, now));
            }
        }
        Some(("resolve-claim", sub)) => {
            let claim = parse_arg::<ClaimId>(sub, "CLAIM")?;
            let status = parse_arg::<ClaimStatus>(sub, "STATUS")?;
            if status == ClaimStatus::Pending {
                return Err(anyhow!("a claim can only be approved or rejected"));
            }
            let resolved = api.resolve_claim(claim, status).send_native().await?;
            println!("claim {} {}", resolved.id, resolved.status);
        }
        Some(("tags", _)) => {
            for tag in api.get_tags_with_counts().send_native().await? {
                println!("{}", render::tag_line(&tag));
            }
        }
        Some(("tools", _)) => {
            for tool in api.get_tools_with_counts().send_native().await? {
                println!("{}", render::tool_line(&tool));
            }
        }
        _ => return Err(anyhow!("unknown command")),
    }

    Ok(())
}

fn parse_arg<T>(matches: &ArgMatches, name: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = matches
        .get_one::<String>(name)
        .ok_or_else(|| anyhow!("missing argument {name}"))?;
    raw.trim()
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {name} \"{raw}\": {err}"))
}

fn parse_list<T>(matches: &ArgMatches, name: &str) -> anyhow::Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = matches.get_one::<String>(name) else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|err| anyhow!("invalid {name} \"{value}\": {err}"))
        })
        .collect()
}

fn parse_vote(raw: &str) -> anyhow::Result<VoteValue> {
    match raw.trim() {
        "up" | "+1" | "1" => Ok(VoteValue::Up),
        "down" | "-1" => Ok(VoteValue::Down),
        "clear" | "0" => Ok(VoteValue::Neutral),
        value => Err(anyhow!("invalid vote \"{value}\", expected up, down or clear")),
    }
}

fn feed_query(matches: &ArgMatches) -> anyhow::Result<FeedQuery> {
    let mut filters = Vec::new();
    filters.extend(parse_list::<TagId>(matches, "tag")?.into_iter().map(FeedFilter::Tag));
    filters.extend(parse_list::<ToolId>(matches, "tool")?.into_iter().map(FeedFilter::Tool));
    filters.extend(
        parse_list::<ItemStatus>(matches, "status")?
            .into_iter()
            .map(FeedFilter::Status),
    );
    let sort_by = match matches.get_one::<String>("sort") {
        Some(_) => parse_arg::<SortBy>(matches, "sort")?,
        None => SortBy::default(),
    };
    let search = matches
        .get_one::<String>("search")
        .map(|search| search.trim().to_string())
        .unwrap_or_default();

    Ok(FeedQuery {
        filters,
        sort_by,
        search,
    })
}

#[cfg(test)]
mod cli_tests {
    use pretty_assertions::assert_eq;
    use showapp_shared::comment::VoteValue;
    use showapp_shared::feed::FeedFilter;
    use showapp_shared::model::{ItemStatus, SortBy, TagId};
    use test_log::test;

    use crate::{command, feed_query, parse_vote};

    #[test]
    fn test_feed_args_build_query() {
        let matches = command().get_matches_from([
            "showapp", "feed", "--tag", "3, 1", "--status", "WIP", "--sort", "newest", "--search",
            " robot ",
        ]);
        let (_, sub) = matches.subcommand().unwrap();
        let query = feed_query(sub).unwrap();
        assert_eq!(
            query.filters,
            vec![
                FeedFilter::Tag(TagId(3)),
                FeedFilter::Tag(TagId(1)),
                FeedFilter::Status(ItemStatus::Wip),
            ]
        );
        assert_eq!(query.sort_by, SortBy::Newest);
        assert_eq!(query.search, "robot");
    }

    #[test]
    fn test_feed_args_reject_bad_ids() {
        let matches = command().get_matches_from(["showapp", "feed", "--tool", "rust"]);
        let (_, sub) = matches.subcommand().unwrap();
        assert!(feed_query(sub).is_err());
    }

    #[test]
    fn test_parse_vote() {
        assert_eq!(parse_vote("up").unwrap(), VoteValue::Up);
        assert_eq!(parse_vote("-1").unwrap(), VoteValue::Down);
        assert_eq!(parse_vote("clear").unwrap(), VoteValue::Neutral);
        assert!(parse_vote("2").is_err());
    }
}
