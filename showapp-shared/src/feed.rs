use std::{fmt::Display, str::FromStr};

use itertools::Itertools;
use tracing::{error, trace};
use url::form_urlencoded;

use crate::{
    model::{FeedItem, ItemId, ItemStatus, LikeState, SortBy, TagId, ToolId, UserId},
    optimistic::Optimistic,
};

pub const PAGE_SIZE: u32 = 20;

pub const PARAM_TAG: &str = "tag_id";
pub const PARAM_TOOL: &str = "tool_id";
pub const PARAM_STATUS: &str = "status";
pub const PARAM_SORT: &str = "sort_by";
pub const PARAM_SEARCH: &str = "search";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedFilter {
    Tag(TagId),
    Tool(ToolId),
    Status(ItemStatus),
}

/// Everything the feed url carries: filters, sort order and search text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedQuery {
    pub filters: Vec<FeedFilter>,
    pub sort_by: SortBy,
    pub search: String,
}

impl FeedQuery {
    /// Reads the comma separated url parameters, unknown values are skipped.
    pub fn from_params(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut filters = Vec::new();
        filters.extend(parse_list::<TagId>(get(PARAM_TAG)).map(FeedFilter::Tag));
        filters.extend(parse_list::<ToolId>(get(PARAM_TOOL)).map(FeedFilter::Tool));
        filters.extend(parse_list::<ItemStatus>(get(PARAM_STATUS)).map(FeedFilter::Status));
        let sort_by = get(PARAM_SORT)
            .and_then(|sort_by| SortBy::from_str(&sort_by).ok())
            .unwrap_or_default();
        let search = get(PARAM_SEARCH).unwrap_or_default();

        Self {
            filters,
            sort_by,
            search,
        }
    }

    pub fn from_query_string(query: impl AsRef<str>) -> Self {
        let pairs = form_urlencoded::parse(query.as_ref().trim_start_matches('?').as_bytes())
            .into_owned()
            .collect::<Vec<(String, String)>>();
        Self::from_params(|key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, value)| value.clone())
        })
    }

    pub fn tags(&self) -> impl Iterator<Item = TagId> + '_ {
        self.filters.iter().filter_map(|filter| match filter {
            FeedFilter::Tag(id) => Some(*id),
            _ => None,
        })
    }

    pub fn tools(&self) -> impl Iterator<Item = ToolId> + '_ {
        self.filters.iter().filter_map(|filter| match filter {
            FeedFilter::Tool(id) => Some(*id),
            _ => None,
        })
    }

    pub fn statuses(&self) -> impl Iterator<Item = ItemStatus> + '_ {
        self.filters.iter().filter_map(|filter| match filter {
            FeedFilter::Status(status) => Some(*status),
            _ => None,
        })
    }

    pub fn has_filter(&self, filter: &FeedFilter) -> bool {
        self.filters.contains(filter)
    }

    pub fn with_filter_toggled(&self, filter: FeedFilter) -> Self {
        let mut query = self.clone();
        if query.has_filter(&filter) {
            query.filters.retain(|current| *current != filter);
        } else {
            query.filters.push(filter);
        }
        query
    }

    pub fn with_sort(&self, sort_by: SortBy) -> Self {
        Self {
            sort_by,
            ..self.clone()
        }
    }

    pub fn with_search(&self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..self.clone()
        }
    }

    pub fn cleared(&self) -> Self {
        Self {
            sort_by: self.sort_by,
            ..Default::default()
        }
    }

    /// Url parameters in the feed page format, defaults are left out.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let search = self.search.trim();
        if !search.is_empty() {
            params.push((PARAM_SEARCH, search.to_string()));
        }
        for (key, value) in [
            (PARAM_TAG, self.tags().join(",")),
            (PARAM_TOOL, self.tools().join(",")),
            (PARAM_STATUS, self.statuses().join(",")),
        ] {
            if !value.is_empty() {
                params.push((key, value));
            }
        }
        if self.sort_by != SortBy::default() {
            params.push((PARAM_SORT, self.sort_by.to_string()));
        }
        params
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params())
            .finish()
    }

    pub fn canonical_key(&self) -> String {
        canonical_key(self.params())
    }
}

fn parse_list<T>(raw: Option<String>) -> impl Iterator<Item = T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .filter_map(|value| {
            T::from_str(value)
                .inspect_err(|err| trace!("skipping feed param {value}: {err}"))
                .ok()
        })
        .collect::<Vec<T>>()
        .into_iter()
}

/// Parameters sorted by key (stable) and url encoded, value order is kept.
pub fn canonical_key<K, V>(params: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut params = params
        .into_iter()
        .map(|(key, value)| (key.as_ref().to_string(), value.as_ref().to_string()))
        .collect::<Vec<(String, String)>>();
    params.sort_by(|a, b| a.0.cmp(&b.0));
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

pub fn canonical_key_from_query_string(query: impl AsRef<str>) -> String {
    canonical_key(form_urlencoded::parse(
        query.as_ref().trim_start_matches('?').as_bytes(),
    ))
}

/// One list request, `page` starts at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub query: FeedQuery,
    pub page: u32,
    pub limit: u32,
    pub creator_id: Option<UserId>,
    pub liked_by_user_id: Option<UserId>,
    pub include_dead: bool,
}

impl FeedRequest {
    pub fn new(query: FeedQuery, page: u32) -> Self {
        Self {
            query,
            page,
            limit: PAGE_SIZE,
            creator_id: None,
            liked_by_user_id: None,
            include_dead: false,
        }
    }

    pub fn with_limit(self, limit: u32) -> Self {
        Self { limit, ..self }
    }

    pub fn created_by(self, user_id: UserId) -> Self {
        Self {
            creator_id: Some(user_id),
            ..self
        }
    }

    pub fn liked_by(self, user_id: UserId) -> Self {
        Self {
            liked_by_user_id: Some(user_id),
            ..self
        }
    }

    pub fn skip(&self) -> u32 {
        self.page.saturating_sub(1) * self.limit
    }

    /// Backend parameters, list filters become repeated keys.
    pub fn api_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("skip", self.skip().to_string()),
            ("limit", self.limit.to_string()),
        ];
        params.extend(self.query.tags().map(|id| (PARAM_TAG, id.to_string())));
        params.extend(self.query.tools().map(|id| (PARAM_TOOL, id.to_string())));
        params.extend(
            self.query
                .statuses()
                .map(|status| (PARAM_STATUS, status.to_string())),
        );
        let search = self.query.search.trim();
        if !search.is_empty() {
            params.push((PARAM_SEARCH, search.to_string()));
        }
        params.push((PARAM_SORT, self.query.sort_by.to_string()));
        if let Some(creator_id) = self.creator_id {
            params.push(("creator_id", creator_id.to_string()));
        }
        if let Some(user_id) = self.liked_by_user_id {
            params.push(("liked_by_user_id", user_id.to_string()));
        }
        if self.include_dead {
            params.push(("include_dead", "true".to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedCacheEntry {
    pub items: Vec<FeedItem>,
    pub page: u32,
    pub has_more: bool,
    pub scroll_y: f64,
    pub key: String,
}

/// Single slot: saving replaces whatever was there.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedCache {
    slot: Option<FeedCacheEntry>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&mut self, entry: FeedCacheEntry) {
        trace!(
            "feed cache save: {} items, page {}, key \"{}\"",
            entry.items.len(),
            entry.page,
            entry.key
        );
        self.slot = Some(entry);
    }

    pub fn load(&self, key: &str) -> Option<FeedCacheEntry> {
        self.slot.as_ref().filter(|entry| entry.key == key).cloned()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}

/// Identifies a list request, responses from an older generation are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    pub query: FeedQuery,
    pub items: Vec<FeedItem>,
    pub page: u32,
    pub has_more: bool,
    pub loading: bool,
    pub limit: u32,
    generation: u64,
    scroll_restore: Option<f64>,
    mounted: bool,
}

impl FeedState {
    pub fn new(query: FeedQuery) -> Self {
        Self {
            query,
            items: Vec::new(),
            page: 1,
            has_more: true,
            loading: false,
            limit: PAGE_SIZE,
            generation: 0,
            scroll_restore: None,
            mounted: false,
        }
    }

    pub fn with_limit(self, limit: u32) -> Self {
        Self { limit, ..self }
    }

    /// Restores from a matching cache entry or asks for the first page.
    pub fn mount(&mut self, cached: Option<FeedCacheEntry>) -> Option<FetchTicket> {
        self.mounted = true;
        let key = self.query.canonical_key();
        match cached.filter(|entry| entry.key == key) {
            Some(entry) => {
                trace!("feed restored from cache \"{key}\"");
                self.items = entry.items;
                self.page = entry.page;
                self.has_more = entry.has_more;
                self.scroll_restore = Some(entry.scroll_y);
                None
            }
            None => self.begin(1),
        }
    }

    pub fn next_page(&mut self) -> Option<FetchTicket> {
        if !self.mounted || self.loading || !self.has_more {
            return None;
        }
        self.begin(self.page)
    }

    /// A no-op until mounted and when the query did not change.
    pub fn change_query(&mut self, query: FeedQuery) -> Option<FetchTicket> {
        if !self.mounted || query == self.query {
            return None;
        }
        self.query = query;
        self.restart()
    }

    pub fn refresh(&mut self) -> Option<FetchTicket> {
        if !self.mounted {
            return None;
        }
        self.restart()
    }

    fn restart(&mut self) -> Option<FetchTicket> {
        self.generation += 1;
        self.page = 1;
        self.has_more = true;
        self.scroll_restore = None;
        self.begin(1)
    }

    fn begin(&mut self, page: u32) -> Option<FetchTicket> {
        self.loading = true;
        Some(FetchTicket {
            generation: self.generation,
            page,
        })
    }

    pub fn request(&self, ticket: FetchTicket) -> FeedRequest {
        FeedRequest::new(self.query.clone(), ticket.page).with_limit(self.limit)
    }

    /// Returns false when the response belongs to an older query.
    pub fn apply<E: Display>(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<FeedItem>, E>,
    ) -> bool {
        if ticket.generation != self.generation {
            trace!(
                "dropping stale feed page {} from generation {}",
                ticket.page, ticket.generation
            );
            return false;
        }
        self.loading = false;
        match result {
            Ok(items) => {
                self.has_more = items.len() == self.limit as usize;
                if ticket.page <= 1 {
                    self.items = items;
                } else {
                    self.items.extend(items);
                }
                self.page = ticket.page + 1;
            }
            Err(err) => {
                error!("feed page {} failed: {err}", ticket.page);
            }
        }
        true
    }

    /// Pending scroll offset, handed out once and only after something rendered.
    pub fn take_scroll_restore(&mut self) -> Option<f64> {
        if self.items.is_empty() {
            return None;
        }
        self.scroll_restore.take()
    }

    pub fn snapshot(&self, scroll_y: f64) -> FeedCacheEntry {
        FeedCacheEntry {
            items: self.items.clone(),
            page: self.page,
            has_more: self.has_more,
            scroll_y,
            key: self.query.canonical_key(),
        }
    }

    pub fn toggle_like(&mut self, id: ItemId) -> Option<Optimistic<LikeState>> {
        let item = self.items.iter_mut().find(|item| item.id == id)?;
        let previous = item.like_state();
        let change = Optimistic::new(previous, previous.toggled());
        item.set_like_state(change.requested);
        Some(change)
    }

    pub fn revert_like(&mut self, id: ItemId, change: &Optimistic<LikeState>) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.set_like_state(change.previous);
        }
    }

    pub fn remove(&mut self, id: ItemId) {
        self.items.retain(|item| item.id != id);
    }
}

#[cfg(test)]
mod feed_tests {
    use crate::feed::{
        FeedCache, FeedCacheEntry, FeedFilter, FeedQuery, FeedRequest, FeedState, PAGE_SIZE,
        canonical_key, canonical_key_from_query_string,
    };
    use crate::model::{FeedItem, ItemId, ItemStatus, SortBy, TagId, ToolId, UserId};
    use pretty_assertions::assert_eq;
    use test_log::test;

    fn item(id: i64) -> FeedItem {
        FeedItem {
            id: ItemId(id),
            slug: format!("app-{id}"),
            title: Some(format!("App {id}")),
            prompt_text: None,
            prd_text: None,
            status: ItemStatus::Live,
            app_url: None,
            youtube_url: None,
            is_agent_submitted: false,
            creator_id: UserId(1),
            creator: None,
            created_at: "2024-01-05T10:00:00Z".parse().unwrap(),
            media: Vec::new(),
            tools: Vec::new(),
            tags: Vec::new(),
            likes_count: 2,
            comments_count: 0,
            is_liked: false,
            is_owner: false,
        }
    }

    fn items(range: std::ops::Range<i64>) -> Vec<FeedItem> {
        range.map(item).collect()
    }

    #[test]
    fn test_canonical_key() {
        assert_eq!(
            canonical_key([("tag_id", "1"), ("sort_by", "newest")]),
            canonical_key([("sort_by", "newest"), ("tag_id", "1")])
        );
        assert_ne!(canonical_key([("tag_id", "1,2")]), canonical_key([("tag_id", "2,1")]));
        assert_eq!(
            canonical_key_from_query_string("?tag_id=1&sort_by=newest"),
            "sort_by=newest&tag_id=1"
        );
        assert_eq!(canonical_key(Vec::<(&str, &str)>::new()), "");
    }

    #[test]
    fn test_query_params() {
        let query = FeedQuery::from_query_string("tag_id=3,1&tool_id=x,7&status=WIP&sort_by=newest&search=robot%20chef");
        assert_eq!(
            query.filters,
            vec![
                FeedFilter::Tag(TagId(3)),
                FeedFilter::Tag(TagId(1)),
                FeedFilter::Tool(ToolId(7)),
                FeedFilter::Status(ItemStatus::Wip),
            ]
        );
        assert_eq!(query.sort_by, SortBy::Newest);
        assert_eq!(query.search, "robot chef");
        assert_eq!(
            query.canonical_key(),
            "search=robot+chef&sort_by=newest&status=WIP&tag_id=3%2C1&tool_id=7"
        );

        let default = FeedQuery::from_query_string("sort_by=trending&search=");
        assert_eq!(default, FeedQuery::default());
        assert_eq!(default.canonical_key(), "");

        let toggled = default
            .with_filter_toggled(FeedFilter::Tag(TagId(1)))
            .with_filter_toggled(FeedFilter::Tag(TagId(2)));
        assert_eq!(toggled.to_query_string(), "tag_id=1%2C2");
        assert_eq!(
            toggled.with_filter_toggled(FeedFilter::Tag(TagId(1))).to_query_string(),
            "tag_id=2"
        );
    }

    #[test]
    fn test_request_params() {
        let query = FeedQuery::default()
            .with_filter_toggled(FeedFilter::Tag(TagId(1)))
            .with_filter_toggled(FeedFilter::Tag(TagId(2)))
            .with_search("  ");
        let request = FeedRequest::new(query, 3);
        assert_eq!(request.skip(), 40);
        assert_eq!(
            request.api_params(),
            vec![
                ("skip", "40".to_string()),
                ("limit", "20".to_string()),
                ("tag_id", "1".to_string()),
                ("tag_id", "2".to_string()),
                ("sort_by", "trending".to_string()),
            ]
        );

        let profile = FeedRequest::new(FeedQuery::default(), 1)
            .with_limit(12)
            .created_by(UserId(4));
        assert_eq!(
            profile.api_params(),
            vec![
                ("skip", "0".to_string()),
                ("limit", "12".to_string()),
                ("sort_by", "trending".to_string()),
                ("creator_id", "4".to_string()),
            ]
        );
        let liked = FeedRequest::new(FeedQuery::default(), 1).liked_by(UserId(4));
        assert_eq!(liked.api_params().last().unwrap(), &("liked_by_user_id", "4".to_string()));
        assert_eq!(liked.creator_id, None);
    }

    #[test]
    fn test_cache_single_slot() {
        let mut cache = FeedCache::new();
        let entry = |key: &str, scroll_y: f64| FeedCacheEntry {
            items: items(0..3),
            page: 2,
            has_more: true,
            scroll_y,
            key: key.to_string(),
        };

        cache.save(entry("tag_id=1", 100.0));
        cache.save(entry("tag_id=2", 200.0));
        assert_eq!(cache.load("tag_id=1"), None);
        assert_eq!(cache.load("tag_id=2").map(|entry| entry.scroll_y), Some(200.0));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.load("tag_id=2"), None);
    }

    #[test]
    fn test_pagination() {
        let mut state = FeedState::new(FeedQuery::default());
        let first = state.mount(None).unwrap();
        assert_eq!(first.page, 1);
        assert_eq!(state.next_page(), None);

        assert!(state.apply::<String>(first, Ok(items(0..PAGE_SIZE as i64))));
        assert!(state.has_more);
        assert_eq!(state.page, 2);

        let second = state.next_page().unwrap();
        assert_eq!(second.page, 2);
        assert_eq!(state.request(second).skip(), 20);
        assert_eq!(state.next_page(), None);

        assert!(state.apply::<String>(second, Ok(items(20..27))));
        assert!(!state.has_more);
        assert_eq!(state.items.len(), 27);
        assert_eq!(state.next_page(), None);
    }

    #[test]
    fn test_failed_page_keeps_list() {
        let mut state = FeedState::new(FeedQuery::default());
        let first = state.mount(None).unwrap();
        state.apply::<String>(first, Ok(items(0..20)));
        let second = state.next_page().unwrap();
        state.apply(second, Err("offline"));

        assert!(!state.loading);
        assert_eq!(state.items.len(), 20);
        assert_eq!(state.next_page().map(|ticket| ticket.page), Some(2));
    }

    #[test]
    fn test_mount_from_cache() {
        let query = FeedQuery::from_query_string("sort_by=newest&tag_id=1");
        let mut previous = FeedState::new(query.clone());
        let ticket = previous.mount(None).unwrap();
        previous.apply::<String>(ticket, Ok(items(0..20)));
        let entry = previous.snapshot(840.0);
        assert_eq!(entry.key, FeedQuery::from_query_string("tag_id=1&sort_by=newest").canonical_key());

        let mut hit = FeedState::new(query);
        assert_eq!(hit.mount(Some(entry.clone())), None);
        assert_eq!(hit.items.len(), 20);
        assert_eq!(hit.page, 2);
        assert_eq!(hit.take_scroll_restore(), Some(840.0));
        assert_eq!(hit.take_scroll_restore(), None);

        let mut miss = FeedState::new(FeedQuery::from_query_string("tag_id=2"));
        assert_eq!(miss.mount(Some(entry)).map(|ticket| ticket.page), Some(1));
        assert!(miss.items.is_empty());
        assert_eq!(miss.take_scroll_restore(), None);
    }

    #[test]
    fn test_query_change_resets_and_drops_stale() {
        let mut state = FeedState::new(FeedQuery::default());
        assert_eq!(
            state.change_query(FeedQuery::default().with_sort(SortBy::Likes)),
            None
        );

        let first = state.mount(None).unwrap();
        assert_eq!(state.change_query(FeedQuery::default()), None);

        let newest = FeedQuery::default().with_sort(SortBy::Newest);
        let fresh = state.change_query(newest.clone()).unwrap();
        assert_eq!(fresh.page, 1);

        assert!(!state.apply::<String>(first, Ok(items(0..20))));
        assert!(state.items.is_empty());
        assert!(state.loading);

        assert!(state.apply::<String>(fresh, Ok(items(100..105))));
        assert_eq!(state.items.len(), 5);
        assert!(!state.has_more);
        assert_eq!(state.query, newest);
    }

    #[test]
    fn test_query_change_cancels_scroll_restore() {
        let mut cached = FeedState::new(FeedQuery::default());
        let ticket = cached.mount(None).unwrap();
        cached.apply::<String>(ticket, Ok(items(0..20)));

        let mut state = FeedState::new(FeedQuery::default());
        state.mount(Some(cached.snapshot(300.0)));
        let ticket = state
            .change_query(FeedQuery::default().with_search("robot"))
            .unwrap();
        state.apply::<String>(ticket, Ok(items(0..3)));
        assert_eq!(state.take_scroll_restore(), None);
    }

    #[test]
    fn test_like_revert() {
        let mut state = FeedState::new(FeedQuery::default());
        let ticket = state.mount(None).unwrap();
        state.apply::<String>(ticket, Ok(items(0..3)));

        let change = state.toggle_like(ItemId(1)).unwrap();
        assert!(state.items[1].is_liked);
        assert_eq!(state.items[1].likes_count, 3);

        state.revert_like(ItemId(1), &change);
        assert!(!state.items[1].is_liked);
        assert_eq!(state.items[1].likes_count, 2);
        assert_eq!(state.toggle_like(ItemId(99)), None);
    }
}
