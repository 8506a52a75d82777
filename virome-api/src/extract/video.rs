//! Video platform renderer extraction
//!
//! Search pages arrive as HTML with the result tree embedded as a
//! `ytInitialData` script assignment; continuations, related videos and
//! channel browses arrive as innertube JSON. Both feed the same renderer
//! parsers.

use super::{
    array_at, first_run_text, first_thumbnail_url, last_thumbnail_url, simple_or_run_text,
    str_at, string_at,
};
use crate::models::{ChannelSummary, FeedItem, Page, PlaylistSummary, VideoSearchItem, VideoSummary};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use virome_common::text::{parse_duration_text, parse_view_count, relative_time_to_epoch_ms};

const INITIAL_DATA_MARKERS: [&str; 2] = ["var ytInitialData = ", "window[\"ytInitialData\"] = "];

const SEARCH_SECTIONS: &str =
    "/contents/twoColumnSearchResultsRenderer/primaryContents/sectionListRenderer/contents";
const RELATED_RESULTS: &str =
    "/contents/twoColumnWatchNextResults/secondaryResults/secondaryResults/results";

/// Related videos returned per request
pub const RELATED_LIMIT: usize = 20;

static API_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""INNERTUBE_API_KEY":"([^"]+)""#).unwrap());
static CLIENT_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""clientVersion":"([^"]+)""#).unwrap());

/// Which renderer a search (or continuation) is collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Videos,
    Channels,
    Playlists,
}

impl SearchKind {
    /// Parse a `filter` query value; `all` and unknown values are `None`
    pub fn from_filter(filter: &str) -> Option<Self> {
        match filter {
            "videos" => Some(SearchKind::Videos),
            "channels" => Some(SearchKind::Channels),
            "playlists" => Some(SearchKind::Playlists),
            _ => None,
        }
    }

    /// Parse one search-result entry if it holds this kind's renderer
    pub fn parse_item(self, item: &Value) -> Option<VideoSearchItem> {
        match self {
            SearchKind::Videos => item
                .get("videoRenderer")
                .and_then(parse_video_renderer)
                .map(VideoSearchItem::Video),
            SearchKind::Channels => item
                .get("channelRenderer")
                .and_then(parse_channel_renderer)
                .map(VideoSearchItem::Channel),
            SearchKind::Playlists => item
                .get("playlistRenderer")
                .and_then(parse_playlist_renderer)
                .map(VideoSearchItem::Playlist),
        }
    }
}

/// Innertube settings scraped from a search page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiConfig {
    pub api_key: Option<String>,
    pub client_version: Option<String>,
}

/// Pull the innertube API key and client version out of a page
pub fn extract_api_config(html: &str) -> ApiConfig {
    let capture = |re: &Regex| {
        re.captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    };

    ApiConfig {
        api_key: capture(&API_KEY_RE),
        client_version: capture(&CLIENT_VERSION_RE),
    }
}

/// Parse the `ytInitialData` object embedded in a page
///
/// Only the first JSON value after the assignment is read, so the trailing
/// `;</script>` does not matter.
pub fn extract_initial_data(html: &str) -> Option<Value> {
    INITIAL_DATA_MARKERS.iter().find_map(|marker| {
        let start = html.find(marker)? + marker.len();
        serde_json::Deserializer::from_str(&html[start..])
            .into_iter::<Value>()
            .next()?
            .ok()
    })
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// `videoRenderer` → video summary
pub fn parse_video_renderer(v: &Value) -> Option<VideoSummary> {
    let id = string_at(v, "/videoId")?;
    let duration_text = string_at(v, "/lengthText/simpleText");

    Some(VideoSummary {
        url: watch_url(&id),
        title: simple_or_run_text(&v["title"]),
        channel_id: string_at(
            v,
            "/ownerText/runs/0/navigationEndpoint/browseEndpoint/browseId",
        )
        .or_else(|| {
            string_at(
                v,
                "/longBylineText/runs/0/navigationEndpoint/browseEndpoint/browseId",
            )
        }),
        channel_name: first_run_text(&v["ownerText"])
            .or_else(|| first_run_text(&v["longBylineText"])),
        duration_seconds: duration_text.as_deref().and_then(parse_duration_text),
        duration_text,
        thumbnail_url: last_thumbnail_url(&v["thumbnail"]),
        view_count_text: simple_or_run_text(&v["viewCountText"]),
        published_time: string_at(v, "/publishedTimeText/simpleText"),
        id,
    })
}

/// `compactVideoRenderer` (watch-page sidebar) → video summary
pub fn parse_compact_video_renderer(v: &Value) -> Option<VideoSummary> {
    let id = string_at(v, "/videoId")?;
    let duration_text = string_at(v, "/lengthText/simpleText");

    Some(VideoSummary {
        url: watch_url(&id),
        title: simple_or_run_text(&v["title"]),
        channel_id: string_at(
            v,
            "/shortBylineText/runs/0/navigationEndpoint/browseEndpoint/browseId",
        ),
        channel_name: first_run_text(&v["shortBylineText"]),
        duration_seconds: duration_text.as_deref().and_then(parse_duration_text),
        duration_text,
        thumbnail_url: first_thumbnail_url(&v["thumbnail"]),
        view_count_text: simple_or_run_text(&v["viewCountText"]),
        published_time: string_at(v, "/publishedTimeText/simpleText"),
        id,
    })
}

/// `channelRenderer` → channel summary
pub fn parse_channel_renderer(c: &Value) -> Option<ChannelSummary> {
    let id = string_at(c, "/channelId")?;
    Some(ChannelSummary {
        url: format!("https://www.youtube.com/channel/{}", id),
        name: simple_or_run_text(&c["title"]),
        thumbnail_url: first_thumbnail_url(&c["thumbnail"]),
        subscriber_count: string_at(c, "/subscriberCountText/simpleText"),
        video_count: simple_or_run_text(&c["videoCountText"]),
        id,
    })
}

/// `playlistRenderer` → playlist summary
pub fn parse_playlist_renderer(p: &Value) -> Option<PlaylistSummary> {
    let id = string_at(p, "/playlistId")?;
    Some(PlaylistSummary {
        url: format!("https://www.youtube.com/playlist?list={}", id),
        title: simple_or_run_text(&p["title"]),
        author: first_run_text(&p["shortBylineText"]),
        thumbnail_url: string_at(p, "/thumbnails/0/thumbnails/0/url"),
        video_count: string_at(p, "/videoCount"),
        id,
    })
}

fn continuation_token(entry: &Value) -> Option<String> {
    string_at(
        entry,
        "/continuationItemRenderer/continuationEndpoint/continuationCommand/token",
    )
}

/// Initial search page (`ytInitialData`) → results of one kind
pub fn parse_search_page(data: &Value, kind: SearchKind) -> Page<VideoSearchItem> {
    let mut page = Page::default();

    for section in array_at(data, SEARCH_SECTIONS) {
        page.results.extend(
            array_at(section, "/itemSectionRenderer/contents")
                .iter()
                .filter_map(|item| kind.parse_item(item)),
        );
        if page.continuation_token.is_none() {
            page.continuation_token = continuation_token(section);
        }
    }

    page
}

/// Search continuation response → results of one kind
pub fn parse_continuation_page(data: &Value, kind: SearchKind) -> Page<VideoSearchItem> {
    let mut page = Page::default();

    for action in array_at(data, "/onResponseReceivedCommands") {
        for item in array_at(action, "/appendContinuationItemsAction/continuationItems") {
            if let Some(token) = continuation_token(item) {
                page.continuation_token = Some(token);
                continue;
            }
            page.results.extend(kind.parse_item(item));
            page.results.extend(
                array_at(item, "/itemSectionRenderer/contents")
                    .iter()
                    .filter_map(|inner| kind.parse_item(inner)),
            );
        }
    }

    page
}

/// `next` response → related videos, shorts removed, at most [`RELATED_LIMIT`]
pub fn parse_related(data: &Value) -> Vec<VideoSummary> {
    array_at(data, RELATED_RESULTS)
        .iter()
        .filter_map(|item| item.get("compactVideoRenderer"))
        .filter_map(parse_compact_video_renderer)
        .filter(|video| !video.is_short())
        .take(RELATED_LIMIT)
        .collect()
}

// ============================================================================
// Channel feed
// ============================================================================

fn collect_feed_videos<'a>(contents: &'a [Value], out: &mut Vec<&'a Value>, limit: Option<usize>) {
    for item in contents {
        if limit.is_some_and(|l| out.len() >= l) {
            return;
        }

        let video = item
            .pointer("/richItemRenderer/content/videoRenderer")
            .or_else(|| item.get("videoRenderer"))
            .or_else(|| item.get("gridVideoRenderer"));
        if let Some(video) = video {
            if str_at(video, "/videoId").is_some() {
                out.push(video);
            }
        }

        for nested in [
            "/shelfRenderer/content/expandedShelfContentsRenderer/items",
            "/shelfRenderer/content/gridRenderer/items",
            "/itemSectionRenderer/contents",
            "/gridRenderer/items",
        ] {
            collect_feed_videos(array_at(item, nested), out, limit);
        }
    }
}

fn feed_channel_name(data: &Value) -> String {
    simple_or_run_text(&data["header"]["c4TabbedHeaderRenderer"]["title"])
        .or_else(|| string_at(data, "/header/c4TabbedHeaderRenderer/title"))
        .or_else(|| string_at(data, "/metadata/channelMetadataRenderer/title"))
        .unwrap_or_default()
}

fn parse_feed_video(video: &Value, channel_id: &str, channel_name: &str, now_ms: i64) -> FeedItem {
    let duration = simple_or_run_text(&video["lengthText"])
        .or_else(|| {
            string_at(
                video,
                "/thumbnailOverlays/0/thumbnailOverlayTimeStatusRenderer/text/simpleText",
            )
        })
        .as_deref()
        .and_then(parse_duration_text)
        .unwrap_or(0);

    let views = str_at(video, "/viewCountText/simpleText")
        .and_then(parse_view_count)
        .unwrap_or(0);

    let uploaded = relative_time_to_epoch_ms(
        str_at(video, "/publishedTimeText/simpleText").unwrap_or(""),
        now_ms,
    );

    FeedItem {
        id: string_at(video, "/videoId").unwrap_or_default(),
        author_id: channel_id.to_string(),
        duration: duration.to_string(),
        author: channel_name.to_string(),
        views: views.to_string(),
        uploaded: uploaded.to_string(),
        title: simple_or_run_text(&video["title"]).unwrap_or_default(),
        is_short: duration > 0 && duration <= 60,
        thumbnail: last_thumbnail_url(&video["thumbnail"]).unwrap_or_default(),
    }
}

/// Channel `browse` response → uploads in feed shape
///
/// `now_ms` anchors the relative published-time texts.
pub fn parse_channel_feed(
    data: &Value,
    channel_id: &str,
    limit: Option<usize>,
    now_ms: i64,
) -> Vec<FeedItem> {
    let channel_name = feed_channel_name(data);

    let tabs = {
        let two_column = array_at(data, "/contents/twoColumnBrowseResultsRenderer/tabs");
        if two_column.is_empty() {
            array_at(data, "/contents/singleColumnBrowseResultsRenderer/tabs")
        } else {
            two_column
        }
    };

    let mut videos = Vec::new();
    for tab in tabs {
        let contents = {
            let sections = array_at(tab, "/tabRenderer/content/sectionListRenderer/contents");
            if sections.is_empty() {
                array_at(tab, "/tabRenderer/content/richGridRenderer/contents")
            } else {
                sections
            }
        };
        collect_feed_videos(contents, &mut videos, limit);
    }

    if let Some(limit) = limit {
        videos.truncate(limit);
    }

    videos
        .into_iter()
        .map(|v| parse_feed_video(v, channel_id, &channel_name, now_ms))
        .collect()
}
