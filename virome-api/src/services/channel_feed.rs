//! Subscription feed over channel upload pages
//!
//! Channels are browsed one at a time; a channel that fails contributes no
//! items. Shorts are dropped and the merged feed is newest first.

use crate::extract::video;
use crate::models::FeedItem;
use crate::services::http::{UpstreamError, UpstreamHttp};
use serde_json::json;
use tracing::{debug, warn};
use virome_common::config::UpstreamConfig;
use virome_common::time::now_epoch_ms;

const CLIENT_NAME: &str = "WEB";
const CLIENT_VERSION: &str = "2.20251013.01.00";

/// Items per channel in preview mode
pub const PREVIEW_LIMIT: usize = 5;

/// Split `a,b,,c ` into trimmed, non-empty channel ids
pub fn parse_channel_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Drop shorts and order newest first
pub fn merge_feed(per_channel: Vec<Vec<FeedItem>>) -> Vec<FeedItem> {
    let mut items: Vec<FeedItem> = per_channel
        .into_iter()
        .flatten()
        .filter(|item| !item.is_short)
        .collect();
    items.sort_by_key(|item| std::cmp::Reverse(item.uploaded_ms()));
    items
}

pub struct ChannelFeed {
    http: UpstreamHttp,
    api_base: String,
}

impl ChannelFeed {
    pub fn new(http: UpstreamHttp, config: &UpstreamConfig) -> Self {
        Self {
            http,
            api_base: config.video_api_base.trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch_channel(&self, channel_id: &str, limit: Option<usize>) -> Result<Vec<FeedItem>, UpstreamError> {
        let url = format!("{}/browse", self.api_base);
        let body = json!({
            "browseId": channel_id,
            "context": {"client": {
                "clientName": CLIENT_NAME,
                "clientVersion": CLIENT_VERSION,
                "hl": "en",
                "gl": "US",
            }},
        });

        let data = self
            .http
            .post_json(&url, &[("prettyPrint", "false")], &body)
            .await?;
        Ok(video::parse_channel_feed(&data, channel_id, limit, now_epoch_ms()))
    }

    pub async fn feed(&self, channel_ids: &[String], preview: bool) -> Vec<FeedItem> {
        let limit = preview.then_some(PREVIEW_LIMIT);
        let mut per_channel = Vec::with_capacity(channel_ids.len());

        for channel_id in channel_ids {
            match self.fetch_channel(channel_id, limit).await {
                Ok(items) => {
                    debug!(channel = %channel_id, count = items.len(), "Fetched channel uploads");
                    per_channel.push(items);
                }
                Err(e) => {
                    warn!(channel = %channel_id, error = %e, "Channel fetch failed, skipping");
                }
            }
        }

        merge_feed(per_channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, uploaded: i64, is_short: bool) -> FeedItem {
        FeedItem {
            id: id.to_string(),
            author_id: "UC1".to_string(),
            duration: if is_short { "30" } else { "240" }.to_string(),
            author: "Channel".to_string(),
            views: "10".to_string(),
            uploaded: uploaded.to_string(),
            title: id.to_string(),
            is_short,
            thumbnail: String::new(),
        }
    }

    #[test]
    fn test_parse_channel_list() {
        assert_eq!(parse_channel_list(" UC1, ,UC2,"), vec!["UC1", "UC2"]);
        assert!(parse_channel_list("").is_empty());
    }

    #[test]
    fn test_merge_feed_drops_shorts_and_sorts_newest_first() {
        let merged = merge_feed(vec![
            vec![item("old", 1_000, false), item("short", 5_000, true)],
            vec![item("new", 9_000, false), item("mid", 4_000, false)],
        ]);

        let ids: Vec<&str> = merged.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_merge_feed_empty() {
        assert!(merge_feed(vec![Vec::new(), Vec::new()]).is_empty());
    }
}
