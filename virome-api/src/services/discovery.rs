//! Discovery aggregations
//!
//! Trending and per-country top lists are built from several catalog
//! searches run one after another, deduplicated and capped. Country lists
//! fall back to the scrobble service's global charts when no country is
//! given or the searches find nothing.

use crate::extract::video::SearchKind;
use crate::models::{CatalogItem, Track, VideoSearchItem};
use crate::services::http::UpstreamError;
use crate::services::lastfm::{ChartArtist, ChartTrack, LastFm, LastFmError};
use crate::services::music_catalog::{MusicCatalog, SearchFilter, SearchRequest, WatchRequest};
use crate::services::video_search::VideoSearch;
use chrono::Datelike;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

pub const TRENDING_LIMIT: usize = 30;
pub const RADIO_LIMIT: usize = 50;
pub const GLOBAL_COUNTRY: &str = "Global";

/// Track in discovery lists: artists joined into one display string
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryTrack {
    pub name: String,
    pub artist: String,
    pub video_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
}

impl From<Track> for DiscoveryTrack {
    fn from(track: Track) -> Self {
        Self {
            name: track.title,
            artist: track.artist_names.join(", "),
            video_id: track.id,
            thumbnail: track.thumbnail_url,
            duration_seconds: track.duration_seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryArtist {
    pub name: String,
    pub browse_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TopTracks {
    Regional(Vec<DiscoveryTrack>),
    Global(Vec<ChartTrack>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TopArtists {
    Regional(Vec<DiscoveryArtist>),
    Global(Vec<ChartArtist>),
}

/// A top list and the country it ended up covering
#[derive(Debug, Clone, PartialEq)]
pub struct CountryList<T> {
    pub country: String,
    pub items: T,
}

pub fn trending_queries(country: &str, year: i32) -> Vec<String> {
    vec![
        format!("{}n music {}", country, year),
        format!("{}n songs", country),
        format!("{}n hits", country),
        format!("popular {}n music", country),
        format!("new {}n songs {}", country, year),
    ]
}

pub fn top_track_queries(country: &str, year: i32) -> Vec<String> {
    vec![
        format!("{}n music", country),
        format!("{}n songs", country),
        format!("{}n rap", country),
        format!("{}n hits {}", country, year),
        format!("music from {}", country),
        format!("songs from {}", country),
    ]
}

pub fn top_artist_queries(country: &str) -> Vec<String> {
    vec![
        format!("{}n artist", country),
        format!("{}n singer", country),
        format!("{}n rapper", country),
        format!("{}n musician", country),
        format!("artist from {}", country),
        format!("singer from {}", country),
    ]
}

/// Append items whose key was not seen before, stopping at `limit`
pub fn extend_unique<T, I, K>(out: &mut Vec<T>, seen: &mut HashSet<String>, items: I, limit: usize, key: K)
where
    I: IntoIterator<Item = T>,
    K: Fn(&T) -> &str,
{
    for item in items {
        if out.len() >= limit {
            return;
        }
        if seen.insert(key(&item).to_string()) {
            out.push(item);
        }
    }
}

fn current_year() -> i32 {
    virome_common::time::now().year()
}

pub struct Discovery {
    catalog: Arc<MusicCatalog>,
    lastfm: Arc<LastFm>,
    video_search: Arc<VideoSearch>,
}

impl Discovery {
    pub fn new(catalog: Arc<MusicCatalog>, lastfm: Arc<LastFm>, video_search: Arc<VideoSearch>) -> Self {
        Self {
            catalog,
            lastfm,
            video_search,
        }
    }

    /// Run one catalog search; a failed query contributes nothing
    async fn search_quietly(&self, query: &str, filter: SearchFilter) -> Vec<CatalogItem> {
        let request = SearchRequest {
            query: query.to_string(),
            filter: Some(filter),
            ..SearchRequest::default()
        };
        match self.catalog.search(&request).await {
            Ok(page) => page.results,
            Err(e) => {
                warn!(query = %query, error = %e, "Discovery search failed, skipping query");
                Vec::new()
            }
        }
    }

    async fn collect_tracks(&self, queries: &[String], limit: usize) -> Vec<DiscoveryTrack> {
        let mut tracks = Vec::new();
        let mut seen = HashSet::new();

        for query in queries {
            if tracks.len() >= limit {
                break;
            }
            let found = self
                .search_quietly(query, SearchFilter::Songs)
                .await
                .into_iter()
                .filter_map(CatalogItem::into_track)
                .map(DiscoveryTrack::from);
            extend_unique(&mut tracks, &mut seen, found, limit, |t| &t.video_id);
        }

        tracks
    }

    /// Up to [`TRENDING_LIMIT`] tracks for a country name ("United States")
    pub async fn trending(&self, country: &str) -> Vec<DiscoveryTrack> {
        self.collect_tracks(&trending_queries(country, current_year()), TRENDING_LIMIT)
            .await
    }

    pub async fn top_tracks(&self, country: Option<&str>, limit: usize) -> Result<CountryList<TopTracks>, LastFmError> {
        if let Some(country) = country {
            let tracks = self
                .collect_tracks(&top_track_queries(country, current_year()), limit)
                .await;
            if !tracks.is_empty() {
                return Ok(CountryList {
                    country: country.to_string(),
                    items: TopTracks::Regional(tracks),
                });
            }
        }

        Ok(CountryList {
            country: GLOBAL_COUNTRY.to_string(),
            items: TopTracks::Global(self.lastfm.top_tracks(limit).await?),
        })
    }

    pub async fn top_artists(&self, country: Option<&str>, limit: usize) -> Result<CountryList<TopArtists>, LastFmError> {
        if let Some(country) = country {
            let mut artists = Vec::new();
            let mut seen = HashSet::new();

            for query in top_artist_queries(country) {
                if artists.len() >= limit {
                    break;
                }
                let found = self
                    .search_quietly(&query, SearchFilter::Artists)
                    .await
                    .into_iter()
                    .filter_map(|item| match item {
                        CatalogItem::Artist(a) => Some(DiscoveryArtist {
                            name: a.name,
                            browse_id: a.id,
                            thumbnail: a.thumbnail_url,
                        }),
                        _ => None,
                    });
                extend_unique(&mut artists, &mut seen, found, limit, |a| &a.browse_id);
            }

            if !artists.is_empty() {
                return Ok(CountryList {
                    country: country.to_string(),
                    items: TopArtists::Regional(artists),
                });
            }
        }

        Ok(CountryList {
            country: GLOBAL_COUNTRY.to_string(),
            items: TopArtists::Global(self.lastfm.top_artists(limit).await?),
        })
    }

    /// Endless-mix queue seeded by a track
    pub async fn radio(&self, video_id: &str) -> Result<Vec<Track>, UpstreamError> {
        self.catalog
            .watch_playlist(&WatchRequest::radio(video_id, RADIO_LIMIT))
            .await
    }

    /// Scrobble-service similar tracks, each mapped to its first video hit
    pub async fn similar(&self, title: &str, artist: &str, limit: usize) -> Result<Vec<VideoSearchItem>, LastFmError> {
        let similar = self.lastfm.similar_tracks(title, artist, limit).await?;

        let lookups = similar.iter().map(|t| {
            let phrase = format!("{} {}", t.title, t.artist);
            async move {
                match self.video_search.search(SearchKind::Videos, &phrase).await {
                    Ok(page) => page.results.into_iter().next(),
                    Err(e) => {
                        warn!(phrase = %phrase, error = %e, "Similar-track lookup failed");
                        None
                    }
                }
            }
        });

        Ok(join_all(lookups).await.into_iter().flatten().collect())
    }
}
