//! Music catalog renderer extraction
//!
//! Maps the innertube WEB_REMIX renderer trees (`musicResponsiveListItemRenderer`,
//! `musicTwoRowItemRenderer`, `musicCardShelfRenderer`, ...) into
//! [`CatalogItem`] and the page shapes in [`crate::models`].
//!
//! Classification rule shared by every item kind: anything carrying a
//! playable video id is a track; otherwise a browse id with the channel
//! prefix (`UC`) is an artist; otherwise it is an album or playlist.

use super::{
    array_at, first_run_text, first_thumbnail_url, joined_runs_text, str_at, string_at, u64_at,
};
use crate::models::{
    AlbumSummary, ArtistOverview, ArtistPage, ArtistSummary, CatalogItem, CollectionPage,
    MoodCategory, MoodSection, Page, ShelfSection, Track,
};
use serde_json::Value;
use virome_common::text::parse_duration_text;

const ARTIST_PAGE_TYPE: &str = "MUSIC_PAGE_TYPE_ARTIST";
const RUN_PAGE_TYPE: &str = "/navigationEndpoint/browseEndpoint/browseEndpointContextSupportedConfigs/browseEndpointContextMusicConfig/pageType";
const CHANNEL_PREFIX: &str = "UC";
const PLAYLIST_BROWSE_PREFIX: &str = "VL";

const BROWSE_SECTIONS: &str =
    "/contents/singleColumnBrowseResultsRenderer/tabs/0/tabRenderer/content/sectionListRenderer/contents";
const BROWSE_SECONDARY_SECTIONS: &str =
    "/contents/twoColumnBrowseResultsRenderer/secondaryContents/sectionListRenderer/contents";
const SEARCH_SECTIONS: &str =
    "/contents/tabbedSearchResultsRenderer/tabs/0/tabRenderer/content/sectionListRenderer/contents";
const WATCH_QUEUE: &str = "/contents/singleColumnMusicWatchNextResultsRenderer/tabbedRenderer/watchNextTabbedResultsRenderer/tabs/0/tabRenderer/content/musicQueueRenderer/content/playlistPanelRenderer/contents";

/// Fields common to every catalog item kind, before classification
#[derive(Debug, Default)]
struct ItemFields {
    title: Option<String>,
    video_id: Option<String>,
    browse_id: Option<String>,
    playlist_id: Option<String>,
    artist_names: Vec<String>,
    duration_seconds: Option<u64>,
    thumbnail_url: Option<String>,
}

impl ItemFields {
    fn into_track(self, id: String, title: String) -> Track {
        Track {
            id,
            title,
            artist_names: self.artist_names,
            duration_seconds: self.duration_seconds,
            thumbnail_url: self.thumbnail_url,
        }
    }

    fn into_album(self, id: String, title: String) -> AlbumSummary {
        AlbumSummary {
            id,
            title,
            artist_names: self.artist_names,
            thumbnail_url: self.thumbnail_url,
        }
    }

    /// Apply the track → artist → album/playlist rule
    fn classify(mut self) -> Option<CatalogItem> {
        let title = self.title.take()?;

        if let Some(video_id) = self.video_id.take() {
            return Some(CatalogItem::Song(self.into_track(video_id, title)));
        }

        if let Some(browse_id) = self.browse_id.take() {
            if browse_id.starts_with(CHANNEL_PREFIX) {
                return Some(CatalogItem::Artist(ArtistSummary {
                    id: browse_id,
                    name: title,
                    thumbnail_url: self.thumbnail_url,
                }));
            }
            if browse_id.starts_with(PLAYLIST_BROWSE_PREFIX) {
                return Some(CatalogItem::Playlist(self.into_album(browse_id, title)));
            }
            return Some(CatalogItem::Album(self.into_album(browse_id, title)));
        }

        let playlist_id = self.playlist_id.take()?;
        Some(CatalogItem::Playlist(self.into_album(playlist_id, title)))
    }
}

/// Names of the runs that link to an artist page
pub fn artist_names(runs: &[Value]) -> Vec<String> {
    runs.iter()
        .filter(|run| str_at(run, RUN_PAGE_TYPE) == Some(ARTIST_PAGE_TYPE))
        .filter_map(|run| string_at(run, "/text"))
        .collect()
}

fn music_thumbnail(renderer: &Value) -> Option<String> {
    string_at(
        renderer,
        "/thumbnail/musicThumbnailRenderer/thumbnail/thumbnails/0/url",
    )
    .or_else(|| {
        string_at(
            renderer,
            "/thumbnail/croppedSquareThumbnailRenderer/thumbnail/thumbnails/0/url",
        )
    })
}

/// `musicResponsiveListItemRenderer` → catalog item
pub fn parse_music_item(item: &Value) -> Option<CatalogItem> {
    let subtitle_runs = array_at(
        item,
        "/flexColumns/1/musicResponsiveListItemFlexColumnRenderer/text/runs",
    );

    // Lists put the duration in a fixed column; search results append it
    // to the subtitle instead.
    let duration_seconds = str_at(
        item,
        "/fixedColumns/0/musicResponsiveListItemFixedColumnRenderer/text/runs/0/text",
    )
    .and_then(parse_duration_text)
    .or_else(|| {
        subtitle_runs
            .last()
            .and_then(|run| str_at(run, "/text"))
            .and_then(parse_duration_text)
    });

    let video_id = string_at(
        item,
        "/overlay/musicItemThumbnailOverlayRenderer/content/musicPlayButtonRenderer/playNavigationEndpoint/watchEndpoint/videoId",
    )
    .or_else(|| string_at(item, "/playlistItemData/videoId"));

    ItemFields {
        title: string_at(
            item,
            "/flexColumns/0/musicResponsiveListItemFlexColumnRenderer/text/runs/0/text",
        ),
        video_id,
        browse_id: string_at(item, "/navigationEndpoint/browseEndpoint/browseId"),
        playlist_id: None,
        artist_names: artist_names(subtitle_runs),
        duration_seconds,
        thumbnail_url: music_thumbnail(item),
    }
    .classify()
}

/// `musicTwoRowItemRenderer` (carousels) → catalog item
pub fn parse_two_row_item(item: &Value) -> Option<CatalogItem> {
    ItemFields {
        title: string_at(item, "/title/runs/0/text"),
        video_id: string_at(item, "/navigationEndpoint/watchEndpoint/videoId"),
        browse_id: string_at(item, "/navigationEndpoint/browseEndpoint/browseId"),
        playlist_id: string_at(item, "/navigationEndpoint/watchPlaylistEndpoint/playlistId")
            .or_else(|| string_at(item, "/navigationEndpoint/watchEndpoint/playlistId")),
        artist_names: artist_names(array_at(item, "/subtitle/runs")),
        duration_seconds: None,
        thumbnail_url: string_at(
            item,
            "/thumbnailRenderer/musicThumbnailRenderer/thumbnail/thumbnails/0/url",
        ),
    }
    .classify()
}

fn parse_list_or_two_row(entry: &Value) -> Option<CatalogItem> {
    entry
        .get("musicResponsiveListItemRenderer")
        .and_then(parse_music_item)
        .or_else(|| entry.get("musicTwoRowItemRenderer").and_then(parse_two_row_item))
}

/// Kind announced by a top-result card's subtitle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardKind {
    Song,
    Video,
    Artist,
    Album,
    Playlist,
}

impl CardKind {
    fn from_subtitle(subtitle: &str) -> Self {
        let lower = subtitle.to_lowercase();
        if lower.contains("video") || lower.contains("vidéo") {
            CardKind::Video
        } else if lower.contains("artist") || lower.contains("artiste") {
            CardKind::Artist
        } else if lower.contains("album") {
            CardKind::Album
        } else if lower.contains("playlist") {
            CardKind::Playlist
        } else {
            CardKind::Song
        }
    }
}

/// `musicCardShelfRenderer` (top search result) → catalog item
///
/// The card announces its kind in the subtitle text. When the id that
/// kind needs is missing, the generic classification rule applies.
pub fn parse_top_result_card(card: &Value) -> Option<CatalogItem> {
    let subtitle_runs = array_at(card, "/subtitle/runs");
    let subtitle = joined_runs_text(&card["subtitle"]).unwrap_or_default();
    let kind = CardKind::from_subtitle(&subtitle);

    let mut fields = ItemFields {
        title: string_at(card, "/title/runs/0/text"),
        video_id: string_at(card, "/onTap/watchEndpoint/videoId").or_else(|| {
            string_at(card, "/buttons/0/buttonRenderer/command/watchEndpoint/videoId")
        }),
        browse_id: string_at(card, "/onTap/browseEndpoint/browseId"),
        playlist_id: None,
        artist_names: artist_names(subtitle_runs),
        duration_seconds: None,
        thumbnail_url: music_thumbnail(card),
    };

    match kind {
        CardKind::Video if fields.video_id.is_some() => {
            let title = fields.title.take()?;
            let id = fields.video_id.take()?;
            Some(CatalogItem::Video(fields.into_track(id, title)))
        }
        CardKind::Artist if fields.browse_id.is_some() => {
            let title = fields.title.take()?;
            let id = fields.browse_id.take()?;
            Some(CatalogItem::Artist(ArtistSummary {
                id,
                name: title,
                thumbnail_url: fields.thumbnail_url,
            }))
        }
        CardKind::Album if fields.browse_id.is_some() && fields.video_id.is_none() => {
            let title = fields.title.take()?;
            let id = fields.browse_id.take()?;
            Some(CatalogItem::Album(fields.into_album(id, title)))
        }
        CardKind::Playlist if fields.browse_id.is_some() && fields.video_id.is_none() => {
            let title = fields.title.take()?;
            let id = fields.browse_id.take()?;
            Some(CatalogItem::Playlist(fields.into_album(id, title)))
        }
        _ => fields.classify(),
    }
}

fn shelf_items(shelf: &Value) -> impl Iterator<Item = CatalogItem> + '_ {
    array_at(shelf, "/contents")
        .iter()
        .filter_map(|entry| entry.get("musicResponsiveListItemRenderer"))
        .filter_map(parse_music_item)
}

fn shelf_continuation(shelf: &Value) -> Option<String> {
    string_at(shelf, "/continuations/0/nextContinuationData/continuation")
}

/// Search response (initial or continuation) → one page of results
pub fn parse_search_results(data: &Value) -> Page<CatalogItem> {
    let mut page = Page::default();

    for action in array_at(data, "/onResponseReceivedCommands") {
        for entry in array_at(action, "/appendContinuationItemsAction/continuationItems") {
            let shelf = entry
                .get("musicShelfRenderer")
                .or_else(|| entry.get("musicShelfContinuation"));
            if let Some(shelf) = shelf {
                page.results.extend(shelf_items(shelf));
                if let Some(token) = shelf_continuation(shelf) {
                    page.continuation_token = Some(token);
                }
            }
            if let Some(token) = string_at(
                entry,
                "/continuationItemRenderer/continuationEndpoint/continuationCommand/token",
            ) {
                page.continuation_token = Some(token);
            }
        }
    }

    if let Some(shelf) = data.pointer("/continuationContents/musicShelfContinuation") {
        page.results.extend(shelf_items(shelf));
        if let Some(token) = shelf_continuation(shelf) {
            page.continuation_token = Some(token);
        }
    }

    if page.results.is_empty() {
        for section in array_at(data, SEARCH_SECTIONS) {
            if let Some(card) = section.get("musicCardShelfRenderer") {
                if let Some(top) = parse_top_result_card(card) {
                    page.results.push(top);
                }
            }
            if let Some(shelf) = section.get("musicShelfRenderer") {
                page.results.extend(shelf_items(shelf));
                if let Some(token) = shelf_continuation(shelf) {
                    page.continuation_token = Some(token);
                }
            }
        }
    }

    page
}

/// Search-suggestion response → suggestion strings
pub fn parse_suggestions(data: &Value) -> Vec<String> {
    let sectioned = array_at(data, "/contents/0/searchSuggestionsSectionRenderer/contents");
    let contents = if sectioned.is_empty() {
        array_at(data, "/contents")
    } else {
        sectioned
    };

    contents
        .iter()
        .filter_map(|c| c.pointer("/searchSuggestionRenderer/suggestion"))
        .filter_map(joined_runs_text)
        .collect()
}

/// `player` response → track
pub fn parse_song(data: &Value) -> Option<Track> {
    let details = data.get("videoDetails")?;
    Some(Track {
        id: string_at(details, "/videoId")?,
        title: string_at(details, "/title")?,
        artist_names: string_at(details, "/author").into_iter().collect(),
        duration_seconds: u64_at(details, "/lengthSeconds"),
        thumbnail_url: first_thumbnail_url(&details["thumbnail"]),
    })
}

/// First header renderer present among the given names
fn header<'a>(data: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|name| data.pointer(&format!("/header/{}", name)))
        .or_else(|| {
            // Newer layout: header is the first section of the first tab
            data.pointer(
                "/contents/twoColumnBrowseResultsRenderer/tabs/0/tabRenderer/content/sectionListRenderer/contents/0/musicResponsiveHeaderRenderer",
            )
        })
}

fn browse_sections(data: &Value) -> impl Iterator<Item = &Value> {
    array_at(data, BROWSE_SECTIONS)
        .iter()
        .chain(array_at(data, BROWSE_SECONDARY_SECTIONS).iter())
}

/// Track rows of an album or playlist page
pub fn parse_collection_tracks(data: &Value) -> Vec<CatalogItem> {
    browse_sections(data)
        .filter_map(|section| {
            section
                .get("musicShelfRenderer")
                .or_else(|| section.get("musicPlaylistShelfRenderer"))
        })
        .flat_map(shelf_items)
        .collect()
}

/// Album or playlist `browse` response → page
pub fn parse_collection_page(data: &Value) -> CollectionPage {
    let header = header(
        data,
        &["musicDetailHeaderRenderer", "musicImmersiveHeaderRenderer"],
    );

    CollectionPage {
        title: header.and_then(|h| first_run_text(&h["title"])),
        author: header.and_then(|h| {
            first_run_text(&h["subtitle"]).or_else(|| first_run_text(&h["straplineTextOne"]))
        }),
        thumbnail_url: header.and_then(music_thumbnail),
        tracks: parse_collection_tracks(data),
    }
}

/// Artist `browse` response → page header
pub fn parse_artist_page(data: &Value) -> ArtistPage {
    let header = header(
        data,
        &["musicImmersiveHeaderRenderer", "musicVisualHeaderRenderer"],
    );

    ArtistPage {
        name: header.and_then(|h| first_run_text(&h["title"])),
        description: header.and_then(|h| first_run_text(&h["description"])),
        thumbnail_url: header.and_then(music_thumbnail),
    }
}

fn carousel_title(carousel: &Value) -> Option<String> {
    string_at(
        carousel,
        "/header/musicCarouselShelfBasicHeaderRenderer/title/runs/0/text",
    )
}

/// Artist `browse` response → overview (top-songs playlist, related artists)
pub fn parse_artist_overview(data: &Value) -> ArtistOverview {
    let header = header(
        data,
        &["musicImmersiveHeaderRenderer", "musicVisualHeaderRenderer"],
    );

    let playlist_id = browse_sections(data)
        .filter_map(|section| section.get("musicShelfRenderer"))
        .find(|shelf| {
            str_at(shelf, "/title/runs/0/text")
                .is_some_and(|t| t.eq_ignore_ascii_case("Top songs"))
        })
        .and_then(|shelf| {
            string_at(
                shelf,
                "/contents/0/musicResponsiveListItemRenderer/flexColumns/0/musicResponsiveListItemFlexColumnRenderer/text/runs/0/navigationEndpoint/watchEndpoint/playlistId",
            )
        });

    let recommended_artists = browse_sections(data)
        .filter_map(|section| section.get("musicCarouselShelfRenderer"))
        .find(|carousel| {
            carousel_title(carousel).is_some_and(|t| t.eq_ignore_ascii_case("Fans might also like"))
        })
        .map(|carousel| {
            array_at(carousel, "/contents")
                .iter()
                .filter_map(|entry| entry.get("musicTwoRowItemRenderer"))
                .filter_map(|item| {
                    Some(ArtistSummary {
                        id: string_at(item, "/navigationEndpoint/browseEndpoint/browseId")?,
                        name: first_run_text(&item["title"])?,
                        thumbnail_url: string_at(
                            item,
                            "/thumbnailRenderer/musicThumbnailRenderer/thumbnail/thumbnails/0/url",
                        ),
                    })
                })
                .collect()
        });

    ArtistOverview {
        artist_name: header.and_then(|h| first_run_text(&h["title"])),
        artist_avatar: header.and_then(music_thumbnail),
        playlist_id,
        recommended_artists,
    }
}

/// Charts `browse` response → titled shelves
pub fn parse_shelf_sections(data: &Value) -> Vec<ShelfSection> {
    let mut sections = Vec::new();

    for section in browse_sections(data) {
        if let Some(carousel) = section.get("musicCarouselShelfRenderer") {
            let items: Vec<CatalogItem> = array_at(carousel, "/contents")
                .iter()
                .filter_map(parse_list_or_two_row)
                .collect();
            if let Some(title) = carousel_title(carousel) {
                if !items.is_empty() {
                    sections.push(ShelfSection { title, items });
                }
            }
        }

        if let Some(shelf) = section.get("musicShelfRenderer") {
            let items: Vec<CatalogItem> = shelf_items(shelf).collect();
            if let Some(title) = first_run_text(&shelf["title"]) {
                if !items.is_empty() {
                    sections.push(ShelfSection { title, items });
                }
            }
        }
    }

    sections
}

fn parse_mood_button(entry: &Value) -> Option<MoodCategory> {
    let button = entry.get("musicNavigationButtonRenderer")?;
    Some(MoodCategory {
        title: first_run_text(&button["buttonText"]),
        browse_id: string_at(button, "/clickCommand/browseEndpoint/browseId"),
        color: u64_at(button, "/solid/leftStripeColor"),
    })
}

/// Moods & genres `browse` response → sections of category buttons
pub fn parse_mood_sections(data: &Value) -> Vec<MoodSection> {
    let mut sections = Vec::new();

    for section in browse_sections(data) {
        if let Some(grid) = section.get("gridRenderer") {
            let items: Vec<MoodCategory> = array_at(grid, "/items")
                .iter()
                .filter_map(parse_mood_button)
                .collect();
            if !items.is_empty() {
                let title = string_at(
                    grid,
                    "/header/gridHeaderRenderer/title/runs/0/text",
                )
                .unwrap_or_else(|| "Moods & Genres".to_string());
                sections.push(MoodSection { title, items });
            }
        }

        if let Some(carousel) = section.get("musicCarouselShelfRenderer") {
            let items: Vec<MoodCategory> = array_at(carousel, "/contents")
                .iter()
                .filter_map(parse_mood_button)
                .collect();
            if let Some(title) = carousel_title(carousel) {
                if !items.is_empty() {
                    sections.push(MoodSection { title, items });
                }
            }
        }
    }

    sections
}

/// Mood category `browse` response → playlists (and any listed items)
pub fn parse_mood_playlists(data: &Value) -> Vec<CatalogItem> {
    let mut items = Vec::new();

    for section in browse_sections(data) {
        if let Some(shelf) = section.get("musicShelfRenderer") {
            items.extend(shelf_items(shelf));
        }
        if let Some(carousel) = section.get("musicCarouselShelfRenderer") {
            items.extend(
                array_at(carousel, "/contents")
                    .iter()
                    .filter_map(parse_list_or_two_row),
            );
        }
        if let Some(grid) = section.get("gridRenderer") {
            items.extend(
                array_at(grid, "/items")
                    .iter()
                    .filter_map(parse_list_or_two_row),
            );
        }
    }

    items
}

/// `next` response → queue tracks, at most `limit`
pub fn parse_watch_playlist(data: &Value, limit: usize) -> Vec<Track> {
    array_at(data, WATCH_QUEUE)
        .iter()
        .filter_map(|entry| entry.get("playlistPanelVideoRenderer"))
        .filter_map(|video| {
            Some(Track {
                id: string_at(video, "/videoId")?,
                title: first_run_text(&video["title"])?,
                artist_names: first_run_text(&video["shortBylineText"])
                    .into_iter()
                    .collect(),
                duration_seconds: str_at(video, "/lengthText/runs/0/text")
                    .and_then(parse_duration_text),
                thumbnail_url: first_thumbnail_url(&video["thumbnail"]),
            })
        })
        .take(limit)
        .collect()
}
