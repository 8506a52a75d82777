//! Upstream clients and the aggregation logic built on them

pub mod channel_feed;
pub mod discovery;
pub mod http;
pub mod identity_matcher;
pub mod lastfm;
pub mod lyrics;
pub mod mirror_registry;
pub mod music_catalog;
pub mod stream_resolver;
pub mod video_search;

pub use channel_feed::ChannelFeed;
pub use discovery::Discovery;
pub use http::{UpstreamError, UpstreamHttp};
pub use identity_matcher::{IdentityMatcher, MatchOutcome, MatchQuery};
pub use lastfm::{LastFm, LastFmError};
pub use lyrics::LyricsClient;
pub use mirror_registry::{MirrorRegistry, ProviderKind};
pub use music_catalog::MusicCatalog;
pub use stream_resolver::{ResolveError, StreamResolver};
pub use video_search::{VideoSearch, VideoSearchError};
