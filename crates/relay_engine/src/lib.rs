//! Relay engine: source polling, dedup ledger, delivery and the control loop.
mod config;
mod control;
mod cycle;
mod delivery;
mod ledger;
mod media;
mod persist;
mod source;
mod types;

pub use config::{
    ConfigError, ConfigProvider, Destination, Endpoints, HttpSettings, ListingQuery, PollConfig,
    RedditSettings, Settings, SourceCredentials, TelegramSettings, PERIODS, SORT_MODES,
};
pub use control::{ControlHandle, ControlSettings, LoopState};
pub use cycle::{
    validate_posts, Connector, Cycle, CycleRunner, LiveConnector, ProgressSink, Session,
};
pub use delivery::{deliver, Messenger, Pacing, TelegramMessenger};
pub use ledger::{filter_new, Ledger, LedgerEntries, LedgerError, DEFAULT_LEDGER_FILE};
pub use media::{
    classify, direct_image_url, extract_gallery_images, gallery_metadata_url, GalleryResolver,
    HttpGalleryResolver, MediaKind, COMMENTS_MARKER, GALLERY_MARKER,
};
pub use persist::{to_pretty_json, write_atomic, write_json_atomic, PersistError};
pub use source::{user_agent, RedditSource, Source};
pub use types::{
    ControlEvent, CycleEvent, CycleId, CycleProgress, CycleReport, FailureKind, MessageId, Post,
    RelayError, STOPPED_CODE,
};
