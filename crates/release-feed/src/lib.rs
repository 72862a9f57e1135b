//! Release-Feed: available editor and package releases
//!
//! Looks up the newest editor build in the Unity Hub release feed and the
//! newest release of a package in an npm-style UPM registry. Results feed
//! the reconciler in `evb-core` as candidate versions.

pub mod client;
pub mod error;
pub mod stream;

pub use client::{
    select_latest, select_latest_package, EditorFeed, FeedConfig, PackageRegistry,
    ReleaseFeedClient, DEFAULT_EDITOR_FEED_URL,
};
pub use error::{FeedError, Result};
pub use stream::ReleaseStream;
