//! HTTP lookups of the newest editor release and the newest package
//! release.

use std::collections::BTreeMap;

use async_trait::async_trait;
use evb_core::{project_version, EngineVersion, PackageVersion};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{FeedError, Result};
use crate::stream::ReleaseStream;

/// Unity Hub release feed.
pub const DEFAULT_EDITOR_FEED_URL: &str =
    "https://public-cdn.cloud.unity3d.com/hub/prod/releases-win32.json";

const USER_AGENT: &str = concat!("engine-version-bump/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Source of editor releases.
#[async_trait]
pub trait EditorFeed: Send + Sync {
    /// Newest editor release in any of `streams`.
    ///
    /// Fails with [`FeedError::NoReleaseStreams`] before any request when
    /// `streams` is empty. `Ok(None)` means nothing qualified.
    async fn latest_engine_version(
        &self,
        streams: &[ReleaseStream],
    ) -> Result<Option<EngineVersion>>;
}

/// npm-style package registry.
#[async_trait]
pub trait PackageRegistry: Send + Sync {
    /// Newest release of `name` served by `registry_url`.
    ///
    /// A registry that answers with a non-success status yields `Ok(None)`
    /// so one unreachable registry cannot block other packages.
    async fn latest_package_version(
        &self,
        registry_url: &str,
        name: &str,
        include_prerelease: bool,
    ) -> Result<Option<PackageVersion>>;
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Feed client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// URL of the editor release feed
    pub editor_feed_url: String,
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            editor_feed_url: DEFAULT_EDITOR_FEED_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl FeedConfig {
    /// Defaults, with the feed URL overridable through `EVB_EDITOR_FEED_URL`.
    pub fn from_env() -> Self {
        match std::env::var("EVB_EDITOR_FEED_URL") {
            Ok(url) if !url.trim().is_empty() => Self::default().with_editor_feed_url(&url),
            _ => Self::default(),
        }
    }

    pub fn with_editor_feed_url(mut self, url: &str) -> Self {
        self.editor_feed_url = url.trim().to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct HubReleases {
    #[serde(default)]
    official: Vec<HubRelease>,
    #[serde(default)]
    beta: Vec<HubRelease>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HubRelease {
    version: String,
    download_url: String,
    #[serde(default)]
    lts: bool,
}

impl HubRelease {
    fn into_version(self) -> Result<EngineVersion> {
        let revision = project_version::extract_revision(&self.download_url)?;
        Ok(EngineVersion::parse(&self.version)?
            .with_revision(revision)
            .with_lts(self.lts))
    }
}

#[derive(Debug, Deserialize)]
struct RegistryPackage {
    #[serde(default)]
    versions: BTreeMap<String, IgnoredAny>,
}

/// Newest release among `releases` that one of `streams` selects.
pub fn select_latest(
    releases: impl IntoIterator<Item = EngineVersion>,
    streams: &[ReleaseStream],
) -> Option<EngineVersion> {
    let include_lts = streams.contains(&ReleaseStream::Lts);
    releases
        .into_iter()
        .filter(|release| {
            (include_lts && release.is_lts())
                || streams
                    .iter()
                    .any(|stream| stream.channel() == Some(release.channel()))
        })
        .max()
}

/// Newest parseable version key, skipping previews unless asked for.
pub fn select_latest_package<'a>(
    name: &str,
    keys: impl IntoIterator<Item = &'a str>,
    include_prerelease: bool,
) -> Option<PackageVersion> {
    keys.into_iter()
        .filter_map(|key| match PackageVersion::parse(key) {
            Ok(version) => Some(version),
            Err(err) => {
                warn!(package = %name, version = %key, error = %err, "Skipping unparseable registry version");
                None
            }
        })
        .filter(|version| include_prerelease || !version.is_preview())
        .max()
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// reqwest-backed implementation of [`EditorFeed`] and [`PackageRegistry`].
pub struct ReleaseFeedClient {
    config: FeedConfig,
    http_client: reqwest::Client,
}

impl ReleaseFeedClient {
    pub fn new(config: FeedConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FeedError::Config(e.to_string()))?;

        Ok(ReleaseFeedClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(FeedConfig::from_env())
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    async fn decode<T: DeserializeOwned>(url: &str, response: reqwest::Response) -> Result<T> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| FeedError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl EditorFeed for ReleaseFeedClient {
    async fn latest_engine_version(
        &self,
        streams: &[ReleaseStream],
    ) -> Result<Option<EngineVersion>> {
        if streams.is_empty() {
            return Err(FeedError::NoReleaseStreams);
        }

        let url = self.config.editor_feed_url.as_str();
        debug!(url = %url, "Fetching editor releases");
        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let feed: HubReleases = Self::decode(url, response).await?;
        let releases = feed
            .official
            .into_iter()
            .chain(feed.beta)
            .map(HubRelease::into_version)
            .collect::<Result<Vec<_>>>()?;

        let latest = select_latest(releases, streams);
        match &latest {
            Some(version) => info!(latest = %version, "Latest editor release"),
            None => info!("No editor release in the requested streams"),
        }
        Ok(latest)
    }
}

#[async_trait]
impl PackageRegistry for ReleaseFeedClient {
    async fn latest_package_version(
        &self,
        registry_url: &str,
        name: &str,
        include_prerelease: bool,
    ) -> Result<Option<PackageVersion>> {
        let url = format!("{}/{}", registry_url.trim_end_matches('/'), name);
        debug!(url = %url, "Fetching package versions");
        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(
                package = %name,
                url = %url,
                status = status.as_u16(),
                "Registry did not list package"
            );
            return Ok(None);
        }

        let package: RegistryPackage = Self::decode(&url, response).await?;
        Ok(select_latest_package(
            name,
            package.versions.keys().map(String::as_str),
            include_prerelease,
        ))
    }
}
