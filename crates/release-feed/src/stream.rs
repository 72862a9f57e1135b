//! Release streams a caller can ask for.

use std::fmt;
use std::str::FromStr;

use evb_core::Channel;

use crate::error::{FeedError, Result};

/// Request-side release selector.
///
/// `Lts` is not a channel: it selects every release the feed flags as
/// long-term support, whatever its channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReleaseStream {
    Alpha,
    Beta,
    Patch,
    Stable,
    Lts,
}

impl ReleaseStream {
    /// Channel selected by this stream, `None` for [`ReleaseStream::Lts`].
    pub fn channel(self) -> Option<Channel> {
        match self {
            ReleaseStream::Alpha => Some(Channel::Alpha),
            ReleaseStream::Beta => Some(Channel::Beta),
            ReleaseStream::Patch => Some(Channel::Patch),
            ReleaseStream::Stable => Some(Channel::Stable),
            ReleaseStream::Lts => None,
        }
    }

    /// Parse a comma-separated list such as `"stable, LTS"`. Empty items
    /// are ignored and duplicates collapse; the result is sorted.
    pub fn parse_list(text: &str) -> Result<Vec<ReleaseStream>> {
        let mut streams = text
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<ReleaseStream>>>()?;
        streams.sort();
        streams.dedup();
        Ok(streams)
    }
}

impl FromStr for ReleaseStream {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alpha" => Ok(ReleaseStream::Alpha),
            "beta" => Ok(ReleaseStream::Beta),
            "patch" => Ok(ReleaseStream::Patch),
            "stable" => Ok(ReleaseStream::Stable),
            "lts" => Ok(ReleaseStream::Lts),
            _ => Err(FeedError::UnknownReleaseStream(s.to_string())),
        }
    }
}

impl fmt::Display for ReleaseStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReleaseStream::Alpha => "Alpha",
            ReleaseStream::Beta => "Beta",
            ReleaseStream::Patch => "Patch",
            ReleaseStream::Stable => "Stable",
            ReleaseStream::Lts => "LTS",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("LTS".parse::<ReleaseStream>().unwrap(), ReleaseStream::Lts);
        assert_eq!("stable".parse::<ReleaseStream>().unwrap(), ReleaseStream::Stable);
        assert_eq!(" Beta ".parse::<ReleaseStream>().unwrap(), ReleaseStream::Beta);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            ReleaseStream::parse_list("Stable,lts, stable,").unwrap(),
            vec![ReleaseStream::Stable, ReleaseStream::Lts]
        );
        assert!(ReleaseStream::parse_list("").unwrap().is_empty());
        assert!(matches!(
            ReleaseStream::parse_list("Stable,nightly"),
            Err(FeedError::UnknownReleaseStream(s)) if s == "nightly"
        ));
    }

    #[test]
    fn test_channel_mapping() {
        assert_eq!(ReleaseStream::Patch.channel(), Some(Channel::Patch));
        assert_eq!(ReleaseStream::Lts.channel(), None);
        assert_eq!(ReleaseStream::Lts.to_string(), "LTS");
    }
}
