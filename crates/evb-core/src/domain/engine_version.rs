//! Editor (engine) versions such as `2022.2.1f2`.
//!
//! Text form is `major.minor.patch[<channel letter><build>]`. Each numeric
//! field has a maximum width, and fields are validated in a fixed order
//! through [`FIELDS`] so the first offending field is the one reported.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::VersionError;

const PATTERN: &str = r"^(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)(?:(?P<channel>[A-Za-z_])(?P<build>\d+))?$";
const EXPECTED: &str = "major.minor.patch optionally followed by a channel letter and build number, e.g. 2022.2.1f2";

const WITH_REVISION_PATTERN: &str = r"^(?P<version>[^(]*)\((?P<revision>[^)]*)\)$";
const EXPECTED_WITH_REVISION: &str = "<version> (<revision>), e.g. 2022.2.1f2 (abcdef123456)";

fn pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PATTERN).expect("engine version pattern is valid"))
}

fn with_revision_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(WITH_REVISION_PATTERN).expect("revision pattern is valid"))
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// Release channel of an editor build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Alpha,
    Beta,
    Patch,
    Stable,
}

impl Channel {
    /// Position in the release order. Higher is more mature.
    pub fn rank(self) -> u8 {
        match self {
            Channel::Alpha => 1,
            Channel::Beta => 2,
            Channel::Patch => 3,
            Channel::Stable => 4,
        }
    }

    pub fn from_shorthand(c: char) -> Option<Self> {
        match c {
            'a' => Some(Channel::Alpha),
            'b' => Some(Channel::Beta),
            'p' => Some(Channel::Patch),
            'f' => Some(Channel::Stable),
            _ => None,
        }
    }

    pub fn shorthand(self) -> char {
        match self {
            Channel::Alpha => 'a',
            Channel::Beta => 'b',
            Channel::Patch => 'p',
            Channel::Stable => 'f',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Alpha => "Alpha",
            Channel::Beta => "Beta",
            Channel::Patch => "Patch",
            Channel::Stable => "Stable",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Revision
// ---------------------------------------------------------------------------

/// 12-character lowercase hex changeset identifier of an editor build.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let valid = s.len() == 12 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(VersionError::InvalidRevision {
                revision: s.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Revision {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Field descriptors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Fields {
    major: u32,
    minor: u32,
    patch: u32,
    channel: Channel,
    build: u32,
}

impl Default for Fields {
    fn default() -> Self {
        Fields {
            major: 0,
            minor: 0,
            patch: 0,
            channel: Channel::Stable,
            build: 0,
        }
    }
}

/// One field of the text form: the capture group it is read from, its
/// maximum width and how it is stored.
struct FieldDescriptor {
    name: &'static str,
    max_len: usize,
    extract: fn(&mut Fields, &str, &str) -> Result<(), VersionError>,
}

fn number(text: &str, input: &str, field: &'static str) -> Result<u32, VersionError> {
    text.parse().map_err(|_| VersionError::NumberOutOfRange {
        input: input.to_string(),
        field,
    })
}

const FIELDS: [FieldDescriptor; 5] = [
    FieldDescriptor {
        name: "major",
        max_len: 4,
        extract: |f, text, input| {
            f.major = number(text, input, "major")?;
            Ok(())
        },
    },
    FieldDescriptor {
        name: "minor",
        max_len: 2,
        extract: |f, text, input| {
            f.minor = number(text, input, "minor")?;
            Ok(())
        },
    },
    FieldDescriptor {
        name: "patch",
        max_len: 2,
        extract: |f, text, input| {
            f.patch = number(text, input, "patch")?;
            Ok(())
        },
    },
    FieldDescriptor {
        name: "channel",
        max_len: 1,
        extract: |f, text, input| {
            let shorthand = text.chars().next().unwrap_or_default();
            f.channel = Channel::from_shorthand(shorthand).ok_or_else(|| {
                VersionError::UnsupportedChannel {
                    input: input.to_string(),
                    shorthand,
                }
            })?;
            Ok(())
        },
    },
    FieldDescriptor {
        name: "build",
        max_len: 3,
        extract: |f, text, input| {
            f.build = number(text, input, "build")?;
            Ok(())
        },
    },
];

// ---------------------------------------------------------------------------
// EngineVersion
// ---------------------------------------------------------------------------

/// An editor release.
///
/// Ordering and equality consider major, minor, patch, channel rank and
/// build only. At equal major.minor.patch every Stable build outranks every
/// Patch build, which outranks every Beta, which outranks every Alpha.
#[derive(Debug, Clone)]
pub struct EngineVersion {
    major: u32,
    minor: u32,
    patch: u32,
    channel: Channel,
    build: u32,
    revision: Option<Revision>,
    lts: bool,
}

impl EngineVersion {
    /// Parse a bare version such as `2022.2.1f2` or `2022.2.0`.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let caps = pattern()
            .captures(input)
            .ok_or_else(|| VersionError::InvalidSyntax {
                input: input.to_string(),
                expected: EXPECTED,
            })?;

        let mut fields = Fields::default();
        for descriptor in &FIELDS {
            let Some(m) = caps.name(descriptor.name) else {
                continue;
            };
            if m.as_str().len() > descriptor.max_len {
                return Err(VersionError::FieldTooLong {
                    input: input.to_string(),
                    field: descriptor.name,
                    max: descriptor.max_len,
                    actual: m.as_str().len(),
                });
            }
            (descriptor.extract)(&mut fields, m.as_str(), input)?;
        }

        Ok(EngineVersion {
            major: fields.major,
            minor: fields.minor,
            patch: fields.patch,
            channel: fields.channel,
            build: fields.build,
            revision: None,
            lts: false,
        })
    }

    /// Parse `2022.2.1f2 (abcdef123456)`.
    pub fn parse_with_revision(input: &str) -> Result<Self, VersionError> {
        let caps = with_revision_pattern()
            .captures(input.trim())
            .ok_or_else(|| VersionError::InvalidSyntax {
                input: input.to_string(),
                expected: EXPECTED_WITH_REVISION,
            })?;
        let version = Self::parse(caps["version"].trim())?;
        let revision = Revision::parse(caps["revision"].trim())?;
        Ok(version.with_revision(revision))
    }

    pub fn with_revision(mut self, revision: Revision) -> Self {
        self.revision = Some(revision);
        self
    }

    pub fn with_lts(mut self, lts: bool) -> Self {
        self.lts = lts;
        self
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn patch(&self) -> u32 {
        self.patch
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn build(&self) -> u32 {
        self.build
    }

    pub fn revision(&self) -> Option<&Revision> {
        self.revision.as_ref()
    }

    pub fn is_lts(&self) -> bool {
        self.lts
    }

    /// `2022.2.1f2 (abcdef123456)`, or the bare version without a revision.
    pub fn display_with_revision(&self) -> String {
        match &self.revision {
            Some(rev) => format!("{self} ({rev})"),
            None => self.to_string(),
        }
    }

    fn key(&self) -> (u32, u32, u32, u8, u32) {
        (
            self.major,
            self.minor,
            self.patch,
            self.channel.rank(),
            self.build,
        )
    }
}

impl PartialEq for EngineVersion {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for EngineVersion {}

impl Hash for EngineVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for EngineVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EngineVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.channel != Channel::Stable || self.build != 0 {
            write!(f, "{}{}", self.channel.shorthand(), self.build)?;
        }
        Ok(())
    }
}

impl FromStr for EngineVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
