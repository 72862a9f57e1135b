//! Package versions such as `1.3.0` or `2.1.1-preview.4`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::VersionError;

const PATTERN: &str = r"^(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)(?:-(?P<suffix>.+))?$";
const EXPECTED: &str = "major.minor.patch optionally followed by -suffix, e.g. 2.1.1-preview.4";

fn pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PATTERN).expect("package version pattern is valid"))
}

fn first_digit_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("digit pattern is valid"))
}

/// A registry package version.
///
/// A suffixed version (`-preview.4`, `-exp.1`) is a pre-release and sorts
/// below the unsuffixed release with the same major.minor.patch. Between
/// pre-releases the first number in the suffix decides.
#[derive(Debug, Clone)]
pub struct PackageVersion {
    major: u32,
    minor: u32,
    patch: u32,
    suffix: String,
    /// First number of the suffix plus one; 1 for a suffix without digits.
    suffix_number: Option<u32>,
}

impl PackageVersion {
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let caps = pattern()
            .captures(input)
            .ok_or_else(|| VersionError::InvalidSyntax {
                input: input.to_string(),
                expected: EXPECTED,
            })?;
        let number = |field: &'static str, text: &str| -> Result<u32, VersionError> {
            text.parse().map_err(|_| VersionError::NumberOutOfRange {
                input: input.to_string(),
                field,
            })
        };

        let major = number("major", &caps["major"])?;
        let minor = number("minor", &caps["minor"])?;
        let patch = number("patch", &caps["patch"])?;
        let suffix = caps
            .name("suffix")
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let suffix_number = if suffix.is_empty() {
            None
        } else {
            let parsed = match first_digit_run().find(&suffix) {
                Some(m) => number("suffix", m.as_str())?,
                None => 0,
            };
            Some(
                parsed
                    .checked_add(1)
                    .ok_or_else(|| VersionError::NumberOutOfRange {
                        input: input.to_string(),
                        field: "suffix",
                    })?,
            )
        };

        Ok(PackageVersion {
            major,
            minor,
            patch,
            suffix,
            suffix_number,
        })
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

    /// Pre-release suffix without the leading dash; empty for releases.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn suffix_number(&self) -> Option<u32> {
        self.suffix_number
    }

    pub fn is_preview(&self) -> bool {
        self.suffix_number.is_some()
    }

    fn key(&self) -> (u32, u32, u32, u8, u32, &str) {
        let is_release = u8::from(!self.is_preview());
        (
            self.major,
            self.minor,
            self.patch,
            is_release,
            self.suffix_number.unwrap_or(0),
            &self.suffix,
        )
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PackageVersion {}

impl Hash for PackageVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.suffix.is_empty() {
            write!(f, "-{}", self.suffix)?;
        }
        Ok(())
    }
}

impl FromStr for PackageVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PackageVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackageVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
