//! `ProjectSettings/ProjectVersion.txt` and editor download URLs.

use std::sync::OnceLock;

use regex::Regex;

use super::engine_version::{EngineVersion, Revision};
use super::error::{BumpError, Result, VersionError};

/// Location of the editor version file inside a project.
pub const PROJECT_VERSION_PATH: &str = "ProjectSettings/ProjectVersion.txt";

const KEY_VERSION: &str = "m_EditorVersion";
const KEY_VERSION_WITH_REVISION: &str = "m_EditorVersionWithRevision";

fn download_url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"download(?:_unity)?/([a-f0-9]{12})/").expect("download pattern is valid")
    })
}

/// Read the editor version (with revision when recorded) from the file text.
pub fn parse(text: &str) -> Result<EngineVersion> {
    let mut plain = None;
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            KEY_VERSION_WITH_REVISION => {
                return Ok(EngineVersion::parse_with_revision(value.trim())?);
            }
            KEY_VERSION => plain = Some(value.trim().to_string()),
            _ => {}
        }
    }
    match plain {
        Some(version) => Ok(EngineVersion::parse(&version)?),
        None => Err(BumpError::ProjectVersion(format!(
            "neither {KEY_VERSION_WITH_REVISION} nor {KEY_VERSION} is present"
        ))),
    }
}

/// Render the file for `version`. The revision line is written only when the
/// version carries a revision.
pub fn render(version: &EngineVersion) -> String {
    let mut text = format!("{KEY_VERSION}: {version}\n");
    if version.revision().is_some() {
        text.push_str(&format!(
            "{KEY_VERSION_WITH_REVISION}: {}\n",
            version.display_with_revision()
        ));
    }
    text
}

/// Pull the revision out of an editor installer URL.
pub fn extract_revision(download_url: &str) -> std::result::Result<Revision, VersionError> {
    let caps = download_url_pattern()
        .captures(download_url)
        .ok_or_else(|| VersionError::InvalidDownloadUrl {
            url: download_url.to_string(),
        })?;
    Revision::parse(&caps[1])
}
