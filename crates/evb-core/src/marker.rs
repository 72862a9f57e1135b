//! Machine-readable marker embedded in bot pull request bodies.
//!
//! The marker is the only state carried from one run to the next:
//!
//! ```text
//! <!--uvb {"type":"unity-version-bump","version":1,"data":{"targetKind":"editor","version":"2022.2.1f2 (abcdef123456)"}} -->
//! ```
//!
//! Its textual shape is a wire contract with pull requests opened by earlier
//! runs. Readers also accept `data.package` in place of `data.targetKind`.

use serde::{Deserialize, Serialize};

use crate::domain::error::Result;

/// Value of the marker's `type` field.
pub const BOT_ID: &str = "unity-version-bump";

/// Value of the marker's `version` field.
pub const SCHEMA_VERSION: u32 = 1;

const OPEN: &str = "<!--uvb";
const CLOSE: &str = "-->";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    #[serde(rename = "type")]
    pub bot_id: String,
    #[serde(rename = "version")]
    pub schema_version: u32,
    pub data: MarkerData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerData {
    #[serde(alias = "package")]
    pub target_kind: String,
    pub version: String,
}

impl Marker {
    pub fn new(target_kind: &str, version: &str) -> Self {
        Marker {
            bot_id: BOT_ID.to_string(),
            schema_version: SCHEMA_VERSION,
            data: MarkerData {
                target_kind: target_kind.to_string(),
                version: version.to_string(),
            },
        }
    }

    pub fn target_kind(&self) -> &str {
        &self.data.target_kind
    }

    pub fn version(&self) -> &str {
        &self.data.version
    }

    /// HTML comment to append to a pull request body.
    pub fn render(&self) -> Result<String> {
        let payload = serde_json::to_string(self)?;
        Ok(format!("{OPEN} {payload} {CLOSE}"))
    }

    /// Find this bot's marker in `body`.
    ///
    /// Only the first `<!--uvb ... -->` block is considered. A block that is
    /// not valid JSON, names another bot or another schema version yields
    /// `None`.
    pub fn extract(body: &str) -> Option<Marker> {
        let start = body.find(OPEN)? + OPEN.len();
        let rest = &body[start..];
        let end = rest.find(CLOSE)?;
        let marker: Marker = serde_json::from_str(rest[..end].trim()).ok()?;
        (marker.bot_id == BOT_ID && marker.schema_version == SCHEMA_VERSION).then_some(marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_shape() {
        let marker = Marker::new("editor", "2022.2.1f2 (abcdef123456)");
        assert_eq!(
            marker.render().unwrap(),
            r#"<!--uvb {"type":"unity-version-bump","version":1,"data":{"targetKind":"editor","version":"2022.2.1f2 (abcdef123456)"}} -->"#
        );
    }

    #[test]
    fn test_extract_from_body() {
        let marker = Marker::new("com.unity.ugui", "1.1.0");
        let body = format!("Bumps things.\r\n\r\n{}", marker.render().unwrap());
        assert_eq!(Marker::extract(&body), Some(marker));
    }

    #[test]
    fn test_extract_accepts_package_key() {
        let body = r#"text <!--uvb {"type":"unity-version-bump","version":1,"data":{"package":"editor","version":"2022.2.0a17 (234567890abc)"}} -->"#;
        let marker = Marker::extract(body).unwrap();
        assert_eq!(marker.target_kind(), "editor");
        assert_eq!(marker.version(), "2022.2.0a17 (234567890abc)");
    }

    #[test]
    fn test_extract_ignores_foreign_or_broken_blocks() {
        for body in [
            "no marker at all",
            "<!-- a normal comment -->",
            "<!--uvb not json -->",
            r#"<!--uvb {"type":"other-bot","version":1,"data":{"targetKind":"editor","version":"1.0.0"}} -->"#,
            r#"<!--uvb {"type":"unity-version-bump","version":2,"data":{"targetKind":"editor","version":"1.0.0"}} -->"#,
            r#"<!--uvb {"type":"unity-version-bump","version":1,"data":{"targetKind":"editor","version":"1.0.0"}}"#,
        ] {
            assert_eq!(Marker::extract(body), None, "{body}");
        }
    }
}
