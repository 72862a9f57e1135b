//! What a bump pull request updates: the editor, or one package.

use std::fmt;

use crate::domain::error::{BumpError, Result, VersionError};
use crate::domain::{project_version, Channel, EngineVersion, PackageVersion};
use crate::manifest::{Manifest, MANIFEST_PATH};

/// Target kind recorded for editor bumps.
pub const EDITOR_TARGET: &str = "editor";

/// A version type the reconciler can compare, record in a marker and read
/// back on the next run.
pub trait BumpVersion: Ord + Clone + fmt::Display + Send + Sync {
    /// Full form used in pull request bodies and markers.
    fn detailed(&self) -> String;

    /// Inverse of [`BumpVersion::detailed`].
    fn parse_detailed(text: &str) -> std::result::Result<Self, VersionError>;
}

impl BumpVersion for EngineVersion {
    fn detailed(&self) -> String {
        self.display_with_revision()
    }

    fn parse_detailed(text: &str) -> std::result::Result<Self, VersionError> {
        if text.contains('(') {
            EngineVersion::parse_with_revision(text)
        } else {
            EngineVersion::parse(text)
        }
    }
}

impl BumpVersion for PackageVersion {
    fn detailed(&self) -> String {
        self.to_string()
    }

    fn parse_detailed(text: &str) -> std::result::Result<Self, VersionError> {
        PackageVersion::parse(text)
    }
}

/// One update target.
pub trait UpdateSubject: Send + Sync {
    type Version: BumpVersion;

    /// Recorded in the marker and used as the branch segment.
    fn target_kind(&self) -> &str;

    /// Name shown in commit titles.
    fn title_name(&self) -> &str;

    /// Phrase that opens the pull request body: "Bumps {this} version ...".
    fn body_subject(&self) -> String;

    fn current(&self) -> &Self::Version;

    /// Project-relative path of the file a bump rewrites.
    fn file_path(&self) -> &str;

    /// Full content of [`UpdateSubject::file_path`] after bumping to `target`.
    fn render_file(&self, target: &Self::Version) -> Result<String>;

    /// Markdown link to the target's release notes, if there is one.
    fn release_notes(&self, target: &Self::Version) -> Option<String>;
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// The project's pinned editor version.
#[derive(Debug, Clone)]
pub struct EditorSubject {
    current: EngineVersion,
}

impl EditorSubject {
    pub fn new(current: EngineVersion) -> Self {
        Self { current }
    }

    /// Build from the text of `ProjectVersion.txt`.
    pub fn from_project_version(text: &str) -> Result<Self> {
        Ok(Self::new(project_version::parse(text)?))
    }
}

impl UpdateSubject for EditorSubject {
    type Version = EngineVersion;

    fn target_kind(&self) -> &str {
        EDITOR_TARGET
    }

    fn title_name(&self) -> &str {
        "UnityEditor"
    }

    fn body_subject(&self) -> String {
        "the [Unity Editor](https://unity3d.com/get-unity/download)".to_string()
    }

    fn current(&self) -> &EngineVersion {
        &self.current
    }

    fn file_path(&self) -> &str {
        project_version::PROJECT_VERSION_PATH
    }

    fn render_file(&self, target: &EngineVersion) -> Result<String> {
        Ok(project_version::render(target))
    }

    fn release_notes(&self, target: &EngineVersion) -> Option<String> {
        let link = match target.channel() {
            Channel::Alpha | Channel::Beta => format!(
                "- [{} release notes](https://unity3d.com/beta/{}.{}{}#:~:text=Latest%20version-,Release%20notes,-Archive)",
                target.channel(),
                target.major(),
                target.minor(),
                target.channel().shorthand(),
            ),
            Channel::Patch | Channel::Stable => {
                "- [Release notes](https://unity3d.com/get-unity/download/archive)".to_string()
            }
        };
        Some(link)
    }
}

// ---------------------------------------------------------------------------
// Package
// ---------------------------------------------------------------------------

/// One registry package pinned in the manifest.
#[derive(Debug, Clone)]
pub struct PackageSubject<'a> {
    manifest: &'a Manifest,
    name: String,
    registry_url: String,
    current: PackageVersion,
}

impl<'a> PackageSubject<'a> {
    /// Look `name` up in `manifest`. Fails when the package is missing or
    /// pinned to something other than a registry version.
    pub fn new(manifest: &'a Manifest, name: &str) -> Result<Self> {
        let current = manifest
            .dependency(name)
            .and_then(|d| d.version())
            .cloned()
            .ok_or_else(|| BumpError::UnknownPackage(name.to_string()))?;
        Ok(Self {
            manifest,
            name: name.to_string(),
            registry_url: manifest.registry_for_package(name).to_string(),
            current,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }
}

impl UpdateSubject for PackageSubject<'_> {
    type Version = PackageVersion;

    fn target_kind(&self) -> &str {
        &self.name
    }

    fn title_name(&self) -> &str {
        &self.name
    }

    fn body_subject(&self) -> String {
        format!("`{}`", self.name)
    }

    fn current(&self) -> &PackageVersion {
        &self.current
    }

    fn file_path(&self) -> &str {
        MANIFEST_PATH
    }

    fn render_file(&self, target: &PackageVersion) -> Result<String> {
        self.manifest.with_dependency(&self.name, target)?.generate()
    }

    fn release_notes(&self, _target: &PackageVersion) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_detailed_round_trips() {
        let v = EngineVersion::parse_with_revision("2022.2.1f2 (abcdef123456)").unwrap();
        assert_eq!(v.detailed(), "2022.2.1f2 (abcdef123456)");
        assert_eq!(EngineVersion::parse_detailed(&v.detailed()).unwrap(), v);
        assert_eq!(
            EngineVersion::parse_detailed("2022.2.1f2").unwrap(),
            EngineVersion::parse("2022.2.1f2").unwrap()
        );
    }

    #[test]
    fn test_editor_release_notes_by_channel() {
        let subject = EditorSubject::new(EngineVersion::parse("2022.1.0f1").unwrap());
        let beta = subject
            .release_notes(&EngineVersion::parse("2022.2.0b3").unwrap())
            .unwrap();
        assert!(beta.starts_with("- [Beta release notes](https://unity3d.com/beta/2022.2b"));
        let stable = subject
            .release_notes(&EngineVersion::parse("2022.1.1f1").unwrap())
            .unwrap();
        assert_eq!(
            stable,
            "- [Release notes](https://unity3d.com/get-unity/download/archive)"
        );
    }

    #[test]
    fn test_package_subject_requires_registry_version() {
        let manifest = Manifest::parse(
            r#"{"dependencies":{"com.a":"1.0.0","com.b":"file:../b"}}"#,
        )
        .unwrap();
        let subject = PackageSubject::new(&manifest, "com.a").unwrap();
        assert_eq!(subject.current().to_string(), "1.0.0");
        assert_eq!(subject.registry_url(), crate::manifest::DEFAULT_REGISTRY_URL);
        assert!(matches!(
            PackageSubject::new(&manifest, "com.b"),
            Err(BumpError::UnknownPackage(_))
        ));
        assert!(PackageSubject::new(&manifest, "com.c").is_err());
    }

    #[test]
    fn test_package_render_updates_single_entry() {
        let manifest = Manifest::parse("{\n  \"dependencies\": {\n    \"com.a\": \"1.0.0\",\n    \"com.b\": \"2.0.0\"\n  }\n}\n").unwrap();
        let subject = PackageSubject::new(&manifest, "com.a").unwrap();
        let rendered = subject
            .render_file(&PackageVersion::parse("1.2.0").unwrap())
            .unwrap();
        assert_eq!(
            rendered,
            "{\n  \"dependencies\": {\n    \"com.a\": \"1.2.0\",\n    \"com.b\": \"2.0.0\"\n  }\n}\n"
        );
    }
}
