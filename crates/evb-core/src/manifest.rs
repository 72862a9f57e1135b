//! `Packages/manifest.json`: package dependencies and scoped registries.
//!
//! The manifest document is kept in read order and written back as 2-space
//! pretty JSON. For a manifest in that canonical form,
//! `generate(parse(text)) == text`, so a bump commit changes exactly one
//! dependency line.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::domain::error::{BumpError, Result};
use crate::domain::PackageVersion;

/// Location of the manifest inside a project.
pub const MANIFEST_PATH: &str = "Packages/manifest.json";

/// Registry used for packages not claimed by a scoped registry.
pub const DEFAULT_REGISTRY_URL: &str = "https://packages.unity.com";

/// Right-hand side of a `dependencies` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// A registry version that can be bumped
    Version(PackageVersion),
    /// Anything else (`file:`, git URLs, ...), kept verbatim
    Reference(String),
}

impl Dependency {
    pub fn version(&self) -> Option<&PackageVersion> {
        match self {
            Dependency::Version(v) => Some(v),
            Dependency::Reference(_) => None,
        }
    }
}

impl Serialize for Dependency {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Dependency::Version(v) => serializer.collect_str(v),
            Dependency::Reference(r) => serializer.serialize_str(r),
        }
    }
}

impl<'de> Deserialize<'de> for Dependency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(match PackageVersion::parse(&text) {
            Ok(v) => Dependency::Version(v),
            Err(_) => Dependency::Reference(text),
        })
    }
}

/// An entry of `scopedRegistries`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScopedRegistry {
    pub name: String,
    pub url: String,
    pub scopes: Vec<String>,
}

impl ScopedRegistry {
    /// A scope claims a package when it equals the name or is a dotted
    /// prefix of it (`com.example` claims `com.example.tools`).
    pub fn claims(&self, package: &str) -> bool {
        self.scopes.iter().any(|scope| {
            package == scope
                || package
                    .strip_prefix(scope.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

/// Typed view of the keys the bot interprets.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestView {
    dependencies: IndexMap<String, Dependency>,
    #[serde(default)]
    scoped_registries: Option<Vec<ScopedRegistry>>,
    #[serde(default)]
    testables: Option<Vec<String>>,
}

/// A parsed project manifest.
///
/// The whole document is kept as read. [`Manifest::generate`] writes it back
/// with only the `dependencies` value replaced, so top-level key order and
/// every key the bot does not interpret survive a bump untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    document: Map<String, Value>,
    dependencies: IndexMap<String, Dependency>,
    scoped_registries: Vec<ScopedRegistry>,
    testables: Option<Vec<String>>,
    trailing_newline: bool,
}

impl Manifest {
    pub fn parse(text: &str) -> Result<Self> {
        let document: Map<String, Value> = serde_json::from_str(text)?;
        let view: ManifestView = serde_json::from_value(Value::Object(document.clone()))?;
        Ok(Manifest {
            document,
            dependencies: view.dependencies,
            scoped_registries: view.scoped_registries.unwrap_or_default(),
            testables: view.testables,
            trailing_newline: text.ends_with('\n'),
        })
    }

    pub fn generate(&self) -> Result<String> {
        let mut document = self.document.clone();
        // An existing key keeps its position on insert.
        document.insert(
            "dependencies".to_string(),
            serde_json::to_value(&self.dependencies)?,
        );
        let mut text = serde_json::to_string_pretty(&document)?;
        if self.trailing_newline {
            text.push('\n');
        }
        Ok(text)
    }

    pub fn dependencies(&self) -> &IndexMap<String, Dependency> {
        &self.dependencies
    }

    pub fn scoped_registries(&self) -> &[ScopedRegistry] {
        &self.scoped_registries
    }

    pub fn testables(&self) -> Option<&[String]> {
        self.testables.as_deref()
    }

    /// Registry URL serving `package`.
    pub fn registry_for_package(&self, package: &str) -> &str {
        self.scoped_registries
            .iter()
            .find(|registry| registry.claims(package))
            .map(|registry| registry.url.as_str())
            .unwrap_or(DEFAULT_REGISTRY_URL)
    }

    pub fn dependency(&self, package: &str) -> Option<&Dependency> {
        self.dependencies.get(package)
    }

    /// Working copy with `package` pinned to `version`. The entry keeps its
    /// position; `self` is untouched.
    pub fn with_dependency(&self, package: &str, version: &PackageVersion) -> Result<Manifest> {
        let mut copy = self.clone();
        match copy.dependencies.get_mut(package) {
            Some(entry) => *entry = Dependency::Version(version.clone()),
            None => return Err(BumpError::UnknownPackage(package.to_string())),
        }
        Ok(copy)
    }

    /// Bumpable dependencies grouped by the registry that serves them, in
    /// manifest order.
    pub fn registry_dependencies(&self) -> IndexMap<String, Vec<(String, PackageVersion)>> {
        let mut grouped: IndexMap<String, Vec<(String, PackageVersion)>> = IndexMap::new();
        for (name, dependency) in &self.dependencies {
            if let Some(version) = dependency.version() {
                grouped
                    .entry(self.registry_for_package(name).to_string())
                    .or_default()
                    .push((name.clone(), version.clone()));
            }
        }
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"{
  "dependencies": {
    "com.unity.ugui": "1.0.0",
    "com.example.local": "file:../local",
    "com.example.tools.extra": "2.0.0-preview.3"
  },
  "scopedRegistries": [
    {
      "name": "Example",
      "url": "https://registry.example.com",
      "scopes": [
        "com.example"
      ]
    }
  ],
  "enableLockFile": true
}"#;

    #[test]
    fn test_parse_keeps_references_verbatim() {
        let manifest = Manifest::parse(SMALL).unwrap();
        assert_eq!(
            manifest.dependency("com.example.local"),
            Some(&Dependency::Reference("file:../local".to_string()))
        );
        assert!(manifest.dependency("com.unity.ugui").unwrap().version().is_some());
    }

    #[test]
    fn test_generate_round_trips_without_trailing_newline() {
        let manifest = Manifest::parse(SMALL).unwrap();
        assert_eq!(manifest.generate().unwrap(), SMALL);
    }

    #[test]
    fn test_scope_prefix_matches_on_dot_boundary() {
        let manifest = Manifest::parse(SMALL).unwrap();
        assert_eq!(
            manifest.registry_for_package("com.example.tools.extra"),
            "https://registry.example.com"
        );
        assert_eq!(
            manifest.registry_for_package("com.examplely.other"),
            DEFAULT_REGISTRY_URL
        );
        assert_eq!(manifest.registry_for_package("com.unity.ugui"), DEFAULT_REGISTRY_URL);
    }

    #[test]
    fn test_with_dependency_leaves_original_untouched() {
        let manifest = Manifest::parse(SMALL).unwrap();
        let bumped = manifest
            .with_dependency("com.unity.ugui", &PackageVersion::parse("1.1.0").unwrap())
            .unwrap();

        assert_eq!(manifest.generate().unwrap(), SMALL);
        assert_eq!(
            bumped.generate().unwrap(),
            SMALL.replace(r#""com.unity.ugui": "1.0.0""#, r#""com.unity.ugui": "1.1.0""#)
        );
        assert!(matches!(
            manifest.with_dependency("com.missing", &PackageVersion::parse("1.0.0").unwrap()),
            Err(BumpError::UnknownPackage(_))
        ));
    }

    #[test]
    fn test_registry_dependencies_skips_references() {
        let grouped = Manifest::parse(SMALL).unwrap().registry_dependencies();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[DEFAULT_REGISTRY_URL][0].0, "com.unity.ugui");
        assert_eq!(grouped["https://registry.example.com"][0].0, "com.example.tools.extra");
    }

    #[test]
    fn test_registries_first_layout_is_preserved() {
        let text = r#"{
  "scopedRegistries": [
    {
      "name": "Example",
      "url": "https://registry.example.com",
      "scopes": [
        "com.example"
      ],
      "overrideBuiltIns": false
    }
  ],
  "dependencies": {
    "com.example.tools": "1.0.0",
    "com.unity.ugui": "1.0.0"
  }
}
"#;
        let manifest = Manifest::parse(text).unwrap();
        assert_eq!(manifest.generate().unwrap(), text);

        let bumped = manifest
            .with_dependency("com.example.tools", &PackageVersion::parse("1.2.0").unwrap())
            .unwrap()
            .generate()
            .unwrap();
        assert_eq!(
            bumped,
            text.replace(r#""com.example.tools": "1.0.0""#, r#""com.example.tools": "1.2.0""#)
        );
        assert_eq!(manifest.scoped_registries()[0].name, "Example");
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(Manifest::parse("{"), Err(BumpError::Json(_))));
        assert!(matches!(
            Manifest::parse(r#"{"scopedRegistries": []}"#),
            Err(BumpError::Json(_))
        ));
    }
}
