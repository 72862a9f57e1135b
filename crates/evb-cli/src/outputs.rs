//! Key/value results for the calling pipeline.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// Ordered `name=value` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutputs {
    entries: Vec<(String, String)>,
}

impl ActionOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing an earlier value.
    pub fn set(&mut self, name: &str, value: impl ToString) {
        let value = value.to_string();
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(name, value)| format!("{name}={value}\n"))
            .collect()
    }

    /// Append to `output_file` when given, otherwise print to stdout.
    pub fn write(&self, output_file: Option<&Path>) -> Result<()> {
        match output_file {
            Some(path) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open output file {}", path.display()))?;
                file.write_all(self.render().as_bytes())
                    .with_context(|| format!("Failed to write output file {}", path.display()))?;
            }
            None => print!("{}", self.render()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_and_keeps_order() {
        let mut outputs = ActionOutputs::new();
        outputs.set("has-newer-version", false);
        outputs.set("current-version", "2022.2.0f1");
        outputs.set("has-newer-version", true);

        assert_eq!(outputs.get("has-newer-version"), Some("true"));
        assert_eq!(
            outputs.render(),
            "has-newer-version=true\ncurrent-version=2022.2.0f1\n"
        );
    }

    #[test]
    fn test_write_appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_output");
        std::fs::write(&path, "earlier=1\n").unwrap();

        let mut outputs = ActionOutputs::new();
        outputs.set("pull-request-id", 7);
        outputs.write(Some(path.as_path())).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "earlier=1\npull-request-id=7\n"
        );
    }
}
