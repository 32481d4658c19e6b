//! Unknown and deprecated configuration key detection.

use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;

/// Tracks which configuration fields are recognised
pub struct ConfigValidator {
    /// Set of valid configuration fields
    known_fields: HashSet<&'static str>,
    /// Fields still accepted for old config files but ignored
    deprecated_fields: HashSet<&'static str>,
}

impl ConfigValidator {
    /// Validator for the current configuration layout.
    #[must_use]
    pub fn new() -> Self {
        let known_fields = [
            "core.debug",
            "scan.paths",
            "scan.default_root",
            "scan.exclude_names",
            "scan.exclude_extensions",
            "scan.parallel_roots",
            "scan.threads",
            "storage.catalog_path",
            "storage.unreadable_log",
            "storage.compression_level",
            "report.title",
            "report.recipients",
            "report.send_unchanged",
        ]
        .into_iter()
        .collect();

        // Older configs named the mail section `email` with a `to` list
        let deprecated_fields = ["email.to", "email.title"].into_iter().collect();

        Self {
            known_fields,
            deprecated_fields,
        }
    }

    /// Validate a configuration file and describe unknown or deprecated fields
    ///
    /// A missing file yields no warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub fn validate_config_file(&self, config_path: &Path) -> Result<Vec<String>> {
        if !config_path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(config_path)?;
        self.validate_str(&content)
    }

    /// Validate TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML
    pub fn validate_str(&self, content: &str) -> Result<Vec<String>> {
        let parsed: toml::Table = toml::from_str(content)?;

        let mut unknown = Vec::new();
        let mut deprecated = Vec::new();
        self.check_table(&parsed, "", &mut unknown, &mut deprecated);

        let mut warnings: Vec<String> = unknown
            .into_iter()
            .map(|field| format!("Unknown configuration field: {field}"))
            .collect();
        warnings.extend(deprecated.into_iter().map(|field| {
            format!("Deprecated field '{field}': use report.recipients and report.title instead")
        }));

        Ok(warnings)
    }

    /// Recursively checks a TOML table for unknown and deprecated fields
    fn check_table(
        &self,
        table: &toml::Table,
        prefix: &str,
        unknown: &mut Vec<String>,
        deprecated: &mut Vec<String>,
    ) {
        for (key, value) in table {
            let full_key = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };

            if self.deprecated_fields.contains(full_key.as_str()) {
                deprecated.push(full_key);
                continue;
            }

            match value {
                toml::Value::Table(inner) if !self.known_fields.contains(full_key.as_str()) => {
                    self.check_table(inner, &full_key, unknown, deprecated);
                }
                _ if self.known_fields.contains(full_key.as_str()) => {}
                _ => unknown.push(full_key),
            }
        }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_fields_produce_no_warnings() -> Result<()> {
        let warnings = ConfigValidator::new()
            .validate_str("[core]\ndebug = true\n[scan]\npaths = [\"/srv\"]\n")?;
        assert!(warnings.is_empty());
        Ok(())
    }

    #[test]
    fn test_unknown_and_deprecated_fields() -> Result<()> {
        let warnings = ConfigValidator::new().validate_str(
            "[scan]\npathz = [\"/srv\"]\n[email]\nto = [\"a@b.c\"]\n[extra]\nx = 1\n",
        )?;
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().any(|w| w.contains("scan.pathz")));
        assert!(warnings.iter().any(|w| w.contains("extra.x")));
        assert!(warnings.iter().any(|w| w.contains("Deprecated field 'email.to'")));
        Ok(())
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(ConfigValidator::new().validate_str("[scan").is_err());
    }
}
