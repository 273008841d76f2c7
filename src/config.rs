// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use crate::bbox::BoundingBox;
use crate::errors::SubnetError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SubnetConfig {
    pub bbox: BoundingBox,
    // Re-parse both outputs and check referential closure
    pub strict_format_checks: bool,
    // Log the full text of every deleted element
    pub verbose_removal_logging: bool,
}

impl Default for SubnetConfig {
    fn default() -> Self {
        Self {
            bbox: BoundingBox::default(),
            strict_format_checks: true,
            verbose_removal_logging: false,
        }
    }
}

impl SubnetConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, SubnetError> {
        let config: SubnetConfig =
            ron::from_str(text).map_err(|e| SubnetError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, SubnetError> {
        let text = std::fs::read_to_string(path).map_err(|source| SubnetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    pub fn validate(&self) -> Result<(), SubnetError> {
        self.bbox.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_box() {
        let config = SubnetConfig::default();
        assert_eq!(config.bbox.xmin, 5000.0);
        assert_eq!(config.bbox.ymax, 8000.0);
        assert!(config.strict_format_checks);
        assert!(!config.verbose_removal_logging);
    }

    #[test]
    fn reads_partial_ron() {
        let config = SubnetConfig::from_ron_str(
            "(bbox: (xmin: 0.0, xmax: 100.0, ymin: -50.0, ymax: 50.0), verbose_removal_logging: true)",
        )
        .unwrap();

        assert_eq!(config.bbox.ymin, -50.0);
        assert!(config.verbose_removal_logging);
        assert!(config.strict_format_checks);
    }

    #[test]
    fn rejects_an_empty_box() {
        let result = SubnetConfig::from_ron_str(
            "(bbox: (xmin: 100.0, xmax: 0.0, ymin: 0.0, ymax: 50.0))",
        );
        assert!(matches!(result, Err(SubnetError::Config(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = SubnetConfig::load(Path::new("/definitely/not/here.ron"));
        assert!(matches!(result, Err(SubnetError::Io { .. })));
    }
}
