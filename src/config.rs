//! Configuration of a mapped magnetic field

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FieldMapError, Result};
use crate::registry::{MapHandle, MapRegistry};
use crate::{FieldUnit, LengthUnit};

/// Supported map file layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MappingMode {
    /// Comma-separated header plus one line per (component, iz, iy) row
    #[default]
    #[serde(rename = "import_csv_map_0")]
    ImportCsvMap0,
}

/// Coordinate frame of query positions and returned field vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MapFrame {
    /// Positions and components are used in map order
    #[default]
    Map,
    /// Detector frame: map axes (x, y, z) are detector axes (Y, Z, X).
    ///
    /// This is the layout csv_map_0 tables are written in, and loaders of
    /// that format always applied the permutation. Select it to reproduce
    /// their results; `Map` is the identity view of the same table.
    Detector,
}

impl FromStr for MapFrame {
    type Err = FieldMapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "map" => Ok(MapFrame::Map),
            "detector" => Ok(MapFrame::Detector),
            _ => Err(FieldMapError::Config(format!(
                "unknown frame '{}', use map or detector",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub mapping_mode: MappingMode,
    /// Map file path, `${VAR}` references are expanded from the environment
    pub map_file: Option<String>,
    /// Report a zero field outside the map instead of an error
    pub zero_field_outside_map: bool,
    pub frame: MapFrame,
    /// Unit of query positions
    pub length_unit: LengthUnit,
    /// Unit of returned field values
    pub field_unit: FieldUnit,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            mapping_mode: MappingMode::ImportCsvMap0,
            map_file: None,
            zero_field_outside_map: true,
            frame: MapFrame::Map,
            length_unit: LengthUnit::Meter,
            field_unit: FieldUnit::Milligauss,
        }
    }
}

impl FieldConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| FieldMapError::Config(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Map file path with environment references expanded
    pub fn resolved_map_file(&self) -> Result<PathBuf> {
        let raw = self
            .map_file
            .as_deref()
            .ok_or_else(|| FieldMapError::Config("missing 'map_file'".to_string()))?;
        if raw.trim().is_empty() {
            return Err(FieldMapError::Config("empty map file name".to_string()));
        }
        expand_env(raw).map(PathBuf::from)
    }

    /// Load the configured map file into `registry`
    pub fn load_into(&self, registry: &mut MapRegistry) -> Result<MapHandle> {
        match self.mapping_mode {
            MappingMode::ImportCsvMap0 => registry.load_path(self.resolved_map_file()?),
        }
    }
}

/// Expand `${NAME}` references using the process environment
fn expand_env(raw: &str) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            FieldMapError::Config(format!("unterminated variable reference in '{}'", raw))
        })?;
        let name = &after[..end];
        let value = std::env::var(name).map_err(|_| {
            FieldMapError::Config(format!("environment variable '{}' is not set", name))
        })?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = FieldConfig::from_json("{}").unwrap();
        assert_eq!(config, FieldConfig::default());
        assert!(config.zero_field_outside_map);
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "mapping_mode": "import_csv_map_0",
            "map_file": "maps/field.csv",
            "zero_field_outside_map": false,
            "frame": "detector",
            "length_unit": "mm",
            "field_unit": "G"
        }"#;
        let config = FieldConfig::from_json(json).unwrap();
        assert_eq!(config.frame, MapFrame::Detector);
        assert_eq!(config.length_unit, LengthUnit::Millimeter);
        assert_eq!(config.field_unit, FieldUnit::Gauss);
        assert!(!config.zero_field_outside_map);
        assert_eq!(config.resolved_map_file().unwrap(), PathBuf::from("maps/field.csv"));
    }

    #[test]
    fn test_parse_frame() {
        assert_eq!("map".parse::<MapFrame>().unwrap(), MapFrame::Map);
        assert_eq!("Detector".parse::<MapFrame>().unwrap(), MapFrame::Detector);
        assert!(matches!("lab".parse::<MapFrame>(), Err(FieldMapError::Config(_))));
    }

    #[test]
    fn test_unknown_mapping_mode() {
        let err = FieldConfig::from_json(r#"{"mapping_mode": "import_csv_map_9"}"#).unwrap_err();
        assert!(matches!(err, FieldMapError::Config(_)));
    }

    #[test]
    fn test_missing_and_empty_map_file() {
        let mut config = FieldConfig::default();
        assert!(config.resolved_map_file().is_err());
        config.map_file = Some("  ".to_string());
        assert!(config.resolved_map_file().is_err());
    }

    #[test]
    fn test_env_expansion() {
        std::env::set_var("FIELD_MAP_TEST_DIR", "/data/maps");
        assert_eq!(
            expand_env("${FIELD_MAP_TEST_DIR}/smooth.csv").unwrap(),
            "/data/maps/smooth.csv"
        );
        assert_eq!(expand_env("plain.csv").unwrap(), "plain.csv");
        assert!(expand_env("${FIELD_MAP_TEST_UNSET_VAR}/x.csv").is_err());
        assert!(expand_env("${FIELD_MAP_TEST_DIR/x.csv").is_err());
    }
}
