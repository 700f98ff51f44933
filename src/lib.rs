//! field-map: Tabulated magnetic field maps with octant-symmetric interpolation
//!
//! This crate provides:
//! - Parsing of comma-separated field map tables into a [`FieldGrid`]
//! - A [`MapRegistry`] handing out stable handles to loaded maps
//! - Trilinear interpolation and first-octant symmetry reconstruction
//! - A configured [`MappedMagneticField`] with unit and frame handling
//!
//! Maps store integer samples in milligauss on a regular grid whose origin
//! and spacing are given in metres.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod field;
pub mod gnuplot;
pub mod grid;
pub mod loader;
pub mod registry;
pub mod sweep;
pub mod writer;

pub use config::{FieldConfig, MapFrame, MappingMode};
pub use error::{FieldMapError, IndexTriple, Result};
pub use evaluator::{evaluate, interpolate, octant_signs, FieldValue};
pub use field::MappedMagneticField;
pub use grid::FieldGrid;
pub use loader::{load, load_path};
pub use registry::{MapHandle, MapRegistry};
pub use writer::write_csv_map;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LengthUnit {
    #[default]
    #[serde(rename = "m", alias = "meter")]
    Meter,
    #[serde(rename = "cm", alias = "centimeter")]
    Centimeter,
    #[serde(rename = "mm", alias = "millimeter")]
    Millimeter,
    #[serde(rename = "um", alias = "micrometer")]
    Micrometer,
}

impl LengthUnit {
    /// Convert from this unit to meters
    pub fn to_meters(&self, value: f64) -> f64 {
        match self {
            LengthUnit::Meter => value,
            LengthUnit::Centimeter => value * 1e-2,
            LengthUnit::Millimeter => value * 1e-3,
            LengthUnit::Micrometer => value * 1e-6,
        }
    }

    /// Convert from meters to this unit
    pub fn from_meters(&self, value: f64) -> f64 {
        match self {
            LengthUnit::Meter => value,
            LengthUnit::Centimeter => value * 1e2,
            LengthUnit::Millimeter => value * 1e3,
            LengthUnit::Micrometer => value * 1e6,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            LengthUnit::Meter => "m",
            LengthUnit::Centimeter => "cm",
            LengthUnit::Millimeter => "mm",
            LengthUnit::Micrometer => "um",
        }
    }
}

impl FromStr for LengthUnit {
    type Err = FieldMapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "m" | "meter" | "meters" => Ok(LengthUnit::Meter),
            "cm" | "centimeter" | "centimeters" => Ok(LengthUnit::Centimeter),
            "mm" | "millimeter" | "millimeters" => Ok(LengthUnit::Millimeter),
            "um" | "µm" | "micrometer" | "micrometers" => Ok(LengthUnit::Micrometer),
            _ => Err(FieldMapError::Config(format!(
                "unknown length unit '{}', use m, cm, mm or um",
                s
            ))),
        }
    }
}

/// Unit of reported magnetic field values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FieldUnit {
    #[default]
    #[serde(rename = "mG", alias = "milligauss")]
    Milligauss,
    #[serde(rename = "G", alias = "gauss")]
    Gauss,
    #[serde(rename = "T", alias = "tesla")]
    Tesla,
}

impl FieldUnit {
    /// Convert a value in milligauss (the map unit) to this unit
    pub fn from_milligauss(&self, value: f64) -> f64 {
        match self {
            FieldUnit::Milligauss => value,
            FieldUnit::Gauss => value * 1e-3,
            // 1 G = 1e-4 T
            FieldUnit::Tesla => value * 1e-7,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            FieldUnit::Milligauss => "mG",
            FieldUnit::Gauss => "G",
            FieldUnit::Tesla => "T",
        }
    }
}

impl FromStr for FieldUnit {
    type Err = FieldMapError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mG" | "mg" | "milligauss" => Ok(FieldUnit::Milligauss),
            "G" | "g" | "gauss" => Ok(FieldUnit::Gauss),
            "T" | "t" | "tesla" => Ok(FieldUnit::Tesla),
            _ => Err(FieldMapError::Config(format!(
                "unknown field unit '{}', use mG, G or T",
                s
            ))),
        }
    }
}
