//! Magnetic field backed by a loaded map, with unit and frame handling

use nalgebra::Vector3;

use crate::config::{FieldConfig, MapFrame};
use crate::error::{FieldMapError, Result};
use crate::evaluator::{evaluate, FieldValue};
use crate::grid::FieldGrid;
use crate::{FieldUnit, LengthUnit};

/// Static magnetic field read from a first-octant map
#[derive(Debug, Clone)]
pub struct MappedMagneticField<'a> {
    grid: &'a FieldGrid,
    zero_field_outside_map: bool,
    frame: MapFrame,
    length_unit: LengthUnit,
    field_unit: FieldUnit,
}

impl<'a> MappedMagneticField<'a> {
    pub fn new(grid: &'a FieldGrid, config: &FieldConfig) -> Self {
        Self {
            grid,
            zero_field_outside_map: config.zero_field_outside_map,
            frame: config.frame,
            length_unit: config.length_unit,
            field_unit: config.field_unit,
        }
    }

    pub fn grid(&self) -> &FieldGrid {
        self.grid
    }

    pub fn field_unit(&self) -> FieldUnit {
        self.field_unit
    }

    pub fn length_unit(&self) -> LengthUnit {
        self.length_unit
    }

    /// Field at `position` (in the configured length unit and frame), with
    /// the in-map flag. Never fails.
    pub fn field_value(&self, position: &Vector3<f64>) -> FieldValue {
        let metres = position.map(|v| self.length_unit.to_meters(v));
        let value = match self.frame {
            MapFrame::Map => evaluate(self.grid, &metres),
            MapFrame::Detector => {
                let local = Vector3::new(metres.y, metres.z, metres.x);
                let value = evaluate(self.grid, &local);
                FieldValue {
                    b: Vector3::new(value.b.z, value.b.x, value.b.y),
                    in_bounds: value.in_bounds,
                }
            }
        };
        FieldValue {
            b: value.b.map(|v| self.field_unit.from_milligauss(v)),
            in_bounds: value.in_bounds,
        }
    }

    /// Field at `position`, failing outside the map unless configured to
    /// report a zero field there
    pub fn compute_magnetic_field(&self, position: &Vector3<f64>) -> Result<Vector3<f64>> {
        let value = self.field_value(position);
        if !value.in_bounds && !self.zero_field_outside_map {
            let m = position.map(|v| self.length_unit.to_meters(v));
            return Err(FieldMapError::OutsideMap {
                x: m.x,
                y: m.y,
                z: m.z,
            });
        }
        tracing::debug!(
            "Magnetic field values = ({}, {}, {}) {}",
            value.b.x,
            value.b.y,
            value.b.z,
            self.field_unit.symbol()
        );
        Ok(value.b)
    }

    /// Multi-line summary of the mapping
    pub fn describe(&self) -> String {
        format!(
            "mapped_magnetic_field: mode 'import_csv_map_0'\n{}\n  frame = {:?}\n  zero field outside map = {}",
            self.grid, self.frame, self.zero_field_outside_map
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Constant components (1000, 2000, 3000) mG over [0, 2] m on every axis
    fn constant_grid() -> FieldGrid {
        FieldGrid::from_fn([3, 3, 3], Vector3::zeros(), Vector3::repeat(1.0), |ax, _, _, _| {
            1000 * (ax as i32 + 1)
        })
        .unwrap()
    }

    #[test]
    fn test_map_frame_in_gauss() {
        let grid = constant_grid();
        let config = FieldConfig {
            field_unit: FieldUnit::Gauss,
            ..FieldConfig::default()
        };
        let field = MappedMagneticField::new(&grid, &config);
        let b = field.compute_magnetic_field(&Vector3::new(0.5, 0.5, 0.5)).unwrap();
        assert!((b.x - 1.0).abs() < 1e-12);
        assert!((b.y - 2.0).abs() < 1e-12);
        assert!((b.z - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_detector_frame_permutes_axes() {
        let grid = constant_grid();
        let config = FieldConfig {
            frame: MapFrame::Detector,
            ..FieldConfig::default()
        };
        let field = MappedMagneticField::new(&grid, &config);

        let b = field.compute_magnetic_field(&Vector3::new(0.5, 0.5, 0.5)).unwrap();
        assert_eq!(b, Vector3::new(3000.0, 1000.0, 2000.0));

        // Detector Y < 0 is map x < 0, which flips map component 0 (detector Y)
        let b = field.compute_magnetic_field(&Vector3::new(0.5, -0.5, 0.5)).unwrap();
        assert_eq!(b, Vector3::new(3000.0, -1000.0, 2000.0));

        // Detector Z < 0 is map y < 0, which flips map components 0 and 2
        let b = field.compute_magnetic_field(&Vector3::new(0.5, 0.5, -0.5)).unwrap();
        assert_eq!(b, Vector3::new(-3000.0, -1000.0, 2000.0));

        // Detector X < 0 is map z < 0, which flips map component 2 (detector X)
        let b = field.compute_magnetic_field(&Vector3::new(-0.5, 0.5, 0.5)).unwrap();
        assert_eq!(b, Vector3::new(-3000.0, 1000.0, 2000.0));
    }

    #[test]
    fn test_length_unit_applies_to_positions() {
        let grid = constant_grid();
        let config = FieldConfig {
            length_unit: LengthUnit::Millimeter,
            ..FieldConfig::default()
        };
        let field = MappedMagneticField::new(&grid, &config);
        assert!(field.field_value(&Vector3::new(1500.0, 500.0, 500.0)).in_bounds);
        assert!(!field.field_value(&Vector3::new(2500.0, 500.0, 500.0)).in_bounds);
    }

    #[test]
    fn test_outside_policy() {
        let grid = constant_grid();
        let far = Vector3::new(10.0, 0.5, 0.5);

        let lenient = MappedMagneticField::new(&grid, &FieldConfig::default());
        assert_eq!(lenient.compute_magnetic_field(&far).unwrap(), Vector3::zeros());

        let strict_config = FieldConfig {
            zero_field_outside_map: false,
            ..FieldConfig::default()
        };
        let strict = MappedMagneticField::new(&grid, &strict_config);
        assert!(matches!(
            strict.compute_magnetic_field(&far),
            Err(FieldMapError::OutsideMap { .. })
        ));
    }

    #[test]
    fn test_describe_lists_header() {
        let grid = constant_grid();
        let field = MappedMagneticField::new(&grid, &FieldConfig::default());
        let text = field.describe();
        assert!(text.contains("nx = 3"));
        assert!(text.contains("dz = 1000 mm"));
    }
}
