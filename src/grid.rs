//! Regular 3D grid of tabulated magnetic field samples

use std::fmt;

use nalgebra::Vector3;

use crate::error::{FieldMapError, Result};
use crate::LengthUnit;

/// Field components stored in a map, in file order
pub const COMPONENTS: [&str; 3] = ["Bx", "By", "Bz"];

/// Nodes per component for `dims`, or `None` if the product overflows
pub fn checked_node_count(dims: [usize; 3]) -> Option<usize> {
    dims[0].checked_mul(dims[1])?.checked_mul(dims[2])
}

/// One loaded magnetic field table.
///
/// Samples are integers in milligauss. Each component is stored flat with x
/// varying fastest: `index = (iz * ny + iy) * nx + ix`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGrid {
    dims: [usize; 3],
    origin: Vector3<f64>,
    spacing: Vector3<f64>,
    samples: [Vec<i32>; 3],
}

impl FieldGrid {
    /// Build a grid, checking dimensions, spacing and sample array shapes
    pub fn new(
        dims: [usize; 3],
        origin: Vector3<f64>,
        spacing: Vector3<f64>,
        samples: [Vec<i32>; 3],
    ) -> Result<Self> {
        for (axis, &n) in ["nx", "ny", "nz"].iter().zip(dims.iter()) {
            if n < 2 {
                return Err(FieldMapError::Config(format!(
                    "{} = {} but every axis needs at least 2 nodes",
                    axis, n
                )));
            }
        }
        if origin.iter().any(|v| !v.is_finite()) {
            return Err(FieldMapError::Config(format!(
                "origin {:?} is not finite",
                origin.as_slice()
            )));
        }
        if spacing.iter().any(|&s| s == 0.0 || !s.is_finite()) {
            return Err(FieldMapError::Config(format!(
                "spacing {:?} must be finite and non-zero",
                spacing.as_slice()
            )));
        }
        let total = checked_node_count(dims).ok_or_else(|| {
            FieldMapError::Config(format!("grid {:?} has too many nodes", dims))
        })?;
        for (name, component) in COMPONENTS.iter().zip(samples.iter()) {
            if component.len() != total {
                return Err(FieldMapError::Config(format!(
                    "{} holds {} samples, expected {}",
                    name,
                    component.len(),
                    total
                )));
            }
        }

        Ok(Self {
            dims,
            origin,
            spacing,
            samples,
        })
    }

    /// Build a grid by evaluating `f(ax, ix, iy, iz)` at every node
    pub fn from_fn<F>(
        dims: [usize; 3],
        origin: Vector3<f64>,
        spacing: Vector3<f64>,
        mut f: F,
    ) -> Result<Self>
    where
        F: FnMut(usize, usize, usize, usize) -> i32,
    {
        let [nx, ny, nz] = dims;
        let total = checked_node_count(dims).ok_or_else(|| {
            FieldMapError::Config(format!("grid {:?} has too many nodes", dims))
        })?;
        let mut samples: [Vec<i32>; 3] = Default::default();
        for (ax, component) in samples.iter_mut().enumerate() {
            component.reserve(total);
            for iz in 0..nz {
                for iy in 0..ny {
                    for ix in 0..nx {
                        component.push(f(ax, ix, iy, iz));
                    }
                }
            }
        }
        Self::new(dims, origin, spacing, samples)
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn origin(&self) -> &Vector3<f64> {
        &self.origin
    }

    pub fn spacing(&self) -> &Vector3<f64> {
        &self.spacing
    }

    /// Flat index of node (ix, iy, iz)
    #[inline]
    pub fn index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        (iz * self.dims[1] + iy) * self.dims[0] + ix
    }

    /// Stored sample of component `ax` at node (ix, iy, iz).
    ///
    /// Panics if any index is out of range.
    #[inline]
    pub fn sample(&self, ax: usize, ix: usize, iy: usize, iz: usize) -> i32 {
        self.samples[ax][self.index(ix, iy, iz)]
    }

    /// All samples of one component
    pub fn component(&self, ax: usize) -> &[i32] {
        &self.samples[ax]
    }

    /// Position of node (ix, iy, iz) in metres
    pub fn node_position(&self, ix: usize, iy: usize, iz: usize) -> Vector3<f64> {
        Vector3::new(
            self.origin.x + ix as f64 * self.spacing.x,
            self.origin.y + iy as f64 * self.spacing.y,
            self.origin.z + iz as f64 * self.spacing.z,
        )
    }

    /// Total number of nodes per component
    pub fn node_count(&self) -> usize {
        self.dims.iter().product()
    }

    /// Corners of the region covered by full interpolation cells (min, max)
    pub fn extent(&self) -> (Vector3<f64>, Vector3<f64>) {
        let far = self.node_position(self.dims[0] - 1, self.dims[1] - 1, self.dims[2] - 1);
        (self.origin.inf(&far), self.origin.sup(&far))
    }
}

impl fmt::Display for FieldGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mm = |v: &Vector3<f64>| v.map(|c| LengthUnit::Millimeter.from_meters(c));
        let origin = mm(&self.origin);
        let spacing = mm(&self.spacing);
        writeln!(f, "  nx = {}", self.dims[0])?;
        writeln!(f, "  ny = {}", self.dims[1])?;
        writeln!(f, "  nz = {}", self.dims[2])?;
        writeln!(
            f,
            "  Origin = ({}, {}, {}) mm",
            origin.x, origin.y, origin.z
        )?;
        writeln!(f, "  dx = {} mm", spacing.x)?;
        writeln!(f, "  dy = {} mm", spacing.y)?;
        write!(f, "  dz = {} mm", spacing.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_grid() -> FieldGrid {
        FieldGrid::from_fn(
            [3, 2, 2],
            Vector3::zeros(),
            Vector3::new(0.5, 1.0, 2.0),
            |ax, ix, iy, iz| (ax * 1000 + iz * 100 + iy * 10 + ix) as i32,
        )
        .unwrap()
    }

    #[test]
    fn test_flat_layout_is_x_fastest() {
        let grid = unit_grid();
        assert_eq!(grid.index(1, 0, 0), 1);
        assert_eq!(grid.index(0, 1, 0), 3);
        assert_eq!(grid.index(0, 0, 1), 6);
        assert_eq!(grid.sample(2, 2, 1, 1), 2112);
        assert_eq!(grid.component(0).len(), grid.node_count());
    }

    #[test]
    fn test_node_position() {
        let grid = unit_grid();
        let p = grid.node_position(2, 1, 1);
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
        assert!((p.z - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_extent_with_negative_spacing() {
        let grid = FieldGrid::from_fn(
            [2, 2, 2],
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(-1.0, 1.0, 1.0),
            |_, _, _, _| 0,
        )
        .unwrap();
        let (min, max) = grid.extent();
        assert_eq!(min.x, 0.0);
        assert_eq!(max.x, 1.0);
    }

    #[test]
    fn test_rejects_degenerate_axis() {
        let result = FieldGrid::from_fn([2, 1, 2], Vector3::zeros(), Vector3::repeat(1.0), |_, _, _, _| 0);
        assert!(matches!(result, Err(FieldMapError::Config(_))));
    }

    #[test]
    fn test_rejects_overflowing_node_count() {
        let big = usize::MAX / 2;
        assert_eq!(checked_node_count([big, 4, 2]), None);
        assert_eq!(checked_node_count([3, 4, 5]), Some(60));

        let samples = [vec![], vec![], vec![]];
        let result = FieldGrid::new([big, 4, 2], Vector3::zeros(), Vector3::repeat(1.0), samples);
        assert!(matches!(result, Err(FieldMapError::Config(_))));

        let result = FieldGrid::from_fn([big, 4, 2], Vector3::zeros(), Vector3::repeat(1.0), |_, _, _, _| 0);
        assert!(matches!(result, Err(FieldMapError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_spacing() {
        let result = FieldGrid::from_fn(
            [2, 2, 2],
            Vector3::zeros(),
            Vector3::new(1.0, 0.0, 1.0),
            |_, _, _, _| 0,
        );
        assert!(matches!(result, Err(FieldMapError::Config(_))));
    }

    #[test]
    fn test_rejects_mismatched_component() {
        let samples = [vec![0; 8], vec![0; 8], vec![0; 7]];
        let result = FieldGrid::new([2, 2, 2], Vector3::zeros(), Vector3::repeat(1.0), samples);
        match result {
            Err(FieldMapError::Config(msg)) => assert!(msg.contains("Bz")),
            other => panic!("Expected shape error, got {:?}", other),
        }
    }
}
