//! Trilinear interpolation and octant-symmetric evaluation of a field map
//!
//! A map may tabulate only the first octant (x, y, z >= 0). [`evaluate`]
//! reflects the query point into that octant and restores the component
//! signs afterwards; [`interpolate`] reads the table as stored.

use nalgebra::Vector3;

use crate::grid::FieldGrid;

/// Result of a field query, in milligauss.
///
/// `in_bounds` is false when the point has no enclosing grid cell, in which
/// case `b` is the zero vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldValue {
    pub b: Vector3<f64>,
    pub in_bounds: bool,
}

impl FieldValue {
    pub fn outside() -> Self {
        Self {
            b: Vector3::zeros(),
            in_bounds: false,
        }
    }
}

/// Lower cell index and fractional offset along one axis
fn locate(coord: f64, origin: f64, spacing: f64, nodes: usize) -> Option<(usize, f64)> {
    let u = (coord - origin) / spacing;
    if !u.is_finite() {
        return None;
    }
    let i = u.floor();
    if i < 0.0 || i >= (nodes - 1) as f64 {
        return None;
    }
    Some((i as usize, u - i))
}

/// Trilinear interpolation of the stored table at `point` (metres).
///
/// Blends along x, then y, then z. A point whose lower corner index falls
/// outside `[0, n-1)` on any axis yields [`FieldValue::outside`].
pub fn interpolate(grid: &FieldGrid, point: &Vector3<f64>) -> FieldValue {
    let [nx, ny, nz] = grid.dims();
    let origin = grid.origin();
    let spacing = grid.spacing();

    let cell = (
        locate(point.x, origin.x, spacing.x, nx),
        locate(point.y, origin.y, spacing.y, ny),
        locate(point.z, origin.z, spacing.z, nz),
    );
    let ((ix, fx), (iy, fy), (iz, fz)) = match cell {
        (Some(x), Some(y), Some(z)) => (x, y, z),
        _ => {
            tracing::trace!(
                "Position ({}, {}, {}) m is outside the field map",
                point.x,
                point.y,
                point.z
            );
            return FieldValue::outside();
        }
    };
    let (gx, gy, gz) = (1.0 - fx, 1.0 - fy, 1.0 - fz);

    let mut b = Vector3::zeros();
    for ax in 0..3 {
        let s = |dx: usize, dy: usize, dz: usize| grid.sample(ax, ix + dx, iy + dy, iz + dz) as f64;

        let b00 = gx * s(0, 0, 0) + fx * s(1, 0, 0);
        let b10 = gx * s(0, 1, 0) + fx * s(1, 1, 0);
        let b01 = gx * s(0, 0, 1) + fx * s(1, 0, 1);
        let b11 = gx * s(0, 1, 1) + fx * s(1, 1, 1);

        let b0 = gy * b00 + fy * b10;
        let b1 = gy * b01 + fy * b11;

        b[ax] = gz * b0 + fz * b1;
    }

    FieldValue { b, in_bounds: true }
}

/// Per-component sign factors applied after folding `point` into the first
/// octant. Chosen from the signs of the raw coordinates:
///
/// - `x < 0` flips component 0
/// - `y < 0` flips components 0 and 2
/// - `z < 0` flips component 2
pub fn octant_signs(point: &Vector3<f64>) -> Vector3<f64> {
    let mx = if point.x < 0.0 {
        Vector3::new(-1.0, 1.0, 1.0)
    } else {
        Vector3::repeat(1.0)
    };
    let my = if point.y < 0.0 {
        Vector3::new(-1.0, 1.0, -1.0)
    } else {
        Vector3::repeat(1.0)
    };
    let mz = if point.z < 0.0 {
        Vector3::new(1.0, 1.0, -1.0)
    } else {
        Vector3::repeat(1.0)
    };
    mx.component_mul(&my).component_mul(&mz)
}

/// Evaluate the field anywhere in space from a first-octant table
pub fn evaluate(grid: &FieldGrid, point: &Vector3<f64>) -> FieldValue {
    let folded = point.abs();
    let value = interpolate(grid, &folded);
    FieldValue {
        b: value.b.component_mul(&octant_signs(point)),
        in_bounds: value.in_bounds,
    }
}
