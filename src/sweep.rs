//! Sampling a mapped field over a rectilinear region

use std::io::Write;

use nalgebra::Vector3;

use crate::error::{FieldMapError, Result};
use crate::field::MappedMagneticField;

/// Largest lattice a single sweep will enumerate
pub const MAX_SWEEP_POINTS: usize = 10_000_000;

/// Lattice of probe positions, bounds inclusive
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRegion {
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
    pub step: Vector3<f64>,
    /// Keep only points within a quarter step of this y value
    pub y_slice: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint {
    pub position: Vector3<f64>,
    pub field: Vector3<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    pub points: Vec<SweepPoint>,
    /// Largest |B| among the kept points
    pub b_max: f64,
    /// Largest |Bz| among the kept points
    pub bz_max: f64,
}

impl SweepRegion {
    /// Lattice points per axis; the product is bounded by [`MAX_SWEEP_POINTS`]
    fn axis_counts(&self) -> Result<[usize; 3]> {
        let mut counts = [0usize; 3];
        for i in 0..3 {
            let (lo, hi, step) = (self.min[i], self.max[i], self.step[i]);
            if !(step.is_finite() && step > 0.0) {
                return Err(FieldMapError::Config(format!(
                    "sweep step {} must be positive",
                    step
                )));
            }
            if !(lo.is_finite() && hi.is_finite()) || hi < lo {
                return Err(FieldMapError::Config(format!(
                    "invalid sweep bounds [{}, {}]",
                    lo, hi
                )));
            }
            // Accept the upper bound when it lies within half a step of a lattice point
            let intervals = ((hi - lo) / step + 0.5).floor();
            if !intervals.is_finite() || intervals >= MAX_SWEEP_POINTS as f64 {
                return Err(FieldMapError::Config(format!(
                    "sweep of [{}, {}] with step {} has too many points",
                    lo, hi, step
                )));
            }
            counts[i] = intervals as usize + 1;
        }
        let total = counts[0]
            .checked_mul(counts[1])
            .and_then(|n| n.checked_mul(counts[2]))
            .filter(|&n| n <= MAX_SWEEP_POINTS)
            .ok_or_else(|| {
                FieldMapError::Config(format!(
                    "sweep lattice {:?} exceeds {} points",
                    counts, MAX_SWEEP_POINTS
                ))
            })?;
        tracing::debug!("Sweep lattice {:?} ({} points)", counts, total);
        Ok(counts)
    }

    /// Probe positions, x varying slowest
    pub fn positions(&self) -> Result<Vec<Vector3<f64>>> {
        let [cx, cy, cz] = self.axis_counts()?;
        let mut positions = Vec::with_capacity(cx * cy * cz);
        for i in 0..cx {
            let x = self.min.x + i as f64 * self.step.x;
            for j in 0..cy {
                let y = self.min.y + j as f64 * self.step.y;
                if let Some(y0) = self.y_slice {
                    if (y - y0).abs() > 0.25 * self.step.y {
                        continue;
                    }
                }
                for k in 0..cz {
                    let z = self.min.z + k as f64 * self.step.z;
                    positions.push(Vector3::new(x, y, z));
                }
            }
        }
        Ok(positions)
    }
}

/// Evaluate `field` over `region`, dropping points where it fails
pub fn sweep(field: &MappedMagneticField<'_>, region: &SweepRegion) -> Result<SweepResult> {
    let mut points = Vec::new();
    let mut b_max = 0.0f64;
    let mut bz_max = 0.0f64;
    let mut skipped = 0usize;

    for position in region.positions()? {
        match field.compute_magnetic_field(&position) {
            Ok(b) => {
                b_max = b_max.max(b.norm());
                bz_max = bz_max.max(b.z.abs());
                points.push(SweepPoint { position, field: b });
            }
            Err(FieldMapError::OutsideMap { .. }) => skipped += 1,
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        "Swept {} points ({} outside the map), |B|max = {} {}",
        points.len(),
        skipped,
        b_max,
        field.field_unit().symbol()
    );
    Ok(SweepResult {
        points,
        b_max,
        bz_max,
    })
}

/// Write "x y z bx by bz" rows, field values multiplied by `scale`
pub fn write_sweep_table<W: Write>(points: &[SweepPoint], scale: f64, mut out: W) -> std::io::Result<()> {
    for p in points {
        writeln!(
            out,
            "{} {} {} {} {} {}",
            p.position.x,
            p.position.y,
            p.position.z,
            scale * p.field.x,
            scale * p.field.y,
            scale * p.field.z
        )?;
    }
    out.flush()
}
