//! Serialize a grid back to the comma-separated map layout

use std::io::Write;

use crate::grid::FieldGrid;

/// Write `grid` in the same layout [`crate::loader::load`] reads
pub fn write_csv_map<W: Write>(grid: &FieldGrid, mut out: W) -> std::io::Result<()> {
    let [nx, ny, nz] = grid.dims();
    let o = grid.origin();
    let s = grid.spacing();
    writeln!(
        out,
        "{},{},{},{},{},{},{},{},{}",
        nx, ny, nz, o.x, o.y, o.z, s.x, s.y, s.z
    )?;

    for ax in 0..3 {
        for iz in 0..nz {
            for iy in 0..ny {
                write!(out, "{},{},{}", ax, iy, iz)?;
                let start = grid.index(0, iy, iz);
                for v in &grid.component(ax)[start..start + nx] {
                    write!(out, ",{}", v)?;
                }
                writeln!(out)?;
            }
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_layout() {
        let grid = FieldGrid::from_fn(
            [2, 2, 2],
            Vector3::new(0.0, 0.0, -0.5),
            Vector3::new(0.25, 0.5, 1.0),
            |ax, ix, iy, iz| (ax * 100 + iz * 10 + iy * 2 + ix) as i32,
        )
        .unwrap();
        let mut buf = Vec::new();
        write_csv_map(&grid, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 1 + 3 * 2 * 2);
        assert_eq!(lines[0], "2,2,2,0,0,-0.5,0.25,0.5,1");
        assert_eq!(lines[1], "0,0,0,0,1");
        assert_eq!(lines[2], "0,1,0,2,3");
        assert_eq!(lines[3], "0,0,1,10,11");
        assert_eq!(lines[12], "2,1,1,112,113");
    }
}
