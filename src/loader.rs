//! Parser for comma-separated field map tables
//!
//! Layout:
//!
//! ```text
//! nx,ny,nz,ox,oy,oz,sx,sy,sz
//! ax,iy,iz,v0,v1,...,v(nx-1)   # ny*nz lines for each of ax = 0, 1, 2
//! ```
//!
//! Sample values are integers in milligauss, lengths are in metres.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use nalgebra::Vector3;

use crate::error::{FieldMapError, IndexTriple, Result};
use crate::grid::{checked_node_count, FieldGrid, COMPONENTS};

const DELIMITER: char = ',';
const HEADER_FIELDS: usize = 9;
/// Upper bound on samples reserved per component before any data is read
const INITIAL_RESERVE: usize = 1 << 16;

/// Parse one field map from a buffered text stream
pub fn load<R: BufRead>(reader: R) -> Result<FieldGrid> {
    let mut lines = MapLines::new(reader);

    let header = lines
        .next_line()?
        .ok_or_else(|| FieldMapError::parse(1, "missing map header"))?;
    let (dims, origin, spacing) = parse_header(&header)?;
    let [nx, ny, nz] = dims;
    tracing::debug!(
        nx,
        ny,
        nz,
        origin = ?origin.as_slice(),
        spacing = ?spacing.as_slice(),
        "Read field map header"
    );

    let too_large = || FieldMapError::parse(1, format!("map size {}x{}x{} is too large", nx, ny, nz));
    let nodes = checked_node_count(dims).ok_or_else(too_large)?;
    let expected_lines = ny
        .checked_mul(nz)
        .and_then(|rows| rows.checked_mul(3))
        .ok_or_else(too_large)?;
    let mut samples: [Vec<i32>; 3] = Default::default();
    let mut found = 0;

    for (ax, component) in samples.iter_mut().enumerate() {
        tracing::trace!("Loading {} table...", COMPONENTS[ax]);
        component.reserve(nodes.min(INITIAL_RESERVE));
        for iz in 0..nz {
            for iy in 0..ny {
                let line = lines
                    .next_line()?
                    .ok_or(FieldMapError::TruncatedInput {
                        expected: expected_lines,
                        found,
                    })?;
                let line_no = lines.line_number();
                let expected = IndexTriple::new(ax, iy, iz);
                parse_data_line(&line, line_no, nx, expected, component)?;
                found += 1;
            }
        }
    }

    let last_data_line = lines.line_number();
    if lines.has_trailing_content()? {
        tracing::warn!(
            "Ignoring content after line {} of field map",
            last_data_line
        );
    }

    FieldGrid::new(dims, origin, spacing, samples)
}

/// Open and parse a field map file
pub fn load_path(path: impl AsRef<Path>) -> Result<FieldGrid> {
    let path = path.as_ref();
    let file = File::open(path)?;
    tracing::debug!("Loading field map from {:?}", path);
    load(BufReader::new(file))
}

fn parse_header(line: &str) -> Result<([usize; 3], Vector3<f64>, Vector3<f64>)> {
    let tokens: Vec<&str> = line.split(DELIMITER).map(str::trim).collect();
    if tokens.len() != HEADER_FIELDS {
        return Err(FieldMapError::parse(
            1,
            format!(
                "header has {} fields, expected {}",
                tokens.len(),
                HEADER_FIELDS
            ),
        ));
    }

    let mut dims = [0usize; 3];
    for (i, name) in ["nx", "ny", "nz"].iter().enumerate() {
        let n: usize = parse_token(tokens[i], 1, name)?;
        if n < 2 {
            return Err(FieldMapError::parse(
                1,
                format!("{} = {}, at least 2 nodes are required", name, n),
            ));
        }
        dims[i] = n;
    }

    let mut reals = [0.0f64; 6];
    for (i, name) in ["ox", "oy", "oz", "sx", "sy", "sz"].iter().enumerate() {
        let v: f64 = parse_token(tokens[3 + i], 1, name)?;
        if !v.is_finite() {
            return Err(FieldMapError::parse(1, format!("{} = {} is not finite", name, v)));
        }
        if i >= 3 && v == 0.0 {
            return Err(FieldMapError::parse(1, format!("{} must be non-zero", name)));
        }
        reals[i] = v;
    }

    Ok((
        dims,
        Vector3::new(reals[0], reals[1], reals[2]),
        Vector3::new(reals[3], reals[4], reals[5]),
    ))
}

fn parse_data_line(
    line: &str,
    line_no: usize,
    nx: usize,
    expected: IndexTriple,
    out: &mut Vec<i32>,
) -> Result<()> {
    let tokens: Vec<&str> = line.split(DELIMITER).map(str::trim).collect();
    if tokens.len() != nx + 3 {
        return Err(FieldMapError::parse(
            line_no,
            format!("data line has {} fields, expected {}", tokens.len(), nx + 3),
        ));
    }

    let actual = IndexTriple::new(
        parse_token(tokens[0], line_no, "ax")?,
        parse_token(tokens[1], line_no, "iy")?,
        parse_token(tokens[2], line_no, "iz")?,
    );
    if actual != expected {
        return Err(FieldMapError::DataIntegrity {
            line: line_no,
            expected,
            actual,
        });
    }

    for token in &tokens[3..] {
        out.push(parse_token(token, line_no, "sample")?);
    }
    Ok(())
}

fn parse_token<T: FromStr>(token: &str, line_no: usize, what: &str) -> Result<T> {
    token.parse().map_err(|_| {
        FieldMapError::parse(line_no, format!("invalid {} value '{}'", what, token))
    })
}

/// Line reader accepting LF, CRLF and bare CR terminators
struct MapLines<R> {
    reader: R,
    line_number: usize,
}

impl<R: BufRead> MapLines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
        }
    }

    /// 1-based number of the last line returned
    fn line_number(&self) -> usize {
        self.line_number
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        let mut bytes = Vec::new();
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                break;
            }
            match buf.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(pos) => {
                    let terminator = buf[pos];
                    bytes.extend_from_slice(&buf[..pos]);
                    self.reader.consume(pos + 1);
                    if terminator == b'\r' {
                        let next = self.reader.fill_buf()?;
                        if next.first() == Some(&b'\n') {
                            self.reader.consume(1);
                        }
                    }
                    return self.finish(bytes).map(Some);
                }
                None => {
                    let len = buf.len();
                    bytes.extend_from_slice(buf);
                    self.reader.consume(len);
                }
            }
        }
        // Final line without terminator
        if !bytes.is_empty() {
            self.finish(bytes).map(Some)
        } else {
            Ok(None)
        }
    }

    fn finish(&mut self, bytes: Vec<u8>) -> Result<String> {
        self.line_number += 1;
        String::from_utf8(bytes).map_err(|_| {
            FieldMapError::parse(self.line_number, "line is not valid UTF-8")
        })
    }

    /// True if any non-blank text remains in the stream
    fn has_trailing_content(&mut self) -> Result<bool> {
        while let Some(line) = self.next_line()? {
            if !line.trim().is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
