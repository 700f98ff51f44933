//! Owner of loaded field maps

use std::fmt;
use std::io::BufRead;
use std::path::Path;

use crate::error::{FieldMapError, Result};
use crate::grid::FieldGrid;
use crate::loader;

/// Opaque identifier of a map within a [`MapRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapHandle(usize);

impl MapHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for MapHandle {
    fn from(index: usize) -> Self {
        MapHandle(index)
    }
}

impl fmt::Display for MapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Append-only collection of field maps.
///
/// Handles are positions in load order and stay valid for the lifetime of
/// the registry.
#[derive(Debug, Default)]
pub struct MapRegistry {
    maps: Vec<FieldGrid>,
}

impl MapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a map from `reader` and append it. On error nothing is added.
    pub fn load<R: BufRead>(&mut self, reader: R) -> Result<MapHandle> {
        let grid = loader::load(reader)?;
        Ok(self.insert(grid))
    }

    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<MapHandle> {
        let grid = loader::load_path(path)?;
        Ok(self.insert(grid))
    }

    /// Append an already built grid
    pub fn insert(&mut self, grid: FieldGrid) -> MapHandle {
        let handle = MapHandle(self.maps.len());
        let [nx, ny, nz] = grid.dims();
        tracing::info!("Registered field map {} ({}x{}x{} nodes)", handle, nx, ny, nz);
        self.maps.push(grid);
        handle
    }

    pub fn get(&self, handle: MapHandle) -> Result<&FieldGrid> {
        self.maps
            .get(handle.0)
            .ok_or(FieldMapError::InvalidHandle {
                handle: handle.0,
                len: self.maps.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MapHandle, &FieldGrid)> {
        self.maps
            .iter()
            .enumerate()
            .map(|(i, grid)| (MapHandle(i), grid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn map_text(value: i32) -> String {
        let mut text = String::from("2,2,2,0,0,0,1,1,1\n");
        for ax in 0..3 {
            for iz in 0..2 {
                for iy in 0..2 {
                    text.push_str(&format!("{},{},{},{},{}\n", ax, iy, iz, value, value));
                }
            }
        }
        text
    }

    #[test]
    fn test_handles_follow_load_order() {
        let mut registry = MapRegistry::new();
        let first = registry.load(Cursor::new(map_text(1))).unwrap();
        let second = registry.load(Cursor::new(map_text(2))).unwrap();
        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        assert_eq!(registry.get(first).unwrap().sample(0, 0, 0, 0), 1);
        assert_eq!(registry.get(second).unwrap().sample(2, 1, 1, 1), 2);
    }

    #[test]
    fn test_failed_load_leaves_registry_unchanged() {
        let mut registry = MapRegistry::new();
        let handle = registry.load(Cursor::new(map_text(1))).unwrap();
        let broken: String = map_text(5).lines().take(6).map(|l| format!("{}\n", l)).collect();
        assert!(registry.load(Cursor::new(broken)).is_err());
        assert_eq!(registry.len(), 1);

        // The next successful load takes the next free position
        let next = registry.load(Cursor::new(map_text(3))).unwrap();
        assert_eq!(next.index(), 1);
        assert_eq!(registry.get(handle).unwrap().sample(0, 0, 0, 0), 1);
    }

    #[test]
    fn test_invalid_handle() {
        let mut registry = MapRegistry::new();
        assert!(registry.is_empty());
        registry.load(Cursor::new(map_text(1))).unwrap();
        match registry.get(MapHandle::from(4)) {
            Err(FieldMapError::InvalidHandle { handle, len }) => {
                assert_eq!(handle, 4);
                assert_eq!(len, 1);
            }
            other => panic!("Expected invalid handle, got {:?}", other),
        }
    }

    #[test]
    fn test_iter_yields_handles() {
        let mut registry = MapRegistry::new();
        registry.load(Cursor::new(map_text(1))).unwrap();
        registry.load(Cursor::new(map_text(2))).unwrap();
        let handles: Vec<usize> = registry.iter().map(|(h, _)| h.index()).collect();
        assert_eq!(handles, vec![0, 1]);
    }
}
