//! Grid store - the square tile map buildings are placed on

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::catalog::BuildingKind;

/// Side lengths the colony map may be created with.
pub const ALLOWED_MAP_SIZES: [usize; 4] = [16, 24, 32, 48];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct MapSize(usize);

impl MapSize {
    pub fn new(size: usize) -> Option<Self> {
        ALLOWED_MAP_SIZES.contains(&size).then_some(Self(size))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for MapSize {
    fn default() -> Self {
        Self(24)
    }
}

impl TryFrom<usize> for MapSize {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        MapSize::new(value)
            .ok_or_else(|| format!("map size {value} is not one of {ALLOWED_MAP_SIZES:?}"))
    }
}

impl From<MapSize> for usize {
    fn from(value: MapSize) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub x: usize,
    pub y: usize,
    pub kind: BuildingKind,
    /// Origin of the footprint this tile belongs to.
    pub owner: Option<(usize, usize)>,
    pub variant: Option<u8>,
    pub height: Option<i32>,
}

impl Tile {
    fn empty(x: usize, y: usize, height: Option<i32>) -> Self {
        Self {
            x,
            y,
            kind: BuildingKind::None,
            owner: None,
            variant: None,
            height,
        }
    }

    pub fn is_occupied(&self) -> bool {
        !self.kind.is_empty()
    }

    /// Root coordinates of the footprint, falling back to the tile itself.
    pub fn root(&self) -> (usize, usize) {
        self.owner.unwrap_or((self.x, self.y))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Flat grid without terrain heights.
    pub fn new(size: MapSize) -> Self {
        let size = size.get();
        let tiles = (0..size * size)
            .map(|index| Tile::empty(index % size, index / size, None))
            .collect();
        Self { size, tiles }
    }

    /// Grid with generated terrain: flat ground broken by a few raised plateaus.
    pub fn with_terrain(size: MapSize, rng: &mut impl RngCore) -> Self {
        let n = size.get();
        let mut heights = vec![0_i32; n * n];
        let plateaus = n / 4;
        for _ in 0..plateaus {
            let w = rng.gen_range(2..=n / 4 + 1);
            let h = rng.gen_range(2..=n / 4 + 1);
            let x0 = rng.gen_range(0..n - w);
            let y0 = rng.gen_range(0..n - h);
            for y in y0..y0 + h {
                for x in x0..x0 + w {
                    let cell = &mut heights[y * n + x];
                    *cell = (*cell + 1).min(3);
                }
            }
        }
        let tiles = heights
            .into_iter()
            .enumerate()
            .map(|(index, height)| Tile::empty(index % n, index / n, Some(height)))
            .collect();
        Self { size: n, tiles }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    pub fn footprint_in_bounds(&self, x: usize, y: usize, width: usize, height: usize) -> bool {
        width >= 1
            && height >= 1
            && x.checked_add(width).is_some_and(|end| end <= self.size)
            && y.checked_add(height).is_some_and(|end| end <= self.size)
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.size + x
    }

    pub fn tile(&self, x: usize, y: usize) -> Option<&Tile> {
        if self.in_bounds(x, y) {
            Some(&self.tiles[self.index(x, y)])
        } else {
            None
        }
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn occupied(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|tile| tile.is_occupied())
    }

    pub fn has_buildings(&self) -> bool {
        self.occupied().next().is_some()
    }

    /// Tiles covered by the rectangle, row by row. Caller guarantees bounds.
    pub fn footprint(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> impl Iterator<Item = &Tile> {
        (y..y + height).flat_map(move |ty| {
            (x..x + width).map(move |tx| &self.tiles[self.index(tx, ty)])
        })
    }

    /// Writes a building over the footprint.
    ///
    /// # Panics
    ///
    /// Panics if the footprint leaves the grid; placement validation must run first.
    pub fn apply_footprint(
        &mut self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        kind: BuildingKind,
        variant: u8,
    ) {
        assert!(
            self.footprint_in_bounds(x, y, width, height),
            "footprint {width}x{height} at ({x}, {y}) leaves the {0}x{0} grid",
            self.size
        );
        for ty in y..y + height {
            for tx in x..x + width {
                let index = self.index(tx, ty);
                let tile = &mut self.tiles[index];
                tile.kind = kind;
                tile.owner = Some((x, y));
                tile.variant = Some(variant);
            }
        }
    }

    /// Resets the footprint to empty ground, keeping terrain heights.
    ///
    /// # Panics
    ///
    /// Panics if the footprint leaves the grid.
    pub fn clear_footprint(&mut self, x: usize, y: usize, width: usize, height: usize) {
        assert!(
            self.footprint_in_bounds(x, y, width, height),
            "footprint {width}x{height} at ({x}, {y}) leaves the {0}x{0} grid",
            self.size
        );
        for ty in y..y + height {
            for tx in x..x + width {
                let index = self.index(tx, ty);
                let tile = &mut self.tiles[index];
                tile.kind = BuildingKind::None;
                tile.owner = None;
                tile.variant = None;
            }
        }
    }

    /// Number of tiles whose footprint root is `origin`.
    pub fn tiles_rooted_at(&self, origin: (usize, usize)) -> usize {
        self.occupied().filter(|tile| tile.root() == origin).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small() -> MapSize {
        MapSize::new(16).unwrap()
    }

    #[test]
    fn map_size_rejects_unlisted_values() {
        assert!(MapSize::new(20).is_none());
        assert_eq!(MapSize::new(32).map(MapSize::get), Some(32));
        let parsed: Result<MapSize, _> = serde_yaml::from_str("17");
        assert!(parsed.is_err());
    }

    #[test]
    fn new_grid_is_empty() {
        let grid = Grid::new(small());
        assert_eq!(grid.tiles().count(), 256);
        assert!(!grid.has_buildings());
        assert_eq!(grid.tile(3, 5).map(|t| (t.x, t.y)), Some((3, 5)));
        assert!(grid.tile(16, 0).is_none());
    }

    #[test]
    fn footprint_bounds() {
        let grid = Grid::new(small());
        assert!(grid.footprint_in_bounds(14, 14, 2, 2));
        assert!(!grid.footprint_in_bounds(15, 14, 2, 2));
        assert!(!grid.footprint_in_bounds(0, 0, 0, 1));
        assert!(!grid.footprint_in_bounds(usize::MAX, 0, 2, 1));
    }

    #[test]
    fn apply_and_clear_round_trip() {
        let mut grid = Grid::new(small());
        grid.apply_footprint(2, 3, 2, 2, BuildingKind::TradeHub, 4);
        assert_eq!(grid.tiles_rooted_at((2, 3)), 4);
        let corner = grid.tile(3, 4).unwrap();
        assert_eq!(corner.kind, BuildingKind::TradeHub);
        assert_eq!(corner.root(), (2, 3));
        assert_eq!(corner.variant, Some(4));

        grid.clear_footprint(2, 3, 2, 2);
        assert!(!grid.has_buildings());
        assert_eq!(grid.tile(3, 4).unwrap().owner, None);
    }

    #[test]
    #[should_panic(expected = "leaves the")]
    fn apply_off_grid_panics() {
        let mut grid = Grid::new(small());
        grid.apply_footprint(15, 15, 2, 2, BuildingKind::TradeHub, 0);
    }

    #[test]
    fn terrain_is_seeded() {
        let a = Grid::with_terrain(small(), &mut ChaCha8Rng::seed_from_u64(9));
        let b = Grid::with_terrain(small(), &mut ChaCha8Rng::seed_from_u64(9));
        let heights_a: Vec<_> = a.tiles().map(|t| t.height).collect();
        let heights_b: Vec<_> = b.tiles().map(|t| t.height).collect();
        assert_eq!(heights_a, heights_b);
        assert!(a.tiles().all(|t| matches!(t.height, Some(0..=3))));
    }
}
