//! Tile swizzling of stored texel data.
//!
//! Texel data is stored as a grid of units, single texels for uncompressed formats and
//! 4x4 blocks for compressed ones. In tiled storage the grid is split into 8x8 unit
//! tiles laid out row major, and the 64 units of a tile are ordered along a Morton
//! curve: bit `2k` of a unit's position within the tile is bit `k` of its column and bit
//! `2k + 1` is bit `k` of its row.
//!
//! | Position (binary) | Column bits | Row bits |
//! |-------------------|-------------|----------|
//! | `y2 x2 y1 x1 y0 x0` | `x2 x1 x0` | `y2 y1 y0` |

use crate::format::PixelFormat;

/// Units per tile edge
pub const TILE_EDGE: usize = 8;
const TILE_UNITS: usize = TILE_EDGE * TILE_EDGE;

/// How the stored units of a texture are ordered
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SwizzleMode {
    /// 8x8 unit tiles in Morton order
    Morton,
    /// Plain row major rows
    Linear,
    Unknown(u8),
}

impl From<u8> for SwizzleMode {
    fn from(value: u8) -> Self {
        match value {
            0 | 2 | 6 => SwizzleMode::Morton,
            1 => SwizzleMode::Linear,
            other => SwizzleMode::Unknown(other),
        }
    }
}

/// Column and row within a tile of the `i`th unit along the Morton curve
pub fn morton(i: usize) -> (usize, usize) {
    let x = (i & 1) | ((i >> 1) & 2) | ((i >> 2) & 4);
    let y = ((i >> 1) & 1) | ((i >> 2) & 2) | ((i >> 3) & 4);
    (x, y)
}

/// The unit grid of a texture's storage
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UnitGrid {
    pub columns: usize,
    pub rows: usize,
    /// Bytes per unit
    pub unit_size: usize,
}

impl UnitGrid {
    /// Grid covering `width` x `height` texels, rounded up to whole 4x4 groups
    pub fn new(format: PixelFormat, width: u32, height: u32) -> Self {
        let width = (width as usize).next_multiple_of(4);
        let height = (height as usize).next_multiple_of(4);
        let (columns, rows) = if format.is_compressed() {
            (width / 4, height / 4)
        } else {
            (width, height)
        };
        UnitGrid {
            columns,
            rows,
            unit_size: format.unit_size(),
        }
    }

    pub fn row_len(&self) -> usize {
        self.columns * self.unit_size
    }

    /// Bytes of the grid in linear order
    pub fn linear_len(&self) -> usize {
        self.rows * self.row_len()
    }

    fn tiles(&self) -> (usize, usize) {
        (
            self.columns.div_ceil(TILE_EDGE),
            self.rows.div_ceil(TILE_EDGE),
        )
    }

    /// Bytes of the grid in tiled order, always whole tiles
    pub fn tiled_len(&self) -> usize {
        let (x, y) = self.tiles();
        x * y * TILE_UNITS * self.unit_size
    }

    /// Pairs of (tiled index, linear index) for every unit inside the grid
    fn mapping(self) -> impl Iterator<Item = (usize, usize)> {
        let (tiles_x, tiles_y) = self.tiles();
        (0..tiles_x * tiles_y).flat_map(move |tile| {
            let (tile_x, tile_y) = (tile % tiles_x, tile / tiles_x);
            (0..TILE_UNITS).filter_map(move |i| {
                let (x, y) = morton(i);
                let column = tile_x * TILE_EDGE + x;
                let row = tile_y * TILE_EDGE + y;
                (column < self.columns && row < self.rows)
                    .then_some((tile * TILE_UNITS + i, row * self.columns + column))
            })
        })
    }
}

/// Copy unit `from` of `src` to unit `to` of `dst`, bytes past the end of `src` read as zero
fn copy_unit(src: &[u8], from: usize, dst: &mut [u8], to: usize, size: usize) {
    let start = from * size;
    if start >= src.len() {
        return;
    }
    let end = (start + size).min(src.len());
    dst[to * size..to * size + end - start].copy_from_slice(&src[start..end]);
}

/// Reorder linear units into tiled storage
pub fn swizzle(grid: &UnitGrid, linear: &[u8]) -> Vec<u8> {
    let mut tiled = vec![0u8; grid.tiled_len()];
    for (t, l) in grid.mapping() {
        copy_unit(linear, l, &mut tiled, t, grid.unit_size);
    }
    tiled
}

/// Reorder tiled storage into linear units
pub fn unswizzle(grid: &UnitGrid, tiled: &[u8]) -> Vec<u8> {
    let mut linear = vec![0u8; grid.linear_len()];
    for (t, l) in grid.mapping() {
        copy_unit(tiled, t, &mut linear, l, grid.unit_size);
    }
    linear
}
