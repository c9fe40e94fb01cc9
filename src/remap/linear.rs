use crate::error::ConfigError;
use crate::remap::{Remap, RemapDiagnostics, RemapResult};
use crate::types::{GridShape, WorkgroupCoord};

/// Column banding: the grid is cut into bands of `group_size` columns (the last band
/// takes whatever is left) and each band is transposed so that consecutive launches
/// sweep across the band instead of down a full column.
#[derive(Debug, Clone)]
pub struct LinearGrouping {
    grid: GridShape,
    group_size: usize,
    full_bands: usize,
    remainder: usize,
}

impl LinearGrouping {
    pub fn new(grid: GridShape, group_size: usize) -> Result<Self, ConfigError> {
        if group_size == 0 {
            return Err(ConfigError::ZeroParameter { name: "group_size" });
        }
        Ok(Self {
            grid,
            group_size,
            full_bands: grid.n_tiles / group_size,
            remainder: grid.n_tiles % group_size,
        })
    }

    fn band_width(&self, band: usize) -> usize {
        if band < self.full_bands {
            self.group_size
        } else {
            self.remainder
        }
    }
}

impl Remap for LinearGrouping {
    fn remap(&self, coord: WorkgroupCoord) -> RemapResult {
        let band = coord.col / self.group_size;
        let serial = (coord.col % self.group_size) * self.grid.m_tiles + coord.row;
        // a coordinate in band `band` only exists if that band has at least one column
        let width = self.band_width(band);
        let x = serial / width;
        let y = serial % width;
        RemapResult {
            coord: WorkgroupCoord::new(x, y + band * self.group_size),
            diagnostics: RemapDiagnostics::LinearGrouping { band, serial, x, y },
        }
    }
}
