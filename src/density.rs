use crate::particle::{Bounds, Particle};
use crate::settings::{DensityLevel, Layer, WindTuning};

/// Size of the coarse density grid in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridDims {
    pub cols: u16,
    pub rows: u16,
    /// Terminal cells covered by one density cell
    pub cell_cols: u16,
    pub cell_rows: u16,
}

impl GridDims {
    /// Coarse grid covering `bounds`; partial cells at the edges count as whole cells
    pub fn for_bounds(bounds: Bounds, tuning: &WindTuning) -> Self {
        let cell_cols = tuning.density_cell_cols.max(1);
        let cell_rows = tuning.density_cell_rows.max(1);
        Self {
            cols: bounds.cols.div_ceil(cell_cols),
            rows: bounds.rows.div_ceil(cell_rows),
            cell_cols,
            cell_rows,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

/// Per-layer intensity accumulated from one particle snapshot
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DensityGrid {
    dims: GridDims,
    /// One row-major buffer per layer, indexed by `Layer::index`
    layers: [Vec<f32>; 3],
}

impl DensityGrid {
    /// Build a fresh grid from the current particles
    pub fn recompute<'a, I>(particles: I, dims: GridDims) -> Self
    where
        I: IntoIterator<Item = &'a Particle>,
    {
        let cells = dims.cell_count();
        let mut layers = [vec![0.0; cells], vec![0.0; cells], vec![0.0; cells]];

        for particle in particles {
            if particle.x < 0.0 || particle.y < 0.0 {
                continue;
            }
            let (x, y) = particle.cell();
            let col = x / dims.cell_cols.max(1);
            let row = y / dims.cell_rows.max(1);
            if col >= dims.cols || row >= dims.rows {
                continue;
            }
            let idx = row as usize * dims.cols as usize + col as usize;
            layers[particle.layer.index()][idx] += particle.layer.density_weight();
        }

        Self { dims, layers }
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    fn index(&self, col: u16, row: u16) -> Option<usize> {
        if col < self.dims.cols && row < self.dims.rows {
            Some(row as usize * self.dims.cols as usize + col as usize)
        } else {
            None
        }
    }

    pub fn layer_intensity(&self, layer: Layer, col: u16, row: u16) -> f32 {
        self.index(col, row)
            .map(|idx| self.layers[layer.index()][idx])
            .unwrap_or(0.0)
    }

    /// Intensity of a cell summed over all layers
    pub fn cell_total(&self, col: u16, row: u16) -> f32 {
        Layer::ALL
            .iter()
            .map(|layer| self.layer_intensity(*layer, col, row))
            .sum()
    }

    /// Layer contributing most to a cell; ties go to the nearer layer
    pub fn dominant_layer(&self, col: u16, row: u16) -> Option<Layer> {
        let mut best: Option<(Layer, f32)> = None;
        for layer in Layer::ALL {
            let value = self.layer_intensity(layer, col, row);
            if value > 0.0 && best.map_or(true, |(_, v)| value >= v) {
                best = Some((layer, value));
            }
        }
        best.map(|(layer, _)| layer)
    }

    /// Sum of every cell in every layer
    #[cfg(test)]
    pub fn total(&self) -> f32 {
        self.layers.iter().flat_map(|layer| layer.iter()).sum()
    }
}

/// Monotonic intensity to glyph mapping over a threshold table
#[derive(Debug, Clone, PartialEq)]
pub struct DensityLevels {
    levels: Vec<DensityLevel>,
}

impl DensityLevels {
    /// Levels must be sorted by ascending threshold
    pub fn new(levels: Vec<DensityLevel>) -> Self {
        Self { levels }
    }

    /// Highest level whose threshold is met, or `None` when the cell is empty
    pub fn level_for(&self, intensity: f32) -> Option<usize> {
        self.levels
            .iter()
            .rposition(|level| intensity >= level.threshold)
    }

    pub fn glyph_for(&self, intensity: f32) -> char {
        self.level_for(intensity)
            .map(|i| self.levels[i].glyph)
            .unwrap_or(' ')
    }
}

/// Owns the most recent grid while density mode is active
#[derive(Debug, Clone)]
pub struct DensityField {
    grid: DensityGrid,
    levels: DensityLevels,
}

impl DensityField {
    pub fn new(tuning: &WindTuning) -> Self {
        Self {
            grid: DensityGrid::default(),
            levels: DensityLevels::new(tuning.density_levels.clone()),
        }
    }

    pub fn refresh<'a, I>(&mut self, particles: I, dims: GridDims)
    where
        I: IntoIterator<Item = &'a Particle>,
    {
        self.grid = DensityGrid::recompute(particles, dims);
    }

    pub fn grid(&self) -> &DensityGrid {
        &self.grid
    }

    pub fn levels(&self) -> &DensityLevels {
        &self.levels
    }
}
