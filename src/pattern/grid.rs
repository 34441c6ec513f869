//! Square single-channel pixel grids in [0, 1]

use rand::Rng;

/// A square grid of intensities stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl PixelGrid {
    /// Build from a row-major slice. Panics if the slice length does not
    /// match `width * height` (caller controls both).
    pub fn from_slice(width: usize, height: usize, data: &[f32]) -> Self {
        assert_eq!(data.len(), width * height, "grid data length mismatch");
        Self {
            width,
            height,
            data: data.to_vec(),
        }
    }

    /// Uniform random grid in [0, 1)
    pub fn random<R: Rng>(width: usize, height: usize, rng: &mut R) -> Self {
        let data = (0..width * height).map(|_| rng.gen::<f32>()).collect();
        Self {
            width,
            height,
            data,
        }
    }

    /// Horizontal linear ramp: cell (row, col) = col / (width - 1)
    pub fn ramp(width: usize, height: usize) -> Self {
        let denom = (width - 1).max(1) as f32;
        let mut data = Vec::with_capacity(width * height);
        for _row in 0..height {
            for col in 0..width {
                data.push(col as f32 / denom);
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Grid rotated by 180 degrees
    pub fn rotated_180(&self) -> Self {
        let mut data = self.data.clone();
        data.reverse();
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn ramp_is_column_linear() {
        let g = PixelGrid::ramp(16, 16);
        assert_relative_eq!(g.get(0, 0), 0.0);
        assert_relative_eq!(g.get(7, 15), 1.0);
        assert_relative_eq!(g.get(3, 5), 5.0 / 15.0);
        // Constant down each column
        for row in 1..16 {
            assert_relative_eq!(g.get(row, 9), g.get(0, 9));
        }
    }

    #[test]
    fn random_stays_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(11);
        let g = PixelGrid::random(16, 16, &mut rng);
        assert_eq!(g.data().len(), 256);
        assert!(g.data().iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn rotation_reverses_cells() {
        let g = PixelGrid::from_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let r = g.rotated_180();
        assert_eq!(r.data(), &[4.0, 3.0, 2.0, 1.0]);
    }
}
