//! Iteration counts to pixels.
//!
//! The palette is sampled once per possible count into a lookup table,
//! and each cell of the grid is then colored by indexing that table
//! with its count.  Since the grid is kept around, a new palette only
//! costs a new table and one pass over the grid, not a new run of the
//! kernel.

use image::{Rgba, RgbaImage};

use errors::Result;
use escape::Grid;
use palette::PaletteProvider;

/// The RGBA image a grid is colored into.  Pixel (x, y) is cell (i, j).
pub type Bitmap = RgbaImage;

/// How a count picks its table entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Coloring {
    /// The count is the index.  Stable across views: the same count is
    /// always the same color.
    Direct,
    /// Histogram equalization: the index is the share of the image that
    /// escaped in fewer iterations, spread over the table.  Adapts the
    /// contrast to whatever is on screen, so colors shift as the view
    /// moves.
    Histogram,
}

impl Default for Coloring {
    fn default() -> Coloring {
        Coloring::Direct
    }
}

/// `max_iterations + 1` colors, entry `k` being the palette at
/// `k / max_iterations`.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorLut {
    palette: String,
    max_iterations: u32,
    entries: Vec<Rgba<u8>>,
}

impl ColorLut {
    /// Samples the named palette.  Fails if the provider does not know
    /// the name.
    pub fn build<P>(provider: &P, palette: &str, max_iterations: u32) -> Result<ColorLut>
    where
        P: PaletteProvider + ?Sized,
    {
        let steps = f64::from(max_iterations.max(1));
        let entries = (0..=max_iterations)
            .map(|k| provider.color(palette, f64::from(k) / steps))
            .collect::<Result<Vec<_>>>()?;
        Ok(ColorLut {
            palette: palette.to_string(),
            max_iterations,
            entries,
        })
    }

    /// Whether this table was built for exactly these settings.
    pub fn matches(&self, palette: &str, max_iterations: u32) -> bool {
        self.palette == palette && self.max_iterations == max_iterations
    }

    /// The palette the table was sampled from.
    pub fn palette(&self) -> &str {
        &self.palette
    }

    /// The highest count the table has an entry for.
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Number of entries; always `max_iterations + 1`.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true; a table has at least the entry for zero.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The color for a count.  Counts past the end of the table get the
    /// last entry.
    pub fn get(&self, count: u32) -> Rgba<u8> {
        let last = self.entries.len() - 1;
        self.entries[(count as usize).min(last)]
    }

    /// The entry nearest to position `t` in `[0, 1]`.
    pub fn sample(&self, t: f64) -> Rgba<u8> {
        let t = if t.is_nan() { 0.0 } else { t.max(0.0).min(1.0) };
        self.entries[(t * self.max_iterations as f64).round() as usize]
    }

    /// Colors `grid` into `bitmap`, replacing the bitmap only if its
    /// dimensions differ from the grid's.
    pub fn colorize(&self, grid: &Grid, coloring: Coloring, bitmap: &mut Bitmap) {
        let (width, height) = (grid.width() as u32, grid.height() as u32);
        if bitmap.dimensions() != (width, height) {
            *bitmap = Bitmap::new(width, height);
        }
        match coloring {
            Coloring::Direct => {
                for (pixel, &count) in bitmap.pixels_mut().zip(grid.counts()) {
                    *pixel = self.get(count);
                }
            }
            Coloring::Histogram => {
                let cdf = cumulative(grid);
                for (pixel, &count) in bitmap.pixels_mut().zip(grid.counts()) {
                    *pixel = self.sample(cdf[count as usize]);
                }
            }
        }
    }
}

/// `hist[k]` is the number of cells that escaped after exactly `k`
/// iterations, for `k < max_iterations`.  Cells that never escaped are
/// not binned.
pub fn histogram(grid: &Grid) -> Vec<u64> {
    let bins = grid.max_iterations() as usize;
    let mut hist = vec![0; bins];
    for &count in grid.counts() {
        if let Some(bin) = hist.get_mut(count as usize) {
            *bin += 1;
        }
    }
    hist
}

/// `cdf[n]` is the share of all cells that escaped in fewer than `n`
/// iterations, for every `n` in `0..=max_iterations`.
pub fn cumulative(grid: &Grid) -> Vec<f64> {
    let hist = histogram(grid);
    let total = grid.counts().len().max(1) as f64;
    let mut cdf = Vec::with_capacity(hist.len() + 1);
    let mut running = 0;
    cdf.push(0.0);
    for bin in hist {
        running += bin;
        cdf.push(running as f64 / total);
    }
    cdf
}

#[cfg(test)]
mod tests {
    use super::*;
    use complex::Complex;
    use errors::Error;
    use escape::{generate, Variant};
    use palette::BuiltinPalettes;
    use planes::{GridSize, ViewWindow};

    fn grid() -> Grid {
        let view = ViewWindow::new(Complex::new(-0.5, 0.0), Complex::new(3.0, 3.0));
        generate(&view, Variant::Mandelbrot, 10, GridSize::new(4, 4))
    }

    #[test]
    fn lut_has_one_entry_per_count() {
        let lut = ColorLut::build(&BuiltinPalettes, "grayscale", 10).unwrap();
        assert_eq!(lut.len(), 11);
        assert_eq!(lut.get(0), Rgba([0, 0, 0, 255]));
        assert_eq!(lut.get(10), Rgba([255, 255, 255, 255]));
        assert_eq!(lut.get(99), lut.get(10));
        assert!(lut.matches("grayscale", 10));
        assert!(!lut.matches("grayscale", 11));
        assert!(!lut.matches("plasma", 10));
    }

    #[test]
    fn zero_iterations_gives_a_single_entry() {
        let lut = ColorLut::build(&BuiltinPalettes, "grayscale", 0).unwrap();
        assert_eq!(lut.len(), 1);
        assert_eq!(lut.sample(0.7), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn unknown_palette_fails_the_build() {
        match ColorLut::build(&BuiltinPalettes, "nope", 10) {
            Err(Error::UnknownPalette(_)) => (),
            other => panic!("expected UnknownPalette, got {:?}", other),
        }
    }

    #[test]
    fn direct_coloring_indexes_by_count() {
        let grid = grid();
        let lut = ColorLut::build(&BuiltinPalettes, "viridis", 10).unwrap();
        let mut bitmap = Bitmap::new(0, 0);
        lut.colorize(&grid, Coloring::Direct, &mut bitmap);
        assert_eq!(bitmap.dimensions(), (4, 4));
        for (x, y) in iproduct!(0..4u32, 0..4u32) {
            let count = grid.get(x as usize, y as usize);
            assert_eq!(*bitmap.get_pixel(x, y), lut.get(count));
        }
    }

    #[test]
    fn colorize_reuses_a_bitmap_of_the_right_size() {
        let grid = grid();
        let lut = ColorLut::build(&BuiltinPalettes, "plasma", 10).unwrap();
        let mut bitmap = Bitmap::new(4, 4);
        let before = bitmap.as_ptr();
        lut.colorize(&grid, Coloring::Direct, &mut bitmap);
        assert_eq!(bitmap.as_ptr(), before);
    }

    #[test]
    fn cumulative_histogram() {
        // Counts: 1 x3, 2 x3, 3 x2, 5 x2, 6 x2, 10 x4 (not binned).
        let grid = grid();
        let hist = histogram(&grid);
        assert_eq!(hist, vec![0, 3, 3, 2, 0, 2, 2, 0, 0, 0]);
        let cdf = cumulative(&grid);
        assert_eq!(cdf.len(), 11);
        assert_eq!(cdf[0], 0.0);
        assert_eq!(cdf[1], 0.0);
        assert_eq!(cdf[2], 3.0 / 16.0);
        assert_eq!(cdf[6], 10.0 / 16.0);
        assert_eq!(cdf[10], 12.0 / 16.0);
    }

    #[test]
    fn histogram_coloring_follows_the_cdf() {
        let grid = grid();
        let lut = ColorLut::build(&BuiltinPalettes, "grayscale", 10).unwrap();
        let mut bitmap = Bitmap::new(4, 4);
        lut.colorize(&grid, Coloring::Histogram, &mut bitmap);
        let cdf = cumulative(&grid);
        for (x, y) in iproduct!(0..4u32, 0..4u32) {
            let count = grid.get(x as usize, y as usize);
            assert_eq!(*bitmap.get_pixel(x, y), lut.sample(cdf[count as usize]));
        }
        // The fastest escapers sit at the bottom of the table.
        assert_eq!(*bitmap.get_pixel(0, 0), lut.get(0));
    }
}
