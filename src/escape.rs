// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time kernel
//!
//! Every cell of the grid samples one point of the view window and
//! repeatedly applies `z ← z² + c` to it, counting how many
//! applications it takes for `|z|` to exceed 2.  For the Mandelbrot
//! set the sampled point is `c` and `z` starts at the origin; for a
//! Julia set the sampled point is the starting `z` and `c` is fixed
//! for the whole image.  Points that have not escaped after
//! `max_iterations` applications are recorded as `max_iterations`.
//!
//! No cell depends on any other, so the grid is cut into bands of
//! contiguous rows and each band is handed to its own scoped thread.
//! Each thread writes only to its own slice of the buffer, so there is
//! nothing to lock, and the output does not depend on how many threads
//! ran or in which order they finished.

use std::panic;

use complex::Complex;
use planes::{GridSize, PlaneMapper, ViewWindow};

/// Which fractal to generate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Variant {
    /// `z₀ = 0`, `c` = the sampled point.
    Mandelbrot,
    /// `z₀` = the sampled point, `c` fixed.
    Julia {
        /// The constant added on every iteration.
        c: Complex,
    },
}

impl Variant {
    /// True when both are Mandelbrot or both are Julia, regardless of
    /// the Julia constant.
    pub fn same_kind(&self, other: &Variant) -> bool {
        match (self, other) {
            (Variant::Mandelbrot, Variant::Mandelbrot) => true,
            (Variant::Julia { .. }, Variant::Julia { .. }) => true,
            _ => false,
        }
    }

    /// The variant half of the cache's closeness test: same kind, and
    /// for Julia sets, constants within `epsilon` of each other.
    pub fn is_close_to(&self, other: &Variant, epsilon: f64) -> bool {
        match (self, other) {
            (Variant::Mandelbrot, Variant::Mandelbrot) => true,
            (Variant::Julia { c: a }, Variant::Julia { c: b }) => a.is_close_to(*b, epsilon),
            _ => false,
        }
    }
}

/// A W×H array of iteration counts.  Stored row by row along the
/// imaginary axis: cell (i, j) is at `j * width + i`.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    size: GridSize,
    max_iterations: u32,
    counts: Vec<u32>,
}

impl Grid {
    /// A zeroed grid of the given size.
    pub fn new(size: GridSize) -> Grid {
        Grid {
            size,
            max_iterations: 0,
            counts: vec![0; size.len()],
        }
    }

    /// The grid's dimensions.
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Cells along the real axis.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Cells along the imaginary axis.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// The iteration cap this grid was last generated with.
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// The raw counts, row-major.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// The count of cell (i, j).  Panics outside the grid, like slice
    /// indexing does.
    pub fn get(&self, i: usize, j: usize) -> u32 {
        assert!(i < self.size.width && j < self.size.height);
        self.counts[j * self.size.width + i]
    }

    /// True when the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Changes the grid's dimensions, reallocating only if they differ
    /// from the current ones.  Returns whether it reallocated.  The
    /// contents are unspecified afterwards.
    pub fn resize(&mut self, size: GridSize) -> bool {
        if size == self.size {
            return false;
        }
        self.size = size;
        self.counts = vec![0; size.len()];
        true
    }
}

/// The recurrence itself.  Returns the 1-based index of the iteration
/// after which `|z|² > 4`, or `max_iterations` if that never happens.
#[inline]
pub fn escape_time(start: Complex, c: Complex, max_iterations: u32) -> u32 {
    let mut z = start;
    for i in 0..max_iterations {
        z = z.square() + c;
        if z.norm_sqr() > 4.0 {
            return i + 1;
        }
    }
    max_iterations
}

/// Generates a fresh grid, using one thread per available CPU.
pub fn generate(
    view: &ViewWindow,
    variant: Variant,
    max_iterations: u32,
    grid_size: GridSize,
) -> Grid {
    let mut grid = Grid::new(grid_size);
    generate_into(&mut grid, view, variant, max_iterations, num_cpus::get());
    grid
}

/// Regenerates `grid` in place for the given window, at the grid's
/// current size, using up to `threads` threads.  An empty grid is left
/// empty.
pub fn generate_into(
    grid: &mut Grid,
    view: &ViewWindow,
    variant: Variant,
    max_iterations: u32,
    threads: usize,
) {
    grid.max_iterations = max_iterations;
    if grid.size.is_empty() {
        return;
    }

    let plane = PlaneMapper::new(*view, grid.size);
    let width = grid.size.width;
    let threads = threads.max(1).min(grid.size.height);
    if threads == 1 {
        render_band(&plane, variant, max_iterations, 0, &mut grid.counts);
        return;
    }

    // Bands of whole rows; the last one may be short.
    let rows_per_band = (grid.size.height + threads - 1) / threads;
    let plane = &plane;
    let result = crossbeam::scope(|spawner| {
        for (band, cells) in grid.counts.chunks_mut(rows_per_band * width).enumerate() {
            spawner.spawn(move |_| {
                render_band(plane, variant, max_iterations, band * rows_per_band, cells);
            });
        }
    });
    if let Err(payload) = result {
        panic::resume_unwind(payload);
    }
}

/// Fills `cells`, a run of whole rows starting at row `first_row`.
fn render_band(
    plane: &PlaneMapper,
    variant: Variant,
    max_iterations: u32,
    first_row: usize,
    cells: &mut [u32],
) {
    for (offset, row) in cells.chunks_mut(plane.grid.width).enumerate() {
        let im = plane.row_to_im(first_row + offset);
        for (i, cell) in row.iter_mut().enumerate() {
            let point = Complex::new(plane.column_to_re(i), im);
            *cell = match variant {
                Variant::Mandelbrot => escape_time(Complex::zero(), point, max_iterations),
                Variant::Julia { c } => escape_time(point, c, max_iterations),
            };
        }
    }
}
