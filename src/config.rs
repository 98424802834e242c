//! Settings that stay fixed for the life of a viewer.  Everything here
//! is handed to the caches and the explorer when they are built; none
//! of it is read from global state.

use color::Coloring;
use complex::Complex;
use palette::{BuiltinPalettes, PaletteProvider, DEFAULT_PALETTE};
use planes::{GridSize, ViewWindow};

/// Viewer configuration.  `Default` gives the settings of the stock
/// viewer: the whole Mandelbrot set on a 1280×720 grid at 100
/// iterations.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Relative tolerance of the cache's closeness test.
    pub epsilon: f64,
    /// Palette used until another is chosen.
    pub palette: String,
    /// Palettes `Explorer::next_palette` cycles through.
    pub palettes: Vec<String>,
    /// How counts pick their colors.
    pub coloring: Coloring,
    /// Kernel threads.
    pub threads: usize,
    /// Side lengths are divided by this on zoom in, multiplied on zoom
    /// out.
    pub zoom_factor: f64,
    /// A pan moves the center by this fraction of the window's side.
    pub move_speed: f64,
    /// Starting window.
    pub view: ViewWindow,
    /// Starting iteration cap.
    pub max_iterations: u32,
    /// Starting grid.
    pub grid_size: GridSize,
    /// Iteration cap of the coarse tier.
    pub coarse_iterations: u32,
    /// The coarse tier's grid is the precise grid divided by this.
    pub coarse_divisor: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            epsilon: 1e-3,
            palette: DEFAULT_PALETTE.to_string(),
            palettes: BuiltinPalettes
                .names()
                .into_iter()
                .map(String::from)
                .collect(),
            coloring: Coloring::Direct,
            threads: num_cpus::get(),
            zoom_factor: 1.25,
            move_speed: 0.05,
            view: ViewWindow::new(Complex::zero(), Complex::new(3.0, 3.0)),
            max_iterations: 100,
            grid_size: GridSize::new(1280, 720),
            coarse_iterations: 32,
            coarse_divisor: 4,
        }
    }
}

impl Config {
    /// The coarse tier's grid for a given precise grid.  Never smaller
    /// than one cell along an axis the precise grid has cells on.
    pub fn coarse_grid(&self, precise: GridSize) -> GridSize {
        let divisor = self.coarse_divisor.max(1);
        let shrink = |n: usize| if n == 0 { 0 } else { (n / divisor).max(1) };
        GridSize::new(shrink(precise.width), shrink(precise.height))
    }
}
