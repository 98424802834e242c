//! Navigation, and drawing in two tiers.
//!
//! The explorer turns pan, zoom, iteration and palette commands into
//! windows and parameters, and feeds them to two caches.  The coarse
//! one runs a quarter-resolution, low-iteration grid on the calling
//! thread and is cheap enough to keep up with every frame.  The precise
//! one runs on a background worker.  Each frame draws the coarse bitmap
//! first and the precise one on top, so while a precise regeneration is
//! pending the user still sees something that lines up with the view.

use cache::ViewCache;
use complex::Complex;
use config::Config;
use errors::Result;
use escape::Variant;
use planes::{GridSize, Parameters, PlaneMapper, ViewWindow};
use transform::Surface;
use worker::AsyncCache;

/// Interactive state over a coarse and a precise cache.
pub struct Explorer {
    config: Config,
    view: ViewWindow,
    variant: Variant,
    max_iterations: u32,
    grid_size: GridSize,
    palette: usize,
    coarse: ViewCache,
    precise: AsyncCache,
}

impl Explorer {
    /// Starts at the configured view.  Fails if the background worker
    /// cannot be started.
    pub fn new(config: Config) -> Result<Explorer> {
        // Off the list, the first step lands on its first entry.
        let palette = config
            .palettes
            .iter()
            .position(|name| *name == config.palette)
            .unwrap_or_else(|| config.palettes.len().saturating_sub(1));
        let coarse_config = Config {
            threads: 1,
            ..config.clone()
        };
        Ok(Explorer {
            view: config.view,
            variant: Variant::Mandelbrot,
            max_iterations: config.max_iterations,
            grid_size: config.grid_size,
            palette,
            coarse: ViewCache::new(&coarse_config),
            precise: AsyncCache::new(&config)?,
            config,
        })
    }

    /// The window currently looked at.
    pub fn view(&self) -> ViewWindow {
        self.view
    }

    /// Mandelbrot or Julia.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// What the precise tier generates.
    pub fn parameters(&self) -> Parameters {
        Parameters::new(self.max_iterations, self.grid_size)
    }

    /// What the coarse tier generates: fewer cells, and never more
    /// iterations than the precise tier.
    pub fn coarse_parameters(&self) -> Parameters {
        Parameters::new(
            self.config.coarse_iterations.min(self.max_iterations),
            self.config.coarse_grid(self.grid_size),
        )
    }

    /// Moves the center by `dx` and `dy` steps, a step being
    /// `move_speed` times the window's side along that axis.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let step = self.view.side_length.scale(self.config.move_speed);
        self.view.center = self.view.center + step.hadamard(Complex::new(dx, dy));
    }

    /// Shrinks the window by the zoom factor.
    pub fn zoom_in(&mut self) {
        let factor = self.config.zoom_factor;
        self.zoom(1.0 / factor);
    }

    /// Grows the window by the zoom factor.
    pub fn zoom_out(&mut self) {
        let factor = self.config.zoom_factor;
        self.zoom(factor);
    }

    /// Multiplies both sides of the window by `factor`, keeping the
    /// center.
    pub fn zoom(&mut self, factor: f64) {
        self.view.side_length = self.view.side_length.scale(factor);
    }

    /// Recenters on the point under grid position (`x`, `y`).
    pub fn center_on(&mut self, x: f64, y: f64) {
        let plane = PlaneMapper::new(self.view, self.grid_size);
        self.view.center = plane.position_to_point(x, y);
    }

    /// Changes the iteration cap.
    pub fn set_iterations(&mut self, max_iterations: u32) {
        self.max_iterations = max_iterations;
    }

    /// Changes the grid, typically to follow the window's size.
    pub fn set_grid_size(&mut self, grid_size: GridSize) {
        self.grid_size = grid_size;
    }

    /// Switches between the Mandelbrot set and a Julia set.
    pub fn set_variant(&mut self, variant: Variant) {
        self.variant = variant;
    }

    /// The palette in use.
    pub fn palette(&self) -> &str {
        self.coarse.palette()
    }

    /// Moves on to the next configured palette and recolors.  With no
    /// palettes configured, stays on the current one.
    pub fn next_palette(&mut self) -> Result<&str> {
        if self.config.palettes.is_empty() {
            return Ok(self.coarse.palette());
        }
        let next = (self.palette + 1) % self.config.palettes.len();
        let name = self.config.palettes[next].clone();
        self.coarse.set_palette(&name)?;
        self.precise.set_palette(&name)?;
        self.palette = next;
        info!("palette {}", name);
        Ok(self.coarse.palette())
    }

    /// Brings both tiers up to date and draws them onto `target`, coarse
    /// first.  The precise tier is only asked for a new bitmap; whatever
    /// it last finished is what gets drawn.
    pub fn frame<S>(&mut self, target: &mut S) -> Result<()>
    where
        S: Surface + ?Sized,
    {
        let coarse = self.coarse_parameters();
        let precise = self.parameters();
        let status = self.coarse.update(self.view, self.variant, coarse, false)?;
        trace!("coarse tier: {:?}", status);
        self.precise.request(self.view, self.variant, precise, false)?;
        self.precise.poll();
        self.coarse.render(target, &self.view);
        self.precise.render(target, &self.view);
        Ok(())
    }

    /// Blocks until the precise tier has caught up with the view.
    pub fn settle(&mut self) -> Result<()> {
        self.precise.wait()
    }

    /// True when the precise tier has caught up with the view.
    pub fn is_settled(&self) -> bool {
        self.precise.is_current()
    }
}
