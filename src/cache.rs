// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The viewport cache
//!
//! A full regeneration costs `O(W·H·max_iterations)`, which is a lot to
//! pay for every frame when the user is nudging the view by fractions
//! of a pixel.  The cache keeps the last grid and bitmap together with
//! the request that produced them, and on each `update` compares the
//! new request against the stored one.  Only when the window has moved
//! or been resized by more than a relative tolerance, or the iteration
//! cap, grid size or fractal has changed, does it run the kernel again.
//! Otherwise the stored bitmap stays authoritative and `render` stretches
//! it onto whatever window is currently on screen.
//!
//! The cache starts out empty and becomes fresh on its first successful
//! update.  Every update finishes its regeneration before returning, so
//! `render` never sees a half-built state.

use color::{Bitmap, ColorLut, Coloring};
use config::Config;
use errors::{Error, Result};
use escape::{self, Grid, Variant};
use palette::{BuiltinPalettes, PaletteProvider};
use planes::{Parameters, ViewWindow};
use transform::{Projector, RenderPlan, Surface};

/// Everything a grid is a function of.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Request {
    /// The window on the complex plane.
    pub view: ViewWindow,
    /// Mandelbrot or Julia.
    pub variant: Variant,
    /// Iteration cap and grid size.
    pub params: Parameters,
}

impl Request {
    /// Constructor.
    pub fn new(view: ViewWindow, variant: Variant, params: Parameters) -> Request {
        Request {
            view,
            variant,
            params,
        }
    }

    /// Whether the bitmap generated for `self` is still good enough for
    /// `other`.  Iteration cap and grid size must match exactly; the
    /// center, the side lengths and any Julia constant must be within
    /// `epsilon` of `self`'s, relative to `self`'s magnitude.
    pub fn is_close_to(&self, other: &Request, epsilon: f64) -> bool {
        self.params == other.params
            && self.view.center.is_close_to(other.view.center, epsilon)
            && self.view.side_length.is_close_to(other.view.side_length, epsilon)
            && self.variant.is_close_to(&other.variant, epsilon)
    }
}

/// What an update did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpdateStatus {
    /// The kernel ran and the stored bitmap was replaced.
    Regenerated,
    /// The request was close enough to the stored one; nothing ran.
    Unchanged,
    /// The request asked for a grid with no cells; the stored bitmap
    /// was kept.
    EmptyGrid,
    /// The request was handed to a background worker (see `worker`).
    Scheduled,
}

/// The last accepted request and what was generated for it, plus the
/// scratch space used to draw it.
#[derive(Debug)]
pub struct CacheEntry {
    request: Request,
    grid: Grid,
    bitmap: Bitmap,
    projector: Projector,
}

impl CacheEntry {
    /// Runs the kernel and the color mapper into new buffers.
    pub fn generate(
        request: Request,
        lut: &ColorLut,
        coloring: Coloring,
        threads: usize,
    ) -> CacheEntry {
        let mut entry = CacheEntry {
            request,
            grid: Grid::new(request.params.grid_size),
            bitmap: Bitmap::new(0, 0),
            projector: Projector::new(),
        };
        entry.regenerate(request, lut, coloring, threads);
        entry
    }

    /// Runs the kernel and the color mapper again, reusing this entry's
    /// buffers when the grid size has not changed.
    fn regenerate(
        &mut self,
        request: Request,
        lut: &ColorLut,
        coloring: Coloring,
        threads: usize,
    ) {
        self.grid.resize(request.params.grid_size);
        escape::generate_into(
            &mut self.grid,
            &request.view,
            request.variant,
            request.params.max_iterations,
            threads,
        );
        lut.colorize(&self.grid, coloring, &mut self.bitmap);
        self.request = request;
    }

    /// The request this entry was generated for.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The iteration counts.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The colored grid.
    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// Draws the bitmap onto `target`, which is showing `live`.
    pub fn render<S>(&mut self, target: &mut S, live: &ViewWindow) -> Option<RenderPlan>
    where
        S: Surface + ?Sized,
    {
        self.projector.project(&self.bitmap, &self.request.view, target, live)
    }
}

/// Reuses `previous` if it was built for this palette and cap,
/// otherwise samples the palette anew.  On failure `previous` is
/// handed back untouched along with the error.
fn prepare_lut<P>(
    provider: &P,
    palette: &str,
    max_iterations: u32,
    previous: Option<ColorLut>,
) -> ::std::result::Result<ColorLut, (Error, Option<ColorLut>)>
where
    P: PaletteProvider + ?Sized,
{
    match previous {
        Some(lut) if lut.matches(palette, max_iterations) => Ok(lut),
        previous => ColorLut::build(provider, palette, max_iterations).map_err(|e| (e, previous)),
    }
}

/// A single-owner cache: `update` then `render`, once per frame, from
/// one thread.
pub struct ViewCache<P = BuiltinPalettes> {
    provider: P,
    palette: String,
    coloring: Coloring,
    epsilon: f64,
    threads: usize,
    lut: Option<ColorLut>,
    entry: Option<CacheEntry>,
    generations: u64,
}

impl ViewCache<BuiltinPalettes> {
    /// An empty cache using the built-in palettes.
    pub fn new(config: &Config) -> ViewCache<BuiltinPalettes> {
        ViewCache::with_provider(config, BuiltinPalettes)
    }
}

impl<P: PaletteProvider> ViewCache<P> {
    /// An empty cache drawing its colors from `provider`.
    pub fn with_provider(config: &Config, provider: P) -> ViewCache<P> {
        ViewCache {
            provider,
            palette: config.palette.clone(),
            coloring: config.coloring,
            epsilon: config.epsilon,
            threads: config.threads,
            lut: None,
            entry: None,
            generations: 0,
        }
    }

    /// Whether `request` would make `update` run the kernel.
    pub fn needs_update(&self, request: &Request) -> bool {
        match self.entry {
            None => true,
            Some(ref entry) => !entry.request.is_close_to(request, self.epsilon),
        }
    }

    /// Brings the cache up to date with the requested view, running
    /// the kernel only when the stored bitmap is too far off (or always,
    /// with `force`).  Invalid views and unknown palettes are rejected
    /// and leave the cache exactly as it was.
    pub fn update(
        &mut self,
        view: ViewWindow,
        variant: Variant,
        params: Parameters,
        force: bool,
    ) -> Result<UpdateStatus> {
        if let Err(err) = view.validate() {
            warn!("rejecting update: {}", err);
            return Err(err);
        }
        let request = Request::new(view, variant, params);
        if params.grid_size.is_empty() {
            debug!("empty grid {:?} requested, keeping the current bitmap", params.grid_size);
            return Ok(UpdateStatus::EmptyGrid);
        }
        if !force && !self.needs_update(&request) {
            return Ok(UpdateStatus::Unchanged);
        }

        let previous = self.lut.take();
        let lut = match prepare_lut(&self.provider, &self.palette, params.max_iterations, previous) {
            Ok(lut) => lut,
            Err((err, previous)) => {
                warn!("rejecting update: {}", err);
                self.lut = previous;
                return Err(err);
            }
        };

        match self.entry {
            Some(ref mut entry) => entry.regenerate(request, &lut, self.coloring, self.threads),
            None => {
                self.entry = Some(CacheEntry::generate(request, &lut, self.coloring, self.threads))
            }
        }
        self.lut = Some(lut);
        self.generations += 1;
        debug!(
            "regenerated {:?} at {:?} ({} so far)",
            params, view, self.generations
        );
        Ok(UpdateStatus::Regenerated)
    }

    /// Draws the stored bitmap onto `target`, which is showing `live`.
    /// Does nothing while the cache is empty.
    pub fn render<S>(&mut self, target: &mut S, live: &ViewWindow) -> Option<RenderPlan>
    where
        S: Surface + ?Sized,
    {
        match self.entry {
            Some(ref mut entry) => entry.render(target, live),
            None => None,
        }
    }

    /// Switches palettes, recoloring the stored grid without running the
    /// kernel.  An unknown name leaves the palette, table and bitmap as
    /// they were.
    pub fn set_palette(&mut self, palette: &str) -> Result<()> {
        let max_iterations = match self.entry {
            Some(ref entry) => entry.grid.max_iterations(),
            None => 0,
        };
        let lut = ColorLut::build(&self.provider, palette, max_iterations)?;
        self.palette = palette.to_string();
        self.recolor(lut);
        Ok(())
    }

    /// Switches between direct and histogram coloring, recoloring the
    /// stored grid.
    pub fn set_coloring(&mut self, coloring: Coloring) {
        self.coloring = coloring;
        if let Some(lut) = self.lut.take() {
            self.recolor(lut);
        }
    }

    fn recolor(&mut self, lut: ColorLut) {
        if let Some(ref mut entry) = self.entry {
            lut.colorize(&entry.grid, self.coloring, &mut entry.bitmap);
        }
        self.lut = Some(lut);
    }

    /// True until the first successful update.
    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    /// The stored entry, if any.
    pub fn entry(&self) -> Option<&CacheEntry> {
        self.entry.as_ref()
    }

    /// The palette new tables are sampled from.
    pub fn palette(&self) -> &str {
        &self.palette
    }

    /// How many times the kernel has run.
    pub fn generations(&self) -> u64 {
        self.generations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use complex::Complex;
    use image::Rgba;
    use planes::GridSize;

    fn config() -> Config {
        Config {
            threads: 2,
            ..Config::default()
        }
    }

    fn classic() -> ViewWindow {
        ViewWindow::new(Complex::new(-0.5, 0.0), Complex::new(3.0, 3.0))
    }

    fn params() -> Parameters {
        Parameters::new(50, GridSize::new(32, 24))
    }

    #[test]
    fn starts_empty_and_renders_nothing() {
        let mut cache = ViewCache::new(&config());
        let mut target = Bitmap::from_pixel(8, 8, Rgba([1, 2, 3, 4]));
        assert!(cache.is_empty());
        assert!(cache.render(&mut target, &classic()).is_none());
        assert!(target.pixels().all(|p| *p == Rgba([1, 2, 3, 4])));
    }

    #[test]
    fn identical_updates_regenerate_once() {
        let mut cache = ViewCache::new(&config());
        let status = cache.update(classic(), Variant::Mandelbrot, params(), false);
        assert_eq!(status.unwrap(), UpdateStatus::Regenerated);
        let grid_at = cache.entry().unwrap().grid().counts().as_ptr();
        let bitmap_at = cache.entry().unwrap().bitmap().as_ptr();

        let status = cache.update(classic(), Variant::Mandelbrot, params(), false);
        assert_eq!(status.unwrap(), UpdateStatus::Unchanged);
        assert_eq!(cache.generations(), 1);
        assert_eq!(cache.entry().unwrap().grid().counts().as_ptr(), grid_at);
        assert_eq!(cache.entry().unwrap().bitmap().as_ptr(), bitmap_at);
    }

    #[test]
    fn origin_centered_views_are_cached_too() {
        let mut cache = ViewCache::new(&config());
        let view = ViewWindow::new(Complex::zero(), Complex::new(3.0, 3.0));
        cache.update(view, Variant::Mandelbrot, params(), false).unwrap();
        let status = cache.update(view, Variant::Mandelbrot, params(), false);
        assert_eq!(status.unwrap(), UpdateStatus::Unchanged);
    }

    #[test]
    fn force_regenerates_in_place() {
        let mut cache = ViewCache::new(&config());
        cache.update(classic(), Variant::Mandelbrot, params(), false).unwrap();
        let grid_at = cache.entry().unwrap().grid().counts().as_ptr();
        let status = cache.update(classic(), Variant::Mandelbrot, params(), true);
        assert_eq!(status.unwrap(), UpdateStatus::Regenerated);
        assert_eq!(cache.generations(), 2);
        assert_eq!(cache.entry().unwrap().grid().counts().as_ptr(), grid_at);
    }

    #[test]
    fn closeness_threshold_on_the_center() {
        let c0 = Complex::new(-0.5, 0.25);
        let tolerance = 1e-3 * c0.norm();
        let side = Complex::new(3.0, 3.0);

        let mut cache = ViewCache::new(&config());
        cache.update(ViewWindow::new(c0, side), Variant::Mandelbrot, params(), false).unwrap();

        let near = c0 + Complex::new(tolerance * 0.9, 0.0);
        let status = cache.update(ViewWindow::new(near, side), Variant::Mandelbrot, params(), false);
        assert_eq!(status.unwrap(), UpdateStatus::Unchanged);
        // The stored request is still the first one.
        assert_eq!(cache.entry().unwrap().request().view.center, c0);

        let far = c0 + Complex::new(0.0, tolerance * 1.1);
        let status = cache.update(ViewWindow::new(far, side), Variant::Mandelbrot, params(), false);
        assert_eq!(status.unwrap(), UpdateStatus::Regenerated);
        assert_eq!(cache.entry().unwrap().request().view.center, far);
    }

    #[test]
    fn closeness_threshold_on_the_side_length() {
        let mut cache = ViewCache::new(&config());
        cache.update(classic(), Variant::Mandelbrot, params(), false).unwrap();
        let nudged = ViewWindow::new(classic().center, Complex::new(3.001, 3.0));
        let status = cache.update(nudged, Variant::Mandelbrot, params(), false);
        assert_eq!(status.unwrap(), UpdateStatus::Unchanged);
        let zoomed = ViewWindow::new(classic().center, Complex::new(2.4, 2.4));
        let status = cache.update(zoomed, Variant::Mandelbrot, params(), false);
        assert_eq!(status.unwrap(), UpdateStatus::Regenerated);
    }

    #[test]
    fn parameter_and_variant_changes_always_regenerate() {
        let mut cache = ViewCache::new(&config());
        cache.update(classic(), Variant::Mandelbrot, params(), false).unwrap();

        let more = Parameters::new(51, params().grid_size);
        assert_eq!(
            cache.update(classic(), Variant::Mandelbrot, more, false).unwrap(),
            UpdateStatus::Regenerated
        );

        let bigger = Parameters::new(51, GridSize::new(33, 24));
        assert_eq!(
            cache.update(classic(), Variant::Mandelbrot, bigger, false).unwrap(),
            UpdateStatus::Regenerated
        );
        assert_eq!(cache.entry().unwrap().bitmap().dimensions(), (33, 24));

        let julia = Variant::Julia {
            c: Complex::new(-0.8, 0.156),
        };
        assert_eq!(
            cache.update(classic(), julia, bigger, false).unwrap(),
            UpdateStatus::Regenerated
        );
        let nearby = Variant::Julia {
            c: Complex::new(-0.8001, 0.156),
        };
        assert_eq!(
            cache.update(classic(), nearby, bigger, false).unwrap(),
            UpdateStatus::Unchanged
        );
        let elsewhere = Variant::Julia {
            c: Complex::new(0.285, 0.01),
        };
        assert_eq!(
            cache.update(classic(), elsewhere, bigger, false).unwrap(),
            UpdateStatus::Regenerated
        );
        assert_eq!(cache.generations(), 5);
    }

    #[test]
    fn invalid_views_are_rejected_without_side_effects() {
        let mut cache = ViewCache::new(&config());
        cache.update(classic(), Variant::Mandelbrot, params(), false).unwrap();
        let before = cache.entry().unwrap().bitmap().clone();

        let nan = ViewWindow::new(Complex::new(std::f64::NAN, 0.0), Complex::new(3.0, 3.0));
        match cache.update(nan, Variant::Mandelbrot, params(), true) {
            Err(Error::InvalidView(_)) => (),
            other => panic!("expected InvalidView, got {:?}", other),
        }
        let flat = ViewWindow::new(Complex::zero(), Complex::new(3.0, 0.0));
        assert!(cache.update(flat, Variant::Mandelbrot, params(), true).is_err());

        assert_eq!(cache.generations(), 1);
        assert_eq!(cache.entry().unwrap().request().view, classic());
        assert_eq!(*cache.entry().unwrap().bitmap(), before);
    }

    #[test]
    fn empty_grids_keep_the_previous_bitmap() {
        let mut cache = ViewCache::new(&config());
        cache.update(classic(), Variant::Mandelbrot, params(), false).unwrap();
        let empty = Parameters::new(50, GridSize::new(0, 24));
        assert_eq!(
            cache.update(classic(), Variant::Mandelbrot, empty, true).unwrap(),
            UpdateStatus::EmptyGrid
        );
        assert_eq!(cache.entry().unwrap().bitmap().dimensions(), (32, 24));
        assert_eq!(cache.generations(), 1);
    }

    #[test]
    fn unknown_palette_keeps_the_previous_colors() {
        let mut cache = ViewCache::new(&config());
        cache.update(classic(), Variant::Mandelbrot, params(), false).unwrap();
        let before = cache.entry().unwrap().bitmap().clone();
        match cache.set_palette("no-such-palette") {
            Err(Error::UnknownPalette(_)) => (),
            other => panic!("expected UnknownPalette, got {:?}", other),
        }
        assert_eq!(cache.palette(), "plasma");
        assert_eq!(*cache.entry().unwrap().bitmap(), before);
    }

    #[test]
    fn unknown_palette_rejects_the_first_update() {
        let config = Config {
            palette: "no-such-palette".to_string(),
            ..config()
        };
        let mut cache = ViewCache::new(&config);
        assert!(cache.update(classic(), Variant::Mandelbrot, params(), false).is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.generations(), 0);
    }

    #[test]
    fn recoloring_does_not_run_the_kernel() {
        let mut cache = ViewCache::new(&config());
        cache.update(classic(), Variant::Mandelbrot, params(), false).unwrap();
        let plasma = cache.entry().unwrap().bitmap().clone();
        cache.set_palette("grayscale").unwrap();
        assert_ne!(*cache.entry().unwrap().bitmap(), plasma);
        cache.set_coloring(Coloring::Histogram);
        cache.set_coloring(Coloring::Direct);
        let lut = ColorLut::build(&BuiltinPalettes, "grayscale", 50).unwrap();
        let entry = cache.entry().unwrap();
        let count = entry.grid().get(3, 5);
        assert_eq!(*entry.bitmap().get_pixel(3, 5), lut.get(count));
        assert_eq!(cache.generations(), 1);
    }

    #[test]
    fn render_identity_copies_the_bitmap() {
        let mut cache = ViewCache::new(&config());
        cache.update(classic(), Variant::Mandelbrot, params(), false).unwrap();
        let mut target = Bitmap::new(32, 24);
        let plan = cache.render(&mut target, &classic()).unwrap();
        assert_eq!(plan.scale, (1.0, 1.0));
        assert_eq!(plan.offset, (0.0, 0.0));
        assert_eq!(target, *cache.entry().unwrap().bitmap());
    }

    #[test]
    fn render_uses_the_stored_bitmap_between_regenerations() {
        let mut cache = ViewCache::new(&config());
        cache.update(classic(), Variant::Mandelbrot, params(), false).unwrap();
        // Drift by less than the tolerance; the bitmap stays and is
        // drawn shifted.
        let live = ViewWindow::new(Complex::new(-0.5004, 0.0), Complex::new(3.0, 3.0));
        assert_eq!(
            cache.update(live, Variant::Mandelbrot, params(), false).unwrap(),
            UpdateStatus::Unchanged
        );
        let mut target = Bitmap::new(32, 24);
        let plan = cache.render(&mut target, &live).unwrap();
        assert!(plan.offset.0 > 0.0);
        assert_eq!(plan.scale, (1.0, 1.0));
    }
}
