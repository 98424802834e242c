//! Drawing a bitmap generated for one window onto a surface showing
//! another.
//!
//! Between regenerations the user keeps panning and zooming, so the
//! window on screen drifts away from the window the cached bitmap was
//! made for.  Both are axis-aligned rectangles on the complex plane,
//! so getting from one to the other is a scale and a translation: the
//! cached bitmap is stretched by the ratio of the two windows' sides
//! and moved by the distance between their centers, measured in
//! on-screen pixels.

use image::imageops;
use num::clamp;

use color::Bitmap;
use planes::ViewWindow;

/// Somewhere pixels can be drawn.
pub trait Surface {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Copies `bitmap` so that its top-left pixel lands on
    /// (`left`, `top`).  Whatever falls outside the surface is dropped.
    fn blit(&mut self, bitmap: &Bitmap, left: i64, top: i64);
}

impl Surface for Bitmap {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn blit(&mut self, bitmap: &Bitmap, left: i64, top: i64) {
        imageops::replace(self, bitmap, left, top);
    }
}

/// How far from the origin a destination edge may lie, in pixels.  Well
/// past any surface, and small enough that edge differences fit an
/// `i64`.
pub const PIXEL_LIMIT: f64 = 1_099_511_627_776.0;

/// A rectangle in surface pixels, right and bottom exclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PixelRect {
    /// First column.
    pub left: i64,
    /// First row.
    pub top: i64,
    /// One past the last column.
    pub right: i64,
    /// One past the last row.
    pub bottom: i64,
}

impl PixelRect {
    /// Columns covered.
    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    /// Rows covered.
    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }

    /// True when the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// The part of `self` that is also inside `other`.
    pub fn intersect(&self, other: &PixelRect) -> PixelRect {
        PixelRect {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        }
    }
}

/// Where and how big a cached bitmap appears on a target surface.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderPlan {
    /// The size of one target pixel on the complex plane.
    pub pixel_size: (f64, f64),
    /// How much the bitmap is stretched along each axis.
    pub scale: (f64, f64),
    /// The distance, in target pixels, from the target's center to the
    /// center of the drawn bitmap.
    pub offset: (f64, f64),
    /// The drawn bitmap's size in target pixels.
    pub size: (f64, f64),
    /// The drawn bitmap's top-left corner in target pixels.
    pub corner: (f64, f64),
}

impl RenderPlan {
    /// Works out the placement of a `bitmap`-sized image generated for
    /// `cached` on a `target`-sized surface currently showing `live`.
    /// Returns `None` when there is nothing sensible to draw: an empty
    /// bitmap or target, or windows that produce non-finite numbers.
    pub fn new(
        cached: &ViewWindow,
        bitmap: (u32, u32),
        live: &ViewWindow,
        target: (u32, u32),
    ) -> Option<RenderPlan> {
        if bitmap.0 == 0 || bitmap.1 == 0 || target.0 == 0 || target.1 == 0 {
            return None;
        }
        let pixel_size = (
            live.side_length.re / f64::from(target.0),
            live.side_length.im / f64::from(target.1),
        );
        let scale = (
            cached.side_length.re / live.side_length.re,
            cached.side_length.im / live.side_length.im,
        );
        let offset = (
            (cached.center.re - live.center.re) / pixel_size.0,
            (cached.center.im - live.center.im) / pixel_size.1,
        );
        let size = (scale.0 * f64::from(bitmap.0), scale.1 * f64::from(bitmap.1));
        let corner = (
            f64::from(target.0) / 2.0 + offset.0 - size.0 / 2.0,
            f64::from(target.1) / 2.0 + offset.1 - size.1 / 2.0,
        );
        let finite = [
            pixel_size.0, pixel_size.1, scale.0, scale.1, offset.0, offset.1, corner.0, corner.1,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return None;
        }
        Some(RenderPlan {
            pixel_size,
            scale,
            offset,
            size,
            corner,
        })
    }

    /// The drawn bitmap's corner and size snapped to whole pixels, as
    /// (left, top, width, height).  Corner and size are rounded on their
    /// own so a pan never changes the size.
    fn snapped(&self) -> (f64, f64, f64, f64) {
        (
            self.corner.0.round(),
            self.corner.1.round(),
            self.size.0.round().max(0.0),
            self.size.1.round().max(0.0),
        )
    }

    /// The destination rectangle snapped to whole pixels.  Edges past
    /// `PIXEL_LIMIT` are pulled in to it, which leaves any part that can
    /// land on a surface unchanged.
    pub fn destination(&self) -> PixelRect {
        let (left, top, width, height) = self.snapped();
        let edge = |v: f64| clamp(v, -PIXEL_LIMIT, PIXEL_LIMIT) as i64;
        PixelRect {
            left: edge(left),
            top: edge(top),
            right: edge(left + width),
            bottom: edge(top + height),
        }
    }
}

/// Stretches bitmaps onto surfaces, keeping the resized copy in a
/// scratch buffer that is only reallocated when its size changes.
#[derive(Debug)]
pub struct Projector {
    scratch: Bitmap,
}

impl Default for Projector {
    fn default() -> Projector {
        Projector::new()
    }
}

impl Projector {
    /// An empty scratch buffer.
    pub fn new() -> Projector {
        Projector {
            scratch: Bitmap::new(0, 0),
        }
    }

    /// The buffer the last projection was resampled into.
    pub fn scratch(&self) -> &Bitmap {
        &self.scratch
    }

    /// Draws `bitmap`, generated for `cached`, onto `target`, which is
    /// showing `live`.  Only the part of the destination rectangle that
    /// lands on the surface is resampled, using nearest-neighbour
    /// lookups.  Returns the plan used, or `None` if nothing was drawn.
    pub fn project<S>(
        &mut self,
        bitmap: &Bitmap,
        cached: &ViewWindow,
        target: &mut S,
        live: &ViewWindow,
    ) -> Option<RenderPlan>
    where
        S: Surface + ?Sized,
    {
        let plan = RenderPlan::new(
            cached,
            bitmap.dimensions(),
            live,
            (target.width(), target.height()),
        )?;
        let dest = plan.destination();
        let bounds = PixelRect {
            left: 0,
            top: 0,
            right: i64::from(target.width()),
            bottom: i64::from(target.height()),
        };
        let visible = dest.intersect(&bounds);
        if dest.is_empty() || visible.is_empty() {
            trace!("render plan {:?} puts nothing on screen", plan);
            return None;
        }

        let (vw, vh) = (visible.width() as u32, visible.height() as u32);
        if self.scratch.dimensions() != (vw, vh) {
            self.scratch = Bitmap::new(vw, vh);
        }

        let (bw, bh) = bitmap.dimensions();
        let (left, top, width, height) = plan.snapped();
        let step_x = f64::from(bw) / width;
        let step_y = f64::from(bh) / height;
        for (x, y, pixel) in self.scratch.enumerate_pixels_mut() {
            let dx = visible.left as f64 + f64::from(x) + 0.5 - left;
            let dy = visible.top as f64 + f64::from(y) + 0.5 - top;
            let sx = ((dx * step_x) as u32).min(bw - 1);
            let sy = ((dy * step_y) as u32).min(bh - 1);
            *pixel = *bitmap.get_pixel(sx, sy);
        }

        trace!("render plan {:?}, visible {:?}", plan, visible);
        target.blit(&self.scratch, visible.left, visible.top);
        Some(plan)
    }
}
