//! Describes the relationship between a rectangle on the integral
//! plane with an origin at 0,0 (the pixel grid) and a window on the
//! complex plane given by its center and the lengths of its sides.

use complex::Complex;
use errors::{Error, Result};

/// The region of the complex plane being looked at.  `side_length`
/// is not a complex number in any meaningful sense; its real part is
/// the window's width and its imaginary part the window's height.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewWindow {
    /// The point in the middle of the window.
    pub center: Complex,
    /// Width (real part) and height (imaginary part) of the window.
    pub side_length: Complex,
}

impl ViewWindow {
    /// Constructor.  Does not validate; see `validate`.
    pub fn new(center: Complex, side_length: Complex) -> ViewWindow {
        ViewWindow {
            center,
            side_length,
        }
    }

    /// A window is usable when every component is finite and both
    /// sides are strictly positive.
    pub fn validate(&self) -> Result<()> {
        if !self.center.is_finite() || !self.side_length.is_finite() {
            return Err(Error::InvalidView(format!(
                "non-finite window: center {:?}, side length {:?}",
                self.center, self.side_length
            )));
        }
        if self.side_length.re <= 0.0 || self.side_length.im <= 0.0 {
            return Err(Error::InvalidView(format!(
                "side lengths must be positive, got {} x {}",
                self.side_length.re, self.side_length.im
            )));
        }
        Ok(())
    }

    /// The lower-left corner, where pixel (0, 0) is sampled.
    pub fn origin(&self) -> Complex {
        Complex::new(
            self.center.re - self.side_length.re / 2.0,
            self.center.im - self.side_length.im / 2.0,
        )
    }
}

/// Width and height of the pixel grid.  Either may be zero, in which
/// case there is nothing to generate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GridSize {
    /// Cells along the real axis.
    pub width: usize,
    /// Cells along the imaginary axis.
    pub height: usize,
}

impl GridSize {
    /// Constructor.
    pub fn new(width: usize, height: usize) -> GridSize {
        GridSize { width, height }
    }

    /// The total number of cells in the grid.  Used to calculate
    /// memory needs.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Everything besides the window and the variant that determines the
/// contents of a grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Parameters {
    /// Cap on the recurrence; also the value stored for points that
    /// never escape.
    pub max_iterations: u32,
    /// Dimensions of the generated grid.
    pub grid_size: GridSize,
}

impl Parameters {
    /// Constructor.
    pub fn new(max_iterations: u32, grid_size: GridSize) -> Parameters {
        Parameters {
            max_iterations,
            grid_size,
        }
    }
}

/// Describes the x, y of a cell in the grid.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Maps cells of a pixel grid to points inside a view window.  Cell
/// (i, j) samples the point `origin + (i/W, j/H) ⊙ side_length`, so
/// cell (0, 0) sits on the window's lower-left corner and the last
/// cell stops one cell short of the upper-right one.
#[derive(Debug)]
pub struct PlaneMapper {
    /// The size of the integral plane.
    pub grid: GridSize,
    /// The window on the complex plane.
    pub view: ViewWindow,
    origin: Complex,
}

impl PlaneMapper {
    /// Constructor.
    pub fn new(view: ViewWindow, grid: GridSize) -> PlaneMapper {
        PlaneMapper {
            grid,
            view,
            origin: view.origin(),
        }
    }

    /// The real coordinate of column `i`.
    #[inline]
    pub fn column_to_re(&self, i: usize) -> f64 {
        self.origin.re + (i as f64 / self.grid.width as f64) * self.view.side_length.re
    }

    /// The imaginary coordinate of row `j`.
    #[inline]
    pub fn row_to_im(&self, j: usize) -> f64 {
        self.origin.im + (j as f64 / self.grid.height as f64) * self.view.side_length.im
    }

    /// Given a pixel on the integral cartesian plane, map that to the
    /// point on the complex plane it samples.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex {
        Complex::new(self.column_to_re(pixel.0), self.row_to_im(pixel.1))
    }

    /// Given a position in pixel units (not necessarily integral, and
    /// not necessarily inside the grid), map it to the complex plane.
    /// Used to recenter on a point under the mouse.
    pub fn position_to_point(&self, x: f64, y: f64) -> Complex {
        Complex::new(
            self.origin.re + (x / self.grid.width as f64) * self.view.side_length.re,
            self.origin.im + (y / self.grid.height as f64) * self.view.side_length.im,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(cre: f64, cim: f64, w: f64, h: f64) -> ViewWindow {
        ViewWindow::new(Complex::new(cre, cim), Complex::new(w, h))
    }

    #[test]
    fn validate_fails_on_bad_shape() {
        assert!(window(0.0, 0.0, -1.0, 1.0).validate().is_err());
        assert!(window(0.0, 0.0, 1.0, 0.0).validate().is_err());
    }

    #[test]
    fn validate_fails_on_non_finite_values() {
        assert!(window(std::f64::NAN, 0.0, 1.0, 1.0).validate().is_err());
        assert!(window(0.0, 0.0, std::f64::INFINITY, 1.0).validate().is_err());
    }

    #[test]
    fn validate_passes_on_good_shape() {
        assert!(window(-0.5, 0.0, 3.0, 3.0).validate().is_ok());
    }

    #[test]
    fn grid_size_emptiness() {
        assert!(GridSize::new(0, 5).is_empty());
        assert!(GridSize::new(5, 0).is_empty());
        assert!(!GridSize::new(1, 1).is_empty());
        assert_eq!(GridSize::new(4, 3).len(), 12);
    }

    #[test]
    fn pixel_to_point_on_positive_planes() {
        let pm = PlaneMapper::new(window(2.5, 2.5, 5.0, 5.0), GridSize::new(5, 5));
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(2.0, 2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(4, 4)), Complex::new(4.0, 4.0));
    }

    #[test]
    fn pixel_to_points_on_mixed_planes() {
        let pm = PlaneMapper::new(window(0.0, 0.0, 4.0, 4.0), GridSize::new(4, 4));
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-2.0, -2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(3, 1)), Complex::new(1.0, -1.0));
    }

    #[test]
    fn pixel_to_point_on_rectangular_planes() {
        let pm = PlaneMapper::new(window(-0.5, 0.0, 3.0, 2.0), GridSize::new(6, 4));
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-2.0, -1.0));
        assert_eq!(pm.pixel_to_point(&Pixel(3, 2)), Complex::new(-0.5, 0.0));
    }

    #[test]
    fn position_to_point_agrees_with_pixel_to_point() {
        let pm = PlaneMapper::new(window(0.0, 0.0, 4.0, 4.0), GridSize::new(8, 8));
        assert_eq!(pm.position_to_point(4.0, 4.0), pm.pixel_to_point(&Pixel(4, 4)));
        assert_eq!(pm.position_to_point(8.0, 0.0), Complex::new(2.0, -2.0));
    }
}
