//! A complex number as a plain pair of reals.  The kernel only needs
//! add, multiply and the squared magnitude, and keeping the type local
//! lets those be written out the way the inner loop wants them.

use std::ops::{Add, Mul, Sub};

/// A point on the complex cartesian plane, with the real part as the
/// x-component and the imaginary part as the y-component.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Complex {
    /// The real part.
    pub re: f64,
    /// The imaginary part.
    pub im: f64,
}

impl Complex {
    /// Constructor.
    pub const fn new(re: f64, im: f64) -> Complex {
        Complex { re, im }
    }

    /// The origin.
    pub const fn zero() -> Complex {
        Complex { re: 0.0, im: 0.0 }
    }

    /// `|z|²`, without the square root.
    #[inline]
    pub fn norm_sqr(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    /// `|z|`.
    #[inline]
    pub fn norm(self) -> f64 {
        self.re.hypot(self.im)
    }

    /// `z²`, expanded.
    #[inline]
    pub fn square(self) -> Complex {
        Complex {
            re: self.re * self.re - self.im * self.im,
            im: (self.re + self.re) * self.im,
        }
    }

    /// Multiplies both parts by a real.
    #[inline]
    pub fn scale(self, factor: f64) -> Complex {
        Complex {
            re: self.re * factor,
            im: self.im * factor,
        }
    }

    /// Component-wise product; used to stretch a unit offset over a
    /// window whose width and height differ.
    #[inline]
    pub fn hadamard(self, other: Complex) -> Complex {
        Complex {
            re: self.re * other.re,
            im: self.im * other.im,
        }
    }

    /// True when neither part is NaN or infinite.
    pub fn is_finite(self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }

    /// The closeness predicate used by the viewport cache: `other` is
    /// close to `self` when the distance between them is less than
    /// `epsilon` times the magnitude of `self`.  Relative to `self`, so
    /// `a.is_close_to(b, e)` and `b.is_close_to(a, e)` may disagree.
    /// Equal values are always close, which matters at the origin where
    /// the tolerance collapses to zero.
    pub fn is_close_to(self, other: Complex, epsilon: f64) -> bool {
        self == other || (other - self).norm() < epsilon * self.norm()
    }
}

impl Add for Complex {
    type Output = Complex;

    #[inline]
    fn add(self, rhs: Complex) -> Complex {
        Complex {
            re: self.re + rhs.re,
            im: self.im + rhs.im,
        }
    }
}

impl Sub for Complex {
    type Output = Complex;

    #[inline]
    fn sub(self, rhs: Complex) -> Complex {
        Complex {
            re: self.re - rhs.re,
            im: self.im - rhs.im,
        }
    }
}

impl Mul for Complex {
    type Output = Complex;

    #[inline]
    fn mul(self, rhs: Complex) -> Complex {
        Complex {
            re: self.re * rhs.re - self.im * rhs.im,
            im: self.re * rhs.im + self.im * rhs.re,
        }
    }
}
