#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot and Julia set viewer core
//!
//! Rendering an escape-time fractal is expensive: every pixel runs a
//! recurrence up to `max_iterations` times.  An interactive viewer
//! asks for a new frame sixty times a second, but between two frames
//! the view usually moves by a fraction of a pixel.  This crate keeps
//! the last generated image around, along with the window of the
//! complex plane it was generated for, and only pays for a new one
//! when the requested window has drifted far enough from the cached
//! one.  In the meantime, the cached image is stretched and shifted
//! so that it still lines up with whatever the user is looking at.
//!
//! The pieces, leaves first:
//!
//! * [`escape`]: the row-parallel escape-time kernel.
//! * [`color`]: iteration counts to RGBA through a palette lookup table.
//! * [`transform`]: the scale-and-offset projection of a cached bitmap.
//! * [`cache`]: the viewport cache and its invalidation rules.
//! * [`worker`]: the same cache with generation moved off-thread.
//! * [`explorer`]: navigation and tiered (coarse, then precise) drawing.
//!
//! Settings are passed in as a [`config::Config`] value.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate tracing;
extern crate crossbeam;
extern crate image;
extern crate num;
extern crate num_cpus;

#[cfg(test)]
#[macro_use]
extern crate itertools;
#[cfg(test)]
extern crate rand;

pub mod cache;
pub mod color;
pub mod complex;
pub mod config;
pub mod errors;
pub mod escape;
pub mod explorer;
pub mod palette;
pub mod planes;
pub mod transform;
pub mod worker;

pub use cache::{Request, UpdateStatus, ViewCache};
pub use color::{Bitmap, ColorLut, Coloring};
pub use complex::Complex;
pub use config::Config;
pub use errors::{Error, Result};
pub use escape::{generate, Grid, Variant};
pub use explorer::Explorer;
pub use palette::{BuiltinPalettes, PaletteProvider};
pub use planes::{GridSize, Parameters, ViewWindow};
pub use transform::{Projector, RenderPlan, Surface};
pub use worker::AsyncCache;
