//! Named palettes.  A palette maps a position in `[0, 1]` to a color;
//! the color mapper samples it once per possible iteration count and
//! never calls it per pixel.

use image::Rgba;
use num::clamp;

use errors::{Error, Result};

/// Anything that can turn a palette name and a normalized position
/// into a color.
pub trait PaletteProvider {
    /// The color at `t` (clamped to `[0, 1]`) of the named palette.
    fn color(&self, name: &str, t: f64) -> Result<Rgba<u8>>;

    /// Every name `color` accepts, in display order.
    fn names(&self) -> Vec<&str>;

    /// Whether `color` accepts this name.
    fn contains(&self, name: &str) -> bool {
        self.names().iter().any(|n| *n == name)
    }
}

type Stops = &'static [(u8, u8, u8)];

// Evenly spaced stops, interpolated linearly.  The matplotlib-style
// gradients are sampled at quarters of their range.
const GRADIENTS: [(&str, Stops); 7] = [
    (
        "plasma",
        &[(13, 8, 135), (126, 3, 168), (204, 71, 120), (248, 149, 64), (240, 249, 33)],
    ),
    (
        "viridis",
        &[(68, 1, 84), (59, 82, 139), (33, 145, 140), (94, 201, 98), (253, 231, 37)],
    ),
    (
        "magma",
        &[(0, 0, 4), (81, 18, 124), (183, 55, 121), (252, 137, 97), (252, 253, 191)],
    ),
    (
        "inferno",
        &[(0, 0, 4), (87, 16, 110), (188, 55, 84), (249, 142, 9), (252, 255, 164)],
    ),
    (
        "twilight",
        &[(226, 217, 226), (94, 128, 185), (48, 20, 55), (180, 85, 70), (226, 217, 226)],
    ),
    (
        "ocean",
        &[
            (0, 0, 51),
            (26, 51, 128),
            (51, 128, 204),
            (128, 204, 230),
            (255, 255, 204),
            (255, 204, 77),
            (255, 128, 26),
            (204, 51, 26),
            (128, 0, 51),
            (0, 0, 0),
        ],
    ),
    ("grayscale", &[(0, 0, 0), (255, 255, 255)]),
];

/// The palettes that ship with the crate.  `plasma` is the default.
#[derive(Copy, Clone, Debug, Default)]
pub struct BuiltinPalettes;

/// The name of the palette used when none is chosen.
pub const DEFAULT_PALETTE: &str = "plasma";

impl BuiltinPalettes {
    fn stops(name: &str) -> Option<Stops> {
        GRADIENTS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, stops)| *stops)
    }
}

fn lerp(a: u8, b: u8, frac: f64) -> u8 {
    let v = f64::from(a) + (f64::from(b) - f64::from(a)) * frac;
    clamp(v.round(), 0.0, 255.0) as u8
}

impl PaletteProvider for BuiltinPalettes {
    fn color(&self, name: &str, t: f64) -> Result<Rgba<u8>> {
        let stops = BuiltinPalettes::stops(name)
            .ok_or_else(|| Error::UnknownPalette(name.to_string()))?;
        // NaN clamps to NaN; treat it as the start of the gradient.
        let t = if t.is_nan() { 0.0 } else { clamp(t, 0.0, 1.0) };
        let scaled = t * (stops.len() - 1) as f64;
        let idx = (scaled as usize).min(stops.len() - 2);
        let frac = scaled - idx as f64;
        let (r1, g1, b1) = stops[idx];
        let (r2, g2, b2) = stops[idx + 1];
        Ok(Rgba([
            lerp(r1, r2, frac),
            lerp(g1, g2, frac),
            lerp(b1, b2, frac),
            255,
        ]))
    }

    fn names(&self) -> Vec<&str> {
        GRADIENTS.iter().map(|(name, _)| *name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_hit_the_first_and_last_stops() {
        let p = BuiltinPalettes;
        assert_eq!(p.color("grayscale", 0.0).unwrap(), Rgba([0, 0, 0, 255]));
        assert_eq!(p.color("grayscale", 1.0).unwrap(), Rgba([255, 255, 255, 255]));
        assert_eq!(p.color("plasma", 0.0).unwrap(), Rgba([13, 8, 135, 255]));
        assert_eq!(p.color("plasma", 1.0).unwrap(), Rgba([240, 249, 33, 255]));
    }

    #[test]
    fn interpolates_between_stops() {
        let p = BuiltinPalettes;
        assert_eq!(p.color("grayscale", 0.5).unwrap(), Rgba([128, 128, 128, 255]));
        assert_eq!(p.color("viridis", 0.5).unwrap(), Rgba([33, 145, 140, 255]));
    }

    #[test]
    fn out_of_range_positions_are_clamped() {
        let p = BuiltinPalettes;
        assert_eq!(p.color("magma", -3.0).unwrap(), p.color("magma", 0.0).unwrap());
        assert_eq!(p.color("magma", 7.5).unwrap(), p.color("magma", 1.0).unwrap());
        assert_eq!(
            p.color("magma", std::f64::NAN).unwrap(),
            p.color("magma", 0.0).unwrap()
        );
    }

    #[test]
    fn unknown_names_are_errors() {
        let p = BuiltinPalettes;
        match p.color("chartreuse", 0.5) {
            Err(Error::UnknownPalette(name)) => assert_eq!(name, "chartreuse"),
            other => panic!("expected UnknownPalette, got {:?}", other),
        }
        assert!(!p.contains("chartreuse"));
    }

    #[test]
    fn every_listed_name_resolves() {
        let p = BuiltinPalettes;
        assert_eq!(p.names()[0], DEFAULT_PALETTE);
        for name in p.names() {
            assert!(p.color(name, 0.3).is_ok(), "{}", name);
        }
    }
}
