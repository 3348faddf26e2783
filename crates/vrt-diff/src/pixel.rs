//! Per-pixel colour distance in YIQ space
//!
//! Pixels are blended onto white by their alpha before comparison, so two
//! fully transparent pixels compare equal regardless of their colour.

use image::Rgba;

/// Largest possible YIQ delta between two pixels
pub const MAX_YIQ_DELTA: f64 = 35215.0;

/// Squared YIQ distance between two pixels
pub fn color_delta(a: &Rgba<u8>, b: &Rgba<u8>) -> f64 {
    if a == b {
        return 0.0;
    }

    let (r1, g1, b1) = blend_on_white(a);
    let (r2, g2, b2) = blend_on_white(b);

    let y = rgb2y(r1, g1, b1) - rgb2y(r2, g2, b2);
    let i = rgb2i(r1, g1, b1) - rgb2i(r2, g2, b2);
    let q = rgb2q(r1, g1, b1) - rgb2q(r2, g2, b2);

    0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q
}

/// True when the pixels differ by more than `tolerance` (in [0, 1])
pub fn is_different(a: &Rgba<u8>, b: &Rgba<u8>, tolerance: f64) -> bool {
    color_delta(a, b) > MAX_YIQ_DELTA * tolerance * tolerance
}

/// Faded grayscale used for unchanged pixels in the diff image
pub fn faded(pixel: &Rgba<u8>) -> Rgba<u8> {
    const ALPHA: f64 = 0.1;
    let (r, g, b) = blend_on_white(pixel);
    let y = rgb2y(r, g, b);
    let v = (255.0 + (y - 255.0) * ALPHA).round().clamp(0.0, 255.0) as u8;
    Rgba([v, v, v, 255])
}

/// Colour used to mark differing pixels
pub const DIFF_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

fn blend_on_white(pixel: &Rgba<u8>) -> (f64, f64, f64) {
    let [r, g, b, a] = pixel.0;
    let alpha = f64::from(a) / 255.0;
    let blend = |c: u8| 255.0 + (f64::from(c) - 255.0) * alpha;
    (blend(r), blend(g), blend(b))
}

fn rgb2y(r: f64, g: f64, b: f64) -> f64 {
    r * 0.298_895_31 + g * 0.586_622_47 + b * 0.114_482_23
}

fn rgb2i(r: f64, g: f64, b: f64) -> f64 {
    r * 0.595_977_99 - g * 0.274_176_10 - b * 0.321_801_89
}

fn rgb2q(r: f64, g: f64, b: f64) -> f64 {
    r * 0.211_470_17 - g * 0.522_617_11 + b * 0.311_146_94
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_pixels() {
        let p = Rgba([12, 34, 56, 255]);
        assert_eq!(color_delta(&p, &p), 0.0);
        assert!(!is_different(&p, &p, 0.0));
    }

    #[test]
    fn test_black_vs_white() {
        let black = Rgba([0, 0, 0, 255]);
        let white = Rgba([255, 255, 255, 255]);
        let delta = color_delta(&black, &white);
        assert!(delta > 30_000.0 && delta <= MAX_YIQ_DELTA);
        assert!(is_different(&black, &white, 0.9));
        assert!(!is_different(&black, &white, 1.0));
    }

    #[test]
    fn test_small_change_within_tolerance() {
        let a = Rgba([100, 100, 100, 255]);
        let b = Rgba([102, 100, 100, 255]);
        assert!(is_different(&a, &b, 0.0));
        assert!(!is_different(&a, &b, 0.1));
    }

    #[test]
    fn test_transparent_pixels_equal() {
        let a = Rgba([255, 0, 0, 0]);
        let b = Rgba([0, 0, 255, 0]);
        assert_eq!(color_delta(&a, &b), 0.0);
    }

    #[test]
    fn test_faded_is_light() {
        let black = Rgba([0, 0, 0, 255]);
        let [v, _, _, a] = faded(&black).0;
        assert!(v > 200);
        assert_eq!(a, 255);
    }
}
