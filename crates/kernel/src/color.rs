/// Convert HSL to RGB.
///
/// `hue` in degrees (any value, wrapped), `saturation` and `lightness` in
/// `[0, 1]`. Output channels are in `[0, 1]`, sRGB encoded.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [f32; 3] {
    let h = hue.rem_euclid(360.0) / 360.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    if s == 0.0 {
        return [l, l, l];
    }

    let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    [
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    ]
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn primaries() {
        assert!(close(hsl_to_rgb(0.0, 1.0, 0.5), [1.0, 0.0, 0.0]));
        assert!(close(hsl_to_rgb(120.0, 1.0, 0.5), [0.0, 1.0, 0.0]));
        assert!(close(hsl_to_rgb(240.0, 1.0, 0.5), [0.0, 0.0, 1.0]));
    }

    #[test]
    fn grey_without_saturation() {
        assert!(close(hsl_to_rgb(200.0, 0.0, 0.3), [0.3, 0.3, 0.3]));
    }

    #[test]
    fn cool_near_white_star() {
        // hsl(220, 70%, 90%)
        let [r, g, b] = hsl_to_rgb(220.0, 0.7, 0.9);
        assert!((r - 0.83).abs() < 1e-4);
        assert!((g - 0.8767).abs() < 1e-3);
        assert!((b - 0.97).abs() < 1e-4);
        assert!(b > g && g > r);
    }

    #[test]
    fn hue_wraps() {
        assert!(close(hsl_to_rgb(360.0 + 60.0, 1.0, 0.5), hsl_to_rgb(60.0, 1.0, 0.5)));
    }
}
