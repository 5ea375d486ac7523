use glam::DVec3;

/// Distance at which the dilation factor reaches 1.
pub const DILATION_FAR: f64 = 20.0;
pub const DILATION_MIN: f64 = 0.1;
pub const DILATION_MAX: f64 = 1.0;

/// Presentation target for the three telemetry lines.
pub trait TelemetrySink {
    fn set_distance(&mut self, text: &str);
    fn set_velocity(&mut self, text: &str);
    fn set_dilation(&mut self, text: &str);
}

/// One frame of telemetry derived from camera motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySnapshot {
    /// Units from the camera to the horizon surface, never negative.
    pub distance: f64,
    /// Units per second between the previous and current positions.
    pub velocity: f64,
    /// Cosmetic time-dilation factor in `[0.1, 1]`.
    pub dilation: f64,
}

impl TelemetrySnapshot {
    /// `delta_ms <= 0` reports zero velocity rather than dividing by zero.
    pub fn compute(position: DVec3, previous: DVec3, delta_ms: f64, radius: f64) -> Self {
        let center_distance = position.length();
        let distance = (center_distance - radius).max(0.0);

        let velocity = if delta_ms > 0.0 {
            position.distance(previous) / (delta_ms / 1000.0)
        } else {
            0.0
        };

        // A NaN ratio (r == 20 at |P| == 20) passes through the clamp.
        let dilation =
            ((center_distance - radius) / (DILATION_FAR - radius)).clamp(DILATION_MIN, DILATION_MAX);

        Self {
            distance,
            velocity,
            dilation,
        }
    }

    pub fn distance_text(&self) -> String {
        format!("{} units", to_fixed(self.distance, 2))
    }

    /// Rounded half away from zero before printing.
    pub fn velocity_text(&self) -> String {
        format!("{:.0} m/s", self.velocity.round())
    }

    pub fn dilation_text(&self) -> String {
        format!("{}x", to_fixed(self.dilation, 3))
    }

    pub fn publish(&self, sink: &mut dyn TelemetrySink) {
        sink.set_distance(&self.distance_text());
        sink.set_velocity(&self.velocity_text());
        sink.set_dilation(&self.dilation_text());
    }
}

/// Fraction digits that hold the exact decimal expansion of any finite f64.
const EXACT_FRACTION_DIGITS: usize = 1074;

/// Fixed-point text with `digits` fraction digits. An exact tie rounds away
/// from zero, and non-finite values print as `NaN`, `Infinity` or `-Infinity`.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        return text.to_string();
    }

    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, value.abs());
    let point = exact.find('.').unwrap_or(exact.len());
    let cut = (point + 1 + digits).min(exact.len());
    let round_up = exact.as_bytes().get(cut).is_some_and(|&d| d >= b'5');

    let mut kept: Vec<u8> = exact.as_bytes()[..cut].to_vec();
    if digits == 0 {
        kept.truncate(point);
    }
    if round_up {
        let mut carry = true;
        for d in kept.iter_mut().rev() {
            match *d {
                b'.' => continue,
                b'9' => *d = b'0',
                _ => {
                    *d += 1;
                    carry = false;
                    break;
                }
            }
        }
        if carry {
            kept.insert(0, b'1');
        }
    }

    let mut text = String::with_capacity(kept.len() + 1);
    if value < 0.0 {
        text.push('-');
    }
    text.extend(kept.into_iter().map(char::from));
    text
}

type Line = Box<dyn FnMut(&str)>;

/// Sink made of three independent lines, any of which may be absent.
#[derive(Default)]
pub struct TelemetryLines {
    distance: Option<Line>,
    velocity: Option<Line>,
    dilation: Option<Line>,
}

impl TelemetryLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distance(mut self, line: impl FnMut(&str) + 'static) -> Self {
        self.distance = Some(Box::new(line));
        self
    }

    pub fn velocity(mut self, line: impl FnMut(&str) + 'static) -> Self {
        self.velocity = Some(Box::new(line));
        self
    }

    pub fn dilation(mut self, line: impl FnMut(&str) + 'static) -> Self {
        self.dilation = Some(Box::new(line));
        self
    }
}

impl TelemetrySink for TelemetryLines {
    fn set_distance(&mut self, text: &str) {
        if let Some(line) = &mut self.distance {
            line(text);
        }
    }

    fn set_velocity(&mut self, text: &str) {
        if let Some(line) = &mut self.velocity {
            line(text);
        }
    }

    fn set_dilation(&mut self, text: &str) {
        if let Some(line) = &mut self.dilation {
            line(text);
        }
    }
}

/// Keeps the last text written to each line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryText {
    pub distance: String,
    pub velocity: String,
    pub dilation: String,
}

impl TelemetrySink for TelemetryText {
    fn set_distance(&mut self, text: &str) {
        self.distance = text.to_string();
    }

    fn set_velocity(&mut self, text: &str) {
        self.velocity = text.to_string();
    }

    fn set_dilation(&mut self, text: &str) {
        self.dilation = text.to_string();
    }
}

/// Shares a sink with its creator, e.g. a HUD that reads what the experience
/// wrote.
impl<S: TelemetrySink + ?Sized> TelemetrySink for std::rc::Rc<std::cell::RefCell<S>> {
    fn set_distance(&mut self, text: &str) {
        self.borrow_mut().set_distance(text);
    }

    fn set_velocity(&mut self, text: &str) {
        self.borrow_mut().set_velocity(text);
    }

    fn set_dilation(&mut self, text: &str) {
        self.borrow_mut().set_dilation(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn at(distance: f64) -> DVec3 {
        DVec3::new(0.0, 0.0, distance)
    }

    #[test]
    fn far_from_horizon() {
        let t = TelemetrySnapshot::compute(at(50.0), at(50.0), 16.0, 5.0);
        assert_eq!(t.distance_text(), "45.00 units");
        assert_eq!(t.dilation_text(), "1.000x");
        assert_eq!(t.velocity_text(), "0 m/s");
    }

    #[test]
    fn just_outside_horizon() {
        let t = TelemetrySnapshot::compute(at(6.0), at(6.0), 16.0, 5.0);
        assert_eq!(t.distance_text(), "1.00 units");
        assert_eq!(t.dilation_text(), "0.100x");
    }

    #[test]
    fn distance_never_negative() {
        let t = TelemetrySnapshot::compute(at(2.0), at(2.0), 16.0, 5.0);
        assert_eq!(t.distance, 0.0);
        assert_eq!(t.dilation, DILATION_MIN);
    }

    #[test]
    fn distance_is_offset_by_radius() {
        for d in [5.0, 7.5, 19.0, 300.0] {
            let t = TelemetrySnapshot::compute(DVec3::new(d, 0.0, 0.0), DVec3::ZERO, 16.0, 5.0);
            assert!((t.distance - (d - 5.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn dilation_is_monotonic_and_bounded() {
        let mut last = 0.0;
        for i in 0..400 {
            let d = i as f64 * 0.1;
            let t = TelemetrySnapshot::compute(at(d), at(d), 16.0, 5.0);
            assert!((DILATION_MIN..=DILATION_MAX).contains(&t.dilation));
            assert!(t.dilation >= last);
            last = t.dilation;
        }
    }

    #[test]
    fn dilation_midpoint() {
        // (12.5 - 5) / (20 - 5) = 0.5
        let t = TelemetrySnapshot::compute(at(12.5), at(12.5), 16.0, 5.0);
        assert_eq!(t.dilation_text(), "0.500x");
    }

    #[test]
    fn velocity_is_per_second() {
        let t = TelemetrySnapshot::compute(at(10.0), at(11.0), 100.0, 5.0);
        assert!((t.velocity - 10.0).abs() < 1e-9);
        assert_eq!(t.velocity_text(), "10 m/s");
    }

    #[test]
    fn velocity_rounds_half_up() {
        let t = TelemetrySnapshot::compute(at(0.0), at(2.5), 1000.0, 0.0);
        assert_eq!(t.velocity_text(), "3 m/s");
    }

    #[test]
    fn stationary_camera_has_zero_velocity() {
        for dt in [1.0, 16.0, 1000.0] {
            let t = TelemetrySnapshot::compute(at(30.0), at(30.0), dt, 5.0);
            assert_eq!(t.velocity, 0.0);
        }
    }

    #[test]
    fn zero_delta_has_zero_velocity() {
        let t = TelemetrySnapshot::compute(at(30.0), at(10.0), 0.0, 5.0);
        assert_eq!(t.velocity, 0.0);
        let t = TelemetrySnapshot::compute(at(30.0), at(10.0), -4.0, 5.0);
        assert_eq!(t.velocity, 0.0);
    }

    #[test]
    fn to_fixed_rounds_ties_up() {
        let cases = [
            (0.125, 2, "0.13"),
            (0.3125, 3, "0.313"),
            (2.5, 0, "3"),
            (0.5, 0, "1"),
            (9.995, 2, "9.99"),
            (9.996, 2, "10.00"),
            (0.0005, 3, "0.001"),
            (1.0, 3, "1.000"),
            (0.0, 2, "0.00"),
            (-0.0, 2, "0.00"),
            (-1.125, 2, "-1.13"),
            (123.456, 1, "123.5"),
        ];
        for (value, digits, expected) in cases {
            assert_eq!(to_fixed(value, digits), expected, "{value} to {digits}");
        }
    }

    #[test]
    fn to_fixed_non_finite() {
        assert_eq!(to_fixed(f64::NAN, 2), "NaN");
        assert_eq!(to_fixed(f64::INFINITY, 3), "Infinity");
        assert_eq!(to_fixed(f64::NEG_INFINITY, 3), "-Infinity");
    }

    #[test]
    fn distance_text_at_ties() {
        let cases = [
            (5.125, 5.0, "0.13 units"),
            (5.375, 5.0, "0.38 units"),
            (10.625, 4.0, "6.63 units"),
            (7.005, 7.0, "0.00 units"),
        ];
        for (z, r, expected) in cases {
            let t = TelemetrySnapshot::compute(at(z), at(z), 16.0, r);
            assert_eq!(t.distance_text(), expected, "|P|={z} r={r}");
        }
    }

    #[test]
    fn dilation_text_at_ties() {
        // (9 - 4) / 16 = 0.3125, (13 - 4) / 16 = 0.5625, (11 - 4) / 16 = 0.4375
        let cases = [(9.0, 4.0, "0.313x"), (13.0, 4.0, "0.563x"), (11.0, 4.0, "0.438x")];
        for (z, r, expected) in cases {
            let t = TelemetrySnapshot::compute(at(z), at(z), 16.0, r);
            assert_eq!(t.dilation_text(), expected, "|P|={z} r={r}");
        }
    }

    #[test]
    fn velocity_text_at_ties() {
        // One second per frame, so velocity equals the distance moved.
        let cases = [
            (0.5, "1 m/s"),
            (1.5, "2 m/s"),
            (2.5, "3 m/s"),
            (10.5, "11 m/s"),
            (0.49, "0 m/s"),
        ];
        for (moved, expected) in cases {
            let t = TelemetrySnapshot::compute(at(0.0), at(moved), 1000.0, 0.0);
            assert_eq!(t.velocity_text(), expected, "moved {moved}");
        }
    }

    #[test]
    fn publish_writes_all_lines() {
        let mut text = TelemetryText::default();
        TelemetrySnapshot::compute(at(50.0), at(50.0), 16.0, 5.0).publish(&mut text);
        assert_eq!(text.distance, "45.00 units");
        assert_eq!(text.velocity, "0 m/s");
        assert_eq!(text.dilation, "1.000x");
    }

    #[test]
    fn missing_lines_are_skipped() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let mut lines = TelemetryLines::new().velocity(move |t| log.borrow_mut().push(t.to_string()));
        TelemetrySnapshot::compute(at(50.0), at(49.0), 1000.0, 5.0).publish(&mut lines);
        assert_eq!(*seen.borrow(), vec!["1 m/s".to_string()]);
    }

    #[test]
    fn shared_sink_is_visible_to_owner() {
        let text = Rc::new(RefCell::new(TelemetryText::default()));
        let mut sink = text.clone();
        sink.set_dilation("0.250x");
        assert_eq!(text.borrow().dilation, "0.250x");
    }
}
