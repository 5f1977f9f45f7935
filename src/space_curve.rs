use cgmath::{InnerSpace, Vector3};
use std::f32::consts::TAU;

use crate::config::CurveConfig;

const TANGENT_DELTA: f32 = 1e-4;

/// Wraps a curve parameter into [0, 1).
pub fn wrap_unit(t: f32) -> f32 {
    let wrapped = t.rem_euclid(1.0);
    // rem_euclid rounds tiny negative inputs up to exactly 1.0
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// A closed curve evaluated by its raw parameter in [0, 1).
pub trait ParametricCurve {
    fn point(&self, u: f32) -> Vector3<f32>;

    /// Central difference around `u`, wrapped across the seam.
    fn tangent(&self, u: f32) -> Vector3<f32> {
        let before = self.point(wrap_unit(u - TANGENT_DELTA));
        let after = self.point(wrap_unit(u + TANGENT_DELTA));
        let delta = after - before;
        if delta.magnitude2() <= f32::EPSILON * f32::EPSILON {
            return Vector3::unit_z();
        }
        delta.normalize()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TorusKnot {
    pub radius: f32,
    pub p: u32,
    pub q: u32,
}

impl TorusKnot {
    pub fn new(radius: f32, p: u32, q: u32) -> Self {
        TorusKnot { radius, p, q }
    }
}

impl ParametricCurve for TorusKnot {
    fn point(&self, u: f32) -> Vector3<f32> {
        let p = self.p as f32;
        let q = self.q as f32;
        let ct = u * p * TAU;
        let (su, cu) = ct.sin_cos();
        let qu_over_p = q / p * ct;
        let (sq, cq) = qu_over_p.sin_cos();
        Vector3::new(
            self.radius * (2.0 + cq) * 0.5 * cu,
            self.radius * (2.0 + cq) * su * 0.5,
            self.radius * sq * 0.5,
        )
    }
}

/// Arc-length reparameterization of a closed curve: equal steps of `t` cover
/// equal distances along the curve.
pub struct ArcLengthCurve<C> {
    curve: C,
    arc_lengths: Vec<f32>,
}

pub type TunnelCurve = ArcLengthCurve<TorusKnot>;

impl TunnelCurve {
    pub fn from_config(config: &CurveConfig) -> Self {
        ArcLengthCurve::new(
            TorusKnot::new(config.radius, config.p, config.q),
            config.arc_length_divisions,
        )
    }
}

impl<C: ParametricCurve> ArcLengthCurve<C> {
    pub fn new(curve: C, divisions: usize) -> Self {
        let divisions = divisions.max(1);
        let mut arc_lengths = Vec::with_capacity(divisions + 1);
        arc_lengths.push(0.0);
        let mut last = curve.point(0.0);
        let mut sum = 0.0;
        for i in 1..=divisions {
            // The last sample lands on u = 1.0, which closes the loop back at the start.
            let current = curve.point(i as f32 / divisions as f32);
            sum += (current - last).magnitude();
            arc_lengths.push(sum);
            last = current;
        }
        ArcLengthCurve { curve, arc_lengths }
    }

    pub fn curve(&self) -> &C {
        &self.curve
    }

    pub fn arc_lengths(&self) -> &[f32] {
        &self.arc_lengths
    }

    pub fn length(&self) -> f32 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    /// Maps an arc-length fraction `u` to the raw curve parameter. When
    /// `target_length` is given it replaces `u * length()` as the distance to
    /// look up.
    pub fn raw_param_at(&self, u: f32, target_length: Option<f32>) -> f32 {
        let lengths = &self.arc_lengths;
        let last = lengths.len() - 1;
        if last == 0 {
            return 0.0;
        }
        let target = target_length.unwrap_or(u * self.length());

        // Largest index whose cumulative length does not exceed the target.
        let i = lengths.partition_point(|&length| length <= target);
        let i = i.saturating_sub(1).min(last);
        if lengths[i] == target || i == last {
            return i as f32 / last as f32;
        }

        let before = lengths[i];
        let segment = lengths[i + 1] - before;
        let fraction = if segment > 0.0 {
            (target - before) / segment
        } else {
            0.0
        };
        (i as f32 + fraction) / last as f32
    }

    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        let t = wrap_unit(t);
        self.curve.point(wrap_unit(self.raw_param_at(t, None)))
    }

    pub fn tangent_at(&self, t: f32) -> Vector3<f32> {
        let t = wrap_unit(t);
        self.curve.tangent(wrap_unit(self.raw_param_at(t, None)))
    }
}

impl<C: ParametricCurve> ParametricCurve for ArcLengthCurve<C> {
    fn point(&self, u: f32) -> Vector3<f32> {
        self.curve.point(u)
    }

    fn tangent(&self, u: f32) -> Vector3<f32> {
        self.curve.tangent(u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tunnel() -> TunnelCurve {
        TunnelCurve::from_config(&CurveConfig::default())
    }

    fn close(a: Vector3<f32>, b: Vector3<f32>, tolerance: f32) -> bool {
        (a - b).magnitude() <= tolerance
    }

    #[test]
    fn wrap_unit_stays_in_range() {
        assert_eq!(wrap_unit(0.25), 0.25);
        assert_eq!(wrap_unit(1.0), 0.0);
        assert!((wrap_unit(1.75) - 0.75).abs() < 1e-6);
        assert!((wrap_unit(-0.25) - 0.75).abs() < 1e-6);
        let tiny = wrap_unit(-1e-10);
        assert!((0.0..1.0).contains(&tiny));
    }

    #[test]
    fn point_at_is_wrap_invariant() {
        let curve = tunnel();
        for i in 0..50 {
            let t = i as f32 / 50.0;
            let base = curve.point_at(t);
            assert!(close(base, curve.point_at(t + 1.0), 1e-3), "t = {t}");
            assert!(close(base, curve.point_at(t - 1.0), 1e-3), "t = {t}");
            assert!(close(base, curve.point_at(t + 3.0), 1e-3), "t = {t}");
        }
    }

    #[test]
    fn torus_knot_is_closed() {
        let knot = TorusKnot::new(5.0, 7, 9);
        assert!(close(knot.point(0.0), knot.point(1.0), 1e-3));
    }

    #[test]
    fn arc_length_table_is_monotonic() {
        let curve = tunnel();
        let lengths = curve.arc_lengths();
        assert_eq!(lengths.len(), 1001);
        assert_eq!(lengths[0], 0.0);
        for pair in lengths.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        assert!(curve.length() > 0.0);
    }

    #[test]
    fn raw_param_mapping_is_monotonic_and_bounded() {
        let curve = tunnel();
        let mut previous = -1.0;
        for i in 0..1000 {
            let u = i as f32 / 1000.0;
            let raw = curve.raw_param_at(u, None);
            assert!((0.0..=1.0).contains(&raw));
            assert!(raw >= previous, "u = {u}");
            previous = raw;
        }
        assert_eq!(curve.raw_param_at(0.0, None), 0.0);
    }

    #[test]
    fn explicit_target_length_overrides_fraction() {
        let curve = tunnel();
        let half = curve.length() * 0.5;
        let from_fraction = curve.raw_param_at(0.5, None);
        let from_length = curve.raw_param_at(0.9, Some(half));
        assert!((from_fraction - from_length).abs() < 1e-5);
    }

    #[test]
    fn equal_parameter_steps_cover_equal_distances() {
        let curve = tunnel();
        let step = 0.001;
        let mut shortest = f32::MAX;
        let mut longest = 0.0f32;
        for i in 0..200 {
            let t = i as f32 / 200.0;
            let chord = (curve.point_at(t + step) - curve.point_at(t)).magnitude();
            shortest = shortest.min(chord);
            longest = longest.max(chord);
        }
        assert!(longest / shortest < 1.05, "{shortest} .. {longest}");

        // The raw parameterization does bunch up.
        let knot = curve.curve();
        let mut raw_shortest = f32::MAX;
        let mut raw_longest = 0.0f32;
        for i in 0..200 {
            let u = i as f32 / 200.0;
            let chord = (knot.point(u + step) - knot.point(u)).magnitude();
            raw_shortest = raw_shortest.min(chord);
            raw_longest = raw_longest.max(chord);
        }
        assert!(raw_longest / raw_shortest > 1.2);
    }

    #[test]
    fn tangent_is_unit_and_follows_the_curve() {
        let curve = tunnel();
        for i in 0..100 {
            let t = i as f32 / 100.0;
            let tangent = curve.tangent_at(t);
            assert!((tangent.magnitude() - 1.0).abs() < 1e-4);
            let ahead = curve.point_at(t + 1e-4) - curve.point_at(t);
            assert!(ahead.normalize().dot(tangent) > 0.99, "t = {t}");
        }
    }
}
