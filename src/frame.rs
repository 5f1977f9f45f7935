use cgmath::{InnerSpace, Vector3};

use crate::space_curve::{wrap_unit, ArcLengthCurve, ParametricCurve};

const DEGENERATE_EPSILON: f32 = 1e-8;

/// Camera-style reference frame riding the curve. `right = tangent x up`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub position: Vector3<f32>,
    pub tangent: Vector3<f32>,
    pub up: Vector3<f32>,
    pub right: Vector3<f32>,
}

impl Default for Frame {
    fn default() -> Self {
        Frame {
            position: Vector3::new(0.0, 0.0, 0.0),
            tangent: -Vector3::unit_z(),
            up: Vector3::unit_y(),
            right: Vector3::unit_x(),
        }
    }
}

/// Orthonormal basis of a right-handed look-at transform; the camera looks
/// down its local -Z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LookBasis {
    pub x: Vector3<f32>,
    pub y: Vector3<f32>,
    pub z: Vector3<f32>,
}

/// World axis least aligned with `v`.
fn least_aligned_axis(v: Vector3<f32>) -> Vector3<f32> {
    let (ax, ay, az) = (v.x.abs(), v.y.abs(), v.z.abs());
    if ax <= ay && ax <= az {
        Vector3::unit_x()
    } else if ay <= az {
        Vector3::unit_y()
    } else {
        Vector3::unit_z()
    }
}

/// Builds the look-at basis for an eye at `eye` facing `target`, with `up` as
/// the roll reference. Never returns a non-finite axis: a zero view direction
/// falls back to +Z and an up parallel to the view direction is replaced by
/// the world axis least aligned with it.
pub fn look_basis(eye: Vector3<f32>, target: Vector3<f32>, up: Vector3<f32>) -> LookBasis {
    let mut z = eye - target;
    if z.magnitude2() <= DEGENERATE_EPSILON {
        z = Vector3::unit_z();
    }
    let z = z.normalize();

    let mut x = up.cross(z);
    if x.magnitude2() <= DEGENERATE_EPSILON {
        x = least_aligned_axis(z).cross(z);
    }
    let x = x.normalize();
    let y = z.cross(x);
    LookBasis { x, y, z }
}

/// Frame at arc-length parameter `t`, rolled to stay as close as possible to
/// `previous_up` (the up axis of the previous frame).
pub fn next_frame<C: ParametricCurve>(
    curve: &ArcLengthCurve<C>,
    t: f32,
    look_ahead: f32,
    previous_up: Vector3<f32>,
) -> Frame {
    let position = curve.point_at(t);
    let look_at = curve.point_at(wrap_unit(t + look_ahead));
    let up = if previous_up.magnitude2() > DEGENERATE_EPSILON {
        previous_up.normalize()
    } else {
        Vector3::unit_y()
    };
    let basis = look_basis(position, look_at, up);
    Frame {
        position,
        tangent: -basis.z,
        up: basis.y,
        right: basis.x,
    }
}
