use bytemuck::{Pod, Zeroable};
use cgmath::{InnerSpace, Quaternion, Rad, Rotation, Rotation3, Vector3};
use std::f32::consts::{PI, TAU};

use crate::space_curve::{ArcLengthCurve, ParametricCurve};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

/// Tangent, normal and binormal sampled at one ring of the tube.
struct RingFrame {
    tangent: Vector3<f32>,
    normal: Vector3<f32>,
    binormal: Vector3<f32>,
}

/// Parallel-transport frames at `segments + 1` evenly spaced arc-length
/// samples. For closed curves the accumulated twist is spread over the rings
/// so the last ring lines up with the first.
fn transport_frames<C: ParametricCurve>(
    curve: &ArcLengthCurve<C>,
    segments: usize,
    closed: bool,
) -> Vec<RingFrame> {
    let tangents: Vec<Vector3<f32>> = (0..=segments)
        .map(|i| curve.tangent_at(i as f32 / segments as f32))
        .collect();

    let first = tangents[0];
    let (ax, ay, az) = (first.x.abs(), first.y.abs(), first.z.abs());
    let seed = if ax <= ay && ax <= az {
        Vector3::unit_x()
    } else if ay <= az {
        Vector3::unit_y()
    } else {
        Vector3::unit_z()
    };
    let side = first.cross(seed).normalize();
    let mut normal = first.cross(side);

    let mut frames = Vec::with_capacity(segments + 1);
    frames.push(RingFrame {
        tangent: first,
        normal,
        binormal: first.cross(normal),
    });

    for pair in tangents.windows(2) {
        let (previous, tangent) = (pair[0], pair[1]);
        let axis = previous.cross(tangent);
        if axis.magnitude2() > f32::EPSILON * f32::EPSILON {
            let theta = previous.dot(tangent).clamp(-1.0, 1.0).acos();
            normal = Quaternion::from_axis_angle(axis.normalize(), Rad(theta)).rotate_vector(normal);
        }
        frames.push(RingFrame {
            tangent,
            normal,
            binormal: tangent.cross(normal),
        });
    }

    if closed {
        let first_normal = frames[0].normal;
        let last_normal = frames[segments].normal;
        let mut theta = first_normal.dot(last_normal).clamp(-1.0, 1.0).acos() / segments as f32;
        if frames[0].tangent.dot(first_normal.cross(last_normal)) > 0.0 {
            theta = -theta;
        }
        for (i, frame) in frames.iter_mut().enumerate().skip(1) {
            let twist = Quaternion::from_axis_angle(frame.tangent, Rad(theta * i as f32));
            frame.normal = twist.rotate_vector(frame.normal);
            frame.binormal = frame.tangent.cross(frame.normal);
        }
    }

    frames
}

/// Tube of constant `radius` swept along the curve. Closed tubes repeat the
/// first ring at the end so texture seams stay separate.
pub fn build_tube<C: ParametricCurve>(
    curve: &ArcLengthCurve<C>,
    tubular_segments: usize,
    radius: f32,
    radial_segments: usize,
    closed: bool,
) -> Mesh {
    let tubular_segments = tubular_segments.max(1);
    let radial_segments = radial_segments.max(3);
    let frames = transport_frames(curve, tubular_segments, closed);

    let mut mesh = Mesh {
        vertices: Vec::with_capacity((tubular_segments + 1) * (radial_segments + 1)),
        indices: Vec::with_capacity(tubular_segments * radial_segments * 6),
    };

    for ring in 0..=tubular_segments {
        let source = if closed && ring == tubular_segments { 0 } else { ring };
        let frame = &frames[source];
        let center = curve.point_at(source as f32 / tubular_segments as f32);
        for j in 0..=radial_segments {
            let v = j as f32 / radial_segments as f32 * TAU;
            let (sin, cos) = v.sin_cos();
            let normal = (frame.normal * -cos + frame.binormal * sin).normalize();
            let position = center + normal * radius;
            mesh.vertices.push(MeshVertex {
                position: position.into(),
                normal: normal.into(),
            });
        }
    }

    let stride = (radial_segments + 1) as u32;
    for j in 1..=tubular_segments as u32 {
        for i in 1..=radial_segments as u32 {
            let a = stride * (j - 1) + (i - 1);
            let b = stride * j + (i - 1);
            let c = stride * j + i;
            let d = stride * (j - 1) + i;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    mesh
}

/// UV sphere centered on the origin.
pub fn build_sphere(radius: f32, width_segments: usize, height_segments: usize) -> Mesh {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let mut mesh = Mesh::default();

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let (sin_theta, cos_theta) = (v * PI).sin_cos();
            let (sin_phi, cos_phi) = (u * TAU).sin_cos();
            let direction = Vector3::new(-cos_phi * sin_theta, cos_theta, sin_phi * sin_theta);
            mesh.vertices.push(MeshVertex {
                position: (direction * radius).into(),
                normal: direction.into(),
            });
        }
    }

    let stride = (width_segments + 1) as u32;
    for iy in 0..height_segments as u32 {
        for ix in 0..width_segments as u32 {
            let a = iy * stride + ix + 1;
            let b = iy * stride + ix;
            let c = (iy + 1) * stride + ix;
            let d = (iy + 1) * stride + ix + 1;
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments as u32 - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    mesh
}
