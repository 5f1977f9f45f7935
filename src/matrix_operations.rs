use cgmath::{perspective, Deg, EuclideanSpace, Matrix4, Point3};

use crate::scene::CameraPose;

pub const CAMERA_FOV_DEGREES: f32 = 45.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 100.0;

/// cgmath produces OpenGL clip space (z in -1..1); wgpu expects z in 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub fn view_matrix(pose: &CameraPose) -> Matrix4<f32> {
    Matrix4::look_at_rh(
        Point3::from_vec(pose.position),
        Point3::from_vec(pose.target),
        pose.up,
    )
}

pub fn projection_matrix(aspect: f32) -> Matrix4<f32> {
    let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
    OPENGL_TO_WGPU_MATRIX * perspective(Deg(CAMERA_FOV_DEGREES), aspect, CAMERA_NEAR, CAMERA_FAR)
}

pub fn view_projection(pose: &CameraPose, aspect: f32) -> Matrix4<f32> {
    projection_matrix(aspect) * view_matrix(pose)
}

pub fn flatten_matrix_for_wgpu(matrix: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3, Vector4};

    fn pose() -> CameraPose {
        CameraPose {
            position: Vector3::new(1.0, 2.0, 3.0),
            target: Vector3::new(1.0, 2.0, 2.0),
            up: Vector3::unit_y(),
        }
    }

    #[test]
    fn view_moves_the_camera_to_the_origin_looking_down_negative_z() {
        let view = view_matrix(&pose());
        let eye = view * Vector4::new(1.0, 2.0, 3.0, 1.0);
        assert!(eye.truncate().magnitude() < 1e-6);
        let ahead = view * Vector4::new(1.0, 2.0, 1.0, 1.0);
        assert!((ahead.truncate() - Vector3::new(0.0, 0.0, -2.0)).magnitude() < 1e-5);
    }

    #[test]
    fn projection_maps_near_and_far_planes_to_wgpu_depth() {
        let projection = projection_matrix(16.0 / 9.0);
        let near = projection * Vector4::new(0.0, 0.0, -CAMERA_NEAR, 1.0);
        let far = projection * Vector4::new(0.0, 0.0, -CAMERA_FAR, 1.0);
        assert!((near.z / near.w).abs() < 1e-4);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn degenerate_aspect_falls_back_to_square() {
        assert_eq!(projection_matrix(0.0), projection_matrix(1.0));
        assert_eq!(projection_matrix(f32::NAN), projection_matrix(1.0));
    }
}
