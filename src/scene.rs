//! Camera constants and per-frame transform math for the model viewer.
//!
//! Everything in here is pure math so the frame matrices can be checked
//! against their closed forms without a live GL context.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat3, Mat4, Vec3};

/// Camera eye position.
pub const CAM_POSITION: Vec3 = Vec3::new(0.0, 1.0, 1.2);
/// Point the camera looks at.
pub const CAM_LOOK_AT: Vec3 = Vec3::new(0.0, 0.5, 0.0);
/// Camera up direction.
pub const CAM_UP: Vec3 = Vec3::Y;

/// Vertical field of view in radians (60 degrees).
pub const FOV_Y: f32 = 60.0 * (std::f32::consts::PI / 180.0);
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 10.0;

/// Model spin rate about +Y in radians per second (-90 degrees per second).
pub const SPIN_RATE: f32 = -FRAC_PI_2;

/// View matrix for the fixed camera. Computed once at startup.
pub fn view_matrix() -> Mat4 {
    Mat4::look_at_rh(CAM_POSITION, CAM_LOOK_AT, CAM_UP)
}

/// Perspective projection for the given framebuffer size. Recomputed on
/// every window resize.
pub fn projection_matrix(width: u32, height: u32) -> Mat4 {
    let aspect = width as f32 / height.max(1) as f32;
    Mat4::perspective_rh_gl(FOV_Y, aspect, Z_NEAR, Z_FAR)
}

/// World transform of the model after `elapsed_secs` seconds of spinning.
pub fn world_matrix(elapsed_secs: f32) -> Mat4 {
    Mat4::from_rotation_y(elapsed_secs * SPIN_RATE)
}

/// Inverse-transpose of the world matrix's upper-left 3x3 block, for
/// transforming lighting normals.
pub fn normal_matrix(world: &Mat4) -> Mat3 {
    Mat3::from_mat4(*world).inverse().transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-5;

    fn assert_mat4_near(actual: Mat4, expected: Mat4) {
        for (a, e) in actual
            .to_cols_array()
            .iter()
            .zip(expected.to_cols_array().iter())
        {
            assert!(
                (a - e).abs() < TOLERANCE,
                "matrix mismatch:\n{actual:?}\n{expected:?}"
            );
        }
    }

    fn assert_mat3_near(actual: Mat3, expected: Mat3) {
        for (a, e) in actual
            .to_cols_array()
            .iter()
            .zip(expected.to_cols_array().iter())
        {
            assert!(
                (a - e).abs() < TOLERANCE,
                "matrix mismatch:\n{actual:?}\n{expected:?}"
            );
        }
    }

    // Column-major rotation about +Y by `angle` radians.
    fn rotation_y(angle: f32) -> Mat4 {
        let (sin, cos) = angle.sin_cos();
        Mat4::from_cols_array(&[
            cos, 0.0, -sin, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            sin, 0.0, cos, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    #[test]
    fn world_matrix_is_y_rotation_at_quarter_turn_per_second() {
        for t in [0.0f32, 1.0, 2.0, 90.0] {
            assert_mat4_near(world_matrix(t), rotation_y(t * -FRAC_PI_2));
        }
    }

    #[test]
    fn world_matrix_at_one_second_points_quarter_turn_clockwise() {
        // At t = 1 the rotation is exactly -90 degrees: +X maps to +Z.
        let rotated = world_matrix(1.0).transform_point3(Vec3::X);
        assert!((rotated - Vec3::Z).length() < TOLERANCE);
    }

    #[test]
    fn normal_matrix_of_a_rotation_is_the_rotation_itself() {
        for t in [0.0f32, 1.0, 2.0, 90.0] {
            let world = world_matrix(t);
            assert_mat3_near(normal_matrix(&world), Mat3::from_mat4(world));
        }
    }

    #[test]
    fn normal_matrix_inverts_non_uniform_scale() {
        let world = Mat4::from_scale(Vec3::new(2.0, 1.0, 4.0));
        let expected = Mat3::from_diagonal(Vec3::new(0.5, 1.0, 0.25));
        assert_mat3_near(normal_matrix(&world), expected);
    }

    #[test]
    fn projection_matches_perspective_closed_form() {
        for (width, height) in [(1024u32, 768u32), (1, 1), (1920, 1080)] {
            let aspect = width as f32 / height as f32;
            let f = 1.0 / (FOV_Y / 2.0).tan();
            let expected = Mat4::from_cols_array(&[
                f / aspect,
                0.0,
                0.0,
                0.0, //
                0.0,
                f,
                0.0,
                0.0, //
                0.0,
                0.0,
                (Z_FAR + Z_NEAR) / (Z_NEAR - Z_FAR),
                -1.0, //
                0.0,
                0.0,
                2.0 * Z_FAR * Z_NEAR / (Z_NEAR - Z_FAR),
                0.0,
            ]);
            assert_mat4_near(projection_matrix(width, height), expected);
        }
    }

    #[test]
    fn view_matrix_places_the_camera_at_the_eye() {
        // The eye maps to the view-space origin.
        let origin = view_matrix().transform_point3(CAM_POSITION);
        assert!(origin.length() < TOLERANCE);
    }
}
