//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene runtime. All
//! matrices are column-major `nalgebra` matrices; angles handed to the public
//! API are in degrees and converted here.

pub use nalgebra::{Matrix4, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Local transform: position, per-axis rotation in degrees, and scale
///
/// The matrix built from it applies, from the outside in: translation, then
/// rotation about X, Y and Z, then scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position relative to the parent frame
    pub position: Vec3,

    /// Rotation about the X, Y and Z axes, in degrees
    pub rotation: Vec3,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation (degrees)
    pub fn from_position_rotation(position: Vec3, rotation: Vec3) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Convert to a local transformation matrix
    ///
    /// Axes whose angle is exactly zero are skipped; the result is the same
    /// as multiplying by an identity rotation.
    #[allow(clippy::float_cmp)]
    pub fn to_matrix(&self) -> Mat4 {
        let mut matrix = Mat4::new_translation(&self.position);

        if self.rotation.x != 0.0 {
            matrix *= Mat4::rotation_x(utils::deg_to_rad(self.rotation.x));
        }
        if self.rotation.y != 0.0 {
            matrix *= Mat4::rotation_y(utils::deg_to_rad(self.rotation.y));
        }
        if self.rotation.z != 0.0 {
            matrix *= Mat4::rotation_z(utils::deg_to_rad(self.rotation.z));
        }

        matrix * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Mat4, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Extract the translation column of an affine matrix
    pub fn translation_of(matrix: &Mat4) -> Vec3 {
        Vec3::new(matrix.m14, matrix.m24, matrix.m34)
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Create a right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Create an orthographic projection mapping the box into `[-1, 1]³`
    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }

    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let width = right - left;
        let height = top - bottom;
        let depth = far - near;

        Mat4::new(
            2.0 / width, 0.0, 0.0, -(right + left) / width,
            0.0, 2.0 / height, 0.0, -(top + bottom) / height,
            0.0, 0.0, -2.0 / depth, -(far + near) / depth,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_identity_transform_matrix() {
        assert_relative_eq!(Transform::identity().to_matrix(), Mat4::identity(), epsilon = EPSILON);
    }

    #[test]
    fn test_composition_order_translate_rotate_scale() {
        let transform = Transform {
            position: Vec3::new(10.0, -4.0, 2.0),
            rotation: Vec3::new(30.0, 45.0, 60.0),
            scale: Vec3::new(2.0, 3.0, 0.5),
        };

        let expected = Mat4::new_translation(&transform.position)
            * Mat4::rotation_x(utils::deg_to_rad(30.0))
            * Mat4::rotation_y(utils::deg_to_rad(45.0))
            * Mat4::rotation_z(utils::deg_to_rad(60.0))
            * Mat4::new_nonuniform_scaling(&transform.scale);

        assert_relative_eq!(transform.to_matrix(), expected, epsilon = EPSILON);
    }

    #[test]
    fn test_z_rotation_quarter_turn() {
        let transform = Transform::from_position_rotation(Vec3::zeros(), Vec3::new(0.0, 0.0, 90.0));
        let point = transform.to_matrix().transform_point(&nalgebra::Point3::new(1.0, 0.0, 0.0));

        assert_relative_eq!(point.coords, Vec3::new(0.0, 1.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_look_at_down_negative_z_is_translation() {
        let eye = Vec3::new(5.0, -3.0, 0.0);
        let view = Mat4::look_at(eye, eye + Vec3::new(0.0, 0.0, -1.0), Vec3::y());

        assert_relative_eq!(view, Mat4::new_translation(&-eye), epsilon = EPSILON);
    }

    #[test]
    fn test_orthographic_matches_nalgebra() {
        let ours = Mat4::orthographic(-400.0, 400.0, -300.0, 300.0, 0.1, 1000.0);
        let reference = Mat4::new_orthographic(-400.0, 400.0, -300.0, 300.0, 0.1, 1000.0);

        assert_relative_eq!(ours, reference, epsilon = EPSILON);
    }
}
