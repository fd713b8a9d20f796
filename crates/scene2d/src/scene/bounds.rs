//! Bounding volumes for visibility culling

use crate::foundation::math::Vec3;

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Flat box in the XY plane at z = 0
    pub fn from_center_size_2d(center_x: f32, center_y: f32, width: f32, height: f32) -> Self {
        Self::new(
            Vec3::new(center_x - width * 0.5, center_y - height * 0.5, 0.0),
            Vec3::new(center_x + width * 0.5, center_y + height * 0.5, 0.0),
        )
    }

    /// Grow the box by `margin` in X and Y
    pub fn inflate_xy(&self, margin: f32) -> Self {
        let offset = Vec3::new(margin, margin, 0.0);
        Self::new(self.min - offset, self.max + offset)
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }
}

/// Visible region of a 2D camera in world space
///
/// X/Y bounds are world coordinates. `near`/`far` are the camera's clip
/// distances and are compared directly against world Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Smallest visible X
    pub left: f32,
    /// Largest visible X
    pub right: f32,
    /// Smallest visible Y
    pub bottom: f32,
    /// Largest visible Y
    pub top: f32,
    /// Near clip value
    pub near: f32,
    /// Far clip value
    pub far: f32,
}

impl Frustum {
    /// Box of the given half-extents centered on `center`
    pub fn around(center: Vec3, half_width: f32, half_height: f32, near: f32, far: f32) -> Self {
        Self {
            left: center.x - half_width,
            right: center.x + half_width,
            bottom: center.y - half_height,
            top: center.y + half_height,
            near,
            far,
        }
    }

    /// Bounds of the box after rotating it about `pivot` by `radians`
    ///
    /// This is the axis-aligned hull of the rotated corners, which is larger
    /// than the rotated rectangle itself near its corners.
    pub fn rotated_bounds(&self, pivot: Vec3, radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        let corners = [
            (self.left, self.bottom),
            (self.right, self.bottom),
            (self.right, self.top),
            (self.left, self.top),
        ];

        let mut bounds = Self {
            left: f32::INFINITY,
            right: f32::NEG_INFINITY,
            bottom: f32::INFINITY,
            top: f32::NEG_INFINITY,
            near: self.near,
            far: self.far,
        };

        for (x, y) in corners {
            let dx = x - pivot.x;
            let dy = y - pivot.y;
            let rx = pivot.x + (dx * cos - dy * sin);
            let ry = pivot.y + (dx * sin + dy * cos);

            bounds.left = bounds.left.min(rx);
            bounds.right = bounds.right.max(rx);
            bounds.bottom = bounds.bottom.min(ry);
            bounds.top = bounds.top.max(ry);
        }

        bounds
    }

    /// Width of the X range
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Height of the Y range
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Separating-axis overlap test; Z is only checked on request
    pub fn intersects_aabb(&self, aabb: &Aabb, check_z: bool) -> bool {
        if aabb.max.x < self.left || aabb.min.x > self.right {
            return false;
        }
        if aabb.max.y < self.bottom || aabb.min.y > self.top {
            return false;
        }
        if check_z && (aabb.max.z < self.near || aabb.min.z > self.far) {
            return false;
        }
        true
    }
}
