use glam::{Quat, Vec2, Vec3};

const MIN_DIRECTION_LENGTH_SQ: f32 = 1e-8;

/// Rotates a 2-D control vector counter-clockwise by `degrees`.
pub fn rotate_input(input: Vec2, degrees: f32) -> Vec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vec2 {
        x: cos * input.x - sin * input.y,
        y: sin * input.x + cos * input.y,
    }
}

/// Maps a planar vector onto the world X/Z plane.
pub fn planar(value: Vec2) -> Vec3 {
    Vec3::new(value.x, 0.0, value.y)
}

/// Yaw-only rotation whose forward (+Z) axis points along `direction` projected onto X/Z.
pub fn flat_look_rotation(direction: Vec3) -> Option<Quat> {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    if flat.length_squared() <= MIN_DIRECTION_LENGTH_SQ {
        return None;
    }
    Some(Quat::from_rotation_y(flat.x.atan2(flat.z)))
}

/// Spherical interpolation with the blend factor clamped to `[0, 1]`.
pub fn slerp_clamped(current: Quat, target: Quat, t: f32) -> Quat {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    current.slerp(target, t).normalize()
}

pub fn forward(rotation: Quat) -> Vec3 {
    rotation * Vec3::Z
}

pub fn world_to_local_direction(rotation: Quat, direction: Vec3) -> Vec3 {
    rotation.inverse() * direction
}
