use glam::{Mat3, Mat4, Quat, Vec3};

/// Orientation that points an object's +Z axis at `target`.
///
/// Matches the convention used for non-camera scene objects: a speaker
/// "looking at" the listener faces it with its front (+Z) side. Returns
/// identity when `eye == target`.
pub fn look_at_rotation(eye: Vec3, target: Vec3, up: Vec3) -> Quat {
    basis_rotation(target - eye, up)
}

/// Orientation that points a camera's -Z axis at `target`.
pub fn camera_look_rotation(eye: Vec3, target: Vec3, up: Vec3) -> Quat {
    basis_rotation(eye - target, up)
}

fn basis_rotation(forward: Vec3, up: Vec3) -> Quat {
    let Some(z) = forward.try_normalize() else {
        return Quat::IDENTITY;
    };

    let mut x = up.cross(z);
    if x.length_squared() < 1e-12 {
        // up and forward are parallel; nudge z so the cross product is defined
        let nudged = if up.z.abs() > 0.9999 {
            Vec3::new(z.x + 1e-4, z.y, z.z)
        } else {
            Vec3::new(z.x, z.y, z.z + 1e-4)
        };
        x = up.cross(nudged.normalize());
    }
    let x = x.normalize();
    let y = z.cross(x);

    Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize()
}

/// Right-handed, GL-depth perspective projection from a vertical field of view in degrees.
pub fn perspective(fov_deg: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh_gl(fov_deg.to_radians(), aspect, near, far)
}

/// Compose a local transform matrix from position, rotation, and scale.
pub fn compose(position: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, rotation, position)
}

/// Convert a packed `0xRRGGBB` color to linear-ish RGB floats in `[0, 1]`.
pub fn hex_to_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}
