//! Local ship state owned by the flight session

use glam::{EulerRot, Quat, Vec3};

/// Ship state, mutated once per tick by the local simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipState {
    /// World position
    pub position: Vec3,
    /// Euler angles in radians, XYZ order (x = pitch, y = yaw, z = roll)
    pub rotation: Vec3,
    /// Velocity in world units per tick
    pub velocity: Vec3,
    /// Engine power (0.0 - 1.0)
    pub engine_power: f32,
    /// Resting on the ground
    pub landed: bool,
}

impl ShipState {
    /// Ship parked on the launch pad at the origin
    pub fn at_launch_pad(landing_altitude: f32) -> Self {
        Self {
            position: Vec3::new(0.0, landing_altitude, 0.0),
            rotation: Vec3::ZERO,
            velocity: Vec3::ZERO,
            engine_power: 0.0,
            landed: true,
        }
    }

    /// Respawn on the launch pad (after a crash or a manual reset)
    pub fn reset_to_launch_pad(&mut self, landing_altitude: f32) {
        *self = Self::at_launch_pad(landing_altitude);
    }

    pub fn quaternion(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    /// Local forward (-Z) in world space
    pub fn forward(&self) -> Vec3 {
        self.quaternion() * Vec3::NEG_Z
    }

    /// Local up (+Y) in world space
    pub fn up(&self) -> Vec3 {
        self.quaternion() * Vec3::Y
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn pitch(&self) -> f32 {
        self.rotation.x
    }

    pub fn roll(&self) -> f32 {
        self.rotation.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_pad_defaults() {
        let ship = ShipState::at_launch_pad(2.0);
        assert_eq!(ship.position, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(ship.rotation, Vec3::ZERO);
        assert_eq!(ship.velocity, Vec3::ZERO);
        assert_eq!(ship.engine_power, 0.0);
        assert!(ship.landed);
    }

    #[test]
    fn level_ship_points_down_negative_z() {
        let ship = ShipState::at_launch_pad(2.0);
        assert!((ship.forward() - Vec3::NEG_Z).length() < 1e-6);
        assert!((ship.up() - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn positive_pitch_raises_the_nose() {
        let mut ship = ShipState::at_launch_pad(2.0);
        ship.rotation.x = 0.5;
        assert!(ship.forward().y > 0.0);
    }
}
