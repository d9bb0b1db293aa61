//! Flight physics: force model and Euler integrator

use glam::Vec3;

use super::ship::ShipState;

/// Environment and airframe constants
#[derive(Debug, Clone, Copy)]
pub struct FlightConstants {
    /// Thrust acceleration at full engine power
    pub thrust_power: f32,
    /// Hard speed cap (units per tick)
    pub max_speed: f32,
    /// Multiplicative damping applied after force integration
    pub drag_damping: f32,
    /// Lift coefficient
    pub lift_coefficient: f32,
    /// Vertical gravity acceleration (negative = down)
    pub gravity: f32,
    /// Air density, also used as the linear drag factor
    pub air_density: f32,
    /// Wing area
    pub wing_area: f32,
    /// Maximum speed for a soft touchdown
    pub landing_speed_threshold: f32,
    /// Maximum |pitch| and |roll| for a soft touchdown (radians)
    pub landing_angle_threshold: f32,
    /// Height above terrain treated as "on the ground"
    pub clearance: f32,
}

impl Default for FlightConstants {
    fn default() -> Self {
        Self {
            thrust_power: 0.5,
            max_speed: 100.0,
            drag_damping: 0.995,
            lift_coefficient: 0.02,
            gravity: -0.1,
            air_density: 0.001,
            wing_area: 10.0,
            landing_speed_threshold: 2.0,
            landing_angle_threshold: 0.1,
            clearance: 2.0,
        }
    }
}

impl FlightConstants {
    /// Launch pad altitude. The terrain is flat zero at the origin,
    /// so the pad sits exactly one clearance above it.
    pub fn landing_altitude(&self) -> f32 {
        self.clearance
    }
}

/// Per-tick force breakdown, not retained between ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forces {
    pub thrust: Vec3,
    pub lift: Vec3,
    pub drag: Vec3,
    pub gravity: Vec3,
}

impl Forces {
    pub fn total(&self) -> Vec3 {
        self.thrust + self.lift + self.drag + self.gravity
    }
}

/// Physics system for the local ship
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Compute the instantaneous forces acting on the ship
    pub fn forces(ship: &ShipState, constants: &FlightConstants) -> Forces {
        let speed = ship.speed();

        // sin(2·bank) peaks at 45° and vanishes when level or knife-edge
        let bank = ship.roll().abs();
        let lift_magnitude = 0.5
            * constants.air_density
            * speed
            * speed
            * constants.wing_area
            * constants.lift_coefficient
            * (bank * 2.0).sin();
        let lift = ship.up() * lift_magnitude;

        // Linear drag approximation: scales with speed, not speed²
        let drag = ship.velocity * (-constants.air_density * speed);

        let gravity = Vec3::new(0.0, constants.gravity, 0.0);

        let thrust = ship.forward() * (ship.engine_power * constants.thrust_power);

        Forces {
            thrust,
            lift,
            drag,
            gravity,
        }
    }

    /// Total acceleration for this tick (no clamping)
    pub fn acceleration(ship: &ShipState, constants: &FlightConstants) -> Vec3 {
        Self::forces(ship, constants).total()
    }

    /// Advance velocity and position by one tick
    pub fn integrate(ship: &mut ShipState, acceleration: Vec3, constants: &FlightConstants) {
        ship.velocity += acceleration;

        ship.velocity *= constants.drag_damping;

        // Hard clamp to max speed
        let speed = ship.velocity.length();
        if speed > constants.max_speed {
            let scale = constants.max_speed / speed;
            ship.velocity *= scale;
        }

        // A landed, idle ship must not drift
        if !ship.landed || ship.engine_power > 0.0 {
            ship.position += ship.velocity;
        }
    }

    /// Force accumulation followed by integration
    pub fn step(ship: &mut ShipState, constants: &FlightConstants) {
        let acceleration = Self::acceleration(ship, constants);
        Self::integrate(ship, acceleration, constants);
    }
}
