//! Landing / crash classification

use super::audio::Cue;
use super::physics::FlightConstants;
use super::ship::ShipState;
use super::terrain::HeightField;

/// Flight status after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightStatus {
    /// Above terrain clearance
    Airborne,
    /// Resting on the ground
    Landed,
    /// Hit the ground too hard or at a bad attitude. The ship has already
    /// been respawned on the launch pad when this is reported.
    Crashed,
}

pub struct LandingClassifier;

impl LandingClassifier {
    /// Pure classification, without side effects
    pub fn classify(ship: &ShipState, terrain_height: f32, constants: &FlightConstants) -> FlightStatus {
        if ship.position.y > terrain_height + constants.clearance {
            return FlightStatus::Airborne;
        }

        // Every threshold must pass on its own
        let soft = ship.speed() < constants.landing_speed_threshold
            && ship.pitch().abs() < constants.landing_angle_threshold
            && ship.roll().abs() < constants.landing_angle_threshold;

        if soft {
            FlightStatus::Landed
        } else {
            FlightStatus::Crashed
        }
    }

    /// Classify and apply the outcome to the ship, pushing any cues.
    /// `previous` is the status classified on the last tick; touchdown is
    /// only reported when coming down from `Airborne`.
    pub fn apply<H: HeightField + ?Sized>(
        ship: &mut ShipState,
        terrain: &H,
        constants: &FlightConstants,
        previous: FlightStatus,
        cues: &mut Vec<Cue>,
    ) -> FlightStatus {
        let ground = terrain.height_at(ship.position.x, ship.position.z);
        let status = Self::classify(ship, ground, constants);

        match status {
            FlightStatus::Airborne => {
                ship.landed = false;
            }
            FlightStatus::Landed => {
                ship.position.y = ground + constants.clearance;
                if previous == FlightStatus::Airborne {
                    cues.push(Cue::Touchdown);
                }
                ship.landed = true;
                ship.velocity = glam::Vec3::ZERO;
            }
            FlightStatus::Crashed => {
                cues.push(Cue::Explosion);
                ship.reset_to_launch_pad(constants.landing_altitude());
            }
        }

        status
    }
}
