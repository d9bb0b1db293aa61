//! Polled control state and how it steers the ship

use std::f32::consts::FRAC_PI_3;

use super::audio::Cue;
use super::ship::ShipState;

/// Rotation per tick in normal mode (radians)
pub const ROTATION_STEP: f32 = 0.03;
/// Rotation per tick while precision mode (brake) is held
pub const PRECISION_ROTATION_STEP: f32 = 0.01;
/// Pointer delta to roll/pitch conversion
pub const POINTER_RATE: f32 = 0.02;
/// Pitch and roll are limited to ±60°
pub const ATTITUDE_LIMIT: f32 = FRAC_PI_3;
/// Engine power while boosting in precision mode
pub const PRECISION_POWER: f32 = 0.5;

/// Input snapshot polled once per tick (keyboard, joystick, pointer)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlState {
    /// Nose down
    pub forward: bool,
    /// Nose up
    pub back: bool,
    /// Yaw left
    pub left: bool,
    /// Yaw right
    pub right: bool,
    /// Engine thrust
    pub boost: bool,
    /// Precision mode: slower rotation, half thrust
    pub brake: bool,
    /// Return to the launch pad
    pub reset: bool,
    /// Fire a missile this tick
    pub fire: bool,
    /// Pointer / right joystick delta since last poll
    pub pointer_dx: f32,
    pub pointer_dy: f32,
}

/// Apply attitude inputs
pub fn steer(ship: &mut ShipState, controls: &ControlState) {
    let step = if controls.brake {
        PRECISION_ROTATION_STEP
    } else {
        ROTATION_STEP
    };

    if controls.right {
        ship.rotation.y -= step;
    }
    if controls.left {
        ship.rotation.y += step;
    }
    if controls.forward {
        ship.rotation.x = (ship.rotation.x - step).max(-ATTITUDE_LIMIT);
    }
    if controls.back {
        ship.rotation.x = (ship.rotation.x + step).min(ATTITUDE_LIMIT);
    }

    if controls.pointer_dx != 0.0 {
        ship.rotation.z = (ship.rotation.z + controls.pointer_dx * POINTER_RATE)
            .clamp(-ATTITUDE_LIMIT, ATTITUDE_LIMIT);
    }
    if controls.pointer_dy != 0.0 {
        ship.rotation.x = (ship.rotation.x + controls.pointer_dy * POINTER_RATE)
            .clamp(-ATTITUDE_LIMIT, ATTITUDE_LIMIT);
    }
}

/// Apply engine inputs; `previous` is last tick's control state for edge detection
pub fn throttle(
    ship: &mut ShipState,
    controls: &ControlState,
    previous: &ControlState,
    cues: &mut Vec<Cue>,
) {
    if controls.brake && !previous.brake {
        cues.push(Cue::PrecisionMode);
    }

    if controls.boost {
        if ship.landed {
            // Takeoff; the cue only sounds when boost is first pressed
            ship.engine_power = 1.0;
            ship.landed = false;
            if !previous.boost {
                cues.push(Cue::EngineBoostOn);
            }
        } else {
            ship.engine_power = if controls.brake { PRECISION_POWER } else { 1.0 };
        }
    } else {
        if previous.boost {
            cues.push(Cue::EngineBoostOff);
        }
        ship.engine_power = 0.0;
    }
}
