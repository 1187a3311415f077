//! Dead-reckoning pose tracker.
//!
//! The gateway never receives measured coordinates from the rover; it
//! estimates them from the commands it has executed. Each successful
//! move advances the pose using commanded speed, elapsed time since the
//! previous move, and wheel geometry.

use super::direction::Direction;
use super::position::Position;
use crate::error::GatewayError;

/// Maximum motor speed in revolutions per minute at full throttle (255).
pub const MAX_RPM: f64 = 200.0;

/// Distance between the left and right wheel pairs in metres.
pub const WHEELBASE_M: f64 = 0.2;

/// Factory wheel radius in metres.
pub const DEFAULT_WHEEL_RADIUS_M: f64 = 0.03;

/// Smallest configurable wheel radius in metres.
pub const MIN_WHEEL_RADIUS_M: f64 = 0.01;

/// Largest configurable wheel radius in metres.
pub const MAX_WHEEL_RADIUS_M: f64 = 0.1;

/// Largest heading change applied by a single turn command, in degrees.
const MAX_TURN_STEP_DEG: f64 = 10.0;

/// Time step assumed when the measured interval is unusable.
const FALLBACK_DT_SECS: f64 = 0.1;

/// Estimated pose of the platform.
///
/// Heading is kept in degrees in `[0, 360)`, with 0° along the X axis,
/// growing clockwise (a `right` turn increases the angle).
#[derive(Debug, Clone)]
pub struct Odometry {
    position: Position,
    angle_deg: f64,
    total_distance: f64,
    wheel_radius_m: f64,
}

/// Immutable copy of the current pose, safe to hand out across await
/// points without holding the odometry lock.
#[derive(Debug, Clone, Copy)]
pub struct PoseSnapshot {
    /// Estimated position.
    pub position: Position,
    /// Heading in degrees `[0, 360)`.
    pub angle_deg: f64,
    /// Cumulative distance travelled in metres, turns included.
    pub total_distance: f64,
}

impl Odometry {
    /// Creates a tracker at the origin with the factory wheel radius.
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Position::ORIGIN,
            angle_deg: 0.0,
            total_distance: 0.0,
            wheel_radius_m: DEFAULT_WHEEL_RADIUS_M,
        }
    }

    /// Returns the current pose.
    #[must_use]
    pub fn snapshot(&self) -> PoseSnapshot {
        PoseSnapshot {
            position: self.position,
            angle_deg: self.angle_deg,
            total_distance: self.total_distance,
        }
    }

    /// Returns the configured wheel radius in metres.
    #[must_use]
    pub fn wheel_radius_m(&self) -> f64 {
        self.wheel_radius_m
    }

    /// Updates the wheel radius used for distance estimation.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] when the radius is
    /// outside `[0.01, 0.1]` metres.
    pub fn set_wheel_radius(&mut self, radius_m: f64) -> Result<(), GatewayError> {
        if !(MIN_WHEEL_RADIUS_M..=MAX_WHEEL_RADIUS_M).contains(&radius_m) {
            return Err(GatewayError::InvalidRequest(format!(
                "wheel radius must be between {MIN_WHEEL_RADIUS_M}m and {MAX_WHEEL_RADIUS_M}m"
            )));
        }
        self.wheel_radius_m = radius_m;
        Ok(())
    }

    /// Advances the pose by one executed command and returns the
    /// distance covered by that command in metres.
    ///
    /// `angle_override` replaces the heading before the move when the
    /// device (or the caller) reported one. `dt_secs` is the interval
    /// since the previous movement; intervals that are non-positive or
    /// longer than one second fall back to [`FALLBACK_DT_SECS`], so a
    /// long pause between commands cannot teleport the platform.
    pub fn advance(
        &mut self,
        direction: Direction,
        speed: u8,
        angle_override: Option<f64>,
        dt_secs: f64,
    ) -> f64 {
        if let Some(angle) = angle_override {
            self.angle_deg = angle;
        }

        let dt = if dt_secs <= 0.0 || dt_secs > 1.0 {
            FALLBACK_DT_SECS
        } else {
            dt_secs
        };

        let speed_fraction = f64::from(speed) / 255.0;
        let rpm = MAX_RPM * speed_fraction;
        let rotations = rpm / 60.0 * dt;
        let circumference = 2.0 * std::f64::consts::PI * self.wheel_radius_m;
        let distance = rotations * circumference;

        match direction {
            Direction::Forward => self.translate(distance),
            Direction::Backward => self.translate(-distance),
            Direction::Left => self.rotate(-turn_step_deg(distance)),
            Direction::Right => self.rotate(turn_step_deg(distance)),
        }

        self.total_distance += distance.abs();

        tracing::debug!(
            %direction,
            speed,
            distance_m = format!("{distance:.4}"),
            total_m = format!("{:.4}", self.total_distance),
            "pose advanced"
        );

        distance
    }

    /// Returns the pose to the origin and zeroes the travelled distance.
    ///
    /// The wheel radius is a physical property and survives a reset.
    pub fn reset(&mut self) {
        self.position = Position::ORIGIN;
        self.angle_deg = 0.0;
        self.total_distance = 0.0;
    }

    fn translate(&mut self, distance: f64) {
        let heading = self.angle_deg.to_radians();
        self.position.x += distance * heading.cos();
        self.position.y += distance * heading.sin();
    }

    fn rotate(&mut self, delta_deg: f64) {
        self.angle_deg = (self.angle_deg + delta_deg).rem_euclid(360.0);
    }
}

impl Default for Odometry {
    fn default() -> Self {
        Self::new()
    }
}

/// Heading change produced by running the wheels `wheel_distance`
/// metres on one side, capped at [`MAX_TURN_STEP_DEG`].
fn turn_step_deg(wheel_distance: f64) -> f64 {
    let radians = wheel_distance / (WHEELBASE_M / 2.0);
    radians.to_degrees().min(MAX_TURN_STEP_DEG)
}
