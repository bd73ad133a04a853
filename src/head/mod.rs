//! Head pointing control.
//!
//! Thin wrapper over the external head actuator: point the head at a 3D
//! point, reset it to a known forward pose and wait for motion to finish.
//! The idle wait is bounded; a stuck actuator surfaces as a timeout error
//! instead of stalling the request forever.

use log::info;
use nalgebra::Point3;
use std::time::{Duration, Instant};

/// Head actuation errors.
#[derive(Debug, Clone)]
pub enum HeadError {
    /// The actuator rejected or failed a pointing command.
    Actuator(String),
    /// The head did not become idle within the configured timeout.
    Timeout,
}

impl std::fmt::Display for HeadError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            HeadError::Actuator(reason) => write!(f, "head actuator error: {}", reason),
            HeadError::Timeout => write!(f, "head did not become idle in time"),
        }
    }
}

impl std::error::Error for HeadError {}

/// External head/gaze actuator: points the head at a 3D point expressed in
/// the robot's base frame and reports whether a motion is still running.
pub trait HeadActuator {
    /// Start pointing the head at `point`.
    fn point_at(&mut self, point: &Point3<f64>) -> Result<(), HeadError>;

    /// Whether the actuator has finished its current motion.
    fn is_idle(&mut self) -> bool;
}

/// Controller sequencing head motions for the approach behavior.
pub struct HeadController<A: HeadActuator> {
    actuator: A,
    idle_timeout: Duration,
    poll_interval: Duration,
}

impl<A: HeadActuator> HeadController<A> {
    /// Wrap an actuator with the given idle-wait bounds.
    pub fn new(actuator: A, idle_timeout: Duration, poll_interval: Duration) -> Self {
        HeadController {
            actuator,
            idle_timeout,
            poll_interval,
        }
    }

    /// Point the head at a point in the robot's base frame.
    pub fn point_at(&mut self, point: &Point3<f64>) -> Result<(), HeadError> {
        info!(
            "Pointing head at {{x: {:.3}, y: {:.3}, z: {:.3}}}",
            point.x, point.y, point.z
        );
        self.actuator.point_at(point)
    }

    /// Reset the head to its default orientation (a fixed point ahead of
    /// the robot).
    pub fn reset(&mut self) -> Result<(), HeadError> {
        info!("Resetting head.");
        self.point_at(&Point3::new(1.0, 0.0, 1.0))
    }

    /// Wait until the current head motion completes, polling the actuator
    /// at the configured interval. Fails with [`HeadError::Timeout`] if the
    /// head is still moving when the timeout elapses.
    pub fn wait_until_idle(&mut self) -> Result<(), HeadError> {
        let deadline = Instant::now() + self.idle_timeout;
        while !self.actuator.is_idle() {
            if Instant::now() >= deadline {
                return Err(HeadError::Timeout);
            }
            std::thread::sleep(self.poll_interval);
        }
        Ok(())
    }
}
