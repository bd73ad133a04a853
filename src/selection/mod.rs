//! Destination selection around a detected human.
//!
//! Generates candidate standing positions on a ring around the human,
//! requests a route to each from the external planner and keeps the one
//! that is reachable with the shortest route. This is a read-only scoring
//! process over externally supplied plans; its only side effect is logging.

use log::{error, info, warn};
use std::time::Instant;

use crate::geometry::{self, Pose, Route};
use crate::transform::{self, TransformProvider};

/// Positional x/y tolerance passed to the planner for every candidate.
pub const PLAN_TOLERANCE: f64 = 0.5;

/// Default number of candidate standing positions. A higher number can
/// give a better result but takes longer to score.
pub const DEFAULT_CANDIDATE_COUNT: usize = 16;

/// Route planning errors. Unreachability is per-candidate and never aborts
/// the selection as a whole.
#[derive(Debug, Clone)]
pub enum PlanError {
    /// The planner produced no route to the goal pose.
    Unreachable(String),
}

impl std::fmt::Display for PlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PlanError::Unreachable(reason) => write!(f, "goal unreachable: {}", reason),
        }
    }
}

impl std::error::Error for PlanError {}

/// External route planning service.
pub trait RoutePlanner {
    /// Request a best-effort route from `start` to `goal` with the given
    /// positional tolerance.
    fn plan(&self, start: &Pose, goal: &Pose, tolerance: f64) -> Result<Route, PlanError>;
}

/// One generated standing position together with its planned route and the
/// route's length (infinite when no route exists).
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Generated pose on the ring, oriented to face the human
    pub pose: Pose,
    /// Planned route to the pose, if one exists
    pub route: Option<Route>,
    /// Length of the planned route, or +inf
    pub route_length: f64,
}

/// Destination selection errors, fatal to the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// The human's pose could not be resolved in the map frame.
    HumanPoseUnavailable,
    /// No candidate standing position is reachable.
    NoReachableDestination,
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SelectionError::HumanPoseUnavailable => {
                write!(f, "cannot determine the human's pose")
            }
            SelectionError::NoReachableDestination => {
                write!(f, "no reachable destination around the human")
            }
        }
    }
}

impl std::error::Error for SelectionError {}

/// Scores candidate standing positions around the human and picks the one
/// with the shortest planned route. Holds no state across calls.
pub struct DestinationSelector<'a, T: TransformProvider, P: RoutePlanner> {
    transforms: &'a T,
    planner: &'a P,
    robot_base_frame: &'a str,
}

impl<'a, T: TransformProvider, P: RoutePlanner> DestinationSelector<'a, T, P> {
    /// Create a selector over the given transform source and planner.
    pub fn new(transforms: &'a T, planner: &'a P, robot_base_frame: &'a str) -> Self {
        DestinationSelector {
            transforms,
            planner,
            robot_base_frame,
        }
    }

    /// Choose the robot's destination: the candidate standing position at
    /// `distance` from the human that is reachable with the shortest route.
    ///
    /// Returns the final pose of the winning route rather than the
    /// generated ring point, since the planner may terminate the route at a
    /// nearby, tolerance-adjusted pose.
    pub fn select(
        &self,
        human_frame: &str,
        distance: f64,
        candidate_count: usize,
    ) -> Result<Pose, SelectionError> {
        let human_pose = transform::resolve_in_map(self.transforms, human_frame).map_err(|e| {
            error!("Can't determine human pose, aborting: {}", e);
            SelectionError::HumanPoseUnavailable
        })?;

        let started = Instant::now();
        info!("Choosing a destination {:.3} m from the human.", distance);

        let candidates: Vec<Candidate> =
            geometry::ring_points(&human_pose.position, distance, candidate_count)
                .into_iter()
                .map(|point| {
                    let pose =
                        Pose::new(point, geometry::facing_orientation(&point, &human_pose.position));
                    let route = self.plan_route(&pose);
                    let route_length = geometry::route_length(route.as_ref());
                    Candidate {
                        pose,
                        route,
                        route_length,
                    }
                })
                .collect();

        // Abort if a route can't be planned to any candidate.
        if candidates.iter().all(|c| !c.route_length.is_finite()) {
            info!("Could not find a plan to any of the possible points around the human.");
            return Err(SelectionError::NoReachableDestination);
        }

        // Shortest route wins; ties go to the first generated candidate.
        let best = candidates
            .iter()
            .min_by(|a, b| a.route_length.total_cmp(&b.route_length))
            .ok_or(SelectionError::NoReachableDestination)?;

        let destination = best
            .route
            .as_ref()
            .and_then(Route::end)
            .cloned()
            .ok_or(SelectionError::NoReachableDestination)?;

        info!(
            "Chosen goal {} with route length of {:.2} meters.",
            destination, best.route_length
        );
        info!(
            "Choosing destination took {:.3} seconds.",
            started.elapsed().as_secs_f64()
        );

        Ok(destination)
    }

    /// Plan a route from the robot's current pose to the candidate pose.
    /// Any failure (unresolvable start pose, planner error) yields `None`
    /// so the candidate scores infinite instead of aborting the selection.
    fn plan_route(&self, goal: &Pose) -> Option<Route> {
        let start = match transform::resolve_in_map(self.transforms, self.robot_base_frame) {
            Ok(pose) => pose,
            Err(e) => {
                warn!("Can't determine start pose: {}", e);
                return None;
            }
        };
        match self.planner.plan(&start, goal, PLAN_TOLERANCE) {
            Ok(route) => Some(route),
            Err(e) => {
                warn!("No route to candidate {}: {}", goal, e);
                None
            }
        }
    }
}
