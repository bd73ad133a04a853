//! The per-request orchestrator for the "move to human" action.
//!
//! Owns the session state (current odometry snapshot, overridable human
//! frame and standing distance) and sequences one request at a time through
//! an explicit state machine: head reset, destination selection, navigation
//! with feedback streaming, head re-orientation and result reporting.

use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::geometry::Pose;
use crate::head::{HeadActuator, HeadController};
use crate::selection::{DestinationSelector, RoutePlanner};
use crate::transform::{self, TransformProvider};
use crate::{ApproachConfig, BehaviorConfig};

/// Interval between navigation-result polls; feedback is published once per
/// tick, giving the client at least 2 Hz updates while navigating.
pub const FEEDBACK_PERIOD: Duration = Duration::from_millis(500);

/// Terminal status of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Status {
    /// The robot reached a standing position near the human.
    Success,
    /// The request could not be completed.
    Failure,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Status::Success => write!(f, "success"),
            Status::Failure => write!(f, "failure"),
        }
    }
}

/// An incoming approach request. Empty or non-positive fields keep the
/// session's current values.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct MoveToHumanRequest {
    /// Override for the human's tf frame; empty keeps the current one
    #[serde(default)]
    pub human_pose_topic: String,
    /// Override for the standing distance; values <= 0 keep the current one
    #[serde(default)]
    pub distance: f64,
}

/// Progress update streamed to the caller while navigation is in progress.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MoveToHumanFeedback {
    /// Latest known robot pose from odometry
    pub robot_pose: Pose,
}

/// Terminal response delivered to the caller.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MoveToHumanResult {
    /// Terminal status
    pub status: Status,
    /// Robot pose snapshot at reporting time (best effort)
    pub robot_pose: Pose,
}

/// Navigation dispatch errors.
#[derive(Debug, Clone)]
pub enum NavigationError {
    /// The navigation stack did not accept the goal.
    GoalRejected(String),
}

impl std::fmt::Display for NavigationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            NavigationError::GoalRejected(reason) => write!(f, "goal rejected: {}", reason),
        }
    }
}

impl std::error::Error for NavigationError {}

/// External navigation stack: accepts a goal pose and reports completion.
/// No partial-failure detail is surfaced beyond "done".
pub trait NavigationClient {
    /// Submit a goal pose in the map frame.
    fn send_goal(&mut self, goal: &Pose) -> Result<(), NavigationError>;

    /// Wait up to `timeout` for the current goal to finish. Returns true
    /// once the navigation stack reports completion.
    fn wait_for_result(&mut self, timeout: Duration) -> bool;
}

/// Sink for feedback messages streamed during navigation.
pub trait FeedbackPublisher {
    /// Publish one feedback message.
    fn publish(&mut self, feedback: MoveToHumanFeedback);
}

/// Last-write-wins snapshot of the robot's odometry pose. The subscriber
/// side overwrites it as messages arrive; the orchestrator only ever reads
/// the latest value.
#[derive(Clone, Default)]
pub struct OdometryTracker {
    latest: Arc<Mutex<Option<Pose>>>,
}

impl OdometryTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        OdometryTracker::default()
    }

    /// Record a new odometry pose.
    pub fn update(&self, pose: Pose) {
        if let Ok(mut latest) = self.latest.lock() {
            *latest = Some(pose);
        }
    }

    /// The most recent odometry pose, if any has arrived yet.
    pub fn latest(&self) -> Option<Pose> {
        self.latest.lock().ok().and_then(|latest| latest.clone())
    }
}

/// Per-session values persisting across requests. Valid per-request
/// overrides replace them and become the defaults for later requests.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Tf frame the human's pose is resolved from
    pub human_pose_topic: String,
    /// Standing distance from the human (meters, > 0)
    pub distance_from_human: f64,
}

impl SessionState {
    fn apply_overrides(&mut self, request: &MoveToHumanRequest) {
        if !request.human_pose_topic.is_empty() {
            self.human_pose_topic = request.human_pose_topic.clone();
        }
        if request.distance > 0.0 {
            self.distance_from_human = request.distance;
        }
    }
}

/// Stages a request moves through. One request is processed at a time, so
/// the phase always describes the single in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    /// Awaiting a request
    Idle,
    /// Resetting the head to a known orientation
    Resetting,
    /// Scoring candidate standing positions
    SelectingDestination,
    /// Driving to the chosen destination
    Navigating,
    /// Pointing the head at the human
    Orienting,
    /// Delivering the terminal result
    Reporting,
}

/// Server handling "move to human" requests.
pub struct MoveToHumanServer<T, P, N, A>
where
    T: TransformProvider,
    P: RoutePlanner,
    N: NavigationClient,
    A: HeadActuator,
{
    transforms: T,
    planner: P,
    navigation: N,
    head: HeadController<A>,
    odometry: OdometryTracker,
    session: SessionState,
    robot_base_frame: String,
    candidate_count: usize,
    navigation_timeout: Duration,
    phase: RequestPhase,
    initialized: bool,
}

impl<T, P, N, A> MoveToHumanServer<T, P, N, A>
where
    T: TransformProvider,
    P: RoutePlanner,
    N: NavigationClient,
    A: HeadActuator,
{
    /// Wire the server to its external collaborators. The server rejects
    /// requests until [`complete_initialization`](Self::complete_initialization)
    /// is called.
    pub fn new(
        transforms: T,
        planner: P,
        navigation: N,
        head: HeadController<A>,
        odometry: OdometryTracker,
        config: &ApproachConfig,
    ) -> Self {
        let BehaviorConfig {
            human_frame,
            robot_base_frame,
            default_distance_from_human,
            candidate_count,
            navigation_timeout_s,
        } = config.behavior.clone();

        MoveToHumanServer {
            transforms,
            planner,
            navigation,
            head,
            odometry,
            session: SessionState {
                human_pose_topic: human_frame,
                distance_from_human: default_distance_from_human,
            },
            robot_base_frame,
            candidate_count,
            navigation_timeout: Duration::from_secs_f64(navigation_timeout_s),
            phase: RequestPhase::Idle,
            initialized: false,
        }
    }

    /// Mark setup as complete; requests arriving before this call are
    /// answered with an immediate failure.
    pub fn complete_initialization(&mut self) {
        self.initialized = true;
        info!("Server initialization complete.");
    }

    /// Current session values (defaults plus any retained overrides).
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Current request phase.
    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    /// Handle to the odometry snapshot this server reads from.
    pub fn odometry(&self) -> &OdometryTracker {
        &self.odometry
    }

    /// Handle one request from start to finish, streaming feedback while
    /// the robot is driving. Always produces a terminal result.
    pub fn execute(
        &mut self,
        request: &MoveToHumanRequest,
        feedback: &mut dyn FeedbackPublisher,
    ) -> MoveToHumanResult {
        info!("New request received.");

        if !self.initialized {
            warn!("Server not ready, ignoring request.");
            return self.report(Status::Failure);
        }

        self.set_phase(RequestPhase::Resetting);
        info!(
            "Received goal: {{human pose topic: '{}', distance: {:.3}}}",
            request.human_pose_topic, request.distance
        );
        self.session.apply_overrides(request);
        info!(
            "Used values: {{human pose topic: '{}', distance: {:.3}}}",
            self.session.human_pose_topic, self.session.distance_from_human
        );

        // Known head state before committing to a new goal.
        if let Err(e) = self.head.reset().and_then(|_| self.head.wait_until_idle()) {
            error!("Head reset failed: {}", e);
            return self.report(Status::Failure);
        }

        self.set_phase(RequestPhase::SelectingDestination);
        let selection = {
            let selector = DestinationSelector::new(
                &self.transforms,
                &self.planner,
                self.robot_base_frame.as_str(),
            );
            selector.select(
                &self.session.human_pose_topic,
                self.session.distance_from_human,
                self.candidate_count,
            )
        };
        let destination = match selection {
            Ok(pose) => pose,
            Err(e) => {
                error!("Failed to plan movement: {}", e);
                return self.report(Status::Failure);
            }
        };

        self.set_phase(RequestPhase::Navigating);
        if let Err(e) = self.navigation.send_goal(&destination) {
            error!("Navigation goal dispatch failed: {}", e);
            return self.report(Status::Failure);
        }
        let deadline = Instant::now() + self.navigation_timeout;
        loop {
            if self.navigation.wait_for_result(FEEDBACK_PERIOD) {
                break;
            }
            if Instant::now() >= deadline {
                error!(
                    "Navigation did not finish within {:.0} seconds, giving up.",
                    self.navigation_timeout.as_secs_f64()
                );
                return self.report(Status::Failure);
            }
            feedback.publish(MoveToHumanFeedback {
                robot_pose: self.current_pose(),
            });
        }

        self.set_phase(RequestPhase::Orienting);
        self.orient_towards_human();

        self.report(Status::Success)
    }

    /// Point the head at the human's position relative to the robot. Any
    /// failure here is logged and swallowed: the robot has already reached
    /// its destination, only the facing correction is skipped.
    fn orient_towards_human(&mut self) {
        info!("Moving head.");
        let resolved = transform::resolve_pose(
            &self.transforms,
            &self.session.human_pose_topic,
            &self.robot_base_frame,
        );
        match resolved {
            Ok(pose) => {
                if let Err(e) = self
                    .head
                    .point_at(&pose.position)
                    .and_then(|_| self.head.wait_until_idle())
                {
                    warn!("Skipping head orientation: {}", e);
                }
            }
            Err(e) => {
                warn!("Can't determine pose, skipping head orientation: {}", e);
            }
        }
    }

    fn current_pose(&self) -> Pose {
        self.odometry.latest().unwrap_or_else(Pose::identity)
    }

    fn report(&mut self, status: Status) -> MoveToHumanResult {
        self.set_phase(RequestPhase::Reporting);
        info!("Action ended with status: '{}'", status);
        let result = MoveToHumanResult {
            status,
            robot_pose: self.current_pose(),
        };
        self.set_phase(RequestPhase::Idle);
        result
    }

    fn set_phase(&mut self, phase: RequestPhase) {
        debug!("Request phase: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}
