//! Clients for the consumed navigation, planning and head services.

use std::future::Future;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::FutureExt;
use log::info;
use nalgebra::Point3;

use super::convert;
use crate::geometry::{Pose, Route};
use crate::head::{HeadActuator, HeadError};
use crate::selection::{PlanError, RoutePlanner};
use crate::server::{NavigationClient, NavigationError};
use crate::transform::MAP_FRAME;

const RESULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Poll a stored completion future without blocking. Returns true when no
/// motion is pending. The future is completed by the node's spin thread.
fn poll_done(pending: &mut Option<BoxFuture<'static, ()>>) -> bool {
    let Some(future) = pending.as_mut() else {
        return true;
    };
    let waker = futures::task::noop_waker();
    let mut cx = std::task::Context::from_waker(&waker);
    if future.as_mut().poll(&mut cx).is_ready() {
        *pending = None;
        true
    } else {
        false
    }
}

/// Route planner backed by the `nav_msgs/GetPlan` service.
pub struct GetPlanPlanner {
    client: r2r::Client<r2r::nav_msgs::srv::GetPlan::Service>,
}

impl GetPlanPlanner {
    /// Create a client for the given plan service.
    pub fn new(node: &mut r2r::Node, service: &str) -> Result<Self, r2r::Error> {
        let client = node.create_client::<r2r::nav_msgs::srv::GetPlan::Service>(service)?;
        info!("Plan service client ready for {}", service);
        Ok(GetPlanPlanner { client })
    }
}

impl RoutePlanner for GetPlanPlanner {
    fn plan(&self, start: &Pose, goal: &Pose, tolerance: f64) -> Result<Route, PlanError> {
        let request = r2r::nav_msgs::srv::GetPlan::Request {
            start: convert::pose_to_stamped(start, MAP_FRAME),
            goal: convert::pose_to_stamped(goal, MAP_FRAME),
            tolerance: tolerance as f32,
        };
        let pending = self
            .client
            .request(&request)
            .map_err(|e| PlanError::Unreachable(e.to_string()))?;
        let response =
            futures::executor::block_on(pending).map_err(|e| PlanError::Unreachable(e.to_string()))?;
        let route = convert::route_from_path(&response.plan);
        if route.poses.is_empty() {
            return Err(PlanError::Unreachable("planner returned an empty path".to_string()));
        }
        Ok(route)
    }
}

/// Navigation client backed by the `NavigateToPose` action.
pub struct Nav2Client {
    client: r2r::ActionClient<r2r::nav2_msgs::action::NavigateToPose::Action>,
    pending: Option<BoxFuture<'static, ()>>,
}

impl Nav2Client {
    /// Create a client for the given navigation action.
    pub fn new(node: &mut r2r::Node, action: &str) -> Result<Self, r2r::Error> {
        let client =
            node.create_action_client::<r2r::nav2_msgs::action::NavigateToPose::Action>(action)?;
        info!("Navigation action client ready for {}", action);
        Ok(Nav2Client {
            client,
            pending: None,
        })
    }
}

impl NavigationClient for Nav2Client {
    fn send_goal(&mut self, goal: &Pose) -> Result<(), NavigationError> {
        let goal_msg = r2r::nav2_msgs::action::NavigateToPose::Goal {
            pose: convert::pose_to_stamped(goal, MAP_FRAME),
            behavior_tree: String::new(),
        };
        let accepted = self
            .client
            .send_goal_request(goal_msg)
            .map_err(|e| NavigationError::GoalRejected(e.to_string()))?;
        let (_goal_handle, result, _feedback) = futures::executor::block_on(accepted)
            .map_err(|e| NavigationError::GoalRejected(e.to_string()))?;
        // Completion is all the orchestrator needs; status detail is not
        // surfaced upward.
        self.pending = Some(
            async move {
                let _ = result.await;
            }
            .boxed(),
        );
        Ok(())
    }

    fn wait_for_result(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if poll_done(&mut self.pending) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(RESULT_POLL_INTERVAL);
        }
    }
}

/// Head actuator backed by the `PointHead` action.
pub struct PointHeadClient {
    client: r2r::ActionClient<r2r::control_msgs::action::PointHead::Action>,
    robot_base_frame: String,
    pointing_frame: String,
    max_velocity: f64,
    pending: Option<BoxFuture<'static, ()>>,
}

impl PointHeadClient {
    /// Create a client for the given head pointing action.
    pub fn new(
        node: &mut r2r::Node,
        action: &str,
        robot_base_frame: &str,
        pointing_frame: &str,
        max_velocity: f64,
    ) -> Result<Self, r2r::Error> {
        let client =
            node.create_action_client::<r2r::control_msgs::action::PointHead::Action>(action)?;
        info!("Head action client ready for {}", action);
        Ok(PointHeadClient {
            client,
            robot_base_frame: robot_base_frame.to_string(),
            pointing_frame: pointing_frame.to_string(),
            max_velocity,
            pending: None,
        })
    }
}

impl HeadActuator for PointHeadClient {
    fn point_at(&mut self, point: &Point3<f64>) -> Result<(), HeadError> {
        let goal_msg = r2r::control_msgs::action::PointHead::Goal {
            target: r2r::geometry_msgs::msg::PointStamped {
                header: r2r::std_msgs::msg::Header {
                    frame_id: self.robot_base_frame.clone(),
                    ..Default::default()
                },
                point: convert::point_to_msg(point),
            },
            pointing_axis: r2r::geometry_msgs::msg::Vector3 {
                x: 1.0,
                y: 0.0,
                z: 0.0,
            },
            pointing_frame: self.pointing_frame.clone(),
            min_duration: r2r::builtin_interfaces::msg::Duration::default(),
            max_velocity: self.max_velocity,
        };
        let accepted = self
            .client
            .send_goal_request(goal_msg)
            .map_err(|e| HeadError::Actuator(e.to_string()))?;
        let (_goal_handle, result, _feedback) = futures::executor::block_on(accepted)
            .map_err(|e| HeadError::Actuator(e.to_string()))?;
        self.pending = Some(
            async move {
                let _ = result.await;
            }
            .boxed(),
        );
        Ok(())
    }

    fn is_idle(&mut self) -> bool {
        poll_done(&mut self.pending)
    }
}
