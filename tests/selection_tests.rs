use mockall::mock;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use std::f64::consts::PI;

use human_approach::geometry::{Pose, Route};
use human_approach::selection::{
    DestinationSelector, PlanError, RoutePlanner, SelectionError,
};
use human_approach::transform::{Transform, TransformError, TransformProvider};

mock! {
    Transforms {}
    impl TransformProvider for Transforms {
        fn lookup(&self, frame: &str, reference: &str) -> Result<Transform, TransformError>;
    }
}

mock! {
    Planner {}
    impl RoutePlanner for Planner {
        fn plan(&self, start: &Pose, goal: &Pose, tolerance: f64) -> Result<Route, PlanError>;
    }
}

const HUMAN: &str = "human";
const BASE: &str = "base_link";

fn translation(x: f64, y: f64, z: f64) -> Transform {
    Transform {
        translation: Vector3::new(x, y, z),
        rotation: UnitQuaternion::identity(),
    }
}

fn unavailable(frame: &str) -> TransformError {
    TransformError::Unavailable {
        frame: frame.to_string(),
        reference: "map".to_string(),
    }
}

fn route_through(points: &[(f64, f64)]) -> Route {
    Route::new(
        points
            .iter()
            .map(|&(x, y)| Pose::from_position(Point3::new(x, y, 0.0)))
            .collect(),
    )
}

/// Transform source resolving both the human and the robot base at fixed
/// positions.
fn transforms_with_human_at(x: f64, y: f64) -> MockTransforms {
    let mut transforms = MockTransforms::new();
    transforms
        .expect_lookup()
        .returning(move |frame, _reference| match frame {
            HUMAN => Ok(translation(x, y, 0.0)),
            BASE => Ok(translation(0.0, 0.0, 0.0)),
            other => Err(unavailable(other)),
        });
    transforms
}

fn near(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn picks_the_candidate_with_the_shortest_route() {
    let transforms = transforms_with_human_at(0.0, 0.0);
    // Candidates at radius 1: (1,0), (0,1), (-1,0), (0,-1). Two are
    // unreachable, the route to (-1,0) is shorter than the one to (0,1).
    let mut planner = MockPlanner::new();
    planner.expect_plan().returning(|_start, goal, _tolerance| {
        let p = &goal.position;
        if near(p.x, 0.0) && near(p.y, 1.0) {
            Ok(route_through(&[(0.0, 6.0), (0.0, 1.0)]))
        } else if near(p.x, -1.0) && near(p.y, 0.0) {
            Ok(route_through(&[(-4.0, 0.0), (-1.0, 0.0)]))
        } else {
            Err(PlanError::Unreachable("blocked".to_string()))
        }
    });

    let selector = DestinationSelector::new(&transforms, &planner, BASE);
    let destination = selector.select(HUMAN, 1.0, 4).unwrap();
    assert!(near(destination.position.x, -1.0));
    assert!(near(destination.position.y, 0.0));
}

#[test]
fn ties_go_to_the_first_generated_candidate() {
    let transforms = transforms_with_human_at(0.0, 0.0);
    // Candidates at indices 1 and 3 both have routes of length 2.
    let mut planner = MockPlanner::new();
    planner.expect_plan().returning(|_start, goal, _tolerance| {
        let p = &goal.position;
        if near(p.x, 0.0) && near(p.y, 1.0) {
            Ok(route_through(&[(0.0, 3.0), (0.0, 1.0)]))
        } else if near(p.x, 0.0) && near(p.y, -1.0) {
            Ok(route_through(&[(0.0, -3.0), (0.0, -1.0)]))
        } else {
            Err(PlanError::Unreachable("blocked".to_string()))
        }
    });

    let selector = DestinationSelector::new(&transforms, &planner, BASE);
    let destination = selector.select(HUMAN, 1.0, 4).unwrap();
    assert!(near(destination.position.y, 1.0));
}

#[test]
fn fails_when_no_candidate_is_reachable() {
    let transforms = transforms_with_human_at(0.0, 0.0);
    let mut planner = MockPlanner::new();
    planner
        .expect_plan()
        .times(4)
        .returning(|_, _, _| Err(PlanError::Unreachable("blocked".to_string())));

    let selector = DestinationSelector::new(&transforms, &planner, BASE);
    assert_eq!(
        selector.select(HUMAN, 1.0, 4),
        Err(SelectionError::NoReachableDestination)
    );
}

#[test]
fn fails_fast_when_the_human_cannot_be_resolved() {
    let mut transforms = MockTransforms::new();
    transforms
        .expect_lookup()
        .returning(|frame, _| Err(unavailable(frame)));
    let mut planner = MockPlanner::new();
    planner.expect_plan().times(0);

    let selector = DestinationSelector::new(&transforms, &planner, BASE);
    assert_eq!(
        selector.select(HUMAN, 1.0, 4),
        Err(SelectionError::HumanPoseUnavailable)
    );
}

#[test]
fn unresolvable_robot_pose_scores_candidates_as_unreachable() {
    // The human resolves but the robot base does not; every candidate
    // scores infinite instead of aborting the lookup loop early.
    let mut transforms = MockTransforms::new();
    transforms
        .expect_lookup()
        .returning(|frame, _reference| match frame {
            HUMAN => Ok(translation(0.0, 0.0, 0.0)),
            other => Err(unavailable(other)),
        });
    let mut planner = MockPlanner::new();
    planner.expect_plan().times(0);

    let selector = DestinationSelector::new(&transforms, &planner, BASE);
    assert_eq!(
        selector.select(HUMAN, 1.0, 4),
        Err(SelectionError::NoReachableDestination)
    );
}

#[test]
fn returns_the_route_endpoint_rather_than_the_ring_point() {
    let transforms = transforms_with_human_at(5.0, 0.0);
    // The planner stops short of the requested goal, within tolerance.
    let mut planner = MockPlanner::new();
    planner.expect_plan().returning(|_start, _goal, _tolerance| {
        Ok(route_through(&[(0.0, 0.0), (6.7, 0.2)]))
    });

    let selector = DestinationSelector::new(&transforms, &planner, BASE);
    let destination = selector.select(HUMAN, 2.0, 1).unwrap();
    assert!(near(destination.position.x, 6.7));
    assert!(near(destination.position.y, 0.2));
}

#[test]
fn candidate_goals_face_the_human() {
    let transforms = transforms_with_human_at(5.0, 0.0);
    // Single candidate at angle 0: position (7, 0), so facing the human
    // means a 180 degree yaw.
    let mut planner = MockPlanner::new();
    planner.expect_plan().returning(|_start, goal, _tolerance| {
        assert!(near(goal.position.x, 7.0));
        assert!(near(goal.position.y, 0.0));
        let expected = UnitQuaternion::from_euler_angles(0.0, 0.0, PI);
        assert!(goal.orientation.angle_to(&expected) < 1e-9);
        Ok(route_through(&[(0.0, 0.0), (7.0, 0.0)]))
    });

    let selector = DestinationSelector::new(&transforms, &planner, BASE);
    selector.select(HUMAN, 2.0, 1).unwrap();
}
