use crate::car::classify::WheelSet;
use crate::render::{Easing, Tween, TweenState};
use crate::scene::{NodeId, SceneGraph};

pub const FRONT_WHEEL_YAW: f32 = 0.5;
pub const REAR_WHEEL_YAW: f32 = 0.1;
pub const STEER_TWEEN_SECONDS: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SteerDirection {
    #[default]
    None,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteerCommand {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteerPlan {
    pub direction: SteerDirection,
    pub front_yaw: f32,
    pub rear_yaw: f32,
}

/// Repeating the active direction straightens the wheels.
pub fn plan_steer(current: SteerDirection, command: SteerCommand) -> SteerPlan {
    let straight = SteerPlan {
        direction: SteerDirection::None,
        front_yaw: 0.0,
        rear_yaw: 0.0,
    };
    match (current, command) {
        (_, SteerCommand::Center)
        | (SteerDirection::Left, SteerCommand::Left)
        | (SteerDirection::Right, SteerCommand::Right) => straight,
        (_, SteerCommand::Left) => SteerPlan {
            direction: SteerDirection::Left,
            front_yaw: -FRONT_WHEEL_YAW,
            rear_yaw: -REAR_WHEEL_YAW,
        },
        (_, SteerCommand::Right) => SteerPlan {
            direction: SteerDirection::Right,
            front_yaw: FRONT_WHEEL_YAW,
            rear_yaw: REAR_WHEEL_YAW,
        },
    }
}

/// Yaw tweens for the four wheels.
#[derive(Debug, Clone, Default)]
pub struct SteeringAnimation {
    tracks: Vec<(NodeId, Tween<f32>)>,
}

impl SteeringAnimation {
    pub fn start(graph: &SceneGraph, wheels: &WheelSet, plan: &SteerPlan) -> Self {
        let front = wheels.front().into_iter().map(|id| (id, plan.front_yaw));
        let rear = wheels.rear().into_iter().map(|id| (id, plan.rear_yaw));
        let tracks = front
            .chain(rear)
            .map(|(id, yaw)| {
                let from = graph.node(id).transform.rotation.y;
                (id, Tween::new(from, yaw, STEER_TWEEN_SECONDS, Easing::Power1Out))
            })
            .collect();
        Self { tracks }
    }

    pub fn is_finished(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn advance(&mut self, graph: &mut SceneGraph, dt: f32) {
        self.tracks.retain_mut(|(id, tween)| {
            let (yaw, active) = match tween.advance(dt) {
                TweenState::Active(yaw) => (yaw, true),
                TweenState::Done(yaw) => (yaw, false),
            };
            graph.node_mut(*id).transform.rotation.y = yaw;
            active
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{plan_steer, SteerCommand, SteerDirection, SteeringAnimation};
    use crate::car::classify::CarParts;
    use crate::car::fixtures::car_graph;

    #[test]
    fn test_same_direction_twice_straightens() {
        let first = plan_steer(SteerDirection::None, SteerCommand::Left);
        assert_eq!(first.direction, SteerDirection::Left);
        assert_eq!((first.front_yaw, first.rear_yaw), (-0.5, -0.1));
        let second = plan_steer(first.direction, SteerCommand::Left);
        assert_eq!(second.direction, SteerDirection::None);
        assert_eq!((second.front_yaw, second.rear_yaw), (0.0, 0.0));
    }

    #[test]
    fn test_switching_sides_goes_straight_to_new_side() {
        let plan = plan_steer(SteerDirection::Left, SteerCommand::Right);
        assert_eq!(plan.direction, SteerDirection::Right);
        assert!((plan.front_yaw / plan.rear_yaw - 5.0).abs() < 1e-5);
        let center = plan_steer(SteerDirection::Right, SteerCommand::Center);
        assert_eq!(center.direction, SteerDirection::None);
    }

    #[test]
    fn test_animation_lands_on_planned_yaw() {
        let (mut graph, _) = car_graph();
        let wheels = CarParts::classify(&graph).wheels().unwrap();
        let plan = plan_steer(SteerDirection::None, SteerCommand::Right);
        let mut animation = SteeringAnimation::start(&graph, &wheels, &plan);
        animation.advance(&mut graph, 0.2);
        let midway = graph.node(wheels.front_left).transform.rotation.y;
        assert!(midway > 0.0 && midway < 0.5);
        animation.advance(&mut graph, 0.4);
        assert!(animation.is_finished());
        assert_eq!(graph.node(wheels.front_right).transform.rotation.y, 0.5);
        assert_eq!(graph.node(wheels.rear_left).transform.rotation.y, 0.1);
    }
}
