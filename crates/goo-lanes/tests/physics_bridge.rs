// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use goo_core::agent::AgentId;
use goo_core::event::{EventBus, EventData, EventKind, EventListener, EventPtr, ListenerHandle};
use goo_core::math::{Aabb, Vec2};
use goo_core::physics::{BodyDef, BodyHandle, BodyType, JointDef, ShapeDef};
use goo_infra::NativeWorld;
use goo_lanes::physics_lane::{PhysicsBridge, PhysicsConfig, PhysicsError, MAX_QUERY_BODIES};
use goo_lanes::physics_lane::PhysicsWorld;

#[derive(Default)]
struct Collected {
    events: Vec<EventPtr>,
}

impl Collected {
    fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }
}

impl EventListener<PhysicsWorld> for Collected {
    fn handle_event(
        &mut self,
        event: &EventPtr,
        _bus: &mut EventBus<PhysicsWorld>,
        _ctx: &mut PhysicsWorld,
    ) -> bool {
        self.events.push(event.clone());
        true
    }
}

fn listen(bus: &mut EventBus<PhysicsWorld>, kinds: &[EventKind]) -> Rc<RefCell<Collected>> {
    let collected = Rc::new(RefCell::new(Collected::default()));
    let handle: ListenerHandle<PhysicsWorld> = collected.clone();
    for kind in kinds {
        bus.add_listener(&handle, *kind).unwrap();
    }
    collected
}

fn bridge(config: PhysicsConfig) -> PhysicsBridge {
    PhysicsBridge::new(Box::new(NativeWorld::default()), config)
}

fn resting_pair(bridge: &mut PhysicsBridge) {
    let world = bridge.world_mut();
    world
        .create_body(
            &BodyDef {
                body_type: BodyType::Static,
                shapes: vec![ShapeDef::cuboid(10.0, 0.5)],
                ..Default::default()
            },
            Some("ground"),
        )
        .unwrap();
    world
        .create_body(
            &BodyDef {
                position: Vec2::new(0.0, 0.99),
                owner: Some(AgentId::new(0, 0)),
                shapes: vec![ShapeDef::circle(0.5)],
                ..Default::default()
            },
            Some("ball"),
        )
        .unwrap();
}

#[test]
fn test_accumulator_gates_steps_and_clamps_backlog() {
    let mut bridge = bridge(PhysicsConfig {
        fixed_timestep: 0.0625,
        max_backlog: 0.25,
        ..Default::default()
    });
    let mut bus = EventBus::new();

    assert_eq!(bridge.update(0.05, &mut bus), 0);
    assert!(!bridge.world().physics_stepped());

    assert_eq!(bridge.update(0.05, &mut bus), 1);
    assert!(bridge.world().physics_stepped());

    // A one second hitch is clamped to the backlog.
    assert_eq!(bridge.update(1.0, &mut bus), 4);
    assert_relative_eq!(bridge.accumulator(), 0.0);

    assert_eq!(bridge.update(0.01, &mut bus), 0);
    assert!(!bridge.world().physics_stepped());
}

#[test]
fn test_persisting_contact_is_published_every_sub_step() {
    let mut bridge = bridge(PhysicsConfig::default());
    let mut bus = EventBus::new();
    let collected = listen(&mut bus, &EventKind::COLLISIONS);
    resting_pair(&mut bridge);

    // First update creates the contact, second one sub-steps three times.
    bridge.update(1.0 / 60.0, &mut bus);
    assert_eq!(collected.borrow().count(EventKind::NewCollision), 1);
    collected.borrow_mut().events.clear();

    assert_eq!(bridge.update(3.0 / 60.0 + 1e-4, &mut bus), 3);
    let collected = collected.borrow();
    assert_eq!(collected.count(EventKind::PersistentCollision), 3);
    assert_eq!(collected.count(EventKind::NewCollision), 0);
    assert_eq!(collected.count(EventKind::CollisionResult), 3);

    let ball = bridge.world().body("ball").unwrap();
    let contact = collected
        .events
        .iter()
        .find_map(|e| e.contact().copied())
        .unwrap();
    let ground = contact.other_body(ball).unwrap();
    assert_eq!(contact.owner_of(ball), Some(AgentId::new(0, 0)));
    assert_eq!(contact.owner_of(ground), None);
}

/// Puts the ball back against the anchor as soon as their contact ends.
struct Rejoin {
    ball: BodyHandle,
    kinds: Vec<EventKind>,
}

impl EventListener<PhysicsWorld> for Rejoin {
    fn handle_event(
        &mut self,
        event: &EventPtr,
        _bus: &mut EventBus<PhysicsWorld>,
        world: &mut PhysicsWorld,
    ) -> bool {
        self.kinds.push(event.kind());
        if event.kind() == EventKind::EndCollision {
            world.set_transform(self.ball, Vec2::new(0.9, 0.0), 0.0);
            world.set_linear_velocity(self.ball, Vec2::ZERO);
        }
        true
    }
}

#[test]
fn test_events_of_a_sub_step_arrive_before_the_next_one() {
    let mut bridge = bridge(PhysicsConfig {
        gravity: Vec2::ZERO,
        ..Default::default()
    });
    let mut bus = EventBus::new();
    let world = bridge.world_mut();
    world
        .create_body(
            &BodyDef {
                body_type: BodyType::Static,
                shapes: vec![ShapeDef::circle(0.5)],
                ..Default::default()
            },
            Some("anchor"),
        )
        .unwrap();
    let ball = world
        .create_body(
            &BodyDef {
                position: Vec2::new(0.9, 0.0),
                shapes: vec![ShapeDef::circle(0.5)],
                ..Default::default()
            },
            Some("ball"),
        )
        .unwrap();

    let rejoin = Rc::new(RefCell::new(Rejoin {
        ball,
        kinds: Vec::new(),
    }));
    let handle: ListenerHandle<PhysicsWorld> = rejoin.clone();
    bus.add_listener(&handle, EventKind::NewCollision).unwrap();
    bus.add_listener(&handle, EventKind::EndCollision).unwrap();

    bridge.update(1.0 / 60.0, &mut bus);
    assert_eq!(rejoin.borrow().kinds, vec![EventKind::NewCollision]);
    rejoin.borrow_mut().kinds.clear();

    // Separated before the first sub-step, put back before the second.
    let world = bridge.world_mut();
    world.set_transform(ball, Vec2::new(5.0, 0.0), 0.0);
    world.set_linear_velocity(ball, Vec2::ZERO);
    assert_eq!(bridge.update(2.0 / 60.0 + 1e-4, &mut bus), 2);
    assert_eq!(
        rejoin.borrow().kinds,
        vec![EventKind::EndCollision, EventKind::NewCollision]
    );
}

#[test]
fn test_out_of_limits_is_published_once_per_agent() {
    let config = PhysicsConfig {
        world_bounds: Some(Aabb::from_min_max(
            Vec2::new(-5.0, -5.0),
            Vec2::new(5.0, 5.0),
        )),
        ..Default::default()
    };
    let mut bridge = bridge(config);
    let mut bus = EventBus::new();
    let collected = listen(&mut bus, &[EventKind::OutOfLimits]);

    let owner = AgentId::new(3, 1);
    for x in [-1.0, 1.0] {
        bridge
            .world_mut()
            .create_body(
                &BodyDef {
                    position: Vec2::new(x, 4.9),
                    linear_velocity: Vec2::new(0.0, 30.0),
                    owner: Some(owner),
                    shapes: vec![ShapeDef::circle(0.1)],
                    ..Default::default()
                },
                None,
            )
            .unwrap();
    }

    bridge.update(1.0 / 60.0, &mut bus);
    let collected = collected.borrow();
    assert_eq!(collected.events.len(), 1);
    assert!(matches!(
        collected.events[0].data(),
        EventData::OutOfLimits { agent: Some(a), .. } if *a == owner
    ));
}

#[test]
fn test_names_are_unique_and_unknown_handles_are_errors() {
    let mut bridge = bridge(PhysicsConfig::default());
    resting_pair(&mut bridge);
    let world = bridge.world_mut();

    let err = world
        .create_body(&BodyDef::default(), Some("ball"))
        .unwrap_err();
    assert_eq!(err, PhysicsError::DuplicateBodyName("ball".into()));

    let ball = world.body("ball").unwrap();
    let ground = world.body("ground").unwrap();
    world
        .create_joint(&JointDef::distance(ground, ball, 1.0), Some("tether"))
        .unwrap();
    assert!(matches!(
        world.create_joint(&JointDef::distance(ground, ball, 1.0), Some("tether")),
        Err(PhysicsError::DuplicateJointName(_))
    ));

    world.destroy_body_by_name("ball").unwrap();
    assert_eq!(world.body("ball"), None);
    assert_eq!(world.joint("tether"), None);
    assert_eq!(world.owner_of(ball), None);
    assert_eq!(
        world.destroy_body(ball),
        Err(PhysicsError::UnknownBody(ball))
    );
    assert_eq!(
        world.destroy_joint_by_name("tether"),
        Err(PhysicsError::UnknownJointName("tether".into()))
    );
}

#[test]
fn test_queries_skip_static_bodies_and_respect_cap() {
    let mut bridge = bridge(PhysicsConfig::default());
    resting_pair(&mut bridge);
    let world = bridge.world_mut();
    for i in 0..(MAX_QUERY_BODIES + 10) {
        world
            .create_body(
                &BodyDef {
                    position: Vec2::new(-4.0 + (i % 10) as f32 * 0.2, 3.0 + (i / 10) as f32 * 0.2),
                    shapes: vec![ShapeDef::circle(0.05)],
                    ..Default::default()
                },
                None,
            )
            .unwrap();
    }

    let everything = Aabb::from_min_max(Vec2::new(-20.0, -20.0), Vec2::new(20.0, 20.0));
    assert_eq!(world.query_aabb(&everything, true).len(), MAX_QUERY_BODIES);

    let ground = world.body("ground").unwrap();
    let ball = world.body("ball").unwrap();
    assert_eq!(world.query_point(Vec2::new(3.0, 0.0), false), Some(ground));
    assert_eq!(world.query_point(Vec2::new(3.0, 0.0), true), None);
    assert_eq!(world.query_point(Vec2::new(0.0, 1.0), true), Some(ball));
}

#[test]
fn test_change_friction_of_body_rewrites_every_shape() {
    let mut bridge = bridge(PhysicsConfig::default());
    resting_pair(&mut bridge);
    let world = bridge.world_mut();
    let ball = world.body("ball").unwrap();
    world.change_friction_of_body(ball, 0.9).unwrap();
    for shape in world.simulator().body_shapes(ball) {
        assert_relative_eq!(world.simulator().shape_friction(shape).unwrap(), 0.9);
    }

    world.destroy_body(ball).unwrap();
    assert!(world.change_friction_of_body(ball, 0.1).is_err());
}

#[test]
fn test_collision_groups_are_unique_and_negative() {
    let mut bridge = bridge(PhysicsConfig::default());
    let world = bridge.world_mut();
    let first = world.allocate_group();
    let second = world.allocate_group();
    assert!(first < 0 && second < 0);
    assert_ne!(first, second);
}
