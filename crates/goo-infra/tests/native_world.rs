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

use approx::assert_relative_eq;
use goo_core::math::{Aabb, Vec2};
use goo_core::physics::{
    BodyDef, BodyHandle, BodyType, ContactListener, ContactPoint, JointDef, ShapeDef, Simulator,
};
use goo_infra::NativeWorld;

const DT: f32 = 1.0 / 60.0;

#[derive(Default)]
struct Recorder {
    added: Vec<ContactPoint>,
    persisted: Vec<ContactPoint>,
    removed: Vec<ContactPoint>,
    results: Vec<ContactPoint>,
    violations: Vec<BodyHandle>,
}

impl ContactListener for Recorder {
    fn add(&mut self, point: &ContactPoint) {
        self.added.push(*point);
    }
    fn persist(&mut self, point: &ContactPoint) {
        self.persisted.push(*point);
    }
    fn remove(&mut self, point: &ContactPoint) {
        self.removed.push(*point);
    }
    fn result(&mut self, point: &ContactPoint) {
        self.results.push(*point);
    }
    fn violation(&mut self, body: BodyHandle) {
        self.violations.push(body);
    }
}

fn ground(world: &mut NativeWorld) -> BodyHandle {
    world.create_body(&BodyDef {
        body_type: BodyType::Static,
        shapes: vec![ShapeDef::cuboid(10.0, 0.5)],
        ..Default::default()
    })
}

fn ball(world: &mut NativeWorld, position: Vec2, radius: f32) -> BodyHandle {
    world.create_body(&BodyDef {
        position,
        shapes: vec![ShapeDef::circle(radius)],
        ..Default::default()
    })
}

fn run(world: &mut NativeWorld, steps: usize, recorder: &mut Recorder) {
    for _ in 0..steps {
        world.step(DT, 8, 3, recorder);
    }
}

#[test]
fn test_falling_ball_comes_to_rest_on_ground() {
    let mut world = NativeWorld::default();
    let floor = ground(&mut world);
    let body = ball(&mut world, Vec2::new(0.0, 2.0), 0.5);
    let mut recorder = Recorder::default();

    run(&mut world, 180, &mut recorder);

    let state = world.body_state(body).unwrap();
    assert_relative_eq!(state.position.y, 1.0, epsilon = 0.05);
    assert!(state.linear_velocity.length() < 0.1);

    assert!(!recorder.added.is_empty());
    assert!(!recorder.persisted.is_empty());
    assert!(!recorder.results.is_empty());
    let first = recorder.added[0];
    assert_eq!(first.body_a, floor);
    assert_eq!(first.body_b, body);
    assert_relative_eq!(first.normal.y, 1.0, epsilon = 1e-4);
    assert!(recorder.results.iter().any(|r| r.normal_impulse > 0.0));
}

#[test]
fn test_separating_bodies_report_removed_points() {
    let mut world = NativeWorld::new(Vec2::ZERO);
    let a = ball(&mut world, Vec2::ZERO, 0.5);
    let b = ball(&mut world, Vec2::new(0.9, 0.0), 0.5);
    let mut recorder = Recorder::default();

    world.step(DT, 8, 3, &mut recorder);
    assert_eq!(recorder.added.len(), 1);

    world.set_transform(b, Vec2::new(5.0, 0.0), 0.0);
    world.set_linear_velocity(a, Vec2::ZERO);
    world.step(DT, 8, 3, &mut recorder);
    assert_eq!(recorder.removed.len(), 1);
    assert_eq!(world.contact_count(), 0);
}

#[test]
fn test_destroying_a_touching_body_reports_removed_points() {
    let mut world = NativeWorld::new(Vec2::ZERO);
    let a = ball(&mut world, Vec2::ZERO, 0.5);
    let b = ball(&mut world, Vec2::new(0.9, 0.0), 0.5);
    let mut recorder = Recorder::default();

    world.step(DT, 8, 3, &mut recorder);
    assert_eq!(recorder.added.len(), 1);

    assert!(world.destroy_body(b));
    assert_eq!(world.contact_count(), 0);
    // Reported by the next step, not by the destroy call.
    assert!(recorder.removed.is_empty());

    world.step(DT, 8, 3, &mut recorder);
    assert_eq!(recorder.removed.len(), 1);
    assert_eq!(recorder.removed[0].body_a, a);
    assert_eq!(recorder.removed[0].body_b, b);

    world.step(DT, 8, 3, &mut recorder);
    assert_eq!(recorder.removed.len(), 1);
}

#[test]
fn test_sensor_reports_contacts_without_results() {
    let mut world = NativeWorld::new(Vec2::ZERO);
    world.create_body(&BodyDef {
        body_type: BodyType::Static,
        shapes: vec![ShapeDef {
            sensor: true,
            ..ShapeDef::circle(1.0)
        }],
        ..Default::default()
    });
    let body = ball(&mut world, Vec2::new(0.5, 0.0), 0.5);
    let mut recorder = Recorder::default();

    run(&mut world, 3, &mut recorder);

    assert_eq!(recorder.added.len(), 1);
    assert_eq!(recorder.persisted.len(), 2);
    assert!(recorder.results.is_empty());
    assert_relative_eq!(world.body_state(body).unwrap().position.x, 0.5);
}

#[test]
fn test_shared_negative_group_never_collides() {
    let mut world = NativeWorld::new(Vec2::ZERO);
    let grouped = ShapeDef {
        group_index: -3,
        ..ShapeDef::circle(0.5)
    };
    for x in [0.0, 0.5] {
        world.create_body(&BodyDef {
            position: Vec2::new(x, 0.0),
            shapes: vec![grouped],
            ..Default::default()
        });
    }
    let mut recorder = Recorder::default();
    run(&mut world, 2, &mut recorder);
    assert!(recorder.added.is_empty());
}

#[test]
fn test_rigid_joint_follows_new_length() {
    let mut world = NativeWorld::new(Vec2::ZERO);
    let a = ball(&mut world, Vec2::ZERO, 0.2);
    let b = ball(&mut world, Vec2::new(2.0, 0.0), 0.2);
    let joint = world.create_joint(&JointDef::distance(a, b, 2.0)).unwrap();
    let mut recorder = Recorder::default();

    assert!(world.set_joint_length(joint, 1.0));
    assert_eq!(world.joint_length(joint), Some(1.0));
    run(&mut world, 60, &mut recorder);

    let pa = world.body_state(a).unwrap().position;
    let pb = world.body_state(b).unwrap().position;
    assert_relative_eq!(pa.distance(pb), 1.0, epsilon = 0.05);
}

#[test]
fn test_soft_joint_pulls_bodies_together() {
    let mut world = NativeWorld::new(Vec2::ZERO);
    let a = ball(&mut world, Vec2::ZERO, 0.2);
    let b = ball(&mut world, Vec2::new(3.0, 0.0), 0.2);
    world
        .create_joint(&JointDef {
            frequency_hz: 4.0,
            damping_ratio: 0.7,
            ..JointDef::distance(a, b, 1.0)
        })
        .unwrap();
    let mut recorder = Recorder::default();
    run(&mut world, 240, &mut recorder);

    let pa = world.body_state(a).unwrap().position;
    let pb = world.body_state(b).unwrap().position;
    assert_relative_eq!(pa.distance(pb), 1.0, epsilon = 0.1);
}

#[test]
fn test_leaving_bounds_is_reported_once() {
    let mut world = NativeWorld::default();
    world.set_world_bounds(Some(Aabb::from_min_max(
        Vec2::new(-5.0, -5.0),
        Vec2::new(5.0, 5.0),
    )));
    let body = ball(&mut world, Vec2::new(0.0, 4.0), 0.5);
    let mut recorder = Recorder::default();

    run(&mut world, 200, &mut recorder);

    assert_eq!(recorder.violations, vec![body]);
}

#[test]
fn test_destroy_body_releases_shapes_and_joints() {
    let mut world = NativeWorld::new(Vec2::ZERO);
    let a = ball(&mut world, Vec2::ZERO, 0.5);
    let b = ball(&mut world, Vec2::new(3.0, 0.0), 0.5);
    world.create_joint(&JointDef::distance(a, b, 3.0)).unwrap();
    let shape = world.body_shapes(a)[0];

    assert!(world.destroy_body(a));
    assert!(!world.destroy_body(a));
    assert_eq!(world.body_count(), 1);
    assert_eq!(world.joint_count(), 0);
    assert_eq!(world.shape_body(shape), None);

    let c = ball(&mut world, Vec2::ZERO, 0.5);
    assert_ne!(a, c);
    assert!(!world.contains_body(a));
    assert!(world.contains_body(c));
}

#[test]
fn test_queries_find_overlapping_shapes() {
    let mut world = NativeWorld::new(Vec2::ZERO);
    let near = ball(&mut world, Vec2::new(1.0, 1.0), 0.5);
    ball(&mut world, Vec2::new(10.0, 10.0), 0.5);

    let mut found = Vec::new();
    world.query_aabb(
        &Aabb::from_min_max(Vec2::ZERO, Vec2::new(2.0, 2.0)),
        &mut |shape| {
            found.push(shape);
            true
        },
    );
    assert_eq!(found, world.body_shapes(near));
    assert!(world.test_point(found[0], Vec2::new(1.2, 1.0)));
    assert!(!world.test_point(found[0], Vec2::new(2.0, 2.0)));
}

#[test]
fn test_friction_change_is_visible_to_existing_contact() {
    let mut world = NativeWorld::default();
    ground(&mut world);
    let body = world.create_body(&BodyDef {
        position: Vec2::new(0.0, 0.99),
        linear_velocity: Vec2::new(4.0, 0.0),
        fixed_rotation: true,
        shapes: vec![ShapeDef {
            friction: 0.0,
            ..ShapeDef::cuboid(0.5, 0.5)
        }],
        ..Default::default()
    });
    let mut recorder = Recorder::default();
    run(&mut world, 10, &mut recorder);
    let sliding = world.body_state(body).unwrap().linear_velocity.x;
    assert_relative_eq!(sliding, 4.0, epsilon = 0.05);

    let shape = world.body_shapes(body)[0];
    assert!(world.set_shape_friction(shape, 1.0));
    assert!(world.refilter(shape));
    run(&mut world, 60, &mut recorder);
    assert!(world.body_state(body).unwrap().linear_velocity.x < 0.5);
}
