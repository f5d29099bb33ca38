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

//! `rapier2d` implementation of the [`Simulator`] contract.
//!
//! Rapier reports contacts inside its own step, so the phase of each point is
//! recovered by diffing the touching set against the previous step.

mod conversions;
mod hooks;

use std::collections::{BTreeMap, HashMap};

use goo_core::math::{Aabb, Vec2};
use goo_core::physics::{
    BodyDef, BodyHandle, BodyState, BodyType, ContactId, ContactListener, ContactPoint, DebugDraw,
    JointDef, JointHandle, ShapeDef, ShapeHandle, ShapeKind, Simulator,
};
use rapier2d::prelude::*;

use self::conversions::*;
use self::hooks::{encode_group, GroupFilter};

/// Spring frequency used for joints that ask to be rigid.
const RIGID_FREQUENCY_HZ: f32 = 30.0;

type PointKey = (ShapeHandle, ShapeHandle, u32);

struct TrackedJoint {
    handle: ImpulseJointHandle,
    def: JointDef,
}

/// Implementation of the [`Simulator`] trait using the Rapier2D physics engine.
pub struct RapierWorld {
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    hooks: GroupFilter,
    bounds: Option<Aabb>,
    out_of_bounds: HashMap<BodyHandle, bool>,
    joints: BTreeMap<JointHandle, TrackedJoint>,
    next_joint: u64,
    touching: BTreeMap<PointKey, ContactPoint>,
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, -10.0))
    }
}

fn spring(def: &JointDef) -> GenericJoint {
    let frequency = if def.frequency_hz > 0.0 {
        def.frequency_hz
    } else {
        RIGID_FREQUENCY_HZ
    };
    let damping_ratio = if def.frequency_hz > 0.0 {
        def.damping_ratio
    } else {
        1.0
    };
    let omega = std::f32::consts::TAU * frequency;
    SpringJointBuilder::new(def.length, omega * omega, 2.0 * damping_ratio * omega)
        .spring_model(MotorModel::AccelerationBased)
        .local_anchor1(to_rapier_point(def.local_anchor_a))
        .local_anchor2(to_rapier_point(def.local_anchor_b))
        .contacts_enabled(def.collide_connected)
        .build()
        .into()
}

fn shape_builder(def: &ShapeDef) -> ColliderBuilder {
    let builder = match def.kind {
        ShapeKind::Circle { radius } => ColliderBuilder::ball(radius),
        ShapeKind::Box { half_extents } => ColliderBuilder::cuboid(half_extents.x, half_extents.y),
    };
    builder
        .position(Isometry::new(to_rapier_vec(def.offset), def.angle))
        .density(def.density)
        .friction(def.friction)
        .friction_combine_rule(CoefficientCombineRule::Multiply)
        .restitution(def.restitution)
        .restitution_combine_rule(CoefficientCombineRule::Max)
        .sensor(def.sensor)
        .user_data(encode_group(def.group_index))
        .active_hooks(ActiveHooks::FILTER_CONTACT_PAIRS | ActiveHooks::FILTER_INTERSECTION_PAIR)
}

impl RapierWorld {
    /// Creates an empty world with the given gravity.
    pub fn new(gravity: Vec2) -> Self {
        log::info!("Rapier physics world created (gravity {gravity:?}).");
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: to_rapier_vec(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            hooks: GroupFilter,
            bounds: None,
            out_of_bounds: HashMap::new(),
            joints: BTreeMap::new(),
            next_joint: 0,
            touching: BTreeMap::new(),
        }
    }

    fn collect_touching(&self) -> BTreeMap<PointKey, ContactPoint> {
        let mut current = BTreeMap::new();
        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact {
                continue;
            }
            let (Some(c1), Some(c2)) = (
                self.collider_set.get(pair.collider1),
                self.collider_set.get(pair.collider2),
            ) else {
                continue;
            };
            let (Some(b1), Some(b2)) = (c1.parent(), c2.parent()) else {
                continue;
            };
            let (s1, s2) = (shape_handle(pair.collider1), shape_handle(pair.collider2));
            for (mi, manifold) in pair.manifolds.iter().enumerate() {
                for (pi, point) in manifold.points.iter().enumerate() {
                    if point.dist > 0.0 {
                        continue;
                    }
                    let id = ((mi as u32) << 8) | pi as u32;
                    let world = c1.position() * point.local_p1;
                    current.insert(
                        (s1, s2, id),
                        ContactPoint {
                            shape_a: s1,
                            shape_b: s2,
                            body_a: body_handle(b1),
                            body_b: body_handle(b2),
                            id: ContactId(id),
                            position: from_rapier_point(&world),
                            normal: from_rapier_vec(&manifold.data.normal),
                            separation: point.dist,
                            normal_impulse: point.data.impulse,
                            tangent_impulse: point.data.tangent_impulse.norm(),
                        },
                    );
                }
            }
        }
        for (h1, h2, intersecting) in self.narrow_phase.intersection_pairs() {
            if !intersecting {
                continue;
            }
            let (Some(c1), Some(c2)) = (self.collider_set.get(h1), self.collider_set.get(h2)) else {
                continue;
            };
            let (Some(b1), Some(b2)) = (c1.parent(), c2.parent()) else {
                continue;
            };
            let (s1, s2) = (shape_handle(h1), shape_handle(h2));
            let centre = (from_rapier_vec(&c1.position().translation.vector)
                + from_rapier_vec(&c2.position().translation.vector))
                * 0.5;
            current.insert(
                (s1, s2, u32::MAX),
                ContactPoint {
                    shape_a: s1,
                    shape_b: s2,
                    body_a: body_handle(b1),
                    body_b: body_handle(b2),
                    id: ContactId(u32::MAX),
                    position: centre,
                    normal: Vec2::ZERO,
                    separation: 0.0,
                    normal_impulse: 0.0,
                    tangent_impulse: 0.0,
                },
            );
        }
        current
    }

    fn is_sensor_pair(&self, point: &ContactPoint) -> bool {
        [point.shape_a, point.shape_b].iter().any(|s| {
            self.collider_set
                .get(rapier_collider(*s))
                .is_some_and(|c| c.is_sensor())
        })
    }

    fn report_contacts(&mut self, listener: &mut dyn ContactListener) {
        let current = self.collect_touching();
        for (key, point) in &current {
            if self.touching.contains_key(key) {
                listener.persist(point);
            } else {
                listener.add(point);
            }
        }
        for (key, point) in &self.touching {
            if !current.contains_key(key) {
                listener.remove(point);
            }
        }
        for point in current.values() {
            if !self.is_sensor_pair(point) {
                listener.result(point);
            }
        }
        self.touching = current;
    }

    fn check_bounds(&mut self, listener: &mut dyn ContactListener) {
        let Some(bounds) = self.bounds else {
            return;
        };
        for (handle, body) in self.rigid_body_set.iter() {
            if !body.is_dynamic() {
                continue;
            }
            let key = body_handle(handle);
            let outside = !bounds.contains_point(from_rapier_vec(body.translation()));
            let was_outside = self.out_of_bounds.insert(key, outside).unwrap_or(false);
            if outside && !was_outside {
                listener.violation(key);
            }
        }
    }

}

impl Simulator for RapierWorld {
    fn step(
        &mut self,
        dt: f32,
        velocity_iterations: u32,
        _position_iterations: u32,
        listener: &mut dyn ContactListener,
    ) {
        if dt <= 0.0 {
            return;
        }
        self.integration_parameters.dt = dt;
        if let Some(iterations) = std::num::NonZeroUsize::new(velocity_iterations as usize) {
            self.integration_parameters.num_solver_iterations = iterations;
        }
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &self.hooks,
            &(),
        );
        self.report_contacts(listener);
        self.check_bounds(listener);
    }

    fn gravity(&self) -> Vec2 {
        from_rapier_vec(&self.gravity)
    }

    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = to_rapier_vec(gravity);
    }

    fn world_bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    fn set_world_bounds(&mut self, bounds: Option<Aabb>) {
        self.bounds = bounds;
    }

    fn create_body(&mut self, def: &BodyDef) -> BodyHandle {
        let builder = match def.body_type {
            BodyType::Dynamic => RigidBodyBuilder::dynamic(),
            BodyType::Static => RigidBodyBuilder::fixed(),
            BodyType::Kinematic => RigidBodyBuilder::kinematic_velocity_based(),
        };
        let mut builder = builder
            .translation(to_rapier_vec(def.position))
            .rotation(def.angle)
            .linvel(to_rapier_vec(def.linear_velocity))
            .angvel(def.angular_velocity)
            .linear_damping(def.linear_damping)
            .angular_damping(def.angular_damping)
            .gravity_scale(def.gravity_scale);
        if def.fixed_rotation {
            builder = builder.lock_rotations();
        }
        let handle = self.rigid_body_set.insert(builder.build());
        for shape in &def.shapes {
            self.collider_set.insert_with_parent(
                shape_builder(shape).build(),
                handle,
                &mut self.rigid_body_set,
            );
        }
        body_handle(handle)
    }

    fn destroy_body(&mut self, body: BodyHandle) -> bool {
        let removed = self.rigid_body_set.remove(
            rapier_body(body),
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        if removed.is_none() {
            return false;
        }
        self.joints
            .retain(|_, j| j.def.body_a != body && j.def.body_b != body);
        self.out_of_bounds.remove(&body);
        // Points of the body stay in `touching` and are reported as removed
        // by the next step.
        true
    }

    fn create_shape(&mut self, body: BodyHandle, def: &ShapeDef) -> Option<ShapeHandle> {
        let parent = rapier_body(body);
        self.rigid_body_set.get(parent)?;
        let handle = self.collider_set.insert_with_parent(
            shape_builder(def).build(),
            parent,
            &mut self.rigid_body_set,
        );
        Some(shape_handle(handle))
    }

    fn destroy_shape(&mut self, shape: ShapeHandle) -> bool {
        let removed = self.collider_set.remove(
            rapier_collider(shape),
            &mut self.island_manager,
            &mut self.rigid_body_set,
            true,
        );
        removed.is_some()
    }

    fn contains_body(&self, body: BodyHandle) -> bool {
        self.rigid_body_set.contains(rapier_body(body))
    }

    fn body_shapes(&self, body: BodyHandle) -> Vec<ShapeHandle> {
        self.rigid_body_set
            .get(rapier_body(body))
            .map(|b| b.colliders().iter().map(|c| shape_handle(*c)).collect())
            .unwrap_or_default()
    }

    fn shape_body(&self, shape: ShapeHandle) -> Option<BodyHandle> {
        self.collider_set
            .get(rapier_collider(shape))
            .and_then(|c| c.parent())
            .map(body_handle)
    }

    fn body_state(&self, body: BodyHandle) -> Option<BodyState> {
        self.rigid_body_set.get(rapier_body(body)).map(|b| BodyState {
            position: from_rapier_vec(b.translation()),
            angle: b.rotation().angle(),
            linear_velocity: from_rapier_vec(b.linvel()),
            angular_velocity: b.angvel(),
            body_type: match b.body_type() {
                RigidBodyType::Dynamic => BodyType::Dynamic,
                RigidBodyType::Fixed => BodyType::Static,
                _ => BodyType::Kinematic,
            },
            mass: b.mass(),
        })
    }

    fn set_transform(&mut self, body: BodyHandle, position: Vec2, angle: f32) -> bool {
        match self.rigid_body_set.get_mut(rapier_body(body)) {
            Some(b) => {
                b.set_translation(to_rapier_vec(position), true);
                b.set_rotation(Rotation::new(angle), true);
                true
            }
            None => false,
        }
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec2) -> bool {
        match self.rigid_body_set.get_mut(rapier_body(body)) {
            Some(b) => {
                b.set_linvel(to_rapier_vec(velocity), true);
                true
            }
            None => false,
        }
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec2, point: Vec2) -> bool {
        match self.rigid_body_set.get_mut(rapier_body(body)) {
            Some(b) => {
                b.add_force_at_point(to_rapier_vec(force), to_rapier_point(point), true);
                true
            }
            None => false,
        }
    }

    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2, point: Vec2) -> bool {
        match self.rigid_body_set.get_mut(rapier_body(body)) {
            Some(b) => {
                b.apply_impulse_at_point(to_rapier_vec(impulse), to_rapier_point(point), true);
                true
            }
            None => false,
        }
    }

    fn shape_friction(&self, shape: ShapeHandle) -> Option<f32> {
        self.collider_set
            .get(rapier_collider(shape))
            .map(|c| c.friction())
    }

    fn set_shape_friction(&mut self, shape: ShapeHandle, friction: f32) -> bool {
        match self.collider_set.get_mut(rapier_collider(shape)) {
            Some(c) => {
                c.set_friction(friction);
                true
            }
            None => false,
        }
    }

    fn set_shape_sensor(&mut self, shape: ShapeHandle, sensor: bool) -> bool {
        match self.collider_set.get_mut(rapier_collider(shape)) {
            Some(c) => {
                c.set_sensor(sensor);
                true
            }
            None => false,
        }
    }

    fn refilter(&mut self, shape: ShapeHandle) -> bool {
        // Rapier reads collider material every step.
        self.collider_set.contains(rapier_collider(shape))
    }

    fn create_joint(&mut self, def: &JointDef) -> Option<JointHandle> {
        let (a, b) = (rapier_body(def.body_a), rapier_body(def.body_b));
        if def.body_a == def.body_b
            || !self.rigid_body_set.contains(a)
            || !self.rigid_body_set.contains(b)
        {
            log::warn!("Rejected joint between {:?} and {:?}.", def.body_a, def.body_b);
            return None;
        }
        let handle = self.impulse_joint_set.insert(a, b, spring(def), true);
        let id = JointHandle(self.next_joint);
        self.next_joint += 1;
        self.joints.insert(id, TrackedJoint { handle, def: *def });
        Some(id)
    }

    fn destroy_joint(&mut self, joint: JointHandle) -> bool {
        match self.joints.remove(&joint) {
            Some(tracked) => {
                self.impulse_joint_set.remove(tracked.handle, true);
                true
            }
            None => false,
        }
    }

    fn joint_length(&self, joint: JointHandle) -> Option<f32> {
        self.joints.get(&joint).map(|j| j.def.length)
    }

    fn set_joint_length(&mut self, joint: JointHandle, length: f32) -> bool {
        let Some(tracked) = self.joints.get_mut(&joint) else {
            return false;
        };
        tracked.def.length = length;
        self.impulse_joint_set.remove(tracked.handle, true);
        tracked.handle = self.impulse_joint_set.insert(
            rapier_body(tracked.def.body_a),
            rapier_body(tracked.def.body_b),
            spring(&tracked.def),
            true,
        );
        true
    }

    fn joint_bodies(&self, joint: JointHandle) -> Option<(BodyHandle, BodyHandle)> {
        self.joints
            .get(&joint)
            .map(|j| (j.def.body_a, j.def.body_b))
    }

    fn query_aabb(&self, aabb: &Aabb, callback: &mut dyn FnMut(ShapeHandle) -> bool) {
        for (handle, collider) in self.collider_set.iter() {
            if from_rapier_aabb(&collider.compute_aabb()).intersects_aabb(aabb)
                && !callback(shape_handle(handle))
            {
                return;
            }
        }
    }

    fn test_point(&self, shape: ShapeHandle, point: Vec2) -> bool {
        self.collider_set
            .get(rapier_collider(shape))
            .is_some_and(|c| {
                c.shape()
                    .contains_point(c.position(), &to_rapier_point(point))
            })
    }

    fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    fn joint_count(&self) -> usize {
        self.joints.len()
    }

    fn debug_draw(&self, drawer: &mut dyn DebugDraw) {
        for (_, collider) in self.collider_set.iter() {
            let position = collider.position();
            let center = from_rapier_vec(&position.translation.vector);
            let angle = position.rotation.angle();
            if let Some(ball) = collider.shape().as_ball() {
                drawer.draw_circle(center, ball.radius, Vec2::from_angle(angle));
            } else if let Some(cuboid) = collider.shape().as_cuboid() {
                let h = from_rapier_vec(&cuboid.half_extents);
                let corners = [
                    Vec2::new(-h.x, -h.y),
                    Vec2::new(h.x, -h.y),
                    Vec2::new(h.x, h.y),
                    Vec2::new(-h.x, h.y),
                ]
                .map(|v| center + v.rotate(angle));
                drawer.draw_polygon(&corners);
            }
        }
        for tracked in self.joints.values() {
            let (Some(a), Some(b)) = (
                self.rigid_body_set.get(rapier_body(tracked.def.body_a)),
                self.rigid_body_set.get(rapier_body(tracked.def.body_b)),
            ) else {
                continue;
            };
            let pa = a.position() * to_rapier_point(tracked.def.local_anchor_a);
            let pb = b.position() * to_rapier_point(tracked.def.local_anchor_b);
            drawer.draw_segment(from_rapier_point(&pa), from_rapier_point(&pb));
        }
    }
}
