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

//! Native sequential-impulse implementation of the [`Simulator`] contract.
//!
//! Brute-force broad phase, circle and box narrow phase, soft distance
//! joints. Small worlds of a few hundred bodies are the target.

mod arena;
mod collision;
mod solver;

use std::collections::{BTreeMap, HashMap, HashSet};

use goo_core::math::{Aabb, Vec2, PI};
use goo_core::physics::{
    BodyDef, BodyHandle, BodyState, BodyType, ContactId, ContactListener, ContactPoint, DebugDraw,
    JointDef, JointHandle, ShapeDef, ShapeHandle, ShapeKind, Simulator,
};

use self::arena::Arena;
use self::collision::{collide, Manifold, WorldShape};
use self::solver::{ContactConstraint, DistanceConstraint, PointInput, SolverBody};

struct Body {
    body_type: BodyType,
    position: Vec2,
    angle: f32,
    linear_velocity: Vec2,
    angular_velocity: f32,
    linear_damping: f32,
    angular_damping: f32,
    gravity_scale: f32,
    fixed_rotation: bool,
    force: Vec2,
    torque: f32,
    mass: f32,
    inv_mass: f32,
    inv_inertia: f32,
    shapes: Vec<ShapeHandle>,
    joints: Vec<JointHandle>,
    out_of_bounds: bool,
}

impl Body {
    fn from_def(def: &BodyDef) -> Self {
        Self {
            body_type: def.body_type,
            position: def.position,
            angle: def.angle,
            linear_velocity: def.linear_velocity,
            angular_velocity: def.angular_velocity,
            linear_damping: def.linear_damping,
            angular_damping: def.angular_damping,
            gravity_scale: def.gravity_scale,
            fixed_rotation: def.fixed_rotation,
            force: Vec2::ZERO,
            torque: 0.0,
            mass: 0.0,
            inv_mass: 0.0,
            inv_inertia: 0.0,
            shapes: Vec::new(),
            joints: Vec::new(),
            out_of_bounds: false,
        }
    }

    fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }
}

struct Shape {
    body: BodyHandle,
    def: ShapeDef,
}

struct Joint {
    def: JointDef,
    impulse: f32,
}

/// Cached state of a touching shape pair, kept across steps for warm starting.
struct Contact {
    body_a: BodyHandle,
    body_b: BodyHandle,
    friction: f32,
    restitution: f32,
    sensor: bool,
    manifold: Manifold,
    /// Accumulated `(normal, tangent)` impulses per point id.
    impulses: HashMap<u32, (f32, f32)>,
}

fn mix_friction(a: f32, b: f32) -> f32 {
    (a * b).sqrt()
}

fn mix_restitution(a: f32, b: f32) -> f32 {
    a.max(b)
}

/// Mass and rotational inertia about the body origin.
fn shape_mass(def: &ShapeDef) -> (f32, f32) {
    let (mass, inertia) = match def.kind {
        ShapeKind::Circle { radius } => {
            let mass = def.density * PI * radius * radius;
            (mass, 0.5 * mass * radius * radius)
        }
        ShapeKind::Box { half_extents } => {
            let mass = def.density * 4.0 * half_extents.x * half_extents.y;
            (mass, mass * half_extents.length_squared() / 3.0)
        }
    };
    (mass, inertia + mass * def.offset.length_squared())
}

/// The native 2D physics world.
pub struct NativeWorld {
    gravity: Vec2,
    bounds: Option<Aabb>,
    bodies: Arena<Body>,
    shapes: Arena<Shape>,
    joints: Arena<Joint>,
    contacts: BTreeMap<(ShapeHandle, ShapeHandle), Contact>,
    /// Points of contacts dropped outside a step, reported as removed by the
    /// next one.
    detached: Vec<ContactPoint>,
}

impl Default for NativeWorld {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, -10.0))
    }
}

impl NativeWorld {
    /// Creates an empty world with the given gravity.
    pub fn new(gravity: Vec2) -> Self {
        log::info!("Native physics world created (gravity {gravity:?}).");
        Self {
            gravity,
            bounds: None,
            bodies: Arena::new(),
            shapes: Arena::new(),
            joints: Arena::new(),
            contacts: BTreeMap::new(),
            detached: Vec::new(),
        }
    }

    /// Number of touching shape pairs currently cached.
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    fn world_shape(&self, shape: &Shape) -> Option<WorldShape> {
        let body = self.bodies.get(shape.body.0)?;
        Some(WorldShape {
            kind: shape.def.kind,
            center: body.position + shape.def.offset.rotate(body.angle),
            angle: body.angle + shape.def.angle,
        })
    }

    fn reset_mass(&mut self, handle: BodyHandle) {
        let Some(body) = self.bodies.get(handle.0) else {
            return;
        };
        let (mut mass, mut inertia) = (0.0, 0.0);
        for shape in &body.shapes {
            if let Some(s) = self.shapes.get(shape.0) {
                let (m, i) = shape_mass(&s.def);
                mass += m;
                inertia += i;
            }
        }
        let Some(body) = self.bodies.get_mut(handle.0) else {
            return;
        };
        if body.is_dynamic() {
            if mass <= 0.0 {
                mass = 1.0;
                inertia = 0.0;
            }
            body.mass = mass;
            body.inv_mass = 1.0 / mass;
            body.inv_inertia = if body.fixed_rotation || inertia <= 0.0 {
                0.0
            } else {
                1.0 / inertia
            };
        } else {
            body.mass = 0.0;
            body.inv_mass = 0.0;
            body.inv_inertia = 0.0;
        }
    }

    fn joined_without_collision(&self, a: BodyHandle, b: BodyHandle) -> bool {
        let Some(body) = self.bodies.get(a.0) else {
            return false;
        };
        body.joints.iter().any(|j| {
            self.joints.get(j.0).is_some_and(|joint| {
                !joint.def.collide_connected
                    && ((joint.def.body_a == a && joint.def.body_b == b)
                        || (joint.def.body_a == b && joint.def.body_b == a))
            })
        })
    }

    fn should_collide(&self, a: &Shape, b: &Shape) -> bool {
        if a.body == b.body {
            return false;
        }
        let (Some(body_a), Some(body_b)) = (self.bodies.get(a.body.0), self.bodies.get(b.body.0))
        else {
            return false;
        };
        if !body_a.is_dynamic() && !body_b.is_dynamic() {
            return false;
        }
        let (ga, gb) = (a.def.group_index, b.def.group_index);
        if ga == gb && ga != 0 {
            return ga > 0;
        }
        !self.joined_without_collision(a.body, b.body)
    }

    /// Recomputes every manifold and reports the phase of each point.
    fn update_contacts(&mut self, listener: &mut dyn ContactListener) {
        let placed: Vec<(ShapeHandle, WorldShape, Aabb)> = self
            .shapes
            .iter()
            .filter_map(|(raw, shape)| {
                self.world_shape(shape)
                    .map(|ws| (ShapeHandle(raw), ws, ws.aabb()))
            })
            .collect();

        let mut fresh = BTreeMap::new();
        for (i, (ha, wa, aabb_a)) in placed.iter().enumerate() {
            for (hb, wb, aabb_b) in placed.iter().skip(i + 1) {
                if !aabb_a.intersects_aabb(aabb_b) {
                    continue;
                }
                let (Some(sa), Some(sb)) = (self.shapes.get(ha.0), self.shapes.get(hb.0)) else {
                    continue;
                };
                if !self.should_collide(sa, sb) {
                    continue;
                }
                let Some(manifold) = collide(wa, wb) else {
                    continue;
                };

                let key = (*ha, *hb);
                let previous = self.contacts.remove(&key);
                let mut contact = Contact {
                    body_a: sa.body,
                    body_b: sb.body,
                    friction: previous.as_ref().map_or_else(
                        || mix_friction(sa.def.friction, sb.def.friction),
                        |c| c.friction,
                    ),
                    restitution: previous.as_ref().map_or_else(
                        || mix_restitution(sa.def.restitution, sb.def.restitution),
                        |c| c.restitution,
                    ),
                    sensor: sa.def.sensor || sb.def.sensor,
                    manifold,
                    impulses: HashMap::new(),
                };
                for point in &contact.manifold.points {
                    let carried = previous
                        .as_ref()
                        .and_then(|c| c.impulses.get(&point.id).copied());
                    contact
                        .impulses
                        .insert(point.id, carried.unwrap_or((0.0, 0.0)));
                    let cp = self.contact_point(key, &contact, point.id);
                    if carried.is_some() {
                        listener.persist(&cp);
                    } else {
                        listener.add(&cp);
                    }
                }
                if let Some(prev) = &previous {
                    for id in prev.impulses.keys() {
                        if !contact.impulses.contains_key(id) {
                            listener.remove(&self.contact_point(key, prev, *id));
                        }
                    }
                }
                fresh.insert(key, contact);
            }
        }

        for (key, stale) in std::mem::take(&mut self.contacts) {
            for id in stale.impulses.keys() {
                let cp = self.contact_point(key, &stale, *id);
                listener.remove(&cp);
            }
        }
        self.contacts = fresh;
    }

    fn contact_point(
        &self,
        key: (ShapeHandle, ShapeHandle),
        contact: &Contact,
        id: u32,
    ) -> ContactPoint {
        let point = contact.manifold.points.iter().find(|p| p.id == id);
        let (normal_impulse, tangent_impulse) =
            contact.impulses.get(&id).copied().unwrap_or((0.0, 0.0));
        ContactPoint {
            shape_a: key.0,
            shape_b: key.1,
            body_a: contact.body_a,
            body_b: contact.body_b,
            id: ContactId(id),
            position: point.map_or(Vec2::ZERO, |p| p.position),
            normal: contact.manifold.normal,
            separation: point.map_or(0.0, |p| p.separation),
            normal_impulse,
            tangent_impulse,
        }
    }

    fn integrate_velocities(&mut self, dt: f32) {
        let gravity = self.gravity;
        for (_, body) in self.bodies.iter_mut() {
            if body.is_dynamic() {
                body.linear_velocity +=
                    (gravity * body.gravity_scale + body.force * body.inv_mass) * dt;
                body.angular_velocity += body.torque * body.inv_inertia * dt;
                body.linear_velocity *= 1.0 / (1.0 + dt * body.linear_damping);
                body.angular_velocity *= 1.0 / (1.0 + dt * body.angular_damping);
            }
            body.force = Vec2::ZERO;
            body.torque = 0.0;
        }
    }

    fn solve(&mut self, dt: f32, velocity_iterations: u32, position_iterations: u32) {
        let mut index_of: HashMap<BodyHandle, usize> = HashMap::new();
        let mut handles = Vec::new();
        let mut solver_bodies = Vec::new();
        for (raw, body) in self.bodies.iter() {
            index_of.insert(BodyHandle(raw), solver_bodies.len());
            handles.push(BodyHandle(raw));
            solver_bodies.push(SolverBody {
                position: body.position,
                angle: body.angle,
                linear_velocity: body.linear_velocity,
                angular_velocity: body.angular_velocity,
                inv_mass: body.inv_mass,
                inv_inertia: body.inv_inertia,
            });
        }

        let inv_dt = 1.0 / dt;
        let mut contact_keys = Vec::new();
        let mut contacts = Vec::new();
        for (key, contact) in &self.contacts {
            if contact.sensor {
                continue;
            }
            let (Some(&a), Some(&b)) = (index_of.get(&contact.body_a), index_of.get(&contact.body_b))
            else {
                continue;
            };
            let inputs: Vec<PointInput> = contact
                .manifold
                .points
                .iter()
                .map(|p| {
                    let (n, t) = contact.impulses.get(&p.id).copied().unwrap_or((0.0, 0.0));
                    PointInput {
                        position: p.position,
                        separation: p.separation,
                        normal_impulse: n,
                        tangent_impulse: t,
                    }
                })
                .collect();
            contact_keys.push(*key);
            contacts.push(ContactConstraint::prepare(
                &solver_bodies,
                a,
                b,
                contact.manifold.normal,
                contact.friction,
                contact.restitution,
                &inputs,
                inv_dt,
            ));
        }

        let mut joint_keys = Vec::new();
        let mut joints = Vec::new();
        for (raw, joint) in self.joints.iter() {
            let (Some(&a), Some(&b)) = (
                index_of.get(&joint.def.body_a),
                index_of.get(&joint.def.body_b),
            ) else {
                continue;
            };
            joint_keys.push(raw);
            joints.push(DistanceConstraint::prepare(
                &solver_bodies,
                a,
                b,
                joint.def.local_anchor_a,
                joint.def.local_anchor_b,
                joint.def.length,
                joint.def.frequency_hz,
                joint.def.damping_ratio,
                joint.impulse,
                dt,
            ));
        }

        for joint in &joints {
            joint.warm_start(&mut solver_bodies);
        }
        for contact in &contacts {
            contact.warm_start(&mut solver_bodies);
        }
        for _ in 0..velocity_iterations {
            for joint in &mut joints {
                joint.solve_velocity(&mut solver_bodies);
            }
            for contact in &mut contacts {
                contact.solve(&mut solver_bodies);
            }
        }

        for (sb, handle) in solver_bodies.iter_mut().zip(&handles) {
            let Some(body) = self.bodies.get(handle.0) else {
                continue;
            };
            if body.body_type == BodyType::Static {
                continue;
            }
            sb.position += sb.linear_velocity * dt;
            sb.angle += sb.angular_velocity * dt;
        }

        for _ in 0..position_iterations {
            let mut settled = true;
            for joint in &joints {
                settled &= joint.solve_position(&mut solver_bodies);
            }
            if settled {
                break;
            }
        }

        for (sb, handle) in solver_bodies.iter().zip(&handles) {
            if let Some(body) = self.bodies.get_mut(handle.0) {
                body.position = sb.position;
                body.angle = sb.angle;
                body.linear_velocity = sb.linear_velocity;
                body.angular_velocity = sb.angular_velocity;
            }
        }
        for (raw, joint) in joint_keys.iter().zip(&joints) {
            if let Some(stored) = self.joints.get_mut(*raw) {
                stored.impulse = joint.impulse;
            }
        }
        for (key, constraint) in contact_keys.iter().zip(&contacts) {
            if let Some(stored) = self.contacts.get_mut(key) {
                for (point, solved_point) in stored.manifold.points.iter().zip(&constraint.points) {
                    stored.impulses.insert(
                        point.id,
                        (solved_point.normal_impulse, solved_point.tangent_impulse),
                    );
                }
            }
        }
    }

    fn report_results(&self, listener: &mut dyn ContactListener) {
        for (key, contact) in &self.contacts {
            if contact.sensor {
                continue;
            }
            for point in &contact.manifold.points {
                listener.result(&self.contact_point(*key, contact, point.id));
            }
        }
    }

    fn check_bounds(&mut self, listener: &mut dyn ContactListener) {
        let Some(bounds) = self.bounds else {
            return;
        };
        for (raw, body) in self.bodies.iter_mut() {
            if !body.is_dynamic() {
                continue;
            }
            let outside = !bounds.contains_point(body.position);
            if outside && !body.out_of_bounds {
                listener.violation(BodyHandle(raw));
            }
            body.out_of_bounds = outside;
        }
    }

    fn detach_contacts(&mut self, mut detach: impl FnMut(ShapeHandle, ShapeHandle) -> bool) {
        let keys: Vec<(ShapeHandle, ShapeHandle)> = self
            .contacts
            .keys()
            .filter(|(a, b)| detach(*a, *b))
            .copied()
            .collect();
        for key in keys {
            let Some(contact) = self.contacts.remove(&key) else {
                continue;
            };
            let mut ids: Vec<u32> = contact.impulses.keys().copied().collect();
            ids.sort_unstable();
            for id in ids {
                let point = self.contact_point(key, &contact, id);
                self.detached.push(point);
            }
        }
    }
}

impl Simulator for NativeWorld {
    fn step(
        &mut self,
        dt: f32,
        velocity_iterations: u32,
        position_iterations: u32,
        listener: &mut dyn ContactListener,
    ) {
        if dt <= 0.0 {
            return;
        }
        for point in std::mem::take(&mut self.detached) {
            listener.remove(&point);
        }
        self.update_contacts(listener);
        self.integrate_velocities(dt);
        self.solve(dt, velocity_iterations, position_iterations);
        self.report_results(listener);
        self.check_bounds(listener);
    }

    fn gravity(&self) -> Vec2 {
        self.gravity
    }

    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    fn world_bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    fn set_world_bounds(&mut self, bounds: Option<Aabb>) {
        self.bounds = bounds;
    }

    fn create_body(&mut self, def: &BodyDef) -> BodyHandle {
        let handle = BodyHandle(self.bodies.insert(Body::from_def(def)));
        for shape in &def.shapes {
            let raw = self.shapes.insert(Shape {
                body: handle,
                def: *shape,
            });
            if let Some(body) = self.bodies.get_mut(handle.0) {
                body.shapes.push(ShapeHandle(raw));
            }
        }
        self.reset_mass(handle);
        log::trace!("Body {handle:?} created with {} shape(s).", def.shapes.len());
        handle
    }

    fn destroy_body(&mut self, body: BodyHandle) -> bool {
        let Some(removed) = self.bodies.remove(body.0) else {
            return false;
        };
        for joint in &removed.joints {
            self.destroy_joint(*joint);
        }
        let shapes: HashSet<ShapeHandle> = removed.shapes.iter().copied().collect();
        for shape in &shapes {
            self.shapes.remove(shape.0);
        }
        self.detach_contacts(|a, b| shapes.contains(&a) || shapes.contains(&b));
        log::trace!("Body {body:?} destroyed.");
        true
    }

    fn create_shape(&mut self, body: BodyHandle, def: &ShapeDef) -> Option<ShapeHandle> {
        if !self.bodies.contains(body.0) {
            return None;
        }
        let handle = ShapeHandle(self.shapes.insert(Shape { body, def: *def }));
        if let Some(b) = self.bodies.get_mut(body.0) {
            b.shapes.push(handle);
        }
        self.reset_mass(body);
        Some(handle)
    }

    fn destroy_shape(&mut self, shape: ShapeHandle) -> bool {
        let Some(removed) = self.shapes.remove(shape.0) else {
            return false;
        };
        if let Some(body) = self.bodies.get_mut(removed.body.0) {
            body.shapes.retain(|s| *s != shape);
        }
        self.reset_mass(removed.body);
        self.detach_contacts(|a, b| a == shape || b == shape);
        true
    }

    fn contains_body(&self, body: BodyHandle) -> bool {
        self.bodies.contains(body.0)
    }

    fn body_shapes(&self, body: BodyHandle) -> Vec<ShapeHandle> {
        self.bodies
            .get(body.0)
            .map(|b| b.shapes.clone())
            .unwrap_or_default()
    }

    fn shape_body(&self, shape: ShapeHandle) -> Option<BodyHandle> {
        self.shapes.get(shape.0).map(|s| s.body)
    }

    fn body_state(&self, body: BodyHandle) -> Option<BodyState> {
        self.bodies.get(body.0).map(|b| BodyState {
            position: b.position,
            angle: b.angle,
            linear_velocity: b.linear_velocity,
            angular_velocity: b.angular_velocity,
            body_type: b.body_type,
            mass: b.mass,
        })
    }

    fn set_transform(&mut self, body: BodyHandle, position: Vec2, angle: f32) -> bool {
        match self.bodies.get_mut(body.0) {
            Some(b) => {
                b.position = position;
                b.angle = angle;
                true
            }
            None => false,
        }
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec2) -> bool {
        match self.bodies.get_mut(body.0) {
            Some(b) if b.body_type != BodyType::Static => {
                b.linear_velocity = velocity;
                true
            }
            Some(_) => true,
            None => false,
        }
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec2, point: Vec2) -> bool {
        match self.bodies.get_mut(body.0) {
            Some(b) => {
                if b.is_dynamic() {
                    b.force += force;
                    b.torque += (point - b.position).cross(force);
                }
                true
            }
            None => false,
        }
    }

    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2, point: Vec2) -> bool {
        match self.bodies.get_mut(body.0) {
            Some(b) => {
                if b.is_dynamic() {
                    b.linear_velocity += impulse * b.inv_mass;
                    b.angular_velocity += b.inv_inertia * (point - b.position).cross(impulse);
                }
                true
            }
            None => false,
        }
    }

    fn shape_friction(&self, shape: ShapeHandle) -> Option<f32> {
        self.shapes.get(shape.0).map(|s| s.def.friction)
    }

    fn set_shape_friction(&mut self, shape: ShapeHandle, friction: f32) -> bool {
        match self.shapes.get_mut(shape.0) {
            Some(s) => {
                s.def.friction = friction;
                true
            }
            None => false,
        }
    }

    fn set_shape_sensor(&mut self, shape: ShapeHandle, sensor: bool) -> bool {
        match self.shapes.get_mut(shape.0) {
            Some(s) => {
                s.def.sensor = sensor;
                true
            }
            None => false,
        }
    }

    fn refilter(&mut self, shape: ShapeHandle) -> bool {
        if !self.shapes.contains(shape.0) {
            return false;
        }
        let keys: Vec<(ShapeHandle, ShapeHandle)> = self
            .contacts
            .keys()
            .filter(|(a, b)| *a == shape || *b == shape)
            .copied()
            .collect();
        for key in keys {
            let (Some(a), Some(b)) = (self.shapes.get(key.0 .0), self.shapes.get(key.1 .0)) else {
                continue;
            };
            let friction = mix_friction(a.def.friction, b.def.friction);
            let restitution = mix_restitution(a.def.restitution, b.def.restitution);
            let sensor = a.def.sensor || b.def.sensor;
            if let Some(contact) = self.contacts.get_mut(&key) {
                contact.friction = friction;
                contact.restitution = restitution;
                contact.sensor = sensor;
            }
        }
        true
    }

    fn create_joint(&mut self, def: &JointDef) -> Option<JointHandle> {
        if def.body_a == def.body_b
            || !self.bodies.contains(def.body_a.0)
            || !self.bodies.contains(def.body_b.0)
        {
            log::warn!("Rejected joint between {:?} and {:?}.", def.body_a, def.body_b);
            return None;
        }
        let handle = JointHandle(self.joints.insert(Joint {
            def: *def,
            impulse: 0.0,
        }));
        for body in [def.body_a, def.body_b] {
            if let Some(b) = self.bodies.get_mut(body.0) {
                b.joints.push(handle);
            }
        }
        if !def.collide_connected {
            let shapes: HashSet<ShapeHandle> = self
                .body_shapes(def.body_a)
                .into_iter()
                .chain(self.body_shapes(def.body_b))
                .collect();
            self.detach_contacts(|a, b| shapes.contains(&a) && shapes.contains(&b));
        }
        Some(handle)
    }

    fn destroy_joint(&mut self, joint: JointHandle) -> bool {
        let Some(removed) = self.joints.remove(joint.0) else {
            return false;
        };
        for body in [removed.def.body_a, removed.def.body_b] {
            if let Some(b) = self.bodies.get_mut(body.0) {
                b.joints.retain(|j| *j != joint);
            }
        }
        true
    }

    fn joint_length(&self, joint: JointHandle) -> Option<f32> {
        self.joints.get(joint.0).map(|j| j.def.length)
    }

    fn set_joint_length(&mut self, joint: JointHandle, length: f32) -> bool {
        match self.joints.get_mut(joint.0) {
            Some(j) => {
                j.def.length = length;
                true
            }
            None => false,
        }
    }

    fn joint_bodies(&self, joint: JointHandle) -> Option<(BodyHandle, BodyHandle)> {
        self.joints
            .get(joint.0)
            .map(|j| (j.def.body_a, j.def.body_b))
    }

    fn query_aabb(&self, aabb: &Aabb, callback: &mut dyn FnMut(ShapeHandle) -> bool) {
        for (raw, shape) in self.shapes.iter() {
            let Some(ws) = self.world_shape(shape) else {
                continue;
            };
            if ws.aabb().intersects_aabb(aabb) && !callback(ShapeHandle(raw)) {
                return;
            }
        }
    }

    fn test_point(&self, shape: ShapeHandle, point: Vec2) -> bool {
        self.shapes
            .get(shape.0)
            .and_then(|s| self.world_shape(s))
            .is_some_and(|ws| ws.contains(point))
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn joint_count(&self) -> usize {
        self.joints.len()
    }

    fn debug_draw(&self, drawer: &mut dyn DebugDraw) {
        for (_, shape) in self.shapes.iter() {
            let Some(ws) = self.world_shape(shape) else {
                continue;
            };
            match ws.kind {
                ShapeKind::Circle { radius } => {
                    drawer.draw_circle(ws.center, radius, Vec2::from_angle(ws.angle))
                }
                ShapeKind::Box { .. } => drawer.draw_polygon(&ws.vertices()),
            }
        }
        for (_, joint) in self.joints.iter() {
            let (Some(a), Some(b)) = (
                self.bodies.get(joint.def.body_a.0),
                self.bodies.get(joint.def.body_b.0),
            ) else {
                continue;
            };
            drawer.draw_segment(
                a.position + joint.def.local_anchor_a.rotate(a.angle),
                b.position + joint.def.local_anchor_b.rotate(b.angle),
            );
        }
    }
}
