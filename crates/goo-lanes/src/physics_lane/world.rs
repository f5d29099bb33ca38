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

use std::collections::HashMap;

use goo_core::agent::AgentId;
use goo_core::math::{Aabb, Vec2};
use goo_core::physics::{
    BodyDef, BodyHandle, BodyState, BodyType, DebugDraw, JointDef, JointHandle, Simulator,
};
use thiserror::Error;

/// Hard cap on the number of bodies an AABB query returns.
pub const MAX_QUERY_BODIES: usize = 64;

/// Half size of the box used by point queries.
const POINT_QUERY_EXTENT: f32 = 0.001;

/// Usage errors of the [`PhysicsWorld`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhysicsError {
    /// A body with this name already exists.
    #[error("a body named '{0}' already exists")]
    DuplicateBodyName(String),
    /// A joint with this name already exists.
    #[error("a joint named '{0}' already exists")]
    DuplicateJointName(String),
    /// The body handle is not (or no longer) valid.
    #[error("unknown {0}")]
    UnknownBody(BodyHandle),
    /// No body carries this name.
    #[error("no body named '{0}'")]
    UnknownBodyName(String),
    /// The joint handle is not (or no longer) valid.
    #[error("unknown {0}")]
    UnknownJoint(JointHandle),
    /// No joint carries this name.
    #[error("no joint named '{0}'")]
    UnknownJointName(String),
    /// The simulator refused to create the joint.
    #[error("joint between {0} and {1} was rejected")]
    JointRejected(BodyHandle, BodyHandle),
}

fn logged<T>(err: PhysicsError) -> Result<T, PhysicsError> {
    log::warn!("{err}");
    Err(err)
}

/// Name-keyed resource layer around a [`Simulator`].
///
/// Also the dispatch context of the runtime event bus: every listener gets
/// mutable access to it while handling an event.
pub struct PhysicsWorld {
    simulator: Box<dyn Simulator>,
    body_names: HashMap<String, BodyHandle>,
    joint_names: HashMap<String, JointHandle>,
    owners: HashMap<BodyHandle, AgentId>,
    next_group: i32,
    stepped: bool,
}

impl PhysicsWorld {
    /// Wraps a simulator backend.
    pub fn new(simulator: Box<dyn Simulator>) -> Self {
        Self {
            simulator,
            body_names: HashMap::new(),
            joint_names: HashMap::new(),
            owners: HashMap::new(),
            next_group: 0,
            stepped: false,
        }
    }

    /// Read access to the backend.
    pub fn simulator(&self) -> &dyn Simulator {
        self.simulator.as_ref()
    }

    /// Write access to the backend.
    pub fn simulator_mut(&mut self) -> &mut dyn Simulator {
        self.simulator.as_mut()
    }

    /// Whether the last bridge update advanced the simulator at least once.
    pub fn physics_stepped(&self) -> bool {
        self.stepped
    }

    pub(crate) fn set_stepped(&mut self, stepped: bool) {
        self.stepped = stepped;
    }

    /// Hands out a fresh negative collision group.
    pub fn allocate_group(&mut self) -> i32 {
        self.next_group -= 1;
        self.next_group
    }

    /// Creates a body, optionally registered under `name`.
    pub fn create_body(
        &mut self,
        def: &BodyDef,
        name: Option<&str>,
    ) -> Result<BodyHandle, PhysicsError> {
        if let Some(name) = name {
            if self.body_names.contains_key(name) {
                return logged(PhysicsError::DuplicateBodyName(name.to_owned()));
            }
        }
        let handle = self.simulator.create_body(def);
        if let Some(name) = name {
            self.body_names.insert(name.to_owned(), handle);
        }
        if let Some(owner) = def.owner {
            self.owners.insert(handle, owner);
        }
        Ok(handle)
    }

    /// Destroys a body together with its shapes and joints.
    pub fn destroy_body(&mut self, body: BodyHandle) -> Result<(), PhysicsError> {
        if !self.simulator.destroy_body(body) {
            return logged(PhysicsError::UnknownBody(body));
        }
        self.body_names.retain(|_, b| *b != body);
        self.owners.remove(&body);
        let simulator = &self.simulator;
        self.joint_names
            .retain(|_, joint| simulator.joint_bodies(*joint).is_some());
        Ok(())
    }

    /// Destroys the body registered under `name`.
    pub fn destroy_body_by_name(&mut self, name: &str) -> Result<(), PhysicsError> {
        match self.body(name) {
            Some(body) => self.destroy_body(body),
            None => logged(PhysicsError::UnknownBodyName(name.to_owned())),
        }
    }

    /// Looks a body up by name.
    pub fn body(&self, name: &str) -> Option<BodyHandle> {
        self.body_names.get(name).copied()
    }

    /// Creates a joint, optionally registered under `name`.
    pub fn create_joint(
        &mut self,
        def: &JointDef,
        name: Option<&str>,
    ) -> Result<JointHandle, PhysicsError> {
        if let Some(name) = name {
            if self.joint_names.contains_key(name) {
                return logged(PhysicsError::DuplicateJointName(name.to_owned()));
            }
        }
        let Some(handle) = self.simulator.create_joint(def) else {
            return logged(PhysicsError::JointRejected(def.body_a, def.body_b));
        };
        if let Some(name) = name {
            self.joint_names.insert(name.to_owned(), handle);
        }
        Ok(handle)
    }

    /// Destroys a joint.
    pub fn destroy_joint(&mut self, joint: JointHandle) -> Result<(), PhysicsError> {
        if !self.simulator.destroy_joint(joint) {
            return logged(PhysicsError::UnknownJoint(joint));
        }
        self.joint_names.retain(|_, j| *j != joint);
        Ok(())
    }

    /// Destroys the joint registered under `name`.
    pub fn destroy_joint_by_name(&mut self, name: &str) -> Result<(), PhysicsError> {
        match self.joint(name) {
            Some(joint) => self.destroy_joint(joint),
            None => logged(PhysicsError::UnknownJointName(name.to_owned())),
        }
    }

    /// Looks a joint up by name.
    pub fn joint(&self, name: &str) -> Option<JointHandle> {
        self.joint_names.get(name).copied()
    }

    /// The agent tagged as owner of `body`.
    pub fn owner_of(&self, body: BodyHandle) -> Option<AgentId> {
        self.owners.get(&body).copied()
    }

    /// Re-tags the owner of a body.
    pub fn set_owner(&mut self, body: BodyHandle, owner: Option<AgentId>) {
        match owner {
            Some(agent) => {
                self.owners.insert(body, agent);
            }
            None => {
                self.owners.remove(&body);
            }
        }
    }

    /// Returns `true` if the body exists.
    pub fn contains_body(&self, body: BodyHandle) -> bool {
        self.simulator.contains_body(body)
    }

    /// Number of live bodies.
    pub fn body_count(&self) -> usize {
        self.simulator.body_count()
    }

    /// Kinematic state of a body.
    pub fn body_state(&self, body: BodyHandle) -> Option<BodyState> {
        self.simulator.body_state(body)
    }

    /// Position of a body.
    pub fn position(&self, body: BodyHandle) -> Option<Vec2> {
        self.simulator.body_state(body).map(|s| s.position)
    }

    /// Applies a force at the body origin.
    pub fn apply_force(&mut self, body: BodyHandle, force: Vec2) -> bool {
        match self.position(body) {
            Some(p) => self.simulator.apply_force(body, force, p),
            None => false,
        }
    }

    /// Applies an impulse at the body origin.
    pub fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2) -> bool {
        match self.position(body) {
            Some(p) => self.simulator.apply_impulse(body, impulse, p),
            None => false,
        }
    }

    /// Overwrites the linear velocity of a body.
    pub fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec2) -> bool {
        self.simulator.set_linear_velocity(body, velocity)
    }

    /// Teleports a body.
    pub fn set_transform(&mut self, body: BodyHandle, position: Vec2, angle: f32) -> bool {
        self.simulator.set_transform(body, position, angle)
    }

    /// Rest length of a joint.
    pub fn joint_length(&self, joint: JointHandle) -> Option<f32> {
        self.simulator.joint_length(joint)
    }

    /// Changes the rest length of a joint.
    pub fn set_joint_length(&mut self, joint: JointHandle, length: f32) -> bool {
        self.simulator.set_joint_length(joint, length)
    }

    /// Turns every shape of a body into a sensor, or back into solids.
    pub fn set_body_sensor(&mut self, body: BodyHandle, sensor: bool) -> bool {
        let shapes = self.simulator.body_shapes(body);
        if shapes.is_empty() {
            return false;
        }
        for shape in shapes {
            self.simulator.set_shape_sensor(shape, sensor);
            self.simulator.refilter(shape);
        }
        true
    }

    /// Rewrites the friction of every shape of `body` and refilters them so
    /// existing contacts use the new value.
    pub fn change_friction_of_body(
        &mut self,
        body: BodyHandle,
        friction: f32,
    ) -> Result<(), PhysicsError> {
        if !self.simulator.contains_body(body) {
            return logged(PhysicsError::UnknownBody(body));
        }
        for shape in self.simulator.body_shapes(body) {
            self.simulator.set_shape_friction(shape, friction);
            self.simulator.refilter(shape);
        }
        log::debug!("Friction of {body:?} set to {friction}.");
        Ok(())
    }

    /// First body with a shape containing `point`.
    pub fn query_point(&self, point: Vec2, exclude_static: bool) -> Option<BodyHandle> {
        let area = Aabb::from_center_half_extents(
            point,
            Vec2::new(POINT_QUERY_EXTENT, POINT_QUERY_EXTENT),
        );
        let mut hit = None;
        self.simulator.query_aabb(&area, &mut |shape| {
            let Some(body) = self.simulator.shape_body(shape) else {
                return true;
            };
            if exclude_static && self.is_static(body) {
                return true;
            }
            if self.simulator.test_point(shape, point) {
                hit = Some(body);
                return false;
            }
            true
        });
        hit
    }

    /// Distinct bodies overlapping `aabb`, at most [`MAX_QUERY_BODIES`].
    pub fn query_aabb(&self, aabb: &Aabb, exclude_static: bool) -> Vec<BodyHandle> {
        let mut bodies: Vec<BodyHandle> = Vec::new();
        self.simulator.query_aabb(aabb, &mut |shape| {
            let Some(body) = self.simulator.shape_body(shape) else {
                return true;
            };
            if (exclude_static && self.is_static(body)) || bodies.contains(&body) {
                return true;
            }
            bodies.push(body);
            bodies.len() < MAX_QUERY_BODIES
        });
        bodies
    }

    /// Feeds the simulator geometry to a debug renderer.
    pub fn debug_draw(&self, drawer: &mut dyn DebugDraw) {
        self.simulator.debug_draw(drawer);
    }

    fn is_static(&self, body: BodyHandle) -> bool {
        self.simulator
            .body_state(body)
            .map_or(true, |s| s.body_type == BodyType::Static)
    }
}
