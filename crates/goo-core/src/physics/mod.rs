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

//! # Physics Abstractions
//!
//! The contract between the runtime and a stepped 2D rigid-body simulator.
//!
//! The simulator itself is an external collaborator: concrete backends live in
//! `goo-infra`. Everything here is expressed in opaque handles so the runtime
//! never holds a pointer into the simulator's storage.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::math::{Aabb, Vec2};

/// Opaque handle to a rigid body in the simulator.
///
/// Backends pack a generation counter into the high bits so a handle is never
/// reused for a different body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub u64);

/// Opaque handle to a collision shape attached to a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShapeHandle(pub u64);

/// Opaque handle to a joint between two bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JointHandle(pub u64);

/// Identifies one contact point inside the manifold of a shape pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContactId(pub u32);

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (index, generation) = unpack_handle(self.0);
        write!(f, "body({index}v{generation})")
    }
}

impl fmt::Display for JointHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (index, generation) = unpack_handle(self.0);
        write!(f, "joint({index}v{generation})")
    }
}

/// Packs a slot index and a generation into a single handle value.
#[inline]
pub const fn pack_handle(index: u32, generation: u32) -> u64 {
    ((generation as u64) << 32) | index as u64
}

/// Splits a packed handle value back into `(index, generation)`.
#[inline]
pub const fn unpack_handle(raw: u64) -> (u32, u32) {
    (raw as u32, (raw >> 32) as u32)
}

/// Defines the type of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyType {
    /// Responds to forces and collisions.
    #[default]
    Dynamic,
    /// Fixed in place, does not move.
    Static,
    /// Moved by velocity only, ignores forces.
    Kinematic,
}

/// Supported collision geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Circle with a radius.
    Circle {
        /// Radius of the circle.
        radius: f32,
    },
    /// Oriented box given by its half-extents.
    Box {
        /// Half width and half height.
        half_extents: Vec2,
    },
}

/// Description for creating a collision shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeDef {
    /// Geometry of the shape.
    pub kind: ShapeKind,
    /// Position relative to the body origin.
    pub offset: Vec2,
    /// Rotation relative to the body, in radians.
    pub angle: f32,
    /// Mass per unit area.
    pub density: f32,
    /// Coulomb friction coefficient.
    pub friction: f32,
    /// Bounciness.
    pub restitution: f32,
    /// Sensors report contacts but never produce a collision response.
    pub sensor: bool,
    /// Shapes sharing the same negative group never collide with each other,
    /// shapes sharing the same positive group always do.
    pub group_index: i32,
}

impl Default for ShapeDef {
    fn default() -> Self {
        Self {
            kind: ShapeKind::Circle { radius: 0.5 },
            offset: Vec2::ZERO,
            angle: 0.0,
            density: 1.0,
            friction: 0.3,
            restitution: 0.0,
            sensor: false,
            group_index: 0,
        }
    }
}

impl ShapeDef {
    /// A circle shape centered on the body.
    pub fn circle(radius: f32) -> Self {
        Self {
            kind: ShapeKind::Circle { radius },
            ..Default::default()
        }
    }

    /// A box shape centered on the body.
    pub fn cuboid(half_width: f32, half_height: f32) -> Self {
        Self {
            kind: ShapeKind::Box {
                half_extents: Vec2::new(half_width, half_height),
            },
            ..Default::default()
        }
    }
}

/// Description for creating a rigid body together with its shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDef {
    /// Initial position of the body origin.
    pub position: Vec2,
    /// Initial rotation in radians.
    pub angle: f32,
    /// Body type.
    pub body_type: BodyType,
    /// Initial linear velocity.
    pub linear_velocity: Vec2,
    /// Initial angular velocity in radians per second.
    pub angular_velocity: f32,
    /// Linear velocity damping.
    pub linear_damping: f32,
    /// Angular velocity damping.
    pub angular_damping: f32,
    /// Multiplier applied to world gravity.
    pub gravity_scale: f32,
    /// Prevents the body from rotating.
    pub fixed_rotation: bool,
    /// The agent owning this body, if any.
    ///
    /// The tag is an identity, not a pointer: whoever reads it must check the
    /// agent is still alive before acting on it.
    pub owner: Option<AgentId>,
    /// Shapes created with the body.
    pub shapes: Vec<ShapeDef>,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            angle: 0.0,
            body_type: BodyType::Dynamic,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            gravity_scale: 1.0,
            fixed_rotation: false,
            owner: None,
            shapes: Vec::new(),
        }
    }
}

/// Description for creating a soft distance joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointDef {
    /// First body.
    pub body_a: BodyHandle,
    /// Second body.
    pub body_b: BodyHandle,
    /// Anchor on the first body, in its local frame.
    pub local_anchor_a: Vec2,
    /// Anchor on the second body, in its local frame.
    pub local_anchor_b: Vec2,
    /// Rest length between the anchors.
    pub length: f32,
    /// Mass-spring frequency in hertz. Zero makes the joint rigid.
    pub frequency_hz: f32,
    /// Damping ratio, 0 is undamped and 1 critically damped.
    pub damping_ratio: f32,
    /// Whether the connected bodies still collide with each other.
    pub collide_connected: bool,
}

impl JointDef {
    /// A distance joint between the origins of two bodies.
    pub fn distance(body_a: BodyHandle, body_b: BodyHandle, length: f32) -> Self {
        Self {
            body_a,
            body_b,
            local_anchor_a: Vec2::ZERO,
            local_anchor_b: Vec2::ZERO,
            length,
            frequency_hz: 0.0,
            damping_ratio: 0.0,
            collide_connected: false,
        }
    }
}

/// Snapshot of the kinematic state of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    /// Position of the body origin.
    pub position: Vec2,
    /// Rotation in radians.
    pub angle: f32,
    /// Linear velocity.
    pub linear_velocity: Vec2,
    /// Angular velocity.
    pub angular_velocity: f32,
    /// Body type.
    pub body_type: BodyType,
    /// Total mass, zero for static bodies.
    pub mass: f32,
}

/// The state transition a contact point went through during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContactPhase {
    /// The point started touching.
    Added,
    /// The point kept touching.
    Persisted,
    /// The point stopped touching.
    Removed,
    /// Solver output for the point, carries the impulses.
    Result,
}

/// One contact point as reported by the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// First shape of the pair.
    pub shape_a: ShapeHandle,
    /// Second shape of the pair.
    pub shape_b: ShapeHandle,
    /// Body of the first shape.
    pub body_a: BodyHandle,
    /// Body of the second shape.
    pub body_b: BodyHandle,
    /// Point identifier within the pair manifold.
    pub id: ContactId,
    /// World position of the point.
    pub position: Vec2,
    /// Contact normal, pointing from shape A to shape B.
    pub normal: Vec2,
    /// Negative when penetrating.
    pub separation: f32,
    /// Accumulated normal impulse (only meaningful for results).
    pub normal_impulse: f32,
    /// Accumulated friction impulse (only meaningful for results).
    pub tangent_impulse: f32,
}

/// Callbacks the simulator invokes while stepping.
///
/// A simulator may call `add`, `persist` and `remove` several times for the
/// same point within one step; consumers must not assume uniqueness.
pub trait ContactListener {
    /// A contact point started touching.
    fn add(&mut self, point: &ContactPoint);
    /// A contact point is still touching.
    fn persist(&mut self, point: &ContactPoint);
    /// A contact point stopped touching.
    fn remove(&mut self, point: &ContactPoint);
    /// Solver output for a touching point.
    fn result(&mut self, point: &ContactPoint);
    /// A body left the world bounds.
    fn violation(&mut self, body: BodyHandle);
}

/// Debug rendering seam. The core only ever reads simulator state through it.
pub trait DebugDraw {
    /// Draws a circle; `axis` is the body's local X axis in world space.
    fn draw_circle(&mut self, center: Vec2, radius: f32, axis: Vec2);
    /// Draws a closed polygon.
    fn draw_polygon(&mut self, vertices: &[Vec2]);
    /// Draws a line segment (joints).
    fn draw_segment(&mut self, a: Vec2, b: Vec2);
}

/// Interface contract for any 2D physics engine implementation.
///
/// Methods taking a handle return `false`/`None` when the handle is unknown.
pub trait Simulator {
    /// Advances the simulation by `dt` seconds, reporting contacts to `listener`.
    fn step(
        &mut self,
        dt: f32,
        velocity_iterations: u32,
        position_iterations: u32,
        listener: &mut dyn ContactListener,
    );

    /// Returns the global gravity vector.
    fn gravity(&self) -> Vec2;

    /// Sets the global gravity vector.
    fn set_gravity(&mut self, gravity: Vec2);

    /// Returns the world limits, if any.
    fn world_bounds(&self) -> Option<Aabb>;

    /// Sets the world limits; bodies leaving them are reported as violations.
    fn set_world_bounds(&mut self, bounds: Option<Aabb>);

    /// Adds a rigid body and the shapes listed in its definition.
    fn create_body(&mut self, def: &BodyDef) -> BodyHandle;

    /// Removes a body together with its shapes and joints.
    fn destroy_body(&mut self, body: BodyHandle) -> bool;

    /// Attaches a new shape to an existing body.
    fn create_shape(&mut self, body: BodyHandle, def: &ShapeDef) -> Option<ShapeHandle>;

    /// Detaches and removes a shape.
    fn destroy_shape(&mut self, shape: ShapeHandle) -> bool;

    /// Returns `true` if the body exists.
    fn contains_body(&self, body: BodyHandle) -> bool;

    /// Lists the shapes attached to a body.
    fn body_shapes(&self, body: BodyHandle) -> Vec<ShapeHandle>;

    /// Returns the body a shape is attached to.
    fn shape_body(&self, shape: ShapeHandle) -> Option<BodyHandle>;

    /// Returns the kinematic state of a body.
    fn body_state(&self, body: BodyHandle) -> Option<BodyState>;

    /// Teleports a body.
    fn set_transform(&mut self, body: BodyHandle, position: Vec2, angle: f32) -> bool;

    /// Overwrites the linear velocity of a body.
    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec2) -> bool;

    /// Applies a force at a world point, consumed by the next step.
    fn apply_force(&mut self, body: BodyHandle, force: Vec2, point: Vec2) -> bool;

    /// Applies an impulse at a world point, changing velocity immediately.
    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vec2, point: Vec2) -> bool;

    /// Returns the friction coefficient of a shape.
    fn shape_friction(&self, shape: ShapeHandle) -> Option<f32>;

    /// Rewrites the friction coefficient of a shape.
    fn set_shape_friction(&mut self, shape: ShapeHandle, friction: f32) -> bool;

    /// Turns a shape into a sensor or back into a solid.
    fn set_shape_sensor(&mut self, shape: ShapeHandle, sensor: bool) -> bool;

    /// Drops cached contact data for a shape so it is rebuilt from current properties.
    fn refilter(&mut self, shape: ShapeHandle) -> bool;

    /// Adds a distance joint.
    fn create_joint(&mut self, def: &JointDef) -> Option<JointHandle>;

    /// Removes a joint.
    fn destroy_joint(&mut self, joint: JointHandle) -> bool;

    /// Returns the rest length of a joint.
    fn joint_length(&self, joint: JointHandle) -> Option<f32>;

    /// Changes the rest length of a joint.
    fn set_joint_length(&mut self, joint: JointHandle, length: f32) -> bool;

    /// Returns the two bodies connected by a joint.
    fn joint_bodies(&self, joint: JointHandle) -> Option<(BodyHandle, BodyHandle)>;

    /// Reports every shape whose bounds overlap `aabb`; the callback returns
    /// `false` to stop the query.
    fn query_aabb(&self, aabb: &Aabb, callback: &mut dyn FnMut(ShapeHandle) -> bool);

    /// Returns `true` if `point` lies inside the shape.
    fn test_point(&self, shape: ShapeHandle, point: Vec2) -> bool;

    /// Number of live bodies.
    fn body_count(&self) -> usize;

    /// Number of live joints.
    fn joint_count(&self) -> usize;

    /// Feeds every shape and joint to a debug renderer.
    fn debug_draw(&self, drawer: &mut dyn DebugDraw);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_packing_roundtrip_keeps_generation() {
        let raw = pack_handle(7, 3);
        assert_eq!(unpack_handle(raw), (7, 3));
        assert_ne!(pack_handle(7, 3), pack_handle(7, 4));
    }

    #[test]
    fn test_contact_phase_order_is_stable() {
        let mut phases = vec![
            ContactPhase::Result,
            ContactPhase::Added,
            ContactPhase::Removed,
            ContactPhase::Persisted,
        ];
        phases.sort();
        assert_eq!(
            phases,
            vec![
                ContactPhase::Added,
                ContactPhase::Persisted,
                ContactPhase::Removed,
                ContactPhase::Result
            ]
        );
    }
}
