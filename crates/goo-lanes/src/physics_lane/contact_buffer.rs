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

use std::collections::BTreeMap;

use goo_core::agent::AgentId;
use goo_core::event::{ContactEvent, EventData};
use goo_core::physics::{
    BodyHandle, ContactId, ContactListener, ContactPhase, ContactPoint, ShapeHandle,
};

use super::PhysicsWorld;

/// Ordering key of a buffered contact record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContactKey {
    /// First shape.
    pub shape_a: ShapeHandle,
    /// Second shape.
    pub shape_b: ShapeHandle,
    /// Point within the pair manifold.
    pub id: ContactId,
    /// Transition the point went through.
    pub phase: ContactPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViolationKey {
    Agent(AgentId),
    Body(BodyHandle),
}

/// Collects simulator callbacks during one simulator step.
///
/// Repeated callbacks for the same point and phase overwrite each other, so
/// each survives as a single record.
#[derive(Debug, Default)]
pub struct ContactBuffer {
    records: BTreeMap<ContactKey, ContactPoint>,
    violations: Vec<BodyHandle>,
}

impl ContactBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffered contact records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.violations.is_empty()
    }

    /// Discards everything buffered.
    pub fn clear(&mut self) {
        self.records.clear();
        self.violations.clear();
    }

    fn record(&mut self, phase: ContactPhase, point: &ContactPoint) {
        let key = ContactKey {
            shape_a: point.shape_a,
            shape_b: point.shape_b,
            id: point.id,
            phase,
        };
        self.records.insert(key, *point);
    }

    /// Empties the buffer into event payloads, contacts first in key order,
    /// then one out-of-limits payload per distinct owner.
    pub fn drain(&mut self, world: &PhysicsWorld) -> Vec<EventData> {
        let mut events = Vec::with_capacity(self.records.len() + self.violations.len());
        for (key, point) in std::mem::take(&mut self.records) {
            events.push(EventData::Collision(ContactEvent {
                phase: key.phase,
                shape_a: point.shape_a,
                shape_b: point.shape_b,
                body_a: point.body_a,
                body_b: point.body_b,
                owner_a: world.owner_of(point.body_a),
                owner_b: world.owner_of(point.body_b),
                id: point.id,
                position: point.position,
                normal: point.normal,
                separation: point.separation,
                normal_impulse: point.normal_impulse,
                tangent_impulse: point.tangent_impulse,
            }));
        }

        let mut seen: Vec<ViolationKey> = Vec::new();
        for body in std::mem::take(&mut self.violations) {
            let agent = world.owner_of(body);
            let key = match agent {
                Some(agent) => ViolationKey::Agent(agent),
                None => ViolationKey::Body(body),
            };
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            events.push(EventData::OutOfLimits { agent, body });
        }
        events
    }
}

impl ContactListener for ContactBuffer {
    fn add(&mut self, point: &ContactPoint) {
        self.record(ContactPhase::Added, point);
    }

    fn persist(&mut self, point: &ContactPoint) {
        self.record(ContactPhase::Persisted, point);
    }

    fn remove(&mut self, point: &ContactPoint) {
        self.record(ContactPhase::Removed, point);
    }

    fn result(&mut self, point: &ContactPoint) {
        self.record(ContactPhase::Result, point);
    }

    fn violation(&mut self, body: BodyHandle) {
        self.violations.push(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goo_core::event::EventKind;
    use goo_core::math::Vec2;
    use goo_core::physics::{BodyDef, ShapeDef};
    use goo_infra::NativeWorld;

    fn point(world: &mut PhysicsWorld) -> ContactPoint {
        let a = world
            .create_body(
                &BodyDef {
                    owner: Some(AgentId::new(1, 0)),
                    shapes: vec![ShapeDef::circle(0.5)],
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        let b = world
            .create_body(
                &BodyDef {
                    shapes: vec![ShapeDef::circle(0.5)],
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        ContactPoint {
            shape_a: world.simulator().body_shapes(a)[0],
            shape_b: world.simulator().body_shapes(b)[0],
            body_a: a,
            body_b: b,
            id: ContactId(0),
            position: Vec2::ZERO,
            normal: Vec2::X,
            separation: -0.01,
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
        }
    }

    #[test]
    fn test_repeated_persist_collapses_into_one_record() {
        let mut world = PhysicsWorld::new(Box::new(NativeWorld::new(Vec2::ZERO)));
        let p = point(&mut world);
        let mut buffer = ContactBuffer::new();
        for _ in 0..5 {
            buffer.persist(&p);
        }
        buffer.add(&p);

        let events = buffer.drain(&world);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind(), EventKind::NewCollision);
        assert_eq!(events[1].kind(), EventKind::PersistentCollision);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_drain_resolves_owners() {
        let mut world = PhysicsWorld::new(Box::new(NativeWorld::new(Vec2::ZERO)));
        let p = point(&mut world);
        let mut buffer = ContactBuffer::new();
        buffer.result(&p);

        let events = buffer.drain(&world);
        let EventData::Collision(contact) = &events[0] else {
            panic!("expected a collision payload");
        };
        assert_eq!(contact.owner_a, Some(AgentId::new(1, 0)));
        assert_eq!(contact.owner_b, None);
        assert_eq!(contact.phase, ContactPhase::Result);
    }

    #[test]
    fn test_violations_dedup_by_owner_then_body() {
        let mut world = PhysicsWorld::new(Box::new(NativeWorld::new(Vec2::ZERO)));
        let p = point(&mut world);
        let mut buffer = ContactBuffer::new();
        buffer.violation(p.body_a);
        buffer.violation(p.body_b);
        buffer.violation(p.body_b);
        buffer.violation(p.body_a);

        let events = buffer.drain(&world);
        assert_eq!(
            events,
            vec![
                EventData::OutOfLimits {
                    agent: Some(AgentId::new(1, 0)),
                    body: p.body_a,
                },
                EventData::OutOfLimits {
                    agent: None,
                    body: p.body_b,
                },
            ]
        );
    }
}
