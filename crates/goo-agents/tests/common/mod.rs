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

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use goo_agents::{AgentContext, AgentParams, AgentRegistry};
use goo_core::agent::AgentId;
use goo_core::event::{
    ContactEvent, Event, EventBus, EventData, EventKind, EventListener, EventPtr, ListenerHandle,
};
use goo_core::math::Vec2;
use goo_core::physics::{BodyHandle, ContactId, ContactPhase, ShapeHandle};
use goo_infra::NativeWorld;
use goo_lanes::physics_lane::{PhysicsBridge, PhysicsConfig, PhysicsWorld};

/// Records every event of the kinds it is registered for.
#[derive(Default)]
pub struct Recorder {
    pub events: Vec<EventPtr>,
}

impl Recorder {
    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }
}

impl EventListener<PhysicsWorld> for Recorder {
    fn handle_event(
        &mut self,
        event: &EventPtr,
        _bus: &mut EventBus<PhysicsWorld>,
        _ctx: &mut PhysicsWorld,
    ) -> bool {
        self.events.push(event.clone());
        false
    }
}

/// A registry wired to a bus and a zero-gravity native world.
pub struct Harness {
    pub bus: EventBus<PhysicsWorld>,
    pub bridge: PhysicsBridge,
    pub registry: Rc<RefCell<AgentRegistry>>,
    pub recorder: Rc<RefCell<Recorder>>,
}

impl Harness {
    pub fn new() -> Self {
        let config = PhysicsConfig {
            gravity: Vec2::ZERO,
            ..Default::default()
        };
        let mut bus = EventBus::new();
        let bridge = PhysicsBridge::new(Box::new(NativeWorld::default()), config);
        let registry = Rc::new(RefCell::new(AgentRegistry::new()));
        AgentRegistry::attach(&registry, &mut bus).unwrap();

        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let handle: ListenerHandle<PhysicsWorld> = recorder.clone();
        for kind in [
            EventKind::GameOver,
            EventKind::BlobHealthChanged,
            EventKind::Collected,
            EventKind::BlobDeath,
        ] {
            bus.add_listener(&handle, kind).unwrap();
        }

        Self {
            bus,
            bridge,
            registry,
            recorder,
        }
    }

    pub fn create(&mut self, name: &str, params: AgentParams) -> AgentId {
        let mut ctx = AgentContext::new(self.bridge.world_mut(), &mut self.bus);
        self.registry
            .borrow_mut()
            .create_agent(name, params, &mut ctx)
            .unwrap()
    }

    /// Agent update followed by the deferred drain, without stepping physics.
    pub fn tick_agents(&mut self, dt: f32) {
        {
            let mut ctx = AgentContext::new(self.bridge.world_mut(), &mut self.bus);
            self.registry.borrow_mut().update_agents(dt, &mut ctx);
        }
        self.bus.update(dt, self.bridge.world_mut());
    }

    /// Full tick: physics, agents, deferred drain.
    pub fn tick(&mut self, dt: f32) {
        self.bridge.update(dt, &mut self.bus);
        self.tick_agents(dt);
    }

    pub fn queue(&mut self, data: EventData) {
        let event = self.bus.stamp(data);
        self.bus.queue_event(event).unwrap();
    }

    pub fn trigger(&mut self, data: EventData) -> bool {
        let event = Event::shared(self.bus.now(), data);
        self.bus.trigger_event(&event, self.bridge.world_mut())
    }

    pub fn world(&self) -> &PhysicsWorld {
        self.bridge.world()
    }
}

/// A contact between two bodies with the given phase and normal impulse.
pub fn contact(
    phase: ContactPhase,
    (body_a, owner_a): (BodyHandle, Option<AgentId>),
    (body_b, owner_b): (BodyHandle, Option<AgentId>),
    normal_impulse: f32,
) -> EventData {
    EventData::Collision(ContactEvent {
        phase,
        shape_a: ShapeHandle(body_a.0),
        shape_b: ShapeHandle(body_b.0),
        body_a,
        body_b,
        owner_a,
        owner_b,
        id: ContactId(0),
        position: Vec2::ZERO,
        normal: Vec2::Y,
        separation: -0.01,
        normal_impulse,
        tangent_impulse: 0.0,
    })
}
