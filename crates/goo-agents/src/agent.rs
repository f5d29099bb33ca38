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

//! The agent contract shared by every game entity type.

use std::any::Any;

use goo_core::agent::{AgentId, AgentType};
use goo_core::event::{ContactEvent, EventBus, EventData, EventPtr};
use goo_core::physics::{BodyHandle, ContactPhase};
use goo_lanes::physics_lane::{PhysicsError, PhysicsWorld};
use thiserror::Error;

/// Errors raised while creating or looking up agents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    /// An agent with this name is already registered.
    #[error("an agent named '{0}' already exists")]
    DuplicateName(String),
    /// No live agent carries this name.
    #[error("no agent named '{0}'")]
    UnknownAgent(String),
    /// The agent could not set up its physics bodies.
    #[error("physics setup of agent '{name}' failed: {source}")]
    Physics {
        /// Name of the agent.
        name: String,
        /// Underlying physics error.
        #[source]
        source: PhysicsError,
    },
}

impl AgentError {
    /// Wraps a physics error raised while setting up `name`.
    pub fn physics(name: &str, source: PhysicsError) -> Self {
        Self::Physics {
            name: name.to_owned(),
            source,
        }
    }
}

/// Services an agent may use while handling a callback.
pub struct AgentContext<'a> {
    /// The physics world.
    pub physics: &'a mut PhysicsWorld,
    /// The runtime event bus.
    pub bus: &'a mut EventBus<PhysicsWorld>,
}

impl<'a> AgentContext<'a> {
    /// Bundles the physics world and the bus.
    pub fn new(physics: &'a mut PhysicsWorld, bus: &'a mut EventBus<PhysicsWorld>) -> Self {
        Self { physics, bus }
    }

    /// Stamps `data` and appends it to the deferred queue.
    ///
    /// ## Returns
    /// `false` if nobody listens to the kind and the event was dropped.
    pub fn queue(&mut self, data: EventData) -> bool {
        let event = self.bus.stamp(data);
        self.bus.queue_event(event).is_ok()
    }

    /// Stamps `data` and delivers it synchronously.
    ///
    /// ## Returns
    /// Whether a listener consumed it.
    pub fn trigger(&mut self, data: EventData) -> bool {
        let event = self.bus.stamp(data);
        self.bus.trigger_event(&event, self.physics)
    }
}

/// Identity of the agent on the other side of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peer {
    /// The other agent.
    pub id: AgentId,
    /// Its type.
    pub agent_type: AgentType,
    /// Points it is worth when collected.
    pub points: u32,
}

/// A contact seen from one of its two bodies.
#[derive(Debug, Clone, Copy)]
pub struct ContactView<'a> {
    /// The raw contact.
    pub contact: &'a ContactEvent,
    /// The body owned by the receiving agent.
    pub subject: BodyHandle,
    /// The body on the other side.
    pub other: BodyHandle,
    /// The live agent owning `other`, if any.
    pub peer: Option<Peer>,
}

impl ContactView<'_> {
    /// Phase of the contact.
    pub fn phase(&self) -> ContactPhase {
        self.contact.phase
    }
}

/// A game entity driven by the registry.
///
/// Agents are built from their params with an id and a name, then `create`d
/// once. The registry calls [`Agent::update_state`] every tick while the agent
/// is alive and [`Agent::destroy`] once it is not.
pub trait Agent {
    /// Unique name of the agent.
    fn name(&self) -> &str;

    /// Generational id used as the owner tag of the agent's bodies.
    fn id(&self) -> AgentId;

    /// Variant of the agent, used to pick broadcast audiences.
    fn agent_type(&self) -> AgentType;

    /// Creates the agent's bodies.
    fn create(&mut self, ctx: &mut AgentContext<'_>) -> Result<(), AgentError>;

    /// Advances the agent by `dt`.
    fn update_state(&mut self, dt: f32, ctx: &mut AgentContext<'_>);

    /// Reacts to a contact involving one of the agent's bodies.
    ///
    /// ## Returns
    /// Whether the agent handled the contact.
    fn on_collision(&mut self, view: &ContactView<'_>, ctx: &mut AgentContext<'_>) -> bool {
        let _ = (view, ctx);
        false
    }

    /// Reacts to a broadcast event addressed to the agent's type.
    fn on_event(&mut self, event: &EventPtr, ctx: &mut AgentContext<'_>) -> bool {
        let _ = (event, ctx);
        false
    }

    /// Reacts to one of its bodies leaving the world limits.
    fn on_out_of_limits(&mut self, body: BodyHandle, ctx: &mut AgentContext<'_>) -> bool;

    /// Dead agents are removed on the next registry update.
    fn is_alive(&self) -> bool;

    /// Releases everything the agent created.
    fn destroy(&mut self, ctx: &mut AgentContext<'_>);

    /// Every body currently owned by the agent.
    fn bodies(&self) -> Vec<BodyHandle>;

    /// Points the agent is worth when collected.
    fn points(&self) -> u32 {
        0
    }

    /// Render layer requested through `RenderInLayer`.
    fn render_layer(&self) -> i32 {
        0
    }

    /// Allows downcasting to concrete agent types.
    fn as_any(&self) -> &dyn Any;

    /// Allows mutable downcasting to concrete agent types.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
