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

//! Ownership and event routing for every live agent.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use goo_core::agent::{AgentId, AgentType};
use goo_core::event::{
    BusError, ContactEvent, EventBus, EventData, EventKind, EventListener, EventPtr,
    ListenerHandle,
};
use goo_lanes::physics_lane::PhysicsWorld;

use crate::agent::{Agent, AgentContext, AgentError, ContactView, Peer};
use crate::ai_agent::AiAgent;
use crate::collectable_agent::CollectableAgent;
use crate::params::AgentParams;
use crate::player_agent::PlayerAgent;
use crate::solid_agent::SolidAgent;

struct Slot {
    generation: u32,
    agent: Option<Box<dyn Agent>>,
}

/// Owns all agents by name and forwards bus events to them.
///
/// The registry is itself an [`EventListener`]: wrap it in `Rc<RefCell<_>>`
/// and [`AgentRegistry::attach`] it to the bus. Contacts go to the owners of
/// the two bodies, out-of-limits events to the owner of the body, and
/// commands to every agent of the audience type.
#[derive(Default)]
pub struct AgentRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    names: HashMap<String, AgentId>,
}

impl AgentRegistry {
    /// Every kind the registry routes.
    pub const ROUTED_KINDS: [EventKind; 13] = [
        EventKind::NewCollision,
        EventKind::PersistentCollision,
        EventKind::EndCollision,
        EventKind::CollisionResult,
        EventKind::OutOfLimits,
        EventKind::MoveBlob,
        EventKind::ShootBlob,
        EventKind::ChangeBlobControl,
        EventKind::SacrificeBlob,
        EventKind::RenderInLayer,
        EventKind::DropCollision,
        EventKind::BlobDeath,
        EventKind::Collected,
    ];

    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `registry` on `bus` for every routed kind.
    ///
    /// ## Returns
    /// The listener handle, to pass to [`EventBus::remove_listener_from_all`]
    /// on teardown.
    pub fn attach(
        registry: &Rc<RefCell<Self>>,
        bus: &mut EventBus<PhysicsWorld>,
    ) -> Result<ListenerHandle<PhysicsWorld>, BusError> {
        let handle: ListenerHandle<PhysicsWorld> = registry.clone();
        for kind in Self::ROUTED_KINDS {
            bus.add_listener(&handle, kind)?;
        }
        Ok(handle)
    }

    /// Builds, creates and stores a new agent.
    ///
    /// ## Arguments
    /// * `name` - Unique agent name.
    /// * `params` - Agent parameters; the variant selects the agent type.
    /// * `ctx` - Physics world and bus used by the agent's `create`.
    ///
    /// ## Returns
    /// The id of the new agent. A duplicate name or a failed `create` yields
    /// an error and no agent.
    pub fn create_agent(
        &mut self,
        name: &str,
        params: AgentParams,
        ctx: &mut AgentContext<'_>,
    ) -> Result<AgentId, AgentError> {
        if self.names.contains_key(name) {
            log::error!("Agent '{name}' already exists.");
            return Err(AgentError::DuplicateName(name.to_owned()));
        }

        let id = self.allocate();
        let mut agent: Box<dyn Agent> = match params {
            AgentParams::Solid(p) => Box::new(SolidAgent::new(name, id, p)),
            AgentParams::Ai(p) => Box::new(AiAgent::new(name, id, p)),
            AgentParams::Player(p) => Box::new(PlayerAgent::new(name, id, p)),
            AgentParams::Collectable(p) => Box::new(CollectableAgent::new(name, id, p)),
        };
        if let Err(err) = agent.create(ctx) {
            log::error!("Creating agent '{name}' failed: {err}");
            agent.destroy(ctx);
            self.release(id);
            return Err(err);
        }

        log::info!("Agent '{name}' ({}) created as {id}.", agent.agent_type());
        self.slots[id.index as usize].agent = Some(agent);
        self.names.insert(name.to_owned(), id);
        Ok(id)
    }

    fn allocate(&mut self) -> AgentId {
        match self.free.pop() {
            Some(index) => AgentId::new(index, self.slots[index as usize].generation),
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    agent: None,
                });
                AgentId::new((self.slots.len() - 1) as u32, 0)
            }
        }
    }

    fn release(&mut self, id: AgentId) {
        let slot = &mut self.slots[id.index as usize];
        slot.agent = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
    }

    /// Updates every alive agent and removes the ones found dead.
    ///
    /// An agent that dies during its own update stays stored until the next
    /// call.
    pub fn update_agents(&mut self, dt: f32, ctx: &mut AgentContext<'_>) {
        for index in 0..self.slots.len() {
            let Some(agent) = self.slots[index].agent.as_mut() else {
                continue;
            };
            if agent.is_alive() {
                agent.update_state(dt, ctx);
                continue;
            }
            let id = agent.id();
            if let Some(mut dead) = self.slots[index].agent.take() {
                log::debug!("Removing dead agent '{}'.", dead.name());
                dead.destroy(ctx);
                self.names.remove(dead.name());
            }
            self.release(id);
        }
    }

    /// Destroys every agent, alive or not.
    pub fn destroy_all(&mut self, ctx: &mut AgentContext<'_>) {
        for index in 0..self.slots.len() {
            if let Some(mut agent) = self.slots[index].agent.take() {
                agent.destroy(ctx);
                self.release(agent.id());
            }
        }
        self.names.clear();
        log::info!("All agents destroyed.");
    }

    /// Looks an agent up by name.
    pub fn agent(&self, name: &str) -> Option<&dyn Agent> {
        self.names.get(name).and_then(|id| self.agent_by_id(*id))
    }

    pub fn agent_mut(&mut self, name: &str) -> Option<&mut dyn Agent> {
        let id = *self.names.get(name)?;
        self.agent_by_id_mut(id)
    }

    /// Looks an agent up by name and downcasts it.
    pub fn agent_as<T: Agent + 'static>(&self, name: &str) -> Option<&T> {
        self.agent(name)?.as_any().downcast_ref::<T>()
    }

    /// Looks an agent up by id. Stale ids resolve to `None`.
    pub fn agent_by_id(&self, id: AgentId) -> Option<&dyn Agent> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.agent.as_deref())
    }

    pub fn agent_by_id_mut(&mut self, id: AgentId) -> Option<&mut dyn Agent> {
        match self.slots.get_mut(id.index as usize) {
            Some(slot) if slot.generation == id.generation => match slot.agent.as_mut() {
                Some(agent) => Some(agent.as_mut()),
                None => None,
            },
            _ => None,
        }
    }

    /// Whether `id` names a stored agent that is still alive.
    pub fn is_live(&self, id: AgentId) -> bool {
        self.agent_by_id(id).is_some_and(|agent| agent.is_alive())
    }

    /// Number of stored agents.
    pub fn live_count(&self) -> usize {
        self.names.len()
    }

    /// Names of the stored agents, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn live_mut(&mut self, id: AgentId) -> Option<&mut dyn Agent> {
        self.agent_by_id_mut(id).filter(|agent| agent.is_alive())
    }

    fn peer(&self, id: AgentId) -> Option<Peer> {
        self.agent_by_id(id)
            .filter(|agent| agent.is_alive())
            .map(|agent| Peer {
                id,
                agent_type: agent.agent_type(),
                points: agent.points(),
            })
    }

    fn route_contact(&mut self, contact: &ContactEvent, ctx: &mut AgentContext<'_>) -> bool {
        let sides = [
            (contact.body_a, contact.owner_a, contact.body_b, contact.owner_b),
            (contact.body_b, contact.owner_b, contact.body_a, contact.owner_a),
        ];
        let mut delivered = false;
        for (subject, owner, other, other_owner) in sides {
            let Some(owner) = owner else {
                continue;
            };
            let peer = other_owner.and_then(|id| self.peer(id));
            let Some(agent) = self.live_mut(owner) else {
                log::trace!("Contact for stale owner {owner} dropped.");
                continue;
            };
            let view = ContactView {
                contact,
                subject,
                other,
                peer,
            };
            agent.on_collision(&view, ctx);
            delivered = true;
        }
        delivered
    }

    fn broadcast(
        &mut self,
        event: &EventPtr,
        audience: &[AgentType],
        ctx: &mut AgentContext<'_>,
    ) -> usize {
        let mut handled = 0;
        for slot in &mut self.slots {
            let Some(agent) = slot.agent.as_mut() else {
                continue;
            };
            if agent.is_alive()
                && audience.contains(&agent.agent_type())
                && agent.on_event(event, ctx)
            {
                handled += 1;
            }
        }
        handled
    }
}

impl EventListener<PhysicsWorld> for AgentRegistry {
    fn listener_name(&self) -> &str {
        "agent registry"
    }

    fn handle_event(
        &mut self,
        event: &EventPtr,
        bus: &mut EventBus<PhysicsWorld>,
        physics: &mut PhysicsWorld,
    ) -> bool {
        let mut ctx = AgentContext::new(physics, bus);
        match event.data() {
            EventData::Collision(contact) => self.route_contact(contact, &mut ctx),
            EventData::OutOfLimits { agent, body } => {
                let Some(agent) = agent.and_then(|id| self.live_mut(id)) else {
                    return false;
                };
                agent.on_out_of_limits(*body, &mut ctx);
                true
            }
            EventData::MoveBlob { .. }
            | EventData::ShootBlob { .. }
            | EventData::ChangeBlobControl
            | EventData::SacrificeBlob => {
                self.broadcast(event, &[AgentType::Player], &mut ctx);
                false
            }
            EventData::DropCollision { .. } | EventData::Collected { .. } => {
                self.broadcast(event, &[AgentType::Collectable], &mut ctx);
                false
            }
            EventData::RenderInLayer { agent, .. } => {
                let audience = [AgentType::Generic, AgentType::Ai, AgentType::Collectable];
                let Some(id) = self.names.get(agent).copied() else {
                    log::warn!("RenderInLayer for unknown agent '{agent}'.");
                    return false;
                };
                if let Some(target) = self.live_mut(id) {
                    if audience.contains(&target.agent_type()) {
                        target.on_event(event, &mut ctx);
                    }
                }
                false
            }
            EventData::BlobDeath(_) => {
                self.broadcast(event, &[AgentType::Generic, AgentType::Ai], &mut ctx);
                false
            }
            EventData::BlobHealthChanged { .. } | EventData::GameOver { .. } => {
                debug_assert!(false, "{} is not routed to agents", event.kind());
                log::error!("{} reached the agent registry.", event.kind());
                false
            }
        }
    }
}
