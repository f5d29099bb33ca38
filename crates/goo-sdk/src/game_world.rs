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

//! The `GameWorld` facade: one object owning the event bus, the physics
//! bridge and the agent registry, stepping them in a fixed order.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use goo_agents::{Agent, AgentContext, AgentError, AgentParams, AgentRegistry};
use goo_core::agent::AgentId;
use goo_core::event::{BusError, EventBus, EventData, EventKind, ListenerHandle};
use goo_core::math::Vec2;
use goo_core::physics::{DebugDraw, Simulator};
use goo_infra::NativeWorld;
use goo_lanes::physics_lane::{PhysicsBridge, PhysicsConfig, PhysicsWorld};

use crate::command::{CommandInbox, PlayerCommand};
use crate::config::{ConfigError, GameConfig};

/// A running game.
///
/// Each [`GameWorld::tick`] runs, in order:
/// 1. the player commands waiting in the inbox are queued on the bus;
/// 2. the physics bridge steps and triggers contact and limit events;
/// 3. every live agent updates, dead agents are removed;
/// 4. the bus drains the events queued since the previous tick.
///
/// # Examples
///
/// ```rust,ignore
/// let config = GameConfig::load("scenes/demo.ron")?;
/// let mut world = GameWorld::from_config(&config)?;
/// world.move_blob(Vec2::X);
/// world.tick(1.0 / 60.0);
/// ```
pub struct GameWorld {
    bus: EventBus<PhysicsWorld>,
    bridge: PhysicsBridge,
    registry: Rc<RefCell<AgentRegistry>>,
    registry_listener: Option<ListenerHandle<PhysicsWorld>>,
    inbox: CommandInbox,
    ticks: u64,
}

impl GameWorld {
    /// Creates an empty world over `simulator`.
    ///
    /// ## Errors
    /// Fails only if the registry cannot be registered on the fresh bus.
    pub fn new(simulator: Box<dyn Simulator>, physics: PhysicsConfig) -> Result<Self, BusError> {
        let mut bus = EventBus::new();
        let registry = Rc::new(RefCell::new(AgentRegistry::new()));
        let registry_listener = AgentRegistry::attach(&registry, &mut bus)?;
        log::info!("Game world created.");
        Ok(Self {
            bus,
            bridge: PhysicsBridge::new(simulator, physics),
            registry,
            registry_listener: Some(registry_listener),
            inbox: CommandInbox::new(),
            ticks: 0,
        })
    }

    /// Builds a world on the native simulator and spawns every agent of
    /// `config`, in order.
    pub fn from_config(config: &GameConfig) -> Result<Self, ConfigError> {
        let simulator = Box::new(NativeWorld::new(config.physics.gravity));
        Self::from_config_with(simulator, config)
    }

    /// Same as [`GameWorld::from_config`] with a caller-provided simulator.
    pub fn from_config_with(
        simulator: Box<dyn Simulator>,
        config: &GameConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut world = Self::new(simulator, config.physics.clone())?;
        for spec in &config.agents {
            world.create_agent(&spec.name, spec.params.clone())?;
        }
        Ok(world)
    }

    /// Creates and stores one agent.
    pub fn create_agent(&mut self, name: &str, params: AgentParams) -> Result<AgentId, AgentError> {
        let mut ctx = AgentContext::new(self.bridge.world_mut(), &mut self.bus);
        self.registry.borrow_mut().create_agent(name, params, &mut ctx)
    }

    /// Advances the game by `dt` seconds.
    ///
    /// ## Returns
    /// The number of physics steps taken.
    pub fn tick(&mut self, dt: f32) -> u32 {
        self.drain_inbox();
        let steps = self.bridge.update(dt, &mut self.bus);
        {
            let mut ctx = AgentContext::new(self.bridge.world_mut(), &mut self.bus);
            self.registry.borrow_mut().update_agents(dt, &mut ctx);
        }
        let drained = self.bus.update(dt, self.bridge.world_mut());
        self.ticks += 1;
        log::trace!("Tick {}: {steps} step(s), {drained} event(s).", self.ticks);
        steps
    }

    fn drain_inbox(&mut self) {
        for command in self.inbox.drain() {
            self.queue(command.into_event());
        }
    }

    fn queue(&mut self, data: EventData) -> bool {
        let event = self.bus.stamp(data);
        match self.bus.queue_event(event) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Command not queued: {err}");
                false
            }
        }
    }

    /// Pushes the controlled blob along `direction` on the next tick.
    pub fn move_blob(&mut self, direction: Vec2) -> bool {
        self.queue(EventData::MoveBlob { direction })
    }

    /// Throws part of the main blob toward `target`. `force` is clamped to
    /// `0..=1` by the player.
    pub fn shoot_blob(&mut self, target: Vec2, force: f32) -> bool {
        self.queue(EventData::ShootBlob { target, force })
    }

    pub fn change_blob_control(&mut self) -> bool {
        self.queue(EventData::ChangeBlobControl)
    }

    pub fn sacrifice_blob(&mut self) -> bool {
        self.queue(EventData::SacrificeBlob)
    }

    /// Moves a named agent to a render layer on the next tick.
    pub fn render_in_layer(&mut self, agent: &str, layer: i32) -> bool {
        self.queue(EventData::RenderInLayer {
            agent: agent.to_owned(),
            layer,
        })
    }

    /// Turns collectables into sensors: one by name, or all of them.
    pub fn drop_collision(&mut self, agent: Option<&str>) -> bool {
        self.queue(EventData::DropCollision {
            agent: agent.map(str::to_owned),
        })
    }

    /// A sender for input threads. Commands are picked up at the start of
    /// the next tick.
    pub fn command_sender(&self) -> flume::Sender<PlayerCommand> {
        self.inbox.sender()
    }

    /// The inbox itself, for same-thread input.
    pub fn inbox(&self) -> &CommandInbox {
        &self.inbox
    }

    /// Registers an outside observer, typically presentation code watching
    /// `BlobHealthChanged`, `Collected` or `GameOver`.
    pub fn add_listener(
        &mut self,
        listener: &ListenerHandle<PhysicsWorld>,
        kind: EventKind,
    ) -> Result<(), BusError> {
        self.bus.add_listener(listener, kind)
    }

    /// Unregisters an observer from every kind.
    pub fn remove_listener(&mut self, listener: &ListenerHandle<PhysicsWorld>) -> usize {
        self.bus.remove_listener_from_all(listener)
    }

    pub fn registry(&self) -> Ref<'_, AgentRegistry> {
        self.registry.borrow()
    }

    pub fn registry_mut(&self) -> RefMut<'_, AgentRegistry> {
        self.registry.borrow_mut()
    }

    /// Looks an agent up by name and downcasts it.
    pub fn agent_as<T: Agent + 'static>(&self, name: &str) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.registry.borrow(), |registry| registry.agent_as::<T>(name)).ok()
    }

    pub fn physics(&self) -> &PhysicsWorld {
        self.bridge.world()
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        self.bridge.world_mut()
    }

    pub fn bus(&self) -> &EventBus<PhysicsWorld> {
        &self.bus
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Feeds the simulator geometry to a debug renderer.
    pub fn debug_draw(&self, drawer: &mut dyn DebugDraw) {
        self.bridge.world().debug_draw(drawer);
    }

    /// Destroys every agent and detaches the registry from the bus.
    ///
    /// Called on drop; calling it earlier leaves an empty, inert world.
    pub fn shutdown(&mut self) {
        let Some(listener) = self.registry_listener.take() else {
            return;
        };
        {
            let mut ctx = AgentContext::new(self.bridge.world_mut(), &mut self.bus);
            self.registry.borrow_mut().destroy_all(&mut ctx);
        }
        self.bus.remove_listener_from_all(&listener);
        self.bus.empty_event_queues();
        log::info!("Game world shut down after {} ticks.", self.ticks);
    }
}

impl Drop for GameWorld {
    fn drop(&mut self) {
        self.shutdown();
    }
}
