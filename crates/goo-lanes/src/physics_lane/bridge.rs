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

use goo_core::event::{Event, EventBus};
use goo_core::physics::Simulator;

use super::{ContactBuffer, PhysicsConfig, PhysicsWorld};

/// Steps the simulator with a fixed timestep and publishes what happened.
///
/// Contacts and limit violations are buffered during each sub-step and
/// triggered synchronously right after it, one event per distinct record,
/// with the [`PhysicsWorld`] as dispatch context.
pub struct PhysicsBridge {
    world: PhysicsWorld,
    buffer: ContactBuffer,
    config: PhysicsConfig,
    accumulator: f32,
}

impl PhysicsBridge {
    /// Wraps a simulator and applies the gravity and limits of `config`.
    pub fn new(simulator: Box<dyn Simulator>, config: PhysicsConfig) -> Self {
        let mut world = PhysicsWorld::new(simulator);
        world.simulator_mut().set_gravity(config.gravity);
        world.simulator_mut().set_world_bounds(config.world_bounds);
        log::info!(
            "Physics bridge ready: step {:.4}s, backlog {:.2}s, {}/{} iterations.",
            config.fixed_timestep,
            config.max_backlog,
            config.velocity_iterations,
            config.position_iterations
        );
        Self {
            world,
            buffer: ContactBuffer::new(),
            config,
            accumulator: 0.0,
        }
    }

    /// The physics world.
    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// The physics world, mutably.
    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    /// Active settings.
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Unsimulated time carried to the next update.
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Advances the simulation by `dt` and triggers the resulting events.
    ///
    /// ## Returns
    /// The number of simulator steps taken.
    pub fn update(&mut self, dt: f32, bus: &mut EventBus<PhysicsWorld>) -> u32 {
        let step = self.config.fixed_timestep;
        if step <= 0.0 {
            log::error!("Fixed timestep must be positive, got {step}.");
            self.world.set_stepped(false);
            return 0;
        }

        self.accumulator = (self.accumulator + dt.max(0.0)).min(self.config.max_backlog);
        let mut steps = 0;
        self.world.set_stepped(false);
        while self.accumulator >= step {
            self.world.simulator_mut().step(
                step,
                self.config.velocity_iterations,
                self.config.position_iterations,
                &mut self.buffer,
            );
            self.accumulator -= step;
            steps += 1;
            self.world.set_stepped(true);
            self.flush(bus);
        }
        steps
    }

    /// Triggers what the last step buffered. The buffer is empty afterwards.
    fn flush(&mut self, bus: &mut EventBus<PhysicsWorld>) {
        let payloads = self.buffer.drain(&self.world);
        if !payloads.is_empty() {
            log::trace!("Publishing {} physics event(s).", payloads.len());
        }
        for data in payloads {
            let event = Event::shared(bus.now(), data);
            bus.trigger_event(&event, &mut self.world);
        }
    }
}
