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

use goo_core::math::Vec2;
use goo_core::physics::BodyHandle;
use goo_lanes::physics_lane::PhysicsWorld;
use goo_lanes::steering_lane::Steering;

/// The body an AI steers, together with its steering state.
#[derive(Debug, Clone)]
pub struct Pilot {
    /// The steered body.
    pub body: BodyHandle,
    /// Seek and wander state.
    pub steering: Steering,
    /// Configured destination of the `Seek` state.
    pub home_target: Option<Vec2>,
}

/// One behavior of an AI.
pub trait AiState {
    /// Name the state is registered under in its factory.
    fn name(&self) -> &'static str;

    /// Runs when the state becomes current.
    fn enter(&mut self, pilot: &mut Pilot, physics: &mut PhysicsWorld) {
        let _ = (pilot, physics);
    }

    /// Runs when the state stops being current, before the next one enters.
    fn exit(&mut self, pilot: &mut Pilot, physics: &mut PhysicsWorld) {
        let _ = (pilot, physics);
    }

    /// Advances the state by `dt`.
    fn update(&mut self, dt: f32, pilot: &mut Pilot, physics: &mut PhysicsWorld);
}

/// Builds the states an agent type knows by name.
pub trait StateFactory {
    /// Creates the state called `name`, or `None` if the name is unknown.
    fn create(&self, name: &str) -> Option<Box<dyn AiState>>;
}

/// Holds at most one current [`AiState`].
pub struct StateMachine {
    factory: Box<dyn StateFactory>,
    current: Option<Box<dyn AiState>>,
}

impl StateMachine {
    /// Creates an empty machine resolving names through `factory`.
    pub fn new(factory: Box<dyn StateFactory>) -> Self {
        Self {
            factory,
            current: None,
        }
    }

    /// Name of the current state.
    pub fn current_state(&self) -> Option<&'static str> {
        self.current.as_ref().map(|state| state.name())
    }

    /// Exits and drops the current state, then enters the state called `name`.
    ///
    /// ## Returns
    /// `false` if the factory does not know `name`; the machine is left
    /// without a state in that case.
    pub fn set_state(&mut self, name: &str, pilot: &mut Pilot, physics: &mut PhysicsWorld) -> bool {
        if let Some(mut old) = self.current.take() {
            old.exit(pilot, physics);
        }
        match self.factory.create(name) {
            Some(mut state) => {
                state.enter(pilot, physics);
                log::debug!("AI state of {} is now {name}.", pilot.body);
                self.current = Some(state);
                true
            }
            None => {
                log::error!("Unknown AI state '{name}'.");
                false
            }
        }
    }

    /// Updates the current state. Does nothing without one.
    pub fn update(&mut self, dt: f32, pilot: &mut Pilot, physics: &mut PhysicsWorld) {
        if let Some(state) = self.current.as_mut() {
            state.update(dt, pilot, physics);
        }
    }
}
