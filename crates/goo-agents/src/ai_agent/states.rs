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
use goo_lanes::physics_lane::PhysicsWorld;

use super::{AiState, Pilot, StateFactory};

/// States of flying AIs: `Stop`, `RandomFly` and `Seek`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlyingStateFactory;

impl FlyingStateFactory {
    /// Every state name this factory knows.
    pub const STATES: [&'static str; 3] = [StopState::NAME, RandomFlyState::NAME, SeekState::NAME];
}

impl StateFactory for FlyingStateFactory {
    fn create(&self, name: &str) -> Option<Box<dyn AiState>> {
        match name {
            StopState::NAME => Some(Box::new(StopState)),
            RandomFlyState::NAME => Some(Box::new(RandomFlyState)),
            SeekState::NAME => Some(Box::new(SeekState)),
            _ => None,
        }
    }
}

/// Halts the body and keeps it idle.
#[derive(Debug)]
pub struct StopState;

impl StopState {
    pub const NAME: &'static str = "Stop";
}

impl AiState for StopState {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn enter(&mut self, pilot: &mut Pilot, physics: &mut PhysicsWorld) {
        pilot.steering.set_target(None);
        physics.set_linear_velocity(pilot.body, Vec2::ZERO);
    }

    fn update(&mut self, _dt: f32, _pilot: &mut Pilot, _physics: &mut PhysicsWorld) {}
}

/// Wanders around.
#[derive(Debug)]
pub struct RandomFlyState;

impl RandomFlyState {
    pub const NAME: &'static str = "RandomFly";
}

impl AiState for RandomFlyState {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn enter(&mut self, pilot: &mut Pilot, _physics: &mut PhysicsWorld) {
        pilot.steering.set_wander_enabled(true);
    }

    fn exit(&mut self, pilot: &mut Pilot, _physics: &mut PhysicsWorld) {
        pilot.steering.set_wander_enabled(false);
    }

    fn update(&mut self, dt: f32, pilot: &mut Pilot, physics: &mut PhysicsWorld) {
        pilot.steering.wander(pilot.body, dt, physics);
    }
}

/// Steers toward the pilot's configured target.
#[derive(Debug)]
pub struct SeekState;

impl SeekState {
    pub const NAME: &'static str = "Seek";
}

impl AiState for SeekState {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn enter(&mut self, pilot: &mut Pilot, _physics: &mut PhysicsWorld) {
        if pilot.home_target.is_none() {
            log::warn!("Seek entered without a target for {}.", pilot.body);
        }
        pilot.steering.set_target(pilot.home_target);
    }

    fn exit(&mut self, pilot: &mut Pilot, _physics: &mut PhysicsWorld) {
        pilot.steering.set_target(None);
    }

    fn update(&mut self, dt: f32, pilot: &mut Pilot, physics: &mut PhysicsWorld) {
        pilot.steering.seek(pilot.body, dt, physics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_knows_the_flying_states() {
        let factory = FlyingStateFactory;
        for name in FlyingStateFactory::STATES {
            assert_eq!(factory.create(name).map(|s| s.name()), Some(name));
        }
        assert!(factory.create("Swim").is_none());
    }
}
