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

use goo_core::math::{Aabb, Vec2};
use serde::{Deserialize, Serialize};

/// Simulation settings for the [`super::PhysicsBridge`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// World gravity.
    pub gravity: Vec2,
    /// Duration of one simulator step, in seconds.
    pub fixed_timestep: f32,
    /// Largest amount of unsimulated time carried between updates.
    pub max_backlog: f32,
    /// Velocity solver iterations per step.
    pub velocity_iterations: u32,
    /// Position solver iterations per step.
    pub position_iterations: u32,
    /// Bodies leaving these limits are reported as out of limits.
    pub world_bounds: Option<Aabb>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -10.0),
            fixed_timestep: 1.0 / 60.0,
            max_backlog: 0.25,
            velocity_iterations: 8,
            position_iterations: 3,
            world_bounds: None,
        }
    }
}
