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

//! The public-facing entry point of the goo runtime.
//!
//! A game loads a [`GameConfig`], builds a [`GameWorld`] from it, feeds it
//! player input and calls [`GameWorld::tick`] once per frame.

mod command;
mod config;
mod game_world;

pub use command::*;
pub use config::*;
pub use game_world::*;

pub mod prelude {
    pub use goo_agents::{AgentParams, AgentSpec};
    pub use goo_core::event::{
        EventBus, EventData, EventKind, EventListener, EventPtr, ListenerHandle,
    };
    pub use goo_core::math::{Aabb, Vec2};
    pub use goo_lanes::physics_lane::{DebugLines, PhysicsConfig, PhysicsWorld};
}
