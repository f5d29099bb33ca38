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

//! Game agents of the goo runtime.
//!
//! An agent is a piece of game logic bound to zero or more physics bodies.
//! The [`AgentRegistry`] owns every live agent, forwards bus events to them
//! and ages out dead ones once per tick.

pub mod agent;
pub mod ai_agent;
pub mod collectable_agent;
pub mod params;
pub mod player_agent;
pub mod registry;
pub mod solid_agent;

pub use agent::{Agent, AgentContext, AgentError, ContactView, Peer};
pub use params::{AgentParams, AgentSpec};
pub use registry::AgentRegistry;
