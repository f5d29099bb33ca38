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

//! Defines the identity types shared by agents and the physics layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for an agent in the registry.
///
/// It combines an index with a generation count to solve the "ABA problem".
/// When an agent is destroyed its slot can be recycled for a new agent, but the
/// generation is incremented, so a stale `AgentId` still carried by a physics
/// body tag or an in-flight event can never address the newcomer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId {
    /// The slot index of the agent inside the registry.
    pub index: u32,
    /// A generation counter that is incremented each time the index is recycled.
    pub generation: u32,
}

impl AgentId {
    /// Creates a new identifier from its parts.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// The closed set of agent variants known to the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentType {
    /// A plain solid body (level props, crates, platforms).
    Generic,
    /// An agent driven by an AI behavior state machine.
    Ai,
    /// The player-controlled soft body.
    Player,
    /// An object that can be picked up by the player.
    Collectable,
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AgentType::Generic => "generic",
            AgentType::Ai => "ai",
            AgentType::Player => "player",
            AgentType::Collectable => "collectable",
        };
        f.write_str(name)
    }
}
