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

//! Closed set of agent parameters, as read from scene configuration.

use goo_core::agent::AgentType;
use serde::{Deserialize, Serialize};

use crate::ai_agent::AiParams;
use crate::collectable_agent::CollectableParams;
use crate::player_agent::PlayerParams;
use crate::solid_agent::SolidParams;

/// Parameters of one agent. The variant selects the agent type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentParams {
    /// A plain body, see [`crate::solid_agent::SolidAgent`].
    Solid(SolidParams),
    /// A flying AI, see [`crate::ai_agent::AiAgent`].
    Ai(AiParams),
    /// The blob player, see [`crate::player_agent::PlayerAgent`].
    Player(PlayerParams),
    /// A pickup, see [`crate::collectable_agent::CollectableAgent`].
    Collectable(CollectableParams),
}

impl AgentParams {
    /// Agent type built from these params.
    pub fn agent_type(&self) -> AgentType {
        match self {
            Self::Solid(_) => AgentType::Generic,
            Self::Ai(_) => AgentType::Ai,
            Self::Player(_) => AgentType::Player,
            Self::Collectable(_) => AgentType::Collectable,
        }
    }
}

/// A named agent entry of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Unique agent name.
    pub name: String,
    /// What to build.
    pub params: AgentParams,
}
