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

//! Scene configuration: physics settings plus the agents to spawn.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use goo_agents::{AgentError, AgentSpec};
use goo_core::event::BusError;
use goo_lanes::physics_lane::PhysicsConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading a scene or building a world from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The text is not a valid scene.
    #[error("invalid scene format: {0}")]
    InvalidFormat(String),
    /// Two agents share a name.
    #[error("agent '{0}' is declared twice")]
    DuplicateAgent(String),
    /// The fixed timestep must be a positive duration.
    #[error("fixed timestep must be positive, got {0}")]
    InvalidTimestep(f32),
    /// The registry could not be attached to the bus.
    #[error(transparent)]
    Bus(#[from] BusError),
    /// An agent of the scene could not be created.
    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// A complete scene description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    /// Agents, created in order.
    pub agents: Vec<AgentSpec>,
}

impl GameConfig {
    /// Parses and validates a scene from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            ron::from_str(text).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a scene file.
    ///
    /// ## Arguments
    /// * `path` - Path of a RON scene file.
    ///
    /// ## Returns
    /// The parsed scene, or an error naming the file that failed.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene file '{}'", path.display()))?;
        let config = Self::from_ron_str(&text)
            .with_context(|| format!("Failed to parse scene file '{}'", path.display()))?;
        log::info!(
            "Loaded scene '{}' with {} agents.",
            path.display(),
            config.agents.len()
        );
        Ok(config)
    }

    /// Serializes the scene as human-readable RON.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty_config = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, pretty_config)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Checks what the parser cannot: unique names and a usable timestep.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let step = self.physics.fixed_timestep;
        if !(step.is_finite() && step > 0.0) {
            return Err(ConfigError::InvalidTimestep(step));
        }
        let mut seen = HashSet::new();
        for spec in &self.agents {
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::DuplicateAgent(spec.name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use goo_agents::AgentParams;

    const SCENE: &str = r#"
        (
            physics: (gravity: (x: 0.0, y: -9.8), fixed_timestep: 0.02),
            agents: [
                (name: "ground", params: Solid((body: (shapes: [(kind: Box(half_extents: (x: 10.0, y: 0.5)))])))),
                (name: "player", params: Player((throw_cost: 15.0))),
                (name: "coin", params: Collectable((position: (x: 3.0, y: 1.0), points: 5))),
            ],
        )
    "#;

    #[test]
    fn test_scene_parses_with_defaults() {
        let config = GameConfig::from_ron_str(SCENE).unwrap();
        assert_relative_eq!(config.physics.gravity.y, -9.8);
        assert_relative_eq!(config.physics.fixed_timestep, 0.02);
        assert_eq!(config.physics.velocity_iterations, 8);
        assert_eq!(config.agents.len(), 3);
        let AgentParams::Player(player) = &config.agents[1].params else {
            panic!("expected player params");
        };
        assert_relative_eq!(player.throw_cost, 15.0);
        assert_relative_eq!(player.blob.radius, 2.0);
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let text = r#"(agents: [(name: "a", params: Ai(())), (name: "a", params: Ai(()))])"#;
        match GameConfig::from_ron_str(text) {
            Err(ConfigError::DuplicateAgent(name)) => assert_eq!(name, "a"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_bad_timestep_and_syntax_are_rejected() {
        assert!(matches!(
            GameConfig::from_ron_str("(physics: (fixed_timestep: 0.0))"),
            Err(ConfigError::InvalidTimestep(_))
        ));
        assert!(matches!(
            GameConfig::from_ron_str("(agents: [(name: \"x\", params: Dragon(()))])"),
            Err(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_pretty_output_reads_back() {
        let config = GameConfig::from_ron_str(SCENE).unwrap();
        let text = config.to_ron_string().unwrap();
        assert_eq!(GameConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = GameConfig::load("does/not/exist.ron").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.ron"));
    }
}
