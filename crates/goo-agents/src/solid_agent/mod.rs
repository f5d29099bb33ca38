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

//! Plain physics bodies: walls, floors, crates.
//!
//! A solid can be "wetted" by a blob dying next to it: its friction switches
//! to a wet value for a while, then dries back.

use std::any::Any;

use goo_core::agent::{AgentId, AgentType};
use goo_core::event::{EventData, EventPtr};
use goo_core::math::Vec2;
use goo_core::physics::{BodyDef, BodyHandle, BodyType, ShapeDef};
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentContext, AgentError};

/// Parameters of a [`SolidAgent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolidParams {
    /// The body to create. Its owner tag is overwritten with the agent id.
    pub body: BodyDef,
    /// Friction while wet. `None` disables the wetness response.
    pub wet_friction: Option<f32>,
    /// Friction restored once dry.
    pub dry_friction: f32,
    /// How long the body stays wet.
    pub wet_duration: f32,
    /// Initial render layer.
    pub layer: i32,
}

impl Default for SolidParams {
    fn default() -> Self {
        Self {
            body: BodyDef {
                body_type: BodyType::Static,
                shapes: vec![ShapeDef::cuboid(1.0, 1.0)],
                ..Default::default()
            },
            wet_friction: None,
            dry_friction: 0.3,
            wet_duration: 3.0,
            layer: 0,
        }
    }
}

impl SolidParams {
    /// A static box centered on `position`.
    pub fn static_box(position: Vec2, half_extents: Vec2) -> Self {
        let mut params = Self::default();
        params.body.position = position;
        params.body.shapes = vec![ShapeDef::cuboid(half_extents.x, half_extents.y)];
        params
    }
}

/// A single body with an optional wetness response.
pub struct SolidAgent {
    name: String,
    id: AgentId,
    params: SolidParams,
    body: Option<BodyHandle>,
    wet_timer: Option<f32>,
    layer: i32,
    alive: bool,
}

impl SolidAgent {
    /// Builds the agent; bodies are created by [`Agent::create`].
    pub fn new(name: &str, id: AgentId, params: SolidParams) -> Self {
        Self {
            name: name.to_owned(),
            id,
            layer: params.layer,
            params,
            body: None,
            wet_timer: None,
            alive: true,
        }
    }

    /// The agent's body, once created.
    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    /// Whether the wetness response is currently active.
    pub fn is_wet(&self) -> bool {
        self.wet_timer.is_some()
    }

    fn wet(&mut self, ctx: &mut AgentContext<'_>) {
        let (Some(body), Some(friction)) = (self.body, self.params.wet_friction) else {
            return;
        };
        if ctx.physics.change_friction_of_body(body, friction).is_ok() {
            log::debug!("'{}' is wet for {:.1}s.", self.name, self.params.wet_duration);
            self.wet_timer = Some(self.params.wet_duration);
        }
    }
}

impl Agent for SolidAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> AgentId {
        self.id
    }

    fn agent_type(&self) -> AgentType {
        AgentType::Generic
    }

    fn create(&mut self, ctx: &mut AgentContext<'_>) -> Result<(), AgentError> {
        let def = BodyDef {
            owner: Some(self.id),
            ..self.params.body.clone()
        };
        let body = ctx
            .physics
            .create_body(&def, Some(&self.name))
            .map_err(|err| AgentError::physics(&self.name, err))?;
        self.body = Some(body);
        Ok(())
    }

    fn update_state(&mut self, dt: f32, ctx: &mut AgentContext<'_>) {
        let Some(remaining) = self.wet_timer.as_mut() else {
            return;
        };
        *remaining -= dt;
        if *remaining > 0.0 {
            return;
        }
        self.wet_timer = None;
        if let Some(body) = self.body {
            if ctx
                .physics
                .change_friction_of_body(body, self.params.dry_friction)
                .is_ok()
            {
                log::debug!("'{}' dried.", self.name);
            }
        }
    }

    fn on_event(&mut self, event: &EventPtr, ctx: &mut AgentContext<'_>) -> bool {
        match event.data() {
            EventData::BlobDeath(info) => {
                let hit = self
                    .body
                    .is_some_and(|body| info.affected_bodies.contains(&body));
                if hit {
                    self.wet(ctx);
                }
                hit
            }
            EventData::RenderInLayer { agent, layer } if *agent == self.name => {
                self.layer = *layer;
                true
            }
            _ => false,
        }
    }

    fn on_out_of_limits(&mut self, _body: BodyHandle, _ctx: &mut AgentContext<'_>) -> bool {
        log::info!("'{}' left the world limits.", self.name);
        self.alive = false;
        true
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn destroy(&mut self, ctx: &mut AgentContext<'_>) {
        if let Some(body) = self.body.take() {
            let _ = ctx.physics.destroy_body(body);
        }
        self.alive = false;
    }

    fn bodies(&self) -> Vec<BodyHandle> {
        self.body.into_iter().collect()
    }

    fn render_layer(&self) -> i32 {
        self.layer
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
