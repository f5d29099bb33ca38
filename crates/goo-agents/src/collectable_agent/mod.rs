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

//! Pickups. A collectable is claimed by the player on first touch, stops
//! colliding and vanishes shortly after.

use std::any::Any;

use goo_core::agent::{AgentId, AgentType};
use goo_core::event::{EventData, EventPtr};
use goo_core::math::Vec2;
use goo_core::physics::{BodyDef, BodyHandle, BodyType, ShapeDef};
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentContext, AgentError};

/// Parameters of a [`CollectableAgent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectableParams {
    pub position: Vec2,
    pub radius: f32,
    pub body_type: BodyType,
    /// Sensors report contacts without pushing back.
    pub sensor: bool,
    /// Score granted to the collector.
    pub points: u32,
    /// Delay between being collected and disappearing.
    pub vanish_delay: f32,
    pub layer: i32,
}

impl Default for CollectableParams {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            radius: 0.5,
            body_type: BodyType::Static,
            sensor: true,
            points: 10,
            vanish_delay: 0.5,
            layer: 0,
        }
    }
}

/// A pickup worth some points.
pub struct CollectableAgent {
    name: String,
    id: AgentId,
    params: CollectableParams,
    body: Option<BodyHandle>,
    collected_by: Option<AgentId>,
    vanish_timer: Option<f32>,
    layer: i32,
    alive: bool,
}

impl CollectableAgent {
    /// Builds the agent; its body is created by [`Agent::create`].
    pub fn new(name: &str, id: AgentId, params: CollectableParams) -> Self {
        Self {
            name: name.to_owned(),
            id,
            layer: params.layer,
            params,
            body: None,
            collected_by: None,
            vanish_timer: None,
            alive: true,
        }
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    /// Agent that collected this pickup, if any.
    pub fn collected_by(&self) -> Option<AgentId> {
        self.collected_by
    }

    fn drop_collision(&mut self, ctx: &mut AgentContext<'_>) {
        if let Some(body) = self.body {
            ctx.physics.set_body_sensor(body, true);
        }
    }
}

impl Agent for CollectableAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> AgentId {
        self.id
    }

    fn agent_type(&self) -> AgentType {
        AgentType::Collectable
    }

    fn create(&mut self, ctx: &mut AgentContext<'_>) -> Result<(), AgentError> {
        let def = BodyDef {
            position: self.params.position,
            body_type: self.params.body_type,
            owner: Some(self.id),
            shapes: vec![ShapeDef {
                sensor: self.params.sensor,
                ..ShapeDef::circle(self.params.radius)
            }],
            ..Default::default()
        };
        let body = ctx
            .physics
            .create_body(&def, Some(&self.name))
            .map_err(|err| AgentError::physics(&self.name, err))?;
        self.body = Some(body);
        Ok(())
    }

    fn update_state(&mut self, dt: f32, _ctx: &mut AgentContext<'_>) {
        if let Some(remaining) = self.vanish_timer.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                log::debug!("'{}' vanished.", self.name);
                self.vanish_timer = None;
                self.alive = false;
            }
        }
    }

    fn on_event(&mut self, event: &EventPtr, ctx: &mut AgentContext<'_>) -> bool {
        match event.data() {
            EventData::Collected {
                collectable,
                collector,
                points,
            } if *collectable == self.id => {
                if self.collected_by.is_some() {
                    return false;
                }
                log::info!("'{}' collected by {collector} for {points} points.", self.name);
                self.collected_by = Some(*collector);
                self.drop_collision(ctx);
                self.vanish_timer = Some(self.params.vanish_delay.max(0.0));
                true
            }
            EventData::DropCollision { agent } => {
                if agent.as_deref().is_some_and(|name| name != self.name) {
                    return false;
                }
                self.drop_collision(ctx);
                true
            }
            EventData::RenderInLayer { agent, layer } if *agent == self.name => {
                self.layer = *layer;
                true
            }
            _ => false,
        }
    }

    fn on_out_of_limits(&mut self, _body: BodyHandle, _ctx: &mut AgentContext<'_>) -> bool {
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

    fn points(&self) -> u32 {
        self.params.points
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
