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

use std::any::Any;

use goo_core::agent::{AgentId, AgentType};
use goo_core::event::{EventData, EventPtr};
use goo_core::math::Vec2;
use goo_core::physics::{BodyDef, BodyHandle, ShapeDef};
use goo_lanes::physics_lane::PhysicsWorld;
use goo_lanes::steering_lane::{Steering, SteeringParams};
use serde::{Deserialize, Serialize};

use super::{FlyingStateFactory, Pilot, RandomFlyState, StateMachine, StopState};
use crate::agent::{Agent, AgentContext, AgentError};

/// Parameters of an [`AiAgent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiParams {
    pub position: Vec2,
    pub radius: f32,
    pub density: f32,
    /// Flying AIs ignore gravity by default.
    pub gravity_scale: f32,
    pub steering: SteeringParams,
    /// State entered on creation.
    pub initial_state: String,
    /// Destination of the `Seek` state.
    pub target: Option<Vec2>,
    /// Seed of the wander jitter.
    pub seed: u64,
    pub layer: i32,
}

impl Default for AiParams {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            radius: 0.4,
            density: 1.0,
            gravity_scale: 0.0,
            steering: SteeringParams::default(),
            initial_state: RandomFlyState::NAME.to_owned(),
            target: None,
            seed: 0,
            layer: 0,
        }
    }
}

/// A flying body driven by a [`StateMachine`] of steering behaviors.
pub struct AiAgent {
    name: String,
    id: AgentId,
    params: AiParams,
    pilot: Option<Pilot>,
    machine: StateMachine,
    layer: i32,
    alive: bool,
}

impl AiAgent {
    /// Builds the agent; its body is created by [`Agent::create`].
    pub fn new(name: &str, id: AgentId, params: AiParams) -> Self {
        Self {
            name: name.to_owned(),
            id,
            layer: params.layer,
            params,
            pilot: None,
            machine: StateMachine::new(Box::new(FlyingStateFactory)),
            alive: true,
        }
    }

    /// The steered body and its steering state, once created.
    pub fn pilot(&self) -> Option<&Pilot> {
        self.pilot.as_ref()
    }

    /// Name of the current behavior.
    pub fn current_state(&self) -> Option<&'static str> {
        self.machine.current_state()
    }

    /// Switches behavior.
    ///
    /// ## Returns
    /// `false` before creation or when the state name is unknown.
    pub fn set_state(&mut self, name: &str, physics: &mut PhysicsWorld) -> bool {
        match self.pilot.as_mut() {
            Some(pilot) => self.machine.set_state(name, pilot, physics),
            None => false,
        }
    }
}

impl Agent for AiAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> AgentId {
        self.id
    }

    fn agent_type(&self) -> AgentType {
        AgentType::Ai
    }

    fn create(&mut self, ctx: &mut AgentContext<'_>) -> Result<(), AgentError> {
        let def = BodyDef {
            position: self.params.position,
            gravity_scale: self.params.gravity_scale,
            fixed_rotation: true,
            owner: Some(self.id),
            shapes: vec![ShapeDef {
                density: self.params.density,
                ..ShapeDef::circle(self.params.radius)
            }],
            ..Default::default()
        };
        let body = ctx
            .physics
            .create_body(&def, Some(&self.name))
            .map_err(|err| AgentError::physics(&self.name, err))?;

        let seed = self.params.seed ^ u64::from(self.id.index);
        let mut pilot = Pilot {
            body,
            steering: Steering::new(self.params.steering.clone(), seed),
            home_target: self.params.target,
        };
        let initial = self.params.initial_state.clone();
        self.machine.set_state(&initial, &mut pilot, ctx.physics);
        self.pilot = Some(pilot);
        Ok(())
    }

    fn update_state(&mut self, dt: f32, ctx: &mut AgentContext<'_>) {
        if let Some(pilot) = self.pilot.as_mut() {
            self.machine.update(dt, pilot, ctx.physics);
        }
    }

    fn on_event(&mut self, event: &EventPtr, ctx: &mut AgentContext<'_>) -> bool {
        match event.data() {
            EventData::BlobDeath(info) => {
                let stunned = self
                    .pilot
                    .as_ref()
                    .is_some_and(|pilot| info.affected_bodies.contains(&pilot.body));
                if stunned {
                    log::debug!("'{}' caught in a blob death.", self.name);
                    self.set_state(StopState::NAME, ctx.physics);
                }
                stunned
            }
            EventData::RenderInLayer { agent, layer } if *agent == self.name => {
                self.layer = *layer;
                true
            }
            _ => false,
        }
    }

    fn on_out_of_limits(&mut self, _body: BodyHandle, _ctx: &mut AgentContext<'_>) -> bool {
        log::info!("'{}' flew out of the world limits.", self.name);
        self.alive = false;
        true
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn destroy(&mut self, ctx: &mut AgentContext<'_>) {
        if let Some(pilot) = self.pilot.take() {
            let _ = ctx.physics.destroy_body(pilot.body);
        }
        self.alive = false;
    }

    fn bodies(&self) -> Vec<BodyHandle> {
        self.pilot.iter().map(|pilot| pilot.body).collect()
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
