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
use std::collections::HashSet;

use goo_core::agent::{AgentId, AgentType};
use goo_core::event::{EventData, EventPtr};
use goo_core::math::Vec2;
use goo_core::physics::{BodyHandle, ContactPhase};
use goo_lanes::blob_lane::{BlobBuilder, BlobController, BlobParams};
use serde::{Deserialize, Serialize};

use super::MergeBook;
use crate::agent::{Agent, AgentContext, AgentError, ContactView};

/// Parameters of a [`PlayerAgent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerParams {
    /// The main blob.
    pub blob: BlobParams,
    /// Size of a thrown blob relative to the main one.
    pub throw_scale: f32,
    /// Outer bodies of a thrown blob.
    pub thrown_outer_count: usize,
    /// Integrity a thrown blob starts with.
    pub thrown_integrity: f32,
    /// Impulse per body of a full-strength throw.
    pub throw_impulse: f32,
    /// Integrity the main blob pays for a throw.
    pub throw_cost: f32,
    /// Throwing needs more main integrity than this.
    pub critical_integrity: f32,
    /// Time after a throw or a control change during which control stays put.
    pub control_lockout: f32,
    /// Contact time after which a blob merges back into the main one.
    pub merge_time: f32,
}

impl Default for PlayerParams {
    fn default() -> Self {
        Self {
            blob: BlobParams::default(),
            throw_scale: 0.5,
            thrown_outer_count: 6,
            thrown_integrity: 50.0,
            throw_impulse: 2.0,
            throw_cost: 20.0,
            critical_integrity: 30.0,
            control_lockout: 0.5,
            merge_time: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Main,
    Secondary,
    Scattered(usize),
}

/// The blob player.
///
/// Owns a main blob, at most one secondary blob (the last one thrown) and the
/// scattered blobs that were let go. Every blob shares the player's owner tag.
pub struct PlayerAgent {
    name: String,
    id: AgentId,
    params: PlayerParams,
    main: Option<BlobController>,
    secondary: Option<BlobController>,
    scattered: Vec<BlobController>,
    controlling_secondary: bool,
    lockout: f32,
    merges: MergeBook,
    claimed: HashSet<AgentId>,
    score: u32,
    reported_integrity: f32,
    alive: bool,
}

impl PlayerAgent {
    /// Builds the agent; the main blob is created by [`Agent::create`].
    pub fn new(name: &str, id: AgentId, params: PlayerParams) -> Self {
        Self {
            name: name.to_owned(),
            id,
            params,
            main: None,
            secondary: None,
            scattered: Vec::new(),
            controlling_secondary: false,
            lockout: 0.0,
            merges: MergeBook::new(),
            claimed: HashSet::new(),
            score: 0,
            reported_integrity: 0.0,
            alive: true,
        }
    }

    pub fn main_blob(&self) -> Option<&BlobController> {
        self.main.as_ref()
    }

    pub fn secondary_blob(&self) -> Option<&BlobController> {
        self.secondary.as_ref()
    }

    pub fn scattered_blobs(&self) -> &[BlobController] {
        &self.scattered
    }

    /// The blob receiving move commands.
    pub fn controlled_blob(&self) -> Option<&BlobController> {
        if self.controlling_secondary {
            self.secondary.as_ref()
        } else {
            self.main.as_ref()
        }
    }

    pub fn is_controlling_secondary(&self) -> bool {
        self.controlling_secondary
    }

    /// Remaining control lockout in seconds.
    pub fn lockout(&self) -> f32 {
        self.lockout
    }

    /// Points collected so far.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Open contacts between the main blob and `blob`.
    pub fn merge_contacts(&self, blob: BodyHandle) -> i32 {
        self.merges.contacts_with(blob)
    }

    fn blobs(&self) -> impl Iterator<Item = &BlobController> {
        self.main
            .iter()
            .chain(self.secondary.iter())
            .chain(self.scattered.iter())
    }

    fn role_of(&self, body: BodyHandle) -> Option<Role> {
        if self.main.as_ref().is_some_and(|b| b.owns_body(body)) {
            return Some(Role::Main);
        }
        if self.secondary.as_ref().is_some_and(|b| b.owns_body(body)) {
            return Some(Role::Secondary);
        }
        self.scattered
            .iter()
            .position(|b| b.owns_body(body))
            .map(Role::Scattered)
    }

    fn blob_mut(&mut self, role: Role) -> Option<&mut BlobController> {
        match role {
            Role::Main => self.main.as_mut(),
            Role::Secondary => self.secondary.as_mut(),
            Role::Scattered(index) => self.scattered.get_mut(index),
        }
    }

    /// Takes a non-main blob out of the player and hands control back to
    /// the main blob if it was the controlled one.
    fn detach(&mut self, role: Role) -> Option<BlobController> {
        let blob = match role {
            Role::Main => return None,
            Role::Secondary => {
                let blob = self.secondary.take();
                if self.controlling_secondary {
                    self.controlling_secondary = false;
                    if let Some(main) = self.main.as_mut() {
                        main.start_controlling(true);
                    }
                }
                blob
            }
            Role::Scattered(index) if index < self.scattered.len() => {
                Some(self.scattered.remove(index))
            }
            Role::Scattered(_) => None,
        };
        if let Some(blob) = blob.as_ref() {
            self.merges.forget(blob.id());
        }
        blob
    }

    fn destroy_blob(&mut self, role: Role, affect: bool, ctx: &mut AgentContext<'_>) -> bool {
        match self.detach(role) {
            Some(mut blob) => blob.destroy(ctx.physics, ctx.bus, affect),
            None => false,
        }
    }

    fn throw(&mut self, target: Vec2, force: f32, ctx: &mut AgentContext<'_>) -> bool {
        if self.secondary.is_some() {
            log::debug!("'{}' already has a secondary blob.", self.name);
            return false;
        }
        let Some(main) = self.main.as_mut() else {
            return false;
        };
        if main.is_destroyed() || main.integrity() <= self.params.critical_integrity {
            log::debug!("'{}' is too weak to throw.", self.name);
            return false;
        }

        let force = force.clamp(0.0, 1.0);
        let origin = ctx.physics.position(main.id()).unwrap_or(main.position());
        let mut direction = (target - origin).normalize();
        if direction == Vec2::ZERO {
            direction = Vec2::Y;
        }
        let scale = self.params.throw_scale;
        let blob = &self.params.blob;
        let gap = main.radius() + blob.outer_radius + (blob.radius + blob.outer_radius) * scale;
        let spawn = origin + direction * (gap + blob.outer_radius);

        let thrown_params = BlobParams {
            outer_count: self.params.thrown_outer_count,
            initial_integrity: self.params.thrown_integrity,
            ..blob.clone()
        };
        let thrown = match BlobBuilder::new(thrown_params)
            .owner(self.id)
            .scaled(scale, spawn)
            .build(ctx.physics)
        {
            Ok(thrown) => thrown,
            Err(err) => {
                log::warn!("'{}' could not throw: {err}", self.name);
                return false;
            }
        };
        let impulse = direction * (self.params.throw_impulse * force);
        for body in thrown.bodies() {
            ctx.physics.apply_impulse(body, impulse);
        }
        main.spend_integrity(self.params.throw_cost);

        log::debug!("'{}' threw blob {} at force {force:.2}.", self.name, thrown.id());
        self.secondary = Some(thrown);
        self.lockout = self.params.control_lockout;
        true
    }

    fn change_control(&mut self) -> bool {
        if self.lockout > 0.0 {
            return false;
        }
        let (Some(main), Some(secondary)) = (self.main.as_mut(), self.secondary.as_mut()) else {
            return false;
        };
        if self.controlling_secondary {
            secondary.stop_controlling();
            main.start_controlling(true);
            self.controlling_secondary = false;
            if let Some(demoted) = self.secondary.take() {
                log::debug!("Blob {} of '{}' is now scattered.", demoted.id(), self.name);
                self.scattered.push(demoted);
            }
        } else {
            main.stop_controlling();
            self.controlling_secondary = secondary.start_controlling(false);
            if !self.controlling_secondary {
                main.start_controlling(true);
            }
        }
        self.lockout = self.params.control_lockout;
        true
    }

    fn sacrifice(&mut self, ctx: &mut AgentContext<'_>) -> bool {
        if self.secondary.is_some() {
            return self.destroy_blob(Role::Secondary, true, ctx);
        }
        match self.scattered.len() {
            0 => false,
            len => self.destroy_blob(Role::Scattered(len - 1), true, ctx),
        }
    }

    fn merge(&mut self, blob: BodyHandle, ctx: &mut AgentContext<'_>) {
        let Some(role) = self.role_of(blob) else {
            return;
        };
        if role == Role::Main || !self.destroy_blob(role, false, ctx) {
            return;
        }
        if let Some(main) = self.main.as_mut() {
            main.apply_health(ctx.physics);
            log::debug!("'{}' merged blob {blob} back.", self.name);
        }
    }

    fn try_pickup(&mut self, view: &ContactView<'_>, ctx: &mut AgentContext<'_>) {
        if self.secondary.is_some() {
            return;
        }
        let Some(peer) = view.peer else {
            return;
        };
        if peer.agent_type != AgentType::Collectable || !self.claimed.insert(peer.id) {
            return;
        }
        ctx.queue(EventData::Collected {
            collectable: peer.id,
            collector: self.id,
            points: peer.points,
        });
        self.score += peer.points;
        if let Some(main) = self.main.as_mut() {
            main.apply_health(ctx.physics);
        }
    }

    /// Destroys dead thrown blobs, runs the death cascade and reports integrity changes.
    fn settle(&mut self, ctx: &mut AgentContext<'_>) {
        if self.secondary.as_ref().is_some_and(|b| b.integrity() <= 0.0) {
            self.destroy_blob(Role::Secondary, self.params.blob.affect_on_death, ctx);
        }
        while let Some(index) = self.scattered.iter().position(|b| b.integrity() <= 0.0) {
            self.destroy_blob(Role::Scattered(index), self.params.blob.affect_on_death, ctx);
        }

        self.report_integrity(ctx);
        if self.main.as_ref().is_some_and(|b| b.integrity() <= 0.0) {
            self.die(ctx);
        }
    }

    fn report_integrity(&mut self, ctx: &mut AgentContext<'_>) {
        let Some(integrity) = self.main.as_ref().map(|b| b.integrity()) else {
            return;
        };
        if integrity != self.reported_integrity {
            self.reported_integrity = integrity;
            ctx.queue(EventData::BlobHealthChanged {
                agent: self.id,
                integrity,
                is_main: true,
            });
        }
    }

    fn die(&mut self, ctx: &mut AgentContext<'_>) {
        if !self.alive {
            return;
        }
        self.alive = false;
        log::info!("'{}' lost its main blob.", self.name);

        let affect = self.params.blob.affect_on_death;
        if let Some(main) = self.main.as_mut() {
            main.destroy(ctx.physics, ctx.bus, affect);
        }
        self.release_thrown(ctx);
        ctx.trigger(EventData::GameOver { player: self.id });
    }

    fn release_thrown(&mut self, ctx: &mut AgentContext<'_>) {
        while self.secondary.is_some() {
            self.destroy_blob(Role::Secondary, false, ctx);
        }
        while !self.scattered.is_empty() {
            self.destroy_blob(Role::Scattered(0), false, ctx);
        }
    }
}

impl Agent for PlayerAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> AgentId {
        self.id
    }

    fn agent_type(&self) -> AgentType {
        AgentType::Player
    }

    fn create(&mut self, ctx: &mut AgentContext<'_>) -> Result<(), AgentError> {
        let mut main = BlobBuilder::new(self.params.blob.clone())
            .owner(self.id)
            .build(ctx.physics)
            .map_err(|err| AgentError::physics(&self.name, err))?;
        main.start_controlling(true);
        self.reported_integrity = main.integrity();
        self.main = Some(main);
        Ok(())
    }

    fn update_state(&mut self, dt: f32, ctx: &mut AgentContext<'_>) {
        if !self.alive {
            return;
        }
        self.lockout = (self.lockout - dt).max(0.0);

        let physics = &mut *ctx.physics;
        for blob in self
            .main
            .iter_mut()
            .chain(self.secondary.iter_mut())
            .chain(self.scattered.iter_mut())
        {
            blob.update(dt, physics);
        }

        for blob in self.merges.advance(dt, self.params.merge_time) {
            self.merge(blob, ctx);
        }
        self.settle(ctx);
    }

    fn on_collision(&mut self, view: &ContactView<'_>, ctx: &mut AgentContext<'_>) -> bool {
        if !self.alive {
            return false;
        }
        let Some(role) = self.role_of(view.subject) else {
            return false;
        };
        let phase = view.phase();
        let other_role = self.role_of(view.other);

        if let Some(blob) = self.blob_mut(role) {
            if !blob.owns_body(view.other) {
                blob.on_contact(phase);
            }
        }

        match phase {
            ContactPhase::Added | ContactPhase::Removed => {
                if role == Role::Main {
                    if let Some(other) = other_role.filter(|r| *r != Role::Main) {
                        if let Some(id) = self.blob_mut(other).map(|b| b.id()) {
                            self.merges.contact(id, phase);
                        }
                    } else if phase == ContactPhase::Added {
                        self.try_pickup(view, ctx);
                    }
                }
            }
            ContactPhase::Result if view.contact.between_different_agents() => {
                let impulse = view.contact.normal_impulse;
                if let Some(blob) = self.blob_mut(role) {
                    blob.apply_damage(impulse, ctx.physics);
                }
            }
            ContactPhase::Result | ContactPhase::Persisted => {}
        }

        self.settle(ctx);
        true
    }

    fn on_event(&mut self, event: &EventPtr, ctx: &mut AgentContext<'_>) -> bool {
        if !self.alive {
            return false;
        }
        let handled = match event.data() {
            EventData::MoveBlob { direction } => {
                let blob = if self.controlling_secondary {
                    self.secondary.as_mut()
                } else {
                    self.main.as_mut()
                };
                match blob {
                    Some(blob) => {
                        blob.move_blob(*direction);
                        true
                    }
                    None => false,
                }
            }
            EventData::ShootBlob { target, force } => self.throw(*target, *force, ctx),
            EventData::ChangeBlobControl => self.change_control(),
            EventData::SacrificeBlob => self.sacrifice(ctx),
            _ => false,
        };
        if handled {
            self.settle(ctx);
        }
        handled
    }

    fn on_out_of_limits(&mut self, body: BodyHandle, ctx: &mut AgentContext<'_>) -> bool {
        match self.role_of(body) {
            Some(Role::Main) => {
                log::info!("Main blob of '{}' left the world limits.", self.name);
                self.die(ctx);
                true
            }
            Some(role) => self.destroy_blob(role, false, ctx),
            None => false,
        }
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn destroy(&mut self, ctx: &mut AgentContext<'_>) {
        if let Some(main) = self.main.as_mut() {
            main.destroy(ctx.physics, ctx.bus, false);
        }
        self.release_thrown(ctx);
        self.alive = false;
    }

    fn bodies(&self) -> Vec<BodyHandle> {
        self.blobs()
            .filter(|b| !b.is_destroyed())
            .flat_map(|b| b.bodies())
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
