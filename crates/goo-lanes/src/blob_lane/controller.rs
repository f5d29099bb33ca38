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

use goo_core::agent::AgentId;
use goo_core::event::{BlobDeathInfo, EventBus, EventData};
use goo_core::math::{Aabb, Vec2};
use goo_core::physics::{BodyHandle, BodyType, ContactPhase, JointHandle};

use super::BlobParams;
use crate::physics_lane::PhysicsWorld;

/// Integrity of a healthy blob.
pub const MAX_INTEGRITY: f32 = 100.0;

const LIGHT_DAMAGE: f32 = 10.0;
const HEAVY_DAMAGE: f32 = 20.0;
const HEALTH_GAIN: f32 = 10.0;
const MIN_RADIUS_FRACTION: f32 = 0.1;

/// How hard a damaging hit was, relative to the blob's damage threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageTier {
    /// Above the threshold: -10 integrity, spokes shrink by 1/30 of the initial radius.
    Light,
    /// At least 1.5 times the threshold: -20 integrity, spokes shrink by 1/10.
    Heavy,
    /// At least 3 times the threshold: integrity drops to zero.
    Lethal,
}

impl DamageTier {
    /// Classifies `impulse` against `threshold`.
    ///
    /// ## Returns
    /// `None` unless `impulse > threshold`.
    pub fn classify(impulse: f32, threshold: f32) -> Option<Self> {
        if impulse.is_nan() || impulse <= threshold {
            return None;
        }
        Some(if impulse >= 3.0 * threshold {
            Self::Lethal
        } else if impulse >= 1.5 * threshold {
            Self::Heavy
        } else {
            Self::Light
        })
    }
}

/// Returns `true` when every outer body sits beyond `tolerance` of the center
/// on the same side (+x, -x, +y or -y).
///
/// A coarse heuristic: a blob whose rim has collapsed to one side of its
/// center has been torn apart.
pub fn blob_broken(center: Vec2, outer: &[Vec2], tolerance: f32) -> bool {
    if outer.is_empty() {
        return false;
    }
    let mut sides = [0usize; 4];
    for point in outer {
        let offset = *point - center;
        if offset.x > tolerance {
            sides[0] += 1;
        }
        if offset.x < -tolerance {
            sides[1] += 1;
        }
        if offset.y > tolerance {
            sides[2] += 1;
        }
        if offset.y < -tolerance {
            sides[3] += 1;
        }
    }
    sides.iter().any(|&count| count == outer.len())
}

/// State of one soft-body blob.
///
/// The center body handle doubles as the blob id. The controller owns its
/// bodies and joints and releases them in [`BlobController::destroy`].
#[derive(Debug)]
pub struct BlobController {
    params: BlobParams,
    owner: Option<AgentId>,
    center: BodyHandle,
    outer: Vec<BodyHandle>,
    spokes: Vec<JointHandle>,
    rim: Vec<JointHandle>,
    integrity: f32,
    initial_radius: f32,
    radius: f32,
    active: bool,
    destroyed: bool,
    is_main: bool,
    pending_move: Option<Vec2>,
    skin_contacts: u32,
    damage_timer: f32,
    position: Vec2,
    velocity: Vec2,
}

impl BlobController {
    pub(crate) fn new(
        params: BlobParams,
        owner: Option<AgentId>,
        center: BodyHandle,
        outer: Vec<BodyHandle>,
        spokes: Vec<JointHandle>,
        rim: Vec<JointHandle>,
    ) -> Self {
        Self {
            owner,
            center,
            outer,
            spokes,
            rim,
            integrity: params.initial_integrity.clamp(0.0, MAX_INTEGRITY),
            initial_radius: params.radius,
            radius: params.radius,
            active: false,
            destroyed: false,
            is_main: false,
            pending_move: None,
            skin_contacts: 0,
            // The first hit is never filtered.
            damage_timer: params.damage_filter_time,
            position: params.position,
            velocity: Vec2::ZERO,
            params,
        }
    }

    /// The blob id: the handle of its center body.
    pub fn id(&self) -> BodyHandle {
        self.center
    }

    /// Owner tag of the blob's bodies.
    pub fn owner(&self) -> Option<AgentId> {
        self.owner
    }

    /// Parameters the blob was built with.
    pub fn params(&self) -> &BlobParams {
        &self.params
    }

    /// Outer bodies, in ring order.
    pub fn outer_bodies(&self) -> &[BodyHandle] {
        &self.outer
    }

    /// Center-to-rim joints.
    pub fn spokes(&self) -> &[JointHandle] {
        &self.spokes
    }

    /// Center body followed by the outer bodies.
    pub fn bodies(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        std::iter::once(self.center).chain(self.outer.iter().copied())
    }

    /// Whether `body` is part of this blob.
    pub fn owns_body(&self, body: BodyHandle) -> bool {
        !self.destroyed && (body == self.center || self.outer.contains(&body))
    }

    /// Remaining integrity, from 0 to [`MAX_INTEGRITY`].
    pub fn integrity(&self) -> f32 {
        self.integrity
    }

    /// Integrity as a fraction of [`MAX_INTEGRITY`].
    pub fn integrity_percent(&self) -> f32 {
        self.integrity / MAX_INTEGRITY
    }

    /// Whether a hit landed within the last damage filter window.
    pub fn is_damaged(&self) -> bool {
        self.damage_timer < self.params.damage_filter_time
    }

    /// Current spoke length.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Spoke length at build time.
    pub fn initial_radius(&self) -> f32 {
        self.initial_radius
    }

    /// Center position sampled on the last update.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Center velocity sampled on the last update.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Whether the blob accepts steering.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether [`BlobController::destroy`] already ran.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Whether this is the player's main blob.
    pub fn is_main(&self) -> bool {
        self.is_main
    }

    /// Number of contacts currently touching the blob from outside.
    pub fn skin_contacts(&self) -> u32 {
        self.skin_contacts
    }

    /// Hands control to this blob.
    ///
    /// ## Returns
    /// `false` if the blob is already destroyed.
    pub fn start_controlling(&mut self, is_main: bool) -> bool {
        if self.destroyed {
            log::warn!("Cannot control destroyed blob {}.", self.center);
            return false;
        }
        self.active = true;
        self.is_main = is_main;
        log::debug!("Controlling blob {} (main: {is_main}).", self.center);
        true
    }

    /// Leaves the blob to autonomous simulation.
    pub fn stop_controlling(&mut self) {
        self.active = false;
        self.pending_move = None;
    }

    /// Requests a move, applied on the next update that follows a physics step.
    pub fn move_blob(&mut self, direction: Vec2) {
        if self.active {
            self.pending_move = Some(direction);
        }
    }

    /// Tracks how many outside contacts touch the blob.
    pub fn on_contact(&mut self, phase: ContactPhase) {
        match phase {
            ContactPhase::Added => self.skin_contacts += 1,
            ContactPhase::Removed => self.skin_contacts = self.skin_contacts.saturating_sub(1),
            ContactPhase::Persisted | ContactPhase::Result => {}
        }
    }

    /// Advances the blob by `dt`.
    pub fn update(&mut self, dt: f32, physics: &mut PhysicsWorld) {
        if self.destroyed {
            return;
        }
        self.damage_timer += dt;

        if self.active {
            if let Some(direction) = self.pending_move {
                if physics.physics_stepped() {
                    self.pending_move = None;
                    self.apply_move(direction, physics);
                }
            }
        }

        if let Some(state) = physics.body_state(self.center) {
            self.position = state.position;
            self.velocity = state.linear_velocity;
        }

        if self.active {
            let outer: Vec<Vec2> = self
                .outer
                .iter()
                .filter_map(|body| physics.position(*body))
                .collect();
            if blob_broken(self.position, &outer, self.params.broken_tolerance) {
                log::debug!("Blob {} is broken.", self.center);
                self.integrity = 0.0;
            }
        }

        self.integrity = self.integrity.clamp(0.0, MAX_INTEGRITY);
        if self.integrity <= 0.0 && self.active {
            self.active = false;
            log::debug!("Blob {} lost all integrity.", self.center);
        }
    }

    fn apply_move(&self, direction: Vec2, physics: &mut PhysicsWorld) {
        if self.skin_contacts < self.params.min_move_contacts {
            log::trace!("Blob {} has no grip, move dropped.", self.center);
            return;
        }
        let impulse = direction.clamp_length(1.0) * self.params.move_impulse;
        for body in self.bodies() {
            physics.apply_impulse(body, impulse);
        }
    }

    /// Applies a contact impulse to the blob.
    ///
    /// ## Arguments
    /// * `impulse` - Normal impulse of the contact.
    /// * `physics` - World owning the spokes to shrink.
    ///
    /// ## Returns
    /// The tier of the hit, or `None` when it was below the threshold,
    /// inside the damage filter window or the blob is already dead.
    pub fn apply_damage(&mut self, impulse: f32, physics: &mut PhysicsWorld) -> Option<DamageTier> {
        if self.destroyed || self.integrity <= 0.0 {
            return None;
        }
        if self.damage_timer < self.params.damage_filter_time {
            return None;
        }
        let tier = DamageTier::classify(impulse, self.params.damage_force)?;
        self.damage_timer = 0.0;

        match tier {
            DamageTier::Lethal => self.integrity = 0.0,
            DamageTier::Heavy => {
                self.integrity -= HEAVY_DAMAGE;
                self.resize(-self.initial_radius / 10.0, physics);
            }
            DamageTier::Light => {
                self.integrity -= LIGHT_DAMAGE;
                self.resize(-self.initial_radius / 30.0, physics);
            }
        }
        self.integrity = self.integrity.clamp(0.0, MAX_INTEGRITY);
        if self.integrity <= 0.0 {
            self.active = false;
        }
        log::debug!(
            "Blob {} took a {tier:?} hit ({impulse:.2}), integrity {:.0}, radius {:.3}.",
            self.center,
            self.integrity,
            self.radius
        );
        Some(tier)
    }

    /// Takes `amount` of integrity without touching the spokes.
    pub fn spend_integrity(&mut self, amount: f32) {
        if self.destroyed {
            return;
        }
        self.integrity = (self.integrity - amount).clamp(0.0, MAX_INTEGRITY);
        if self.integrity <= 0.0 {
            self.active = false;
        }
    }

    /// Heals the blob and grows its spokes back toward the initial radius.
    pub fn apply_health(&mut self, physics: &mut PhysicsWorld) {
        if self.destroyed {
            return;
        }
        self.integrity = (self.integrity + HEALTH_GAIN).min(MAX_INTEGRITY);
        self.resize(self.initial_radius / 30.0, physics);
    }

    fn resize(&mut self, delta: f32, physics: &mut PhysicsWorld) {
        let floor = self.initial_radius * MIN_RADIUS_FRACTION;
        for spoke in &self.spokes {
            let current = physics.joint_length(*spoke).unwrap_or(self.radius);
            // Spokes never sit below the floor, and one step shrinks by at
            // most a tenth of the initial radius.
            debug_assert!(
                current + delta >= -1e-4,
                "negative spoke length {}",
                current + delta
            );
            let length = (current + delta).clamp(floor, self.initial_radius);
            physics.set_joint_length(*spoke, length);
            self.radius = length;
        }
        if self.spokes.is_empty() {
            self.radius = (self.radius + delta).clamp(floor, self.initial_radius);
        }
        let rim = self.params.rim_length(self.radius);
        for joint in &self.rim {
            physics.set_joint_length(*joint, rim);
        }
    }

    /// Releases the blob's joints then bodies and queues a `BlobDeath` event.
    ///
    /// ## Arguments
    /// * `affect` - Report the nearby dynamic bodies in the death event.
    ///
    /// ## Returns
    /// `false` if the blob was already destroyed.
    pub fn destroy<C>(&mut self, physics: &mut PhysicsWorld, bus: &mut EventBus<C>, affect: bool) -> bool {
        if self.destroyed {
            return false;
        }
        let position = physics.position(self.center).unwrap_or(self.position);
        let affected_bodies = if affect {
            self.affected_bodies(position, physics)
        } else {
            Vec::new()
        };

        for joint in self.spokes.drain(..).chain(self.rim.drain(..)) {
            let _ = physics.destroy_joint(joint);
        }
        for body in std::iter::once(self.center).chain(self.outer.iter().copied()) {
            let _ = physics.destroy_body(body);
        }

        self.destroyed = true;
        self.active = false;
        self.integrity = 0.0;
        self.pending_move = None;
        self.position = position;
        log::debug!(
            "Blob {} destroyed at ({:.2}, {:.2}), {} bodies affected.",
            self.center,
            position.x,
            position.y,
            affected_bodies.len()
        );

        let death = bus.stamp(EventData::BlobDeath(BlobDeathInfo {
            owner: self.owner,
            position,
            radius: self.radius,
            is_main: self.is_main,
            affected_bodies,
        }));
        if let Err(err) = bus.queue_event(death) {
            log::trace!("Blob death not published: {err}");
        }
        true
    }

    fn affected_bodies(&self, position: Vec2, physics: &PhysicsWorld) -> Vec<BodyHandle> {
        let half = self.radius * self.params.affect_radius_scale;
        let area = Aabb::from_center_half_extents(position, Vec2::new(half, half));
        physics
            .query_aabb(&area, true)
            .into_iter()
            .filter(|body| !self.owns_body(*body))
            .filter(|body| {
                physics
                    .body_state(*body)
                    .is_some_and(|state| state.body_type == BodyType::Dynamic)
            })
            .collect()
    }

    /// Center position followed by the outer positions, closed on the first
    /// outer body: a triangle fan for the presentation layer.
    pub fn outline(&self, physics: &PhysicsWorld) -> Vec<Vec2> {
        if self.destroyed {
            return Vec::new();
        }
        let mut fan = Vec::with_capacity(self.outer.len() + 2);
        fan.push(physics.position(self.center).unwrap_or(self.position));
        fan.extend(self.outer.iter().filter_map(|body| physics.position(*body)));
        if let Some(first) = fan.get(1).copied() {
            fan.push(first);
        }
        fan
    }
}
