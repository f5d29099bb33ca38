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

//! Steering Lane
//!
//! Seek and wander behaviors for AI-driven bodies. Forces are only applied
//! on updates where the physics bridge actually stepped, so a frame rate
//! above the simulation rate does not pile up forces.

use goo_core::math::Vec2;
use goo_core::physics::BodyHandle;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::physics_lane::PhysicsWorld;

/// Tunables of the steering behaviors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringParams {
    /// Speed the behaviors steer toward.
    pub max_speed: f32,
    /// Upper bound of the applied force.
    pub max_force: f32,
    /// Radius of the wander circle.
    pub wander_radius: f32,
    /// Distance of the wander circle ahead of the body.
    pub wander_distance: f32,
    /// Random displacement added to the wander point each step.
    pub wander_jitter: f32,
}

impl Default for SteeringParams {
    fn default() -> Self {
        Self {
            max_speed: 4.0,
            max_force: 30.0,
            wander_radius: 1.0,
            wander_distance: 2.0,
            wander_jitter: 0.4,
        }
    }
}

/// Force that turns `velocity` into `desired` over `dt`, clamped to `max_force`.
pub fn steering_force(desired: Vec2, velocity: Vec2, mass: f32, dt: f32, max_force: f32) -> Vec2 {
    if dt <= 0.0 {
        return Vec2::ZERO;
    }
    ((desired - velocity) * (mass / dt)).clamp_length(max_force)
}

/// Per-agent steering state.
#[derive(Debug, Clone)]
pub struct Steering {
    params: SteeringParams,
    rng: StdRng,
    target: Option<Vec2>,
    wander_point: Vec2,
    wander_enabled: bool,
}

impl Steering {
    /// Creates a steering state whose wander jitter is seeded with `seed`.
    pub fn new(params: SteeringParams, seed: u64) -> Self {
        Self {
            wander_point: Vec2::X * params.wander_radius,
            params,
            rng: StdRng::seed_from_u64(seed),
            target: None,
            wander_enabled: false,
        }
    }

    pub fn params(&self) -> &SteeringParams {
        &self.params
    }

    /// Point that [`Steering::seek`] steers toward.
    pub fn target(&self) -> Option<Vec2> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<Vec2>) {
        self.target = target;
    }

    pub fn wander_enabled(&self) -> bool {
        self.wander_enabled
    }

    /// Wandering is off until a state turns it on.
    pub fn set_wander_enabled(&mut self, enabled: bool) {
        self.wander_enabled = enabled;
    }

    /// Pushes `body` toward the target.
    ///
    /// ## Returns
    /// The applied force, or `None` when physics did not step this update,
    /// there is no target or the body is gone.
    pub fn seek(&mut self, body: BodyHandle, dt: f32, physics: &mut PhysicsWorld) -> Option<Vec2> {
        if !physics.physics_stepped() {
            return None;
        }
        let target = self.target?;
        let state = physics.body_state(body)?;
        let desired = (target - state.position).normalize() * self.params.max_speed;
        let force = steering_force(desired, state.linear_velocity, state.mass, dt, self.params.max_force);
        physics.apply_force(body, force);
        log::trace!("Seek {body}: force ({:.2}, {:.2}).", force.x, force.y);
        Some(force)
    }

    /// Pushes `body` toward a jittered point on a circle projected ahead of it.
    ///
    /// ## Returns
    /// The applied force, or `None` when wandering is disabled, physics did
    /// not step this update or the body is gone.
    pub fn wander(&mut self, body: BodyHandle, dt: f32, physics: &mut PhysicsWorld) -> Option<Vec2> {
        if !self.wander_enabled || !physics.physics_stepped() {
            return None;
        }
        let state = physics.body_state(body)?;

        let jitter = self.params.wander_jitter;
        let nudge = Vec2::new(
            self.rng.random_range(-1.0..=1.0) * jitter,
            self.rng.random_range(-1.0..=1.0) * jitter,
        );
        self.wander_point = (self.wander_point + nudge).normalize() * self.params.wander_radius;
        if self.wander_point == Vec2::ZERO {
            self.wander_point = Vec2::X * self.params.wander_radius;
        }

        let mut heading = state.linear_velocity.normalize();
        if heading == Vec2::ZERO {
            heading = Vec2::X;
        }
        let ahead = heading * self.params.wander_distance + self.wander_point;
        let desired = ahead.normalize() * self.params.max_speed;
        let force = steering_force(desired, state.linear_velocity, state.mass, dt, self.params.max_force);
        physics.apply_force(body, force);
        Some(force)
    }
}
