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

//! # Impulse Solver
//!
//! Sequential impulses over contact and distance-joint constraints, with
//! warm starting and Baumgarte stabilization.

use goo_core::math::{Vec2, TAU};

/// Fraction of the penetration resolved per step.
pub(crate) const BAUMGARTE: f32 = 0.2;
/// Allowed penetration before correction kicks in.
pub(crate) const LINEAR_SLOP: f32 = 0.005;
/// Closing speed below which restitution is ignored.
pub(crate) const RESTITUTION_THRESHOLD: f32 = 1.0;
/// Largest position correction applied to a rigid joint in one iteration.
pub(crate) const MAX_LINEAR_CORRECTION: f32 = 0.2;

/// Velocity and pose of one body, copied out of the world for solving.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SolverBody {
    pub position: Vec2,
    pub angle: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub inv_mass: f32,
    pub inv_inertia: f32,
}

impl SolverBody {
    fn apply_impulse(&mut self, impulse: Vec2, arm: Vec2) {
        self.linear_velocity += impulse * self.inv_mass;
        self.angular_velocity += self.inv_inertia * arm.cross(impulse);
    }

    fn velocity_at(&self, arm: Vec2) -> Vec2 {
        self.linear_velocity + Vec2::scalar_cross(self.angular_velocity, arm)
    }
}

fn pair_mut(bodies: &mut [SolverBody], a: usize, b: usize) -> (&mut SolverBody, &mut SolverBody) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = bodies.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = bodies.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ConstraintPoint {
    pub r_a: Vec2,
    pub r_b: Vec2,
    pub normal_mass: f32,
    pub tangent_mass: f32,
    pub bias: f32,
    pub normal_impulse: f32,
    pub tangent_impulse: f32,
}

/// Non-penetration plus Coulomb friction for one manifold.
#[derive(Debug, Clone)]
pub(crate) struct ContactConstraint {
    pub body_a: usize,
    pub body_b: usize,
    pub normal: Vec2,
    pub friction: f32,
    pub points: Vec<ConstraintPoint>,
}

/// Input for one contact point when preparing a [`ContactConstraint`].
pub(crate) struct PointInput {
    pub position: Vec2,
    pub separation: f32,
    pub normal_impulse: f32,
    pub tangent_impulse: f32,
}

impl ContactConstraint {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn prepare(
        bodies: &[SolverBody],
        body_a: usize,
        body_b: usize,
        normal: Vec2,
        friction: f32,
        restitution: f32,
        inputs: &[PointInput],
        inv_dt: f32,
    ) -> Self {
        let a = &bodies[body_a];
        let b = &bodies[body_b];
        let tangent = Vec2::new(normal.y, -normal.x);
        let points = inputs
            .iter()
            .map(|input| {
                let r_a = input.position - a.position;
                let r_b = input.position - b.position;

                let rn_a = r_a.cross(normal);
                let rn_b = r_b.cross(normal);
                let k_normal = a.inv_mass
                    + b.inv_mass
                    + a.inv_inertia * rn_a * rn_a
                    + b.inv_inertia * rn_b * rn_b;

                let rt_a = r_a.cross(tangent);
                let rt_b = r_b.cross(tangent);
                let k_tangent = a.inv_mass
                    + b.inv_mass
                    + a.inv_inertia * rt_a * rt_a
                    + b.inv_inertia * rt_b * rt_b;

                let mut bias =
                    BAUMGARTE * inv_dt * (-input.separation - LINEAR_SLOP).max(0.0);
                let closing = normal.dot(b.velocity_at(r_b) - a.velocity_at(r_a));
                if closing < -RESTITUTION_THRESHOLD {
                    bias = bias.max(-restitution * closing);
                }

                ConstraintPoint {
                    r_a,
                    r_b,
                    normal_mass: if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 },
                    tangent_mass: if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 },
                    bias,
                    normal_impulse: input.normal_impulse,
                    tangent_impulse: input.tangent_impulse,
                }
            })
            .collect();

        Self {
            body_a,
            body_b,
            normal,
            friction,
            points,
        }
    }

    pub(crate) fn warm_start(&self, bodies: &mut [SolverBody]) {
        let tangent = Vec2::new(self.normal.y, -self.normal.x);
        let (a, b) = pair_mut(bodies, self.body_a, self.body_b);
        for p in &self.points {
            let impulse = self.normal * p.normal_impulse + tangent * p.tangent_impulse;
            a.apply_impulse(-impulse, p.r_a);
            b.apply_impulse(impulse, p.r_b);
        }
    }

    pub(crate) fn solve(&mut self, bodies: &mut [SolverBody]) {
        let normal = self.normal;
        let tangent = Vec2::new(normal.y, -normal.x);
        let friction = self.friction;
        let (a, b) = pair_mut(bodies, self.body_a, self.body_b);

        for p in &mut self.points {
            let dv = b.velocity_at(p.r_b) - a.velocity_at(p.r_a);
            let vt = dv.dot(tangent);
            let max_friction = friction * p.normal_impulse;
            let new_tangent =
                (p.tangent_impulse - p.tangent_mass * vt).clamp(-max_friction, max_friction);
            let lambda = new_tangent - p.tangent_impulse;
            p.tangent_impulse = new_tangent;
            let impulse = tangent * lambda;
            a.apply_impulse(-impulse, p.r_a);
            b.apply_impulse(impulse, p.r_b);
        }

        for p in &mut self.points {
            let dv = b.velocity_at(p.r_b) - a.velocity_at(p.r_a);
            let vn = dv.dot(normal);
            let new_normal = (p.normal_impulse + p.normal_mass * (p.bias - vn)).max(0.0);
            let lambda = new_normal - p.normal_impulse;
            p.normal_impulse = new_normal;
            let impulse = normal * lambda;
            a.apply_impulse(-impulse, p.r_a);
            b.apply_impulse(impulse, p.r_b);
        }
    }
}

/// Soft distance constraint between two anchors.
#[derive(Debug, Clone)]
pub(crate) struct DistanceConstraint {
    pub body_a: usize,
    pub body_b: usize,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub length: f32,
    pub frequency_hz: f32,
    pub impulse: f32,
    r_a: Vec2,
    r_b: Vec2,
    axis: Vec2,
    mass: f32,
    gamma: f32,
    bias: f32,
}

impl DistanceConstraint {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn prepare(
        bodies: &[SolverBody],
        body_a: usize,
        body_b: usize,
        local_anchor_a: Vec2,
        local_anchor_b: Vec2,
        length: f32,
        frequency_hz: f32,
        damping_ratio: f32,
        impulse: f32,
        dt: f32,
    ) -> Self {
        let a = &bodies[body_a];
        let b = &bodies[body_b];
        let r_a = local_anchor_a.rotate(a.angle);
        let r_b = local_anchor_b.rotate(b.angle);
        let delta = b.position + r_b - a.position - r_a;
        let current = delta.length();
        let axis = if current > LINEAR_SLOP {
            delta / current
        } else {
            Vec2::ZERO
        };

        let cr_a = r_a.cross(axis);
        let cr_b = r_b.cross(axis);
        let mut inv_mass =
            a.inv_mass + a.inv_inertia * cr_a * cr_a + b.inv_mass + b.inv_inertia * cr_b * cr_b;
        let mut mass = if inv_mass != 0.0 { 1.0 / inv_mass } else { 0.0 };

        let (mut gamma, mut bias) = (0.0, 0.0);
        if frequency_hz > 0.0 {
            let c = current - length;
            let omega = TAU * frequency_hz;
            let damping = 2.0 * mass * damping_ratio * omega;
            let stiffness = mass * omega * omega;
            gamma = dt * (damping + dt * stiffness);
            gamma = if gamma != 0.0 { 1.0 / gamma } else { 0.0 };
            bias = c * dt * stiffness * gamma;
            inv_mass += gamma;
            mass = if inv_mass != 0.0 { 1.0 / inv_mass } else { 0.0 };
        }

        Self {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            length,
            frequency_hz,
            impulse,
            r_a,
            r_b,
            axis,
            mass,
            gamma,
            bias,
        }
    }

    pub(crate) fn warm_start(&self, bodies: &mut [SolverBody]) {
        let (a, b) = pair_mut(bodies, self.body_a, self.body_b);
        let p = self.axis * self.impulse;
        a.apply_impulse(-p, self.r_a);
        b.apply_impulse(p, self.r_b);
    }

    pub(crate) fn solve_velocity(&mut self, bodies: &mut [SolverBody]) {
        let (a, b) = pair_mut(bodies, self.body_a, self.body_b);
        let cdot = self.axis.dot(b.velocity_at(self.r_b) - a.velocity_at(self.r_a));
        let lambda = -self.mass * (cdot + self.bias + self.gamma * self.impulse);
        self.impulse += lambda;
        let p = self.axis * lambda;
        a.apply_impulse(-p, self.r_a);
        b.apply_impulse(p, self.r_b);
    }

    /// Projects rigid joints back to their length. Soft joints are left to
    /// the spring.
    pub(crate) fn solve_position(&self, bodies: &mut [SolverBody]) -> bool {
        if self.frequency_hz > 0.0 {
            return true;
        }
        let (a, b) = pair_mut(bodies, self.body_a, self.body_b);
        let r_a = self.local_anchor_a.rotate(a.angle);
        let r_b = self.local_anchor_b.rotate(b.angle);
        let delta = b.position + r_b - a.position - r_a;
        let current = delta.length();
        if current <= LINEAR_SLOP {
            return true;
        }
        let axis = delta / current;
        let c = (current - self.length).clamp(-MAX_LINEAR_CORRECTION, MAX_LINEAR_CORRECTION);

        let cr_a = r_a.cross(axis);
        let cr_b = r_b.cross(axis);
        let inv_mass =
            a.inv_mass + a.inv_inertia * cr_a * cr_a + b.inv_mass + b.inv_inertia * cr_b * cr_b;
        if inv_mass == 0.0 {
            return true;
        }
        let p = axis * (-c / inv_mass);
        a.position -= p * a.inv_mass;
        a.angle -= a.inv_inertia * r_a.cross(p);
        b.position += p * b.inv_mass;
        b.angle += b.inv_inertia * r_b.cross(p);

        c.abs() < LINEAR_SLOP
    }
}
