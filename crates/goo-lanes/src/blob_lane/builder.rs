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
use goo_core::math::{Vec2, TAU};
use goo_core::physics::{BodyDef, BodyHandle, JointDef, JointHandle, ShapeDef};

use super::{BlobController, BlobParams};
use crate::physics_lane::{PhysicsError, PhysicsWorld};

/// Wires the bodies and joints of a blob.
///
/// Every body of one blob shares a freshly allocated negative collision
/// group, so the blob never collides with itself.
#[derive(Debug, Clone)]
pub struct BlobBuilder {
    params: BlobParams,
    owner: Option<AgentId>,
}

impl BlobBuilder {
    /// Starts a builder from `params`.
    pub fn new(params: BlobParams) -> Self {
        Self {
            params,
            owner: None,
        }
    }

    /// Tags every body of the blob with `owner`.
    pub fn owner(mut self, owner: AgentId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Shrinks the blob by `scale` and moves it to `position`.
    pub fn scaled(mut self, scale: f32, position: Vec2) -> Self {
        self.params = self.params.scaled(scale, position);
        self
    }

    /// Creates the blob in `world`.
    ///
    /// ## Returns
    /// The controller of the new blob. If a joint is rejected, every body
    /// created so far is released again and the error is returned.
    pub fn build(self, world: &mut PhysicsWorld) -> Result<BlobController, PhysicsError> {
        let params = self.params;
        let group = world.allocate_group();
        let shape = |radius: f32| ShapeDef {
            density: params.density,
            friction: params.friction,
            restitution: params.restitution,
            group_index: group,
            ..ShapeDef::circle(radius)
        };

        let center = world.create_body(
            &BodyDef {
                position: params.position,
                owner: self.owner,
                shapes: vec![shape(params.center_radius)],
                ..Default::default()
            },
            None,
        )?;

        let mut outer = Vec::with_capacity(params.outer_count);
        for i in 0..params.outer_count {
            let angle = TAU * i as f32 / params.outer_count as f32;
            let body = world.create_body(
                &BodyDef {
                    position: params.position + Vec2::from_angle(angle) * params.radius,
                    owner: self.owner,
                    shapes: vec![shape(params.outer_radius)],
                    ..Default::default()
                },
                None,
            )?;
            outer.push(body);
        }

        let (spokes, rim) = match wire(world, &params, center, &outer) {
            Ok(joints) => joints,
            Err(err) => {
                // Joints die with their bodies.
                for body in std::iter::once(center).chain(outer.iter().copied()) {
                    let _ = world.destroy_body(body);
                }
                return Err(err);
            }
        };

        log::debug!(
            "Built blob {center} with {} outer bodies, radius {:.2}, group {group}.",
            outer.len(),
            params.radius
        );
        Ok(BlobController::new(
            params, self.owner, center, outer, spokes, rim,
        ))
    }
}

fn wire(
    world: &mut PhysicsWorld,
    params: &BlobParams,
    center: BodyHandle,
    outer: &[BodyHandle],
) -> Result<(Vec<JointHandle>, Vec<JointHandle>), PhysicsError> {
    let mut spokes = Vec::with_capacity(outer.len());
    for &body in outer {
        spokes.push(world.create_joint(
            &JointDef {
                frequency_hz: params.spoke_frequency,
                damping_ratio: params.spoke_damping,
                ..JointDef::distance(center, body, params.radius)
            },
            None,
        )?);
    }

    let mut rim = Vec::new();
    if outer.len() >= 2 {
        let length = params.rim_length(params.radius);
        // Two outer bodies need a single rim joint, not a doubled one.
        let count = if outer.len() == 2 { 1 } else { outer.len() };
        for i in 0..count {
            let (body, next) = (outer[i], outer[(i + 1) % outer.len()]);
            rim.push(world.create_joint(
                &JointDef {
                    frequency_hz: params.rim_frequency,
                    damping_ratio: params.rim_damping,
                    ..JointDef::distance(body, next, length)
                },
                None,
            )?);
        }
    }
    Ok((spokes, rim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use goo_infra::NativeWorld;

    #[test]
    fn test_builds_center_ring_and_joints() {
        let mut world = PhysicsWorld::new(Box::new(NativeWorld::new(Vec2::ZERO)));
        let owner = AgentId::new(2, 0);
        let blob = BlobBuilder::new(BlobParams::default())
            .owner(owner)
            .build(&mut world)
            .unwrap();

        assert_eq!(world.body_count(), 9);
        assert_eq!(world.simulator().joint_count(), 16);
        assert_eq!(blob.outer_bodies().len(), 8);
        for body in blob.bodies() {
            assert_eq!(world.owner_of(body), Some(owner));
        }
        let first = world.position(blob.outer_bodies()[0]).unwrap();
        assert_relative_eq!(first.x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(first.y, 0.0, epsilon = 1e-5);
        for spoke in blob.spokes() {
            assert_relative_eq!(world.joint_length(*spoke).unwrap(), 2.0);
        }
    }

    #[test]
    fn test_scaled_blob_is_smaller_and_in_its_own_group() {
        let mut world = PhysicsWorld::new(Box::new(NativeWorld::new(Vec2::ZERO)));
        let main = BlobBuilder::new(BlobParams::default())
            .build(&mut world)
            .unwrap();
        let thrown = BlobBuilder::new(BlobParams::default())
            .scaled(0.5, Vec2::new(10.0, 0.0))
            .build(&mut world)
            .unwrap();

        assert_relative_eq!(thrown.radius(), 1.0);
        assert_ne!(main.id(), thrown.id());
        assert_eq!(world.position(thrown.id()), Some(Vec2::new(10.0, 0.0)));
    }
}
