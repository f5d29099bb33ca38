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

use goo_core::math::Vec2;
use serde::{Deserialize, Serialize};

/// Tunables of a soft-body blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobParams {
    /// Spawn position of the center body.
    pub position: Vec2,
    /// Spoke rest length, i.e. the distance between center and outer bodies.
    pub radius: f32,
    /// Number of outer bodies on the rim.
    pub outer_count: usize,
    /// Collision radius of each outer body.
    pub outer_radius: f32,
    /// Collision radius of the center body.
    pub center_radius: f32,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    /// Spring frequency of the center-to-rim joints.
    pub spoke_frequency: f32,
    pub spoke_damping: f32,
    /// Spring frequency of the joints between neighbouring outer bodies.
    pub rim_frequency: f32,
    pub rim_damping: f32,
    /// Normal impulse above which a contact hurts the blob.
    pub damage_force: f32,
    /// Minimum time between two damaging hits.
    pub damage_filter_time: f32,
    /// Distance from the center past which an outer body counts as "off to one side".
    pub broken_tolerance: f32,
    /// Impulse applied per body for a full-strength move.
    pub move_impulse: f32,
    /// Skin contacts needed before a move is applied.
    pub min_move_contacts: u32,
    /// Whether dying reports the nearby dynamic bodies.
    pub affect_on_death: bool,
    /// Affected-area half extent as a multiple of the radius.
    pub affect_radius_scale: f32,
    /// Integrity the blob starts with, at most 100.
    pub initial_integrity: f32,
}

impl Default for BlobParams {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            radius: 2.0,
            outer_count: 8,
            outer_radius: 0.4,
            center_radius: 0.6,
            density: 1.0,
            friction: 0.6,
            restitution: 0.1,
            spoke_frequency: 6.0,
            spoke_damping: 0.5,
            rim_frequency: 8.0,
            rim_damping: 0.5,
            damage_force: 20.0,
            damage_filter_time: 0.25,
            broken_tolerance: 0.25,
            move_impulse: 0.5,
            min_move_contacts: 1,
            affect_on_death: true,
            affect_radius_scale: 2.0,
            initial_integrity: 100.0,
        }
    }
}

impl BlobParams {
    /// Returns a copy shrunk by `scale`, placed at `position`.
    ///
    /// Body sizes, the radius and the joint spring frequencies scale, so the
    /// copy is lighter and softer. Damping ratios, forces, timings and
    /// thresholds do not.
    pub fn scaled(&self, scale: f32, position: Vec2) -> Self {
        Self {
            position,
            radius: self.radius * scale,
            outer_radius: self.outer_radius * scale,
            center_radius: self.center_radius * scale,
            spoke_frequency: self.spoke_frequency * scale,
            rim_frequency: self.rim_frequency * scale,
            ..self.clone()
        }
    }

    /// Rest length of a rim joint for a given spoke length.
    pub fn rim_length(&self, radius: f32) -> f32 {
        if self.outer_count < 2 {
            return 0.0;
        }
        2.0 * radius * (std::f32::consts::PI / self.outer_count as f32).sin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rim_length_is_the_chord() {
        let params = BlobParams {
            outer_count: 4,
            ..Default::default()
        };
        assert_relative_eq!(params.rim_length(1.0), 2.0f32.sqrt(), epsilon = 1e-5);
    }

    #[test]
    fn test_scaled_keeps_thresholds() {
        let params = BlobParams::default();
        let small = params.scaled(0.5, Vec2::new(3.0, 1.0));
        assert_relative_eq!(small.radius, 1.0);
        assert_relative_eq!(small.outer_radius, 0.2);
        assert_relative_eq!(small.damage_force, params.damage_force);
        assert_eq!(small.position, Vec2::new(3.0, 1.0));
    }

    #[test]
    fn test_scaled_softens_joints_but_keeps_damping() {
        let params = BlobParams::default();
        let small = params.scaled(0.5, Vec2::ZERO);
        assert_relative_eq!(small.spoke_frequency, 3.0);
        assert_relative_eq!(small.rim_frequency, 4.0);
        assert_relative_eq!(small.spoke_damping, params.spoke_damping);
        assert_relative_eq!(small.rim_damping, params.rim_damping);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let params: BlobParams = ron::from_str("(radius: 3.0)").unwrap();
        assert_relative_eq!(params.radius, 3.0);
        assert_eq!(params.outer_count, 8);
    }
}
