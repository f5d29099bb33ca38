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

use goo_core::math::{Vec2, TAU};
use goo_core::physics::DebugDraw;

/// Segments used to approximate a circle outline.
const CIRCLE_SEGMENTS: usize = 16;

/// Collects simulator debug geometry as an indexed line list.
#[derive(Debug, Default, Clone)]
pub struct DebugLines {
    /// Line endpoints.
    pub vertices: Vec<Vec2>,
    /// Pairs of indices into `vertices`.
    pub indices: Vec<[u32; 2]>,
}

impl DebugLines {
    /// Empties the buffers, keeping their capacity.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Number of line segments.
    pub fn line_count(&self) -> usize {
        self.indices.len()
    }

    fn push_line(&mut self, a: Vec2, b: Vec2) {
        let base = self.vertices.len() as u32;
        self.vertices.push(a);
        self.vertices.push(b);
        self.indices.push([base, base + 1]);
    }
}

impl DebugDraw for DebugLines {
    fn draw_circle(&mut self, center: Vec2, radius: f32, axis: Vec2) {
        let step = TAU / CIRCLE_SEGMENTS as f32;
        for i in 0..CIRCLE_SEGMENTS {
            let a = center + Vec2::from_angle(step * i as f32) * radius;
            let b = center + Vec2::from_angle(step * (i + 1) as f32) * radius;
            self.push_line(a, b);
        }
        // Orientation tick.
        self.push_line(center, center + axis * radius);
    }

    fn draw_polygon(&mut self, vertices: &[Vec2]) {
        for (i, a) in vertices.iter().enumerate() {
            let b = vertices[(i + 1) % vertices.len()];
            self.push_line(*a, b);
        }
    }

    fn draw_segment(&mut self, a: Vec2, b: Vec2) {
        self.push_line(a, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes_become_indexed_lines() {
        let mut lines = DebugLines::default();
        lines.draw_polygon(&[Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y]);
        lines.draw_segment(Vec2::ZERO, Vec2::ONE);
        lines.draw_circle(Vec2::ZERO, 1.0, Vec2::X);
        assert_eq!(lines.line_count(), 4 + 1 + CIRCLE_SEGMENTS + 1);
        assert_eq!(lines.vertices.len(), lines.line_count() * 2);

        lines.clear();
        assert_eq!(lines.line_count(), 0);
    }
}
