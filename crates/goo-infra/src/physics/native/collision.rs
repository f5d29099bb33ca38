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

//! # Narrow Phase
//!
//! Contact manifolds for circles and oriented boxes. Normals always point
//! from the first shape to the second.

use goo_core::math::{Aabb, Vec2, EPSILON};
use goo_core::physics::ShapeKind;

/// Separation below which clipped points count as touching.
const TOUCH_TOLERANCE: f32 = 0.0;
/// Bias that keeps the reference face stable between steps.
const REFERENCE_FACE_TOLERANCE: f32 = 0.0005;

/// A shape placed in world space.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WorldShape {
    pub kind: ShapeKind,
    pub center: Vec2,
    pub angle: f32,
}

impl WorldShape {
    pub(crate) fn aabb(&self) -> Aabb {
        match self.kind {
            ShapeKind::Circle { radius } => {
                Aabb::from_center_half_extents(self.center, Vec2::new(radius, radius))
            }
            ShapeKind::Box { half_extents } => {
                let (sin, cos) = self.angle.sin_cos();
                let extent = Vec2::new(
                    cos.abs() * half_extents.x + sin.abs() * half_extents.y,
                    sin.abs() * half_extents.x + cos.abs() * half_extents.y,
                );
                Aabb::from_center_half_extents(self.center, extent)
            }
        }
    }

    pub(crate) fn contains(&self, point: Vec2) -> bool {
        match self.kind {
            ShapeKind::Circle { radius } => point.distance_squared(self.center) <= radius * radius,
            ShapeKind::Box { half_extents } => {
                let local = (point - self.center).rotate(-self.angle);
                local.x.abs() <= half_extents.x && local.y.abs() <= half_extents.y
            }
        }
    }

    /// World-space outline: box corners, or a single center for circles.
    pub(crate) fn vertices(&self) -> Vec<Vec2> {
        match self.kind {
            ShapeKind::Circle { .. } => vec![self.center],
            ShapeKind::Box { half_extents } => Polygon::from_box(self.center, self.angle, half_extents)
                .vertices
                .to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ManifoldPoint {
    pub position: Vec2,
    pub separation: f32,
    pub id: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Manifold {
    pub normal: Vec2,
    pub points: Vec<ManifoldPoint>,
}

/// Computes the contact manifold between two shapes, `None` when apart.
pub(crate) fn collide(a: &WorldShape, b: &WorldShape) -> Option<Manifold> {
    match (a.kind, b.kind) {
        (ShapeKind::Circle { radius: ra }, ShapeKind::Circle { radius: rb }) => {
            collide_circles(a.center, ra, b.center, rb)
        }
        (ShapeKind::Box { half_extents }, ShapeKind::Circle { radius }) => {
            let poly = Polygon::from_box(a.center, a.angle, half_extents);
            collide_polygon_circle(&poly, b.center, radius)
        }
        (ShapeKind::Circle { radius }, ShapeKind::Box { half_extents }) => {
            let poly = Polygon::from_box(b.center, b.angle, half_extents);
            collide_polygon_circle(&poly, a.center, radius).map(|mut m| {
                m.normal = -m.normal;
                m
            })
        }
        (ShapeKind::Box { half_extents: ha }, ShapeKind::Box { half_extents: hb }) => {
            let pa = Polygon::from_box(a.center, a.angle, ha);
            let pb = Polygon::from_box(b.center, b.angle, hb);
            collide_polygons(&pa, &pb)
        }
    }
}

fn collide_circles(ca: Vec2, ra: f32, cb: Vec2, rb: f32) -> Option<Manifold> {
    let d = cb - ca;
    let distance = d.length();
    let separation = distance - ra - rb;
    if separation > TOUCH_TOLERANCE {
        return None;
    }
    let normal = if distance > EPSILON { d / distance } else { Vec2::Y };
    Some(Manifold {
        normal,
        points: vec![ManifoldPoint {
            position: ca + normal * (ra + 0.5 * separation),
            separation,
            id: 0,
        }],
    })
}

/// Counter-clockwise quad with outward edge normals, edge `i` runs from
/// vertex `i` to vertex `i + 1`.
#[derive(Debug, Clone, Copy)]
struct Polygon {
    center: Vec2,
    angle: f32,
    half_extents: Vec2,
    vertices: [Vec2; 4],
    normals: [Vec2; 4],
}

impl Polygon {
    fn from_box(center: Vec2, angle: f32, half_extents: Vec2) -> Self {
        let (hx, hy) = (half_extents.x, half_extents.y);
        let local = [
            Vec2::new(-hx, -hy),
            Vec2::new(hx, -hy),
            Vec2::new(hx, hy),
            Vec2::new(-hx, hy),
        ];
        let local_normals = [Vec2::new(0.0, -1.0), Vec2::X, Vec2::Y, Vec2::new(-1.0, 0.0)];
        Self {
            center,
            angle,
            half_extents,
            vertices: local.map(|v| center + v.rotate(angle)),
            normals: local_normals.map(|n| n.rotate(angle)),
        }
    }
}

fn collide_polygon_circle(poly: &Polygon, center: Vec2, radius: f32) -> Option<Manifold> {
    let mut face = 0;
    let mut max_separation = f32::MIN;
    for i in 0..4 {
        let s = poly.normals[i].dot(center - poly.vertices[i]);
        if s > radius {
            return None;
        }
        if s > max_separation {
            max_separation = s;
            face = i;
        }
    }

    if max_separation < EPSILON {
        // Center inside the box: push out through the closest face.
        let normal = poly.normals[face];
        let separation = max_separation - radius;
        return Some(Manifold {
            normal,
            points: vec![ManifoldPoint {
                position: center - normal * (0.5 * (radius + max_separation)),
                separation,
                id: face as u32,
            }],
        });
    }

    let local = (center - poly.center).rotate(-poly.angle);
    let clamped = Vec2::new(
        local.x.clamp(-poly.half_extents.x, poly.half_extents.x),
        local.y.clamp(-poly.half_extents.y, poly.half_extents.y),
    );
    let offset = local - clamped;
    let distance = offset.length();
    if distance > radius || distance < EPSILON {
        return None;
    }
    let normal = (offset / distance).rotate(poly.angle);
    let closest = poly.center + clamped.rotate(poly.angle);
    let separation = distance - radius;
    Some(Manifold {
        normal,
        points: vec![ManifoldPoint {
            position: (closest + center - normal * radius) * 0.5,
            separation,
            id: face as u32,
        }],
    })
}

fn find_max_separation(p1: &Polygon, p2: &Polygon) -> (usize, f32) {
    let mut best_edge = 0;
    let mut max_separation = f32::MIN;
    for i in 0..4 {
        let n = p1.normals[i];
        let v1 = p1.vertices[i];
        let si = p2
            .vertices
            .iter()
            .map(|v2| n.dot(*v2 - v1))
            .fold(f32::MAX, f32::min);
        if si > max_separation {
            max_separation = si;
            best_edge = i;
        }
    }
    (best_edge, max_separation)
}

#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    v: Vec2,
    id: u32,
}

fn clip_segment(input: [ClipVertex; 2], normal: Vec2, offset: f32, clip_id: u32) -> Vec<ClipVertex> {
    let mut out = Vec::with_capacity(2);
    let d0 = normal.dot(input[0].v) - offset;
    let d1 = normal.dot(input[1].v) - offset;
    if d0 <= 0.0 {
        out.push(input[0]);
    }
    if d1 <= 0.0 {
        out.push(input[1]);
    }
    if d0 * d1 < 0.0 {
        let t = d0 / (d0 - d1);
        out.push(ClipVertex {
            v: input[0].v + (input[1].v - input[0].v) * t,
            id: clip_id,
        });
    }
    out
}

fn collide_polygons(a: &Polygon, b: &Polygon) -> Option<Manifold> {
    let (edge_a, separation_a) = find_max_separation(a, b);
    if separation_a > TOUCH_TOLERANCE {
        return None;
    }
    let (edge_b, separation_b) = find_max_separation(b, a);
    if separation_b > TOUCH_TOLERANCE {
        return None;
    }

    let (reference, incident, edge, flip) = if separation_b > separation_a + REFERENCE_FACE_TOLERANCE {
        (b, a, edge_b, true)
    } else {
        (a, b, edge_a, false)
    };

    let ref_normal = reference.normals[edge];
    let i1 = (0..4)
        .min_by(|&i, &j| {
            ref_normal
                .dot(incident.normals[i])
                .total_cmp(&ref_normal.dot(incident.normals[j]))
        })
        .unwrap_or(0);
    let i2 = (i1 + 1) % 4;
    let incident_edge = [
        ClipVertex {
            v: incident.vertices[i1],
            id: i1 as u32,
        },
        ClipVertex {
            v: incident.vertices[i2],
            id: i2 as u32,
        },
    ];

    let v11 = reference.vertices[edge];
    let v12 = reference.vertices[(edge + 1) % 4];
    let tangent = (v12 - v11).normalize();
    let normal = Vec2::new(tangent.y, -tangent.x);
    let front_offset = normal.dot(v11);
    let side_offset1 = -tangent.dot(v11);
    let side_offset2 = tangent.dot(v12);

    let clipped = clip_segment(incident_edge, -tangent, side_offset1, 4);
    if clipped.len() < 2 {
        return None;
    }
    let clipped = clip_segment([clipped[0], clipped[1]], tangent, side_offset2, 5);
    if clipped.len() < 2 {
        return None;
    }

    let feature = ((flip as u32) << 12) | ((edge as u32) << 8) | ((i1 as u32) << 4);
    let points: Vec<ManifoldPoint> = clipped
        .iter()
        .filter_map(|cv| {
            let separation = normal.dot(cv.v) - front_offset;
            (separation <= TOUCH_TOLERANCE).then(|| ManifoldPoint {
                position: cv.v - normal * (0.5 * separation),
                separation,
                id: feature | cv.id,
            })
        })
        .collect();

    if points.is_empty() {
        return None;
    }
    Some(Manifold {
        normal: if flip { -normal } else { normal },
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn circle(center: Vec2, radius: f32) -> WorldShape {
        WorldShape {
            kind: ShapeKind::Circle { radius },
            center,
            angle: 0.0,
        }
    }

    fn cuboid(center: Vec2, hx: f32, hy: f32) -> WorldShape {
        WorldShape {
            kind: ShapeKind::Box {
                half_extents: Vec2::new(hx, hy),
            },
            center,
            angle: 0.0,
        }
    }

    #[test]
    fn test_overlapping_circles_report_penetration() {
        let m = collide(&circle(Vec2::ZERO, 1.0), &circle(Vec2::new(1.5, 0.0), 1.0)).unwrap();
        assert_relative_eq!(m.normal.x, 1.0);
        assert_eq!(m.points.len(), 1);
        assert_relative_eq!(m.points[0].separation, -0.5);
        assert_relative_eq!(m.points[0].position.x, 0.75);
    }

    #[test]
    fn test_separated_circles_do_not_collide() {
        assert!(collide(&circle(Vec2::ZERO, 1.0), &circle(Vec2::new(3.0, 0.0), 1.0)).is_none());
    }

    #[test]
    fn test_circle_resting_on_box_has_upward_normal() {
        let ground = cuboid(Vec2::ZERO, 5.0, 0.5);
        let ball = circle(Vec2::new(0.0, 0.9), 0.5);
        let m = collide(&ground, &ball).unwrap();
        assert_relative_eq!(m.normal.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(m.points[0].separation, -0.1, epsilon = 1e-5);

        let swapped = collide(&ball, &ground).unwrap();
        assert_relative_eq!(swapped.normal.y, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_stacked_boxes_produce_two_point_manifold() {
        let ground = cuboid(Vec2::ZERO, 5.0, 0.5);
        let crate_box = cuboid(Vec2::new(0.0, 0.95), 0.5, 0.5);
        let m = collide(&ground, &crate_box).unwrap();
        assert_relative_eq!(m.normal.y, 1.0, epsilon = 1e-5);
        assert_eq!(m.points.len(), 2);
        for p in &m.points {
            assert_relative_eq!(p.separation, -0.05, epsilon = 1e-5);
        }
        assert_ne!(m.points[0].id, m.points[1].id);
    }

    #[test]
    fn test_separated_boxes_do_not_collide() {
        let a = cuboid(Vec2::ZERO, 0.5, 0.5);
        let b = cuboid(Vec2::new(1.2, 0.0), 0.5, 0.5);
        assert!(collide(&a, &b).is_none());
    }

    #[test]
    fn test_rotated_box_aabb_grows() {
        let mut shape = cuboid(Vec2::ZERO, 1.0, 1.0);
        shape.angle = std::f32::consts::FRAC_PI_4;
        let aabb = shape.aabb();
        assert_relative_eq!(aabb.max.x, std::f32::consts::SQRT_2, epsilon = 1e-5);
        assert!(shape.contains(Vec2::new(0.0, 1.3)));
        assert!(!shape.contains(Vec2::new(1.0, 1.0)));
    }
}
