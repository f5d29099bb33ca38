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

use goo_core::math::{Aabb, Vec2};
use goo_core::physics::{pack_handle, unpack_handle, BodyHandle, ShapeHandle};
use rapier2d::na::{Point2, Vector2};
use rapier2d::prelude::{ColliderHandle, Real, RigidBodyHandle};

pub(crate) fn to_rapier_vec(v: Vec2) -> Vector2<Real> {
    Vector2::new(v.x, v.y)
}

pub(crate) fn to_rapier_point(v: Vec2) -> Point2<Real> {
    Point2::new(v.x, v.y)
}

pub(crate) fn from_rapier_vec(v: &Vector2<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

pub(crate) fn from_rapier_point(p: &Point2<Real>) -> Vec2 {
    Vec2::new(p.x, p.y)
}

pub(crate) fn from_rapier_aabb(aabb: &rapier2d::parry::bounding_volume::Aabb) -> Aabb {
    Aabb::from_min_max(from_rapier_point(&aabb.mins), from_rapier_point(&aabb.maxs))
}

pub(crate) fn body_handle(handle: RigidBodyHandle) -> BodyHandle {
    let (index, generation) = handle.into_raw_parts();
    BodyHandle(pack_handle(index, generation))
}

pub(crate) fn rapier_body(handle: BodyHandle) -> RigidBodyHandle {
    let (index, generation) = unpack_handle(handle.0);
    RigidBodyHandle::from_raw_parts(index, generation)
}

pub(crate) fn shape_handle(handle: ColliderHandle) -> ShapeHandle {
    let (index, generation) = handle.into_raw_parts();
    ShapeHandle(pack_handle(index, generation))
}

pub(crate) fn rapier_collider(handle: ShapeHandle) -> ColliderHandle {
    let (index, generation) = unpack_handle(handle.0);
    ColliderHandle::from_raw_parts(index, generation)
}
