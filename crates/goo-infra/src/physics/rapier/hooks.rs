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

use rapier2d::prelude::*;

/// Collision group index stored in the low bits of a collider's user data.
pub(crate) fn group_index(collider: &Collider) -> i32 {
    collider.user_data as u32 as i32
}

/// Encodes a group index into collider user data.
pub(crate) fn encode_group(group_index: i32) -> u128 {
    group_index as u32 as u128
}

/// Applies the signed collision group rule: shapes sharing a negative group
/// never collide, shapes sharing a positive group always do.
pub(crate) struct GroupFilter;

impl PhysicsHooks for GroupFilter {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        let (Some(c1), Some(c2)) = (
            context.colliders.get(context.collider1),
            context.colliders.get(context.collider2),
        ) else {
            return Some(SolverFlags::COMPUTE_IMPULSES);
        };
        let (g1, g2) = (group_index(c1), group_index(c2));
        if g1 == g2 && g1 < 0 {
            None
        } else {
            Some(SolverFlags::COMPUTE_IMPULSES)
        }
    }

    fn filter_intersection_pair(&self, context: &PairFilterContext) -> bool {
        match (
            context.colliders.get(context.collider1),
            context.colliders.get(context.collider2),
        ) {
            (Some(c1), Some(c2)) => {
                let (g1, g2) = (group_index(c1), group_index(c2));
                !(g1 == g2 && g1 < 0)
            }
            _ => true,
        }
    }
}
