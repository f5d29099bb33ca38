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

use std::collections::BTreeMap;

use goo_core::physics::{BodyHandle, ContactPhase};

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Pairing {
    contacts: i32,
    elapsed: f32,
}

/// Tracks how long the main blob has been touching each other blob.
///
/// Keyed by the other blob's id. A pairing exists while at least one contact
/// point is open.
#[derive(Debug, Default, Clone)]
pub struct MergeBook {
    pairings: BTreeMap<BodyHandle, Pairing>,
}

impl MergeBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts an opening or closing contact with `blob`.
    pub fn contact(&mut self, blob: BodyHandle, phase: ContactPhase) {
        let delta = match phase {
            ContactPhase::Added => 1,
            ContactPhase::Removed => -1,
            ContactPhase::Persisted | ContactPhase::Result => return,
        };
        let pairing = self.pairings.entry(blob).or_default();
        pairing.contacts += delta;
        if pairing.contacts <= 0 {
            self.pairings.remove(&blob);
        }
    }

    /// Advances every open pairing.
    ///
    /// ## Returns
    /// The blobs touched for at least `merge_time`, in id order. They are no
    /// longer tracked.
    pub fn advance(&mut self, dt: f32, merge_time: f32) -> Vec<BodyHandle> {
        let mut ready = Vec::new();
        for (blob, pairing) in &mut self.pairings {
            pairing.elapsed += dt;
            if pairing.elapsed >= merge_time {
                ready.push(*blob);
            }
        }
        for blob in &ready {
            self.pairings.remove(blob);
        }
        ready
    }

    /// Drops the pairing with `blob`.
    pub fn forget(&mut self, blob: BodyHandle) {
        self.pairings.remove(&blob);
    }

    /// Open contacts with `blob`.
    pub fn contacts_with(&self, blob: BodyHandle) -> i32 {
        self.pairings.get(&blob).map_or(0, |p| p.contacts)
    }

    pub fn len(&self) -> usize {
        self.pairings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairing_lives_while_contacts_are_open() {
        let blob = BodyHandle(7);
        let mut book = MergeBook::new();
        book.contact(blob, ContactPhase::Added);
        book.contact(blob, ContactPhase::Added);
        book.contact(blob, ContactPhase::Persisted);
        book.contact(blob, ContactPhase::Removed);
        assert_eq!(book.contacts_with(blob), 1);
        book.contact(blob, ContactPhase::Removed);
        assert!(book.is_empty());
    }

    #[test]
    fn test_merge_after_merge_time() {
        let blob = BodyHandle(7);
        let mut book = MergeBook::new();
        book.contact(blob, ContactPhase::Added);
        assert!(book.advance(0.5, 1.0).is_empty());
        assert_eq!(book.advance(0.5, 1.0), vec![blob]);
        assert!(book.is_empty());
    }

    #[test]
    fn test_closing_contact_resets_the_clock() {
        let blob = BodyHandle(7);
        let mut book = MergeBook::new();
        book.contact(blob, ContactPhase::Added);
        book.advance(0.9, 1.0);
        book.contact(blob, ContactPhase::Removed);
        book.contact(blob, ContactPhase::Added);
        assert!(book.advance(0.5, 1.0).is_empty());
    }
}
