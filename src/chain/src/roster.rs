/*
  Copyright (C) 2024-2026 The Onyx Core Developers.
  This file is part of the Onyx Core Library.

  The Onyx Core Library is free software: you can redistribute it and/or modify
  it under the terms of the GNU General Public License as published by
  the Free Software Foundation, either version 3 of the License, or
  (at your option) any later version.

  The Onyx Core Library is distributed in the hope that it will be useful,
  but WITHOUT ANY WARRANTY; without even the implied warranty of
  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
  GNU General Public License for more details.

  You should have received a copy of the GNU General Public License
  along with the Onyx Core Library. If not, see <http://www.gnu.org/licenses/>.
*/

use crypto::PublicKey;
use hashbrown::HashSet;

/// Ordered list of registered delegates. One delegate owns each
/// slot; the ordering is rotated by the round number so the same
/// delegate does not keep the same position round after round.
#[derive(Debug, Clone)]
pub struct DelegateRoster {
    delegates: Vec<PublicKey>,
    members: HashSet<PublicKey>,
}

impl DelegateRoster {
    pub fn new(delegates: Vec<PublicKey>) -> DelegateRoster {
        if delegates.is_empty() {
            panic!("A delegate roster cannot be empty!");
        }

        let members = delegates.iter().cloned().collect();

        DelegateRoster { delegates, members }
    }

    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }

    pub fn contains(&self, pkey: &PublicKey) -> bool {
        self.members.contains(pkey)
    }

    pub fn round_of(&self, slot: u32) -> u32 {
        slot / self.delegates.len() as u32
    }

    /// The delegate elected to forge in the given slot.
    pub fn delegate_for_slot(&self, slot: u32) -> &PublicKey {
        let n = self.delegates.len() as u32;
        let round = slot / n;
        let index = ((slot % n) + round) % n;

        &self.delegates[index as usize]
    }

    pub fn is_elected(&self, pkey: &PublicKey, slot: u32) -> bool {
        self.delegate_for_slot(slot) == pkey
    }
}
