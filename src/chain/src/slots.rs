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

//! Slot arithmetic. All block and transaction timestamps are
//! expressed in epoch seconds; a slot is a ten second window
//! owned by a single elected delegate.

use chrono::Utc;
use constants::{EPOCH_START, SLOT_INTERVAL};

/// Converts wall-clock milliseconds to epoch seconds. Clamped to
/// zero for instants before the chain epoch.
pub fn epoch_time(wall_ms: i64) -> u32 {
    let delta = wall_ms - EPOCH_START;

    if delta <= 0 {
        0
    } else {
        (delta / 1000) as u32
    }
}

/// Epoch seconds right now.
pub fn now() -> u32 {
    epoch_time(Utc::now().timestamp_millis())
}

pub fn slot_number(epoch_seconds: u32) -> u32 {
    epoch_seconds / SLOT_INTERVAL
}

pub fn slot_time(slot: u32) -> u32 {
    slot * SLOT_INTERVAL
}

pub fn current_slot() -> u32 {
    slot_number(now())
}

pub fn next_slot() -> u32 {
    current_slot() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_gating() {
        assert_eq!(epoch_time(EPOCH_START + 25_000), 25);
        assert_eq!(slot_number(25), 2);
        assert_eq!(slot_time(2), 20);
    }

    #[test]
    fn pre_epoch_instants_clamp_to_zero() {
        assert_eq!(epoch_time(EPOCH_START - 1), 0);
        assert_eq!(epoch_time(0), 0);
    }

    quickcheck::quickcheck! {
        fn slot_number_inverts_slot_time(slot: u32) -> bool {
            let slot = slot % (u32::MAX / SLOT_INTERVAL);
            slot_number(slot_time(slot)) == slot
        }
    }
}
