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

/// Wall-clock anchor of the chain epoch, in milliseconds
/// since the unix epoch. 2019-01-01T00:00:00Z.
pub const EPOCH_START: i64 = 1_546_300_800_000;

/// Length of a forging slot, in seconds.
pub const SLOT_INTERVAL: u32 = 10;

/// Number of delegates forging in a single round. A round
/// spans `ACTIVE_DELEGATES` consecutive slots.
pub const ACTIVE_DELEGATES: usize = 11;

/// The maximum amount of transactions a single block may carry.
pub const MAX_TX_PER_BLOCK: usize = 250;

/// The maximum encoded size, in bytes, of the transactions
/// carried by a single block.
pub const MAX_BLOCK_BYTES: usize = 1_048_576; // 1mb

/// Block format version stamped on freshly forged blocks.
pub const BLOCK_VERSION: u32 = 1;

/// Length of the random salt prefixing every transaction.
pub const SALT_LENGTH: usize = 16;

/// Size of the fixed transaction header. The variable asset
/// tail begins at this offset.
pub const TX_HEADER_BYTES: usize = 197;

/// The maximum amount of vote casts a single vote transaction
/// may carry.
pub const MAX_VOTES_PER_TX: usize = 33;

/// Divisor applied to amounts and staked totals when deriving
/// percentage fees. 10_000 yields one basis point.
pub const FEE_DIVISOR: i64 = 10_000;

/// Flat fee charged for registering a second signature key.
pub const SECOND_SIGNATURE_FEE: i64 = 1_000_000;

/// Depth of the in-memory block ring. Must cover at least one
/// full round plus the two blocks a fork-1 recovery drops.
pub const BLOCK_RING_DEPTH: usize = ACTIVE_DELEGATES + 2;
