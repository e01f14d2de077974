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

/// The maximum amount of verified transactions the pool
/// is allowed to hold.
pub const MAX_POOL_SIZE: usize = 50_000;

/// The maximum amount of unverified transactions waiting
/// in the queue.
pub const MAX_QUEUE_SIZE: usize = 16_384;

/// How far into the future, in seconds of epoch time, a
/// transaction timestamp may lie and still be accepted.
pub const FUTURE_LIMIT: u32 = 30;
