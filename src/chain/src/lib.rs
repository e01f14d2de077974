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

pub use crate::block::*;
pub use crate::error::*;
pub use crate::genesis::{apply_genesis, make_genesis, GENESIS};
pub use crate::roster::DelegateRoster;
pub use crate::storage::{MemoryStorage, Storage};
pub use crate::store::{ChainRef, ChainStore};

mod block;
mod error;
mod genesis;
mod roster;
pub mod slots;
mod storage;
mod store;

#[cfg(any(test, feature = "test"))]
pub mod test_helpers;
