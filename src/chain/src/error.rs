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

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Transient(String),
    #[error("no such record")]
    NotFound,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("block does not extend the current head")]
    NonSequentialBlock,
    #[error("the genesis block cannot be deleted")]
    CannotDeleteGenesis,
    #[error("block ring exhausted")]
    RingExhausted,
    #[error("block is not hashed")]
    MissingId,
    #[error("no such block")]
    NoSuchBlock,
    #[error(transparent)]
    Storage(#[from] StorageError),
}
