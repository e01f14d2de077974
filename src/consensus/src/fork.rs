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

use chain::Block;

/// Shape of an incoming block relative to the current head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkKind {
    /// Exact successor of the head.
    Sequential,

    /// Consecutive height but a different parent. Both the head
    /// and its parent are suspect.
    ForkOne,

    /// Same height, same parent, different id. A sibling of the
    /// head.
    ForkFive,

    /// Anything else: stale, far-future, or unrelated. Dropped.
    Alien,
}

pub fn classify(head: &Block, incoming: &Block) -> ForkKind {
    let head_id = match head.id {
        Some(id) => id,
        None => return ForkKind::Alien,
    };

    if incoming.previous_block_id == head_id && incoming.height == head.height + 1 {
        return ForkKind::Sequential;
    }

    if incoming.height == head.height + 1 {
        return ForkKind::ForkOne;
    }

    if incoming.height == head.height
        && incoming.previous_block_id == head.previous_block_id
        && incoming.id != head.id
    {
        return ForkKind::ForkFive;
    }

    ForkKind::Alien
}

/// Deterministic fork tie-break: the older block stands; equal
/// timestamps fall back to the numerically smaller id.
pub fn incoming_wins(head: &Block, incoming: &Block) -> bool {
    if incoming.created_at != head.created_at {
        return incoming.created_at < head.created_at;
    }

    match (incoming.id, head.id) {
        (Some(a), Some(b)) => a < b,
        _ => false,
    }
}
