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

pub use crate::error::PipelineError;
pub use crate::fork::{classify, incoming_wins, ForkKind};
pub use crate::pipeline::{Broadcaster, NoopBroadcaster, Pipeline, Receipt};
pub use crate::sequence::{Sequence, SequenceGuard};
pub use crate::transport::{
    parse_blocks_response, parse_common_block_response, BlocksResponse, CommonBlock,
    CommonBlockResponse, PeerScore, PeerVerdict, Transport, TransportError,
};

mod error;
mod fork;
mod pipeline;
mod sequence;
mod transport;
