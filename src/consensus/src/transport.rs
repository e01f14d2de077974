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

//! Peer wire types used by the core. The transport itself (peer
//! discovery, gossip, HTTP plumbing) lives outside; the pipeline
//! only consumes these two calls and judges peers on the way.

use chain::Block;
use crypto::Hash;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("malformed peer payload: {0}")]
    Malformed(String),
    #[error("peer unreachable: {0}")]
    Unreachable(String),
}

/// Body of `GET /blocks?lastBlockId=...`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BlocksResponse {
    pub blocks: Vec<Block>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CommonBlock {
    pub id: Hash,
    pub previous_block: Hash,
    pub height: u64,
}

/// Body of `GET /blocks/common?ids=a,b,c`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CommonBlockResponse {
    pub common: CommonBlock,
}

pub trait Transport: Send + Sync {
    /// Blocks following the given id on the peer's chain.
    fn blocks_after(&self, last_block_id: &Hash) -> Result<BlocksResponse, TransportError>;

    /// The most recent block shared by both chains.
    fn common_block(&self, ids: &[Hash]) -> Result<CommonBlockResponse, TransportError>;
}

/// Strict parse of a peer's blocks payload. Unknown fields and
/// shape mismatches reject the whole response.
pub fn parse_blocks_response(payload: &str) -> Result<BlocksResponse, TransportError> {
    serde_json::from_str(payload).map_err(|e| TransportError::Malformed(e.to_string()))
}

pub fn parse_common_block_response(payload: &str) -> Result<CommonBlockResponse, TransportError> {
    serde_json::from_str(payload).map_err(|e| TransportError::Malformed(e.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerVerdict {
    Keep,
    Ban,
}

/// Failure counter per peer. Persistent validation failures ban
/// the peer; a single malformed payload does not.
#[derive(Debug, Default)]
pub struct PeerScore {
    failures: u32,
}

impl PeerScore {
    /// Failures tolerated before a peer is banned.
    const BAN_THRESHOLD: u32 = 3;

    pub fn new() -> PeerScore {
        PeerScore::default()
    }

    pub fn record_failure(&mut self) -> PeerVerdict {
        self.failures += 1;

        if self.failures >= PeerScore::BAN_THRESHOLD {
            PeerVerdict::Ban
        } else {
            PeerVerdict::Keep
        }
    }

    pub fn record_success(&mut self) {
        self.failures = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_payloads_are_rejected() {
        assert!(parse_blocks_response("{\"blocks\": 1}").is_err());
        assert!(parse_blocks_response("{\"blocks\": [], \"extra\": true}").is_err());
        assert!(parse_blocks_response("not json").is_err());
        assert!(parse_blocks_response("{\"blocks\": []}").is_ok());
    }

    #[test]
    fn common_block_round_trip() {
        let response = CommonBlockResponse {
            common: CommonBlock {
                id: crypto::hash_slice(b"a"),
                previous_block: crypto::hash_slice(b"b"),
                height: 7,
            },
        };

        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(parse_common_block_response(&json).unwrap(), response);
    }

    #[test]
    fn persistent_failures_ban_the_peer() {
        let mut score = PeerScore::new();

        assert_eq!(score.record_failure(), PeerVerdict::Keep);
        assert_eq!(score.record_failure(), PeerVerdict::Keep);
        assert_eq!(score.record_failure(), PeerVerdict::Ban);

        let mut forgiven = PeerScore::new();
        forgiven.record_failure();
        forgiven.record_success();
        assert_eq!(forgiven.record_failure(), PeerVerdict::Keep);
    }

    #[test]
    fn blocks_response_round_trips_through_json() {
        use quickcheck::Arbitrary;

        let mut g = quickcheck::Gen::new(5);
        let block = Block::arbitrary(&mut g);
        let response = BlocksResponse { blocks: vec![block] };

        let json = serde_json::to_string(&response).unwrap();
        let parsed = parse_blocks_response(&json).unwrap();

        assert_eq!(parsed.blocks.len(), 1);
        assert_eq!(parsed.blocks[0].id, response.blocks[0].id);
    }
}
