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

use account::Address;
use constants::ACTIVE_DELEGATES;
use crypto::{Identity, PublicKey};
use std::env;

/// Node configuration read from the environment. Consensus
/// parameters (epoch anchor, slot interval, block budgets) are
/// compile-time constants; the environment configures identity
/// and the initial ledger.
pub struct NodeConfig {
    /// Keypair used for forging, when this node runs a delegate.
    pub forging_identity: Option<Identity>,

    /// Ordered delegate roster.
    pub delegates: Vec<PublicKey>,

    /// Genesis balances: `addr:amount` pairs.
    pub premine: Vec<(Address, i64)>,
}

impl NodeConfig {
    pub fn from_env() -> Result<NodeConfig, String> {
        let forging_identity = env::var("ONYX_FORGING_SEED")
            .ok()
            .map(|seed| Identity::from_seed(seed.as_bytes()));

        let delegates = match env::var("ONYX_DELEGATES") {
            Ok(raw) => parse_delegates(&raw)?,
            // Standalone mode: a deterministic local roster with
            // this node forging for the first seat.
            Err(_) => (0..ACTIVE_DELEGATES)
                .map(|i| *Identity::from_seed(format!("onyx-dev-delegate-{}", i).as_bytes()).pkey())
                .collect(),
        };

        let premine = match env::var("ONYX_PREMINE") {
            Ok(raw) => parse_premine(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(NodeConfig {
            forging_identity,
            delegates,
            premine,
        })
    }
}

fn parse_delegates(raw: &str) -> Result<Vec<PublicKey>, String> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            let bin = hex::decode(part.trim()).map_err(|e| format!("bad delegate key: {}", e))?;
            PublicKey::from_bytes(&bin).map_err(|e| format!("bad delegate key: {}", e))
        })
        .collect()
}

fn parse_premine(raw: &str) -> Result<Vec<(Address, i64)>, String> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            let mut halves = part.trim().split(':');

            let address = halves
                .next()
                .and_then(|s| s.parse::<u64>().ok())
                .ok_or_else(|| format!("bad premine entry: {}", part))?;
            let amount = halves
                .next()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| format!("bad premine entry: {}", part))?;

            if halves.next().is_some() || amount < 0 {
                return Err(format!("bad premine entry: {}", part));
            }

            Ok((Address(address), amount))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premine_entries_parse() {
        let parsed = parse_premine("17:1000, 42:5").unwrap();

        assert_eq!(parsed, vec![(Address(17), 1000), (Address(42), 5)]);
        assert!(parse_premine("17").is_err());
        assert!(parse_premine("17:-3").is_err());
        assert!(parse_premine("17:1:2").is_err());
    }

    #[test]
    fn delegate_keys_parse_from_hex() {
        let id = Identity::from_seed(b"config-test");
        let raw = hex::encode(id.pkey().0);

        assert_eq!(parse_delegates(&raw).unwrap(), vec![*id.pkey()]);
        assert!(parse_delegates("zz").is_err());
    }
}
