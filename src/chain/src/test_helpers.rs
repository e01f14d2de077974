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

//! Shared fixtures for the chain, mempool and consensus tests.

use crate::DelegateRoster;
use account::Address;
use crypto::Identity;

/// Deterministic delegate keypair for roster slot `index`.
pub fn delegate_identity(index: usize) -> Identity {
    Identity::from_seed(format!("test-delegate-{}", index).as_bytes())
}

/// A roster of `n` deterministic delegates, identities included.
pub fn test_roster(n: usize) -> (Vec<Identity>, DelegateRoster) {
    let identities: Vec<Identity> = (0..n).map(delegate_identity).collect();
    let roster = DelegateRoster::new(identities.iter().map(|id| *id.pkey()).collect());

    (identities, roster)
}

/// Deterministic funded account: keypair plus derived address.
pub fn funded_identity(seed: &str) -> (Identity, Address) {
    let identity = Identity::from_seed(seed.as_bytes());
    let address = Address::from_pkey(identity.pkey());

    (identity, address)
}
