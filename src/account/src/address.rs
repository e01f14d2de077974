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

use crypto::{hash_slice, PublicKey};
use quickcheck::Arbitrary;
use serde::{Deserialize, Serialize};

/// Numeric account address: the first 8 bytes of the SHA-256
/// digest of the public key, read little-endian.
#[derive(Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Clone, Copy)]
pub struct Address(pub u64);

impl Address {
    pub const NULL: Address = Address(0);

    pub fn from_pkey(pkey: &PublicKey) -> Address {
        let digest = hash_slice(&pkey.0);
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&digest.0[..8]);

        Address(u64::from_le_bytes(buf))
    }

    #[inline]
    pub fn to_bytes(&self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_bytes(bin: &[u8]) -> Result<Address, &'static str> {
        if bin.len() == 8 {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(bin);

            Ok(Address(u64::from_le_bytes(buf)))
        } else {
            Err("Bad address length")
        }
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Arbitrary for Address {
    fn arbitrary(g: &mut quickcheck::Gen) -> Address {
        Address(u64::arbitrary(g).max(1))
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Address>> {
        Box::new(self.0.shrink().filter(|value| *value != 0).map(Address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_reads_the_digest_little_endian() {
        let pkey = PublicKey([7; 32]);
        let digest = hash_slice(&pkey.0);

        let mut expected = 0u64;
        for i in (0..8).rev() {
            expected = (expected << 8) | u64::from(digest.0[i]);
        }

        assert_eq!(Address::from_pkey(&pkey), Address(expected));
    }

    #[test]
    fn derivation_is_deterministic() {
        let id = crypto::Identity::new();

        assert_eq!(Address::from_pkey(id.pkey()), Address::from_pkey(id.pkey()));
    }

    quickcheck::quickcheck! {
        fn serialize_deserialize(addr: Address) -> bool {
            addr == Address::from_bytes(&addr.to_bytes()).unwrap()
        }
    }
}
