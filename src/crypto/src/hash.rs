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

use quickcheck::Arbitrary;
use serde::Deserialize;
use sha2::{Digest, Sha256};

pub const HASH_BYTES: usize = 32;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash(pub [u8; HASH_BYTES]);

impl Hash {
    pub const NULL: Hash = Hash([0; HASH_BYTES]);

    pub fn is_null(&self) -> bool {
        self.0 == [0; HASH_BYTES]
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    #[inline]
    pub fn from_bytes(bin: &[u8]) -> Result<Hash, &'static str> {
        if bin.len() == HASH_BYTES {
            let mut result = [0; HASH_BYTES];
            result.copy_from_slice(bin);

            Ok(Hash(result))
        } else {
            Err("Bad hash length")
        }
    }

    pub fn from_hex(hex_str: &str) -> Result<Hash, &'static str> {
        let bin = hex::decode(hex_str).map_err(|_| "Invalid hex string")?;
        Hash::from_bytes(&bin)
    }
}

/// Hashes the given slice with SHA-256.
pub fn hash_slice(val: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    let mut result: [u8; HASH_BYTES] = [0; HASH_BYTES];

    hasher.update(val);
    result.copy_from_slice(hasher.finalize().as_slice());

    Hash(result)
}

impl std::fmt::Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Hash({})", hex::encode(self.0))
    }
}

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl serde::Serialize for Hash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Hash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        Hash::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}

impl Arbitrary for Hash {
    fn arbitrary(g: &mut quickcheck::Gen) -> Hash {
        let mut result = [0; HASH_BYTES];
        for byte in result.iter_mut() {
            *byte = u8::arbitrary(g);
        }

        Hash(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash() {
        let hash1 = hash_slice(b"");
        let hash2 = hash_slice(b"The quick brown fox jumps over the lazy dog");

        assert_eq!(
            hash1.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hash2.to_hex(),
            "d7a8fbb307d7809469ca9abcb0082e4f8d5651e46d3cdb762d02d0bf37c9e592"
        );
    }

    #[test]
    fn hex_round_trip() {
        let hash = hash_slice(b"round trip");
        assert_eq!(Hash::from_hex(&hash.to_hex()).unwrap(), hash);
    }

    #[test]
    fn from_bytes_rejects_bad_length() {
        assert!(Hash::from_bytes(&[0; 31]).is_err());
        assert!(Hash::from_bytes(&[0; 33]).is_err());
    }
}
