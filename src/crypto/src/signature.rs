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

pub const SIGNATURE_BYTES: usize = 64;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_BYTES]);

impl Signature {
    pub fn new(bin: &[u8]) -> Signature {
        let mut sig = [0; SIGNATURE_BYTES];
        sig.copy_from_slice(bin);

        Signature(sig)
    }

    #[inline]
    pub fn inner(&self) -> [u8; SIGNATURE_BYTES] {
        self.0
    }

    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    #[inline]
    pub fn from_bytes(bin: &[u8]) -> Result<Signature, &'static str> {
        if bin.len() == SIGNATURE_BYTES {
            let mut sig = [0; SIGNATURE_BYTES];
            sig.copy_from_slice(bin);

            Ok(Signature(sig))
        } else {
            Err("Bad signature length")
        }
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Signature({})", hex::encode(self.0))
    }
}

impl serde::Serialize for Signature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> serde::Deserialize<'de> for Signature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Signature, D::Error> {
        use serde::Deserialize;

        let hex_str = String::deserialize(deserializer)?;
        let bin = hex::decode(hex_str).map_err(serde::de::Error::custom)?;
        Signature::from_bytes(&bin).map_err(serde::de::Error::custom)
    }
}

impl Arbitrary for Signature {
    fn arbitrary(g: &mut quickcheck::Gen) -> Signature {
        let mut result = [0; SIGNATURE_BYTES];

        // Zeroed signature fields mean "unsigned" on the wire, so
        // every generated byte stays non-zero.
        for byte in result.iter_mut() {
            *byte = (u8::arbitrary(g) % 254) + 1;
        }

        Signature(result)
    }
}
