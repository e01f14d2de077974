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

pub use crate::hash::*;
pub use crate::signature::*;

mod hash;
mod signature;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use quickcheck::Arbitrary;
use rand::RngCore;
use serde::Deserialize;

pub const PUBLIC_KEY_BYTES: usize = 32;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey(pub [u8; PUBLIC_KEY_BYTES]);

impl PublicKey {
    pub const NULL: PublicKey = PublicKey([0; PUBLIC_KEY_BYTES]);

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    #[inline]
    pub fn from_bytes(bin: &[u8]) -> Result<PublicKey, &'static str> {
        if bin.len() == PUBLIC_KEY_BYTES {
            let mut pkey = [0; PUBLIC_KEY_BYTES];
            pkey.copy_from_slice(bin);

            Ok(PublicKey(pkey))
        } else {
            Err("Bad public key length")
        }
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

impl serde::Serialize for PublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> serde::Deserialize<'de> for PublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<PublicKey, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        let bin = hex::decode(hex_str).map_err(serde::de::Error::custom)?;
        PublicKey::from_bytes(&bin).map_err(serde::de::Error::custom)
    }
}

impl Arbitrary for PublicKey {
    fn arbitrary(g: &mut quickcheck::Gen) -> PublicKey {
        Identity::arbitrary(g).pkey().clone()
    }
}

/// Ed25519 signing seed. Kept opaque; the expanded key is derived
/// on every signing call.
#[derive(Clone)]
pub struct SecretKey(pub [u8; 32]);

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "SecretKey(..)")
    }
}

/// Signs the message with the given secret key, returning a
/// detached Ed25519 signature.
pub fn sign(message: &[u8], skey: &SecretKey) -> Signature {
    let signing = SigningKey::from_bytes(&skey.0);
    let sig = signing.sign(message);

    Signature::new(&sig.to_bytes())
}

/// Verifies a detached Ed25519 signature over the message.
///
/// Returns `false` for malformed public keys as well as for
/// signatures that do not check out.
pub fn verify(message: &[u8], signature: &Signature, pkey: &PublicKey) -> bool {
    let verifying = match VerifyingKey::from_bytes(&pkey.0) {
        Ok(vk) => vk,
        Err(_) => return false,
    };

    let sig = ed25519_dalek::Signature::from_bytes(&signature.inner());
    verifying.verify_strict(message, &sig).is_ok()
}

pub fn gen_keypair() -> (PublicKey, SecretKey) {
    let mut seed = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut seed);

    let signing = SigningKey::from_bytes(&seed);
    let pkey = PublicKey(signing.verifying_key().to_bytes());

    (pkey, SecretKey(seed))
}

/// Derives a keypair deterministically from arbitrary seed bytes.
/// The seed is stretched through SHA-256 first.
pub fn gen_keypair_from_seed(seed: &[u8]) -> (PublicKey, SecretKey) {
    let hashed_seed = hash_slice(seed);
    let signing = SigningKey::from_bytes(&hashed_seed.0);
    let pkey = PublicKey(signing.verifying_key().to_bytes());

    (pkey, SecretKey(hashed_seed.0))
}

/// Generates a random array of bytes of the given length.
pub fn gen_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|_| rand::random::<u8>()).collect()
}

#[derive(Clone, Debug)]
pub struct Identity(PublicKey, SecretKey);

impl Identity {
    pub fn new() -> Identity {
        let (pk, sk) = gen_keypair();
        Identity(pk, sk)
    }

    pub fn from_seed(seed: &[u8]) -> Identity {
        let (pk, sk) = gen_keypair_from_seed(seed);
        Identity(pk, sk)
    }

    pub fn pkey(&self) -> &PublicKey {
        &self.0
    }

    pub fn skey(&self) -> &SecretKey {
        &self.1
    }
}

impl Default for Identity {
    fn default() -> Identity {
        Identity::new()
    }
}

impl Arbitrary for Identity {
    fn arbitrary(g: &mut quickcheck::Gen) -> Identity {
        let mut seed = [0u8; 32];
        for byte in seed.iter_mut() {
            *byte = u8::arbitrary(g);
        }

        Identity::from_seed(&seed)
    }
}
