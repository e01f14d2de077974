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

pub mod codec;
mod error;
mod second_signature;
mod send;
mod stake;
mod vote;

pub use crate::error::TxError;
pub use crate::second_signature::SecondSignatureAsset;
pub use crate::send::SendAsset;
pub use crate::stake::StakeAsset;
pub use crate::vote::{VoteAsset, VoteCast, VoteDirection};

use account::{Account, AccountState, Address};
use constants::SALT_LENGTH;
use crypto::{Hash, PublicKey, SecretKey, Signature};
use quickcheck::Arbitrary;
use serde::{Deserialize, Serialize};

pub type Salt = [u8; SALT_LENGTH];

/// The sealed set of asset payloads. Adding a transaction type
/// means adding a variant here; every dispatch site below is an
/// exhaustive match, so the compiler walks the checklist.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Asset {
    Send(SendAsset),
    SecondSignature(SecondSignatureAsset),
    Stake(StakeAsset),
    Vote(VoteAsset),
}

impl Asset {
    pub fn tx_type(&self) -> u8 {
        match *self {
            Asset::Send(_) => SendAsset::TX_TYPE,
            Asset::SecondSignature(_) => SecondSignatureAsset::TX_TYPE,
            Asset::Stake(_) => StakeAsset::TX_TYPE,
            Asset::Vote(_) => VoteAsset::TX_TYPE,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    /// SHA-256 of the canonical encoding. `None` until computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Hash>,

    /// Epoch time at which the transaction was created.
    pub created_at: u32,

    pub sender_public_key: PublicKey,
    pub sender_address: Address,

    pub salt: Salt,

    /// Recomputed from the type's fee rule during verification.
    pub fee: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_signature: Option<Signature>,

    /// Set once the transaction is confirmed in an applied block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<Hash>,

    pub asset: Asset,
}

impl Transaction {
    pub fn unsigned(
        asset: Asset,
        sender_public_key: PublicKey,
        created_at: u32,
        salt: Salt,
    ) -> Transaction {
        Transaction {
            id: None,
            created_at,
            sender_address: Address::from_pkey(&sender_public_key),
            sender_public_key,
            salt,
            fee: 0,
            signature: None,
            second_signature: None,
            block_id: None,
            asset,
        }
    }

    pub fn tx_type(&self) -> u8 {
        self.asset.tx_type()
    }

    /// The recipient written into the header. Zero for every
    /// type except SEND.
    pub fn recipient_address(&self) -> Option<Address> {
        match self.asset {
            Asset::Send(ref asset) => Some(asset.recipient_address),
            _ => None,
        }
    }

    /// The amount written into the header. Zero for every type
    /// except SEND.
    pub fn header_amount(&self) -> i64 {
        match self.asset {
            Asset::Send(ref asset) => asset.amount,
            _ => 0,
        }
    }

    /// Total outgoing value this transaction demands from the
    /// sender's spendable balance.
    pub fn total_deduction(&self) -> i64 {
        match self.asset {
            Asset::Send(ref asset) => asset.amount + self.fee,
            Asset::Stake(ref asset) => asset.amount + self.fee,
            Asset::SecondSignature(_) | Asset::Vote(_) => self.fee,
        }
    }

    /// Signs the transaction with the given secret key and stamps
    /// the id. Any later field change mandates a fresh call.
    pub fn sign(&mut self, skey: &SecretKey) {
        let message = codec::signing_hash(self);
        self.signature = Some(crypto::sign(&message.0, skey));
        self.compute_id();
    }

    /// Attaches the second signature. Must run after `sign`.
    pub fn second_sign(&mut self, skey: &SecretKey) {
        let message = codec::second_signing_hash(self);
        self.second_signature = Some(crypto::sign(&message.0, skey));
        self.compute_id();
    }

    pub fn compute_id(&mut self) {
        self.id = Some(codec::transaction_id(self));
    }

    /// Verifies the first signature over the canonical bytes.
    ///
    /// Returns `false` if the signature field is missing.
    pub fn verify_signature(&self) -> bool {
        match self.signature {
            Some(ref sig) => {
                let message = codec::signing_hash(self);
                crypto::verify(&message.0, sig, &self.sender_public_key)
            }
            None => false,
        }
    }

    /// Verifies the second signature against the key registered
    /// on the sender account.
    pub fn verify_second_signature(&self, registered: &PublicKey) -> bool {
        match self.second_signature {
            Some(ref sig) => {
                let message = codec::second_signing_hash(self);
                crypto::verify(&message.0, sig, registered)
            }
            None => false,
        }
    }

    /// Static field checks. No account state involved.
    pub fn validate(&self) -> Result<(), TxError> {
        match self.asset {
            Asset::Send(ref asset) => asset.validate(),
            Asset::SecondSignature(ref asset) => asset.validate(),
            Asset::Stake(ref asset) => asset.validate(),
            Asset::Vote(ref asset) => asset.validate(),
        }
    }

    /// The fee this transaction must carry given the sender's
    /// current state.
    pub fn calculate_fee(&self, sender: &Account) -> i64 {
        match self.asset {
            Asset::Send(ref asset) => asset.calculate_fee(),
            Asset::SecondSignature(ref asset) => asset.calculate_fee(),
            Asset::Stake(ref asset) => asset.calculate_fee(),
            Asset::Vote(ref asset) => asset.calculate_fee(sender),
        }
    }

    /// Dynamic checks against the sender's current account.
    pub fn verify_unconfirmed(&self, sender: &Account) -> Result<(), TxError> {
        if let Some(ref registered) = sender.second_public_key {
            if self.second_signature.is_none() {
                return Err(TxError::MissingSecondSignature);
            }
            if !self.verify_second_signature(registered) {
                return Err(TxError::SecondSignatureInvalid);
            }
        }

        match self.asset {
            Asset::Send(ref asset) => asset.verify_unconfirmed(self, sender),
            Asset::SecondSignature(ref asset) => asset.verify_unconfirmed(self, sender),
            Asset::Stake(ref asset) => asset.verify_unconfirmed(self, sender),
            Asset::Vote(ref asset) => asset.verify_unconfirmed(self, sender),
        }
    }

    /// Applies the reversible account mutation for this
    /// transaction. Callers verify first; the mutation itself
    /// re-checks balances before touching state.
    pub fn apply_unconfirmed(&self, state: &mut AccountState) -> Result<(), TxError> {
        match self.asset {
            Asset::Send(ref asset) => asset.apply_unconfirmed(self, state),
            Asset::SecondSignature(ref asset) => asset.apply_unconfirmed(self, state),
            Asset::Stake(ref asset) => asset.apply_unconfirmed(self, state),
            Asset::Vote(ref asset) => asset.apply_unconfirmed(self, state),
        }
    }

    /// Exact inverse of `apply_unconfirmed`.
    pub fn undo_unconfirmed(&self, state: &mut AccountState) -> Result<(), TxError> {
        match self.asset {
            Asset::Send(ref asset) => asset.undo_unconfirmed(self, state),
            Asset::SecondSignature(ref asset) => asset.undo_unconfirmed(self, state),
            Asset::Stake(ref asset) => asset.undo_unconfirmed(self, state),
            Asset::Vote(ref asset) => asset.undo_unconfirmed(self, state),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        codec::to_bytes(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Transaction, &'static str> {
        codec::from_bytes(bytes)
    }

    /// Encoded size of the canonical bytes.
    pub fn byte_size(&self) -> usize {
        self.to_bytes().len()
    }
}

impl Arbitrary for Transaction {
    fn arbitrary(g: &mut quickcheck::Gen) -> Transaction {
        let asset = Asset::arbitrary(g);
        arbitrary_signed(g, asset)
    }
}

impl Arbitrary for Asset {
    fn arbitrary(g: &mut quickcheck::Gen) -> Asset {
        match u8::arbitrary(g) % 4 {
            0 => Asset::Send(Arbitrary::arbitrary(g)),
            1 => Asset::SecondSignature(Arbitrary::arbitrary(g)),
            2 => Asset::Stake(Arbitrary::arbitrary(g)),
            _ => Asset::Vote(Arbitrary::arbitrary(g)),
        }
    }
}

/// Builds a signed, id-stamped transaction around the given asset.
/// Shared by the `Arbitrary` impls of the per-type modules.
pub(crate) fn arbitrary_signed(g: &mut quickcheck::Gen, asset: Asset) -> Transaction {
    let id = crypto::Identity::arbitrary(g);

    let mut salt = [0u8; SALT_LENGTH];
    for byte in salt.iter_mut() {
        *byte = u8::arbitrary(g);
    }

    let created_at = u32::arbitrary(g) % 1_000_000_000;
    let mut tx = Transaction::unsigned(asset, *id.pkey(), created_at, salt);
    tx.fee = i64::arbitrary(g).rem_euclid(1_000_000);
    tx.sign(id.skey());

    tx
}

#[cfg(test)]
mod tests {
    use super::*;

    quickcheck::quickcheck! {
        fn serialize_deserialize(tx: Transaction) -> bool {
            let decoded = Transaction::from_bytes(&tx.to_bytes()).unwrap();

            // The fee is not part of the canonical bytes; it is
            // re-derived from the type's fee rule on verification.
            let mut expected = tx.clone();
            expected.fee = 0;

            decoded == expected
        }

        fn id_matches_canonical_bytes(tx: Transaction) -> bool {
            tx.id == Some(crypto::hash_slice(&tx.to_bytes()))
        }

        fn signature_verifies(tx: Transaction) -> bool {
            tx.verify_signature()
        }

        fn signature_breaks_on_field_change(tx: Transaction) -> bool {
            let mut tx = tx;
            tx.created_at = tx.created_at.wrapping_add(1);

            !tx.verify_signature()
        }
    }

    #[test]
    fn unknown_type_byte_is_rejected() {
        let mut g = quickcheck::Gen::new(10);
        let tx = Transaction::arbitrary(&mut g);
        let mut bytes = tx.to_bytes();
        bytes[constants::SALT_LENGTH] = 0xff;

        assert!(Transaction::from_bytes(&bytes).is_err());
    }

    #[test]
    fn truncated_input_is_rejected() {
        let mut g = quickcheck::Gen::new(10);
        let tx = Transaction::arbitrary(&mut g);
        let bytes = tx.to_bytes();

        assert!(Transaction::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        assert!(Transaction::from_bytes(&[]).is_err());
    }
}
