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

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crypto::{Hash, PublicKey, SecretKey, Signature};
use quickcheck::Arbitrary;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};
use transactions::Transaction;

/// Size of the canonical block header:
/// version(4) + created_at(4) + previous_block_id(32) +
/// transaction_count(4) + amount(8) + fee(8) + payload_hash(32) +
/// generator_public_key(32) + signature(64).
pub const BLOCK_HEADER_BYTES: usize = 188;

const ZERO_SIGNATURE: [u8; 64] = [0; 64];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Block {
    /// SHA-256 of the canonical header bytes. `None` until computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Hash>,

    pub version: u32,
    pub height: u64,
    pub previous_block_id: Hash,

    /// Slot time assigned to the block's forging slot.
    pub created_at: u32,

    pub generator_public_key: PublicKey,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,

    pub transactions: Vec<Transaction>,
    pub transaction_count: u32,

    /// Sum of the transfer amounts carried by the block.
    pub amount: i64,

    /// Sum of the transaction fees carried by the block.
    pub fee: i64,

    /// SHA-256 over the concatenated canonical bytes of every
    /// transaction, in block order.
    pub payload_hash: Hash,
}

impl Block {
    /// Hashes the payload of an ordered transaction list and sums
    /// its amounts and fees.
    pub fn payload_of(transactions: &[Transaction]) -> (Hash, i64, i64) {
        let mut concat = Vec::new();
        let mut amount: i64 = 0;
        let mut fee: i64 = 0;

        for tx in transactions.iter() {
            concat.extend_from_slice(&tx.to_bytes());
            amount += tx.header_amount();
            fee += tx.fee;
        }

        (crypto::hash_slice(&concat), amount, fee)
    }

    /// Assembles an unsigned block on top of the given head.
    pub fn assemble(
        previous_block_id: Hash,
        height: u64,
        created_at: u32,
        generator_public_key: PublicKey,
        transactions: Vec<Transaction>,
    ) -> Block {
        let (payload_hash, amount, fee) = Block::payload_of(&transactions);

        Block {
            id: None,
            version: constants::BLOCK_VERSION,
            height,
            previous_block_id,
            created_at,
            generator_public_key,
            signature: None,
            transaction_count: transactions.len() as u32,
            transactions,
            amount,
            fee,
            payload_hash,
        }
    }

    /// Canonical header bytes. The signature field is zeroed when
    /// `signed` is false or no signature exists yet; integers are
    /// little-endian throughout. Consensus-relevant layout.
    pub fn canonical_bytes(&self, signed: bool) -> Vec<u8> {
        let mut buf: Vec<u8> = Vec::with_capacity(BLOCK_HEADER_BYTES);

        buf.write_u32::<LittleEndian>(self.version).unwrap();
        buf.write_u32::<LittleEndian>(self.created_at).unwrap();
        buf.extend_from_slice(&self.previous_block_id.0);
        buf.write_u32::<LittleEndian>(self.transaction_count).unwrap();
        buf.write_u64::<LittleEndian>(self.amount as u64).unwrap();
        buf.write_u64::<LittleEndian>(self.fee as u64).unwrap();
        buf.extend_from_slice(&self.payload_hash.0);
        buf.extend_from_slice(&self.generator_public_key.0);

        match self.signature {
            Some(ref sig) if signed => buf.extend_from_slice(&sig.inner()),
            _ => buf.extend_from_slice(&ZERO_SIGNATURE),
        }

        buf
    }

    /// Signs the block with the generator's secret key and stamps
    /// the id.
    pub fn sign(&mut self, skey: &SecretKey) {
        let message = crypto::hash_slice(&self.canonical_bytes(false));
        self.signature = Some(crypto::sign(&message.0, skey));
        self.compute_id();
    }

    pub fn compute_id(&mut self) {
        self.id = Some(crypto::hash_slice(&self.canonical_bytes(true)));
    }

    /// Verifies the generator signature over the canonical bytes.
    ///
    /// Returns `false` if the signature field is missing.
    pub fn verify_signature(&self) -> bool {
        match self.signature {
            Some(ref sig) => {
                let message = crypto::hash_slice(&self.canonical_bytes(false));
                crypto::verify(&message.0, sig, &self.generator_public_key)
            }
            None => false,
        }
    }

    /// Encoded size of the transaction payload, used against the
    /// block byte budget.
    pub fn payload_size(&self) -> usize {
        self.transactions.iter().map(|tx| tx.byte_size()).sum()
    }

    /// Serializes the block: canonical header followed by each
    /// transaction, length-prefixed.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = self.canonical_bytes(true);

        for tx in self.transactions.iter() {
            let tx_bytes = tx.to_bytes();
            buf.write_u32::<LittleEndian>(tx_bytes.len() as u32).unwrap();
            buf.extend_from_slice(&tx_bytes);
        }

        buf
    }

    /// Deserializes a block, recomputing the id from the header.
    pub fn from_bytes(bytes: &[u8]) -> Result<Block, &'static str> {
        if bytes.len() < BLOCK_HEADER_BYTES {
            return Err("Block shorter than the fixed header");
        }

        let mut rdr = Cursor::new(bytes);

        let version = rdr.read_u32::<LittleEndian>().map_err(|_| "Bad version")?;
        let created_at = rdr.read_u32::<LittleEndian>().map_err(|_| "Bad created_at")?;

        let mut previous = [0u8; 32];
        rdr.read_exact(&mut previous).map_err(|_| "Bad parent id")?;

        let transaction_count = rdr
            .read_u32::<LittleEndian>()
            .map_err(|_| "Bad transaction count")?;
        let amount = rdr.read_u64::<LittleEndian>().map_err(|_| "Bad amount")? as i64;
        let fee = rdr.read_u64::<LittleEndian>().map_err(|_| "Bad fee")? as i64;

        let mut payload = [0u8; 32];
        rdr.read_exact(&mut payload).map_err(|_| "Bad payload hash")?;

        let mut generator = [0u8; 32];
        rdr.read_exact(&mut generator).map_err(|_| "Bad generator key")?;

        let mut sig = [0u8; 64];
        rdr.read_exact(&mut sig).map_err(|_| "Bad signature field")?;
        let signature = if sig == ZERO_SIGNATURE {
            None
        } else {
            Some(Signature::new(&sig))
        };

        let mut transactions = Vec::with_capacity(transaction_count as usize);

        for _ in 0..transaction_count {
            let len = rdr
                .read_u32::<LittleEndian>()
                .map_err(|_| "Bad transaction length")? as usize;

            let start = rdr.position() as usize;
            let end = start.checked_add(len).ok_or("Bad transaction length")?;

            if end > bytes.len() {
                return Err("Bad transaction length");
            }

            transactions.push(Transaction::from_bytes(&bytes[start..end])?);
            rdr.set_position(end as u64);
        }

        if rdr.position() != bytes.len() as u64 {
            return Err("Trailing bytes after the transaction list");
        }

        // The height is chain context, not wire content; the
        // pipeline fills it from the parent on receipt.
        let mut block = Block {
            id: None,
            version,
            height: 0,
            previous_block_id: Hash(previous),
            created_at,
            generator_public_key: PublicKey(generator),
            signature,
            transactions,
            transaction_count,
            amount,
            fee,
            payload_hash: Hash(payload),
        };
        block.compute_id();

        Ok(block)
    }
}

impl Arbitrary for Block {
    fn arbitrary(g: &mut quickcheck::Gen) -> Block {
        let generator = crypto::Identity::arbitrary(g);

        let transactions: Vec<Transaction> = (0..u64::arbitrary(g) % 3)
            .map(|_| Transaction::arbitrary(g))
            .collect();

        let mut block = Block::assemble(
            Hash::arbitrary(g),
            u64::arbitrary(g) % 999_998 + 2,
            u32::arbitrary(g) % 1_000_000_000,
            *generator.pkey(),
            transactions,
        );
        block.sign(generator.skey());

        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    quickcheck::quickcheck! {
        fn serialize_deserialize(block: Block) -> bool {
            let decoded = Block::from_bytes(&block.to_bytes()).unwrap();

            // Height travels out of band; fees are re-derived
            // per transaction on verification.
            let mut expected = block.clone();
            expected.height = 0;
            for tx in expected.transactions.iter_mut() {
                tx.fee = 0;
            }

            decoded == expected
        }

        fn id_is_stable_over_the_canonical_bytes(block: Block) -> bool {
            block.id == Some(crypto::hash_slice(&block.canonical_bytes(true)))
        }

        fn signature_verifies(block: Block) -> bool {
            block.verify_signature()
        }

        fn signature_breaks_on_header_change(block: Block) -> bool {
            let mut block = block;
            block.created_at = block.created_at.wrapping_add(1);

            !block.verify_signature()
        }
    }

    #[test]
    fn canonical_layout_is_byte_exact() {
        let generator = crypto::Identity::from_seed(b"block-layout");
        let mut block = Block::assemble(
            Hash::NULL,
            2,
            120,
            *generator.pkey(),
            vec![],
        );
        block.sign(generator.skey());

        let bytes = block.canonical_bytes(true);
        assert_eq!(bytes.len(), BLOCK_HEADER_BYTES);
        assert_eq!(&bytes[0..4], &constants::BLOCK_VERSION.to_le_bytes());
        assert_eq!(&bytes[4..8], &120u32.to_le_bytes());
        assert_eq!(&bytes[8..40], &[0u8; 32]);
        assert_eq!(&bytes[40..44], &0u32.to_le_bytes());
        assert_eq!(&bytes[44..52], &0u64.to_le_bytes());
        assert_eq!(&bytes[52..60], &0u64.to_le_bytes());
        assert_eq!(&bytes[60..92], &block.payload_hash.0);
        assert_eq!(&bytes[92..124], &generator.pkey().0);
        assert_eq!(&bytes[124..188], &block.signature.unwrap().inner());
    }

    #[test]
    fn payload_hash_covers_transaction_order() {
        let mut g = quickcheck::Gen::new(10);
        let a = Transaction::arbitrary(&mut g);
        let b = Transaction::arbitrary(&mut g);

        let (forward, _, _) = Block::payload_of(&[a.clone(), b.clone()]);
        let (backward, _, _) = Block::payload_of(&[b, a]);

        assert_ne!(forward, backward);
    }

    #[test]
    fn empty_payload_hash_is_the_empty_digest() {
        let (hash, amount, fee) = Block::payload_of(&[]);

        assert_eq!(hash, crypto::hash_slice(b""));
        assert_eq!(amount, 0);
        assert_eq!(fee, 0);
    }
}
