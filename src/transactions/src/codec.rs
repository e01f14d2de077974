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

//! Canonical transaction encoding.
//!
//! Every transaction serializes to a 197-byte little-endian header
//! followed by a type-specific asset tail:
//!
//! | Off | Len | Field              |
//! |-----|-----|--------------------|
//! | 0   | 16  | salt               |
//! | 16  | 1   | type               |
//! | 17  | 4   | created_at         |
//! | 21  | 32  | sender_public_key  |
//! | 53  | 8   | recipient_address  |
//! | 61  | 8   | amount             |
//! | 69  | 64  | signature          |
//! | 133 | 64  | second_signature   |
//!
//! Recipient and amount are zero for every type except SEND.
//! Signature fields are zero-filled until the respective
//! signature exists; the first signature is computed over the
//! encoding with both signature fields zeroed, the second over
//! the encoding with only the second zeroed, and the id hashes
//! the fully populated bytes. The layout is consensus-relevant:
//! changing it forks the chain.

use crate::{
    Asset, SecondSignatureAsset, SendAsset, StakeAsset, Transaction, VoteAsset,
};
use account::Address;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use constants::{SALT_LENGTH, TX_HEADER_BYTES};
use crypto::{Hash, PublicKey, Signature};
use std::io::{Cursor, Read};

const ZERO_SIGNATURE: [u8; 64] = [0; 64];

fn write_header(tx: &Transaction, with_first: bool, with_second: bool, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&tx.salt);
    buf.write_u8(tx.tx_type()).unwrap();
    buf.write_u32::<LittleEndian>(tx.created_at).unwrap();
    buf.extend_from_slice(&tx.sender_public_key.0);

    let recipient = tx.recipient_address().unwrap_or(Address::NULL);
    buf.write_u64::<LittleEndian>(recipient.0).unwrap();
    buf.write_u64::<LittleEndian>(tx.header_amount() as u64).unwrap();

    match tx.signature {
        Some(ref sig) if with_first => buf.extend_from_slice(&sig.inner()),
        _ => buf.extend_from_slice(&ZERO_SIGNATURE),
    }

    match tx.second_signature {
        Some(ref sig) if with_second => buf.extend_from_slice(&sig.inner()),
        _ => buf.extend_from_slice(&ZERO_SIGNATURE),
    }
}

fn write_asset(asset: &Asset, buf: &mut Vec<u8>) {
    match *asset {
        Asset::Send(ref asset) => asset.write_bytes(buf),
        Asset::SecondSignature(ref asset) => asset.write_bytes(buf),
        Asset::Stake(ref asset) => asset.write_bytes(buf),
        Asset::Vote(ref asset) => asset.write_bytes(buf),
    }
}

fn encode(tx: &Transaction, with_first: bool, with_second: bool) -> Vec<u8> {
    let mut buf: Vec<u8> = Vec::with_capacity(TX_HEADER_BYTES + 64);
    write_header(tx, with_first, with_second, &mut buf);
    write_asset(&tx.asset, &mut buf);

    buf
}

/// The full canonical encoding.
pub fn to_bytes(tx: &Transaction) -> Vec<u8> {
    encode(tx, true, true)
}

/// Message hashed for the first signature.
pub fn signing_hash(tx: &Transaction) -> Hash {
    crypto::hash_slice(&encode(tx, false, false))
}

/// Message hashed for the second signature.
pub fn second_signing_hash(tx: &Transaction) -> Hash {
    crypto::hash_slice(&encode(tx, true, false))
}

/// Transaction id: SHA-256 of the full canonical encoding.
pub fn transaction_id(tx: &Transaction) -> Hash {
    crypto::hash_slice(&to_bytes(tx))
}

fn read_signature(rdr: &mut Cursor<&[u8]>) -> Result<Option<Signature>, &'static str> {
    let mut sig = [0u8; 64];
    rdr.read_exact(&mut sig).map_err(|_| "Bad signature field")?;

    if sig == ZERO_SIGNATURE {
        Ok(None)
    } else {
        Ok(Some(Signature::new(&sig)))
    }
}

pub fn from_bytes(bytes: &[u8]) -> Result<Transaction, &'static str> {
    if bytes.len() < TX_HEADER_BYTES {
        return Err("Transaction shorter than the fixed header");
    }

    let mut rdr = Cursor::new(bytes);

    let mut salt = [0u8; SALT_LENGTH];
    rdr.read_exact(&mut salt).map_err(|_| "Bad salt field")?;

    let tx_type = rdr.read_u8().map_err(|_| "Bad type field")?;
    let created_at = rdr
        .read_u32::<LittleEndian>()
        .map_err(|_| "Bad created_at field")?;

    let mut pkey = [0u8; 32];
    rdr.read_exact(&mut pkey).map_err(|_| "Bad sender key field")?;
    let sender_public_key = PublicKey(pkey);

    let recipient = rdr
        .read_u64::<LittleEndian>()
        .map_err(|_| "Bad recipient field")?;
    let amount = rdr.read_u64::<LittleEndian>().map_err(|_| "Bad amount field")? as i64;

    let signature = read_signature(&mut rdr)?;
    let second_signature = read_signature(&mut rdr)?;

    let asset = match tx_type {
        SendAsset::TX_TYPE => Asset::Send(SendAsset {
            recipient_address: Address(recipient),
            amount,
        }),
        SecondSignatureAsset::TX_TYPE => {
            if recipient != 0 || amount != 0 {
                return Err("Non-zero transfer fields on a non-transfer type");
            }
            Asset::SecondSignature(SecondSignatureAsset::read_asset(&mut rdr)?)
        }
        StakeAsset::TX_TYPE => {
            if recipient != 0 || amount != 0 {
                return Err("Non-zero transfer fields on a non-transfer type");
            }
            Asset::Stake(StakeAsset::read_asset(&mut rdr)?)
        }
        VoteAsset::TX_TYPE => {
            if recipient != 0 || amount != 0 {
                return Err("Non-zero transfer fields on a non-transfer type");
            }
            Asset::Vote(VoteAsset::read_asset(&mut rdr)?)
        }
        _ => return Err("Invalid transaction type"),
    };

    if rdr.position() != bytes.len() as u64 {
        return Err("Trailing bytes after the asset tail");
    }

    Ok(Transaction {
        id: Some(crypto::hash_slice(bytes)),
        created_at,
        sender_address: Address::from_pkey(&sender_public_key),
        sender_public_key,
        salt,
        fee: 0,
        signature,
        second_signature,
        block_id: None,
        asset,
    })
}
