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

use crate::{Transaction, TxError};
use account::{Account, AccountState};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use constants::FEE_DIVISOR;
use quickcheck::Arbitrary;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Freezes part of the sender's spendable balance. The frozen
/// amount stays on the account but no longer counts as spendable.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeAsset {
    pub amount: i64,

    /// Epoch time at which the stake opens.
    pub start_timestamp: u32,
}

impl StakeAsset {
    pub const TX_TYPE: u8 = 40;

    pub(crate) fn write_bytes(&self, buf: &mut Vec<u8>) {
        buf.write_i64::<LittleEndian>(self.amount).unwrap();
        buf.write_u32::<LittleEndian>(self.start_timestamp).unwrap();
    }

    pub(crate) fn read_asset(rdr: &mut Cursor<&[u8]>) -> Result<StakeAsset, &'static str> {
        let amount = rdr
            .read_i64::<LittleEndian>()
            .map_err(|_| "Bad stake amount")?;
        let start_timestamp = rdr
            .read_u32::<LittleEndian>()
            .map_err(|_| "Bad stake timestamp")?;

        Ok(StakeAsset {
            amount,
            start_timestamp,
        })
    }

    pub fn validate(&self) -> Result<(), TxError> {
        if self.amount <= 0 {
            return Err(TxError::InvalidAmount);
        }

        Ok(())
    }

    pub fn calculate_fee(&self) -> i64 {
        self.amount / FEE_DIVISOR
    }

    pub fn verify_unconfirmed(&self, tx: &Transaction, sender: &Account) -> Result<(), TxError> {
        let need = tx.total_deduction();

        if sender.spendable() < need {
            return Err(TxError::InsufficientBalance {
                have: sender.spendable(),
                need,
            });
        }

        Ok(())
    }

    pub fn apply_unconfirmed(
        &self,
        tx: &Transaction,
        state: &mut AccountState,
    ) -> Result<(), TxError> {
        let sender = state
            .get(&tx.sender_address)
            .ok_or(TxError::UnknownSender(tx.sender_address))?;

        let need = tx.total_deduction();
        if sender.spendable() < need {
            return Err(TxError::InsufficientBalance {
                have: sender.spendable(),
                need,
            });
        }

        state.debit(tx.sender_address, tx.fee)?;
        state.stake(tx.sender_address, self.amount, self.start_timestamp)?;
        state.increment_nonce(tx.sender_address)?;

        Ok(())
    }

    pub fn undo_unconfirmed(
        &self,
        tx: &Transaction,
        state: &mut AccountState,
    ) -> Result<(), TxError> {
        state.unstake_last(tx.sender_address, self.amount)?;
        state.credit(tx.sender_address, None, tx.fee);
        state.decrement_nonce(tx.sender_address)?;

        Ok(())
    }
}

impl Arbitrary for StakeAsset {
    fn arbitrary(g: &mut quickcheck::Gen) -> StakeAsset {
        StakeAsset {
            amount: i64::arbitrary(g).rem_euclid(1_000_000) + 1,
            start_timestamp: u32::arbitrary(g) % 1_000_000_000,
        }
    }
}
