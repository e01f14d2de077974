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
use account::{Account, AccountState, Address};
use constants::FEE_DIVISOR;
use quickcheck::Arbitrary;
use serde::{Deserialize, Serialize};

/// Plain value transfer. Recipient and amount ride in the fixed
/// transaction header, so the asset tail is empty.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendAsset {
    pub recipient_address: Address,
    pub amount: i64,
}

impl SendAsset {
    pub const TX_TYPE: u8 = 10;

    pub(crate) fn write_bytes(&self, _buf: &mut Vec<u8>) {
        // Empty tail; both fields live in the header.
    }

    pub fn validate(&self) -> Result<(), TxError> {
        if self.amount <= 0 {
            return Err(TxError::InvalidAmount);
        }

        if self.recipient_address == Address::NULL {
            return Err(TxError::MissingRecipient);
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

    /// Debits `amount + fee` from the sender and credits the
    /// recipient, creating the recipient account if needed.
    pub fn apply_unconfirmed(
        &self,
        tx: &Transaction,
        state: &mut AccountState,
    ) -> Result<(), TxError> {
        state.debit(tx.sender_address, self.amount + tx.fee)?;
        state.credit(self.recipient_address, None, self.amount);
        state.increment_nonce(tx.sender_address)?;

        Ok(())
    }

    pub fn undo_unconfirmed(
        &self,
        tx: &Transaction,
        state: &mut AccountState,
    ) -> Result<(), TxError> {
        state.debit(self.recipient_address, self.amount)?;
        state.credit(tx.sender_address, None, self.amount + tx.fee);
        state.decrement_nonce(tx.sender_address)?;

        Ok(())
    }
}

impl Arbitrary for SendAsset {
    fn arbitrary(g: &mut quickcheck::Gen) -> SendAsset {
        SendAsset {
            recipient_address: Address::arbitrary(g),
            amount: i64::arbitrary(g).rem_euclid(1_000_000) + 1,
        }
    }
}
