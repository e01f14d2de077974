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
use constants::SECOND_SIGNATURE_FEE;
use crypto::PublicKey;
use quickcheck::Arbitrary;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};

/// Registers an independent second keypair on the sender account.
/// Once registered, every later transaction from the account must
/// carry a valid second signature.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondSignatureAsset {
    pub second_public_key: PublicKey,
}

impl SecondSignatureAsset {
    pub const TX_TYPE: u8 = 20;

    pub(crate) fn write_bytes(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.second_public_key.0);
    }

    pub(crate) fn read_asset(rdr: &mut Cursor<&[u8]>) -> Result<SecondSignatureAsset, &'static str> {
        let mut pkey = [0u8; 32];
        rdr.read_exact(&mut pkey).map_err(|_| "Bad second key")?;

        Ok(SecondSignatureAsset {
            second_public_key: PublicKey(pkey),
        })
    }

    pub fn validate(&self) -> Result<(), TxError> {
        if self.second_public_key == PublicKey::NULL {
            return Err(TxError::NullSecondKey);
        }

        Ok(())
    }

    pub fn calculate_fee(&self) -> i64 {
        SECOND_SIGNATURE_FEE
    }

    pub fn verify_unconfirmed(&self, tx: &Transaction, sender: &Account) -> Result<(), TxError> {
        if sender.second_public_key.is_some() {
            return Err(TxError::SecondKeyAlreadySet);
        }

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
        state.debit(tx.sender_address, tx.fee)?;
        state.set_second_public_key(tx.sender_address, self.second_public_key)?;
        state.increment_nonce(tx.sender_address)?;

        Ok(())
    }

    pub fn undo_unconfirmed(
        &self,
        tx: &Transaction,
        state: &mut AccountState,
    ) -> Result<(), TxError> {
        state.clear_second_public_key(tx.sender_address)?;
        state.credit(tx.sender_address, None, tx.fee);
        state.decrement_nonce(tx.sender_address)?;

        Ok(())
    }
}

impl Arbitrary for SecondSignatureAsset {
    fn arbitrary(g: &mut quickcheck::Gen) -> SecondSignatureAsset {
        SecondSignatureAsset {
            second_public_key: PublicKey::arbitrary(g),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Asset, SendAsset};
    use account::Address;
    use crypto::Identity;

    #[test]
    fn registration_enforces_the_second_signature_afterwards() {
        let sender = Identity::new();
        let second = Identity::new();
        let address = Address::from_pkey(sender.pkey());

        let mut state = AccountState::new();
        state.credit(address, Some(sender.pkey()), 10_000_000);

        let mut register = Transaction::unsigned(
            Asset::SecondSignature(SecondSignatureAsset {
                second_public_key: *second.pkey(),
            }),
            *sender.pkey(),
            10,
            [5; constants::SALT_LENGTH],
        );
        register.fee = SECOND_SIGNATURE_FEE;
        register.sign(sender.skey());
        register.apply_unconfirmed(&mut state).unwrap();

        // A transfer signed with the first key only is no longer
        // acceptable.
        let mut send = Transaction::unsigned(
            Asset::Send(SendAsset {
                recipient_address: Address(9),
                amount: 100,
            }),
            *sender.pkey(),
            11,
            [6; constants::SALT_LENGTH],
        );
        send.sign(sender.skey());

        assert_eq!(
            send.verify_unconfirmed(state.get(&address).unwrap()),
            Err(TxError::MissingSecondSignature)
        );

        send.second_sign(second.skey());
        assert!(send.verify_unconfirmed(state.get(&address).unwrap()).is_ok());

        // And a second signature from the wrong key fails.
        let intruder = Identity::new();
        send.second_sign(intruder.skey());
        assert_eq!(
            send.verify_unconfirmed(state.get(&address).unwrap()),
            Err(TxError::SecondSignatureInvalid)
        );
    }

    #[test]
    fn double_registration_is_rejected() {
        let sender = Identity::new();
        let address = Address::from_pkey(sender.pkey());
        let mut state = AccountState::new();
        state.credit(address, Some(sender.pkey()), 10_000_000);
        state
            .set_second_public_key(address, *Identity::new().pkey())
            .unwrap();

        let asset = SecondSignatureAsset {
            second_public_key: *Identity::new().pkey(),
        };
        let mut tx = Transaction::unsigned(
            Asset::SecondSignature(asset),
            *sender.pkey(),
            10,
            [7; constants::SALT_LENGTH],
        );
        tx.fee = asset.calculate_fee();
        tx.sign(sender.skey());

        assert_eq!(
            tx.verify_unconfirmed(state.get(&address).unwrap()),
            Err(TxError::SecondKeyAlreadySet)
        );
    }

    #[test]
    fn apply_then_undo_restores_state() {
        let sender = Identity::new();
        let address = Address::from_pkey(sender.pkey());
        let mut state = AccountState::new();
        state.credit(address, Some(sender.pkey()), 10_000_000);
        let before = state.get(&address).unwrap().clone();

        let mut tx = Transaction::unsigned(
            Asset::SecondSignature(SecondSignatureAsset {
                second_public_key: *Identity::new().pkey(),
            }),
            *sender.pkey(),
            10,
            [8; constants::SALT_LENGTH],
        );
        tx.fee = SECOND_SIGNATURE_FEE;
        tx.sign(sender.skey());

        tx.apply_unconfirmed(&mut state).unwrap();
        tx.undo_unconfirmed(&mut state).unwrap();

        assert_eq!(state.get(&address).unwrap(), &before);
    }
}
