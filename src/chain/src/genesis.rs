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

use crate::Block;
use account::{AccountState, Address};
use crypto::{Hash, PublicKey};
use lazy_static::lazy_static;
use transactions::{Asset, SendAsset, Transaction};

lazy_static! {
    /// Atomic reference count to the bare genesis block.
    pub static ref GENESIS: std::sync::Arc<Block> = std::sync::Arc::new(make_genesis(&[]));
}

/// Builds the genesis block: height 1, zero parent, unsigned,
/// carrying one seed transfer per premine entry. Everything is
/// pinned, so the id is stable across nodes with equal premines.
pub fn make_genesis(premine: &[(Address, i64)]) -> Block {
    let transactions: Vec<Transaction> = premine
        .iter()
        .map(|(recipient, amount)| {
            let mut tx = Transaction::unsigned(
                Asset::Send(SendAsset {
                    recipient_address: *recipient,
                    amount: *amount,
                }),
                PublicKey::NULL,
                0,
                [0; constants::SALT_LENGTH],
            );
            tx.compute_id();

            tx
        })
        .collect();

    let (payload_hash, amount, fee) = Block::payload_of(&transactions);

    let mut block = Block {
        id: None,
        version: 0,
        height: 1,
        previous_block_id: Hash::NULL,
        created_at: 0,
        generator_public_key: PublicKey::NULL,
        signature: None,
        transaction_count: transactions.len() as u32,
        transactions,
        amount,
        fee,
        payload_hash,
    };
    block.compute_id();

    block
}

/// Seeds balances from the genesis block. Genesis transfers have
/// no sender to debit and skip balance checks entirely, which is
/// what lets the first forged block apply under normal rules.
pub fn apply_genesis(state: &mut AccountState, block: &Block) {
    for tx in block.transactions.iter() {
        if let Asset::Send(ref asset) = tx.asset {
            state.credit(asset.recipient_address, None, asset.amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_id_is_deterministic() {
        let a = make_genesis(&[(Address(7), 100)]);
        let b = make_genesis(&[(Address(7), 100)]);
        let c = make_genesis(&[(Address(7), 101)]);

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn apply_seeds_balances_without_checks() {
        let genesis = make_genesis(&[(Address(1), 500), (Address(2), 300)]);
        let mut state = AccountState::new();

        apply_genesis(&mut state, &genesis);

        assert_eq!(state.get(&Address(1)).unwrap().actual_balance, 500);
        assert_eq!(state.get(&Address(2)).unwrap().actual_balance, 300);
    }

    #[test]
    fn the_shared_genesis_is_empty() {
        assert_eq!(GENESIS.transaction_count, 0);
        assert_eq!(GENESIS.height, 1);
        assert!(GENESIS.previous_block_id.is_null());
    }
}
