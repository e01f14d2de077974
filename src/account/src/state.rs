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

use crate::{Account, Address, Stake};
use crypto::PublicKey;
use hashbrown::{HashMap, HashSet};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("unknown account {0}")]
    UnknownAccount(Address),
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: i64, need: i64 },
    #[error("staked amount underflow")]
    StakeUnderflow,
    #[error("account {0} already voted for {1}")]
    AlreadyVoted(Address, Address),
    #[error("account {0} holds no vote for {1}")]
    NotVoted(Address, Address),
    #[error("second public key already registered")]
    SecondKeyAlreadySet,
    #[error("no second public key registered")]
    SecondKeyNotSet,
}

/// In-memory address to account mapping.
///
/// Mutations go through the typed methods below so that the
/// spendable-balance and stake invariants hold after every call.
/// While a round is open, the first mutation of each account
/// snapshots its prior value; `rollback_round` replays the
/// snapshots, restoring the exact pre-round state.
#[derive(Debug, Default)]
pub struct AccountState {
    accounts: HashMap<Address, Account>,
    diary: Vec<(Address, Option<Account>)>,
    touched: HashSet<Address>,
    recording: bool,
}

impl AccountState {
    pub fn new() -> AccountState {
        AccountState::default()
    }

    pub fn get(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Account)> {
        self.accounts.iter()
    }

    /// Opens an undo checkpoint. Subsequent mutations snapshot
    /// each account once, before its first change.
    pub fn begin_round(&mut self) {
        self.diary.clear();
        self.touched.clear();
        self.recording = true;
    }

    /// Discards the open checkpoint, keeping all mutations.
    pub fn commit_round(&mut self) {
        self.diary.clear();
        self.touched.clear();
        self.recording = false;
    }

    /// Restores the state captured by `begin_round`.
    pub fn rollback_round(&mut self) {
        for (address, prior) in self.diary.drain(..).rev() {
            match prior {
                Some(account) => {
                    self.accounts.insert(address, account);
                }
                None => {
                    self.accounts.remove(&address);
                }
            }
        }

        self.touched.clear();
        self.recording = false;
    }

    fn record(&mut self, address: Address) {
        if self.recording && self.touched.insert(address) {
            self.diary.push((address, self.accounts.get(&address).cloned()));
        }
    }

    fn entry(&mut self, address: Address, pkey: Option<&PublicKey>) -> &mut Account {
        self.record(address);

        let account = self
            .accounts
            .entry(address)
            .or_insert_with(|| Account::new(address, PublicKey::NULL));

        // Fill the key in once the account is first seen with one.
        if account.public_key == PublicKey::NULL {
            if let Some(pkey) = pkey {
                account.public_key = *pkey;
            }
        }

        account
    }

    fn existing(&mut self, address: Address) -> Result<&mut Account, StateError> {
        self.record(address);

        self.accounts
            .get_mut(&address)
            .ok_or(StateError::UnknownAccount(address))
    }

    /// Credits the account, creating it when it does not exist yet.
    pub fn credit(&mut self, address: Address, pkey: Option<&PublicKey>, amount: i64) {
        let account = self.entry(address, pkey);
        account.actual_balance += amount;
    }

    /// Debits the spendable balance. Fails when the account does
    /// not exist or when `amount` exceeds what is not staked.
    pub fn debit(&mut self, address: Address, amount: i64) -> Result<(), StateError> {
        let account = self.existing(address)?;

        if account.spendable() < amount {
            return Err(StateError::InsufficientBalance {
                have: account.spendable(),
                need: amount,
            });
        }

        account.actual_balance -= amount;
        Ok(())
    }

    /// Freezes part of the spendable balance into a new stake.
    pub fn stake(&mut self, address: Address, amount: i64, created_at: u32) -> Result<(), StateError> {
        let account = self.existing(address)?;

        if account.spendable() < amount {
            return Err(StateError::InsufficientBalance {
                have: account.spendable(),
                need: amount,
            });
        }

        account.total_staked_amount += amount;
        account.stakes.push(Stake { amount, created_at });
        Ok(())
    }

    /// Reverses the most recent stake of exactly `amount`.
    pub fn unstake_last(&mut self, address: Address, amount: i64) -> Result<(), StateError> {
        let account = self.existing(address)?;

        match account.stakes.last() {
            Some(stake) if stake.amount == amount => {
                account.stakes.pop();
                account.total_staked_amount -= amount;
                Ok(())
            }
            _ => Err(StateError::StakeUnderflow),
        }
    }

    pub fn add_vote(&mut self, voter: Address, delegate: Address) -> Result<(), StateError> {
        let account = self.existing(voter)?;

        if !account.votes.insert(delegate) {
            return Err(StateError::AlreadyVoted(voter, delegate));
        }

        Ok(())
    }

    pub fn remove_vote(&mut self, voter: Address, delegate: Address) -> Result<(), StateError> {
        let account = self.existing(voter)?;

        if !account.votes.remove(&delegate) {
            return Err(StateError::NotVoted(voter, delegate));
        }

        Ok(())
    }

    pub fn set_second_public_key(
        &mut self,
        address: Address,
        pkey: PublicKey,
    ) -> Result<(), StateError> {
        let account = self.existing(address)?;

        if account.second_public_key.is_some() {
            return Err(StateError::SecondKeyAlreadySet);
        }

        account.second_public_key = Some(pkey);
        Ok(())
    }

    pub fn clear_second_public_key(&mut self, address: Address) -> Result<(), StateError> {
        let account = self.existing(address)?;

        if account.second_public_key.take().is_none() {
            return Err(StateError::SecondKeyNotSet);
        }

        Ok(())
    }

    pub fn increment_nonce(&mut self, address: Address) -> Result<(), StateError> {
        let account = self.existing(address)?;
        account.nonce += 1;
        Ok(())
    }

    pub fn decrement_nonce(&mut self, address: Address) -> Result<(), StateError> {
        let account = self.existing(address)?;
        account.nonce = account.nonce.saturating_sub(1);
        Ok(())
    }
}

impl PartialEq for AccountState {
    fn eq(&self, other: &AccountState) -> bool {
        self.accounts == other.accounts
    }
}
