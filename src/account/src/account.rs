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

use crate::Address;
use crypto::PublicKey;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

/// A single frozen stake held by an account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Stake {
    pub amount: i64,

    /// Epoch time at which the stake was opened.
    pub created_at: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Account {
    pub address: Address,

    /// Zeroed until the account is first seen as a sender.
    pub public_key: PublicKey,

    pub actual_balance: i64,

    /// Portion of `actual_balance` locked in stakes. Never
    /// exceeds `actual_balance`.
    pub total_staked_amount: i64,

    pub second_public_key: Option<PublicKey>,

    /// Delegates this account currently votes for.
    pub votes: HashSet<Address>,

    /// Open stakes, oldest first.
    pub stakes: Vec<Stake>,

    /// Count of confirmed transactions sent by this account.
    pub nonce: u64,
}

impl Account {
    pub fn new(address: Address, public_key: PublicKey) -> Account {
        Account {
            address,
            public_key,
            actual_balance: 0,
            total_staked_amount: 0,
            second_public_key: None,
            votes: HashSet::new(),
            stakes: Vec::new(),
            nonce: 0,
        }
    }

    /// The balance available for new outgoing transfers.
    #[inline]
    pub fn spendable(&self) -> i64 {
        self.actual_balance - self.total_staked_amount
    }
}
