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
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use constants::{FEE_DIVISOR, MAX_VOTES_PER_TX};
use quickcheck::Arbitrary;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Cursor;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Add,
    Remove,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteCast {
    pub direction: VoteDirection,
    pub delegate: Address,
}

/// Vote ballot. The fee of a vote scales with the sender's total
/// staked amount, so it is recomputed against live state during
/// verification. Reward, unstake and sponsor fields are carried
/// for the reward collaborator; they do not touch account state
/// here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VoteAsset {
    pub votes: Vec<VoteCast>,
    pub reward: i64,
    pub unstake: i64,

    /// Airdrop sponsors, ordered. Encoded in stored order.
    pub sponsors: Vec<(Address, i64)>,
}

impl VoteAsset {
    pub const TX_TYPE: u8 = 50;

    pub(crate) fn write_bytes(&self, buf: &mut Vec<u8>) {
        buf.write_u16::<LittleEndian>(self.votes.len() as u16).unwrap();

        for cast in self.votes.iter() {
            let direction: u8 = match cast.direction {
                VoteDirection::Add => 1,
                VoteDirection::Remove => 0,
            };

            buf.write_u8(direction).unwrap();
            buf.write_u64::<LittleEndian>(cast.delegate.0).unwrap();
        }

        buf.write_i64::<LittleEndian>(self.reward).unwrap();
        buf.write_i64::<LittleEndian>(self.unstake).unwrap();

        buf.write_u16::<LittleEndian>(self.sponsors.len() as u16).unwrap();

        for (address, reward) in self.sponsors.iter() {
            buf.write_u64::<LittleEndian>(address.0).unwrap();
            buf.write_i64::<LittleEndian>(*reward).unwrap();
        }
    }

    pub(crate) fn read_asset(rdr: &mut Cursor<&[u8]>) -> Result<VoteAsset, &'static str> {
        let vote_count = rdr
            .read_u16::<LittleEndian>()
            .map_err(|_| "Bad vote count")? as usize;

        if vote_count > MAX_VOTES_PER_TX {
            return Err("Too many votes");
        }

        let mut votes = Vec::with_capacity(vote_count);

        for _ in 0..vote_count {
            let direction = match rdr.read_u8().map_err(|_| "Bad vote direction")? {
                1 => VoteDirection::Add,
                0 => VoteDirection::Remove,
                _ => return Err("Bad vote direction"),
            };
            let delegate = rdr
                .read_u64::<LittleEndian>()
                .map_err(|_| "Bad vote delegate")?;

            votes.push(VoteCast {
                direction,
                delegate: Address(delegate),
            });
        }

        let reward = rdr.read_i64::<LittleEndian>().map_err(|_| "Bad reward")?;
        let unstake = rdr.read_i64::<LittleEndian>().map_err(|_| "Bad unstake")?;

        let sponsor_count = rdr
            .read_u16::<LittleEndian>()
            .map_err(|_| "Bad sponsor count")? as usize;
        let mut sponsors = Vec::with_capacity(sponsor_count);

        for _ in 0..sponsor_count {
            let address = rdr
                .read_u64::<LittleEndian>()
                .map_err(|_| "Bad sponsor address")?;
            let sponsor_reward = rdr
                .read_i64::<LittleEndian>()
                .map_err(|_| "Bad sponsor reward")?;

            sponsors.push((Address(address), sponsor_reward));
        }

        Ok(VoteAsset {
            votes,
            reward,
            unstake,
            sponsors,
        })
    }

    pub fn validate(&self) -> Result<(), TxError> {
        if self.votes.is_empty() {
            return Err(TxError::EmptyVotes);
        }

        if self.votes.len() > MAX_VOTES_PER_TX {
            return Err(TxError::TooManyVotes(self.votes.len()));
        }

        let mut seen = HashSet::with_capacity(self.votes.len());
        for cast in self.votes.iter() {
            if !seen.insert(cast.delegate) {
                return Err(TxError::DuplicateVote(cast.delegate));
            }
        }

        if self.reward < 0 || self.unstake < 0 {
            return Err(TxError::NegativeReward);
        }

        if self.sponsors.iter().any(|(_, reward)| *reward < 0) {
            return Err(TxError::InvalidAmount);
        }

        Ok(())
    }

    pub fn calculate_fee(&self, sender: &Account) -> i64 {
        sender.total_staked_amount / FEE_DIVISOR
    }

    pub fn verify_unconfirmed(&self, tx: &Transaction, sender: &Account) -> Result<(), TxError> {
        let need = tx.total_deduction();

        if sender.spendable() < need {
            return Err(TxError::InsufficientBalance {
                have: sender.spendable(),
                need,
            });
        }

        for cast in self.votes.iter() {
            match cast.direction {
                VoteDirection::Add => {
                    if sender.votes.contains(&cast.delegate) {
                        return Err(TxError::AlreadyVoted(cast.delegate));
                    }
                }
                VoteDirection::Remove => {
                    if !sender.votes.contains(&cast.delegate) {
                        return Err(TxError::NotVoted(cast.delegate));
                    }
                }
            }
        }

        Ok(())
    }

    pub fn apply_unconfirmed(
        &self,
        tx: &Transaction,
        state: &mut AccountState,
    ) -> Result<(), TxError> {
        state.debit(tx.sender_address, tx.fee)?;

        for cast in self.votes.iter() {
            match cast.direction {
                VoteDirection::Add => state.add_vote(tx.sender_address, cast.delegate)?,
                VoteDirection::Remove => state.remove_vote(tx.sender_address, cast.delegate)?,
            }
        }

        state.increment_nonce(tx.sender_address)?;
        Ok(())
    }

    pub fn undo_unconfirmed(
        &self,
        tx: &Transaction,
        state: &mut AccountState,
    ) -> Result<(), TxError> {
        for cast in self.votes.iter().rev() {
            match cast.direction {
                VoteDirection::Add => state.remove_vote(tx.sender_address, cast.delegate)?,
                VoteDirection::Remove => state.add_vote(tx.sender_address, cast.delegate)?,
            }
        }

        state.credit(tx.sender_address, None, tx.fee);
        state.decrement_nonce(tx.sender_address)?;
        Ok(())
    }
}

impl Arbitrary for VoteAsset {
    fn arbitrary(g: &mut quickcheck::Gen) -> VoteAsset {
        let count = u64::arbitrary(g) % 5 + 1;
        let base = (u64::arbitrary(g) % (u64::MAX - 64)).max(1);

        let votes = (0..count)
            .map(|i| VoteCast {
                direction: if u8::arbitrary(g) % 10 < 7 {
                    VoteDirection::Add
                } else {
                    VoteDirection::Remove
                },
                // Offset by index so the delegates stay distinct.
                delegate: Address(base + i),
            })
            .collect();

        let sponsors = (0..u64::arbitrary(g) % 3)
            .map(|_| (Address::arbitrary(g), i64::arbitrary(g).rem_euclid(1_000)))
            .collect();

        VoteAsset {
            votes,
            reward: i64::arbitrary(g).rem_euclid(1_000),
            unstake: i64::arbitrary(g).rem_euclid(1_000),
            sponsors,
        }
    }
}
