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

use account::{Address, StateError};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("invalid amount")]
    InvalidAmount,
    #[error("missing recipient")]
    MissingRecipient,
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: i64, need: i64 },
    #[error("transaction is not signed")]
    MissingSignature,
    #[error("invalid signature")]
    SignatureInvalid,
    #[error("second signature required")]
    MissingSecondSignature,
    #[error("invalid second signature")]
    SecondSignatureInvalid,
    #[error("second signature key already registered")]
    SecondKeyAlreadySet,
    #[error("second signature key is null")]
    NullSecondKey,
    #[error("empty vote list")]
    EmptyVotes,
    #[error("too many votes: {0}")]
    TooManyVotes(usize),
    #[error("duplicate vote for {0}")]
    DuplicateVote(Address),
    #[error("already voted for {0}")]
    AlreadyVoted(Address),
    #[error("no vote to withdraw for {0}")]
    NotVoted(Address),
    #[error("negative reward field")]
    NegativeReward,
    #[error("transaction is not hashed")]
    MissingId,
    #[error("unknown sender account {0}")]
    UnknownSender(Address),
    #[error(transparent)]
    State(#[from] StateError),
}
