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

use crate::QueueError;
use constants::MAX_QUEUE_SIZE;
use crypto::Hash;
use hashbrown::HashSet;
use std::collections::VecDeque;
use std::sync::Arc;
use transactions::Transaction;

/// FIFO buffer of transactions waiting for verification.
#[derive(Default)]
pub struct TxQueue {
    entries: VecDeque<Arc<Transaction>>,
    queued_ids: HashSet<Hash>,
}

impl TxQueue {
    pub fn new() -> TxQueue {
        TxQueue::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &Hash) -> bool {
        self.queued_ids.contains(id)
    }

    pub fn push(&mut self, tx: Arc<Transaction>) -> Result<(), QueueError> {
        let id = tx.id.ok_or(QueueError::Unhashed)?;

        if self.contains(&id) {
            return Err(QueueError::AlreadyQueued);
        }

        if self.len() >= MAX_QUEUE_SIZE {
            return Err(QueueError::Full);
        }

        self.queued_ids.insert(id);
        self.entries.push_back(tx);

        Ok(())
    }

    pub fn pop_front(&mut self) -> Option<Arc<Transaction>> {
        let tx = self.entries.pop_front()?;

        if let Some(id) = tx.id {
            self.queued_ids.remove(&id);
        }

        Some(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto::Identity;
    use quickcheck::Arbitrary;

    #[test]
    fn push_pop_is_first_in_first_out() {
        let mut queue = TxQueue::new();
        let mut g = quickcheck::Gen::new(5);

        let first = Arc::new(Transaction::arbitrary(&mut g));
        let second = Arc::new(Transaction::arbitrary(&mut g));

        queue.push(first.clone()).unwrap();
        queue.push(second.clone()).unwrap();

        assert_eq!(queue.pop_front().unwrap().id, first.id);
        assert_eq!(queue.pop_front().unwrap().id, second.id);
        assert!(queue.pop_front().is_none());
    }

    #[test]
    fn duplicate_ids_are_refused() {
        let mut queue = TxQueue::new();
        let mut g = quickcheck::Gen::new(5);
        let tx = Arc::new(Transaction::arbitrary(&mut g));

        queue.push(tx.clone()).unwrap();
        assert_eq!(queue.push(tx.clone()), Err(QueueError::AlreadyQueued));

        // Popping frees the id again.
        queue.pop_front();
        assert!(queue.push(tx).is_ok());
    }

    #[test]
    fn unhashed_transactions_are_refused() {
        let mut queue = TxQueue::new();
        let identity = Identity::new();

        let tx = Transaction::unsigned(
            transactions::Asset::Send(transactions::SendAsset {
                recipient_address: account::Address(9),
                amount: 1,
            }),
            *identity.pkey(),
            1,
            [0; constants::SALT_LENGTH],
        );

        assert_eq!(queue.push(Arc::new(tx)), Err(QueueError::Unhashed));
    }
}
