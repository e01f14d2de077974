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

pub use crate::conflict::resolve_sender_conflicts;
pub use crate::error::{PoolError, QueueError};
pub use crate::pool::TxPool;
pub use crate::queue::TxQueue;

mod conflict;
mod error;
mod pool;
mod queue;

use account::AccountState;
use chain::{slots, Storage};
use constants::FUTURE_LIMIT;
use log::{debug, warn};
use std::sync::Arc;
use transactions::Transaction;

/// Pool and queue in one place. Block application reshapes both
/// at once, so they live behind a single lock; callers take a
/// write guard on the whole store and pass it down.
#[derive(Default)]
pub struct TxStore {
    pub pool: TxPool,
    pub queue: TxQueue,
}

impl TxStore {
    pub fn new() -> TxStore {
        TxStore::default()
    }

    /// Accepts an inbound transaction into the queue. Re-pushing
    /// an id that is already queued or pooled is a no-op.
    pub fn enqueue(&mut self, tx: Arc<Transaction>) -> Result<(), QueueError> {
        let id = tx.id.ok_or(QueueError::Unhashed)?;

        if self.pool.exists(&id) || self.queue.contains(&id) {
            return Ok(());
        }

        self.queue.push(tx)
    }

    /// Runs the single-pass verifier over everything currently
    /// queued. Survivors move into the pool with their account
    /// mutation applied; failures are dropped with their reasons
    /// logged. Returns the number of promoted transactions.
    pub fn process_queue(&mut self, state: &mut AccountState, storage: &dyn Storage) -> usize {
        let mut promoted = 0;
        let mut pending = self.queue.len();

        while pending > 0 {
            pending -= 1;

            let tx = match self.queue.pop_front() {
                Some(tx) => tx,
                None => break,
            };

            match self.verify_and_pool(tx, state, storage) {
                Ok(id) => {
                    debug!("queue: promoted {} to the pool", id.to_hex());
                    promoted += 1;
                }
                Err(reasons) => {
                    warn!("queue: dropped transaction: {}", reasons.join("; "));
                }
            }
        }

        promoted
    }

    /// The verification chain for one queued transaction:
    /// duplicate checks, static validation, fee recomputation,
    /// signature check, dynamic checks, then apply + pool.
    fn verify_and_pool(
        &mut self,
        tx: Arc<Transaction>,
        state: &mut AccountState,
        storage: &dyn Storage,
    ) -> Result<crypto::Hash, Vec<String>> {
        let id = match tx.id {
            Some(id) => id,
            None => return Err(vec!["transaction is not hashed".into()]),
        };

        let mut reasons = Vec::new();

        if self.pool.exists(&id) {
            reasons.push(format!("{} is already in the pool", id.to_hex()));
        }

        match storage.transaction_exists(&id) {
            Ok(true) => reasons.push(format!("{} is already confirmed", id.to_hex())),
            Ok(false) => {}
            Err(e) => reasons.push(format!("storage check failed: {}", e)),
        }

        if tx.created_at > slots::now() + FUTURE_LIMIT {
            reasons.push("timestamp is too far in the future".into());
        }

        if let Err(e) = tx.validate() {
            reasons.push(e.to_string());
        }

        if !tx.verify_signature() {
            reasons.push("invalid signature".into());
        }

        if !reasons.is_empty() {
            return Err(reasons);
        }

        let sender = match state.get(&tx.sender_address) {
            Some(account) => account,
            None => return Err(vec![format!("unknown sender account {}", tx.sender_address)]),
        };

        // The fee rule may depend on live state (votes scale with
        // the staked total). A corrected fee changes the id.
        let expected_fee = tx.calculate_fee(sender);
        let tx = if tx.fee != expected_fee {
            let mut corrected = (*tx).clone();
            corrected.fee = expected_fee;
            corrected.compute_id();

            debug!(
                "queue: fee corrected from {} to {} for {}",
                tx.fee,
                expected_fee,
                id.to_hex()
            );

            Arc::new(corrected)
        } else {
            tx
        };

        let id = tx.id.ok_or_else(|| vec!["transaction is not hashed".to_string()])?;

        if self.pool.exists(&id) {
            return Err(vec![format!("{} is already in the pool", id.to_hex())]);
        }

        let sender = state
            .get(&tx.sender_address)
            .ok_or_else(|| vec![format!("unknown sender account {}", tx.sender_address)])?;

        tx.verify_unconfirmed(sender).map_err(|e| vec![e.to_string()])?;
        tx.apply_unconfirmed(state).map_err(|e| vec![e.to_string()])?;

        if let Err(e) = self.pool.add(tx.clone()) {
            // Keep pool and state consistent.
            let _ = tx.undo_unconfirmed(state);
            return Err(vec![e.to_string()]);
        }

        Ok(id)
    }

    /// Empties the pool, reversing every entry's account mutation
    /// newest first. Returns the displaced entries oldest first.
    /// Used when an incoming block reshapes the pool.
    pub fn displace_all(&mut self, state: &mut AccountState) -> Vec<Arc<Transaction>> {
        let displaced = self.pool.drain_all();

        for tx in displaced.iter().rev() {
            if let Err(e) = tx.undo_unconfirmed(state) {
                warn!(
                    "pool: failed to unwind {} during displacement: {}",
                    tx.id.map(|id| id.to_hex()).unwrap_or_default(),
                    e
                );
            }
        }

        displaced
    }
}
