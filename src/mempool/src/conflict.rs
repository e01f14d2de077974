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

//! Sender-conflict resolution.
//!
//! After a received block reshapes balances, pool entries that
//! were feasible before may no longer be. Each affected sender's
//! entries are walked oldest first: every entry is re-verified in
//! its pre-application context (undo, verify, re-apply). The
//! first entry that fails is displaced to the queue, every later
//! entry of that sender is unwound exactly once and re-verified,
//! and displaced transfers propagate to recipients that are
//! themselves pool senders. A shortfall also re-validates the
//! senders of the pool entries funding the failing account, found
//! through the recipient index. The visited set shrinks the
//! sender frontier on every step, so the walk terminates.

use crate::TxStore;
use account::{AccountState, Address};
use hashbrown::HashSet;
use log::{debug, warn};
use std::sync::Arc;
use transactions::Transaction;

pub fn resolve_sender_conflicts(
    store: &mut TxStore,
    state: &mut AccountState,
    seeds: Vec<Address>,
) {
    let mut visited: HashSet<Address> = HashSet::new();
    let mut retried: HashSet<Address> = HashSet::new();
    let mut stack = seeds;

    while let Some(sender) = stack.pop() {
        if !visited.insert(sender) {
            // One retry per sender, for pivots whose unwind had
            // to wait on a recipient's own resolution.
            if !retried.insert(sender) {
                continue;
            }
        }

        let entries = store.pool.get_by_sender_address(&sender);
        if entries.is_empty() {
            continue;
        }

        let mut pivot: Option<(usize, bool)> = None;

        for (index, tx) in entries.iter().enumerate() {
            if tx.undo_unconfirmed(state).is_err() {
                // The entry's effects are pinned down by the
                // recipient's own pool spending; resolve the
                // recipient first, then come back once.
                if let Some(recipient) = tx.recipient_address() {
                    if store.pool.has_sender(&recipient) && !retried.contains(&sender) {
                        stack.push(sender);
                        stack.push(recipient);
                        pivot = None;
                        break;
                    }
                }

                pivot = Some((index, false));
                break;
            }

            let verdict = match state.get(&sender) {
                Some(account) => tx.verify_unconfirmed(account),
                None => Err(transactions::TxError::UnknownSender(sender)),
            };

            match verdict {
                Ok(()) => {
                    if let Err(e) = tx.apply_unconfirmed(state) {
                        debug!("conflict: re-apply failed for sender {}: {}", sender, e);
                        pivot = Some((index, true));
                        break;
                    }
                }
                Err(e) => {
                    debug!("conflict: re-verify failed for sender {}: {}", sender, e);
                    pivot = Some((index, true));
                    break;
                }
            }
        }

        let Some((pivot_index, pivot_unwound)) = pivot else {
            continue;
        };

        let failing = &entries[pivot_index];

        if !pivot_unwound {
            warn!(
                "conflict: displacing {} with effects still applied",
                failing.id.map(|id| id.to_hex()).unwrap_or_default()
            );
        }

        // Unwind every later entry of this sender exactly once,
        // newest first.
        for tx in entries[pivot_index + 1..].iter().rev() {
            if let Err(e) = tx.undo_unconfirmed(state) {
                warn!(
                    "conflict: failed to unwind {}: {}",
                    tx.id.map(|id| id.to_hex()).unwrap_or_default(),
                    e
                );
            }
        }

        displace(store, failing, &mut stack);

        // Later entries re-enter in order; survivors stay pooled,
        // the rest follow the pivot into the queue.
        for tx in entries[pivot_index + 1..].iter() {
            let feasible = match state.get(&sender) {
                Some(account) => tx.verify_unconfirmed(account).is_ok(),
                None => false,
            };

            if feasible && tx.apply_unconfirmed(state).is_ok() {
                continue;
            }

            displace(store, tx, &mut stack);
        }

        // The shortfall may trace back to the entries funding this
        // sender; their senders get re-validated as well.
        for funding in store.pool.get_by_recipient_address(&sender) {
            stack.push(funding.sender_address);
        }
    }
}

/// Moves one pool entry to the queue for re-entry and queues its
/// recipient for resolution when that recipient is a pool sender.
fn displace(store: &mut TxStore, tx: &Arc<Transaction>, stack: &mut Vec<Address>) {
    if let Some(id) = tx.id {
        store.pool.remove(&id);
    }

    if let Err(e) = store.queue.push(tx.clone()) {
        warn!(
            "conflict: could not requeue {}: {}",
            tx.id.map(|id| id.to_hex()).unwrap_or_default(),
            e
        );
    }

    if let Some(recipient) = tx.recipient_address() {
        if store.pool.has_sender(&recipient) {
            stack.push(recipient);
        }
    }
}
