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

use crate::PoolError;
use account::Address;
use constants::MAX_POOL_SIZE;
use crypto::Hash;
use hashbrown::HashMap;
use std::sync::Arc;
use transactions::{Asset, Transaction};

/// Pool of verified unconfirmed transactions.
///
/// Entries are keyed by id and indexed per sender and per
/// recipient address in (created_at, id) order. Preconditions for
/// `add`: the transaction passed the verification chain and its
/// account mutation is applied.
#[derive(Default)]
pub struct TxPool {
    tx_lookup: HashMap<Hash, Arc<Transaction>>,
    by_sender: HashMap<Address, Vec<Hash>>,
    by_recipient: HashMap<Address, Vec<Hash>>,
}

impl TxPool {
    pub fn new() -> TxPool {
        TxPool::default()
    }

    pub fn len(&self) -> usize {
        self.tx_lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx_lookup.is_empty()
    }

    /// Returns `true` if there is an existing transaction with
    /// the given id in the pool.
    pub fn exists(&self, id: &Hash) -> bool {
        self.tx_lookup.contains_key(id)
    }

    pub fn get(&self, id: &Hash) -> Option<Arc<Transaction>> {
        self.tx_lookup.get(id).cloned()
    }

    pub fn add(&mut self, tx: Arc<Transaction>) -> Result<(), PoolError> {
        let id = tx.id.ok_or(PoolError::Unhashed)?;

        if self.exists(&id) {
            return Err(PoolError::AlreadyInPool);
        }

        if self.len() >= MAX_POOL_SIZE {
            return Err(PoolError::Full);
        }

        let created_at = tx.created_at;
        let sender = tx.sender_address;
        let recipient = tx.recipient_address();

        self.tx_lookup.insert(id, tx);

        insert_ordered(
            self.by_sender.entry(sender).or_default(),
            &self.tx_lookup,
            id,
            created_at,
        );

        if let Some(recipient) = recipient {
            insert_ordered(
                self.by_recipient.entry(recipient).or_default(),
                &self.tx_lookup,
                id,
                created_at,
            );
        }

        Ok(())
    }

    /// Removes the transaction with the given id from the pool
    /// and returns it. The caller decides whether to undo its
    /// account mutation.
    pub fn remove(&mut self, id: &Hash) -> Option<Arc<Transaction>> {
        let tx = self.tx_lookup.remove(id)?;

        prune_index(&mut self.by_sender, &tx.sender_address, id);

        if let Some(recipient) = tx.recipient_address() {
            prune_index(&mut self.by_recipient, &recipient, id);
        }

        Some(tx)
    }

    /// Every pool entry of the given sender, ordered by
    /// (created_at, id) ascending.
    pub fn get_by_sender_address(&self, sender: &Address) -> Vec<Arc<Transaction>> {
        self.collect_index(self.by_sender.get(sender))
    }

    /// Every pool entry paying the given recipient, ordered by
    /// (created_at, id) ascending.
    pub fn get_by_recipient_address(&self, recipient: &Address) -> Vec<Arc<Transaction>> {
        self.collect_index(self.by_recipient.get(recipient))
    }

    /// Whether the address has outgoing pool entries.
    pub fn has_sender(&self, sender: &Address) -> bool {
        self.by_sender.get(sender).map(|v| !v.is_empty()).unwrap_or(false)
    }

    /// Up to `limit` transactions in block-formation order:
    /// fee descending, then created_at ascending, then id
    /// ascending. Entries are not removed; removal happens once a
    /// block apply succeeds.
    pub fn pop_sorted(&self, limit: usize) -> Vec<Arc<Transaction>> {
        let mut entries: Vec<Arc<Transaction>> = self.tx_lookup.values().cloned().collect();

        entries.sort_by(|a, b| {
            b.fee
                .cmp(&a.fee)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        entries.truncate(limit);
        entries
    }

    /// All pool entries in (created_at, id) order. Used when a
    /// received block displaces the whole pool.
    pub fn drain_all(&mut self) -> Vec<Arc<Transaction>> {
        let mut entries: Vec<Arc<Transaction>> = self.tx_lookup.values().cloned().collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        self.tx_lookup.clear();
        self.by_sender.clear();
        self.by_recipient.clear();

        entries
    }

    fn collect_index(&self, index: Option<&Vec<Hash>>) -> Vec<Arc<Transaction>> {
        index
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.tx_lookup.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn insert_ordered(
    list: &mut Vec<Hash>,
    lookup: &HashMap<Hash, Arc<Transaction>>,
    id: Hash,
    created_at: u32,
) {
    let position = list
        .iter()
        .position(|other| {
            let other_tx = &lookup[other];
            (other_tx.created_at, other_tx.id) > (created_at, Some(id))
        })
        .unwrap_or(list.len());

    list.insert(position, id);
}

fn prune_index(index: &mut HashMap<Address, Vec<Hash>>, key: &Address, id: &Hash) {
    let mut remove_entry = false;

    if let Some(list) = index.get_mut(key) {
        list.retain(|other| other != id);
        remove_entry = list.is_empty();
    }

    if remove_entry {
        index.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto::Identity;
    use transactions::SendAsset;

    fn pool_tx(sender: &Identity, created_at: u32, fee: i64, recipient: Address) -> Arc<Transaction> {
        let mut tx = Transaction::unsigned(
            Asset::Send(SendAsset {
                recipient_address: recipient,
                amount: 10,
            }),
            *sender.pkey(),
            created_at,
            crypto::gen_bytes(constants::SALT_LENGTH).try_into().unwrap(),
        );
        tx.fee = fee;
        tx.sign(sender.skey());

        Arc::new(tx)
    }

    #[test]
    fn block_formation_order_is_fee_desc_then_age_then_id() {
        let sender = Identity::new();
        let mut pool = TxPool::new();

        let cheap_old = pool_tx(&sender, 5, 1, Address(9));
        let cheap_new = pool_tx(&sender, 9, 1, Address(9));
        let expensive = pool_tx(&sender, 20, 50, Address(9));

        pool.add(cheap_new.clone()).unwrap();
        pool.add(expensive.clone()).unwrap();
        pool.add(cheap_old.clone()).unwrap();

        let sorted = pool.pop_sorted(10);
        assert_eq!(sorted[0].id, expensive.id);
        assert_eq!(sorted[1].id, cheap_old.id);
        assert_eq!(sorted[2].id, cheap_new.id);

        // pop_sorted does not remove anything.
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn equal_fee_and_age_break_ties_on_the_smaller_id() {
        let sender = Identity::new();
        let mut pool = TxPool::new();

        let a = pool_tx(&sender, 5, 1, Address(9));
        let b = pool_tx(&sender, 5, 1, Address(9));
        pool.add(a.clone()).unwrap();
        pool.add(b.clone()).unwrap();

        let sorted = pool.pop_sorted(10);
        assert!(sorted[0].id < sorted[1].id);
    }

    #[test]
    fn sender_index_is_age_ordered() {
        let sender = Identity::new();
        let address = Address::from_pkey(sender.pkey());
        let mut pool = TxPool::new();

        let late = pool_tx(&sender, 50, 1, Address(9));
        let early = pool_tx(&sender, 10, 9, Address(9));

        pool.add(late.clone()).unwrap();
        pool.add(early.clone()).unwrap();

        let entries = pool.get_by_sender_address(&address);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, early.id);
        assert_eq!(entries[1].id, late.id);
    }

    #[test]
    fn recipient_index_tracks_transfers() {
        let sender = Identity::new();
        let recipient = Address(77);
        let mut pool = TxPool::new();

        let tx = pool_tx(&sender, 10, 1, recipient);
        pool.add(tx.clone()).unwrap();

        let entries = pool.get_by_recipient_address(&recipient);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, tx.id);

        pool.remove(&tx.id.unwrap());
        assert!(pool.get_by_recipient_address(&recipient).is_empty());
    }

    #[test]
    fn double_add_is_rejected() {
        let sender = Identity::new();
        let mut pool = TxPool::new();
        let tx = pool_tx(&sender, 10, 1, Address(9));

        pool.add(tx.clone()).unwrap();
        assert_eq!(pool.add(tx), Err(PoolError::AlreadyInPool));
    }

    #[test]
    fn drain_empties_every_index() {
        let sender = Identity::new();
        let address = Address::from_pkey(sender.pkey());
        let mut pool = TxPool::new();
        pool.add(pool_tx(&sender, 10, 1, Address(9))).unwrap();
        pool.add(pool_tx(&sender, 11, 2, Address(9))).unwrap();

        let drained = pool.drain_all();

        assert_eq!(drained.len(), 2);
        assert!(drained[0].created_at <= drained[1].created_at);
        assert!(pool.is_empty());
        assert!(pool.get_by_sender_address(&address).is_empty());
    }
}
