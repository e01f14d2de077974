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

//! The block pipeline.
//!
//! Forging and receipt share one discipline: displace the whole
//! pool (reversing its unconfirmed effects), verify and apply the
//! block transaction by transaction, then let the displaced
//! entries re-enter and resolve whichever senders came out of it
//! infeasible. Every chain-mutating operation takes the global
//! sequence for its whole turn.

use crate::fork::{self, ForkKind};
use crate::transport::Transport;
use crate::{PipelineError, Sequence};
use account::{AccountState, Address};
use chain::{slots, Block, ChainRef, DelegateRoster, Storage};
use constants::{BLOCK_VERSION, MAX_BLOCK_BYTES, MAX_TX_PER_BLOCK};
use crypto::{Hash, Identity};
use hashbrown::HashSet;
use log::{debug, info, warn};
use mempool::{resolve_sender_conflicts, TxStore};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use transactions::Transaction;

/// Outbound seam for freshly applied blocks. Gossip lives
/// outside the core.
pub trait Broadcaster: Send + Sync {
    fn broadcast_block(&self, block: &Block);
}

pub struct NoopBroadcaster;

impl Broadcaster for NoopBroadcaster {
    fn broadcast_block(&self, _block: &Block) {}
}

/// What became of a received block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receipt {
    Applied,
    AlreadyConfirmed,
    ForkOneRewound,
    ForkFiveSwitched,
    Discarded,
}

pub struct Pipeline {
    chain: ChainRef,
    state: Arc<RwLock<AccountState>>,
    store: Arc<RwLock<TxStore>>,
    roster: DelegateRoster,
    storage: Arc<dyn Storage>,
    broadcaster: Arc<dyn Broadcaster>,
    sequence: Sequence,
    db_sequence: Sequence,
    is_cleaning: AtomicBool,
}

impl Pipeline {
    pub fn new(
        chain: ChainRef,
        state: Arc<RwLock<AccountState>>,
        store: Arc<RwLock<TxStore>>,
        roster: DelegateRoster,
        storage: Arc<dyn Storage>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Pipeline {
        Pipeline {
            chain,
            state,
            store,
            roster,
            storage,
            broadcaster,
            sequence: Sequence::new("chain"),
            db_sequence: Sequence::new("db"),
            is_cleaning: AtomicBool::new(false),
        }
    }

    /// Flags shutdown. In-flight batches stop at the next
    /// checkpoint between transactions or blocks.
    pub fn request_shutdown(&self) {
        self.is_cleaning.store(true, Ordering::SeqCst);
    }

    fn check_shutdown(&self) -> Result<(), PipelineError> {
        if self.is_cleaning.load(Ordering::SeqCst) {
            Err(PipelineError::Shutdown)
        } else {
            Ok(())
        }
    }

    pub fn chain(&self) -> &ChainRef {
        &self.chain
    }

    /// Accepts an inbound transaction into the queue.
    pub fn submit_transaction(&self, tx: Transaction) -> Result<(), PipelineError> {
        let mut store = self.store.write();

        store
            .enqueue(Arc::new(tx))
            .map_err(|e| PipelineError::Rejected(vec![e.to_string()]))
    }

    /// Runs the queue verifier, promoting inbound transactions to
    /// the pool. Returns the number of promotions.
    pub fn process_inbound(&self) -> usize {
        let mut store = self.store.write();
        let mut state = self.state.write();

        store.process_queue(&mut state, self.storage.as_ref())
    }

    /// Forges a block for the given slot out of the best pool
    /// transactions, applies it and broadcasts it.
    pub fn generate_block(
        &self,
        forger: &Identity,
        slot: u32,
    ) -> Result<Arc<Block>, PipelineError> {
        let _turn = self.sequence.enter();
        self.check_shutdown()?;

        if !self.roster.is_elected(forger.pkey(), slot) {
            return Err(PipelineError::Rejected(vec![format!(
                "delegate is not elected for slot {}",
                slot
            )]));
        }

        let mut store = self.store.write();
        let mut state = self.state.write();
        let head = self.chain.last_block();
        let head_id = head.id.ok_or(chain::ChainError::MissingId)?;

        let mut picked: Vec<Transaction> = Vec::new();
        let mut used_bytes = 0usize;

        for tx in store.pool.pop_sorted(MAX_TX_PER_BLOCK) {
            let size = tx.byte_size();
            if used_bytes + size > MAX_BLOCK_BYTES {
                continue;
            }

            // A stale fee would fail the block's own verification;
            // leave the entry for the next displacement cycle.
            let fee_current = state
                .get(&tx.sender_address)
                .map(|account| tx.calculate_fee(account) == tx.fee)
                .unwrap_or(false);
            if !fee_current {
                debug!(
                    "forge: skipping {} with a stale fee",
                    tx.id.map(|id| id.to_hex()).unwrap_or_default()
                );
                continue;
            }

            used_bytes += size;
            picked.push((*tx).clone());
        }

        let mut block = Block::assemble(
            head_id,
            head.height + 1,
            slots::slot_time(slot),
            *forger.pkey(),
            picked,
        );
        block.sign(forger.skey());
        let block = Arc::new(block);

        self.exchange_with_pool(&mut store, &mut state, block.clone(), true, true)?;

        info!(
            "forge: block {} at height {} with {} transaction(s)",
            block.id.map(|id| id.to_hex()).unwrap_or_default(),
            block.height,
            block.transaction_count
        );

        Ok(block)
    }

    /// Routes an inbound block: exact successors append, sibling
    /// shapes go through fork resolution, everything else is
    /// dropped.
    pub fn receive_block(&self, incoming: Block) -> Result<Receipt, PipelineError> {
        let _turn = self.sequence.enter();
        self.check_shutdown()?;

        let head = self.chain.last_block();

        if incoming.id.is_some() && incoming.id == head.id {
            info!(
                "receive: {} is already the chain head",
                head.id.map(|id| id.to_hex()).unwrap_or_default()
            );
            return Ok(Receipt::AlreadyConfirmed);
        }

        let mut incoming = incoming;
        if incoming.height == 0 {
            // Wire blocks carry no height; infer it from linkage.
            if Some(incoming.previous_block_id) == head.id {
                incoming.height = head.height + 1;
            } else if incoming.previous_block_id == head.previous_block_id {
                incoming.height = head.height;
            }
        }

        match fork::classify(&head, &incoming) {
            ForkKind::Sequential => {
                let block = Arc::new(incoming);
                let mut store = self.store.write();
                let mut state = self.state.write();

                self.exchange_with_pool(&mut store, &mut state, block, false, true)?;
                Ok(Receipt::Applied)
            }
            ForkKind::ForkOne => self.handle_fork_one(&head, incoming),
            ForkKind::ForkFive => self.handle_fork_five(&head, incoming),
            ForkKind::Alien => {
                warn!(
                    "receive: discarding block at height {} against head height {}",
                    incoming.height, head.height
                );
                Ok(Receipt::Discarded)
            }
        }
    }

    /// Drops the chain head, reversing its transactions and
    /// pushing them back through the queue.
    pub fn delete_last_block(&self) -> Result<(), PipelineError> {
        let _turn = self.sequence.enter();
        self.check_shutdown()?;

        let mut store = self.store.write();
        let mut state = self.state.write();
        self.delete_last_inner(&mut store, &mut state)?;

        Ok(())
    }

    /// Pulls the peer's continuation of our chain and applies it
    /// block by block. Stops at the first block that does not
    /// advance the chain. Invalid blocks count against the peer;
    /// persistent offenders come back flagged for banning.
    pub fn load_blocks_from_peer(
        &self,
        transport: &dyn Transport,
        score: &mut crate::transport::PeerScore,
    ) -> Result<(usize, crate::transport::PeerVerdict), PipelineError> {
        use crate::transport::PeerVerdict;

        let head_id = self.chain.last_block().id.ok_or(chain::ChainError::MissingId)?;

        let response = match transport.blocks_after(&head_id) {
            Ok(response) => response,
            Err(e) => {
                let verdict = score.record_failure();
                warn!("peer: bad blocks payload ({}), verdict {:?}", e, verdict);
                return Ok((0, verdict));
            }
        };

        let mut applied = 0;

        for block in response.blocks {
            self.check_shutdown()?;

            match self.receive_block(block) {
                Ok(Receipt::Applied) | Ok(Receipt::ForkFiveSwitched) => applied += 1,
                Ok(Receipt::AlreadyConfirmed) => continue,
                Ok(Receipt::ForkOneRewound) | Ok(Receipt::Discarded) => break,
                Err(PipelineError::Rejected(reasons)) => {
                    let verdict = score.record_failure();
                    warn!(
                        "peer: invalid block ({}), verdict {:?}",
                        reasons.join("; "),
                        verdict
                    );
                    return Ok((applied, verdict));
                }
                Err(e) => return Err(e),
            }
        }

        if applied > 0 {
            score.record_success();
        }

        Ok((applied, PeerVerdict::Keep))
    }

    /// Fork-1: consecutive height, different parent. When the
    /// incoming block wins the tie-break the head and its parent
    /// both leave the chain; the winning lineage arrives from the
    /// peer afterwards. The fork block itself is not applied.
    fn handle_fork_one(&self, head: &Block, incoming: Block) -> Result<Receipt, PipelineError> {
        info!(
            "fork-1: sibling lineage at height {} against head {}",
            incoming.height,
            head.id.map(|id| id.to_hex()).unwrap_or_default()
        );

        if !fork::incoming_wins(head, &incoming) {
            warn!("fork-1: the standing head is older, discarding the sibling");
            return Ok(Receipt::Discarded);
        }

        let reasons = self.verify_receipt(&incoming);
        if !reasons.is_empty() {
            return Err(PipelineError::Rejected(reasons));
        }

        let mut store = self.store.write();
        let mut state = self.state.write();
        self.delete_last_inner(&mut store, &mut state)?;
        self.delete_last_inner(&mut store, &mut state)?;

        Ok(Receipt::ForkOneRewound)
    }

    /// Fork-5: same height, same parent, different id. The
    /// winning sibling replaces the head.
    fn handle_fork_five(&self, head: &Block, incoming: Block) -> Result<Receipt, PipelineError> {
        info!(
            "fork-5: sibling block at height {} against head {}",
            incoming.height,
            head.id.map(|id| id.to_hex()).unwrap_or_default()
        );

        if !fork::incoming_wins(head, &incoming) {
            warn!("fork-5: the standing head wins the tie-break, discarding");
            return Ok(Receipt::Discarded);
        }

        let reasons = self.verify_receipt(&incoming);
        if !reasons.is_empty() {
            return Err(PipelineError::Rejected(reasons));
        }

        let mut store = self.store.write();
        let mut state = self.state.write();
        self.delete_last_inner(&mut store, &mut state)?;
        self.exchange_with_pool(&mut store, &mut state, Arc::new(incoming), false, true)?;

        Ok(Receipt::ForkFiveSwitched)
    }

    /// Displaces the pool, applies the block, then restores the
    /// displaced entries that were not confirmed by it.
    fn exchange_with_pool(
        &self,
        store: &mut TxStore,
        state: &mut AccountState,
        block: Arc<Block>,
        broadcast: bool,
        save: bool,
    ) -> Result<(), PipelineError> {
        let displaced = store.displace_all(state);

        if let Err(e) = self.process_block(state, &block, save) {
            self.restore_displaced(store, state, displaced, None);
            return Err(e);
        }

        let confirmed: HashSet<Hash> = block.transactions.iter().filter_map(|tx| tx.id).collect();
        self.restore_displaced(store, state, displaced, Some(&confirmed));

        if broadcast {
            self.broadcaster.broadcast_block(&block);
        }

        Ok(())
    }

    /// Returns displaced entries to the pool in age order.
    /// Entries that no longer apply go to the queue instead, and
    /// their senders seed conflict resolution.
    fn restore_displaced(
        &self,
        store: &mut TxStore,
        state: &mut AccountState,
        displaced: Vec<Arc<Transaction>>,
        confirmed: Option<&HashSet<Hash>>,
    ) {
        let mut seeds: Vec<Address> = Vec::new();

        for tx in displaced {
            if let (Some(confirmed), Some(id)) = (confirmed, tx.id) {
                if confirmed.contains(&id) {
                    continue;
                }
            }

            if tx.apply_unconfirmed(state).is_ok() {
                if store.pool.add(tx.clone()).is_ok() {
                    continue;
                }
                let _ = tx.undo_unconfirmed(state);
            }

            debug!(
                "pool: {} lost feasibility, requeueing",
                tx.id.map(|id| id.to_hex()).unwrap_or_default()
            );
            seeds.push(tx.sender_address);

            if let Err(e) = store.queue.push(tx.clone()) {
                warn!("pool: could not requeue displaced transaction: {}", e);
            }
        }

        resolve_sender_conflicts(store, state, seeds);
    }

    /// Verifies and applies one block on top of the current head.
    /// The account diary makes a mid-apply failure restore the
    /// exact prior state; rows persisted before the failure are
    /// deleted again.
    fn process_block(
        &self,
        state: &mut AccountState,
        block: &Arc<Block>,
        save: bool,
    ) -> Result<(), PipelineError> {
        let head = self.chain.last_block();

        let mut reasons = self.verify_receipt(block);
        reasons.extend(self.verify_block(block, &head));
        if !reasons.is_empty() {
            return Err(PipelineError::Rejected(reasons));
        }

        state.begin_round();
        let mut persisted: Vec<Hash> = Vec::new();

        if let Err(e) = self.apply_block_transactions(state, block, &mut persisted) {
            state.rollback_round();
            self.unpersist(&persisted);
            return Err(e);
        }

        if let Err(e) = self.chain.chain.write().push_block(block.clone(), save) {
            state.rollback_round();
            self.unpersist(&persisted);
            return Err(e.into());
        }

        state.commit_round();
        Ok(())
    }

    fn unpersist(&self, ids: &[Hash]) {
        let _db = self.db_sequence.enter();

        for id in ids {
            if let Err(e) = self.storage.delete_transaction_by_id(id) {
                warn!("storage: failed to delete {}: {}", id.to_hex(), e);
            }
        }
    }

    fn apply_block_transactions(
        &self,
        state: &mut AccountState,
        block: &Arc<Block>,
        persisted: &mut Vec<Hash>,
    ) -> Result<(), PipelineError> {
        for tx in block.transactions.iter() {
            // Shutdown checkpoint between transactions.
            self.check_shutdown()?;

            let id = tx
                .id
                .ok_or_else(|| PipelineError::Rejected(vec!["transaction is not hashed".into()]))?;

            let already = {
                let _db = self.db_sequence.enter();
                self.storage.transaction_exists(&id)?
            };
            if already {
                return Err(PipelineError::Rejected(vec![format!(
                    "{} is already confirmed",
                    id.to_hex()
                )]));
            }

            tx.validate()
                .map_err(|e| PipelineError::Rejected(vec![e.to_string()]))?;

            if !tx.verify_signature() {
                return Err(PipelineError::Rejected(vec![format!(
                    "invalid signature on {}",
                    id.to_hex()
                )]));
            }

            let sender = state.get(&tx.sender_address).ok_or_else(|| {
                PipelineError::Rejected(vec![format!(
                    "unknown sender account {}",
                    tx.sender_address
                )])
            })?;

            if tx.fee != tx.calculate_fee(sender) {
                return Err(PipelineError::Rejected(vec![format!(
                    "fee mismatch on {}",
                    id.to_hex()
                )]));
            }

            tx.verify_unconfirmed(sender)
                .map_err(|e| PipelineError::Rejected(vec![e.to_string()]))?;
            tx.apply_unconfirmed(state)
                .map_err(|e| PipelineError::Rejected(vec![e.to_string()]))?;

            let mut confirmed = tx.clone();
            confirmed.block_id = block.id;
            {
                let _db = self.db_sequence.enter();
                self.storage.save_or_update_transaction(&confirmed)?;
            }

            persisted.push(id);
        }

        Ok(())
    }

    /// Static receipt checks: identity, signature, payload
    /// recomputation, slot grid and delegate election.
    fn verify_receipt(&self, block: &Block) -> Vec<String> {
        let mut reasons = Vec::new();

        match block.id {
            Some(id) => {
                if id != crypto::hash_slice(&block.canonical_bytes(true)) {
                    reasons.push("block id does not match its bytes".into());
                }
            }
            None => reasons.push("block is not hashed".into()),
        }

        if block.version != BLOCK_VERSION {
            reasons.push(format!("unsupported block version {}", block.version));
        }

        if !block.verify_signature() {
            reasons.push("invalid generator signature".into());
        }

        let (payload_hash, amount, fee) = Block::payload_of(&block.transactions);
        if payload_hash != block.payload_hash {
            reasons.push("payload hash mismatch".into());
        }
        if amount != block.amount {
            reasons.push("amount total mismatch".into());
        }
        if fee != block.fee {
            reasons.push("fee total mismatch".into());
        }
        if block.transaction_count as usize != block.transactions.len() {
            reasons.push("transaction count mismatch".into());
        }

        let slot = slots::slot_number(block.created_at);
        if slots::slot_time(slot) != block.created_at {
            reasons.push("timestamp is off the slot grid".into());
        }

        if !self.roster.contains(&block.generator_public_key) {
            reasons.push("generator is not a registered delegate".into());
        } else if !self.roster.is_elected(&block.generator_public_key, slot) {
            reasons.push(format!("wrong delegate for slot {}", slot));
        }

        reasons
    }

    /// Contextual checks against the current head.
    fn verify_block(&self, block: &Block, head: &Block) -> Vec<String> {
        let mut reasons = Vec::new();

        match head.id {
            Some(head_id) if block.previous_block_id == head_id => {}
            _ => reasons.push("previous block id does not match the head".into()),
        }

        if block.height != head.height + 1 {
            reasons.push(format!(
                "height {} does not follow head height {}",
                block.height, head.height
            ));
        }

        if block.created_at <= head.created_at {
            reasons.push("timestamp does not advance the chain".into());
        }

        if block.transactions.len() > MAX_TX_PER_BLOCK {
            reasons.push(format!("too many transactions: {}", block.transactions.len()));
        }

        if block.payload_size() > MAX_BLOCK_BYTES {
            reasons.push("payload exceeds the block byte budget".into());
        }

        let mut seen: HashSet<Hash> = HashSet::with_capacity(block.transactions.len());

        for tx in block.transactions.iter() {
            match tx.id {
                Some(id) => {
                    if !seen.insert(id) {
                        reasons.push(format!("duplicate transaction {}", id.to_hex()));
                    }
                    if id != crypto::hash_slice(&tx.to_bytes()) {
                        reasons.push(format!("transaction id mismatch on {}", id.to_hex()));
                    }
                    if tx.sender_address != Address::from_pkey(&tx.sender_public_key) {
                        reasons.push(format!("sender address mismatch on {}", id.to_hex()));
                    }
                }
                None => reasons.push("transaction is not hashed".into()),
            }
        }

        reasons
    }

    /// Drops the head block: reverse-order undo of its
    /// transactions, storage cleanup, queue re-entry.
    fn delete_last_inner(
        &self,
        store: &mut TxStore,
        state: &mut AccountState,
    ) -> Result<Arc<Block>, PipelineError> {
        let dropped = self.chain.chain.write().delete_last_block()?;

        if let Some(id) = dropped.id {
            self.chain.evict(&id);
        }

        for tx in dropped.transactions.iter().rev() {
            if let Err(e) = tx.undo_unconfirmed(state) {
                warn!(
                    "rollback: failed to undo {}: {}",
                    tx.id.map(|id| id.to_hex()).unwrap_or_default(),
                    e
                );
            }

            if let Some(id) = tx.id {
                let _db = self.db_sequence.enter();
                if let Err(e) = self.storage.delete_transaction_by_id(&id) {
                    warn!("storage: failed to delete {}: {}", id.to_hex(), e);
                }
            }

            let mut fresh = tx.clone();
            fresh.block_id = None;
            if let Err(e) = store.enqueue(Arc::new(fresh)) {
                debug!("rollback: could not requeue displaced transaction: {}", e);
            }
        }

        info!("rollback: head dropped to height {}", self.chain.height());
        Ok(dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain::test_helpers::{funded_identity, test_roster};
    use chain::{apply_genesis, make_genesis, ChainStore, MemoryStorage};
    use transactions::{Asset, SendAsset};

    struct Node {
        pipeline: Pipeline,
        storage: Arc<MemoryStorage>,
        delegates: Vec<Identity>,
    }

    fn node(premine: &[(Address, i64)]) -> Node {
        node_with_delegates(premine, 1)
    }

    fn node_with_delegates(premine: &[(Address, i64)], delegate_count: usize) -> Node {
        let storage = Arc::new(MemoryStorage::new());
        let (delegates, roster) = test_roster(delegate_count);
        let genesis = Arc::new(make_genesis(premine));

        let chain = ChainStore::new(storage.clone(), genesis.clone()).unwrap();
        let mut state = AccountState::new();
        apply_genesis(&mut state, &genesis);

        let pipeline = Pipeline::new(
            ChainRef::new(Arc::new(RwLock::new(chain))),
            Arc::new(RwLock::new(state)),
            Arc::new(RwLock::new(TxStore::new())),
            roster,
            storage.clone(),
            Arc::new(NoopBroadcaster),
        );

        Node {
            pipeline,
            storage,
            delegates,
        }
    }

    fn send_tx(sender: &Identity, recipient: Address, amount: i64) -> Transaction {
        let mut tx = Transaction::unsigned(
            Asset::Send(SendAsset {
                recipient_address: recipient,
                amount,
            }),
            *sender.pkey(),
            5,
            crypto::gen_bytes(constants::SALT_LENGTH).try_into().unwrap(),
        );
        tx.fee = amount / constants::FEE_DIVISOR;
        tx.sign(sender.skey());

        tx
    }

    fn empty_block_for_slot(node: &Node, slot: u32) -> Block {
        let head = node.pipeline.chain().last_block();
        let forger = &node.delegates[0];

        let mut block = Block::assemble(
            head.id.unwrap(),
            head.height + 1,
            slots::slot_time(slot),
            *forger.pkey(),
            vec![],
        );
        block.sign(forger.skey());

        block
    }

    #[test]
    fn happy_append() {
        let node = node(&[]);
        let block = empty_block_for_slot(&node, 1);
        let block_id = block.id.unwrap();

        let receipt = node.pipeline.receive_block(block).unwrap();

        assert_eq!(receipt, Receipt::Applied);
        let head = node.pipeline.chain().last_block();
        assert_eq!(head.id, Some(block_id));
        assert_eq!(head.height, 2);
    }

    #[test]
    fn forge_includes_pool_transactions_and_confirms_them() {
        let (sender, address) = funded_identity("pipeline-forger-test");
        let node = node(&[(address, 1_000_000)]);
        let recipient = Address(4242);

        node.pipeline
            .submit_transaction(send_tx(&sender, recipient, 100_000))
            .unwrap();
        assert_eq!(node.pipeline.process_inbound(), 1);

        let block = node.pipeline.generate_block(&node.delegates[0], 1).unwrap();

        assert_eq!(block.transaction_count, 1);
        assert_eq!(node.pipeline.chain().height(), 2);

        let state = node.pipeline.state.read();
        assert_eq!(state.get(&recipient).unwrap().actual_balance, 100_000);
        assert_eq!(state.get(&address).unwrap().actual_balance, 899_990);
        drop(state);

        // The confirmed transaction left the pool and reached
        // storage with its block id stamped.
        let store = node.pipeline.store.read();
        assert!(store.pool.is_empty());
        assert!(store.queue.is_empty());
        drop(store);

        let tx_id = block.transactions[0].id.unwrap();
        use chain::Storage as _;
        assert!(node.storage.transaction_exists(&tx_id).unwrap());
    }

    #[test]
    fn forging_out_of_turn_is_rejected() {
        let node = node_with_delegates(&[], 3);

        // With three delegates rotating, one of them is not the
        // slot-1 forger.
        let outsider = node
            .delegates
            .iter()
            .find(|d| !node.pipeline.roster.is_elected(d.pkey(), 1))
            .unwrap();

        let result = node.pipeline.generate_block(outsider, 1);
        assert!(matches!(result, Err(PipelineError::Rejected(_))));
    }

    #[test]
    fn receive_rejects_a_wrong_slot_delegate() {
        let node = node_with_delegates(&[], 3);
        let head = node.pipeline.chain().last_block();

        let outsider = node
            .delegates
            .iter()
            .find(|d| !node.pipeline.roster.is_elected(d.pkey(), 1))
            .unwrap();

        let mut block = Block::assemble(
            head.id.unwrap(),
            head.height + 1,
            slots::slot_time(1),
            *outsider.pkey(),
            vec![],
        );
        block.sign(outsider.skey());

        let result = node.pipeline.receive_block(block);
        assert!(matches!(result, Err(PipelineError::Rejected(_))));
        assert_eq!(node.pipeline.chain().height(), 1);
    }

    #[test]
    fn receiving_the_head_again_is_a_no_op() {
        let node = node(&[]);
        let block = empty_block_for_slot(&node, 1);
        node.pipeline.receive_block(block.clone()).unwrap();

        let receipt = node.pipeline.receive_block(block).unwrap();

        assert_eq!(receipt, Receipt::AlreadyConfirmed);
        assert_eq!(node.pipeline.chain().height(), 2);
    }

    #[test]
    fn far_future_blocks_are_discarded() {
        let node = node(&[]);
        let head = node.pipeline.chain().last_block();
        let forger = &node.delegates[0];

        let mut block = Block::assemble(
            head.id.unwrap(),
            head.height + 7,
            slots::slot_time(9),
            *forger.pkey(),
            vec![],
        );
        block.sign(forger.skey());

        assert_eq!(node.pipeline.receive_block(block).unwrap(), Receipt::Discarded);
        assert_eq!(node.pipeline.chain().height(), 1);
    }

    #[test]
    fn fork_five_tie_break_prefers_the_smaller_id() {
        let (sender, address) = funded_identity("pipeline-fork5");
        let node = node(&[(address, 1_000_000)]);
        let forger = &node.delegates[0];
        let head = node.pipeline.chain().last_block();

        // Two sibling candidates for the same slot: one empty,
        // one carrying a transfer, so their ids differ.
        let mut plain = Block::assemble(
            head.id.unwrap(),
            head.height + 1,
            slots::slot_time(1),
            *forger.pkey(),
            vec![],
        );
        plain.sign(forger.skey());

        let mut carrying = Block::assemble(
            head.id.unwrap(),
            head.height + 1,
            slots::slot_time(1),
            *forger.pkey(),
            vec![send_tx(&sender, Address(7), 100_000)],
        );
        carrying.sign(forger.skey());

        let (winner, loser) = if plain.id < carrying.id {
            (plain, carrying)
        } else {
            (carrying, plain)
        };

        assert_eq!(node.pipeline.receive_block(loser).unwrap(), Receipt::Applied);
        let receipt = node.pipeline.receive_block(winner.clone()).unwrap();

        assert_eq!(receipt, Receipt::ForkFiveSwitched);
        let new_head = node.pipeline.chain().last_block();
        assert_eq!(new_head.id, winner.id);
        assert_eq!(new_head.height, 2);
    }

    #[test]
    fn fork_five_keeps_an_older_head() {
        let node = node(&[]);
        let forger = &node.delegates[0];
        let head = node.pipeline.chain().last_block();

        let older = empty_block_for_slot(&node, 1);
        node.pipeline.receive_block(older.clone()).unwrap();

        // A sibling from a later slot loses the tie-break.
        let mut newer = Block::assemble(
            head.id.unwrap(),
            head.height + 1,
            slots::slot_time(2),
            *forger.pkey(),
            vec![],
        );
        newer.sign(forger.skey());

        assert_eq!(node.pipeline.receive_block(newer).unwrap(), Receipt::Discarded);
        assert_eq!(node.pipeline.chain().last_block().id, older.id);
    }

    #[test]
    fn fork_one_rewinds_head_and_parent() {
        let node = node(&[]);
        let forger = &node.delegates[0];

        // Height 2 at slot 1, height 3 at slot 7.
        let b2 = empty_block_for_slot(&node, 1);
        node.pipeline.receive_block(b2).unwrap();
        let b3 = empty_block_for_slot(&node, 7);
        node.pipeline.receive_block(b3).unwrap();
        assert_eq!(node.pipeline.chain().height(), 3);

        // A competing height-4 block on an unknown parent, forged
        // in an earlier slot than the head. It wins the tie-break
        // and rewinds the two suspect blocks.
        let mut rival = Block::assemble(
            crypto::hash_slice(b"sibling-parent"),
            4,
            slots::slot_time(3),
            *forger.pkey(),
            vec![],
        );
        rival.sign(forger.skey());

        let receipt = node.pipeline.receive_block(rival).unwrap();

        assert_eq!(receipt, Receipt::ForkOneRewound);
        assert_eq!(node.pipeline.chain().height(), 1);
    }

    #[test]
    fn fork_one_discards_a_younger_rival() {
        let node = node(&[]);
        let forger = &node.delegates[0];

        let b2 = empty_block_for_slot(&node, 1);
        node.pipeline.receive_block(b2.clone()).unwrap();

        let mut rival = Block::assemble(
            crypto::hash_slice(b"sibling-parent"),
            3,
            slots::slot_time(5),
            *forger.pkey(),
            vec![],
        );
        rival.sign(forger.skey());

        assert_eq!(node.pipeline.receive_block(rival).unwrap(), Receipt::Discarded);
        assert_eq!(node.pipeline.chain().last_block().id, b2.id);
    }

    #[test]
    fn pool_conflict_after_block_receipt() {
        let (sender, address) = funded_identity("pipeline-conflict");
        let node = node(&[(address, 50)]);
        let forger = &node.delegates[0];

        // t1 is pooled and applied against the full balance.
        node.pipeline
            .submit_transaction(send_tx(&sender, Address(1111), 30))
            .unwrap();
        assert_eq!(node.pipeline.process_inbound(), 1);

        // An incoming block confirms a different spend of the
        // same balance.
        let head = node.pipeline.chain().last_block();
        let mut block = Block::assemble(
            head.id.unwrap(),
            head.height + 1,
            slots::slot_time(1),
            *forger.pkey(),
            vec![send_tx(&sender, Address(2222), 40)],
        );
        block.sign(forger.skey());

        assert_eq!(node.pipeline.receive_block(block).unwrap(), Receipt::Applied);

        // t1 no longer fits: it left the pool for the queue, and
        // the next verifier pass drops it for lack of funds.
        let state = node.pipeline.state.read();
        assert_eq!(state.get(&address).unwrap().actual_balance, 10);
        assert_eq!(state.get(&Address(2222)).unwrap().actual_balance, 40);
        // t1's credit was unwound with it.
        assert_eq!(state.get(&Address(1111)).unwrap().actual_balance, 0);
        drop(state);

        {
            let store = node.pipeline.store.read();
            assert!(store.pool.is_empty());
            assert_eq!(store.queue.len(), 1);
        }

        assert_eq!(node.pipeline.process_inbound(), 0);
        let store = node.pipeline.store.read();
        assert!(store.pool.is_empty());
        assert!(store.queue.is_empty());
    }

    #[test]
    fn delete_last_block_restores_state_and_requeues() {
        let (sender, address) = funded_identity("pipeline-delete");
        let node = node(&[(address, 1_000)]);
        let forger = &node.delegates[0];

        let head = node.pipeline.chain().last_block();
        let mut block = Block::assemble(
            head.id.unwrap(),
            head.height + 1,
            slots::slot_time(1),
            *forger.pkey(),
            vec![send_tx(&sender, Address(9), 500)],
        );
        block.sign(forger.skey());
        let tx_id = block.transactions[0].id.unwrap();

        node.pipeline.receive_block(block).unwrap();
        node.pipeline.delete_last_block().unwrap();

        assert_eq!(node.pipeline.chain().height(), 1);

        let state = node.pipeline.state.read();
        assert_eq!(state.get(&address).unwrap().actual_balance, 1_000);
        drop(state);

        let store = node.pipeline.store.read();
        assert!(store.queue.contains(&tx_id));
        drop(store);

        use chain::Storage as _;
        assert!(!node.storage.transaction_exists(&tx_id).unwrap());
    }

    #[test]
    fn a_failing_block_leaves_no_trace() {
        let (sender, address) = funded_identity("pipeline-poison");
        let node = node(&[(address, 1_000)]);
        let forger = &node.delegates[0];
        let head = node.pipeline.chain().last_block();

        // Second transfer cannot be funded once the first one
        // applied; the whole block must unwind.
        let mut block = Block::assemble(
            head.id.unwrap(),
            head.height + 1,
            slots::slot_time(1),
            *forger.pkey(),
            vec![
                send_tx(&sender, Address(8), 900),
                send_tx(&sender, Address(9), 900),
            ],
        );
        block.sign(forger.skey());
        let first_id = block.transactions[0].id.unwrap();

        let result = node.pipeline.receive_block(block);

        assert!(matches!(result, Err(PipelineError::Rejected(_))));
        assert_eq!(node.pipeline.chain().height(), 1);

        let state = node.pipeline.state.read();
        assert_eq!(state.get(&address).unwrap().actual_balance, 1_000);
        assert!(state.get(&Address(8)).is_none());
        drop(state);

        use chain::Storage as _;
        assert!(!node.storage.transaction_exists(&first_id).unwrap());
    }

    #[test]
    fn peer_blocks_load_in_order() {
        use crate::transport::{BlocksResponse, TransportError};

        struct StubPeer {
            blocks: Vec<Block>,
        }

        impl Transport for StubPeer {
            fn blocks_after(&self, _id: &Hash) -> Result<BlocksResponse, TransportError> {
                Ok(BlocksResponse {
                    blocks: self.blocks.clone(),
                })
            }

            fn common_block(
                &self,
                _ids: &[Hash],
            ) -> Result<crate::transport::CommonBlockResponse, TransportError> {
                Err(TransportError::Unreachable("stub".into()))
            }
        }

        let node = node(&[]);
        let forger = &node.delegates[0];
        let head = node.pipeline.chain().last_block();

        let mut b2 = Block::assemble(
            head.id.unwrap(),
            head.height + 1,
            slots::slot_time(1),
            *forger.pkey(),
            vec![],
        );
        b2.sign(forger.skey());

        let mut b3 = Block::assemble(
            b2.id.unwrap(),
            b2.height + 1,
            slots::slot_time(2),
            *forger.pkey(),
            vec![],
        );
        b3.sign(forger.skey());

        let peer = StubPeer {
            blocks: vec![b2, b3.clone()],
        };

        let mut score = crate::transport::PeerScore::new();
        let (applied, verdict) = node.pipeline.load_blocks_from_peer(&peer, &mut score).unwrap();

        assert_eq!(applied, 2);
        assert_eq!(verdict, crate::transport::PeerVerdict::Keep);
        assert_eq!(node.pipeline.chain().height(), 3);
        assert_eq!(node.pipeline.chain().last_block().id, b3.id);
    }

    #[test]
    fn a_peer_serving_invalid_blocks_gets_banned() {
        use crate::transport::{BlocksResponse, PeerScore, PeerVerdict, TransportError};

        struct BadPeer;

        impl Transport for BadPeer {
            fn blocks_after(&self, _id: &Hash) -> Result<BlocksResponse, TransportError> {
                Err(TransportError::Malformed("schema violation".into()))
            }

            fn common_block(
                &self,
                _ids: &[Hash],
            ) -> Result<crate::transport::CommonBlockResponse, TransportError> {
                Err(TransportError::Unreachable("stub".into()))
            }
        }

        let node = node(&[]);
        let mut score = PeerScore::new();

        let mut verdict = PeerVerdict::Keep;
        for _ in 0..3 {
            let (applied, v) = node.pipeline.load_blocks_from_peer(&BadPeer, &mut score).unwrap();
            assert_eq!(applied, 0);
            verdict = v;
        }

        assert_eq!(verdict, PeerVerdict::Ban);
    }

    #[test]
    fn shutdown_interrupts_cleanly() {
        let node = node(&[]);

        node.pipeline.request_shutdown();

        assert_eq!(
            node.pipeline.generate_block(&node.delegates[0], 1).err(),
            Some(PipelineError::Shutdown)
        );
        assert_eq!(
            node.pipeline.receive_block(empty_block_for_slot(&node, 1)).err(),
            Some(PipelineError::Shutdown)
        );
    }
}
