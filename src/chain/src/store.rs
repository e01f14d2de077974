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

use crate::{Block, ChainError, Storage};
use constants::BLOCK_RING_DEPTH;
use crypto::Hash;
use log::debug;
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::Arc;

/// Size of the block lookup cache.
const BLOCK_CACHE_SIZE: usize = 20;

/// In-memory ring of the most recent blocks, mirrored to the
/// durable store block by block. The ring is deep enough to cover
/// a full round plus the two blocks a fork recovery may drop.
pub struct ChainStore {
    ring: VecDeque<Arc<Block>>,
    storage: Arc<dyn Storage>,
}

impl ChainStore {
    /// Opens the chain on top of the durable store, seeding it
    /// with the genesis block on first start.
    pub fn new(storage: Arc<dyn Storage>, genesis: Arc<Block>) -> Result<ChainStore, ChainError> {
        let mut ring = VecDeque::with_capacity(BLOCK_RING_DEPTH);

        match storage.last_block()? {
            Some(block) => ring.push_back(Arc::new(block)),
            None => {
                storage.save_block(&genesis)?;
                ring.push_back(genesis);
            }
        }

        Ok(ChainStore { ring, storage })
    }

    pub fn last_block(&self) -> Arc<Block> {
        // The ring always holds at least one block.
        self.ring.back().cloned().expect("chain ring is never empty")
    }

    pub fn height(&self) -> u64 {
        self.last_block().height
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Appends a block that extends the current head. When `save`
    /// is set the block is mirrored to the durable store before
    /// the call returns.
    pub fn push_block(&mut self, block: Arc<Block>, save: bool) -> Result<(), ChainError> {
        let last = self.last_block();
        let last_id = last.id.ok_or(ChainError::MissingId)?;

        if block.previous_block_id != last_id || block.height != last.height + 1 {
            return Err(ChainError::NonSequentialBlock);
        }

        if save {
            self.storage.save_block(&block)?;
        }

        debug!(
            "chain: new head {} at height {}",
            block.id.map(|id| id.to_hex()).unwrap_or_default(),
            block.height
        );
        self.ring.push_back(block);

        while self.ring.len() > BLOCK_RING_DEPTH {
            self.ring.pop_front();
        }

        Ok(())
    }

    /// Drops the head block, returning it. Refuses to touch the
    /// genesis block and refuses to empty the in-memory window.
    pub fn delete_last_block(&mut self) -> Result<Arc<Block>, ChainError> {
        let last = self.last_block();

        if last.height <= 1 {
            return Err(ChainError::CannotDeleteGenesis);
        }

        if self.ring.len() == 1 {
            // The parent fell out of the window; recovering past
            // this point is a bounded-reorg violation.
            return Err(ChainError::RingExhausted);
        }

        let id = last.id.ok_or(ChainError::MissingId)?;
        self.storage.delete_block(&id)?;
        self.ring.pop_back();
        debug!("chain: dropped head {} at height {}", id.to_hex(), last.height);

        Ok(last)
    }

    /// Looks a block up in the in-memory window.
    pub fn query(&self, hash: &Hash) -> Option<Arc<Block>> {
        self.ring
            .iter()
            .find(|block| block.id == Some(*hash))
            .cloned()
    }

    pub fn ring_len(&self) -> usize {
        self.ring.len()
    }
}

/// Thread-safe handle to the chain store with a block lookup
/// cache in front of it.
#[derive(Clone)]
pub struct ChainRef {
    pub chain: Arc<RwLock<ChainStore>>,
    block_cache: Arc<Mutex<LruCache<Hash, Arc<Block>>>>,
}

impl ChainRef {
    pub fn new(chain: Arc<RwLock<ChainStore>>) -> ChainRef {
        ChainRef {
            chain,
            block_cache: Arc::new(Mutex::new(LruCache::new(BLOCK_CACHE_SIZE))),
        }
    }

    pub fn last_block(&self) -> Arc<Block> {
        self.chain.read().last_block()
    }

    pub fn height(&self) -> u64 {
        self.chain.read().height()
    }

    /// Attempts to fetch a block by its hash from the cache and
    /// falls back to the chain window if it is not there.
    pub fn query(&self, hash: &Hash) -> Option<Arc<Block>> {
        let cache_result = {
            let mut cache = self.block_cache.lock();
            cache.get(hash).cloned()
        };

        if let Some(result) = cache_result {
            return Some(result);
        }

        let chain_result = self.chain.read().query(hash)?;

        let mut cache = self.block_cache.lock();
        if cache.get(hash).is_none() {
            cache.put(*hash, chain_result.clone());
        }

        Some(chain_result)
    }

    /// Drops any cached entry for a block that left the chain.
    pub fn evict(&self, hash: &Hash) {
        self.block_cache.lock().pop(hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::make_genesis;
    use crate::MemoryStorage;
    use crypto::Identity;
    use quickcheck::Arbitrary;

    fn chain_with_genesis() -> (ChainStore, Arc<Block>) {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let genesis = Arc::new(make_genesis(&[]));
        let chain = ChainStore::new(storage, genesis.clone()).unwrap();

        (chain, genesis)
    }

    fn child_of(parent: &Block, generator: &Identity) -> Arc<Block> {
        let mut block = Block::assemble(
            parent.id.unwrap(),
            parent.height + 1,
            parent.created_at + constants::SLOT_INTERVAL,
            *generator.pkey(),
            vec![],
        );
        block.sign(generator.skey());

        Arc::new(block)
    }

    #[test]
    fn push_extends_the_head() {
        let (mut chain, genesis) = chain_with_genesis();
        let forger = Identity::new();
        let block = child_of(&genesis, &forger);

        chain.push_block(block.clone(), true).unwrap();

        assert_eq!(chain.last_block().id, block.id);
        assert_eq!(chain.height(), 2);
    }

    #[test]
    fn push_rejects_non_sequential_blocks() {
        let (mut chain, _) = chain_with_genesis();
        let forger = Identity::new();

        let mut stranger = Block::assemble(
            Hash::arbitrary(&mut quickcheck::Gen::new(5)),
            2,
            10,
            *forger.pkey(),
            vec![],
        );
        stranger.sign(forger.skey());

        assert_eq!(
            chain.push_block(Arc::new(stranger), false),
            Err(ChainError::NonSequentialBlock)
        );
    }

    #[test]
    fn delete_refuses_the_genesis_block() {
        let (mut chain, _) = chain_with_genesis();

        assert_eq!(chain.delete_last_block().err(), Some(ChainError::CannotDeleteGenesis));
    }

    #[test]
    fn delete_returns_the_dropped_head() {
        let (mut chain, genesis) = chain_with_genesis();
        let forger = Identity::new();
        let block = child_of(&genesis, &forger);
        chain.push_block(block.clone(), true).unwrap();

        let dropped = chain.delete_last_block().unwrap();

        assert_eq!(dropped.id, block.id);
        assert_eq!(chain.last_block().id, genesis.id);
    }

    #[test]
    fn the_ring_is_bounded() {
        let (mut chain, genesis) = chain_with_genesis();
        let forger = Identity::new();

        let mut parent = (*genesis).clone();
        for _ in 0..(constants::BLOCK_RING_DEPTH + 5) {
            let block = child_of(&parent, &forger);
            chain.push_block(block.clone(), false).unwrap();
            parent = (*block).clone();
        }

        assert_eq!(chain.ring_len(), constants::BLOCK_RING_DEPTH);
    }
}
