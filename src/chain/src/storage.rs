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

use crate::{Block, StorageError};
use crypto::Hash;
use hashbrown::HashMap;
use parking_lot::Mutex;
use transactions::Transaction;

/// Durable store seam. The real deployment puts a relational
/// database behind this; the core only ever talks through these
/// six calls.
pub trait Storage: Send + Sync {
    fn save_or_update_transaction(&self, tx: &Transaction) -> Result<(), StorageError>;
    fn delete_transaction_by_id(&self, id: &Hash) -> Result<(), StorageError>;
    fn transaction_exists(&self, id: &Hash) -> Result<bool, StorageError>;
    fn save_block(&self, block: &Block) -> Result<(), StorageError>;
    fn delete_block(&self, id: &Hash) -> Result<(), StorageError>;
    fn last_block(&self) -> Result<Option<Block>, StorageError>;
}

#[derive(Default)]
struct MemoryInner {
    transactions: HashMap<Hash, Transaction>,
    blocks: Vec<Block>,
}

/// In-memory storage used by the node in standalone mode and by
/// tests. Blocks are kept ordered by height.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<MemoryInner>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }

    pub fn block_count(&self) -> usize {
        self.inner.lock().blocks.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.inner.lock().transactions.len()
    }
}

impl Storage for MemoryStorage {
    fn save_or_update_transaction(&self, tx: &Transaction) -> Result<(), StorageError> {
        let id = tx.id.ok_or(StorageError::NotFound)?;
        self.inner.lock().transactions.insert(id, tx.clone());

        Ok(())
    }

    fn delete_transaction_by_id(&self, id: &Hash) -> Result<(), StorageError> {
        self.inner.lock().transactions.remove(id);

        Ok(())
    }

    fn transaction_exists(&self, id: &Hash) -> Result<bool, StorageError> {
        Ok(self.inner.lock().transactions.contains_key(id))
    }

    fn save_block(&self, block: &Block) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();

        match inner.blocks.iter().position(|b| b.id == block.id) {
            Some(index) => inner.blocks[index] = block.clone(),
            None => inner.blocks.push(block.clone()),
        }

        inner.blocks.sort_by_key(|b| b.height);
        Ok(())
    }

    fn delete_block(&self, id: &Hash) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();

        match inner.blocks.iter().position(|b| b.id == Some(*id)) {
            Some(index) => {
                inner.blocks.remove(index);
                Ok(())
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn last_block(&self) -> Result<Option<Block>, StorageError> {
        Ok(self.inner.lock().blocks.last().cloned())
    }
}
