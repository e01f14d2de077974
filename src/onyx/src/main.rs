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

mod config;

use account::AccountState;
use chain::{apply_genesis, make_genesis, slots, ChainRef, ChainStore, DelegateRoster, MemoryStorage, Storage};
use config::NodeConfig;
use consensus::{NoopBroadcaster, Pipeline, PipelineError};
use log::{error, info, warn};
use mempool::TxStore;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

fn main() {
    env_logger::init();

    let config = match NodeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("bad configuration: {}", e);
            std::process::exit(1);
        }
    };

    let pipeline = match build_container(&config) {
        Ok(pipeline) => Arc::new(pipeline),
        Err(e) => {
            error!("startup failed: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "onyx node at height {}, forging {}",
        pipeline.chain().height(),
        if config.forging_identity.is_some() {
            "enabled"
        } else {
            "disabled"
        }
    );

    run_forging_loop(&pipeline, &config);
}

/// Builds the dependency container once, at startup. Components
/// receive their collaborators explicitly; nothing is looked up
/// through globals.
fn build_container(config: &NodeConfig) -> Result<Pipeline, PipelineError> {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let genesis = Arc::new(make_genesis(&config.premine));

    let chain = ChainStore::new(storage.clone(), genesis.clone())?;

    let mut state = AccountState::new();
    apply_genesis(&mut state, &genesis);

    let roster = DelegateRoster::new(config.delegates.clone());

    Ok(Pipeline::new(
        ChainRef::new(Arc::new(RwLock::new(chain))),
        Arc::new(RwLock::new(state)),
        Arc::new(RwLock::new(TxStore::new())),
        roster,
        storage,
        Arc::new(NoopBroadcaster),
    ))
}

/// Slot-paced main loop: verify whatever queued up, and forge
/// when this node's delegate owns the slot that just opened.
fn run_forging_loop(pipeline: &Arc<Pipeline>, config: &NodeConfig) {
    let mut last_forged_slot: Option<u32> = None;

    loop {
        pipeline.process_inbound();

        let slot = slots::current_slot();

        if let Some(ref forger) = config.forging_identity {
            let already_forged = last_forged_slot == Some(slot);

            if !already_forged {
                match pipeline.generate_block(forger, slot) {
                    Ok(block) => {
                        last_forged_slot = Some(slot);
                        info!(
                            "forged block {} at height {}",
                            block.id.map(|id| id.to_hex()).unwrap_or_default(),
                            block.height
                        );
                    }
                    Err(PipelineError::Rejected(reasons))
                        if reasons.iter().any(|r| r.contains("not elected")) =>
                    {
                        // Someone else's slot; wait for ours.
                        last_forged_slot = Some(slot);
                    }
                    Err(e) => warn!("forging failed: {}", e),
                }
            }
        }

        std::thread::sleep(Duration::from_millis(500));
    }
}
