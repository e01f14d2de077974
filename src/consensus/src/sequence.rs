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

use log::trace;
use parking_lot::{Mutex, MutexGuard};

/// Turn lock. Chain-mutating operations enter the global
/// sequence for their whole turn; storage round-trips enter the
/// db sequence. Holding a turn across a suspension point keeps
/// every later entrant waiting, which is the point.
pub struct Sequence {
    name: &'static str,
    turn: Mutex<()>,
}

impl Sequence {
    pub const fn new(name: &'static str) -> Sequence {
        Sequence {
            name,
            turn: Mutex::new(()),
        }
    }

    pub fn enter(&self) -> SequenceGuard<'_> {
        let guard = self.turn.lock();
        trace!("sequence {}: turn taken", self.name);

        SequenceGuard {
            name: self.name,
            _guard: guard,
        }
    }
}

pub struct SequenceGuard<'a> {
    name: &'static str,
    _guard: MutexGuard<'a, ()>,
}

impl Drop for SequenceGuard<'_> {
    fn drop(&mut self) {
        trace!("sequence {}: turn released", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn turns_never_overlap() {
        let sequence = Arc::new(Sequence::new("test"));
        let inside = Arc::new(AtomicU32::new(0));
        let peak = Arc::new(AtomicU32::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sequence = sequence.clone();
                let inside = inside.clone();
                let peak = peak.clone();

                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let _turn = sequence.enter();
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
