// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use parking_lot::{Condvar, Mutex};

use crate::LockSlot;

#[derive(Default)]
struct SlotState {
    value: bool,
    held: bool,
}

/// Lock slot whose waiters park on a condition variable.
#[derive(Default)]
pub struct BlockingLock {
    state: Mutex<SlotState>,
    changed: Condvar,
}

impl BlockingLock {
    /// Creates a free slot holding `false`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LockSlot for BlockingLock {
    fn acquire_with_value(&self, expected: bool) {
        let mut state = self.state.lock();
        while state.held || state.value != expected {
            self.changed.wait(&mut state);
        }
        state.held = true;
    }

    fn try_acquire_with_value(&self, expected: bool) -> bool {
        let mut state = self.state.lock();
        if state.held || state.value != expected {
            return false;
        }
        state.held = true;
        true
    }

    fn release_with_value(&self, value: bool) {
        {
            let mut state = self.state.lock();
            state.value = value;
            state.held = false;
        }
        // Waiters may expect either value, so everybody re-checks.
        self.changed.notify_all();
    }

    fn value(&self) -> bool {
        self.state.lock().value
    }

    fn is_held(&self) -> bool {
        self.state.lock().held
    }
}
