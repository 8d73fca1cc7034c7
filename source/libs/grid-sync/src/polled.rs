// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use core::sync::atomic::{AtomicU8, Ordering};

use crate::LockSlot;

const VALUE: u8 = 0b01;
const HELD: u8 = 0b10;
// Spins between cooperative yields while waiting.
const YIELD_MASK: u32 = 0x3f;

const fn word(value: bool, held: bool) -> u8 {
    (if value { VALUE } else { 0 }) | (if held { HELD } else { 0 })
}

/// Lock slot packed in a single atomic word and polled by waiters.
///
/// This is how a memory-mapped hardware lock behaves: there is no wait queue,
/// contenders keep reading the word until it carries the value they expect.
#[derive(Default)]
pub struct PolledLock {
    word: AtomicU8,
}

impl PolledLock {
    /// Creates a free slot holding `false`.
    pub const fn new() -> Self {
        Self { word: AtomicU8::new(0) }
    }

    fn try_take(&self, expected: bool) -> bool {
        self.word
            .compare_exchange(
                word(expected, false),
                word(expected, true),
                Ordering::Acquire,
                Ordering::Relaxed,
            )
            .is_ok()
    }
}

impl LockSlot for PolledLock {
    fn acquire_with_value(&self, expected: bool) {
        let mut spins: u32 = 0;
        while !self.try_take(expected) {
            spins = spins.wrapping_add(1);
            if spins & YIELD_MASK == 0 {
                std::thread::yield_now();
            } else {
                core::hint::spin_loop();
            }
        }
    }

    fn try_acquire_with_value(&self, expected: bool) -> bool {
        self.try_take(expected)
    }

    fn release_with_value(&self, value: bool) {
        self.word.store(word(value, false), Ordering::Release);
    }

    fn value(&self) -> bool {
        self.word.load(Ordering::Acquire) & VALUE != 0
    }

    fn is_held(&self) -> bool {
        self.word.load(Ordering::Acquire) & HELD != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn word_encoding() {
        let lock = PolledLock::new();
        assert!(!lock.value());
        lock.release_with_value(true);
        assert!(lock.value());
        assert!(lock.try_acquire_with_value(true));
        assert!(lock.is_held());
        assert!(lock.value());
    }

    #[test]
    fn ping_pong_alternates() {
        let lock = Arc::new(PolledLock::new());
        let peer = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                for _ in 0..100 {
                    lock.acquire_with_value(true);
                    lock.release_with_value(false);
                }
            })
        };
        for _ in 0..100 {
            lock.acquire_with_value(false);
            lock.release_with_value(true);
        }
        peer.join().unwrap();
        assert!(!lock.value());
    }
}
