// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tile side of the RPC protocol.
//!
//! A tile owns exactly one [`DeviceChannel`]. `perform` borrows it mutably
//! for the whole round trip, so a second request cannot be issued while one
//! is in flight, and `finish` consumes it, so nothing follows "done".

use grid_abi::layout::RPC_RECORD_OFFSET;
use grid_sync::{LockSlot, LockUnit, TileMemory};

use crate::handshake::DeviceBarrier;
use crate::wire::{encode_request, Call, Request, RESPONSE_OFFSET};
use crate::Result;

/// Request channel from one tile to the host.
pub struct DeviceChannel<'t, L> {
    memory: &'t TileMemory,
    barrier: DeviceBarrier<'t, L>,
}

impl<'t, L: LockSlot> DeviceChannel<'t, L> {
    /// Binds the record in `memory` and the handshake slots in `locks`.
    ///
    /// At most one channel per tile may exist at a time. Two live channels
    /// on the same record can interleave their requests, which the host
    /// cannot detect. A channel may be replaced once the previous one has
    /// been dropped between requests.
    pub fn new(memory: &'t TileMemory, locks: &'t LockUnit<L>) -> Self {
        Self { memory, barrier: DeviceBarrier::new(locks) }
    }

    /// Sends `call` to the host and blocks until it has been answered.
    ///
    /// Returns the handler's response word. An error is only possible before
    /// the request is published, so the handshake is never left half-done.
    pub fn perform(&mut self, call: Call) -> Result<u32> {
        self.memory.write(RPC_RECORD_OFFSET, &encode_request(&Request::from(call)))?;
        self.barrier.arrive();
        self.barrier.wait_complete();
        Ok(self.memory.read_u32(RPC_RECORD_OFFSET + RESPONSE_OFFSET)?)
    }

    /// Tells the host this tile stopped executing.
    ///
    /// The host never answers "done", so this returns as soon as the signal
    /// is published.
    pub fn finish(self) -> Result<()> {
        self.memory.write(RPC_RECORD_OFFSET, &encode_request(&Request::Done))?;
        self.barrier.arrive();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::HostBarrier;
    use crate::wire::{decode_request, LogData, RECORD_LEN};
    use grid_sync::BlockingLock;
    use std::sync::Arc;
    use std::thread;

    // Answers `count` requests with their log length, then expects "done".
    fn serve(memory: &TileMemory, locks: &LockUnit<BlockingLock>, count: usize) {
        let host = HostBarrier::new(locks);
        for served in 0..=count {
            while !host.try_arrive() {
                thread::yield_now();
            }
            let mut record = [0u8; RECORD_LEN];
            memory.read(RPC_RECORD_OFFSET, &mut record).unwrap();
            match decode_request(&record).unwrap() {
                Request::Log(data) if served < count => {
                    memory.write_u32(RPC_RECORD_OFFSET + RESPONSE_OFFSET, data.len).unwrap();
                    host.wait();
                }
                Request::Done if served == count => {}
                other => panic!("unexpected {other:?} after {served} requests"),
            }
        }
    }

    #[test]
    fn channel_can_be_handed_over_between_requests() {
        let memory = Arc::new(TileMemory::new());
        let locks: Arc<LockUnit<BlockingLock>> = Arc::new(LockUnit::new());
        let device = {
            let (memory, locks) = (Arc::clone(&memory), Arc::clone(&locks));
            thread::spawn(move || {
                {
                    let mut first = DeviceChannel::new(&memory, &locks);
                    assert_eq!(first.perform(Call::Log(LogData { addr: 0, len: 3 })).unwrap(), 3);
                }
                let mut second = DeviceChannel::new(&memory, &locks);
                assert_eq!(second.perform(Call::Log(LogData { addr: 0, len: 5 })).unwrap(), 5);
                second.finish().unwrap();
            })
        };
        serve(&memory, &locks, 2);
        device.join().unwrap();
        assert!(locks.is_idle());
    }
}
