// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lock backends a grid can be built on.
//!
//! The backend is a type parameter of [`crate::Grid`], so the lock path is
//! monomorphised and never goes through a vtable.

use core::fmt;

use grid_sync::{BlockingLock, LockSlot, PolledLock};
use serde::Deserialize;

/// Compile-time choice of lock slot implementation.
pub trait Backend: Send + Sync + 'static {
    /// Lock slot type of every tile.
    type Lock: LockSlot + 'static;
    /// Name used in logs and configuration.
    const NAME: &'static str;
}

/// Waiters park on a condition variable.
#[derive(Debug, Clone, Copy, Default)]
pub struct Emulated;

impl Backend for Emulated {
    type Lock = BlockingLock;
    const NAME: &'static str = "emulated";
}

/// Waiters spin on an atomic word, like tiles polling a hardware lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct Polled;

impl Backend for Polled {
    type Lock = PolledLock;
    const NAME: &'static str = "polled";
}

/// Runtime selector for the backend, as read from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// [`Emulated`].
    #[default]
    Emulated,
    /// [`Polled`].
    Polled,
}

impl BackendKind {
    /// Configuration name of the backend.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Emulated => Emulated::NAME,
            Self::Polled => Polled::NAME,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "emulated" => Ok(Self::Emulated),
            "polled" => Ok(Self::Polled),
            other => Err(format!("unknown backend '{other}' (expected emulated or polled)")),
        }
    }
}
