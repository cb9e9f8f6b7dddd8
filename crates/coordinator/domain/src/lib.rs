//! Domain types for the multisig proposal coordinator.
//!
//! This crate provides the core domain models for managing multisig accounts,
//! proposals, and transaction envelopes. It includes type-safe builders and
//! state tracking for accounts, and the pure (network-free) envelope queries
//! the approval bookkeeping is built on.

#![no_std]

extern crate alloc;

pub mod account;
pub mod envelope;
pub mod network;
pub mod proposal;

#[cfg(feature = "serde")]
mod with_serde;

use bon::Builder;
use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Timestamp metadata for tracking entity creation and modification times.
///
/// This struct is commonly used as auxiliary data (`AUX`) in other domain types
/// to track when entities were created and last updated.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timestamps {
    /// The timestamp when the entity was created.
    created_at: DateTime<Utc>,
    /// The timestamp when the entity was last updated.
    updated_at: DateTime<Utc>,
}

impl Timestamps {
    /// Returns the creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns a copy with the update timestamp moved forward.
    ///
    /// The creation timestamp is preserved.
    pub fn updated(self, at: DateTime<Utc>) -> Self {
        Self {
            created_at: self.created_at,
            updated_at: at,
        }
    }
}
