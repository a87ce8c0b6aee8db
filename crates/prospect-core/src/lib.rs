//! Core types shared across the Prospect simulation workspace.
//!
//! This is the leaf crate. It defines the identifiers every other crate
//! agrees on, the typed in-process [`EventBus`], and the [`Pool`] used to
//! recycle transient buffers between ticks.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod event;
pub mod id;
pub mod pool;

pub use event::EventBus;
pub use id::{ContainableId, ContainableKind, SubscriptionId, TickId};
pub use pool::{Pool, PoolStats, Pooled, Resettable};
