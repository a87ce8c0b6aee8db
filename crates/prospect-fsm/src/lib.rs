//! Flag-driven finite state machine for Prospect agents.
//!
//! An [`Fsm`] owns one handler per state and a transition table
//! `(state, flag) -> next`. Each call to [`Fsm::tick`] asks the current
//! state for a set of *behaviour steps*, runs them, and then applies the
//! flags they raised.
//!
//! # Thread groups
//!
//! Steps are tagged with a group number and a [`Lane`]. Groups run in
//! ascending order with a barrier between them. Within a group the
//! [`Lane::Parallel`] steps run concurrently on the rayon pool, then the
//! [`Lane::Main`] steps run in order on the calling thread.
//!
//! # Flags and handoff
//!
//! Steps raise flags through a [`FlagRaiser`]. Flags are collected and
//! applied once the whole step set is done, in step registration order.
//! After a transition the remaining flags are checked against the new
//! state, behind any flags its enter hook raised.
//! A flag may carry a message ([`FlagRaiser::raise_with`]) that the next
//! state's enter hook receives.
//!
//! # Typed parameters
//!
//! Each [`State`] declares the parameter types its hooks need. When it is
//! registered, [`Providers`] must supply a closure for each non-`()`
//! parameter; a missing provider does not compile.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod actions;
pub mod error;
pub mod machine;
pub mod state;

pub use actions::{ActionPool, BehaviourActions, FlagRaiser, Lane};
pub use error::FsmError;
pub use machine::{Fsm, FsmBuilder, MAX_CASCADE};
pub use state::{NoProvider, Provide, Provided, Providers, State};
