//! Error types for FSM construction.

use std::error::Error;
use std::fmt;

/// Errors detected by [`FsmBuilder::build`](crate::FsmBuilder::build).
///
/// These are wiring mistakes, not runtime conditions: a machine that
/// builds never fails afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FsmError {
    /// The initial state has no registered handler.
    UnknownInitialState {
        /// Debug form of the state.
        state: String,
    },
    /// A transition targets or leaves a state with no handler.
    UnknownTransitionState {
        /// Debug form of the source state.
        from: String,
        /// Debug form of the flag.
        flag: String,
        /// Debug form of the missing state.
        missing: String,
    },
    /// The same state was registered twice.
    DuplicateState {
        /// Debug form of the state.
        state: String,
    },
}

impl fmt::Display for FsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownInitialState { state } => {
                write!(f, "initial state {state} is not registered")
            }
            Self::UnknownTransitionState {
                from,
                flag,
                missing,
            } => write!(
                f,
                "transition {from} --{flag}--> uses unregistered state {missing}"
            ),
            Self::DuplicateState { state } => write!(f, "state {state} registered twice"),
        }
    }
}

impl Error for FsmError {}
