//! Request lifecycle primitives
//!
//! [`RequestSlots`] keeps at most one live request per operation kind and
//! discards superseded responses; [`Debouncer`] collapses keystroke bursts
//! into a single call.

mod debounce;
mod slot;

pub use debounce::Debouncer;
pub use slot::{OperationKind, Outcome, RequestSlots, Settle, SlotState};
