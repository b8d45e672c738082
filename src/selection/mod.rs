//! Pending card selections.
//!
//! At most two cards can be face-up and unresolved at once. The buffer is
//! the guard against a repeated click on the same card and against a third
//! click while a pair is being checked.

mod buffer;

pub use buffer::{SelectionBuffer, PAIR_SIZE};
