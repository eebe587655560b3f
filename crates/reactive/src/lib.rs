//! Reactive primitives: value containers that notify subscribers synchronously
//! on mutation.
//!
//! Every mutation fires every currently-subscribed listener, in subscription
//! order, before the mutating call returns. N mutations fire N notification
//! rounds; there is no batching or coalescing.
//!
//! # Invariants
//! - Mutation requires `&mut self` and listeners receive `&T`, so a listener
//!   can never re-enter the cell it observes.
//! - Cloning a cell clones the value only; the clone starts with no listeners.
//! - Serialization round-trips the value only, never subscriptions.
//!
//! The model is single-threaded: listeners are plain `Fn` boxes with no
//! `Send`/`Sync` bound.

pub mod cell;
pub mod list;
pub mod map;

pub use cell::Cell;
pub use list::ListCell;
pub use map::MapCell;

/// Handle returned by a subscribe call, used to unsubscribe later.
///
/// Handles are only meaningful against the container that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(pub(crate) u64);
