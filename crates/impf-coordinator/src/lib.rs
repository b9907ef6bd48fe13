//! The call coordinator: dispatcher, reconciler, sweeper and the scheduler
//! that drives them.
//!
//! [`Coordinator`] is the single entry point used by the web layer. It is
//! generic over the storage backend and the message transport so tests can
//! run it against an in-memory store and a recording notifier.

mod clock;
mod coordinator;
mod dispatcher;
mod reconciler;
mod scheduler;
mod sweeper;

pub use clock::{Clock, FixedClock, SystemClock};
pub use coordinator::{Coordinator, Settings};
pub use dispatcher::DispatchReport;
pub use scheduler::Scheduler;
pub use sweeper::TickReport;
