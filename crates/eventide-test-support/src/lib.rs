//! Shared test fakes for Eventide stores, buses and clocks.

mod bus;
mod call_log;
mod clock;
mod repository;

pub use bus::{FailingEventBus, RecordingEventBus};
pub use call_log::{CallLog, RecordedCall};
pub use clock::FixedClock;
pub use repository::{
    EmptyEventRepository, FailingEventRepository, HangingEventRepository,
    RecordingEventRepository,
};
