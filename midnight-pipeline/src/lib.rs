pub mod executor;
pub mod scheduler;

pub use executor::BookingExecutor;
pub use scheduler::{BookingScheduler, SchedulerConfig, SchedulerHandle};

#[cfg(test)]
pub(crate) mod testutil;
