//! Pipeline entry points for the paste monitor.
//!
//! - `run_monitor`: Poll, match and deliver until interrupted
//! - `Poller`: The single-task poll loop owning the dedup cache
//! - `run_output_worker` / `run_error_worker`: Route consumers

pub mod dedup;
pub mod delivery;
pub mod monitor;
pub mod poll;
pub mod shutdown;

pub use dedup::DedupCache;
pub use delivery::{DeliveryStats, run_error_worker, run_output_worker};
pub use monitor::{MonitorSummary, run_monitor};
pub use poll::{CycleReport, Poller};
pub use shutdown::{Shutdown, ctrl_c, watch_interrupt};
