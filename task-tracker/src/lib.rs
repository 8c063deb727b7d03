//! Task tracker backed by a single JSON file.
pub mod clock;
pub mod config;
pub mod date;
pub mod error;
pub mod migrate;
pub mod store;
pub mod task;

pub use clock::{Clock, SystemClock};
pub use error::{DateError, StoreError};
pub use store::{LoadPolicy, TaskStore, next_id};
pub use task::{NewTask, Record, Status, Task, TaskPatch};
