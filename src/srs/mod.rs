pub mod exponential;
pub mod scheduler;
pub mod sm2;

pub use scheduler::{compute_next_review, latest_review, schedule, ScheduleResult};
