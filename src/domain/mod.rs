pub mod profile;
pub mod progress;
pub mod review;
pub mod session;

pub use profile::UserProfile;
pub use progress::{AnswerCounters, DifficultyLevel, ProgressRecord};
pub use review::ReviewStrategy;
pub use session::{SessionRecord, SessionStatus, SessionType, SessionUpdate};
