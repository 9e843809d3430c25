pub mod job;
pub mod profile;

pub use job::{BatchInsertOutcome, JobRecord, JobStatus, NewJobRecord, UpsertOutcome};
pub use profile::UserProfile;
