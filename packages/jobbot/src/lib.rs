pub mod config;
pub mod crawler;
pub mod extract;
pub mod kernel;
pub mod models;
pub mod pipeline;
pub mod retention;
pub mod scheduler;
pub mod store;
pub mod urls;

// Re-exports for clean API
pub use config::Config;
pub use kernel::{BaseAI, BaseRenderer, RenderedPage};
pub use models::{JobRecord, JobStatus, NewJobRecord, UserProfile};
pub use pipeline::{run_campaign, CampaignError, CampaignReport, CampaignTuning};
pub use retention::{CleanupReport, RetentionEngine, RetentionPolicy};
pub use store::{JobStore, MemoryJobStore, PostgresJobStore};
