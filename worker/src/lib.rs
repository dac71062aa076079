//! idproof worker: intake endpoint, bounded job queue and proofing worker
//! pool around a [`ProofingOrchestrator`](idproof_proofing::ProofingOrchestrator).

pub mod config;
pub mod error;
pub mod queue;
pub mod server;
pub mod shutdown;

pub use config::{PayloadKeyConfig, WorkerConfig};
pub use error::WorkerConfigError;
pub use queue::{spawn_workers, EnqueueError, JobQueue};
pub use server::{router, serve, serve_until, AppState};
pub use shutdown::ShutdownController;
