//! Services module
//!
//! Business logic services that coordinate between the API layer and
//! the repository.

pub mod activity;
pub mod auth;
pub mod notes;
pub mod quota;
pub mod scheduler;
pub mod sweep;
pub mod tasks;

pub use activity::ActivityService;
pub use auth::AuthService;
pub use notes::NotesService;
pub use quota::QuotaService;
pub use scheduler::SweepScheduler;
pub use sweep::SweepService;
pub use tasks::TasksService;
