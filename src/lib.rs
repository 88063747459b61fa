pub mod app;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod form;
pub mod normalize;
pub mod photos;
pub mod recurrence;
pub mod repository;
pub mod share;
pub mod store;
pub mod task;
pub mod theme;
pub mod ui;

pub use error::{AppError, Result};
pub use repository::TaskRepository;
pub use task::{Task, TaskDraft, TaskId};
