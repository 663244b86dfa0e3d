pub mod error;
pub mod history;
pub mod providers;
pub mod workflow;

pub use workflow::{AttendanceWorkflow, WorkflowSettings};
