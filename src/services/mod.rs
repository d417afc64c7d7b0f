pub mod accrual;
pub mod workflow;

pub use accrual::{AccrualRunSummary, AccrualService};
pub use workflow::{OvertimeWorkflow, WorkflowOutcome};
