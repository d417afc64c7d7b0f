pub mod balance;
pub mod employee;
pub(crate) mod macros;
pub mod overtime;
pub mod revision;

// Re-export all models for easy importing
pub use balance::*;
pub use employee::*;
pub use overtime::*;
pub use revision::*;
