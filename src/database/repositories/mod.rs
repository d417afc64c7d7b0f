pub mod balance;
pub mod employee;
pub mod overtime;
pub mod revision;

// Re-export all repositories for easy importing
pub use balance::BalanceRepository;
pub use employee::EmployeeRepository;
pub use overtime::OvertimeRepository;
pub use revision::RevisionRepository;
