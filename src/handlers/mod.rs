pub mod accrual;
pub mod balance;
pub mod employees;
pub mod overtime;
pub mod shared;
