pub mod check;
pub mod error;
pub mod file;
pub mod notify;
