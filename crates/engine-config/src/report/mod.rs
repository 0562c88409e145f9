pub mod balance;
pub mod summary;
