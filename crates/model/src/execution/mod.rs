pub mod job;
pub mod summary;
pub mod target;
