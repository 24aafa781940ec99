pub mod cursor;
pub mod error;
pub mod retry;
pub mod runner;
