pub mod facade;
pub mod integrations;
pub mod learning;
pub mod mirror;
pub mod store;
pub mod tasks;
pub mod types;

pub use facade::{Facade, StatusReport};
