pub mod ask;
pub mod configure;
pub mod handoff;
pub mod memory;
pub mod start;
pub mod status;
pub mod task;
pub mod update;

pub use ask::ask;
pub use configure::{configure, space};
pub use handoff::handoff;
pub use start::start;
pub use status::status;
pub use update::update;
