pub mod error;
pub mod handoff;
pub mod integrator;
pub mod platform;

pub use error::IntegrationError;
pub use handoff::{HandoffProject, HandoffReceipt};
pub use integrator::{Answer, FanOut, PlatformConfig, PlatformIntegrator, PlatformStatus};
pub use platform::{AuthHeader, Platform, QueryReply};
