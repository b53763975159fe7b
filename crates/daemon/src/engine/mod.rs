// Script environments: open sessions, their registry and the file-state
// cache fed by file-operation responses.

pub mod environment;
pub mod files;
pub mod registry;

pub use environment::{Delivery, EnvironmentError, EnvironmentEvent, ScriptEnvironment};
pub use files::{FileStateCache, TrackedFile};
pub use registry::ScriptEnvironmentRegistry;
