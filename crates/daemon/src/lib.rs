// scriptpad-daemon library: script documents, environments and the event
// bridge to the external execution service.

pub mod bridge;
pub mod bus;
pub mod config;
pub mod engine;
pub mod runtime;
pub mod script;
pub mod session;
