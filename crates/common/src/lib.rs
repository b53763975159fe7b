// scriptpad-common: shared types, the script file codec and the wire protocol.

pub mod protocol;
pub mod script;
pub mod types;
