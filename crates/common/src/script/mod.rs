// Script file format and runnable-program synthesis.

pub mod codec;
pub mod synth;

pub use codec::{parse, serialize, CodecError, LineEnding, ParsedScript, QUERY_DELIMITER};
pub use synth::{namespace_imports, synthesize, DEFAULT_NAMESPACES};
