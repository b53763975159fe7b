// Script documents: identity, config and code backed by a script file.

pub mod document;

pub use document::{DocumentError, ScriptDocument, SCRIPT_FILE_EXTENSION};
