// Wire protocol between scriptpad and the code-intelligence/execution service.

pub mod events;
pub mod file_operation;
pub mod text_edit;
