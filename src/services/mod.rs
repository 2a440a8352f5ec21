pub mod clipboard;
pub mod image_resolver;
pub mod llm_service;
pub mod logo_store;

pub use clipboard::{ClipboardSink, SystemClipboard};
pub use image_resolver::ImageResolver;
pub use llm_service::{LlmService, QuestionGenerator};
pub use logo_store::{FileKeyValueStore, KeyValueStore, LogoStore, MemoryKeyValueStore};
