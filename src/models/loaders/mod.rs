pub mod file_loader;

pub use file_loader::{load_exam, load_exam_config, save_exam};
