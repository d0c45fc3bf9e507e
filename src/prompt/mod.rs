pub mod constructor;
pub mod styles;

pub use constructor::PromptConstructor;
pub use styles::{Style, StylePrompt};
