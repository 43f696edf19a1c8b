//! Shared utilities: errors, translations, prompt assembly and console output.

pub mod errors;
pub mod i18n;
pub mod logger;
pub mod printer;
pub mod prompts;
