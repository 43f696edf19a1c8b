//! Prompt and error text.
//!
//! Sections:
//! - `slices`: prompt fragments (role_playing, tools, task, ...)
//! - `errors`: messages fed back to the model when a step fails

/// English translations, embedded at compile time.
///
/// Loaded by [`crate::utilities::i18n::I18N`].
pub const EN_JSON: &str = include_str!("en.json");
