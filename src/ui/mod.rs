//! Screens and helpers shared by several commands.

pub mod error;
pub mod playback;

pub use error::{show_error_screen, ErrorScreen};
pub use playback::play_until_key;
