// Utility functions shared by the sampling engine and the display layer

pub mod text;

pub use text::{parse_number, truncate_command, COMMAND_DISPLAY_WIDTH};
