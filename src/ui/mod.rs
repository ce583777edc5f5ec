// UI and formatting module

pub mod formatters;
pub mod live;

// Re-export commonly used items for cleaner imports
pub use formatters::{format_size, truncate_command, COMMAND_DISPLAY_WIDTH};
pub use live::{draw, render, ProcessView};
