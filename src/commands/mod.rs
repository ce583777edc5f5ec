// Command handlers module
pub mod kills;
pub mod monitor;
