//! the command line over an image file
mod cli_struct;
mod commands;
pub use cli_struct::*;
pub use commands::execute;
