//! Command-line surface tests

mod offline_commands;
mod parse_matrix;
