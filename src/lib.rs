pub mod assemble;
pub mod config;
pub mod error;
pub mod parse;
pub mod synthesize;
pub mod validate;
pub mod wasm;
