pub mod config;
pub mod fetch;
pub mod image;
pub mod map;
pub mod parse;
pub mod pipeline;
pub mod stats;
pub mod store;
