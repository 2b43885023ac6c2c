pub mod analyzers;
pub mod config;
pub mod error;
pub mod fetch;
pub mod order;
pub mod output;
pub mod parser;
pub mod sample;
pub mod view;
