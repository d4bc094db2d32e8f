pub mod app;
pub mod chain;
pub mod cli;
pub mod config;
pub mod gallery;
pub mod metadata;
pub mod output;
pub mod pager;
pub mod records;
pub mod task;
pub mod utils;

#[cfg(test)]
mod tests;
