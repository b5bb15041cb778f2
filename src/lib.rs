pub mod api;
pub mod app;
pub mod config;
pub mod format;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod types;
pub mod ui;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;
