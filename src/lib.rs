pub mod app;
pub mod config;
pub mod error;
pub mod notify;
pub mod scheduler;
pub mod shell;
pub mod state;
pub mod util;
pub mod weather;

#[cfg(test)]
mod test_util;
