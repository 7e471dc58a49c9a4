//! Ratatui front-end. It only turns key presses into catalog requests and
//! renders the rows that come back.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
