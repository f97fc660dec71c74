//! Core of the electrochemical data browser: a pluggable loader registry that
//! turns instrument files into normalized tables, and a trace store that
//! tracks each plotted dataset together with its style.

pub mod config;
pub mod data;
pub mod error;
pub mod trace;

pub use error::{Error, Result};
