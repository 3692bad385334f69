#![doc = include_str!("../README.md")]

mod config;
mod error;
mod job;
mod mutex;
mod pool;
mod stats;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::job::*;
pub use crate::pool::*;
pub use crate::stats::*;
