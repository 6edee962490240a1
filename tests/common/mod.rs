#![allow(dead_code)]

pub mod fixtures;
pub mod mock_engine;
pub mod strategies;

pub use fixtures::*;
pub use mock_engine::*;
pub use strategies::*;
