// src/lib.rs

//! pastewatch: keyword alerts for newly published pastes

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;

#[cfg(test)]
pub mod test_utils;
