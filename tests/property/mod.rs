//! Property-based tests for polling and selection guarantees

mod persistence;
mod polling;
mod selection;
