pub mod circuit;
pub mod engine;
pub mod error;
pub mod event_scheduler;
pub mod kinds;
pub mod project_codec;
pub mod types;
pub mod wire;

#[cfg(test)]
mod tests;
