pub mod context;
pub mod dialogue;
pub mod prompts;
pub mod qa;
pub mod state;
pub mod synthesize;
pub mod tasks;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;
