// ABOUTME: Command module aggregator for the regprune CLI.
// ABOUTME: Re-exports the clean and repos command handlers.

mod backend;
mod clean;
mod repos;

pub use clean::clean;
pub use repos::list_repositories;
