// backend module — REST plumbing for the prediction platform

pub mod client;
pub mod commits;
pub mod predictions;
pub mod repos;
pub mod reports;
pub mod runs;
pub mod webhooks;

pub use client::ApiClient;
