pub mod api;
pub mod api_types;
pub mod client;
pub mod keys;
#[cfg(test)]
pub mod mock;
mod queries;
pub mod types;

pub use api::GitHubApi;
pub use client::GraphQlClient;
pub use keys::ResourceKey;
