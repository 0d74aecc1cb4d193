mod client;

pub use client::{ProviderError, ProviderResponse, TppClient};
