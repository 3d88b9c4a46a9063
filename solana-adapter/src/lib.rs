mod client;
mod types;

pub use client::SolanaAdapter;
pub use types::{AccountFilter, SendOptions};
