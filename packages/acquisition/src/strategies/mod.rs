//! Fetch strategy implementations and the fallback chain.
//!
//! Which strategies are registered, and in what order, is per-deployment
//! configuration; the chain itself is the single code path.

pub mod browser;
pub mod chain;
pub mod direct;
pub mod proxy;

pub use browser::BrowserGatewayStrategy;
pub use chain::ContentFetcher;
pub use direct::DirectStrategy;
pub use proxy::ProxyStrategy;
