//! Gateways to the external services a plan depends on.
//!
//! Each gateway wraps exactly one network capability and never lets a fault
//! escape: every failure comes back as a [`GatewayError`] value. Credentials
//! are checked once, when a gateway is connected; a gateway connected without
//! its credential fails every call with a message naming the missing variable.

mod completion;
mod error;
mod http;
mod search;

pub use completion::{CompletionGateway, MistralGateway, UnavailableCompletion, connect_completion};
pub use error::GatewayError;
pub use search::{
  SearchGateway, SearchHit, SearchResults, SerperGateway, UnavailableSearch, connect_search,
};
