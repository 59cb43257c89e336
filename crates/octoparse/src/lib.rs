//! Octoparse: client library for the Octoparse OpenAPI. Token acquisition,
//! operation routing, and response normalization.

pub mod catalog;
pub mod dispatch;
pub mod normalize;
pub mod token;
pub mod transport;
pub mod types;

pub use catalog::{route, HttpMethod, ParamKind, ParamSpec, Placement, Route};
pub use dispatch::{Dispatcher, PreparedCall};
pub use normalize::{index_sequence, normalize, NormalizeMode};
pub use token::{TokenCache, TokenProvider};
pub use transport::{HttpRequest, HttpTransport, ReqwestTransport, DEFAULT_TIMEOUT};
pub use types::*;
