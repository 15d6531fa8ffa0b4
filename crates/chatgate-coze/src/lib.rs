/// Client for the Coze conversational-AI API.
///
/// Every call is a single attempt: build the payload, send it with the shared
/// bearer credential, parse the `{code, data, msg}` envelope and classify a
/// non-zero `code` as `CozeError::Upstream`.

pub mod client;
pub mod error;
pub mod wire;

pub use client::{ChatTicket, CozeClient, CozeConfig};
pub use error::CozeError;
