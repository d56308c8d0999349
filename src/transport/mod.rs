pub mod http;
pub mod traits;
pub mod types;

pub use http::HttpRunClient;
pub use traits::{PullTransport, PushStream, PushTransport, TransportError};
pub use types::{PullResponse, PushBatch, PushFailure, PushPayload, RunPage};
