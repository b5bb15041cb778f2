pub mod client;
pub mod error;
pub mod logging;
pub mod mock_client;
pub mod stream;

pub use client::{ApiClient, ByteStream, ChatTransport};
pub use error::ClientError;
pub use mock_client::{MockApiClient, MockReply};
