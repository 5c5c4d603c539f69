//! The request layer and the typed endpoint clients built on it.

pub mod api_client;
pub mod error;
pub mod order_client;
pub mod session_client;

pub use api_client::*;
pub use error::*;
pub use order_client::OrderClient;
pub use session_client::*;
