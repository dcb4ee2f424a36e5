//! REST data access for the MediBook client.
//!
//! This crate provides:
//! - `ApiClient` - GET requests against the backend with envelope decoding
//! - `Transport` - the seam between the client and the network
//! - `FetchState` - `{loading, data, error}` tracking keyed on a locator
//! - `follow` / `debounce` - re-observe a `FetchState` as its locator changes
//!
//! # Example
//!
//! ```rust,ignore
//! use medibook_data::{ApiClient, FetchState, HttpTransport};
//!
//! let client = ApiClient::new(HttpTransport::new())
//!     .with_base_url("http://localhost:5000/api/v1");
//! let doctors: FetchState<Vec<Doctor>> = FetchState::new(client);
//!
//! if let Some(task) = doctors.observe("/doctors") {
//!     task.run().await;
//! }
//! let result = doctors.snapshot();
//! ```

mod client;
mod error;
mod fetch_state;
mod reactive;
mod request;
mod response;
mod transport;

pub use client::ApiClient;
pub use error::FetchError;
pub use fetch_state::{FailureKind, FetchFailure, FetchResult, FetchState, FetchTask, FetchWatch};
pub use reactive::{debounce, follow};
pub use request::{Request, RequestBuilder};
pub use response::{Envelope, Response};
pub use transport::{HttpTransport, Transport};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{ApiClient, FetchError, FetchResult, FetchState, HttpTransport, Transport};
}
