//! Backend adapters and the request plumbing they share.

pub mod bitharbor;
pub mod legacy;
pub mod mock;
pub mod search;
pub mod session;
pub mod transport;

pub use bitharbor::BitHarborAdapter;
pub use legacy::LegacyAdapter;
pub use mock::{MockResponse, MockServer};
pub use session::{Session, SessionProvider, SessionStore};
pub use transport::{ApiClient, ApiRequest, HttpTransport, Transport};
