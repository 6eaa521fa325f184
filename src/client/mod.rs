// Client module - game economy API client
pub mod api;

pub use api::{GameApiClient, FetchBatch};
