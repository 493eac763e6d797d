pub mod http;
pub mod token;

pub use http::HttpProviderClient;
