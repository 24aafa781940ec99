pub mod archive_client;
pub mod error;
pub mod reshape;
pub mod response;
pub mod response_cache;
pub mod source;
