mod http;

pub use http::{HttpTransport, upload_endpoint};
