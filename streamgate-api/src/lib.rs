// streamgate API library
//
// HTTP surface for administrators and for the media server's publish hooks

pub mod http;

pub use http::{create_router, AppState};
