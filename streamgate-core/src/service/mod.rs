pub mod authorizer;
pub mod ingest_control;
pub mod key_rotation;
pub mod registry;

pub use authorizer::{PublishRequest, SessionAuthorizer};
pub use ingest_control::IngestControlService;
pub use key_rotation::{generate_stream_key, KeyRotationService, STREAM_KEY_LEN};
pub use registry::StreamRegistry;
