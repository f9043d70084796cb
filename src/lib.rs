//! Builds "phantom" ammo files for Yandex Tank from a list of request
//! descriptions.
//!
//! raw descriptions -> [`parse_request_list`] -> [`AmmoWriter`] ->
//! [`BulletSerializer`] per record -> ammo file, in input order.

pub mod ammo_writer;
pub mod bullet_serializer;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod execute;
pub mod headers;
pub mod logging;
pub mod request_record;
pub mod request_record_list;

pub use ammo_writer::{AmmoWriter, Bullets, WriteSummary};
pub use bullet_serializer::BulletSerializer;
pub use diagnostics::{DiagnosticSink, TracingSink};
pub use errors::{AmmoError, DestinationError, RecordError, SerializationError, ValidationError};
pub use headers::{canonicalize_header_name, HeaderSet};
pub use request_record::{Body, HttpMethod, RequestRecord};
pub use request_record_list::parse_request_list;
