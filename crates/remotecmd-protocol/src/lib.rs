//! Wire model shared by the remote command daemon and its client.
//!
//! A request is a [`CommandEnvelope`]: caller credentials, the identifier of
//! the command to run, and an ordered tree of [`ArgumentNode`]s. A response is
//! a [`CommandResult`] whose [`ResultDetails`] variant is named on the wire by
//! a `class` discriminator and reconstructed through a [`ResultRegistry`].
//!
//! Both documents are JSON. On a socket each exchange is one JSONL line in
//! each direction, framed by [`TransportRequest`].

mod arguments;
mod codec;
mod envelope;
mod error;
mod frame;
mod listing;
mod registry;
mod report;
mod result;

pub use arguments::{ArgumentError, ArgumentNode, ProcessorArguments};
pub use codec::{
    deserialize_envelope, deserialize_result, parse_arguments, serialize_envelope,
    serialize_result,
};
pub use envelope::{CommandEnvelope, Credentials};
pub use error::ProtocolError;
pub use frame::{PROBE_VALUE, TransportRequest};
pub use listing::{DirectoryListing, FileEntry, FileListing};
pub use registry::ResultRegistry;
pub use report::render_report;
pub use result::{CommandResult, ResultDetails, ResultKind, ResultStatus};
