//! Protocol constants for the quorum wire framing.

/// Size of the frame length field in bytes.
pub const SIZE_OF_FRAME_LENGTH_FIELD: usize = 4;

/// Size of the correlation id field in bytes.
pub const SIZE_OF_CORRELATION_ID_FIELD: usize = 8;

/// Size of the frame flags field in bytes.
pub const SIZE_OF_FRAME_FLAGS_FIELD: usize = 2;

/// Size of the frame header after the length field (correlation id + flags).
pub const FRAME_HEADER_SIZE: usize = SIZE_OF_CORRELATION_ID_FIELD + SIZE_OF_FRAME_FLAGS_FIELD;

/// Query flag - marks a request as read-only, letting the server route it
/// through its relaxed read path.
pub const QUERY_FLAG: u16 = 1 << 0;

/// Stream flag - the frame belongs to an open server stream.
pub const STREAM_FLAG: u16 = 1 << 1;

/// Complete flag - the stream identified by the correlation id terminated
/// normally. The frame body is empty.
pub const COMPLETE_FLAG: u16 = 1 << 2;

/// Error flag - the frame body is a server-tagged error payload rather
/// than a response envelope.
pub const ERROR_FLAG: u16 = 1 << 3;

/// Default frame flags (unary command).
pub const DEFAULT_FLAGS: u16 = 0;

/// Maximum accepted frame length, guarding against corrupt length fields.
pub const MAX_FRAME_LENGTH: usize = 64 * 1024 * 1024;
