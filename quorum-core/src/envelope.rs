//! The nested service envelopes carried inside wire frames.
//!
//! A request body is a [`ServiceRequest`] whose oneof arm selects create,
//! delete, command, or query. Command and query arms hold the bytes of a
//! framed [`CommandRequest`]/[`QueryRequest`], which in turn carry the
//! caller's opaque operation payload. Responses mirror the nesting:
//! [`ServiceResponse`] → [`CommandResponse`]/[`QueryResponse`] (unary) or
//! [`StreamResponse`] (per stream frame) → opaque output bytes.
//!
//! Encoding is infallible given well-typed input. Every decode helper
//! validates the oneof discriminator against the request kind and reports
//! failures as [`QuorumError::MalformedResponse`] naming the layer that
//! rejected the bytes.

use bytes::Bytes;
use prost::Message;

use crate::error::{EnvelopeLayer, QuorumError, Result};

/// Identifies a named instance of a typed primitive.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ServiceId {
    /// The instance name, e.g. `"orders"`.
    #[prost(string, tag = "1")]
    pub name: String,
    /// The primitive type, e.g. `"map"`.
    #[prost(string, tag = "2")]
    pub kind: String,
}

impl ServiceId {
    /// Creates a new service id from an instance name and primitive type.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// Session metadata threaded verbatim into every request envelope.
///
/// The client never synthesizes or rewrites one of these; it copies what
/// the caller supplied. The server uses it for duplicate suppression and
/// consistency decisions.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct RequestContext {
    /// The server session this request belongs to.
    #[prost(uint64, tag = "1")]
    pub session_id: u64,
    /// The session-scoped sequence number of this request.
    #[prost(uint64, tag = "2")]
    pub sequence: u64,
    /// The last state-machine index observed by the caller.
    #[prost(uint64, tag = "3")]
    pub index: u64,
}

/// Server-side ordering information returned with each unary response.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct ResponseContext {
    /// The state-machine index at which the operation was applied.
    #[prost(uint64, tag = "1")]
    pub index: u64,
    /// The output sequence number for causality tracking.
    #[prost(uint64, tag = "2")]
    pub sequence: u64,
}

/// Per-frame analog of [`ResponseContext`] for streaming responses.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct StreamContext {
    /// The state-machine index that produced this frame.
    #[prost(uint64, tag = "1")]
    pub index: u64,
    /// The frame's position in the stream's output sequence.
    #[prost(uint64, tag = "2")]
    pub sequence: u64,
}

/// Request to materialize the service instance on the server.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct CreateRequest {}

/// Request to remove the service instance from the server.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct DeleteRequest {}

/// A state-mutating operation, routed through the server's consensus path.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommandRequest {
    /// The operation name.
    #[prost(string, tag = "1")]
    pub name: String,
    /// The caller's session context.
    #[prost(message, optional, tag = "2")]
    pub context: Option<RequestContext>,
    /// The opaque operation payload.
    #[prost(bytes = "bytes", tag = "3")]
    pub payload: Bytes,
}

/// A read-only operation, eligible for the server's relaxed read path.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryRequest {
    /// The operation name.
    #[prost(string, tag = "1")]
    pub name: String,
    /// The caller's session context.
    #[prost(message, optional, tag = "2")]
    pub context: Option<RequestContext>,
    /// The opaque operation payload.
    #[prost(bytes = "bytes", tag = "3")]
    pub payload: Bytes,
}

/// The outer request envelope addressed to a service instance.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServiceRequest {
    /// The target service instance.
    #[prost(message, optional, tag = "1")]
    pub id: Option<ServiceId>,
    /// The request body.
    #[prost(oneof = "service_request::Request", tags = "2, 3, 4, 5")]
    pub request: Option<service_request::Request>,
}

/// Oneof arms for [`ServiceRequest`].
pub mod service_request {
    /// The body of a [`super::ServiceRequest`].
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Request {
        /// Materialize the service instance.
        #[prost(message, tag = "2")]
        Create(super::CreateRequest),
        /// Remove the service instance.
        #[prost(message, tag = "3")]
        Delete(super::DeleteRequest),
        /// A framed [`super::CommandRequest`].
        #[prost(bytes = "bytes", tag = "4")]
        Command(::bytes::Bytes),
        /// A framed [`super::QueryRequest`].
        #[prost(bytes = "bytes", tag = "5")]
        Query(::bytes::Bytes),
    }
}

/// The response to a command, carrying ordering context and opaque output.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommandResponse {
    /// Server-side ordering information.
    #[prost(message, optional, tag = "1")]
    pub context: Option<ResponseContext>,
    /// The opaque operation output.
    #[prost(bytes = "bytes", tag = "2")]
    pub output: Bytes,
}

/// The response to a query, carrying ordering context and opaque output.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryResponse {
    /// Server-side ordering information.
    #[prost(message, optional, tag = "1")]
    pub context: Option<ResponseContext>,
    /// The opaque operation output.
    #[prost(bytes = "bytes", tag = "2")]
    pub output: Bytes,
}

/// One frame of a streaming response.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamResponse {
    /// Per-frame ordering information.
    #[prost(message, optional, tag = "1")]
    pub context: Option<StreamContext>,
    /// The opaque operation output for this frame.
    #[prost(bytes = "bytes", tag = "2")]
    pub output: Bytes,
}

/// The outer response envelope.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServiceResponse {
    /// The response body.
    #[prost(oneof = "service_response::Response", tags = "1, 2")]
    pub response: Option<service_response::Response>,
}

/// Oneof arms for [`ServiceResponse`].
pub mod service_response {
    /// The body of a [`super::ServiceResponse`].
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Response {
        /// A framed [`super::CommandResponse`] or, for streams,
        /// [`super::StreamResponse`].
        #[prost(bytes = "bytes", tag = "1")]
        Command(::bytes::Bytes),
        /// A framed [`super::QueryResponse`] or, for streams,
        /// [`super::StreamResponse`].
        #[prost(bytes = "bytes", tag = "2")]
        Query(::bytes::Bytes),
    }
}

/// A server-tagged application error, carried in an error-flagged frame.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ErrorDetail {
    /// The server's error code.
    #[prost(int32, tag = "1")]
    pub code: i32,
    /// The server's error message.
    #[prost(string, tag = "2")]
    pub message: String,
}

/// Encodes a create request for the given service.
pub fn encode_create_request(id: &ServiceId) -> Bytes {
    let request = ServiceRequest {
        id: Some(id.clone()),
        request: Some(service_request::Request::Create(CreateRequest {})),
    };
    Bytes::from(request.encode_to_vec())
}

/// Encodes a delete request for the given service.
pub fn encode_delete_request(id: &ServiceId) -> Bytes {
    let request = ServiceRequest {
        id: Some(id.clone()),
        request: Some(service_request::Request::Delete(DeleteRequest {})),
    };
    Bytes::from(request.encode_to_vec())
}

/// Encodes a command request: payload → `CommandRequest` → `ServiceRequest`.
pub fn encode_command_request(
    id: &ServiceId,
    name: &str,
    context: RequestContext,
    payload: Bytes,
) -> Bytes {
    let command = CommandRequest {
        name: name.to_string(),
        context: Some(context),
        payload,
    };
    let request = ServiceRequest {
        id: Some(id.clone()),
        request: Some(service_request::Request::Command(Bytes::from(
            command.encode_to_vec(),
        ))),
    };
    Bytes::from(request.encode_to_vec())
}

/// Encodes a query request: payload → `QueryRequest` → `ServiceRequest`.
pub fn encode_query_request(
    id: &ServiceId,
    name: &str,
    context: RequestContext,
    payload: Bytes,
) -> Bytes {
    let query = QueryRequest {
        name: name.to_string(),
        context: Some(context),
        payload,
    };
    let request = ServiceRequest {
        id: Some(id.clone()),
        request: Some(service_request::Request::Query(Bytes::from(
            query.encode_to_vec(),
        ))),
    };
    Bytes::from(request.encode_to_vec())
}

/// Decodes the outer response envelope without touching the inner body.
pub fn decode_service_response(bytes: &[u8]) -> Result<ServiceResponse> {
    ServiceResponse::decode(bytes)
        .map_err(|e| QuorumError::malformed(EnvelopeLayer::ServiceResponse, e.to_string()))
}

/// Extracts the command arm of a service response.
///
/// A query arm or a missing body is a discriminator mismatch.
fn command_arm(response: ServiceResponse) -> Result<Bytes> {
    match response.response {
        Some(service_response::Response::Command(bytes)) => Ok(bytes),
        Some(service_response::Response::Query(_)) => Err(QuorumError::malformed(
            EnvelopeLayer::ServiceResponse,
            "expected command response, got query",
        )),
        None => Err(QuorumError::malformed(
            EnvelopeLayer::ServiceResponse,
            "missing response body",
        )),
    }
}

/// Extracts the query arm of a service response.
fn query_arm(response: ServiceResponse) -> Result<Bytes> {
    match response.response {
        Some(service_response::Response::Query(bytes)) => Ok(bytes),
        Some(service_response::Response::Command(_)) => Err(QuorumError::malformed(
            EnvelopeLayer::ServiceResponse,
            "expected query response, got command",
        )),
        None => Err(QuorumError::malformed(
            EnvelopeLayer::ServiceResponse,
            "missing response body",
        )),
    }
}

/// Decodes a unary command response: `ServiceResponse` → `CommandResponse`.
pub fn decode_command_response(bytes: &[u8]) -> Result<CommandResponse> {
    let inner = command_arm(decode_service_response(bytes)?)?;
    CommandResponse::decode(inner)
        .map_err(|e| QuorumError::malformed(EnvelopeLayer::CommandResponse, e.to_string()))
}

/// Decodes a unary query response: `ServiceResponse` → `QueryResponse`.
pub fn decode_query_response(bytes: &[u8]) -> Result<QueryResponse> {
    let inner = query_arm(decode_service_response(bytes)?)?;
    QueryResponse::decode(inner)
        .map_err(|e| QuorumError::malformed(EnvelopeLayer::QueryResponse, e.to_string()))
}

/// Decodes one command-stream frame: `ServiceResponse` → `StreamResponse`.
pub fn decode_command_stream_frame(bytes: &[u8]) -> Result<StreamResponse> {
    let inner = command_arm(decode_service_response(bytes)?)?;
    StreamResponse::decode(inner)
        .map_err(|e| QuorumError::malformed(EnvelopeLayer::StreamResponse, e.to_string()))
}

/// Decodes one query-stream frame: `ServiceResponse` → `StreamResponse`.
pub fn decode_query_stream_frame(bytes: &[u8]) -> Result<StreamResponse> {
    let inner = query_arm(decode_service_response(bytes)?)?;
    StreamResponse::decode(inner)
        .map_err(|e| QuorumError::malformed(EnvelopeLayer::StreamResponse, e.to_string()))
}

/// Decodes a server-tagged error payload into an [`QuorumError::Application`].
///
/// An undecodable error payload is itself a malformed response.
pub fn decode_error_detail(bytes: &[u8]) -> QuorumError {
    match ErrorDetail::decode(bytes) {
        Ok(detail) => QuorumError::Application {
            code: detail.code,
            message: detail.message,
        },
        Err(e) => QuorumError::malformed(EnvelopeLayer::ErrorDetail, e.to_string()),
    }
}

/// Encodes a unary command response. Used by servers and test fixtures.
pub fn encode_command_response(context: ResponseContext, output: Bytes) -> Bytes {
    let inner = CommandResponse {
        context: Some(context),
        output,
    };
    let response = ServiceResponse {
        response: Some(service_response::Response::Command(Bytes::from(
            inner.encode_to_vec(),
        ))),
    };
    Bytes::from(response.encode_to_vec())
}

/// Encodes a unary query response. Used by servers and test fixtures.
pub fn encode_query_response(context: ResponseContext, output: Bytes) -> Bytes {
    let inner = QueryResponse {
        context: Some(context),
        output,
    };
    let response = ServiceResponse {
        response: Some(service_response::Response::Query(Bytes::from(
            inner.encode_to_vec(),
        ))),
    };
    Bytes::from(response.encode_to_vec())
}

/// Encodes one stream frame under the command arm. Used by servers and
/// test fixtures.
pub fn encode_command_stream_frame(context: StreamContext, output: Bytes) -> Bytes {
    let inner = StreamResponse {
        context: Some(context),
        output,
    };
    let response = ServiceResponse {
        response: Some(service_response::Response::Command(Bytes::from(
            inner.encode_to_vec(),
        ))),
    };
    Bytes::from(response.encode_to_vec())
}

/// Encodes one stream frame under the query arm. Used by servers and
/// test fixtures.
pub fn encode_query_stream_frame(context: StreamContext, output: Bytes) -> Bytes {
    let inner = StreamResponse {
        context: Some(context),
        output,
    };
    let response = ServiceResponse {
        response: Some(service_response::Response::Query(Bytes::from(
            inner.encode_to_vec(),
        ))),
    };
    Bytes::from(response.encode_to_vec())
}

/// Encodes a server-tagged error payload. Used by servers and test fixtures.
pub fn encode_error_detail(code: i32, message: &str) -> Bytes {
    let detail = ErrorDetail {
        code,
        message: message.to_string(),
    };
    Bytes::from(detail.encode_to_vec())
}
