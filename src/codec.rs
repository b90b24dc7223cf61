//! JSON frame encoding for messages crossing the worker boundary.
//!
//! Requests and responses only ever cross the endpoint as byte frames;
//! both sides go through these functions rather than sharing in-memory
//! structs, so an out-of-process endpoint needs nothing extra.

use crate::errors::CodecError;
use crate::message::{ServiceRequest, ServiceResponse};

pub fn encode_request(request: &ServiceRequest) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(request).map_err(CodecError::Encode)
}

pub fn decode_request(frame: &[u8]) -> Result<ServiceRequest, CodecError> {
    serde_json::from_slice(frame).map_err(CodecError::BadRequestFrame)
}

pub fn encode_response(response: &ServiceResponse) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(response).map_err(CodecError::Encode)
}

pub fn decode_response(frame: &[u8]) -> Result<ServiceResponse, CodecError> {
    serde_json::from_slice(frame).map_err(CodecError::BadResponseFrame)
}
