//! Binary RPC wire framing (spec §6 "API wire format").
//!
//! Each request is a length-framed binary message: 4-byte little-endian
//! total length, 1-byte command-name length + name, 1-byte parameter count,
//! then per parameter a type tag + 1-byte name length + name + type payload.
//! Responses are a tree of `{num, string, bool, array, hash}` nodes. Exact
//! field widths are dictated by server compatibility and preserved
//! bit-for-bit — this is not a format this crate is free to redesign.

use std::collections::HashMap;

use thiserror::Error;

use crate::error::{Categorize, Category};

const TAG_NUMBER: u8 = 0;
const TAG_STRING: u8 = 1;
const TAG_BOOL: u8 = 2;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed response frame at offset {0}")]
    Malformed(usize),
    #[error("parameter name longer than 255 bytes")]
    NameTooLong,
}

impl WireError {
    pub fn category(&self) -> Category {
        Category::PermFail
    }
}

impl Categorize for WireError {
    fn category(&self) -> Category {
        WireError::category(self)
    }
}

/// One named RPC parameter (spec §3's request payload, `papi.h`'s `binparam`).
#[derive(Debug, Clone, PartialEq)]
pub struct BinParam {
    pub name: String,
    pub value: BinValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BinValue {
    Number(u64),
    Str(String),
    Bool(bool),
}

impl BinParam {
    pub fn number(name: impl Into<String>, value: u64) -> Self {
        BinParam { name: name.into(), value: BinValue::Number(value) }
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        BinParam { name: name.into(), value: BinValue::Str(value.into()) }
    }

    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        BinParam { name: name.into(), value: BinValue::Bool(value) }
    }
}

/// Encodes one request frame: `command` plus `params`, ready to write to the
/// socket verbatim (length prefix included).
pub fn encode_request(command: &str, params: &[BinParam]) -> Result<Vec<u8>, WireError> {
    if command.len() > 255 {
        return Err(WireError::NameTooLong);
    }
    let mut body = Vec::new();
    body.push(command.len() as u8);
    body.extend_from_slice(command.as_bytes());
    if params.len() > 255 {
        return Err(WireError::NameTooLong);
    }
    body.push(params.len() as u8);
    for param in params {
        if param.name.len() > 255 {
            return Err(WireError::NameTooLong);
        }
        match &param.value {
            BinValue::Number(n) => {
                body.push(TAG_NUMBER);
                body.push(param.name.len() as u8);
                body.extend_from_slice(param.name.as_bytes());
                body.extend_from_slice(&n.to_le_bytes());
            }
            BinValue::Str(s) => {
                body.push(TAG_STRING);
                body.push(param.name.len() as u8);
                body.extend_from_slice(param.name.as_bytes());
                body.extend_from_slice(&(s.len() as u32).to_le_bytes());
                body.extend_from_slice(s.as_bytes());
            }
            BinValue::Bool(b) => {
                body.push(TAG_BOOL);
                body.push(param.name.len() as u8);
                body.extend_from_slice(param.name.as_bytes());
                body.push(if *b { 1 } else { 0 });
            }
        }
    }
    let mut frame = Vec::with_capacity(body.len() + 4);
    frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// A parsed response value tree.
#[derive(Debug, Clone, PartialEq)]
pub enum BinResult {
    Num(u64),
    Str(String),
    Bool(bool),
    Array(Vec<BinResult>),
    Hash(HashMap<String, BinResult>),
}

impl BinResult {
    pub fn as_num(&self) -> Option<u64> {
        match self {
            BinResult::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            BinResult::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&BinResult> {
        match self {
            BinResult::Hash(map) => map.get(key),
            _ => None,
        }
    }
}

const NODE_NUM: u8 = 0;
const NODE_STR: u8 = 1;
const NODE_BOOL: u8 = 2;
const NODE_ARRAY: u8 = 3;
const NODE_HASH: u8 = 4;

/// Decodes one response frame (the 4-byte length prefix has already been
/// stripped and `buf` holds exactly the declared-length body).
pub fn decode_response(buf: &[u8]) -> Result<BinResult, WireError> {
    let mut cursor = 0usize;
    let value = decode_node(buf, &mut cursor)?;
    Ok(value)
}

fn decode_node(buf: &[u8], cursor: &mut usize) -> Result<BinResult, WireError> {
    let tag = *buf.get(*cursor).ok_or(WireError::Malformed(*cursor))?;
    *cursor += 1;
    match tag {
        NODE_NUM => {
            let bytes = read_exact(buf, cursor, 8)?;
            Ok(BinResult::Num(u64::from_le_bytes(bytes.try_into().unwrap())))
        }
        NODE_STR => {
            let len = read_u32(buf, cursor)? as usize;
            let bytes = read_exact(buf, cursor, len)?;
            let s = String::from_utf8(bytes.to_vec()).map_err(|_| WireError::Malformed(*cursor))?;
            Ok(BinResult::Str(s))
        }
        NODE_BOOL => {
            let b = read_exact(buf, cursor, 1)?[0];
            Ok(BinResult::Bool(b != 0))
        }
        NODE_ARRAY => {
            let count = read_u32(buf, cursor)? as usize;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(decode_node(buf, cursor)?);
            }
            Ok(BinResult::Array(items))
        }
        NODE_HASH => {
            let count = read_u32(buf, cursor)? as usize;
            let mut map = HashMap::with_capacity(count);
            for _ in 0..count {
                let key_len = read_exact(buf, cursor, 1)?[0] as usize;
                let key_bytes = read_exact(buf, cursor, key_len)?;
                let key = String::from_utf8(key_bytes.to_vec()).map_err(|_| WireError::Malformed(*cursor))?;
                let value = decode_node(buf, cursor)?;
                map.insert(key, value);
            }
            Ok(BinResult::Hash(map))
        }
        _ => Err(WireError::Malformed(*cursor - 1)),
    }
}

fn read_exact<'a>(buf: &'a [u8], cursor: &mut usize, len: usize) -> Result<&'a [u8], WireError> {
    let end = cursor.checked_add(len).ok_or(WireError::Malformed(*cursor))?;
    let slice = buf.get(*cursor..end).ok_or(WireError::Malformed(*cursor))?;
    *cursor = end;
    Ok(slice)
}

fn read_u32(buf: &[u8], cursor: &mut usize) -> Result<u32, WireError> {
    let bytes = read_exact(buf, cursor, 4)?;
    Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
}

/// Encodes a [`BinResult`] back to bytes — used by tests to build fixture
/// response frames without a real server.
pub fn encode_result(value: &BinResult) -> Vec<u8> {
    let mut out = Vec::new();
    encode_node(value, &mut out);
    out
}

fn encode_node(value: &BinResult, out: &mut Vec<u8>) {
    match value {
        BinResult::Num(n) => {
            out.push(NODE_NUM);
            out.extend_from_slice(&n.to_le_bytes());
        }
        BinResult::Str(s) => {
            out.push(NODE_STR);
            out.extend_from_slice(&(s.len() as u32).to_le_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        BinResult::Bool(b) => {
            out.push(NODE_BOOL);
            out.push(if *b { 1 } else { 0 });
        }
        BinResult::Array(items) => {
            out.push(NODE_ARRAY);
            out.extend_from_slice(&(items.len() as u32).to_le_bytes());
            for item in items {
                encode_node(item, out);
            }
        }
        BinResult::Hash(map) => {
            out.push(NODE_HASH);
            out.extend_from_slice(&(map.len() as u32).to_le_bytes());
            for (key, value) in map {
                out.push(key.len() as u8);
                out.extend_from_slice(key.as_bytes());
                encode_node(value, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_frame_has_correct_length_prefix() {
        let frame = encode_request("userinfo", &[]).unwrap();
        let declared = u32::from_le_bytes(frame[0..4].try_into().unwrap()) as usize;
        assert_eq!(declared, frame.len() - 4);
    }

    #[test]
    fn request_frame_encodes_params_in_order() {
        let params = vec![BinParam::number("timeformat", 1), BinParam::string("auth", "tok")];
        let frame = encode_request("userinfo", &params).unwrap();
        // command-name length + name
        assert_eq!(frame[4], 8);
        assert_eq!(&frame[5..13], b"userinfo");
        // param count
        assert_eq!(frame[13], 2);
    }

    #[test]
    fn response_round_trips_through_encode_and_decode() {
        let mut hash = HashMap::new();
        hash.insert("result".to_string(), BinResult::Num(0));
        hash.insert(
            "files".to_string(),
            BinResult::Array(vec![BinResult::Str("a.txt".to_string()), BinResult::Bool(true)]),
        );
        let value = BinResult::Hash(hash);
        let bytes = encode_result(&value);
        let decoded = decode_response(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn truncated_response_is_malformed_not_a_panic() {
        let bytes = [NODE_STR, 5, 0, 0, 0, b'h', b'i']; // declares 5 bytes, only 2 present
        assert!(decode_response(&bytes).is_err());
    }
}
