//! Structural gate for bearer tokens.
//!
//! Runs before any JWT parsing so that oversized or malformed input is rejected
//! without base64/JSON work. Counting is done over bytes without splitting into
//! owned parts.

/// Whole token, in bytes.
pub const MAX_TOKEN_LEN: usize = 10 * 1024;
/// Header segment, in bytes.
pub const MAX_HEADER_LEN: usize = 1024;
/// Payload segment, in bytes.
pub const MAX_PAYLOAD_LEN: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenShapeError {
    #[error("token exceeds {max} bytes (got {len})")]
    TooLong { len: usize, max: usize },
    #[error("token is empty")]
    Empty,
    #[error("expected 2 segment separators, found {0}")]
    SegmentCount(usize),
    #[error("header segment exceeds {} bytes", MAX_HEADER_LEN)]
    HeaderTooLong,
    #[error("payload segment exceeds {} bytes", MAX_PAYLOAD_LEN)]
    PayloadTooLong,
    #[error("signature segment exceeds {} bytes", MAX_TOKEN_LEN)]
    SignatureTooLong,
    #[error("empty segment")]
    EmptySegment,
}

/// Check that `token` looks like `header.payload.signature` within size bounds.
pub fn check(token: &str) -> Result<(), TokenShapeError> {
    if token.len() > MAX_TOKEN_LEN {
        return Err(TokenShapeError::TooLong {
            len: token.len(),
            max: MAX_TOKEN_LEN,
        });
    }
    if token.is_empty() {
        return Err(TokenShapeError::Empty);
    }

    let dots = token.bytes().filter(|b| *b == b'.').count();
    if dots != 2 {
        return Err(TokenShapeError::SegmentCount(dots));
    }

    // Exactly two dots, so both splits succeed.
    let (header, rest) = token
        .split_once('.')
        .ok_or(TokenShapeError::SegmentCount(dots))?;
    let (payload, signature) = rest
        .split_once('.')
        .ok_or(TokenShapeError::SegmentCount(dots))?;

    if header.len() > MAX_HEADER_LEN {
        return Err(TokenShapeError::HeaderTooLong);
    }
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(TokenShapeError::PayloadTooLong);
    }
    if signature.len() > MAX_TOKEN_LEN {
        return Err(TokenShapeError::SignatureTooLong);
    }
    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        return Err(TokenShapeError::EmptySegment);
    }

    Ok(())
}
