// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

//! Bearer-token authentication for worker registration and relay calls.
//! Grounded on the teacher's `transport/auth.rs::constant_time_eq` and
//! `validate_bearer`.

use tonic::metadata::MetadataMap;
use tonic::Status;

/// Constant-time string comparison to prevent timing side-channel attacks.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

/// Validate the `authorization: Bearer <token>` header against `expected`.
/// `expected == None` means auth is disabled for that worker and every
/// request passes.
pub fn validate_bearer(metadata: &MetadataMap, expected: Option<&str>) -> Result<(), Status> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let header = metadata
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Status::unauthenticated("missing authorization header"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| Status::unauthenticated("authorization header is not a bearer token"))?;

    if constant_time_eq(token, expected) {
        Ok(())
    } else {
        Err(Status::unauthenticated("bearer token does not match"))
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
