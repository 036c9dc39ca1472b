// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

use super::*;
use tonic::metadata::MetadataMap;

fn metadata_with_bearer(token: &str) -> MetadataMap {
    let mut md = MetadataMap::new();
    md.insert("authorization", format!("Bearer {token}").parse().unwrap());
    md
}

#[test]
fn constant_time_eq_matches_equal_strings() {
    assert!(constant_time_eq("secret", "secret"));
}

#[test]
fn constant_time_eq_rejects_different_lengths() {
    assert!(!constant_time_eq("short", "shorter"));
}

#[test]
fn constant_time_eq_rejects_same_length_mismatch() {
    assert!(!constant_time_eq("abcdef", "abcxyz"));
}

#[test]
fn validate_bearer_passes_when_auth_disabled() {
    let md = MetadataMap::new();
    assert!(validate_bearer(&md, None).is_ok());
}

#[test]
fn validate_bearer_accepts_matching_token() {
    let md = metadata_with_bearer("s3cret");
    assert!(validate_bearer(&md, Some("s3cret")).is_ok());
}

#[test]
fn validate_bearer_rejects_missing_header() {
    let md = MetadataMap::new();
    assert!(validate_bearer(&md, Some("s3cret")).is_err());
}

#[test]
fn validate_bearer_rejects_wrong_token() {
    let md = metadata_with_bearer("wrong");
    assert!(validate_bearer(&md, Some("s3cret")).is_err());
}

#[test]
fn validate_bearer_rejects_non_bearer_scheme() {
    let mut md = MetadataMap::new();
    md.insert("authorization", "Basic s3cret".parse().unwrap());
    assert!(validate_bearer(&md, Some("s3cret")).is_err());
}
