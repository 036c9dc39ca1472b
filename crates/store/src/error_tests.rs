// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Flowgentic Labs

use super::*;

#[test]
fn grpc_status_maps_each_kind() {
    let cases = [
        (ErrorKind::InvalidArgument, tonic::Code::InvalidArgument),
        (ErrorKind::NotFound, tonic::Code::NotFound),
        (ErrorKind::Unauthenticated, tonic::Code::Unauthenticated),
        (ErrorKind::Unavailable, tonic::Code::Unavailable),
        (ErrorKind::Internal, tonic::Code::Internal),
        (ErrorKind::FailedPrecondition, tonic::Code::FailedPrecondition),
        (ErrorKind::Aborted, tonic::Code::Aborted),
    ];
    for (kind, expected) in cases {
        let err = FlowgenticError::new(kind, "boom");
        assert_eq!(err.to_grpc_status().code(), expected);
    }
}

#[test]
fn no_rows_maps_to_not_found() {
    let err: FlowgenticError = rusqlite::Error::QueryReturnedNoRows.into();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[test]
fn log_levels_match_spec_table() {
    assert!(matches!(ErrorKind::Internal.log_level(), Some(tracing::Level::ERROR)));
    assert!(matches!(ErrorKind::Unavailable.log_level(), Some(tracing::Level::WARN)));
    assert_eq!(ErrorKind::InvalidArgument.log_level(), None);
    assert_eq!(ErrorKind::Aborted.log_level(), None);
}
