// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin client for the admin Unix socket: one request, one response, per
//! connection. `casarectl` is stateless between invocations, so there is no
//! connection pooling to worry about.

use std::path::Path;

use casare_wire::{read_message, write_message, AdminRequest, AdminResponse, ProtocolError};
use tokio::net::UnixStream;

use crate::exit_error::ExitError;

pub async fn send(socket_path: &Path, request: AdminRequest) -> Result<AdminResponse, ExitError> {
    let mut stream = UnixStream::connect(socket_path).await.map_err(|err| {
        ExitError::new(2, format!("failed to connect to daemon at {}: {err}", socket_path.display()))
    })?;
    write_message(&mut stream, &request).await.map_err(protocol_error)?;
    let response: AdminResponse = read_message(&mut stream).await.map_err(protocol_error)?;
    Ok(response)
}

fn protocol_error(err: ProtocolError) -> ExitError {
    ExitError::new(2, format!("admin protocol error: {err}"))
}
