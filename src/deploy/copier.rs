//! Interruptible bounded-buffer stream copy.

use std::io::{Read, Write};

use crate::constants::TRANSFER_BUFFER_SIZE;
use crate::deploy::CancelToken;
use crate::error::DeployError;

/// Copy `reader` into `writer` through a fixed 1MB buffer, polling the
/// cancellation gate before every read.
///
/// On cancellation the pending buffer is not written and
/// [`DeployError::Interrupted`] is returned; a partially written
/// destination is left in place, not deleted or truncated. Local read
/// failures map to [`DeployError::Io`], remote write and flush failures to
/// [`DeployError::Protocol`]. The destination is flushed on normal
/// completion and the number of bytes copied is returned.
pub fn copy_stream(
    reader: &mut dyn Read,
    writer: &mut dyn Write,
    gate: &CancelToken,
) -> Result<u64, DeployError> {
    let mut buffer = vec![0u8; TRANSFER_BUFFER_SIZE];
    let mut copied = 0u64;
    loop {
        if gate.is_cancelled() {
            return Err(DeployError::Interrupted);
        }
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        writer
            .write_all(&buffer[..read])
            .map_err(|err| DeployError::Protocol(format!("remote write failed: {err}")))?;
        copied += read as u64;
    }
    writer
        .flush()
        .map_err(|err| DeployError::Protocol(format!("remote flush failed: {err}")))?;
    Ok(copied)
}
