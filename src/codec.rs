//! Conversion between raw packets and the hex text used on stdio.

use crate::error::Error;

/// Encodes bytes as lowercase hex digit pairs without separators.
pub fn encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decodes a command line into bytes.
///
/// Only characters before the first `\n` are considered. A single trailing `\r` is ignored.
/// Digits are case-insensitive. An odd number of digits or any non-hex character is reported as
/// [`ErrorKind::MalformedCommand`](crate::error::ErrorKind::MalformedCommand).
pub fn decode_line(line: &[u8]) -> Result<Vec<u8>, Error> {
    let end = line.iter().position(|&b| b == b'\n').unwrap_or(line.len());
    let mut line = &line[..end];
    if let Some((&b'\r', rest)) = line.split_last() {
        line = rest;
    }
    Ok(hex::decode(line)?)
}
