use log::*;
use std::fmt;
use std::io::Write;

use crate::codec;
use crate::error::Error;

/// Writes the line protocol consumed by the host process.
///
/// Every line is flushed as soon as it's written. Write failures are logged and otherwise
/// ignored since there's nobody left to tell.
pub struct Reporter<W> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
        }
    }

    /// `connect success` or `connect <reason>`, where the reason is the bare OS error text.
    pub fn connect(&mut self, result: &Result<(), Error>) {
        match result {
            Ok(()) => self.line(format_args!("connect success")),
            Err(e) => self.line(format_args!("connect {}", e.reason())),
        }
    }

    /// `data <hex>`.
    pub fn data(&mut self, packet: &[u8]) {
        self.line(format_args!("data {}", codec::encode(packet)))
    }

    /// `rssi = <value>`.
    pub fn rssi(&mut self, rssi: i8) {
        self.line(format_args!("rssi = {}", rssi))
    }

    pub fn disconnect(&mut self) {
        self.line(format_args!("disconnect"))
    }

    fn line(&mut self, args: fmt::Arguments) {
        let r = self.out.write_fmt(args)
            .and_then(|_| self.out.write_all(b"\n"))
            .and_then(|_| self.out.flush());
        if let Err(e) = r {
            warn!("couldn't write to output: {}", e);
        }
    }
}
