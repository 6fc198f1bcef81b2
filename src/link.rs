//! The duplex channel to the peripheral.

mod addr;
mod hci;
mod l2cap;

use std::fmt;
use std::io;
use std::time::Duration;

pub use addr::{Address, AddressType};
pub use hci::HciSocket;
pub use l2cap::L2capLink;

/// Identifies an established LE connection on the local controller.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ConnectionHandle(pub u16);

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// Capabilities of a connected channel used by the event loop.
pub trait Link {
    /// Sends one packet. Returns how many bytes the channel accepted, which may be fewer than
    /// `bytes.len()`. Callers decide whether to retry.
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Receives one packet into `buf`. `Ok(0)` means the peer closed the channel.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn connection_handle(&self) -> ConnectionHandle;

    /// Makes a single RSSI query bounded by `timeout`.
    /// `None` means the value isn't available (yet).
    fn read_rssi(&mut self, handle: ConnectionHandle, timeout: Duration) -> Option<i8>;

    /// Releases the channel.
    fn close(&mut self);
}
