//! Bridges standard I/O to a Bluetooth low energy (LE) peripheral over the L2CAP channel of the
//! Attribute Protocol (ATT) using the Linux BlueZ socket API.
//!
//! The host process talks to the bridge with lines of text:
//!
//! * Each line written to the bridge is a packet in hex (`0a1b00\n`) sent to the peripheral as-is.
//! * Each packet received from the peripheral is printed as `data <hex>`.
//! * On `SIGUSR1` the current link RSSI is printed as `rssi = <dBm>` (`127` if unavailable).
//! * `connect success` / `connect <error>` is printed once on start-up and `disconnect` on exit.
//!
//! Diagnostics are emitted through the [`log`](https://docs.rs/log) facade.
//!
//! # Example
//!
//! ```no_run
//! use l2cap_bridge::*;
//! use l2cap_bridge::config::*;
//! use l2cap_bridge::link::*;
//! use std::os::unix::io::AsRawFd;
//!
//! let latch = SignalLatch::new();
//! latch.install().unwrap();
//!
//! let config = LinkConfig::new("a4:c1:38:c0:03:9e".parse().unwrap(), AddressType::Random);
//! let mut link = L2capLink::new(&config).unwrap();
//! link.bind().unwrap();
//! link.connect().unwrap();
//!
//! let mux = PollMux::new(RawStdin.as_raw_fd(), link.as_raw_fd());
//! let bridge = Bridge::new(BridgeConfig::default(), link, mux, RawStdin, std::io::stdout(), latch);
//! println!("{:?}", bridge.run());
//! ```
#![deny(non_snake_case)]
#![deny(unused_must_use)]

#[macro_use]
mod macros;

pub mod bridge;
pub mod codec;
pub mod config;
pub mod error;
pub mod link;
mod platform;
pub mod poll;
pub mod signal;

use static_assertions::*;

pub use bridge::{Bridge, State, Termination};
pub use config::BridgeConfig;
pub use platform::RawStdin;
pub use poll::PollMux;
pub use signal::{SignalKind, SignalLatch};

assert_impl_all!(error::Error: Send, Sync);
assert_impl_all!(Termination: Send);

/// Makes this process receive `SIGINT` when its parent exits.
pub fn terminate_with_parent() -> Result<(), error::Error> {
    platform::set_parent_death_signal(libc::SIGINT)
        .map_err(|e| error::Error::from_io(e, "prctl(PR_SET_PDEATHSIG)"))
}
