use macaddr::MacAddr6;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorKind};

/// Bluetooth device address.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Address(MacAddr6);

impl Address {
    /// Address in BlueZ `bdaddr_t` layout (least significant byte first).
    pub fn to_bdaddr(&self) -> [u8; 6] {
        let mut r = [0; 6];
        r.copy_from_slice(self.0.as_bytes());
        r.reverse();
        r
    }
}

impl From<MacAddr6> for Address {
    fn from(v: MacAddr6) -> Self {
        Self(v)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<MacAddr6>()
            .map(Self)
            .map_err(|e| Error::new(ErrorKind::InvalidAddress,
                format!("invalid device address `{}`: {}", s, e)))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

/// LE address type of the peer, as understood by `sockaddr_l2.l2_bdaddr_type`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum AddressType {
    Public = 0x01,
    Random = 0x02,
}

impl AddressType {
    /// `"random"` selects [`Random`](Self::Random); anything else is [`Public`](Self::Public).
    pub fn from_arg(s: &str) -> Self {
        if s == "random" {
            Self::Random
        } else {
            Self::Public
        }
    }
}

impl Default for AddressType {
    fn default() -> Self {
        Self::Public
    }
}
