use static_assertions::*;
use std::time::Duration;

use crate::link::{Address, AddressType};

/// Largest packet read from the link in one go.
pub const MAX_PACKET_LEN: usize = 256;

/// RSSI reported when the controller never produced a value.
pub const RSSI_UNAVAILABLE: i8 = 127;

/// What to do when binding or connecting the link fails.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ConnectPolicy {
    /// Report the failure and exit.
    FailFast,

    /// Report the failure and run the event loop anyway; the first link read ends it.
    KeepGoing,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self::FailFast
    }
}

/// Event loop tuning.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    pub(in crate) tick: Duration,
    pub(in crate) rssi_attempts: u32,
    pub(in crate) rssi_attempt_timeout: Duration,
    pub(in crate) max_packet_len: usize,
}

assert_impl_all!(BridgeConfig: Send, Sync);

impl BridgeConfig {
    /// Upper bound of a single readiness wait.
    pub fn tick(&self) -> Duration {
        self.tick
    }

    pub fn rssi_attempts(&self) -> u32 {
        self.rssi_attempts
    }

    pub fn rssi_attempt_timeout(&self) -> Duration {
        self.rssi_attempt_timeout
    }

    pub fn max_packet_len(&self) -> usize {
        self.max_packet_len
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfigBuilder::new().build()
    }
}

pub struct BridgeConfigBuilder {
    tick: Duration,
    rssi_attempts: u32,
    rssi_attempt_timeout: Duration,
    max_packet_len: usize,
}

impl BridgeConfigBuilder {
    pub fn new() -> Self {
        Self {
            tick: Duration::from_secs(1),
            rssi_attempts: 100,
            rssi_attempt_timeout: Duration::from_millis(1000),
            max_packet_len: MAX_PACKET_LEN,
        }
    }

    pub fn tick(&mut self, v: Duration) -> &mut Self {
        self.tick = v;
        self
    }

    pub fn rssi_attempts(&mut self, v: u32) -> &mut Self {
        self.rssi_attempts = v.max(1);
        self
    }

    pub fn rssi_attempt_timeout(&mut self, v: Duration) -> &mut Self {
        self.rssi_attempt_timeout = v;
        self
    }

    pub fn max_packet_len(&mut self, v: usize) -> &mut Self {
        self.max_packet_len = v.max(1);
        self
    }

    pub fn build(&self) -> BridgeConfig {
        BridgeConfig {
            tick: self.tick,
            rssi_attempts: self.rssi_attempts,
            rssi_attempt_timeout: self.rssi_attempt_timeout,
            max_packet_len: self.max_packet_len,
        }
    }
}

/// Where and how to connect.
#[derive(Clone, Debug)]
pub struct LinkConfig {
    pub address: Address,
    pub address_type: AddressType,
    /// Index of the local HCI controller (`hciN`).
    pub hci_dev: u16,
    pub connect_policy: ConnectPolicy,
}

impl LinkConfig {
    pub fn new(address: Address, address_type: AddressType) -> Self {
        Self {
            address,
            address_type,
            hci_dev: 0,
            connect_policy: ConnectPolicy::default(),
        }
    }
}
