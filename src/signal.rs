//! Single-slot mailbox between asynchronous signal handlers and the event loop.
//!
//! A delivered signal overwrites the slot; nothing is queued. The loop only ever sees the most
//! recent signal that arrived since it last looked.

use log::*;
use signal_hook::consts::signal::*;
use static_assertions::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Error, ErrorKind};

/// What a delivered signal asks the bridge to do.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(usize)]
pub enum SignalKind {
    /// Nothing was delivered.
    None = 0,

    /// Shut down now (`SIGINT`, `SIGHUP`, `SIGTERM`).
    Terminate = 1,

    /// Report the link RSSI (`SIGUSR1`).
    RssiQuery = 2,
}

impl SignalKind {
    fn from_usize(v: usize) -> Self {
        match v {
            1 => Self::Terminate,
            2 => Self::RssiQuery,
            _ => Self::None,
        }
    }

    /// Maps an OS signal number to the action it requests.
    pub fn from_signal(signal: i32) -> Self {
        match signal {
            SIGINT | SIGHUP | SIGTERM => Self::Terminate,
            SIGUSR1 => Self::RssiQuery,
            _ => Self::None,
        }
    }
}

/// Signals routed into the latch by [`SignalLatch::install`].
// SIGKILL can't be caught, SIGTERM stands in for it.
pub const HANDLED_SIGNALS: &[i32] = &[SIGINT, SIGHUP, SIGTERM, SIGUSR1];

#[derive(Clone, Debug, Default)]
pub struct SignalLatch(Arc<AtomicUsize>);

assert_impl_all!(SignalLatch: Send, Sync);

impl SignalLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers handlers for [`HANDLED_SIGNALS`] that store into this latch.
    ///
    /// The handlers only perform an atomic store.
    pub fn install(&self) -> Result<(), Error> {
        for &signal in HANDLED_SIGNALS {
            let kind = SignalKind::from_signal(signal);
            signal_hook::flag::register_usize(signal, Arc::clone(&self.0), kind as usize)
                .map_err(|e| Error::new(ErrorKind::Signal,
                    format!("couldn't install handler for signal {}: {}", signal, e)))?;
            trace!("routing signal {} to {:?}", signal, kind);
        }
        Ok(())
    }

    pub fn notify(&self, kind: SignalKind) {
        self.0.store(kind as usize, Ordering::SeqCst);
    }

    /// Returns the last delivered signal without consuming it.
    pub fn peek(&self) -> SignalKind {
        SignalKind::from_usize(self.0.load(Ordering::SeqCst))
    }

    /// Returns the last delivered signal and empties the slot.
    pub fn take(&self) -> SignalKind {
        SignalKind::from_usize(self.0.swap(SignalKind::None as usize, Ordering::SeqCst))
    }
}
