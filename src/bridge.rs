//! The event loop joining the command stream, the link and signals.

mod command;
mod report;

use enumflags2::BitFlags;
use log::*;
use std::io::{self, Read, Write};

use crate::codec;
use crate::config::{BridgeConfig, RSSI_UNAVAILABLE};
use crate::link::Link;
use crate::poll::{Multiplexer, Source, Sources, Wake};
use crate::signal::{SignalKind, SignalLatch};

pub use command::CommandReader;
pub use report::Reporter;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum State {
    Running,
    Terminated,
}

/// Why the loop stopped.
#[derive(Debug)]
pub enum Termination {
    /// A termination-class signal was delivered.
    Signal,

    /// The peer closed the channel.
    PeerClosed,

    /// Reading the channel failed.
    LinkError(io::Error),
}

pub struct Bridge<L, M, C, W> {
    config: BridgeConfig,
    link: L,
    mux: M,
    commands: CommandReader<C>,
    report: Reporter<W>,
    latch: SignalLatch,
    interest: BitFlags<Source>,
    packet: Box<[u8]>,
    state: State,
}

impl<L, M, C, W> Bridge<L, M, C, W>
    where L: Link,
          M: Multiplexer,
          C: Read,
          W: Write,
{
    pub fn new(config: BridgeConfig, link: L, mux: M, commands: C, out: W, latch: SignalLatch)
        -> Self
    {
        let packet = vec![0; config.max_packet_len].into_boxed_slice();
        Self {
            config,
            link,
            mux,
            commands: CommandReader::new(commands),
            report: Reporter::new(out),
            latch,
            interest: BitFlags::all(),
            packet,
            state: State::Running,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Runs until terminated, then closes the link and reports the disconnect.
    pub fn run(mut self) -> Termination {
        let termination = loop {
            if let Some(t) = self.step() {
                break t;
            }
        };
        info!("loop terminated: {:?}", termination);
        self.link.close();
        self.report.disconnect();
        info!("disconnect");
        termination
    }

    /// Performs one iteration: a bounded wait followed by whatever it calls for.
    ///
    /// Returns `Some` on the step that transitions the bridge to [`State::Terminated`]. The link
    /// isn't closed here, see [`run`](Self::run). Once terminated, this does nothing and returns
    /// `None`.
    pub fn step(&mut self) -> Option<Termination> {
        if self.state == State::Terminated {
            return None;
        }
        let r = self.step0();
        if r.is_some() {
            self.state = State::Terminated;
        }
        r
    }

    fn step0(&mut self) -> Option<Termination> {
        let wake = match self.mux.wait(self.interest, self.config.tick) {
            Ok(v) => v,
            Err(e) => {
                warn!("wait failed: {}", e);
                Wake::Interrupted
            }
        };
        trace!("wake: {:?}", wake);

        match self.latch.take() {
            SignalKind::Terminate => {
                info!("termination signal received");
                return Some(Termination::Signal);
            }
            SignalKind::RssiQuery => {
                let rssi = self.query_rssi();
                self.report.rssi(rssi);
            }
            SignalKind::None => {}
        }

        if let Wake::Ready(ready) = wake {
            if ready.contains(Source::Command) {
                self.on_command_ready();
            }
            if ready.contains(Source::Link) {
                return self.on_link_ready();
            }
        }
        None
    }

    /// Polls the controller until it reports a value, or gives up with [`RSSI_UNAVAILABLE`].
    fn query_rssi(&mut self) -> i8 {
        let handle = self.link.connection_handle();
        for attempt in 1..=self.config.rssi_attempts {
            if let Some(v) = self.link.read_rssi(handle, self.config.rssi_attempt_timeout) {
                debug!("RSSI for handle {} after {} attempt(s): {}", handle, attempt, v);
                return v;
            }
        }
        warn!("RSSI for handle {} unavailable after {} attempts", handle,
            self.config.rssi_attempts);
        RSSI_UNAVAILABLE
    }

    fn on_command_ready(&mut self) {
        match self.commands.fill() {
            Ok(0) => {
                info!("command stream closed");
                self.interest.remove(Source::Command);
                debug!("now waiting on {:?}", Sources(self.interest));
            }
            Ok(_) => {
                while let Some(line) = self.commands.next_line() {
                    self.send(&line);
                }
            }
            Err(e) if is_transient(&e) => {}
            Err(e) => {
                error!("couldn't read command stream: {}", e);
                self.interest.remove(Source::Command);
            }
        }
    }

    fn send(&mut self, line: &[u8]) {
        let bytes = match codec::decode_line(line) {
            Ok(v) => v,
            Err(e) => {
                warn!("discarding command {:?}: {}", String::from_utf8_lossy(line), e);
                return;
            }
        };
        if bytes.is_empty() {
            return;
        }
        match self.link.write(&bytes) {
            Ok(n) if n < bytes.len() => {
                warn!("partial write: {} of {} B: {}", n, bytes.len(), codec::encode(&bytes));
            }
            Ok(n) => debug!("wrote {} B: {}", n, codec::encode(&bytes)),
            Err(e) => warn!("write of {} B failed: {}", bytes.len(), e),
        }
    }

    fn on_link_ready(&mut self) -> Option<Termination> {
        match self.link.read(&mut self.packet) {
            Ok(0) => {
                info!("peer closed the channel");
                Some(Termination::PeerClosed)
            }
            Ok(n) => {
                self.report.data(&self.packet[..n]);
                None
            }
            Err(e) if is_transient(&e) => None,
            Err(e) => {
                error!("link read failed: {}", e);
                Some(Termination::LinkError(e))
            }
        }
    }
}

fn is_transient(e: &io::Error) -> bool {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => true,
        _ => false,
    }
}
