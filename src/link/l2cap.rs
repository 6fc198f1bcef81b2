use log::*;
use socket2::{Domain, Protocol, Socket, Type};
use static_assertions::*;
use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

use crate::config::LinkConfig;
use crate::error::Error;
use crate::platform::*;
use super::*;

/// ATT channel to a peripheral over a BlueZ `SOCK_SEQPACKET` L2CAP socket.
#[derive(Debug)]
pub struct L2capLink {
    socket: Option<Socket>,
    hci: Option<HciSocket>,
    address: Address,
    address_type: AddressType,
    handle: ConnectionHandle,
}

assert_impl_all!(L2capLink: Send, Sync);

impl L2capLink {
    /// Creates the L2CAP socket and opens the HCI controller used for RSSI queries.
    ///
    /// Only socket creation can fail; a missing controller just leaves RSSI unavailable.
    pub fn new(config: &LinkConfig) -> Result<Self, Error> {
        let socket = Socket::new(Domain::from(AF_BLUETOOTH), Type::from(libc::SOCK_SEQPACKET),
            Some(Protocol::from(BTPROTO_L2CAP)))
            .map_err(|e| Error::from_io(e, "couldn't create L2CAP socket"))?;
        let hci = match HciSocket::open(config.hci_dev) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("couldn't open hci{}, RSSI won't be available: {}", config.hci_dev, e);
                None
            }
        };
        Ok(Self {
            socket: Some(socket),
            hci,
            address: config.address,
            address_type: config.address_type,
            handle: ConnectionHandle::default(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Binds the local end to the ATT channel of any adapter.
    pub fn bind(&self) -> Result<(), Error> {
        let addr = SockaddrL2 {
            l2_family: AF_BLUETOOTH as libc::sa_family_t,
            l2_cid: ATT_CID.to_le(),
            ..Default::default()
        };
        let r = bind(self.fd()?, &addr).map_err(|e| Error::from_io(e, "bind"));
        match &r {
            Ok(()) => info!("bind success"),
            Err(e) => warn!("{}", e),
        }
        r
    }

    /// Connects to the peer's ATT channel and records the connection handle.
    ///
    /// Blocks until the controller establishes the link. The socket is non-blocking afterwards.
    pub fn connect(&mut self) -> Result<(), Error> {
        let fd = self.fd()?;
        let addr = SockaddrL2 {
            l2_family: AF_BLUETOOTH as libc::sa_family_t,
            l2_bdaddr: self.address.to_bdaddr(),
            l2_cid: ATT_CID.to_le(),
            l2_bdaddr_type: self.address_type as u8,
            ..Default::default()
        };
        info!("connecting to {} ({:?})", self.address, self.address_type);
        connect(fd, &addr).map_err(|e| Error::from_io(e, "connect"))?;

        match getsockopt::<L2capConnInfo>(fd, SOL_L2CAP, L2CAP_CONNINFO) {
            Ok(info) => self.handle = ConnectionHandle(info.hci_handle),
            Err(e) => warn!("couldn't read connection handle: {}", e),
        }
        debug!("connected to {}, handle {}", self.address, self.handle);

        if let Some(socket) = &self.socket {
            socket.set_nonblocking(true).map_err(|e| Error::from_io(e, "set_nonblocking"))?;
        }
        Ok(())
    }

    fn socket(&self) -> io::Result<&Socket> {
        self.socket.as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "link is closed"))
    }

    fn fd(&self) -> io::Result<RawFd> {
        Ok(self.socket()?.as_raw_fd())
    }
}

impl AsRawFd for L2capLink {
    /// Returns `-1` once closed, which `poll(2)` ignores.
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_ref().map(|s| s.as_raw_fd()).unwrap_or(-1)
    }
}

impl Link for L2capLink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.socket()?.write(bytes)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket()?.read(buf)
    }

    fn connection_handle(&self) -> ConnectionHandle {
        self.handle
    }

    fn read_rssi(&mut self, handle: ConnectionHandle, timeout: Duration) -> Option<i8> {
        let hci = self.hci.as_ref()?;
        match hci.read_rssi(handle, timeout) {
            Ok(0) => None,
            Ok(v) => Some(v),
            Err(e) => {
                debug!("hci{}: RSSI for handle {} not available: {}", hci.dev_id(), handle, e);
                None
            }
        }
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            debug!("closed L2CAP socket to {}", self.address);
        }
        self.hci = None;
    }
}
