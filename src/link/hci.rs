use log::*;
use socket2::{Domain, Protocol, Socket, Type};
use static_assertions::*;
use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;
use std::time::{Duration, Instant};

use crate::platform::*;
use super::ConnectionHandle;

/// Raw HCI socket bound to a local controller, used for link-layer queries.
#[derive(Debug)]
pub struct HciSocket {
    socket: Socket,
    dev_id: u16,
}

assert_impl_all!(HciSocket: Send, Sync);

impl HciSocket {
    pub fn open(dev_id: u16) -> io::Result<Self> {
        let socket = Socket::new(Domain::from(AF_BLUETOOTH), Type::RAW,
            Some(Protocol::from(BTPROTO_HCI)))?;
        bind(socket.as_raw_fd(), &SockaddrHci {
            hci_family: AF_BLUETOOTH as libc::sa_family_t,
            hci_dev: dev_id,
            hci_channel: HCI_CHANNEL_RAW,
        })?;
        debug!("opened hci{}", dev_id);
        Ok(Self {
            socket,
            dev_id,
        })
    }

    pub fn dev_id(&self) -> u16 {
        self.dev_id
    }

    /// Issues HCI Read RSSI for `handle` and waits up to `timeout` for the answer.
    pub fn read_rssi(&self, handle: ConnectionHandle, timeout: Duration) -> io::Result<i8> {
        let ret = self.request(HCI_OP_READ_RSSI, &handle.0.to_le_bytes(), timeout)?;
        parse_read_rssi(&ret)
    }

    /// Sends a command and returns the return parameters of its Command Complete event.
    fn request(&self, opcode: u16, params: &[u8], timeout: Duration) -> io::Result<Vec<u8>> {
        setsockopt(self.socket.as_raw_fd(), SOL_HCI, HCI_FILTER,
            &HciFilter::command_response(opcode))?;

        let mut cmd = Vec::with_capacity(4 + params.len());
        cmd.push(HCI_COMMAND_PKT);
        cmd.extend_from_slice(&opcode.to_le_bytes());
        cmd.push(params.len() as u8);
        cmd.extend_from_slice(params);
        (&self.socket).write_all(&cmd)?;

        let deadline = Instant::now() + timeout;
        let mut buf = [0; 260];
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(timed_out(opcode));
            }
            self.socket.set_read_timeout(Some((deadline - now).max(Duration::from_millis(1))))?;
            let n = match (&self.socket).read(&mut buf) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::TimedOut => return Err(timed_out(opcode)),
                Err(e) => return Err(e),
            };
            if let Some(ret) = match_response(opcode, &buf[..n])? {
                return Ok(ret);
            }
        }
    }
}

fn timed_out(opcode: u16) -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, format!("HCI command 0x{:04x} timed out", opcode))
}

/// Checks whether `pkt` answers the command `opcode`.
///
/// Returns the return parameters for a matching Command Complete, an error for a failed
/// Command Status and `None` for anything else.
fn match_response(opcode: u16, pkt: &[u8]) -> io::Result<Option<Vec<u8>>> {
    if pkt.len() < 3 || pkt[0] != HCI_EVENT_PKT {
        return Ok(None);
    }
    let body = &pkt[3..];
    match pkt[1] {
        HCI_EV_CMD_COMPLETE if body.len() >= 3 => {
            if u16::from_le_bytes([body[1], body[2]]) == opcode {
                return Ok(Some(body[3..].to_vec()));
            }
        }
        HCI_EV_CMD_STATUS if body.len() >= 4 => {
            let status = body[0];
            if u16::from_le_bytes([body[2], body[3]]) == opcode && status != 0 {
                return Err(io::Error::new(io::ErrorKind::Other,
                    format!("HCI command 0x{:04x} failed with status 0x{:02x}", opcode, status)));
            }
        }
        _ => {}
    }
    Ok(None)
}

/// Parses `status, handle (le16), rssi (i8)`.
fn parse_read_rssi(ret: &[u8]) -> io::Result<i8> {
    if ret.len() < 4 {
        return Err(io::Error::new(io::ErrorKind::InvalidData,
            format!("Read RSSI response is too short: {}", ret.len())));
    }
    if ret[0] != 0 {
        return Err(io::Error::new(io::ErrorKind::Other,
            format!("Read RSSI failed with status 0x{:02x}", ret[0])));
    }
    Ok(ret[3] as i8)
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn match_response_() {
        let op = HCI_OP_READ_RSSI;

        assert_eq!(match_response(op, &hex!("040e07010514004000c4")).unwrap(),
            Some(hex!("004000c4").to_vec()));

        // Other opcode, other event, ACL data and runt packets are skipped.
        assert_eq!(match_response(op, &hex!("040e0401030c00")).unwrap(), None);
        assert_eq!(match_response(op, &hex!("0405040040001300")).unwrap(), None);
        assert_eq!(match_response(op, &hex!("0240000000")).unwrap(), None);
        assert_eq!(match_response(op, &hex!("040e")).unwrap(), None);

        assert_eq!(match_response(op, &hex!("040f0400010514")).unwrap(), None);
        assert!(match_response(op, &hex!("040f0402010514")).is_err());
    }

    #[test]
    fn parse_read_rssi_() {
        assert_eq!(parse_read_rssi(&hex!("004000c4")).unwrap(), -60);
        assert_eq!(parse_read_rssi(&hex!("00400000")).unwrap(), 0);
        assert!(parse_read_rssi(&hex!("02400000")).is_err());
        assert!(parse_read_rssi(&hex!("0040")).is_err());
    }
}
