//! BlueZ socket ABI and the few raw system calls `libc` and `socket2` don't wrap.

use std::io::{self, Read};
use std::mem;
use std::os::raw::*;
use std::os::unix::io::{AsRawFd, RawFd};

pub const AF_BLUETOOTH: c_int = 31;
pub const BTPROTO_L2CAP: c_int = 0;
pub const BTPROTO_HCI: c_int = 1;

pub const SOL_HCI: c_int = 0;
pub const SOL_L2CAP: c_int = 6;
pub const HCI_FILTER: c_int = 2;
pub const L2CAP_CONNINFO: c_int = 2;

pub const HCI_CHANNEL_RAW: u16 = 0;

/// Fixed L2CAP channel of the Attribute Protocol.
pub const ATT_CID: u16 = 4;

pub const HCI_COMMAND_PKT: u8 = 0x01;
pub const HCI_EVENT_PKT: u8 = 0x04;
pub const HCI_EV_CMD_COMPLETE: u8 = 0x0e;
pub const HCI_EV_CMD_STATUS: u8 = 0x0f;

pub const fn hci_opcode(ogf: u16, ocf: u16) -> u16 {
    (ogf << 10) | ocf
}

pub const HCI_OP_READ_RSSI: u16 = hci_opcode(0x05, 0x0005);

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct SockaddrL2 {
    pub l2_family: libc::sa_family_t,
    pub l2_psm: u16,
    pub l2_bdaddr: [u8; 6],
    pub l2_cid: u16,
    pub l2_bdaddr_type: u8,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct SockaddrHci {
    pub hci_family: libc::sa_family_t,
    pub hci_dev: u16,
    pub hci_channel: u16,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct L2capConnInfo {
    pub hci_handle: u16,
    pub dev_class: [u8; 3],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct HciFilter {
    pub type_mask: u32,
    pub event_mask: [u32; 2],
    pub opcode: u16,
}

impl HciFilter {
    /// Filter passing command complete/status events for `opcode` only.
    pub fn command_response(opcode: u16) -> Self {
        let mut r = Self::default();
        r.type_mask = 1 << HCI_EVENT_PKT;
        for &ev in &[HCI_EV_CMD_COMPLETE, HCI_EV_CMD_STATUS] {
            r.event_mask[(ev >> 5) as usize] |= 1 << (ev & 31);
        }
        r.opcode = opcode.to_le();
        r
    }
}

pub fn bind<T>(fd: RawFd, addr: &T) -> io::Result<()> {
    syscall!(bind(fd, addr as *const T as *const libc::sockaddr,
        mem::size_of::<T>() as libc::socklen_t))?;
    Ok(())
}

pub fn connect<T>(fd: RawFd, addr: &T) -> io::Result<()> {
    syscall!(connect(fd, addr as *const T as *const libc::sockaddr,
        mem::size_of::<T>() as libc::socklen_t))?;
    Ok(())
}

pub fn setsockopt<T>(fd: RawFd, level: c_int, name: c_int, value: &T) -> io::Result<()> {
    syscall!(setsockopt(fd, level, name, value as *const T as *const c_void,
        mem::size_of::<T>() as libc::socklen_t))?;
    Ok(())
}

pub fn getsockopt<T: Default>(fd: RawFd, level: c_int, name: c_int) -> io::Result<T> {
    let mut value = T::default();
    let mut len = mem::size_of::<T>() as libc::socklen_t;
    syscall!(getsockopt(fd, level, name, &mut value as *mut T as *mut c_void, &mut len))?;
    Ok(value)
}

/// Asks the kernel to deliver `signal` to this process when its parent exits.
pub fn set_parent_death_signal(signal: c_int) -> io::Result<()> {
    syscall!(prctl(libc::PR_SET_PDEATHSIG, signal as c_ulong, 0 as c_ulong, 0 as c_ulong,
        0 as c_ulong))?;
    Ok(())
}

/// Unbuffered standard input.
///
/// `std::io::Stdin` buffers internally, which hides pending lines from `poll(2)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawStdin;

impl Read for RawStdin {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = syscall!(read(libc::STDIN_FILENO, buf.as_mut_ptr() as *mut c_void, buf.len()))?;
        Ok(n as usize)
    }
}

impl AsRawFd for RawStdin {
    fn as_raw_fd(&self) -> RawFd {
        libc::STDIN_FILENO
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn abi_sizes() {
        assert_eq!(mem::size_of::<SockaddrL2>(), 14);
        assert_eq!(mem::size_of::<SockaddrHci>(), 6);
        assert_eq!(mem::size_of::<L2capConnInfo>(), 6);
        assert_eq!(mem::size_of::<HciFilter>(), 16);
    }

    #[test]
    fn read_rssi_opcode() {
        assert_eq!(HCI_OP_READ_RSSI, 0x1405);
    }

    #[test]
    fn command_response_filter() {
        let f = HciFilter::command_response(HCI_OP_READ_RSSI);
        assert_eq!(f.type_mask, 0x10);
        assert_eq!(f.event_mask, [(1 << 0x0e) | (1 << 0x0f), 0]);
        assert_eq!(u16::from_le(f.opcode), 0x1405);
    }
}
