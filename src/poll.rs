//! Bounded readiness wait over the command stream and the link channel.

use enumflags2::BitFlags;
use log::*;
use std::fmt;
use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

/// An input the event loop waits on.
#[derive(BitFlags, Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Source {
    Command = 0b01,
    Link = 0b10,
}

/// Formats a set of sources as `Command | Link`.
pub(in crate) struct Sources(pub BitFlags<Source>);

impl fmt::Debug for Sources {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(none)");
        }
        let names: Vec<String> = self.0.iter().map(|s| format!("{:?}", s)).collect();
        f.write_str(&names.join(" | "))
    }
}

/// Why [`Multiplexer::wait`] returned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Wake {
    /// At least one source has data or has hung up.
    Ready(BitFlags<Source>),

    /// The timeout elapsed without activity.
    TimedOut,

    /// A signal interrupted the wait.
    Interrupted,
}

pub trait Multiplexer {
    /// Blocks until one of the `interest` sources is ready, a signal arrives or `timeout` elapses.
    fn wait(&mut self, interest: BitFlags<Source>, timeout: Duration) -> io::Result<Wake>;
}

/// [`Multiplexer`] over two file descriptors using `poll(2)`.
#[derive(Debug)]
pub struct PollMux {
    command: RawFd,
    link: RawFd,
}

impl PollMux {
    pub fn new(command: RawFd, link: RawFd) -> Self {
        Self {
            command,
            link,
        }
    }

    fn fd(&self, source: Source) -> RawFd {
        match source {
            Source::Command => self.command,
            Source::Link => self.link,
        }
    }
}

impl Multiplexer for PollMux {
    fn wait(&mut self, interest: BitFlags<Source>, timeout: Duration) -> io::Result<Wake> {
        let sources: Vec<Source> = interest.iter().collect();
        let mut fds: Vec<libc::pollfd> = sources.iter()
            .map(|&s| libc::pollfd {
                fd: self.fd(s),
                events: libc::POLLIN,
                revents: 0,
            })
            .collect();
        let timeout_ms = timeout.as_millis().min(libc::c_int::max_value() as u128) as libc::c_int;

        let n = match syscall!(poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms)) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(Wake::Interrupted),
            Err(e) => return Err(e),
        };
        if n == 0 {
            return Ok(Wake::TimedOut);
        }

        // Hang-ups and errors count as readable so the following read observes them.
        let mask = libc::POLLIN | libc::POLLHUP | libc::POLLERR | libc::POLLNVAL;
        let ready = sources.iter().zip(&fds)
            .filter(|(_, fd)| fd.revents & mask != 0)
            .fold(BitFlags::empty(), |acc, (&s, _)| acc | s);
        trace!("poll ready: {:?}", Sources(ready));
        Ok(Wake::Ready(ready))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;
    use std::os::unix::io::AsRawFd;
    use std::os::unix::net::UnixStream;

    const SHORT: Duration = Duration::from_millis(20);

    #[test]
    fn sources_debug() {
        assert_eq!(format!("{:?}", Sources(BitFlags::empty())), "(none)");
        assert_eq!(format!("{:?}", Sources(Source::Link.into())), "Link");
        assert_eq!(format!("{:?}", Sources(BitFlags::all())), "Command | Link");
    }

    #[test]
    fn times_out_when_idle() {
        let (cmd, _cmd_peer) = UnixStream::pair().unwrap();
        let (link, _link_peer) = UnixStream::pair().unwrap();
        let mut mux = PollMux::new(cmd.as_raw_fd(), link.as_raw_fd());
        assert_eq!(mux.wait(BitFlags::all(), SHORT).unwrap(), Wake::TimedOut);
    }

    #[test]
    fn reports_readable_sources() {
        let (cmd, mut cmd_peer) = UnixStream::pair().unwrap();
        let (link, mut link_peer) = UnixStream::pair().unwrap();
        let mut mux = PollMux::new(cmd.as_raw_fd(), link.as_raw_fd());

        link_peer.write_all(b"x").unwrap();
        assert_eq!(mux.wait(BitFlags::all(), SHORT).unwrap(), Wake::Ready(Source::Link.into()));

        cmd_peer.write_all(b"0102\n").unwrap();
        assert_eq!(mux.wait(BitFlags::all(), SHORT).unwrap(),
            Wake::Ready(Source::Command | Source::Link));
    }

    #[test]
    fn ignores_sources_outside_interest() {
        let (cmd, mut cmd_peer) = UnixStream::pair().unwrap();
        let (link, _link_peer) = UnixStream::pair().unwrap();
        let mut mux = PollMux::new(cmd.as_raw_fd(), link.as_raw_fd());

        cmd_peer.write_all(b"00\n").unwrap();
        assert_eq!(mux.wait(Source::Link.into(), SHORT).unwrap(), Wake::TimedOut);
    }

    #[test]
    fn hang_up_is_ready() {
        let (cmd, _cmd_peer) = UnixStream::pair().unwrap();
        let (link, link_peer) = UnixStream::pair().unwrap();
        let mut mux = PollMux::new(cmd.as_raw_fd(), link.as_raw_fd());

        drop(link_peer);
        assert_eq!(mux.wait(BitFlags::all(), SHORT).unwrap(), Wake::Ready(Source::Link.into()));
    }
}
