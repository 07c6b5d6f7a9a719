//! Datagram endpoint boundary and the real kernel socket behind it.

use std::io;

/// One received datagram plus transport-level out-of-band state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub data: Vec<u8>,
    /// The transport could not deliver the whole datagram.
    pub truncated: bool,
}

/// A connected datagram endpoint.
///
/// Errors are plain `io::Error`s; the session decides which kinds are
/// retried (`Interrupted`, `WouldBlock`) and which are terminal.
pub trait DatagramEndpoint {
    fn send(&mut self, buf: &[u8]) -> io::Result<()>;
    fn recv(&mut self) -> io::Result<Datagram>;
    /// Port id the kernel addresses replies to.
    fn local_pid(&self) -> u32;
}

#[cfg(target_os = "linux")]
pub use self::linux::RouteSocket;

#[cfg(target_os = "linux")]
mod linux {
    use super::{Datagram, DatagramEndpoint};
    use std::io;
    use std::mem;
    use std::time::Duration;

    const RECV_BUFFER_SIZE: usize = 32 * 1024;

    /// A `NETLINK_ROUTE` socket with a kernel-assigned port id.
    pub struct RouteSocket {
        fd: i32,
        pid: u32,
        buffer: Vec<u8>,
    }

    impl RouteSocket {
        pub fn open() -> io::Result<Self> {
            let fd = unsafe {
                libc::socket(
                    libc::AF_NETLINK,
                    libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                    libc::NETLINK_ROUTE,
                )
            };
            if fd == -1 {
                return Err(io::Error::last_os_error());
            }

            let mut addr: libc::sockaddr_nl = unsafe { mem::zeroed() };
            addr.nl_family = libc::AF_NETLINK as u16;
            if unsafe {
                libc::bind(
                    fd,
                    &addr as *const _ as *const libc::sockaddr,
                    mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
                )
            } == -1
            {
                let err = io::Error::last_os_error();
                unsafe {
                    libc::close(fd);
                }
                return Err(err);
            }

            // The kernel fills in the assigned port id on bind.
            let mut bound: libc::sockaddr_nl = unsafe { mem::zeroed() };
            let mut len = mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t;
            if unsafe {
                libc::getsockname(fd, &mut bound as *mut _ as *mut libc::sockaddr, &mut len)
            } == -1
            {
                let err = io::Error::last_os_error();
                unsafe {
                    libc::close(fd);
                }
                return Err(err);
            }

            Ok(Self {
                fd,
                pid: bound.nl_pid,
                buffer: vec![0u8; RECV_BUFFER_SIZE],
            })
        }

        /// Bound every receive by `timeout` (`None` blocks indefinitely).
        ///
        /// An expired timeout surfaces as a would-block error, which the
        /// session maps onto its deadline policy.
        pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
            let tv = match timeout {
                Some(t) => libc::timeval {
                    tv_sec: t.as_secs() as libc::time_t,
                    tv_usec: t.subsec_micros() as libc::suseconds_t,
                },
                None => libc::timeval {
                    tv_sec: 0,
                    tv_usec: 0,
                },
            };
            if unsafe {
                libc::setsockopt(
                    self.fd,
                    libc::SOL_SOCKET,
                    libc::SO_RCVTIMEO,
                    &tv as *const _ as *const libc::c_void,
                    mem::size_of::<libc::timeval>() as libc::socklen_t,
                )
            } == -1
            {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        }
    }

    impl DatagramEndpoint for RouteSocket {
        fn send(&mut self, buf: &[u8]) -> io::Result<()> {
            let sent =
                unsafe { libc::send(self.fd, buf.as_ptr() as *const libc::c_void, buf.len(), 0) };
            if sent == -1 {
                return Err(io::Error::last_os_error());
            }
            if sent as usize != buf.len() {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "short datagram send"));
            }
            Ok(())
        }

        fn recv(&mut self) -> io::Result<Datagram> {
            // MSG_TRUNC makes the kernel report the full datagram length
            // even when it does not fit the buffer.
            let received = unsafe {
                libc::recv(
                    self.fd,
                    self.buffer.as_mut_ptr() as *mut libc::c_void,
                    self.buffer.len(),
                    libc::MSG_TRUNC,
                )
            };
            if received == -1 {
                return Err(io::Error::last_os_error());
            }
            let received = received as usize;
            let taken = received.min(self.buffer.len());
            Ok(Datagram {
                data: self.buffer[..taken].to_vec(),
                truncated: received > self.buffer.len(),
            })
        }

        fn local_pid(&self) -> u32 {
            self.pid
        }
    }

    impl Drop for RouteSocket {
        fn drop(&mut self) {
            unsafe {
                libc::close(self.fd);
            }
        }
    }
}
