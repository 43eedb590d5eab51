use std::convert::TryInto;
use std::ffi::CStr;
use std::io;
use std::mem::{self, MaybeUninit};
use std::ptr;

/// An `AF_PACKET` socket not yet bound to an interface. Stands in for the
/// kernel packet-queue hook's receive side: rather than fabricating
/// bindings to a specific netfilter-queue library, frames are captured at
/// the link layer the same way the teacher's own raw-I/O crate does.
pub struct CaptureSocket {
    fd: libc::c_int,
}

/// An `AF_PACKET` socket bound to one interface, ready to `recv`.
pub struct BoundCapture {
    fd: libc::c_int,
}

impl CaptureSocket {
    pub fn new() -> io::Result<Self> {
        // Safety: no Rust-owned memory is touched; failure is surfaced as
        // an `io::Error` rather than assumed away.
        let fd = unsafe { libc::socket(libc::AF_PACKET, libc::SOCK_RAW, libc::ETH_P_ALL.to_be() as libc::c_int) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(CaptureSocket { fd })
    }

    pub fn bind(self, iface: impl AsRef<CStr>) -> io::Result<BoundCapture> {
        // Safety: `ifr_ifrn.ifrn_name` is IFNAMSIZ bytes and the copy below
        // is bounded by that size; `sll` is fully initialized before use.
        unsafe {
            let mut ifr: crate::linux::ifreq = MaybeUninit::zeroed().assume_init();
            let name_bytes = iface.as_ref().to_bytes_with_nul();
            ptr::copy_nonoverlapping(
                name_bytes.as_ptr() as *const libc::c_char,
                ifr.ifr_ifrn.ifrn_name.as_mut_ptr(),
                name_bytes.len().min(libc::IFNAMSIZ),
            );
            if libc::ioctl(self.fd, 0x8933 /* SIOCGIFINDEX */, &mut ifr) < 0 {
                let err = io::Error::last_os_error();
                libc::close(self.fd);
                return Err(err);
            }

            let mut ll: libc::sockaddr_ll = MaybeUninit::zeroed().assume_init();
            ll.sll_family = libc::AF_PACKET as libc::c_ushort;
            ll.sll_protocol = (libc::ETH_P_ALL as u16).to_be();
            ll.sll_ifindex = ifr.ifr_ifru.ifru_ivalue;
            let err = libc::bind(
                self.fd,
                &ll as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            );
            if err < 0 {
                let saved = io::Error::last_os_error();
                libc::close(self.fd);
                return Err(saved);
            }

            let fd = self.fd;
            mem::forget(self);
            Ok(BoundCapture { fd })
        }
    }
}

impl Drop for CaptureSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl BoundCapture {
    /// Reads one frame into `buf`, returning the number of bytes written.
    /// The caller is expected to strip the 14-byte Ethernet header before
    /// handing the remainder to `nat_packets::Packet::parse`.
    pub fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::recv(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), 0) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }
}

impl Drop for BoundCapture {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl std::os::unix::io::AsRawFd for BoundCapture {
    fn as_raw_fd(&self) -> libc::c_int {
        self.fd
    }
}

/// An `AF_INET`/`SOCK_RAW` socket with `IP_HDRINCL` set, bound to one
/// outbound interface. This is the literal "raw IPv4 socket" the
/// specification's `PKT.emit()` describes.
pub struct RawSender {
    fd: libc::c_int,
}

impl RawSender {
    pub fn bind(iface: impl AsRef<CStr>) -> io::Result<Self> {
        // Safety: only FFI calls with owned byte buffers; every failure
        // path returns an `io::Error` and closes the socket it opened.
        unsafe {
            let fd = libc::socket(libc::AF_INET, libc::SOCK_RAW, libc::IPPROTO_RAW);
            if fd < 0 {
                return Err(io::Error::last_os_error());
            }

            let one: libc::c_int = 1;
            if libc::setsockopt(
                fd,
                libc::IPPROTO_IP,
                libc::IP_HDRINCL,
                &one as *const _ as *const libc::c_void,
                mem::size_of::<libc::c_int>() as libc::socklen_t,
            ) < 0
            {
                let err = io::Error::last_os_error();
                libc::close(fd);
                return Err(err);
            }

            let name_bytes = iface.as_ref().to_bytes_with_nul();
            if libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_BINDTODEVICE,
                name_bytes.as_ptr() as *const libc::c_void,
                name_bytes.len() as libc::socklen_t,
            ) < 0
            {
                let err = io::Error::last_os_error();
                libc::close(fd);
                return Err(err);
            }

            Ok(RawSender { fd })
        }
    }

    /// Sends a fully-framed IPv4 datagram (valid checksums already set by
    /// the caller) to the destination embedded in its own header.
    pub fn send(&self, datagram: &[u8]) -> io::Result<()> {
        if datagram.len() < 20 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "datagram shorter than an IPv4 header"));
        }
        let dst_octets: [u8; 4] = datagram[16..20].try_into().unwrap();

        // Safety: `dst` is a plain-old-data sockaddr_in constructed from
        // caller-supplied bytes; `sendto` only reads `datagram`.
        unsafe {
            let mut dst: libc::sockaddr_in = MaybeUninit::zeroed().assume_init();
            dst.sin_family = libc::AF_INET as libc::sa_family_t;
            dst.sin_addr.s_addr = u32::from_be_bytes(dst_octets).to_be();

            let n = libc::sendto(
                self.fd,
                datagram.as_ptr() as *const libc::c_void,
                datagram.len(),
                0,
                &dst as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
            );
            if n < 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }
}

impl Drop for RawSender {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
