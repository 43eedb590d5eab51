use crate::linux::{ifreq, ifrn, SIOCGIFADDR};
use std::ffi::CStr;
use std::io;
use std::mem::{self, MaybeUninit};
use std::ptr;

/// Reads the IPv4 address currently configured on `iface`, in host byte
/// order, by way of `SIOCGIFADDR`. This is how the configuration layer
/// resolves `internal_ip`/`external_ip` from interface names at startup
/// (the source's `fnOptions::getInternalIP`/`getExternalIP`).
pub fn interface_ipv4(iface: impl AsRef<CStr>) -> io::Result<u32> {
    // This block is unsafe because it performs FFI with the kernel's ioctl
    // interface. It is sound because `ifr_ifrn.ifrn_name` is sized to
    // `IFNAMSIZ` and the name is copied with `ptr::copy_nonoverlapping`
    // bounded by that size, and the returned `sockaddr` is read only after
    // the kernel has filled it in on success.
    unsafe {
        let fd = libc::socket(libc::AF_INET, libc::SOCK_DGRAM, 0);
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }

        let mut ifr: ifreq = MaybeUninit::zeroed().assume_init();
        ifr.ifr_ifrn = ifrn {
            ifrn_name: MaybeUninit::zeroed().assume_init(),
        };
        let name_bytes = iface.as_ref().to_bytes_with_nul();
        if name_bytes.len() > libc::IFNAMSIZ {
            libc::close(fd);
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "interface name too long"));
        }
        ptr::copy_nonoverlapping(
            name_bytes.as_ptr() as *const libc::c_char,
            ifr.ifr_ifrn.ifrn_name.as_mut_ptr(),
            name_bytes.len(),
        );

        let err = libc::ioctl(fd, SIOCGIFADDR, &mut ifr);
        if err < 0 {
            let saved = io::Error::last_os_error();
            libc::close(fd);
            return Err(saved);
        }
        libc::close(fd);

        let sockaddr_in: libc::sockaddr_in = mem::transmute_copy(&ifr.ifr_ifru.ifru_addr);
        Ok(u32::from_be(sockaddr_in.sin_addr.s_addr))
    }
}
