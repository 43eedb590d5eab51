#![allow(non_camel_case_types)]

/// `ioctl` request number for reading an interface's IPv4 address.
/// See `man 7 netdevice`.
pub(crate) const SIOCGIFADDR: libc::c_ulong = 0x8915;

#[repr(C)]
pub(crate) union ifru {
    pub(crate) ifru_addr: libc::sockaddr,
    pub(crate) ifru_ivalue: libc::c_int,
}

#[repr(C)]
pub(crate) union ifrn {
    pub(crate) ifrn_name: [libc::c_char; libc::IFNAMSIZ],
}

#[repr(C)]
pub(crate) struct ifreq {
    pub(crate) ifr_ifrn: ifrn,
    pub(crate) ifr_ifru: ifru,
}
