mod cli;

use anyhow::{Context, Result};
use nat_core::{Config, Engine, FlowTable};
use nat_packets::Packet;
use nat_raw::{BoundCapture, CaptureSocket, InterfaceEmitter, ETHERNET_HEADER_LEN};
use std::ffi::CString;
use std::os::unix::io::AsRawFd;
use std::sync::{Arc, Mutex};
use tracing::{error, info, info_span};

const FRAME_BUF_LEN: usize = 65536;

fn open_capture(iface: &str) -> Result<BoundCapture> {
    let cname = CString::new(iface).with_context(|| format!("interface name {iface} contains a NUL byte"))?;
    CaptureSocket::new()
        .and_then(|s| s.bind(cname))
        .with_context(|| format!("binding capture socket to {iface}"))
}

fn build_config(matches: &clap::ArgMatches<'_>) -> Result<Config> {
    let raw = cli::raw_config_from_matches(matches);
    let internal = raw
        .internal_interface
        .clone()
        .context("internal interface is required")?;
    let external = raw
        .external_interface
        .clone()
        .context("external interface is required")?;

    let internal_ip = nat_raw::interface_ipv4(
        CString::new(internal.clone()).context("internal interface name contains a NUL byte")?,
    )
    .with_context(|| format!("resolving IPv4 address of {internal}"))?;
    let external_ip = nat_raw::interface_ipv4(
        CString::new(external.clone()).context("external interface name contains a NUL byte")?,
    )
    .with_context(|| format!("resolving IPv4 address of {external}"))?;

    Config::validate(raw, internal_ip, external_ip).context("invalid configuration")
}

/// Blocks until one of `sockets` has a frame ready, returning its index.
fn wait_readable(sockets: &[&BoundCapture]) -> Result<usize> {
    let mut pollfds: Vec<libc::pollfd> = sockets
        .iter()
        .map(|s| libc::pollfd {
            fd: s.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        })
        .collect();

    // Safety: `pollfds` is a valid, appropriately-sized buffer for the
    // duration of this call; a negative return is an `io::Error`.
    let ready = unsafe { libc::poll(pollfds.as_mut_ptr(), pollfds.len() as libc::nfds_t, -1) };
    if ready < 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    pollfds
        .iter()
        .position(|p| p.revents & libc::POLLIN != 0)
        .context("poll woke with no readable socket")
}

fn run() -> Result<()> {
    let matches = cli::app().get_matches();
    let config = build_config(&matches)?;

    let internal_capture = open_capture(&config.internal_interface)?;
    let external_capture = open_capture(&config.external_interface)?;
    let mut emitter = InterfaceEmitter::new([
        config.internal_interface.clone(),
        config.external_interface.clone(),
    ])
    .context("binding raw senders")?;

    let internal_name = config.internal_interface.clone();
    let external_name = config.external_interface.clone();
    let table = Arc::new(Mutex::new(FlowTable::new()));
    let engine = Engine::new(config, table);

    info!(internal = %internal_name, external = %external_name, "nat-gateway ready");

    let sockets = [&internal_capture, &external_capture];
    let names = [internal_name.as_str(), external_name.as_str()];
    let mut frame = vec![0u8; FRAME_BUF_LEN];
    let mut packet_id: u64 = 0;

    loop {
        let idx = wait_readable(&sockets)?;
        let n = match sockets[idx].recv(&mut frame) {
            Ok(n) => n,
            Err(e) => {
                error!(error = %e, "read error on capture socket, continuing");
                continue;
            }
        };
        if n <= ETHERNET_HEADER_LEN {
            continue;
        }

        let span = info_span!("packet", id = packet_id);
        let _enter = span.enter();
        packet_id = packet_id.wrapping_add(1);

        let datagram = &mut frame[ETHERNET_HEADER_LEN..n];
        let mut packet = match Packet::parse(datagram, names[idx]) {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "dropping malformed packet");
                continue;
            }
        };

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let verdict = engine.process(&mut packet, &mut emitter, now);
        tracing::debug!(?verdict, "packet processed");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run() {
        error!(error = %e, "nat-gateway exiting with error");
        std::process::exit(1);
    }
    Ok(())
}
