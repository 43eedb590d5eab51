use clap::{App, Arg, ArgMatches};
use nat_core::RawConfig;

pub fn app() -> App<'static, 'static> {
    App::new("nat-gateway")
        .version("0.1")
        .author("Route-rs Contributors")
        .about("Userspace NAT gateway between an internal and an external interface")
        .arg(
            Arg::with_name("internal")
                .long("internal")
                .value_name("IFACE")
                .help("Internal (LAN) interface name")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("external")
                .long("external")
                .value_name("IFACE")
                .help("External (WAN) interface name")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("filter_method")
                .long("filter_method")
                .value_name("ind|addr|port")
                .help("Inbound filtering behavior")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("map_method")
                .long("map_method")
                .value_name("ind|addr|port")
                .help("Outbound mapping behavior")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("port_assign")
                .long("port_assign")
                .value_name("pres|over|none")
                .help("External port assignment policy")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("port_parity")
                .long("port_parity")
                .help("Preserve even/odd parity of the original port when reassigning"),
        )
        .arg(
            Arg::with_name("hairpin")
                .long("hairpin")
                .help("Allow internal hosts to reach the external IP and be redirected internally"),
        )
        .arg(
            Arg::with_name("map_lifetime")
                .long("map_lifetime")
                .value_name("SECONDS")
                .help("Mapping idle lifetime in seconds, must be positive")
                .required(true)
                .takes_value(true),
        )
}

/// Converts parsed flags into a [`RawConfig`], leaving enum parsing and
/// range checks to [`nat_core::Config::validate`].
pub fn raw_config_from_matches(matches: &ArgMatches<'_>) -> RawConfig {
    RawConfig {
        internal_interface: matches.value_of("internal").map(str::to_string),
        external_interface: matches.value_of("external").map(str::to_string),
        filter_method: matches.value_of("filter_method").map(str::to_string),
        map_method: matches.value_of("map_method").map(str::to_string),
        port_assign: matches.value_of("port_assign").map(str::to_string),
        port_parity: matches.is_present("port_parity"),
        hairpin: matches.is_present("hairpin"),
        map_lifetime: matches.value_of("map_lifetime").and_then(|s| s.parse().ok()),
    }
}
