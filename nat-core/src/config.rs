use crate::error::ConfigError;

/// RFC 4787 mapping behavior: how restrictively an outbound packet must
/// match an existing mapping before a new one is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingBehavior {
    EndpointIndependent,
    AddressDependent,
    AddressPortDependent,
}

/// RFC 4787 filtering behavior: how restrictively an inbound packet must
/// match an existing mapping before it is allowed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilteringBehavior {
    EndpointIndependent,
    AddressDependent,
    AddressPortDependent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortAssignment {
    Preserve,
    Overload,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortParity {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hairpin {
    Allow,
    Disable,
}

/// When a matched mapping's `last_activity` is bumped: on outbound traffic,
/// inbound traffic, both, or never.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    None,
    In,
    Out,
    Both,
}

impl RefreshPolicy {
    pub fn refreshes_on_outbound(self) -> bool {
        matches!(self, RefreshPolicy::Out | RefreshPolicy::Both)
    }

    pub fn refreshes_on_inbound(self) -> bool {
        matches!(self, RefreshPolicy::In | RefreshPolicy::Both)
    }
}

fn parse_triple(field: &'static str, value: &str) -> Result<u8, ConfigError> {
    match value {
        "ind" => Ok(0),
        "addr" => Ok(1),
        "port" => Ok(2),
        other => Err(ConfigError::InvalidEnumValue {
            field,
            value: other.to_string(),
            expected: &["ind", "addr", "port"],
        }),
    }
}

/// Immutable NAT behavior configuration, resolved once at startup. See §6
/// of the specification for the exact flag surface; `internal_ip` and
/// `external_ip` are not CLI flags but are resolved from the named
/// interfaces by the binary before this is constructed (§10.3).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub internal_interface: String,
    pub external_interface: String,
    pub internal_ip: u32,
    pub external_ip: u32,
    pub mapping_behavior: MappingBehavior,
    pub filtering_behavior: FilteringBehavior,
    pub port_assignment: PortAssignment,
    pub port_parity: PortParity,
    pub hairpin: Hairpin,
    /// Refresh policy is not exposed as a CLI flag in the source (it only
    /// ever runs with REFRESH_BOTH); this crate keeps it configurable but
    /// the CLI always sets it to `Both`, matching the source's default.
    pub refresh_policy: RefreshPolicy,
    pub map_lifetime_secs: u64,
}

/// Raw, not-yet-validated configuration values, shaped like the CLI flags
/// of §6. The CLI layer in `demos/nat-gateway` builds one of these from
/// `clap::ArgMatches` and hands it to [`Config::validate`].
pub struct RawConfig {
    pub internal_interface: Option<String>,
    pub external_interface: Option<String>,
    pub filter_method: Option<String>,
    pub map_method: Option<String>,
    pub port_assign: Option<String>,
    pub port_parity: bool,
    pub hairpin: bool,
    pub map_lifetime: Option<i64>,
}

impl Config {
    /// Validates `raw` and, on success, resolves it into a full [`Config`]
    /// using `internal_ip`/`external_ip` already looked up by the caller
    /// (§10.3 keeps interface-address resolution out of this crate, since
    /// it requires OS-specific I/O that belongs in `nat-raw`).
    pub fn validate(raw: RawConfig, internal_ip: u32, external_ip: u32) -> Result<Config, ConfigError> {
        let internal_interface = raw.internal_interface.ok_or(ConfigError::MissingField("internal"))?;
        let external_interface = raw.external_interface.ok_or(ConfigError::MissingField("external"))?;

        let filter_method = raw.filter_method.ok_or(ConfigError::MissingField("filter_method"))?;
        let filtering_behavior = match parse_triple("filter_method", &filter_method)? {
            0 => FilteringBehavior::EndpointIndependent,
            1 => FilteringBehavior::AddressDependent,
            _ => FilteringBehavior::AddressPortDependent,
        };

        let map_method = raw.map_method.ok_or(ConfigError::MissingField("map_method"))?;
        let mapping_behavior = match parse_triple("map_method", &map_method)? {
            0 => MappingBehavior::EndpointIndependent,
            1 => MappingBehavior::AddressDependent,
            _ => MappingBehavior::AddressPortDependent,
        };

        let port_assign = raw.port_assign.ok_or(ConfigError::MissingField("port_assign"))?;
        let port_assignment = match port_assign.as_str() {
            "pres" => PortAssignment::Preserve,
            "over" => PortAssignment::Overload,
            "none" => PortAssignment::None,
            other => {
                return Err(ConfigError::InvalidEnumValue {
                    field: "port_assign",
                    value: other.to_string(),
                    expected: &["pres", "over", "none"],
                })
            }
        };

        let port_parity = if raw.port_parity { PortParity::Enabled } else { PortParity::Disabled };
        let hairpin = if raw.hairpin { Hairpin::Allow } else { Hairpin::Disable };

        // §9 open-question decision: a zero or unset lifetime is rejected
        // rather than silently treated as "never expires" or "always
        // expired". Operators must pick an explicit positive value.
        let lifetime = raw.map_lifetime.unwrap_or(0);
        if lifetime <= 0 {
            return Err(ConfigError::NonPositiveLifetime(lifetime));
        }

        Ok(Config {
            internal_interface,
            external_interface,
            internal_ip,
            external_ip,
            mapping_behavior,
            filtering_behavior,
            port_assignment,
            port_parity,
            hairpin,
            refresh_policy: RefreshPolicy::Both,
            map_lifetime_secs: lifetime as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_raw() -> RawConfig {
        RawConfig {
            internal_interface: Some("eth1".to_string()),
            external_interface: Some("eth0".to_string()),
            filter_method: Some("ind".to_string()),
            map_method: Some("ind".to_string()),
            port_assign: Some("pres".to_string()),
            port_parity: false,
            hairpin: true,
            map_lifetime: Some(120),
        }
    }

    #[test]
    fn rejects_zero_lifetime() {
        let mut raw = valid_raw();
        raw.map_lifetime = Some(0);
        assert_eq!(
            Config::validate(raw, 0, 0),
            Err(ConfigError::NonPositiveLifetime(0))
        );
    }

    #[test]
    fn rejects_missing_lifetime() {
        let mut raw = valid_raw();
        raw.map_lifetime = None;
        assert!(Config::validate(raw, 0, 0).is_err());
    }

    #[test]
    fn rejects_unknown_enum_value() {
        let mut raw = valid_raw();
        raw.filter_method = Some("bogus".to_string());
        assert!(Config::validate(raw, 0, 0).is_err());
    }

    #[test]
    fn accepts_valid_config() {
        let raw = valid_raw();
        let cfg = Config::validate(raw, 0x0A000002, 0xCB007101).unwrap();
        assert_eq!(cfg.hairpin, Hairpin::Allow);
        assert_eq!(cfg.map_lifetime_secs, 120);
    }
}
