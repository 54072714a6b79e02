//! Container state records and address extraction
//!
//! Only the part of `lxc list --format json` needed to find a container's
//! address is modelled; unknown fields are ignored and missing ones read as
//! empty.

use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use lxs_core::error::ContainerError;

/// Interface `lxc` reports for the loopback device
const LOOPBACK: &str = "lo";

/// Address family `lxc` uses for IPv4
const FAMILY_INET: &str = "inet";

/// One element of `lxc list --format json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub state: Option<ContainerState>,
}

/// Runtime state of a container
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerState {
    /// Interfaces in the order the hypervisor listed them
    #[serde(default)]
    pub network: Option<Interfaces>,
}

/// Ordered `interface name -> interface` map
#[derive(Debug, Clone, Default)]
pub struct Interfaces(pub Vec<(String, NetworkInterface)>);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkInterface {
    #[serde(default)]
    pub addresses: Option<Vec<InterfaceAddress>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterfaceAddress {
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub netmask: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl<'de> Deserialize<'de> for Interfaces {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct InterfacesVisitor;

        impl<'de> Visitor<'de> for InterfacesVisitor {
            type Value = Interfaces;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of interface names to interfaces")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, iface)) = map.next_entry::<String, NetworkInterface>()? {
                    entries.push((name, iface));
                }
                Ok(Interfaces(entries))
            }
        }

        deserializer.deserialize_map(InterfacesVisitor)
    }
}

impl ContainerRecord {
    /// All addresses of non-loopback interfaces, in listing order
    pub fn addresses(&self) -> impl Iterator<Item = &InterfaceAddress> {
        self.state
            .iter()
            .filter_map(|state| state.network.as_ref())
            .flat_map(|network| network.0.iter())
            .filter(|(name, _)| name != LOOPBACK)
            .filter_map(|(_, iface)| iface.addresses.as_ref())
            .flatten()
    }
}

/// Pick the address of the first record
///
/// Returns `Ok(None)` when no address qualifies and `raise_if_not_found` is
/// unset. An empty record list is always [`ContainerError::NotFound`].
pub fn parse_address(
    records: &[ContainerRecord],
    ipv4_only: bool,
    raise_if_not_found: bool,
) -> Result<Option<String>, ContainerError> {
    let record = records
        .first()
        .ok_or_else(|| ContainerError::NotFound("Container not found".to_string()))?;

    let found = record
        .addresses()
        .find(|addr| !ipv4_only || addr.family == FAMILY_INET)
        .map(|addr| addr.address.clone());

    match found {
        Some(address) => Ok(Some(address)),
        None if raise_if_not_found => {
            Err(ContainerError::Validation("No IP address found".to_string()))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(json: &str) -> Vec<ContainerRecord> {
        serde_json::from_str(json).unwrap()
    }

    const LOOPBACK_ONLY: &str = r#"[{
        "name": "worker-1",
        "status": "Running",
        "state": {"network": {"lo": {"addresses": [
            {"family": "inet", "address": "127.0.0.1", "netmask": "8", "scope": "local"}
        ]}}}
    }]"#;

    const DUAL_STACK: &str = r#"[{
        "state": {"network": {
            "lo": {"addresses": [{"family": "inet", "address": "127.0.0.1"}]},
            "eth0": {"addresses": [
                {"family": "inet6", "address": "fe80::1"},
                {"family": "inet", "address": "10.0.0.5"}
            ]}
        }}
    }]"#;

    #[test]
    fn test_loopback_only() {
        let records = records(LOOPBACK_ONLY);
        assert!(matches!(
            parse_address(&records, true, true),
            Err(ContainerError::Validation(msg)) if msg == "No IP address found"
        ));
        assert_eq!(parse_address(&records, true, false).unwrap(), None);
    }

    #[test]
    fn test_ipv4_preferred_over_earlier_ipv6() {
        let records = records(DUAL_STACK);
        assert_eq!(
            parse_address(&records, true, true).unwrap().as_deref(),
            Some("10.0.0.5")
        );
    }

    #[test]
    fn test_any_family_takes_first() {
        let records = records(DUAL_STACK);
        assert_eq!(
            parse_address(&records, false, true).unwrap().as_deref(),
            Some("fe80::1")
        );
    }

    #[test]
    fn test_empty_list_is_not_found() {
        for raise in [true, false] {
            assert!(matches!(
                parse_address(&[], true, raise),
                Err(ContainerError::NotFound(msg)) if msg == "Container not found"
            ));
        }
    }

    #[test]
    fn test_only_first_record_is_consulted() {
        let records = records(
            r#"[
                {"name": "stopped", "state": null},
                {"name": "other", "state": {"network": {"eth0": {"addresses": [
                    {"family": "inet", "address": "10.0.0.9"}
                ]}}}}
            ]"#,
        );
        assert_eq!(parse_address(&records, true, false).unwrap(), None);
    }

    #[test]
    fn test_interface_order_is_preserved() {
        let records = records(
            r#"[{"state": {"network": {
                "eth1": {"addresses": [{"family": "inet", "address": "192.168.1.2"}]},
                "eth0": {"addresses": [{"family": "inet", "address": "10.0.0.2"}]}
            }}}]"#,
        );
        assert_eq!(
            parse_address(&records, true, true).unwrap().as_deref(),
            Some("192.168.1.2")
        );
    }

    #[test]
    fn test_missing_and_null_fields() {
        let records = records(
            r#"[{"state": {"network": {"eth0": {"addresses": null}, "veth": {}}}}]"#,
        );
        assert_eq!(records[0].addresses().count(), 0);
        assert_eq!(parse_address(&records, true, false).unwrap(), None);

        let records = self::records(r#"[{"state": {"network": null}}]"#);
        assert_eq!(parse_address(&records, true, false).unwrap(), None);
    }

    #[test]
    fn test_record_metadata() {
        let records = records(LOOPBACK_ONLY);
        assert_eq!(records[0].name.as_deref(), Some("worker-1"));
        assert_eq!(records[0].status.as_deref(), Some("Running"));
        let addr = records[0]
            .state
            .as_ref()
            .and_then(|s| s.network.as_ref())
            .map(|n| n.0[0].1.addresses.clone().unwrap_or_default())
            .unwrap_or_default();
        assert_eq!(addr[0].scope.as_deref(), Some("local"));
        assert_eq!(addr[0].netmask.as_deref(), Some("8"));
    }
}
