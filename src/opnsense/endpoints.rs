//! Logical endpoint names and their OPNsense API paths.
//!
//! Adapters refer to upstream resources by name only; the client resolves the
//! name against its mapping at fetch time.

use std::collections::BTreeMap;

pub const SERVICES: &str = "services";
pub const INTERFACES: &str = "interfaces";
pub const PROTOCOL_STATISTICS: &str = "protocolStatistics";
pub const PF_STATISTICS_BY_INTERFACE: &str = "pfStatisticsByInterface";
pub const ARP: &str = "arp";
pub const DHCPV4: &str = "dhcpv4";
pub const OPENVPN_INSTANCES: &str = "openVPNInstances";
pub const IPSEC_PHASE1: &str = "ipsecPhase1";
pub const IPSEC_PHASE2: &str = "ipsecPhase2";
pub const GATEWAYS_STATUS: &str = "gatewaysStatus";
pub const UNBOUND_DNS_STATUS: &str = "unboundDNSStatus";
pub const CRON_JOBS: &str = "cronJobs";
pub const WIREGUARD_CLIENTS: &str = "wireguardClients";
pub const HEALTH_CHECK: &str = "healthCheck";
pub const FIRMWARE: &str = "firmware";

/// The endpoint mapping used by a client built with [`OpnSenseClient::new`](super::OpnSenseClient::new)
pub fn default_endpoints() -> BTreeMap<String, String> {
    [
        (SERVICES, "api/core/service/search"),
        (INTERFACES, "api/diagnostics/traffic/interface"),
        (
            PROTOCOL_STATISTICS,
            "api/diagnostics/interface/getProtocolStatistics",
        ),
        (
            PF_STATISTICS_BY_INTERFACE,
            "api/diagnostics/firewall/pf_statistics/interfaces",
        ),
        (ARP, "api/diagnostics/interface/search_arp"),
        (DHCPV4, "api/dhcpv4/leases/searchLease"),
        (OPENVPN_INSTANCES, "api/openvpn/instances/search"),
        (IPSEC_PHASE1, "api/ipsec/sessions/search_phase1"),
        (IPSEC_PHASE2, "api/ipsec/sessions/search_phase2"),
        (GATEWAYS_STATUS, "api/routing/settings/searchGateway"),
        (UNBOUND_DNS_STATUS, "api/unbound/diagnostics/stats"),
        (CRON_JOBS, "api/cron/settings/searchJobs"),
        (WIREGUARD_CLIENTS, "api/wireguard/service/show"),
        (HEALTH_CHECK, "api/core/system/status"),
        (FIRMWARE, "api/core/firmware/status"),
    ]
    .into_iter()
    .map(|(name, path)| (name.to_string(), path.to_string()))
    .collect()
}
