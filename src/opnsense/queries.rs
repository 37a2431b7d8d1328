//! Typed fetch operations, one per upstream resource.
//!
//! Each operation calls [`OpnSenseClient::fetch`] against a logical endpoint and
//! converts the raw response shape into the domain record collectors consume.
//! Conversions are plain functions so they can be tested without a network.

use crate::opnsense::client::OpnSenseClient;
use crate::opnsense::endpoints;
use crate::opnsense::error::FetchError;
use crate::opnsense::parse::{parse_float, parse_int, parse_with_unit};
use crate::opnsense::types::*;
use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Standard bootgrid search payload for `search*` endpoints
const SEARCH_PAYLOAD: &str = r#"{"current":1,"rowCount":-1,"sort":{},"searchPhrase":""}"#;

/// Search payload that also asks OPNsense not to resolve hostnames
const SEARCH_NO_RESOLVE_PAYLOAD: &str =
    r#"{"current":1,"rowCount":-1,"sort":{},"searchPhrase":"","resolve":"no"}"#;

impl OpnSenseClient {
    pub async fn fetch_arp_table(&self) -> Result<ArpTable, FetchError> {
        let response: ArpSearchResponse = self
            .fetch(Method::POST, endpoints::ARP, Some(SEARCH_NO_RESOLVE_PAYLOAD))
            .await?;
        Ok(convert_arp_table(response))
    }

    pub async fn fetch_cron_table(&self) -> Result<CronTable, FetchError> {
        let response: CronSearchResponse = self
            .fetch(
                Method::POST,
                endpoints::CRON_JOBS,
                Some(SEARCH_NO_RESOLVE_PAYLOAD),
            )
            .await?;
        Ok(convert_cron_table(response))
    }

    pub async fn fetch_services(&self) -> Result<Services, FetchError> {
        let response: ServicesSearchResponse =
            self.fetch(Method::GET, endpoints::SERVICES, None).await?;
        Ok(convert_services(response))
    }

    pub async fn fetch_pf_stats_by_interface(&self) -> Result<FirewallPfStats, FetchError> {
        let response: PfStatsResponse = self
            .fetch(Method::GET, endpoints::PF_STATISTICS_BY_INTERFACE, None)
            .await?;

        let interfaces = response
            .interfaces
            .into_iter()
            .map(|(name, mut stats)| {
                stats.interface = name;
                stats
            })
            .collect();
        Ok(FirewallPfStats { interfaces })
    }

    pub async fn fetch_interfaces(&self) -> Result<Interfaces, FetchError> {
        let response: InterfacesResponse =
            self.fetch(Method::GET, endpoints::INTERFACES, None).await?;
        convert_interfaces(response)
    }

    pub async fn fetch_protocol_statistics(&self) -> Result<ProtocolStatistics, FetchError> {
        let response: ProtocolStatisticsResponse = self
            .fetch(Method::GET, endpoints::PROTOCOL_STATISTICS, None)
            .await?;

        let stats = response.statistics;
        Ok(ProtocolStatistics {
            tcp_sent_packets: stats.tcp.sent_packets,
            tcp_received_packets: stats.tcp.received_packets,
            arp_sent_requests: stats.arp.sent_requests,
            arp_received_requests: stats.arp.received_requests,
            tcp_connection_count_by_state: stats.tcp.connection_count_by_state,
        })
    }

    pub async fn fetch_gateways(&self) -> Result<Gateways, FetchError> {
        let response: GatewaysStatusResponse = self
            .fetch(Method::GET, endpoints::GATEWAYS_STATUS, None)
            .await?;
        Ok(convert_gateways(response))
    }

    pub async fn fetch_firmware_status(&self) -> Result<FirmwareStatus, FetchError> {
        let response: FirmwareStatusResponse =
            self.fetch(Method::GET, endpoints::FIRMWARE, None).await?;
        Ok(convert_firmware_status(response))
    }

    pub async fn fetch_openvpn_instances(&self) -> Result<OpenVpnInstances, FetchError> {
        let response: OpenVpnSearchResponse = self
            .fetch(
                Method::POST,
                endpoints::OPENVPN_INSTANCES,
                Some(SEARCH_PAYLOAD),
            )
            .await?;
        convert_openvpn_instances(response)
    }

    pub async fn fetch_wireguard_clients(&self) -> Result<WireguardClients, FetchError> {
        let response: WireguardClientsResponse = self
            .fetch(Method::GET, endpoints::WIREGUARD_CLIENTS, None)
            .await?;
        Ok(convert_wireguard_clients(response))
    }

    pub async fn fetch_ipsec_phase1(&self) -> Result<IpsecTunnels, FetchError> {
        let response: IpsecPhase1Response = self
            .fetch(Method::GET, endpoints::IPSEC_PHASE1, None)
            .await?;

        let tunnels = response
            .rows
            .into_iter()
            .map(|row| IpsecPhase1 {
                description: row.phase1desc,
                name: row.name,
                ike_id: row.ikeid,
                connected: row.connected,
                install_time: value_to_i64(&row.install_time),
                bytes_in: row.bytes_in,
                bytes_out: row.bytes_out,
                packets_in: row.packets_in,
                packets_out: row.packets_out,
            })
            .collect();
        Ok(IpsecTunnels { tunnels })
    }

    /// Child SAs of the phase 1 tunnel named `phase1_name`
    pub async fn fetch_ipsec_phase2(
        &self,
        phase1_name: &str,
    ) -> Result<Vec<IpsecPhase2>, FetchError> {
        let payload = serde_json::json!({ "id": phase1_name }).to_string();
        let response: IpsecPhase2Response = self
            .fetch(Method::POST, endpoints::IPSEC_PHASE2, Some(&payload))
            .await?;

        Ok(response
            .rows
            .into_iter()
            .map(|row| IpsecPhase2 {
                description: row.phase2desc,
                name: row.name,
                spi_in: row.spi_in,
                spi_out: row.spi_out,
                install_time: value_to_i64(&row.install_time),
                rekey_time: value_to_i64(&row.rekey_time),
                life_time: value_to_i64(&row.life_time),
                bytes_in: row.bytes_in,
                bytes_out: row.bytes_out,
                packets_in: row.packets_in,
                packets_out: row.packets_out,
            })
            .collect())
    }

    pub async fn fetch_unbound_overview(&self) -> Result<UnboundDnsOverview, FetchError> {
        let response: UnboundDnsStatusResponse = self
            .fetch(Method::GET, endpoints::UNBOUND_DNS_STATUS, None)
            .await?;
        convert_unbound_overview(response)
    }

    pub async fn fetch_dhcp_leases(&self) -> Result<DhcpLeases, FetchError> {
        let response: DhcpLeasesResponse = self
            .fetch(Method::POST, endpoints::DHCPV4, Some(SEARCH_PAYLOAD))
            .await?;

        let mut counts = BTreeMap::new();
        for lease in response.rows {
            *counts
                .entry((lease.interface, lease.lease_type, lease.state))
                .or_insert(0) += 1;
        }
        Ok(DhcpLeases { counts })
    }
}

fn convert_arp_table(response: ArpSearchResponse) -> ArpTable {
    ArpTable {
        entries: response
            .rows
            .into_iter()
            .map(|row| ArpEntry {
                mac: row.mac,
                ip: row.ip,
                entry_type: row.entry_type,
                hostname: row.hostname,
                interface_description: row.intf_description,
                expired: row.expired,
                permanent: row.permanent,
                expires: row.expires,
            })
            .collect(),
        total_entries: response.total,
    }
}

fn convert_cron_table(response: CronSearchResponse) -> CronTable {
    let total_entries = response.rows.len();
    let mut jobs = Vec::with_capacity(total_entries);

    for row in response.rows {
        let enabled = match parse_int(&row.enabled, endpoints::CRON_JOBS) {
            Ok(value) => value != 0,
            Err(e) => {
                warn!(uuid = %row.uuid, error = %e, "unable to parse cron entry status");
                continue;
            }
        };
        jobs.push(CronJob {
            schedule: format!(
                "{} {} {} {} {}",
                row.minutes, row.hours, row.days, row.months, row.weekdays
            ),
            uuid: row.uuid,
            description: row.description,
            command: row.command,
            origin: row.origin,
            enabled,
        });
    }

    CronTable {
        jobs,
        total_entries,
    }
}

fn convert_services(response: ServicesSearchResponse) -> Services {
    let mut services = Services::default();
    for row in response.rows {
        let status = match row.running {
            0 => {
                services.total_stopped += 1;
                ServiceStatus::Stopped
            }
            1 => {
                services.total_running += 1;
                ServiceStatus::Running
            }
            _ => ServiceStatus::Unknown,
        };
        services.services.push(Service {
            name: row.name,
            description: row.description,
            status,
        });
    }
    services
}

fn convert_interfaces(response: InterfacesResponse) -> Result<Interfaces, FetchError> {
    let int = |value: &str| parse_int(value, endpoints::INTERFACES);

    let mut interfaces = Vec::with_capacity(response.interfaces.len());
    for details in response.interfaces.into_values() {
        interfaces.push(Interface {
            mtu: int(&details.mtu)?,
            bytes_received: int(&details.bytes_received)?,
            bytes_transmitted: int(&details.bytes_transmitted)?,
            packets_received: int(&details.packets_received)?,
            packets_transmitted: int(&details.packets_transmitted)?,
            multicasts_received: int(&details.multicasts_received)?,
            multicasts_transmitted: int(&details.multicasts_transmitted)?,
            input_errors: int(&details.input_errors)?,
            output_errors: int(&details.output_errors)?,
            collisions: int(&details.collisions)?,
            name: details.name,
            device: details.device,
            interface_type: details.interface_type,
        });
    }
    Ok(Interfaces { interfaces })
}

fn convert_gateways(response: GatewaysStatusResponse) -> Gateways {
    let gateways = response
        .items
        .into_iter()
        .map(|row| {
            let status = match row.status_translated.as_str() {
                "Online" => GatewayStatus::Online,
                "Offline" => GatewayStatus::Offline,
                _ => {
                    warn!(gateway = %row.name, status = %row.status, "unknown gateway status detected");
                    GatewayStatus::Unknown
                }
            };
            Gateway {
                loss_percentage: gateway_value(&row.name, "loss", &row.loss, "%"),
                rtt_milliseconds: gateway_value(&row.name, "rtt", &row.delay, "ms"),
                rttd_milliseconds: gateway_value(&row.name, "rttd", &row.stddev, "ms"),
                name: row.name,
                address: row.address,
                status,
            }
        })
        .collect();
    Gateways { gateways }
}

fn gateway_value(gateway: &str, kind: &str, raw: &str, unit: &str) -> Option<f64> {
    let value = parse_with_unit(raw, unit);
    if value.is_none() {
        warn!(gateway, kind, value = raw, "unable to parse gateway measurement");
    }
    value
}

fn convert_firmware_status(response: FirmwareStatusResponse) -> FirmwareStatus {
    let mut status = FirmwareStatus {
        last_check: response.last_check,
        needs_reboot: -1,
        new_packages: response.new_packages.len(),
        os_version: response.os_version,
        product_abi: response.product_abi,
        product_id: response.product_id,
        product_version: response.product_version,
        upgrade_packages: response.upgrade_packages.len(),
        upgrade_needs_reboot: -1,
    };

    // The reboot flags are only filled in after an update check since boot
    if status.last_check.is_empty() {
        return status;
    }

    match parse_int(&response.needs_reboot, endpoints::FIRMWARE) {
        Ok(value) => status.needs_reboot = value,
        Err(e) => warn!(error = %e, "firmware: failed to parse needs_reboot"),
    }
    match parse_int(
        &response.product.product_check.upgrade_needs_reboot,
        endpoints::FIRMWARE,
    ) {
        Ok(value) => status.upgrade_needs_reboot = value,
        Err(e) => warn!(error = %e, "firmware: failed to parse upgrade_needs_reboot"),
    }
    status
}

fn convert_openvpn_instances(
    response: OpenVpnSearchResponse,
) -> Result<OpenVpnInstances, FetchError> {
    let mut instances = Vec::with_capacity(response.rows.len());
    for row in response.rows {
        instances.push(OpenVpnInstance {
            enabled: parse_int(&row.enabled, endpoints::OPENVPN_INSTANCES)?,
            uuid: row.uuid,
            description: row.description,
            role: row.role.to_lowercase(),
            device_type: row.dev_type,
        });
    }
    Ok(OpenVpnInstances { instances })
}

fn convert_wireguard_clients(response: WireguardClientsResponse) -> WireguardClients {
    let mut clients = WireguardClients::default();
    for row in response.rows {
        match row.row_type.as_str() {
            "interface" => {
                let status = match row.status.as_str() {
                    "up" => WireguardInterfaceStatus::Up,
                    "down" => WireguardInterfaceStatus::Down,
                    other => {
                        warn!(status = other, "unknown wireguard interface status detected");
                        WireguardInterfaceStatus::Unknown
                    }
                };
                clients.interfaces.push(WireguardInterface {
                    device: row.device,
                    device_type: row.row_type,
                    device_name: row.device_name,
                    name: row.name,
                    status,
                });
            }
            "peer" => clients.peers.push(WireguardPeer {
                device: row.device,
                device_type: row.row_type,
                device_name: row.device_name,
                name: row.name,
                latest_handshake: row.latest_handshake,
                transfer_rx: row.transfer_rx,
                transfer_tx: row.transfer_tx,
            }),
            _ => {}
        }
    }
    clients
}

fn convert_unbound_overview(
    response: UnboundDnsStatusResponse,
) -> Result<UnboundDnsOverview, FetchError> {
    let endpoint = endpoints::UNBOUND_DNS_STATUS;
    let data = response.data;

    let counts = |map: BTreeMap<String, String>| -> Result<BTreeMap<String, i64>, FetchError> {
        map.into_iter()
            .map(|(key, value)| parse_int(&value, endpoint).map(|count| (key, count)))
            .collect()
    };

    Ok(UnboundDnsOverview {
        uptime_seconds: parse_float(&data.time.up, endpoint)?,
        queries_total: parse_int(&data.total.num.queries, endpoint)?,
        cache_hits_total: parse_int(&data.total.num.cachehits, endpoint)?,
        cache_misses_total: parse_int(&data.total.num.cachemiss, endpoint)?,
        answers_bogus_total: parse_int(&data.num.answer.bogus, endpoint)?,
        answers_secure_total: parse_int(&data.num.answer.secure, endpoint)?,
        answer_rcodes: counts(data.num.answer.rcode)?,
        query_types: counts(data.num.query.types)?,
    })
}

/// Time fields come back as numbers or numeric strings; anything else is 0
fn value_to_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}
