//! OPNsense API Type Definitions
//!
//! Two families of types live here:
//!
//! - **Response shapes** (`*Response`): serde mirrors of the JSON the API returns.
//!   Fields we never read are left out; `#[serde(default)]` keeps decoding tolerant
//!   of fields that older releases omit.
//! - **Domain records**: what the typed fetch operations in
//!   [`queries`](super::queries) hand to collectors, with numeric strings already
//!   converted.
//!
//! # API Endpoints Covered
//!
//! - `arp` → [`ArpSearchResponse`] → [`ArpTable`]
//! - `cronJobs` → [`CronSearchResponse`] → [`CronTable`]
//! - `services` → [`ServicesSearchResponse`] → [`Services`]
//! - `pfStatisticsByInterface` → [`PfStatsResponse`] → [`FirewallPfStats`]
//! - `interfaces` → [`InterfacesResponse`] → [`Interfaces`]
//! - `protocolStatistics` → [`ProtocolStatisticsResponse`] → [`ProtocolStatistics`]
//! - `gatewaysStatus` → [`GatewaysStatusResponse`] → [`Gateways`]
//! - `firmware` → [`FirmwareStatusResponse`] → [`FirmwareStatus`]
//! - `openVPNInstances` → [`OpenVpnSearchResponse`] → [`OpenVpnInstances`]
//! - `wireguardClients` → [`WireguardClientsResponse`] → [`WireguardClients`]
//! - `ipsecPhase1` / `ipsecPhase2` → [`IpsecPhase1Response`], [`IpsecPhase2Response`] → [`IpsecTunnels`]
//! - `unboundDNSStatus` → [`UnboundDnsStatusResponse`] → [`UnboundDnsOverview`]
//! - `dhcpv4` → [`DhcpLeasesResponse`] → [`DhcpLeases`]

use serde::Deserialize;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// ARP
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ArpSearchResponse {
    #[serde(default)]
    pub rows: Vec<ArpRow>,
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub struct ArpRow {
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub intf: String,
    #[serde(rename = "type", default)]
    pub entry_type: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub intf_description: String,
    #[serde(default)]
    pub permanent: bool,
    #[serde(default)]
    pub expired: bool,
    #[serde(default)]
    pub expires: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArpEntry {
    pub mac: String,
    pub ip: String,
    pub entry_type: String,
    pub hostname: String,
    pub interface_description: String,
    pub expired: bool,
    pub permanent: bool,
    pub expires: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArpTable {
    pub entries: Vec<ArpEntry>,
    pub total_entries: i64,
}

// ---------------------------------------------------------------------------
// Cron
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CronSearchResponse {
    #[serde(default)]
    pub rows: Vec<CronRow>,
}

#[derive(Debug, Deserialize)]
pub struct CronRow {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub enabled: String,
    #[serde(default)]
    pub minutes: String,
    #[serde(default)]
    pub hours: String,
    #[serde(default)]
    pub days: String,
    #[serde(default)]
    pub months: String,
    #[serde(default)]
    pub weekdays: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub origin: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CronJob {
    pub uuid: String,
    pub schedule: String,
    pub description: String,
    pub command: String,
    pub origin: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CronTable {
    pub jobs: Vec<CronJob>,
    /// Rows returned by the API, including those that were skipped
    pub total_entries: usize,
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ServicesSearchResponse {
    #[serde(default)]
    pub rows: Vec<ServiceRow>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceRow {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub running: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Stopped,
    Running,
    Unknown,
}

impl ServiceStatus {
    pub fn as_value(self) -> f64 {
        match self {
            ServiceStatus::Stopped => 0.0,
            ServiceStatus::Running => 1.0,
            ServiceStatus::Unknown => 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub name: String,
    pub description: String,
    pub status: ServiceStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Services {
    pub services: Vec<Service>,
    pub total_running: u64,
    pub total_stopped: u64,
}

// ---------------------------------------------------------------------------
// Firewall (pf)
// ---------------------------------------------------------------------------

/// Interface statistics keyed by interface name
#[derive(Debug, Deserialize)]
pub struct PfStatsResponse {
    #[serde(default)]
    pub interfaces: BTreeMap<String, PfInterfaceStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PfInterfaceStats {
    #[serde(skip)]
    pub interface: String,
    #[serde(default)]
    pub in4_pass_packets: i64,
    #[serde(default)]
    pub in4_block_packets: i64,
    #[serde(default)]
    pub out4_pass_packets: i64,
    #[serde(default)]
    pub out4_block_packets: i64,
    #[serde(default)]
    pub in6_pass_packets: i64,
    #[serde(default)]
    pub in6_block_packets: i64,
    #[serde(default)]
    pub out6_pass_packets: i64,
    #[serde(default)]
    pub out6_block_packets: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FirewallPfStats {
    pub interfaces: Vec<PfInterfaceStats>,
}

// ---------------------------------------------------------------------------
// Interfaces
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct InterfacesResponse {
    #[serde(default)]
    pub interfaces: BTreeMap<String, InterfaceDetails>,
}

/// Every counter arrives as a decimal string
#[derive(Debug, Deserialize)]
pub struct InterfaceDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub device: String,
    #[serde(rename = "type", default)]
    pub interface_type: String,
    #[serde(default)]
    pub mtu: String,
    #[serde(rename = "bytes received", default)]
    pub bytes_received: String,
    #[serde(rename = "bytes transmitted", default)]
    pub bytes_transmitted: String,
    #[serde(rename = "packets received", default)]
    pub packets_received: String,
    #[serde(rename = "packets transmitted", default)]
    pub packets_transmitted: String,
    #[serde(rename = "multicasts received", default)]
    pub multicasts_received: String,
    #[serde(rename = "multicasts transmitted", default)]
    pub multicasts_transmitted: String,
    #[serde(rename = "input errors", default)]
    pub input_errors: String,
    #[serde(rename = "output errors", default)]
    pub output_errors: String,
    #[serde(default)]
    pub collisions: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interface {
    pub name: String,
    pub device: String,
    pub interface_type: String,
    pub mtu: i64,
    pub bytes_received: i64,
    pub bytes_transmitted: i64,
    pub packets_received: i64,
    pub packets_transmitted: i64,
    pub multicasts_received: i64,
    pub multicasts_transmitted: i64,
    pub input_errors: i64,
    pub output_errors: i64,
    pub collisions: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interfaces {
    pub interfaces: Vec<Interface>,
}

// ---------------------------------------------------------------------------
// Protocol statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ProtocolStatisticsResponse {
    #[serde(default)]
    pub statistics: ProtocolStatisticsBody,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProtocolStatisticsBody {
    #[serde(default)]
    pub tcp: TcpStatistics,
    #[serde(default)]
    pub arp: ArpStatistics,
}

#[derive(Debug, Default, Deserialize)]
pub struct TcpStatistics {
    #[serde(rename = "sent-packets", default)]
    pub sent_packets: i64,
    #[serde(rename = "received-packets", default)]
    pub received_packets: i64,
    /// `"CLOSED"`, `"LISTEN"`, `"ESTABLISHED"`, ... → count
    #[serde(rename = "TCP connection count by state", default)]
    pub connection_count_by_state: BTreeMap<String, i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArpStatistics {
    #[serde(rename = "sent-requests", default)]
    pub sent_requests: i64,
    #[serde(rename = "received-requests", default)]
    pub received_requests: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProtocolStatistics {
    pub tcp_sent_packets: i64,
    pub tcp_received_packets: i64,
    pub arp_sent_requests: i64,
    pub arp_received_requests: i64,
    pub tcp_connection_count_by_state: BTreeMap<String, i64>,
}

// ---------------------------------------------------------------------------
// Gateways
// ---------------------------------------------------------------------------

/// `loss`, `delay` and `stddev` are formatted as `"%0.1f %"` / `"%0.1f ms"`
#[derive(Debug, Deserialize)]
pub struct GatewaysStatusResponse {
    #[serde(default)]
    pub items: Vec<GatewayRow>,
}

#[derive(Debug, Deserialize)]
pub struct GatewayRow {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub status_translated: String,
    #[serde(default)]
    pub loss: String,
    #[serde(default)]
    pub delay: String,
    #[serde(default)]
    pub stddev: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    Offline,
    Online,
    Unknown,
}

impl GatewayStatus {
    pub fn as_value(self) -> f64 {
        match self {
            GatewayStatus::Offline => 0.0,
            GatewayStatus::Online => 1.0,
            GatewayStatus::Unknown => 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gateway {
    pub name: String,
    pub address: String,
    pub status: GatewayStatus,
    pub loss_percentage: Option<f64>,
    pub rtt_milliseconds: Option<f64>,
    pub rttd_milliseconds: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gateways {
    pub gateways: Vec<Gateway>,
}

// ---------------------------------------------------------------------------
// Firmware
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct FirmwareStatusResponse {
    #[serde(default)]
    pub last_check: String,
    #[serde(default)]
    pub needs_reboot: String,
    #[serde(default)]
    pub os_version: String,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub product_version: String,
    #[serde(default)]
    pub product_abi: String,
    #[serde(default)]
    pub new_packages: Vec<serde_json::Value>,
    #[serde(default)]
    pub upgrade_packages: Vec<serde_json::Value>,
    #[serde(default)]
    pub product: FirmwareProduct,
}

#[derive(Debug, Default, Deserialize)]
pub struct FirmwareProduct {
    #[serde(default)]
    pub product_check: FirmwareProductCheck,
}

#[derive(Debug, Default, Deserialize)]
pub struct FirmwareProductCheck {
    #[serde(default)]
    pub upgrade_needs_reboot: String,
}

/// `needs_reboot` and `upgrade_needs_reboot` are `-1` when unknown
#[derive(Debug, Clone, PartialEq)]
pub struct FirmwareStatus {
    pub last_check: String,
    pub needs_reboot: i64,
    pub new_packages: usize,
    pub os_version: String,
    pub product_abi: String,
    pub product_id: String,
    pub product_version: String,
    pub upgrade_packages: usize,
    pub upgrade_needs_reboot: i64,
}

// ---------------------------------------------------------------------------
// OpenVPN
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct OpenVpnSearchResponse {
    #[serde(default)]
    pub rows: Vec<OpenVpnRow>,
}

#[derive(Debug, Deserialize)]
pub struct OpenVpnRow {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub dev_type: String,
    #[serde(default)]
    pub enabled: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenVpnInstance {
    pub uuid: String,
    pub description: String,
    /// Lowercased (`server` / `client`)
    pub role: String,
    pub device_type: String,
    pub enabled: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenVpnInstances {
    pub instances: Vec<OpenVpnInstance>,
}

// ---------------------------------------------------------------------------
// WireGuard
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct WireguardClientsResponse {
    #[serde(default)]
    pub rows: Vec<WireguardRow>,
}

/// A row is either an `interface` or a `peer`
#[derive(Debug, Deserialize)]
pub struct WireguardRow {
    #[serde(rename = "if", default)]
    pub device: String,
    #[serde(rename = "type", default)]
    pub row_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "ifname", default)]
    pub device_name: String,
    #[serde(rename = "latest-handshake", default)]
    pub latest_handshake: f64,
    #[serde(rename = "transfer-rx", default)]
    pub transfer_rx: f64,
    #[serde(rename = "transfer-tx", default)]
    pub transfer_tx: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireguardInterfaceStatus {
    Down,
    Up,
    Unknown,
}

impl WireguardInterfaceStatus {
    pub fn as_value(self) -> f64 {
        match self {
            WireguardInterfaceStatus::Down => 0.0,
            WireguardInterfaceStatus::Up => 1.0,
            WireguardInterfaceStatus::Unknown => 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WireguardInterface {
    pub device: String,
    pub device_type: String,
    pub device_name: String,
    pub name: String,
    pub status: WireguardInterfaceStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WireguardPeer {
    pub device: String,
    pub device_type: String,
    pub device_name: String,
    pub name: String,
    pub latest_handshake: f64,
    pub transfer_rx: f64,
    pub transfer_tx: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WireguardClients {
    pub interfaces: Vec<WireguardInterface>,
    pub peers: Vec<WireguardPeer>,
}

// ---------------------------------------------------------------------------
// IPsec
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct IpsecPhase1Response {
    #[serde(default)]
    pub rows: Vec<IpsecPhase1Row>,
}

#[derive(Debug, Deserialize)]
pub struct IpsecPhase1Row {
    #[serde(default)]
    pub phase1desc: String,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub ikeid: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "install-time", default)]
    pub install_time: serde_json::Value,
    #[serde(rename = "bytes-in", default)]
    pub bytes_in: i64,
    #[serde(rename = "bytes-out", default)]
    pub bytes_out: i64,
    #[serde(rename = "packets-in", default)]
    pub packets_in: i64,
    #[serde(rename = "packets-out", default)]
    pub packets_out: i64,
}

#[derive(Debug, Deserialize)]
pub struct IpsecPhase2Response {
    #[serde(default)]
    pub rows: Vec<IpsecPhase2Row>,
}

#[derive(Debug, Deserialize)]
pub struct IpsecPhase2Row {
    #[serde(default)]
    pub phase2desc: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "spi-in", default)]
    pub spi_in: String,
    #[serde(rename = "spi-out", default)]
    pub spi_out: String,
    #[serde(rename = "install-time", default)]
    pub install_time: serde_json::Value,
    #[serde(rename = "rekey-time", default)]
    pub rekey_time: serde_json::Value,
    #[serde(rename = "life-time", default)]
    pub life_time: serde_json::Value,
    #[serde(rename = "bytes-in", default)]
    pub bytes_in: i64,
    #[serde(rename = "bytes-out", default)]
    pub bytes_out: i64,
    #[serde(rename = "packets-in", default)]
    pub packets_in: i64,
    #[serde(rename = "packets-out", default)]
    pub packets_out: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IpsecPhase2 {
    pub description: String,
    pub name: String,
    pub spi_in: String,
    pub spi_out: String,
    pub install_time: i64,
    pub rekey_time: i64,
    pub life_time: i64,
    pub bytes_in: i64,
    pub bytes_out: i64,
    pub packets_in: i64,
    pub packets_out: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IpsecPhase1 {
    pub description: String,
    pub name: String,
    pub ike_id: String,
    pub connected: bool,
    pub install_time: i64,
    pub bytes_in: i64,
    pub bytes_out: i64,
    pub packets_in: i64,
    pub packets_out: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IpsecTunnels {
    pub tunnels: Vec<IpsecPhase1>,
}

// ---------------------------------------------------------------------------
// Unbound DNS
// ---------------------------------------------------------------------------

/// Every value in the unbound statistics tree is a decimal string
#[derive(Debug, Default, Deserialize)]
pub struct UnboundDnsStatusResponse {
    #[serde(default)]
    pub data: UnboundData,
}

#[derive(Debug, Default, Deserialize)]
pub struct UnboundData {
    #[serde(default)]
    pub total: UnboundTotal,
    #[serde(default)]
    pub time: UnboundTime,
    #[serde(default)]
    pub num: UnboundNum,
}

#[derive(Debug, Default, Deserialize)]
pub struct UnboundTotal {
    #[serde(default)]
    pub num: UnboundTotalNum,
}

#[derive(Debug, Default, Deserialize)]
pub struct UnboundTotalNum {
    #[serde(default)]
    pub queries: String,
    #[serde(default)]
    pub cachehits: String,
    #[serde(default)]
    pub cachemiss: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UnboundTime {
    #[serde(default)]
    pub up: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UnboundNum {
    #[serde(default)]
    pub query: UnboundQuery,
    #[serde(default)]
    pub answer: UnboundAnswer,
}

#[derive(Debug, Default, Deserialize)]
pub struct UnboundQuery {
    #[serde(rename = "type", default)]
    pub types: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UnboundAnswer {
    #[serde(default)]
    pub rcode: BTreeMap<String, String>,
    #[serde(default)]
    pub secure: String,
    #[serde(default)]
    pub bogus: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnboundDnsOverview {
    pub uptime_seconds: f64,
    pub queries_total: i64,
    pub cache_hits_total: i64,
    pub cache_misses_total: i64,
    pub answers_bogus_total: i64,
    pub answers_secure_total: i64,
    pub answer_rcodes: BTreeMap<String, i64>,
    pub query_types: BTreeMap<String, i64>,
}

// ---------------------------------------------------------------------------
// DHCPv4
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DhcpLeasesResponse {
    #[serde(default)]
    pub rows: Vec<DhcpLeaseRow>,
}

#[derive(Debug, Deserialize)]
pub struct DhcpLeaseRow {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(rename = "if_descr", default)]
    pub interface: String,
    #[serde(rename = "type", default)]
    pub lease_type: String,
    #[serde(default)]
    pub state: String,
}

/// Lease count per `(interface, type, state)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DhcpLeases {
    pub counts: BTreeMap<(String, String, String), u64>,
}
