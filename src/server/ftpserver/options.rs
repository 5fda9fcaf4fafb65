//! Contains the setup options that can be given to the
//! [`Server`](crate::Server)

use bitflags::bitflags;
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::net::{IpAddr, Ipv4Addr};
use std::ops::RangeInclusive;

// Once we're sure about the types of these I think its good to expose it to
// the API user so that he/she can see what our server defaults are.
pub(crate) const DEFAULT_GREETING: &str = "FTP server ready";
pub(crate) const DEFAULT_IDLE_SESSION_TIMEOUT_SECS: u64 = 600;
pub(crate) const DEFAULT_PASSIVE_HOST: PassiveHost = PassiveHost::FromConnection;
pub(crate) const DEFAULT_PASSIVE_PORTS: RangeInclusive<u16> = 49152..=65534;
pub(crate) const DEFAULT_FTPS_TRUST_STORE: &str = "./trusted.pem";
pub(crate) const DEFAULT_MAX_STATS_AT_ONCE: usize = 5;

/// The option to
/// [`ServerBuilder::passive_host`](crate::ServerBuilder::passive_host). It
/// allows the user to specify how the IP address communicated in the _PASV_
/// response is determined.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PassiveHost {
    /// Use the IP address of the control connection
    FromConnection,
    /// Advertise this specific IP address
    Ip(Ipv4Addr),
}

impl From<Ipv4Addr> for PassiveHost {
    fn from(ip: Ipv4Addr) -> Self {
        PassiveHost::Ip(ip)
    }
}

impl From<[u8; 4]> for PassiveHost {
    fn from(ip: [u8; 4]) -> Self {
        PassiveHost::Ip(ip.into())
    }
}

bitflags! {
    /// Used to configure TLS options employed for FTPS
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TlsFlags: u32 {
        /// Enables TLS version 1.2
        const V1_2 = 0b00000001;
        /// Enables TLS version 1.3
        const V1_3 = 0b00000010;
        /// Enables the latest safe TLS versions i.e. 1.2 and 1.3
        const LATEST_VERSIONS = Self::V1_2.bits() | Self::V1_3.bits();
    }
}

impl Default for TlsFlags {
    fn default() -> TlsFlags {
        TlsFlags::LATEST_VERSIONS
    }
}

/// The option to
/// [`ServerBuilder::ftps_client_auth`](crate::ServerBuilder::ftps_client_auth).
/// Tells if and how mutual TLS (client certificate authentication) should be
/// handled.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum FtpsClientAuth {
    /// Mutual TLS is switched off and the server won't ask the client for a
    /// certificate in the TLS protocol. This is the default.
    #[default]
    Off,
    /// Mutual TLS is on and whilst the server will request a certificate it
    /// will still proceed without one. If a certificate is sent by the client
    /// it will be validated against the configured trust anchors (see
    /// [`ServerBuilder::ftps_trust_store`](crate::ServerBuilder::ftps_trust_store)).
    Request,
    /// Mutual TLS is on, the server will request a certificate and it won't
    /// proceed without a client certificate that validates against the
    /// configured trust anchors.
    Require,
}

impl From<bool> for FtpsClientAuth {
    fn from(on: bool) -> Self {
        match on {
            true => FtpsClientAuth::Require,
            false => FtpsClientAuth::Off,
        }
    }
}

impl Display for FtpsClientAuth {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FtpsClientAuth::Off => write!(f, "off"),
            FtpsClientAuth::Request => write!(f, "requested"),
            FtpsClientAuth::Require => write!(f, "required"),
        }
    }
}

/// Maps a file name to the key the default listing comparator sorts on. Set
/// through
/// [`ServerBuilder::filename_sort_map`](crate::ServerBuilder::filename_sort_map).
pub type FilenameSortMap = dyn Fn(&str) -> String + Send + Sync;

/// A complete replacement comparator for listing order. Set through
/// [`ServerBuilder::filename_sort_func`](crate::ServerBuilder::filename_sort_func).
pub type FilenameSortFunc = dyn Fn(&str, &str) -> Ordering + Send + Sync;

/// How the IP address for a PASV reply is picked, given the configured
/// [`PassiveHost`] and the address the control connection arrived on.
pub(crate) fn passive_reply_ip(host: PassiveHost, local: IpAddr) -> Option<Ipv4Addr> {
    match (host, local) {
        (PassiveHost::Ip(ip), _) => Some(ip),
        (PassiveHost::FromConnection, IpAddr::V4(ip)) => Some(ip),
        (PassiveHost::FromConnection, IpAddr::V6(ip)) => ip.to_ipv4_mapped(),
    }
}
