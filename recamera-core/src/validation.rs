//! Client-side checks for network settings
//!
//! Everything here runs before a request is sent to the device so that
//! malformed input can be reported against the offending field.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::error::ConsoleError;
use crate::Result;

/// Parse a dotted-quad IPv4 address with each octet in 0-255
pub fn validate_ipv4(field: &str, value: &str) -> Result<Ipv4Addr> {
    let parts: Vec<&str> = value.trim().split('.').collect();
    if parts.len() != 4 {
        return Err(ConsoleError::invalid_field(
            field,
            format!("expected 4 octets, got {}", parts.len()),
        ));
    }

    let mut octets = [0u8; 4];
    for (index, part) in parts.iter().enumerate() {
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConsoleError::invalid_field(
                field,
                format!("octet {} is not a number", index + 1),
            ));
        }
        let number: u16 = part
            .parse()
            .map_err(|_| ConsoleError::invalid_field(field, format!("octet {} is not a number", index + 1)))?;
        octets[index] = u8::try_from(number)
            .map_err(|_| ConsoleError::invalid_field(field, format!("octet {} is {}", index + 1, number)))?;
    }
    Ok(Ipv4Addr::from(octets))
}

/// Parse a subnet mask; the set bits must be contiguous from the top
pub fn validate_netmask(field: &str, value: &str) -> Result<Ipv4Addr> {
    let mask = validate_ipv4(field, value)?;
    let bits = u32::from(mask);
    if bits.leading_ones() + bits.trailing_zeros() != 32 {
        return Err(ConsoleError::invalid_field(field, "mask bits are not contiguous"));
    }
    Ok(mask)
}

/// Parse a TCP/UDP port in 1-65535
pub fn validate_port(field: &str, value: &str) -> Result<u16> {
    let port: u32 = value
        .trim()
        .parse()
        .map_err(|_| ConsoleError::invalid_field(field, format!("'{}' is not a number", value)))?;
    match u16::try_from(port) {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ConsoleError::invalid_field(field, format!("{} is out of range 1-65535", port))),
    }
}

/// How an interface obtains its address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AddressMethod {
    /// Lease from a DHCP server
    #[default]
    #[serde(rename = "DHCP")]
    Dhcp,
    /// Fixed address
    #[serde(rename = "Static")]
    Static,
}

/// Interface addressing as sent to the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticIpConfig {
    /// Addressing method
    #[serde(rename = "sGetMethod")]
    pub method: AddressMethod,
    /// Interface address
    #[serde(rename = "sIpAddress")]
    pub address: String,
    /// Default gateway
    #[serde(rename = "sIpGateway")]
    pub gateway: String,
    /// Subnet mask
    #[serde(rename = "sIpNetmask")]
    pub netmask: String,
    /// Primary DNS server
    #[serde(rename = "sDNS0")]
    pub dns0: String,
    /// Secondary DNS server
    #[serde(rename = "sDNS1")]
    pub dns1: String,
}

impl Default for StaticIpConfig {
    fn default() -> Self {
        Self {
            method: AddressMethod::Dhcp,
            address: "192.168.1.11".to_string(),
            gateway: "192.168.1.1".to_string(),
            netmask: "255.255.255.0".to_string(),
            dns0: "8.8.8.8".to_string(),
            dns1: "1.1.1.1".to_string(),
        }
    }
}

impl StaticIpConfig {
    /// Check every address field, reporting the first bad one
    pub fn validate(&self) -> Result<()> {
        validate_ipv4("address", &self.address)?;
        validate_ipv4("gateway", &self.gateway)?;
        validate_netmask("netmask", &self.netmask)?;
        validate_ipv4("dns0", &self.dns0)?;
        validate_ipv4("dns1", &self.dns1)?;
        Ok(())
    }
}
