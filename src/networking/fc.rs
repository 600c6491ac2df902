//! Fibre Channel network requests

use anyhow::Result;
use serde::Serialize;
use std::fmt;

pub const FC_NETWORK_TYPE: &str = "fc-networkV2";

pub const DEFAULT_TYPICAL_BANDWIDTH_GBPS: f64 = 2.5;
pub const DEFAULT_MAXIMUM_BANDWIDTH_GBPS: f64 = 10.0;
pub const DEFAULT_LINK_STABILITY_SECS: u32 = 30;

const MIN_BANDWIDTH_GBPS: f64 = 0.1;
const MAX_BANDWIDTH_GBPS: f64 = 20.0;
const MIN_LINK_STABILITY_SECS: u32 = 1;
const MAX_LINK_STABILITY_SECS: u32 = 1800;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FabricType {
    /// Connected through a SAN switch
    FabricAttach,
    /// Connected straight to a storage system port
    DirectAttach,
}

impl fmt::Display for FabricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FabricAttach => write!(f, "FabricAttach"),
            Self::DirectAttach => write!(f, "DirectAttach"),
        }
    }
}

/// Body of `POST /rest/fc-networks`
///
/// Bandwidths are in Mb/s on the wire. Login redistribution, link stability
/// and the managed SAN only apply to fabric-attached networks and are left
/// out of direct-attach bodies.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FcNetworkRequest {
    pub name: String,
    pub fabric_type: FabricType,
    pub typical_bandwidth: u32,
    pub maximum_bandwidth: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_login_redistribution: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_stability_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_san_uri: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl FcNetworkRequest {
    /// Fabric-attached network with redistribution on and the default link stability
    pub fn fabric_attach(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fabric_type: FabricType::FabricAttach,
            typical_bandwidth: gbps_to_mbps(DEFAULT_TYPICAL_BANDWIDTH_GBPS),
            maximum_bandwidth: gbps_to_mbps(DEFAULT_MAXIMUM_BANDWIDTH_GBPS),
            auto_login_redistribution: Some(true),
            link_stability_time: Some(DEFAULT_LINK_STABILITY_SECS),
            managed_san_uri: None,
            kind: FC_NETWORK_TYPE,
        }
    }

    pub fn direct_attach(name: &str) -> Self {
        Self {
            fabric_type: FabricType::DirectAttach,
            auto_login_redistribution: None,
            link_stability_time: None,
            ..Self::fabric_attach(name)
        }
    }

    /// Typical and maximum bandwidth in Gb/s
    pub fn bandwidth(mut self, typical_gbps: f64, maximum_gbps: f64) -> Self {
        self.typical_bandwidth = gbps_to_mbps(typical_gbps);
        self.maximum_bandwidth = gbps_to_mbps(maximum_gbps);
        self
    }

    pub fn auto_login_redistribution(mut self, enabled: bool) -> Self {
        if self.fabric_type == FabricType::FabricAttach {
            self.auto_login_redistribution = Some(enabled);
        }
        self
    }

    pub fn link_stability_time(mut self, secs: u32) -> Self {
        if self.fabric_type == FabricType::FabricAttach {
            self.link_stability_time = Some(secs);
        }
        self
    }

    pub fn managed_san(mut self, uri: &str) -> Self {
        if self.fabric_type == FabricType::FabricAttach {
            self.managed_san_uri = Some(uri.to_string());
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let min = gbps_to_mbps(MIN_BANDWIDTH_GBPS);
        let max = gbps_to_mbps(MAX_BANDWIDTH_GBPS);

        if !(min..=max).contains(&self.typical_bandwidth) {
            anyhow::bail!(
                "Typical bandwidth must be between {} and {} Gb/s",
                MIN_BANDWIDTH_GBPS,
                MAX_BANDWIDTH_GBPS
            );
        }
        if !(min..=max).contains(&self.maximum_bandwidth) {
            anyhow::bail!(
                "Maximum bandwidth must be between {} and {} Gb/s",
                MIN_BANDWIDTH_GBPS,
                MAX_BANDWIDTH_GBPS
            );
        }
        if self.typical_bandwidth > self.maximum_bandwidth {
            anyhow::bail!("Typical bandwidth must be less than or equal to the maximum bandwidth");
        }
        if let Some(secs) = self.link_stability_time {
            if !(MIN_LINK_STABILITY_SECS..=MAX_LINK_STABILITY_SECS).contains(&secs) {
                anyhow::bail!(
                    "Link stability time must be between {} and {} seconds",
                    MIN_LINK_STABILITY_SECS,
                    MAX_LINK_STABILITY_SECS
                );
            }
        }
        Ok(())
    }
}

/// Gb/s to the whole Mb/s the appliance expects
fn gbps_to_mbps(gbps: f64) -> u32 {
    if gbps <= 0.0 {
        return 0;
    }
    (gbps * 1000.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fabric_attach_body() {
        let request = FcNetworkRequest::fabric_attach("SAN-A")
            .managed_san("/rest/fc-sans/managed-sans/1")
            .link_stability_time(60);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "name": "SAN-A",
                "fabricType": "FabricAttach",
                "typicalBandwidth": 2500,
                "maximumBandwidth": 10000,
                "autoLoginRedistribution": true,
                "linkStabilityTime": 60,
                "managedSanUri": "/rest/fc-sans/managed-sans/1",
                "type": "fc-networkV2"
            })
        );
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_direct_attach_drops_fabric_settings() {
        let request = FcNetworkRequest::direct_attach("DA")
            .managed_san("/rest/fc-sans/managed-sans/1")
            .auto_login_redistribution(false)
            .bandwidth(8.0, 8.0);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["fabricType"], "DirectAttach");
        assert_eq!(body["typicalBandwidth"], 8000);
        assert!(body.get("managedSanUri").is_none());
        assert!(body.get("autoLoginRedistribution").is_none());
        assert!(body.get("linkStabilityTime").is_none());
    }

    #[test]
    fn test_bandwidth_bounds() {
        assert!(FcNetworkRequest::fabric_attach("n").bandwidth(0.1, 20.0).validate().is_ok());
        assert!(FcNetworkRequest::fabric_attach("n").bandwidth(0.05, 1.0).validate().is_err());
        assert!(FcNetworkRequest::fabric_attach("n").bandwidth(1.0, 25.0).validate().is_err());
        let err = FcNetworkRequest::fabric_attach("n")
            .bandwidth(8.0, 4.0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("less than or equal"));
    }

    #[test]
    fn test_link_stability_bounds() {
        assert!(FcNetworkRequest::fabric_attach("n").link_stability_time(1).validate().is_ok());
        assert!(FcNetworkRequest::fabric_attach("n").link_stability_time(1800).validate().is_ok());
        assert!(FcNetworkRequest::fabric_attach("n").link_stability_time(0).validate().is_err());
        assert!(FcNetworkRequest::fabric_attach("n").link_stability_time(1801).validate().is_err());
    }

    #[test]
    fn test_gbps_to_mbps() {
        assert_eq!(gbps_to_mbps(2.5), 2500);
        assert_eq!(gbps_to_mbps(0.1), 100);
        assert_eq!(gbps_to_mbps(4.1), 4100);
        assert_eq!(gbps_to_mbps(-1.0), 0);
    }
}
