//! Device-type auto-detection from login banners.
//!
//! A generic probe session logs in, elicits output with a bare line
//! ending, and the collected banner is matched against a fixed-priority
//! substring ruleset. Family defaults (bare `aruba` → `aruba_aoscx`, bare
//! `ubiquiti` → `ubiquiti_edgeswitch`) are heuristics; callers who know
//! better can classify their own banner with [`classify_banner`] or
//! simply override the result.

use log::debug;

use crate::credentials::Credentials;
use crate::dispatch;
use crate::error::{Error, Result};
use crate::options::AdvancedOptions;

/// Classify a login banner into a device-type tag.
///
/// Matching is case-insensitive and follows a fixed priority order, so a
/// banner containing both `cisco` and `nexus` resolves to `cisco_nxos`.
/// Returns `None` when nothing matches.
pub fn classify_banner(banner: &str) -> Option<&'static str> {
    let banner = banner.to_lowercase();
    let has = |needle: &str| banner.contains(needle);

    // "ios" alone is too eager: FortiOS contains it.
    let cisco_family = has("cisco")
        || has("nx-os")
        || has("nexus")
        || has("ios-xr")
        || has("ios-xe")
        || has("sg300")
        || (has("ios") && !has("fortios"));
    if cisco_family {
        if has("nx-os") || has("nexus") {
            return Some("cisco_nxos");
        }
        if has("ios-xr") {
            return Some("cisco_ios_xr");
        }
        if has("ios-xe") {
            return Some("cisco_ios_xe");
        }
        if has("asa") {
            return Some("cisco_asa");
        }
        if has("sg300") {
            return Some("cisco_sg300");
        }
        return Some("cisco_ios");
    }

    if has("junos") || has("juniper") {
        if has("srx") {
            return Some("juniper_srx");
        }
        return Some("juniper_junos");
    }

    if has("ciena") || has("saos") {
        return Some("ciena_saos");
    }

    if has("fortinet") || has("fortios") || has("fortigate") {
        return Some("fortinet_fortios");
    }

    if has("palo alto") || has("pan-os") {
        return Some("paloalto_panos");
    }

    if has("ericsson") || has("ipos") {
        return Some("ericsson_ipos");
    }

    if has("minilink") || has("mini-link") {
        return Some("ericsson_minilink");
    }

    if has("linux")
        || has("ubuntu")
        || has("centos")
        || has("redhat")
        || has("debian")
        || has("bash")
    {
        return Some("linux");
    }

    if has("huawei") || has("vrp") || has("ne8000") {
        return Some("huawei_vrp");
    }

    if has("arista") {
        return Some("arista_eos");
    }

    if has("procurve") {
        return Some("hp_procurve");
    }

    if has("aruba") {
        if has("arubaos") || has("mobility controller") {
            return Some("aruba_os");
        }
        return Some("aruba_aoscx");
    }

    if has("ubiquiti") || has("ubnt") {
        if has("edgerouter") || has("edgeos") {
            return Some("ubiquiti_edgerouter");
        }
        if has("edgeswitch") {
            return Some("ubiquiti_edgeswitch");
        }
        if has("unifi") {
            return Some("ubiquiti_unifi");
        }
        return Some("ubiquiti_edgeswitch");
    }

    if has("mikrotik") || has("routeros") || has("switchos") {
        if has("switchos") {
            return Some("mikrotik_switchos");
        }
        return Some("mikrotik_routeros");
    }

    if has("extremexos") || has("exos") {
        return Some("extreme_exos");
    }

    if has("dell") && has("os10") {
        return Some("dell_os10");
    }

    if has("versa") || has("flexvnf") {
        return Some("versa_flexvnf");
    }

    None
}

/// Probe a device with a generic session and classify its banner.
///
/// The probe session is always closed, whatever happens.
pub async fn auto_detect(
    credentials: &Credentials,
    options: &AdvancedOptions,
) -> Result<Option<String>> {
    let mut probe_credentials = credentials.clone();
    probe_credentials.device_type = "generic".to_string();

    // Minimal preparation is all a probe needs.
    let mut probe_options = options.clone();
    probe_options.fast_mode = true;

    let mut session = dispatch::create_session(probe_credentials, probe_options)?;

    let detected = async {
        session.connect().await?;
        let banner = session.probe_banner().await?;
        debug!("auto-detect collected {} banner bytes", banner.len());
        Ok::<_, Error>(classify_banner(&banner).map(str::to_string))
    }
    .await;

    let _ = session.disconnect().await;
    detected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_cisco_nexus() {
        // A banner naming both the company and the platform resolves to
        // the platform.
        assert_eq!(
            classify_banner("Cisco Nexus Operating System (NX-OS) Software"),
            Some("cisco_nxos")
        );
        assert_eq!(classify_banner("cisco with nexus inside"), Some("cisco_nxos"));
    }

    #[test]
    fn test_cisco_variants() {
        assert_eq!(classify_banner("Cisco IOS Software"), Some("cisco_ios"));
        assert_eq!(classify_banner("Cisco IOS-XE Software"), Some("cisco_ios_xe"));
        assert_eq!(classify_banner("Cisco IOS-XR Software"), Some("cisco_ios_xr"));
        assert_eq!(
            classify_banner("Cisco Adaptive Security Appliance ASA"),
            Some("cisco_asa")
        );
        assert_eq!(classify_banner("SG300-28 Managed Switch"), Some("cisco_sg300"));
    }

    #[test]
    fn test_fortios_is_not_cisco() {
        assert_eq!(
            classify_banner("FortiGate-100F FortiOS v7.2"),
            Some("fortinet_fortios")
        );
    }

    #[test]
    fn test_juniper_family() {
        assert_eq!(classify_banner("JUNOS 21.2R3"), Some("juniper_junos"));
        assert_eq!(classify_banner("Juniper SRX340"), Some("juniper_srx"));
    }

    #[test]
    fn test_linux_distributions() {
        assert_eq!(classify_banner("Welcome to Ubuntu 22.04"), Some("linux"));
        assert_eq!(classify_banner("GNU bash, version 5.1"), Some("linux"));
    }

    #[test]
    fn test_aruba_default_is_aoscx() {
        assert_eq!(classify_banner("ArubaOS (MODEL: 7205)"), Some("aruba_os"));
        assert_eq!(
            classify_banner("Aruba Mobility Controller"),
            Some("aruba_os")
        );
        assert_eq!(classify_banner("Aruba 6300M"), Some("aruba_aoscx"));
    }

    #[test]
    fn test_ubiquiti_family() {
        assert_eq!(classify_banner("Welcome to EdgeOS ubnt"), Some("ubiquiti_edgerouter"));
        assert_eq!(classify_banner("ubnt EdgeSwitch 24"), Some("ubiquiti_edgeswitch"));
        assert_eq!(classify_banner("UBNT UniFi Switch"), Some("ubiquiti_unifi"));
        assert_eq!(classify_banner("Ubiquiti something"), Some("ubiquiti_edgeswitch"));
    }

    #[test]
    fn test_mikrotik_and_extreme() {
        assert_eq!(classify_banner("MikroTik RouterOS 7.10"), Some("mikrotik_routeros"));
        assert_eq!(classify_banner("SwitchOS SwOS"), Some("mikrotik_switchos"));
        assert_eq!(classify_banner("ExtremeXOS version 31"), Some("extreme_exos"));
    }

    #[test]
    fn test_dell_needs_both_markers() {
        assert_eq!(classify_banner("Dell EMC Networking OS10"), Some("dell_os10"));
        assert_eq!(classify_banner("Dell PowerEdge"), None);
    }

    #[test]
    fn test_huawei_and_versa() {
        assert_eq!(classify_banner("Huawei VRP (R) software"), Some("huawei_vrp"));
        assert_eq!(classify_banner("NE8000 M8"), Some("huawei_vrp"));
        assert_eq!(classify_banner("Versa FlexVNF"), Some("versa_flexvnf"));
    }

    #[test]
    fn test_unknown_banner() {
        assert_eq!(classify_banner("login successful, have fun"), None);
        assert_eq!(classify_banner(""), None);
    }
}
