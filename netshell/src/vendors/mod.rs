//! Vendor plugins and the device-type registry.
//!
//! One module per vendor family; each session type overrides only its
//! dialect deltas on [`DeviceSession`](crate::session::DeviceSession).
//! The registry maps device-type tags to constructors as data, so adding
//! a vendor is one module and one `insert`.

pub mod arista;
pub mod aruba;
pub mod ciena;
pub mod cisco;
pub mod dell;
pub mod ericsson;
pub mod extreme;
pub mod fortinet;
pub mod generic;
pub mod hp_procurve;
pub mod huawei;
pub mod juniper;
pub mod linux;
pub mod mikrotik;
pub mod paloalto;
pub mod ubiquiti;
pub mod versa;
pub mod vyos;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::credentials::Credentials;
use crate::options::AdvancedOptions;
use crate::session::DeviceSession;

pub use arista::AristaSession;
pub use aruba::{ArubaCxSession, ArubaOsSession};
pub use ciena::CienaSaosSession;
pub use cisco::{CiscoIosSession, CiscoSg300Session, CiscoXrSession};
pub use dell::DellOs10Session;
pub use ericsson::{EricssonIposSession, EricssonMinilinkSession};
pub use extreme::ExtremeExosSession;
pub use fortinet::FortinetSession;
pub use generic::GenericSession;
pub use hp_procurve::HpProcurveSession;
pub use huawei::HuaweiSession;
pub use juniper::JuniperSession;
pub use linux::LinuxSession;
pub use mikrotik::MikrotikSession;
pub use paloalto::PaloAltoSession;
pub use ubiquiti::{EdgeRouterSession, EdgeSwitchSession, UnifiSession};
pub use versa::VersaSession;
pub use vyos::VyosSession;

/// Constructor for one vendor session.
pub type SessionFactory = fn(Credentials, AdvancedOptions) -> Box<dyn DeviceSession>;

/// Device-type tag → session constructor, in documentation order.
pub static DEVICE_TYPES: Lazy<IndexMap<&'static str, SessionFactory>> = Lazy::new(|| {
    let mut table: IndexMap<&'static str, SessionFactory> = IndexMap::new();

    table.insert("cisco_ios", |c, o| {
        Box::new(CiscoIosSession::new(c, o, "cisco_ios"))
    });
    table.insert("cisco_ios_xe", |c, o| {
        Box::new(CiscoIosSession::new(c, o, "cisco_ios_xe"))
    });
    table.insert("cisco_nxos", |c, o| {
        Box::new(CiscoIosSession::new(c, o, "cisco_nxos"))
    });
    table.insert("cisco_asa", |c, o| {
        Box::new(CiscoIosSession::new(c, o, "cisco_asa"))
    });
    table.insert("cisco_ios_xr", |c, o| Box::new(CiscoXrSession::new(c, o)));
    table.insert("cisco_sg300", |c, o| Box::new(CiscoSg300Session::new(c, o)));
    table.insert("arista_eos", |c, o| Box::new(AristaSession::new(c, o)));
    table.insert("juniper_junos", |c, o| {
        Box::new(JuniperSession::new(c, o, "juniper_junos"))
    });
    table.insert("juniper_srx", |c, o| {
        Box::new(JuniperSession::new(c, o, "juniper_srx"))
    });
    table.insert("paloalto_panos", |c, o| Box::new(PaloAltoSession::new(c, o)));
    table.insert("ciena_saos", |c, o| Box::new(CienaSaosSession::new(c, o)));
    table.insert("fortinet_fortios", |c, o| Box::new(FortinetSession::new(c, o)));
    table.insert("ericsson_ipos", |c, o| {
        Box::new(EricssonIposSession::new(c, o))
    });
    table.insert("ericsson_minilink", |c, o| {
        Box::new(EricssonMinilinkSession::new(c, o))
    });
    table.insert("linux", |c, o| Box::new(LinuxSession::new(c, o)));
    table.insert("vyos", |c, o| Box::new(VyosSession::new(c, o)));
    table.insert("huawei_vrp", |c, o| Box::new(HuaweiSession::new(c, o)));
    table.insert("hp_procurve", |c, o| Box::new(HpProcurveSession::new(c, o)));
    table.insert("aruba_os", |c, o| Box::new(ArubaOsSession::new(c, o)));
    table.insert("aruba_aoscx", |c, o| Box::new(ArubaCxSession::new(c, o)));
    table.insert("ubiquiti_edgeswitch", |c, o| {
        Box::new(EdgeSwitchSession::new(c, o))
    });
    table.insert("ubiquiti_edgerouter", |c, o| {
        Box::new(EdgeRouterSession::new(c, o))
    });
    table.insert("ubiquiti_unifi", |c, o| Box::new(UnifiSession::new(c, o)));
    table.insert("mikrotik_routeros", |c, o| {
        Box::new(MikrotikSession::new(c, o, "mikrotik_routeros"))
    });
    table.insert("mikrotik_switchos", |c, o| {
        Box::new(MikrotikSession::new(c, o, "mikrotik_switchos"))
    });
    table.insert("extreme_exos", |c, o| Box::new(ExtremeExosSession::new(c, o)));
    table.insert("dell_os10", |c, o| Box::new(DellOs10Session::new(c, o)));
    table.insert("versa_flexvnf", |c, o| Box::new(VersaSession::new(c, o)));
    table.insert("generic", |c, o| Box::new(GenericSession::new(c, o)));

    table
});

/// The supported device-type tags, in registry order.
pub fn supported_device_types() -> Vec<&'static str> {
    DEVICE_TYPES.keys().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tag_builds_its_own_type() {
        for (tag, factory) in DEVICE_TYPES.iter() {
            let session = factory(
                Credentials::password_login("h", "u", "p", *tag),
                AdvancedOptions::default(),
            );
            assert_eq!(session.device_type(), *tag, "factory for {tag}");
        }
    }

    #[test]
    fn test_registry_covers_the_documented_tags() {
        let tags = supported_device_types();
        for expected in [
            "cisco_ios",
            "cisco_ios_xr",
            "juniper_junos",
            "paloalto_panos",
            "huawei_vrp",
            "mikrotik_routeros",
            "extreme_exos",
            "ubiquiti_unifi",
            "generic",
        ] {
            assert!(tags.contains(&expected), "missing {expected}");
        }
    }
}
