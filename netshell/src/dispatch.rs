//! Device-type dispatch.
//!
//! Maps a device-type tag to its vendor session (via the registry in
//! [`crate::vendors`]) and wraps the session in a jump-host decorator
//! when the credentials carry a bastion block. The returned session is
//! not yet connected.

use crate::credentials::Credentials;
use crate::error::{DispatchError, Result};
use crate::jump_host::JumpHostSession;
use crate::options::AdvancedOptions;
use crate::session::DeviceSession;
use crate::vendors::{DEVICE_TYPES, supported_device_types};

/// Build the session for `credentials.device_type`.
///
/// Tags are matched case-insensitively; unknown tags fail with the list
/// of supported tags.
pub fn create_session(
    credentials: Credentials,
    options: AdvancedOptions,
) -> Result<Box<dyn DeviceSession>> {
    let tag = credentials.device_type.to_lowercase();
    let factory = DEVICE_TYPES
        .get(tag.as_str())
        .ok_or_else(|| DispatchError::UnsupportedDeviceType {
            tag: tag.clone(),
            supported: supported_device_types()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        })?;

    if let Some(jump) = &credentials.jump_host {
        if jump.host.trim().is_empty() || jump.username.trim().is_empty() {
            return Err(DispatchError::InvalidCredentials {
                message: "jump-host block must carry host and username".to_string(),
            }
            .into());
        }
    }

    let mut credentials = credentials;
    credentials.device_type = tag;
    let wrap_jump = credentials.jump_host.is_some();

    let session = factory(credentials, options);
    if wrap_jump {
        Ok(Box::new(JumpHostSession::new(session)))
    } else {
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tag_lists_supported_types() {
        let result = create_session(
            Credentials::password_login("h", "u", "p", "cisco_catalyst_9000"),
            AdvancedOptions::default(),
        );
        match result {
            Err(crate::error::Error::Dispatch(DispatchError::UnsupportedDeviceType {
                tag,
                supported,
            })) => {
                assert_eq!(tag, "cisco_catalyst_9000");
                assert!(supported.contains(&"cisco_ios".to_string()));
                assert!(supported.contains(&"generic".to_string()));
            }
            other => panic!("expected UnsupportedDeviceType, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_tag_lookup_is_case_insensitive() {
        let session = create_session(
            Credentials::password_login("h", "u", "p", "Cisco_IOS"),
            AdvancedOptions::default(),
        )
        .unwrap();
        assert_eq!(session.device_type(), "cisco_ios");
    }

    #[test]
    fn test_jump_host_block_wraps_session() {
        let credentials: Credentials = serde_json::from_str(
            r#"{
                "host": "10.0.0.1",
                "username": "admin",
                "auth": {"password": "pw"},
                "deviceType": "linux",
                "jumpHost": {"host": "bastion", "username": "jump", "auth": {"password": "hop"}}
            }"#,
        )
        .unwrap();
        let session = create_session(credentials, AdvancedOptions::default()).unwrap();
        // The decorator reports the wrapped vendor's type.
        assert_eq!(session.device_type(), "linux");
        assert!(!session.is_connected());
    }
}
