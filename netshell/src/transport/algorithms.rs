//! SSH algorithm profiles for progressive negotiation fallback.
//!
//! Network equipment spans twenty years of SSH stacks. Connections are
//! attempted with the modern profile first, then a legacy profile
//! (group-exchange and CBC-era algorithms), then an ultra-legacy profile
//! for gear that only speaks `diffie-hellman-group1-sha1` with `3des-cbc`.

use std::borrow::Cow;

use russh::keys::{Algorithm, EcdsaCurve, HashAlg};
use russh::{Preferred, cipher, compression, kex, mac};

/// Key exchange algorithms for the modern profile.
pub const MODERN_KEX_ORDER: &[kex::Name] = &[
    kex::CURVE25519,
    kex::CURVE25519_PRE_RFC_8731,
    kex::ECDH_SHA2_NISTP256,
    kex::ECDH_SHA2_NISTP384,
    kex::ECDH_SHA2_NISTP521,
    kex::DH_G14_SHA256,
    kex::DH_G16_SHA512,
];

/// Key exchange algorithms for the legacy profile.
pub const LEGACY_KEX_ORDER: &[kex::Name] = &[
    kex::DH_GEX_SHA256,
    kex::DH_GEX_SHA1,
    kex::DH_G14_SHA256,
    kex::DH_G14_SHA1,
];

/// Key exchange algorithms for the ultra-legacy profile.
pub const ULTRA_LEGACY_KEX_ORDER: &[kex::Name] = &[kex::DH_G1_SHA1, kex::DH_G14_SHA1];

/// Ciphers for the modern profile.
pub const MODERN_CIPHERS: &[cipher::Name] = &[
    cipher::CHACHA20_POLY1305,
    cipher::AES_256_GCM,
    cipher::AES_256_CTR,
    cipher::AES_192_CTR,
    cipher::AES_128_CTR,
];

/// Ciphers for the legacy profile (adds the CBC-era modes).
pub const LEGACY_CIPHERS: &[cipher::Name] = &[
    cipher::AES_256_CTR,
    cipher::AES_192_CTR,
    cipher::AES_128_CTR,
    cipher::AES_256_CBC,
    cipher::AES_192_CBC,
    cipher::AES_128_CBC,
];

/// Ciphers for the ultra-legacy profile.
pub const ULTRA_LEGACY_CIPHERS: &[cipher::Name] = &[
    cipher::TRIPLE_DES_CBC,
    cipher::AES_128_CBC,
];

/// MAC algorithms for the modern profile.
pub const MODERN_MAC_ALGORITHMS: &[mac::Name] = &[
    mac::HMAC_SHA256_ETM,
    mac::HMAC_SHA512_ETM,
    mac::HMAC_SHA256,
    mac::HMAC_SHA512,
];

/// MAC algorithms for the legacy profile.
pub const LEGACY_MAC_ALGORITHMS: &[mac::Name] = &[
    mac::HMAC_SHA256,
    mac::HMAC_SHA512,
    mac::HMAC_SHA1_ETM,
    mac::HMAC_SHA1,
];

/// MAC algorithms for the ultra-legacy profile.
///
/// russh implements no `hmac-md5`; `hmac-sha1` is the weakest MAC this
/// profile can offer.
pub const ULTRA_LEGACY_MAC_ALGORITHMS: &[mac::Name] = &[mac::HMAC_SHA1];

/// Host key algorithms for the modern profile.
pub const MODERN_KEY_TYPES: &[Algorithm] = &[
    Algorithm::Ed25519,
    Algorithm::Ecdsa {
        curve: EcdsaCurve::NistP256,
    },
    Algorithm::Ecdsa {
        curve: EcdsaCurve::NistP384,
    },
    Algorithm::Ecdsa {
        curve: EcdsaCurve::NistP521,
    },
    Algorithm::Rsa {
        hash: Some(HashAlg::Sha512),
    },
    Algorithm::Rsa {
        hash: Some(HashAlg::Sha256),
    },
];

/// Host key algorithms for the legacy profile.
pub const LEGACY_KEY_TYPES: &[Algorithm] = &[
    Algorithm::Rsa {
        hash: Some(HashAlg::Sha256),
    },
    Algorithm::Rsa { hash: None },
    Algorithm::Dsa,
];

/// Host key algorithms for the ultra-legacy profile.
pub const ULTRA_LEGACY_KEY_TYPES: &[Algorithm] = &[Algorithm::Rsa { hash: None }, Algorithm::Dsa];

/// Compression algorithms, shared by every profile.
pub const DEFAULT_COMPRESSION_ALGORITHMS: &[compression::Name] = &[
    compression::NONE,
    compression::ZLIB,
    compression::ZLIB_LEGACY,
];

/// One tier of the progressive negotiation fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmProfile {
    /// Current-generation algorithms.
    Modern,
    /// Group-exchange kex, CBC ciphers, SHA-1 MACs, ssh-rsa/ssh-dss keys.
    Legacy,
    /// dh-group1-sha1 and 3des-cbc for the oldest gear.
    UltraLegacy,
}

impl AlgorithmProfile {
    /// The fallback chain, in the order profiles are attempted.
    pub const FALLBACK_CHAIN: [AlgorithmProfile; 3] = [
        AlgorithmProfile::Modern,
        AlgorithmProfile::Legacy,
        AlgorithmProfile::UltraLegacy,
    ];

    /// The russh preference table for this profile.
    pub fn preferred(&self) -> Preferred {
        match self {
            AlgorithmProfile::Modern => Preferred {
                kex: Cow::Borrowed(MODERN_KEX_ORDER),
                key: Cow::Borrowed(MODERN_KEY_TYPES),
                cipher: Cow::Borrowed(MODERN_CIPHERS),
                mac: Cow::Borrowed(MODERN_MAC_ALGORITHMS),
                compression: Cow::Borrowed(DEFAULT_COMPRESSION_ALGORITHMS),
            },
            AlgorithmProfile::Legacy => Preferred {
                kex: Cow::Borrowed(LEGACY_KEX_ORDER),
                key: Cow::Borrowed(LEGACY_KEY_TYPES),
                cipher: Cow::Borrowed(LEGACY_CIPHERS),
                mac: Cow::Borrowed(LEGACY_MAC_ALGORITHMS),
                compression: Cow::Borrowed(DEFAULT_COMPRESSION_ALGORITHMS),
            },
            AlgorithmProfile::UltraLegacy => Preferred {
                kex: Cow::Borrowed(ULTRA_LEGACY_KEX_ORDER),
                key: Cow::Borrowed(ULTRA_LEGACY_KEY_TYPES),
                cipher: Cow::Borrowed(ULTRA_LEGACY_CIPHERS),
                mac: Cow::Borrowed(ULTRA_LEGACY_MAC_ALGORITHMS),
                compression: Cow::Borrowed(DEFAULT_COMPRESSION_ALGORITHMS),
            },
        }
    }
}

impl std::fmt::Display for AlgorithmProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlgorithmProfile::Modern => write!(f, "modern"),
            AlgorithmProfile::Legacy => write!(f, "legacy"),
            AlgorithmProfile::UltraLegacy => write!(f, "ultra-legacy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_chain_order() {
        assert_eq!(
            AlgorithmProfile::FALLBACK_CHAIN,
            [
                AlgorithmProfile::Modern,
                AlgorithmProfile::Legacy,
                AlgorithmProfile::UltraLegacy,
            ]
        );
    }

    #[test]
    fn test_modern_profile_excludes_weak_algorithms() {
        let preferred = AlgorithmProfile::Modern.preferred();
        assert!(preferred.kex.iter().all(|alg| *alg != kex::DH_G1_SHA1));
        assert!(
            preferred
                .cipher
                .iter()
                .all(|alg| *alg != cipher::TRIPLE_DES_CBC)
        );
        assert!(preferred.mac.iter().all(|alg| *alg != mac::HMAC_SHA1));
        assert!(preferred.key.iter().all(|alg| *alg != Algorithm::Dsa));
    }

    #[test]
    fn test_ultra_legacy_keeps_oldest_algorithms() {
        let preferred = AlgorithmProfile::UltraLegacy.preferred();
        assert!(preferred.kex.contains(&kex::DH_G1_SHA1));
        assert!(preferred.cipher.contains(&cipher::TRIPLE_DES_CBC));
        assert!(preferred.key.contains(&Algorithm::Dsa));
    }
}
