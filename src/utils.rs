//! Utility functions for identifiers and hashing

use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique, time ordered id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

/// Identifier for a freshly created report, e.g. `report1...`
pub fn new_report_id() -> anyhow::Result<String> {
    new_uuid_to_bech32("report")
}

/// Hex sha256 digest of an uploaded blob, logged alongside the stored path
pub fn content_digest(bytes: &[u8]) -> String {
    sha256::digest(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_ids_are_unique_and_prefixed() {
        let a = new_report_id().unwrap();
        let b = new_report_id().unwrap();

        assert!(a.starts_with("report1"));
        assert_ne!(a, b);
    }

    #[test]
    fn empty_hrp_is_rejected() {
        assert!(new_uuid_to_bech32("").is_err());
    }

    #[test]
    fn digest_is_hex_sha256() {
        let digest = content_digest(b"photo");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, content_digest(b"photo"));
    }
}
