// BLOB version prefix helpers. [version: u8][payload].
// preferences: version 1 = wincode `Preferences`.

pub(super) const BLOB_VERSION_PREFERENCES: u8 = 1;

pub(super) fn with_version_prefix(version: u8, payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(version);
    out.extend_from_slice(&payload);
    out
}

/// Payload after the version byte, or `None` if the blob is empty or carries another version.
pub(super) fn blob_payload(bytes: &[u8], expected_version: u8) -> Option<&[u8]> {
    match bytes.split_first() {
        Some((&version, payload)) if version == expected_version => Some(payload),
        _ => None,
    }
}

pub(super) fn blob_version(bytes: &[u8]) -> u8 {
    bytes.first().copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_requires_matching_version() {
        let blob = with_version_prefix(BLOB_VERSION_PREFERENCES, vec![7, 8]);
        assert_eq!(blob_version(&blob), BLOB_VERSION_PREFERENCES);
        assert_eq!(blob_payload(&blob, BLOB_VERSION_PREFERENCES), Some(&[7u8, 8][..]));
        assert_eq!(blob_payload(&blob, 9), None);
        assert_eq!(blob_payload(&[], BLOB_VERSION_PREFERENCES), None);
        assert_eq!(blob_version(&[]), 0);
    }
}
