//! Host-derived device identity

use std::fs;
use std::path::PathBuf;

use inkframe_state::DeviceIdProvider;
use tracing::warn;

const ID_LEN: usize = 8;
const FALLBACK_ID: &str = "00000000";

/// Derives the device id from the host's machine id
///
/// Uses the first eight hex digits of the machine-id file, which is stable
/// across reboots like a hardware serial.
#[derive(Debug, Clone)]
pub struct MachineIdProvider {
    path: PathBuf,
}

impl Default for MachineIdProvider {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/etc/machine-id"),
        }
    }
}

impl MachineIdProvider {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DeviceIdProvider for MachineIdProvider {
    fn device_id(&self) -> String {
        match fs::read_to_string(&self.path) {
            Ok(contents) => derive_id(&contents).unwrap_or_else(|| {
                warn!(path = %self.path.display(), "machine id is not hexadecimal");
                FALLBACK_ID.to_string()
            }),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read machine id");
                FALLBACK_ID.to_string()
            }
        }
    }
}

/// Lowercase the first eight hex digits of `raw`
fn derive_id(raw: &str) -> Option<String> {
    let digits: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '-')
        .take(ID_LEN)
        .collect();

    if digits.len() == ID_LEN && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(digits.to_ascii_lowercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("4c4c4544004b5a10\n", Some("4c4c4544"))]
    #[case("ABCDEF0123456789", Some("abcdef01"))]
    #[case("12ab-34cd-56ef", Some("12ab34cd"))]
    #[case("abc", None)]
    #[case("zzzzzzzzzz", None)]
    fn test_derive_id(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(derive_id(raw).as_deref(), expected);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let provider = MachineIdProvider::from_path("/nonexistent/inkframe/machine-id");
        assert_eq!(provider.device_id(), FALLBACK_ID);
    }
}
