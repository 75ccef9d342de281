//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - The session lifecycle against the scripted mock driver
//! - Power transitions driven by the device-state cache
//! - The full publish path: daemon -> channel publisher -> dispatcher -> sinks
//! - Configuration loading

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod daemon_tests;
#[cfg(test)]
mod pipeline_tests;

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }
}
