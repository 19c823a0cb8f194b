#![allow(dead_code)]

pub mod mock_transport;

use sms_alerter::config::AlertConfig;
use sms_alerter::core::{RecipientId, Severity};

/// The alert settings most tests run with.
pub fn test_alert_config(threshold: Severity) -> AlertConfig {
    AlertConfig::new(
        "OpsTeam",
        vec![RecipientId::new(31600000000), RecipientId::new(31611111111)],
        threshold,
    )
    .expect("test alert config is valid")
}
