use std::fmt::Write;
use tracing::info;

use crate::poll::{Distributor, SensorData};

/// Distributor writing every exported reading to the log
#[derive(Debug, Default)]
pub struct LoggingDistributor;

fn format_values(data: &SensorData) -> String {
    let mut out = String::new();
    for value in &data.values {
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = match value.value {
            Some(v) => write!(out, "{}={v:.2}", value.module),
            None => write!(out, "{}=?", value.module),
        };
    }
    out
}

impl Distributor for LoggingDistributor {
    fn export_data(&self, data: &SensorData) {
        info!(device = %data.device_id, "{}", format_values(data));
    }
}
