use serde::Serialize;

use super::models::NodeStatus;

/// Garage splits data into this many partitions
pub const PARTITION_COUNT: u64 = 256;

const DISPLAY_DECIMALS: usize = 2;

const BYTE_UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Rounded share of `part` in `total`, 0 when `total` is 0
pub fn calculate_percentage(part: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u64
}

/// Human readable size in binary units, e.g. `1.5 MB`
pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut exponent = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && exponent < BYTE_UNITS.len() - 1 {
        scaled /= 1024;
        exponent += 1;
    }
    let value = bytes as f64 / 1024f64.powi(exponent as i32);

    let rendered = format!("{:.*}", decimals, value);
    let trimmed = if rendered.contains('.') {
        rendered.trim_end_matches('0').trim_end_matches('.')
    } else {
        rendered.as_str()
    };
    format!("{} {}", trimmed, BYTE_UNITS[exponent])
}

/// Cluster-wide data partition totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSummary {
    pub total_storage: u64,
    pub available_storage: u64,
    pub used_storage: u64,
    pub used_percent: u64,
    /// What can still be written before the fullest node runs out, given
    /// that data is spread over all partitions. `None` unless nodes report
    /// their partition counts, which Garage v1 status does not.
    pub usable_storage: Option<u64>,
    pub formatted: FormattedSizes,
}

/// The summary sizes rendered for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedSizes {
    pub total_storage: String,
    pub available_storage: String,
    pub used_storage: String,
    pub usable_storage: Option<String>,
}

impl StorageSummary {
    pub fn from_nodes(nodes: &[NodeStatus]) -> Self {
        let partitions = nodes.iter().filter_map(|n| n.data_partition);
        let total_storage: u64 = partitions.clone().map(|p| p.total).sum();
        let available_storage: u64 = partitions.map(|p| p.available).sum();
        let used_storage = total_storage.saturating_sub(available_storage);

        let usable_storage = nodes
            .iter()
            .filter_map(|n| match (n.data_partition, n.partition_count) {
                (Some(p), Some(count)) if count > 0 => Some(p.available / count),
                _ => None,
            })
            .min()
            .map(|per_partition| per_partition.saturating_mul(PARTITION_COUNT));

        Self {
            total_storage,
            available_storage,
            used_storage,
            used_percent: calculate_percentage(used_storage, total_storage),
            usable_storage,
            formatted: FormattedSizes {
                total_storage: format_bytes(total_storage, DISPLAY_DECIMALS),
                available_storage: format_bytes(available_storage, DISPLAY_DECIMALS),
                used_storage: format_bytes(used_storage, DISPLAY_DECIMALS),
                usable_storage: usable_storage.map(|b| format_bytes(b, DISPLAY_DECIMALS)),
            },
        }
    }
}
