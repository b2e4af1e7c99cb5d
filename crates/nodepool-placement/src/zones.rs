//! Distribution of pool-wide counts over a pool's zones.
//!
//! Zone `i` of `n` receives `floor(total / n)`, plus one when
//! `i < total % n`. The result depends only on the inputs, so repeated
//! passes always agree on per-zone counts.

use serde::Serialize;

use nodepool_core::{IntOrPercent, WorkerPool};

/// One zone's share of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneShare {
    pub zone_index: usize,
    pub zone: String,
    pub minimum: u32,
    pub maximum: u32,
    pub max_surge: IntOrPercent,
    pub max_unavailable: IntOrPercent,
}

/// Zone `zone_index`'s share of `total` over `zone_count` zones.
pub fn distribute_over_zones(total: u32, zone_index: usize, zone_count: usize) -> u32 {
    if zone_count == 0 {
        return 0;
    }
    let n = zone_count as u32;
    let extra = u32::from((zone_index as u32) < total % n);
    total / n + extra
}

/// Like [`distribute_over_zones`]; percentages are already relative and
/// pass through unchanged.
pub fn distribute_int_or_percent(
    value: &IntOrPercent,
    zone_index: usize,
    zone_count: usize,
) -> IntOrPercent {
    match value {
        IntOrPercent::Int(total) => {
            IntOrPercent::Int(distribute_over_zones(*total, zone_index, zone_count))
        }
        IntOrPercent::Percent(_) => value.clone(),
    }
}

/// Every zone's share of `total`, in zone order.
pub fn zone_counts(total: u32, zone_count: usize) -> Vec<u32> {
    (0..zone_count)
        .map(|i| distribute_over_zones(total, i, zone_count))
        .collect()
}

/// Split `pool`'s counts across its zones.
pub fn distribute_pool(pool: &WorkerPool) -> Vec<ZoneShare> {
    let n = pool.zones.len();
    pool.zones
        .iter()
        .enumerate()
        .map(|(i, zone)| ZoneShare {
            zone_index: i,
            zone: zone.clone(),
            minimum: distribute_over_zones(pool.minimum, i, n),
            maximum: distribute_over_zones(pool.maximum, i, n),
            max_surge: distribute_int_or_percent(&pool.max_surge, i, n),
            max_unavailable: distribute_int_or_percent(&pool.max_unavailable, i, n),
        })
        .collect()
}
