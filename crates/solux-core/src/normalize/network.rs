//! Network statistics normalization.
//!
//! Fans in `getSlot`, `getEpochInfo`, `getSupply`,
//! `getRecentPerformanceSamples`, and `getVoteAccounts` results.

use serde::Serialize;
use serde_json::Value;

use crate::types::now_rfc3339;

use super::{arr_at, f64_at, u64_at, unwrap_context};

const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// Overall network health derived from validator delinquency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Healthy,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochInfo {
    pub epoch: u64,
    pub slot_index: u64,
    pub slots_in_epoch: u64,
    pub absolute_slot: u64,
    pub block_height: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub tps: u64,
    pub avg_tps_1m: u64,
    pub avg_tps_5m: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validators {
    pub total: usize,
    pub active: usize,
    pub delinquent: usize,
}

/// Supply figures in SOL.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyStats {
    pub total: f64,
    pub circulating: f64,
    pub non_circulating: f64,
}

/// The stable external network-stats record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    pub current_slot: u64,
    pub epoch_info: EpochInfo,
    pub performance: Performance,
    pub validators: Validators,
    pub supply: SupplyStats,
    pub health: Health,
    pub last_updated: String,
}

/// Health thresholds over the delinquent-validator percentage:
/// above 20% critical, above 10% warning, otherwise healthy.
#[must_use]
pub fn health_of(total_validators: usize, delinquent: usize) -> Health {
    if total_validators == 0 {
        return Health::Healthy;
    }
    let delinquent_pct = delinquent as f64 / total_validators as f64 * 100.0;
    if delinquent_pct > 20.0 {
        Health::Critical
    } else if delinquent_pct > 10.0 {
        Health::Warning
    } else {
        Health::Healthy
    }
}

/// TPS from the most recent performance sample.
fn tps_of(samples: &Value) -> u64 {
    let Some(sample) = samples.as_array().and_then(|list| list.first()) else { return 0 };
    let transactions = u64_at(sample, "numTransactions");
    let period = u64_at(sample, "samplePeriodSecs");
    if period == 0 {
        return 0;
    }
    (transactions as f64 / period as f64).round() as u64
}

/// Normalizes the five fan-out results into one stats record.
#[must_use]
pub fn normalize_network_stats(
    slot_raw: &Value,
    epoch_raw: &Value,
    supply_raw: &Value,
    performance_raw: &Value,
    vote_accounts_raw: &Value,
) -> NetworkStats {
    let supply = unwrap_context(supply_raw);
    let active = arr_at(vote_accounts_raw, "current").len();
    let delinquent = arr_at(vote_accounts_raw, "delinquent").len();
    let total = active + delinquent;

    let tps = tps_of(performance_raw);

    NetworkStats {
        current_slot: slot_raw.as_u64().unwrap_or(0),
        epoch_info: EpochInfo {
            epoch: u64_at(epoch_raw, "epoch"),
            slot_index: u64_at(epoch_raw, "slotIndex"),
            slots_in_epoch: u64_at(epoch_raw, "slotsInEpoch"),
            absolute_slot: u64_at(epoch_raw, "absoluteSlot"),
            block_height: u64_at(epoch_raw, "blockHeight"),
        },
        // A single sample cannot distinguish 1m/5m windows; both report the
        // latest sample until a history source exists.
        performance: Performance { tps, avg_tps_1m: tps, avg_tps_5m: tps },
        validators: Validators { total, active, delinquent },
        supply: SupplyStats {
            total: f64_at(supply, "total") / LAMPORTS_PER_SOL,
            circulating: f64_at(supply, "circulating") / LAMPORTS_PER_SOL,
            non_circulating: f64_at(supply, "nonCirculating") / LAMPORTS_PER_SOL,
        },
        health: health_of(total, delinquent),
        last_updated: now_rfc3339(),
    }
}
