// ── Traffic accounting ──
//
// Folds per-virtual-server statistics into byte totals per logical
// address. Counters arrive as two signed 32-bit halves.

use std::collections::BTreeMap;

use bigip_api::{StatisticKind, VirtualServerStatistics};
use tracing::debug;

use crate::command::ByteCounts;
use crate::naming::strip_partition;

/// Rebuild a 64-bit counter from its transported halves.
///
/// Both halves are reinterpreted as unsigned before combining, so a
/// negative low half does not sign-extend into the high word.
pub fn reconstruct_counter(high: i32, low: i32) -> u64 {
    let high = u64::from(u32::from_ne_bytes(high.to_ne_bytes()));
    let low = u64::from(u32::from_ne_bytes(low.to_ne_bytes()));
    (high << 32) | low
}

/// Committed totals are never negative.
fn widen(committed: i64) -> u128 {
    u128::from(u64::try_from(committed).unwrap_or_default())
}

/// Sum client-side bytes out/in per address.
///
/// In inline mode addresses lose their partition suffix, so every route
/// domain's copy of an address lands on the same key. An entry whose
/// running totals no longer fit a non-negative `i64` is dropped, leaving
/// the address's previous total in place.
pub fn aggregate(entries: &[VirtualServerStatistics], inline: bool) -> BTreeMap<String, ByteCounts> {
    let mut totals: BTreeMap<String, ByteCounts> = BTreeMap::new();

    for entry in entries {
        let address = if inline {
            strip_partition(&entry.virtual_server.address)
        } else {
            entry.virtual_server.address.as_str()
        };

        let previous = totals.get(address).copied().unwrap_or_default();
        let mut bytes_out = widen(previous.bytes_out);
        let mut bytes_in = widen(previous.bytes_in);

        for stat in &entry.statistics {
            let value = u128::from(reconstruct_counter(stat.value.high, stat.value.low));
            match stat.kind {
                StatisticKind::StatisticClientSideBytesOut => bytes_out += value,
                StatisticKind::StatisticClientSideBytesIn => bytes_in += value,
                _ => {}
            }
        }

        match (i64::try_from(bytes_out), i64::try_from(bytes_in)) {
            (Ok(bytes_out), Ok(bytes_in)) => {
                totals.insert(address.to_owned(), ByteCounts { bytes_out, bytes_in });
            }
            _ => debug!(
                address,
                virtual_server = %entry.virtual_server.name,
                "byte counters overflow; dropping sample"
            ),
        }
    }
    totals
}
