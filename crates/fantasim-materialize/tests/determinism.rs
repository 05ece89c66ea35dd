// SPDX-License-Identifier: Apache-2.0
//! Property coverage for materializer determinism (§8): folding the same
//! event log twice, or folding it through either `TickFilterMode`, always
//! produces the same snapshot.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use fantasim_core::hash::ZERO_HASH;
use fantasim_core::config::TickFilterMode;
use fantasim_core::{PlateId, Tick};
use fantasim_events::envelope::EventRecord;
use fantasim_events::payload::TopologyEvent;
use fantasim_materialize::topology::materialize;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Create(u8),
    Retire(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![any::<u8>().prop_map(Op::Create), any::<u8>().prop_map(Op::Retire),]
}

fn build_records(ops: &[Op], ticks: &[u16]) -> Vec<EventRecord<TopologyEvent>> {
    let mut previous_hash = ZERO_HASH;
    ops.iter()
        .zip(ticks.iter())
        .enumerate()
        .map(|(sequence, (op, &tick))| {
            let plate_id = match op {
                Op::Create(n) | Op::Retire(n) => PlateId::from_label(&format!("plate-{n}")),
            };
            let payload = match op {
                Op::Create(_) => TopologyEvent::PlateCreated { plate_id },
                Op::Retire(_) => TopologyEvent::PlateRetired {
                    plate_id,
                    reason: "proptest".to_string(),
                },
            };
            let record = EventRecord::new("stream", sequence as u64, Tick::new(i64::from(tick)), previous_hash, payload)
                .expect("payload encodes");
            previous_hash = record.hash;
            record
        })
        .collect()
}

proptest! {
    #[test]
    fn repeated_materialization_is_identical(
        ops in prop::collection::vec(op_strategy(), 0..60),
        ticks in prop::collection::vec(0u16..200, 0..60),
    ) {
        let len = ops.len().min(ticks.len());
        let records = build_records(&ops[..len], &ticks[..len]);

        let first = materialize(&records, Tick::new(200), TickFilterMode::ScanAll).unwrap();
        let second = materialize(&records, Tick::new(200), TickFilterMode::ScanAll).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn scan_all_and_break_early_agree_when_ticks_are_sorted(
        ops in prop::collection::vec(op_strategy(), 0..60),
        deltas in prop::collection::vec(0u16..10, 0..60),
        cutoff in 0u16..300,
    ) {
        let len = ops.len().min(deltas.len());
        let mut tick = 0u16;
        let ticks: Vec<u16> = deltas[..len]
            .iter()
            .map(|d| {
                tick = tick.saturating_add(*d);
                tick
            })
            .collect();
        let records = build_records(&ops[..len], &ticks);

        let scan_all = materialize(&records, Tick::new(i64::from(cutoff)), TickFilterMode::ScanAll).unwrap();
        let break_early = materialize(&records, Tick::new(i64::from(cutoff)), TickFilterMode::BreakOnFirstBeyondTick).unwrap();
        prop_assert_eq!(scan_all, break_early);
    }
}
