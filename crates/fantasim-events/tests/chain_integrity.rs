// SPDX-License-Identifier: Apache-2.0
//! Property coverage for the hash-chain invariant (§8): any sequence of
//! appends made under a non-decreasing tick ordering reads back as a chain
//! whose sequences are contiguous and whose `previous_hash` links verify.
#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use fantasim_core::config::{AppendOptions, TickPolicy};
use fantasim_core::{StreamDomain, StreamIdentity, Tick};
use fantasim_events::store::{EventDraft, EventStore};
use fantasim_kv::{KvStore, MemoryKv};
use proptest::prelude::*;

fn store() -> EventStore<i32> {
    let kv: Arc<Mutex<dyn KvStore + Send>> = Arc::new(Mutex::new(MemoryKv::new()));
    let identity = StreamIdentity::new(1, 0, 0, StreamDomain::PlatesTopology, 1);
    EventStore::new(kv, identity)
}

fn non_decreasing_ticks(deltas: Vec<u16>) -> Vec<Tick> {
    let mut tick = 0i64;
    deltas
        .into_iter()
        .map(|delta| {
            tick += i64::from(delta);
            Tick::new(tick)
        })
        .collect()
}

proptest! {
    #[test]
    fn appended_chain_always_verifies(
        deltas in prop::collection::vec(0u16..50, 1..40),
        payloads in prop::collection::vec(any::<i32>(), 1..40),
    ) {
        let len = deltas.len().min(payloads.len());
        let ticks = non_decreasing_ticks(deltas[..len].to_vec());
        let drafts: Vec<EventDraft<i32>> = ticks
            .into_iter()
            .zip(payloads[..len].iter().copied())
            .map(|(tick, payload)| EventDraft::new(tick, payload))
            .collect();

        let store = store();
        let appended = store.append(&drafts, AppendOptions { tick_policy: TickPolicy::Reject }).unwrap();
        prop_assert_eq!(appended.len(), len);

        let read_back = store.read(0).unwrap();
        prop_assert_eq!(read_back.len(), len);

        for (i, record) in read_back.iter().enumerate() {
            prop_assert_eq!(record.sequence, i as u64);
            prop_assert_eq!(record.payload, payloads[i]);
            if i > 0 {
                prop_assert_eq!(record.previous_hash, read_back[i - 1].hash);
            }
        }
    }

    #[test]
    fn splitting_an_append_into_two_batches_yields_the_same_chain(
        deltas in prop::collection::vec(0u16..50, 2..40),
        payloads in prop::collection::vec(any::<i32>(), 2..40),
        split_at in 1usize..39,
    ) {
        let len = deltas.len().min(payloads.len());
        prop_assume!(split_at < len);
        let ticks = non_decreasing_ticks(deltas[..len].to_vec());
        let drafts: Vec<EventDraft<i32>> = ticks
            .into_iter()
            .zip(payloads[..len].iter().copied())
            .map(|(tick, payload)| EventDraft::new(tick, payload))
            .collect();

        let whole = store();
        whole.append(&drafts, AppendOptions::default()).unwrap();

        let split = store();
        split.append(&drafts[..split_at], AppendOptions::default()).unwrap();
        split.append(&drafts[split_at..], AppendOptions::default()).unwrap();

        let whole_chain = whole.read(0).unwrap();
        let split_chain = split.read(0).unwrap();
        prop_assert_eq!(whole_chain.len(), split_chain.len());
        for (a, b) in whole_chain.iter().zip(split_chain.iter()) {
            prop_assert_eq!(a.hash, b.hash);
            prop_assert_eq!(a.previous_hash, b.previous_hash);
            prop_assert_eq!(a.sequence, b.sequence);
        }
    }
}
