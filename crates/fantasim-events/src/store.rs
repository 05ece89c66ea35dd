// SPDX-License-Identifier: Apache-2.0
//! Generic append-only, hash-chained event store (§4.2).
//!
//! Parameterized over the payload type so the identical append/read/chain
//! logic backs both the topology and the kinematics streams (§2 components
//! 4 and 5 share one contract).

use fantasim_core::config::{AppendOptions, TickPolicy};
use fantasim_core::hash::ZERO_HASH;
use fantasim_core::{FantaSimError, StreamIdentity, Tick};
use fantasim_kv::{KvStore, WriteOp};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};

use crate::envelope::{EventRecord, HeadRecord};
use crate::payload::{KinematicsEvent, TopologyEvent};

/// Topology event store: [`EventStore`] specialized to [`TopologyEvent`].
pub type TopologyEventStore = EventStore<TopologyEvent>;

/// Kinematics event store: [`EventStore`] specialized to [`KinematicsEvent`].
pub type KinematicsEventStore = EventStore<KinematicsEvent>;

/// A tick-stamped payload awaiting sequence assignment and hashing — the
/// caller-supplied shape `append` accepts.
#[derive(Debug, Clone)]
pub struct EventDraft<P> {
    /// Tick the event occurred at.
    pub tick: Tick,
    /// Event-kind-specific payload.
    pub payload: P,
}

impl<P> EventDraft<P> {
    /// Builds a draft from a tick and payload.
    pub fn new(tick: Tick, payload: P) -> Self {
        Self { tick, payload }
    }
}

/// Append-only, hash-chained event store over a shared [`KvStore`] backend.
pub struct EventStore<P> {
    kv: Arc<Mutex<dyn KvStore + Send>>,
    stream_key: String,
    _payload: PhantomData<P>,
}

fn event_key(stream_key: &str, sequence: u64) -> Vec<u8> {
    let mut key = format!("{stream_key}E:").into_bytes();
    key.extend_from_slice(&sequence.to_be_bytes());
    key
}

fn head_key(stream_key: &str) -> Vec<u8> {
    format!("{stream_key}Head").into_bytes()
}

impl<P: Serialize + DeserializeOwned + Clone> EventStore<P> {
    /// Opens a store scoped to `identity` over a shared KV backend.
    #[must_use]
    pub fn new(kv: Arc<Mutex<dyn KvStore + Send>>, identity: StreamIdentity) -> Self {
        Self {
            kv,
            stream_key: identity.to_stream_key(),
            _payload: PhantomData,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, dyn KvStore + Send + 'static> {
        match self.kv.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Reads the stream head, or the empty head if the stream has never
    /// been written to.
    ///
    /// # Errors
    /// Returns [`FantaSimError::Codec`] if a stored head is malformed.
    pub fn head(&self) -> Result<HeadRecord, FantaSimError> {
        let key = head_key(&self.stream_key);
        match self.lock().get(&key) {
            Some(bytes) => HeadRecord::from_bytes(&bytes),
            None => Ok(HeadRecord::empty()),
        }
    }

    /// Returns the sequence number of the last appended record, or `None`
    /// if the stream is empty.
    ///
    /// # Errors
    /// Returns [`FantaSimError::Codec`] if a stored head is malformed.
    pub fn last_sequence(&self) -> Result<Option<u64>, FantaSimError> {
        match self.lock().get(&head_key(&self.stream_key)) {
            Some(bytes) => Ok(Some(HeadRecord::from_bytes(&bytes)?.last_sequence)),
            None => Ok(None),
        }
    }

    /// Appends `drafts` to the stream in order, assigning sequence numbers
    /// and chaining hashes, enforcing `options.tick_policy` across the
    /// batch and against the current head (§4.2).
    ///
    /// All records and the head advance together, or none do.
    ///
    /// # Errors
    /// Returns [`FantaSimError::TickMonotonicityViolation`] under `Reject`
    /// if a draft's tick does not strictly increase the running tick, or a
    /// codec error if a payload cannot be serialized.
    #[instrument(skip(self, drafts), fields(stream_key = %self.stream_key))]
    pub fn append(
        &self,
        drafts: &[EventDraft<P>],
        options: AppendOptions,
    ) -> Result<Vec<EventRecord<P>>, FantaSimError> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }

        let mut guard = self.lock();
        let head_k = head_key(&self.stream_key);
        let existing_head = match guard.get(&head_k) {
            Some(bytes) => Some(HeadRecord::from_bytes(&bytes)?),
            None => None,
        };

        let mut next_sequence = existing_head.map_or(0, |h| h.last_sequence + 1);
        let mut previous_hash = existing_head.map_or(ZERO_HASH, |h| h.last_hash);
        let mut last_tick = existing_head.map(|h| h.last_tick);
        let mut sequence = next_sequence.saturating_sub(1);

        let mut records = Vec::with_capacity(drafts.len());
        let mut ops = Vec::with_capacity(drafts.len() + 1);

        for draft in drafts {
            if let Some(last) = last_tick {
                match options.tick_policy {
                    TickPolicy::Reject if draft.tick < last => {
                        return Err(FantaSimError::TickMonotonicityViolation {
                            stream_key: self.stream_key.clone(),
                            last_seen: last,
                            candidate: draft.tick,
                        });
                    }
                    TickPolicy::Warn if draft.tick < last => {
                        warn!(stream_key = %self.stream_key, last_seen = last.index(), candidate = draft.tick.index(), "tick disorder on append");
                    }
                    _ => {}
                }
            }

            let record = EventRecord::new(
                &self.stream_key,
                next_sequence,
                draft.tick,
                previous_hash,
                draft.payload.clone(),
            )?;
            ops.push(WriteOp {
                key: event_key(&self.stream_key, next_sequence),
                value: Arc::from(record.to_bytes()?.into_boxed_slice()),
            });

            previous_hash = record.hash;
            last_tick = Some(draft.tick);
            sequence = next_sequence;
            next_sequence += 1;
            records.push(record);
        }

        let new_head = HeadRecord {
            last_sequence: sequence,
            last_hash: previous_hash,
            // `records` is non-empty here (checked at function entry), so
            // the loop above always runs at least once and sets this.
            last_tick: last_tick.unwrap_or(Tick::GENESIS),
        };
        ops.push(WriteOp {
            key: head_k,
            value: Arc::from(new_head.to_bytes()?.into_boxed_slice()),
        });

        guard
            .batch_write(&ops)
            .map_err(|e| FantaSimError::Codec(e.to_string()))?;

        info!(stream_key = %self.stream_key, sequence, tick = new_head.last_tick.index(), "appended events");

        Ok(records)
    }

    /// Reads records starting at `from_sequence_inclusive`, verifying the
    /// hash chain as it goes. A break in the chain is fatal and aborts
    /// before yielding the offending record.
    ///
    /// # Errors
    /// Returns [`FantaSimError::HashChainCorruption`] on the first record
    /// whose stored hash does not match its recomputed hash, or whose
    /// `previous_hash` does not match the prior record's hash.
    #[instrument(skip(self), fields(stream_key = %self.stream_key))]
    pub fn read(&self, from_sequence_inclusive: u64) -> Result<Vec<EventRecord<P>>, FantaSimError> {
        let guard = self.lock();
        let raw = if guard.supports_scan() {
            guard.scan_from(&event_key(&self.stream_key, from_sequence_inclusive))
        } else {
            let head = match guard.get(&head_key(&self.stream_key)) {
                Some(bytes) => HeadRecord::from_bytes(&bytes)?,
                None => return Ok(Vec::new()),
            };
            (from_sequence_inclusive..=head.last_sequence)
                .filter_map(|seq| {
                    let key = event_key(&self.stream_key, seq);
                    guard.get(&key).map(|v| (key, v))
                })
                .collect()
        };

        let mut records = Vec::with_capacity(raw.len());
        let mut expected_previous: Option<_> = None;
        for (_, bytes) in raw {
            let record: EventRecord<P> = EventRecord::from_bytes(&bytes)?;
            record.verify(&self.stream_key)?;
            if let Some(expected) = expected_previous {
                if record.previous_hash != expected {
                    return Err(FantaSimError::HashChainCorruption {
                        stream_key: self.stream_key.clone(),
                        sequence: record.sequence,
                        expected,
                        found: record.previous_hash,
                    });
                }
            }
            expected_previous = Some(record.hash);
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fantasim_core::StreamDomain;
    use fantasim_kv::MemoryKv;

    fn store() -> EventStore<i32> {
        let kv: Arc<Mutex<dyn KvStore + Send>> = Arc::new(Mutex::new(MemoryKv::new()));
        let identity = StreamIdentity::new(1, 0, 0, StreamDomain::PlatesTopology, 1);
        EventStore::new(kv, identity)
    }

    #[test]
    fn append_then_read_round_trips() {
        let store = store();
        let drafts = vec![
            EventDraft::new(Tick::new(1), 10),
            EventDraft::new(Tick::new(2), 20),
        ];
        store.append(&drafts, AppendOptions::default()).unwrap();
        let records = store.read(0).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payload, 10);
        assert_eq!(records[1].payload, 20);
        assert_eq!(records[1].previous_hash, records[0].hash);
    }

    #[test]
    fn reject_policy_rejects_non_increasing_tick() {
        let store = store();
        store
            .append(&[EventDraft::new(Tick::new(5), 1)], AppendOptions::default())
            .unwrap();
        let result = store.append(
            &[EventDraft::new(Tick::new(4), 2)],
            AppendOptions {
                tick_policy: TickPolicy::Reject,
            },
        );
        assert!(matches!(result, Err(FantaSimError::TickMonotonicityViolation { .. })));
    }

    #[test]
    fn allow_policy_permits_non_increasing_tick() {
        let store = store();
        store
            .append(&[EventDraft::new(Tick::new(5), 1)], AppendOptions::default())
            .unwrap();
        let result = store.append(
            &[EventDraft::new(Tick::new(1), 2)],
            AppendOptions {
                tick_policy: TickPolicy::Allow,
            },
        );
        assert!(result.is_ok());
    }

    #[test]
    fn last_sequence_is_none_for_empty_stream() {
        assert_eq!(store().last_sequence().unwrap(), None);
    }

    #[test]
    fn tampering_with_a_payload_is_detected_on_read() {
        let store = store();
        let drafts = vec![
            EventDraft::new(Tick::new(1), 10),
            EventDraft::new(Tick::new(2), 20),
            EventDraft::new(Tick::new(3), 30),
        ];
        store.append(&drafts, AppendOptions::default()).unwrap();

        let tampered = EventRecord::new("unused", 1, Tick::new(2), ZERO_HASH, 999).unwrap();
        let key = event_key(&store.stream_key, 1);
        store
            .lock()
            .put(&key, &tampered.to_bytes().unwrap());

        let result = store.read(0);
        assert!(matches!(result, Err(FantaSimError::HashChainCorruption { .. })));
    }
}
