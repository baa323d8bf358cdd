use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::algorithms::Algorithm;
use crate::event::{EventLog, Value};
use crate::instrument::InstrumentedSequence;
use crate::{AlgovizError, Result};

/// Comparator handed to captured algorithms alongside the sequence.
pub type Comparator = fn(&mut InstrumentedSequence, usize, usize) -> Result<Ordering>;

/// Runs `algorithm` against a fresh instrumented copy of `source` and
/// returns every event it caused.
///
/// Loading `source` into the sequence happens before the timed run, so
/// those events are stamped at time zero. If the algorithm fails, the
/// events gathered so far are returned inside
/// [`AlgovizError::CaptureFailed`].
pub fn capture_script<F>(name: impl Into<String>, source: &[Value], algorithm: F) -> Result<EventLog>
where
    F: FnOnce(&mut InstrumentedSequence, Comparator) -> Result<()>,
{
    let mut log = EventLog::new(name);
    if source.is_empty() {
        debug!(name = %log.name, "empty source, nothing to capture");
        return Ok(log);
    }

    let mut sequence = InstrumentedSequence::new(source.len());
    for (index, value) in source.iter().enumerate() {
        sequence.write(index, *value)?;
    }
    for mut event in sequence.take_events() {
        event.time = 0.0;
        log.push(event);
    }

    sequence.restart_clock();
    let outcome = algorithm(&mut sequence, InstrumentedSequence::compare);

    for event in sequence.take_events() {
        log.push(event);
    }
    log.set_final(sequence.to_array());

    match outcome {
        Ok(()) => {
            debug!(
                name = %log.name,
                events = log.len(),
                compares = sequence.compares(),
                reads = sequence.reads(),
                writes = sequence.writes(),
                duration_ms = log.duration(),
                "captured script"
            );
            Ok(log)
        }
        Err(source) => {
            warn!(name = %log.name, events = log.len(), error = %source, "capture failed");
            Err(AlgovizError::CaptureFailed {
                partial: Box::new(log),
                source: Box::new(source),
            })
        }
    }
}

/// Captures one log per algorithm, all seeded with the same `source`.
pub fn capture_all(source: &[Value], algorithms: &[Algorithm]) -> Result<Vec<EventLog>> {
    algorithms
        .iter()
        .map(|algorithm| capture_script(algorithm.label(), source, |seq, cmp| algorithm.run(seq, cmp)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventValue, Field, Slot};

    /// Replays `value` events in log order to rebuild the sequence.
    fn reconstruct(log: &EventLog, len: usize) -> Vec<Value> {
        let mut values = vec![0; len];
        for event in log.events() {
            if let (Slot::Cell(index), Field::Value, EventValue::Number(value)) =
                (event.index, event.field, event.value)
            {
                values[index] = value;
            }
        }
        values
    }

    #[test]
    fn captures_sorted_final_snapshot() {
        let log = capture_script("insertion sort", &[3, 1, 2], |seq, cmp| {
            Algorithm::Insertion.run(seq, cmp)
        })
        .unwrap();

        assert_eq!(log.name, "insertion sort");
        assert_eq!(log.final_values(), &[1, 2, 3]);
        assert_eq!(reconstruct(&log, 3), vec![1, 2, 3]);
    }

    #[test]
    fn events_are_time_ordered_with_setup_at_zero() {
        let log = capture_script("quick", &[4, 2, 3, 1], |seq, cmp| Algorithm::Quick.run(seq, cmp)).unwrap();

        let events: Vec<_> = log.events().collect();
        assert!(events.windows(2).all(|pair| pair[0].time <= pair[1].time));

        // construction emits 3 + 7 * len events, the load emits 4 per cell
        let setup = 3 + 7 * 4 + 4 * 4;
        assert!(events[..setup].iter().all(|event| event.time == 0.0));
        assert_eq!(events[setup].field, Field::Reference);
    }

    #[test]
    fn value_events_match_write_counters() {
        let source = [5, 3, 8, 1, 9, 2];
        let log = capture_script("heap", &source, |seq, cmp| Algorithm::Heap.run(seq, cmp)).unwrap();

        for index in 0..source.len() {
            let slot = Slot::Cell(index);
            let value_events = log
                .events()
                .filter(|e| e.index == slot && e.field == Field::Value)
                .count() as u64;
            let writes = log
                .events()
                .filter(|e| e.index == slot && e.field == Field::Writes)
                .filter_map(|e| match e.value {
                    EventValue::Count(count) => Some(count),
                    _ => None,
                })
                .max()
                .unwrap_or(0);
            // the extra value event is the placeholder recorded at construction
            assert_eq!(value_events, writes + 1, "cell {index}");
        }
    }

    #[test]
    fn single_element_has_no_comparisons() {
        let log = capture_script("merge", &[42], |seq, cmp| Algorithm::Merge.run(seq, cmp)).unwrap();

        assert_eq!(log.final_values(), &[42]);
        assert!(log.events().all(|event| event.time == 0.0));
        assert!(log
            .events()
            .all(|event| event.field != Field::Reference && event.field != Field::Compares
                || event.value == EventValue::Flag(false)
                || event.value == EventValue::Count(0)));
    }

    #[test]
    fn empty_source_yields_empty_log() {
        let log = capture_script("bubble", &[], |seq, cmp| Algorithm::Bubble.run(seq, cmp)).unwrap();
        assert!(log.is_empty());
        assert!(log.final_values().is_empty());
    }

    #[test]
    fn failed_algorithm_keeps_partial_log() {
        let err = capture_script("broken", &[2, 1], |seq, cmp| {
            cmp(seq, 0, 1)?;
            seq.read(7)?;
            Ok(())
        })
        .unwrap_err();

        match err {
            AlgovizError::CaptureFailed { partial, source } => {
                assert_eq!(partial.name, "broken");
                assert!(partial.events().any(|e| e.field == Field::Compares && e.value == EventValue::Count(1)));
                assert!(matches!(*source, AlgovizError::IndexOutOfBounds { index: 7, len: 2 }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn capture_all_labels_each_log() {
        let logs = capture_all(&[2, 0, 1], &[Algorithm::Bubble, Algorithm::Merge]).unwrap();
        let names: Vec<_> = logs.iter().map(|log| log.name.as_str()).collect();
        assert_eq!(names, vec!["bubble sort", "merge sort"]);
        assert!(logs.iter().all(|log| log.final_values() == [0, 1, 2]));
    }
}
