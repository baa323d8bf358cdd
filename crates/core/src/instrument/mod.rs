//! Instrumented sequence that records every read, write and comparison an
//! algorithm performs as an ordered list of [`Event`]s.
//!
//! Flags and counters notify only when their stored value actually changes.
//! Writes to a cell's `value` always notify, even when the new value equals
//! the old one, so that a no-op overwrite remains visible in the log.

use std::{cmp::Ordering, mem, time::Instant};

use serde::{Deserialize, Serialize};

use crate::event::{Event, EventValue, Field, Slot, Value};
use crate::{AlgovizError, Result};

/// Per-capture source of event ids and timestamps.
#[derive(Debug, Clone)]
pub struct CaptureContext {
    next_id: u64,
    origin: Instant,
}

impl CaptureContext {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            origin: Instant::now(),
        }
    }

    /// Moves the clock origin to now. Ids keep counting.
    pub fn restart_clock(&mut self) {
        self.origin = Instant::now();
    }

    fn stamp(&mut self) -> (u64, f64) {
        let id = self.next_id;
        self.next_id += 1;
        (id, self.origin.elapsed().as_secs_f64() * 1000.0)
    }
}

impl Default for CaptureContext {
    fn default() -> Self {
        Self::new()
    }
}

/// One sequence slot together with its access bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub value: Value,
    pub read: bool,
    pub write: bool,
    pub reference: bool,
    pub reads: u64,
    pub writes: u64,
    pub references: u64,
}

impl Cell {
    fn flag_mut(&mut self, flag: Flag) -> &mut bool {
        match flag {
            Flag::Read => &mut self.read,
            Flag::Write => &mut self.write,
            Flag::Reference => &mut self.reference,
        }
    }

    fn counter_mut(&mut self, counter: CellCounter) -> &mut u64 {
        match counter {
            CellCounter::Reads => &mut self.reads,
            CellCounter::Writes => &mut self.writes,
            CellCounter::References => &mut self.references,
        }
    }
}

/// Transient per-cell markers.
#[derive(Debug, Clone, Copy)]
enum Flag {
    Read,
    Write,
    Reference,
}

impl Flag {
    fn field(self) -> Field {
        match self {
            Flag::Read => Field::Read,
            Flag::Write => Field::Write,
            Flag::Reference => Field::Reference,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum CellCounter {
    Reads,
    Writes,
    References,
}

impl CellCounter {
    fn field(self) -> Field {
        match self {
            CellCounter::Reads => Field::Reads,
            CellCounter::Writes => Field::Writes,
            CellCounter::References => Field::References,
        }
    }
}

/// Sequence-wide totals.
#[derive(Debug, Clone, Copy)]
enum Total {
    Reads,
    Writes,
    Compares,
}

impl Total {
    fn field(self) -> Field {
        match self {
            Total::Reads => Field::Reads,
            Total::Writes => Field::Writes,
            Total::Compares => Field::Compares,
        }
    }
}

/// Fixed-length sequence whose accesses are all observable.
#[derive(Debug)]
pub struct InstrumentedSequence {
    cells: Vec<Cell>,
    reads: u64,
    writes: u64,
    compares: u64,
    context: CaptureContext,
    events: Vec<Event>,
}

impl InstrumentedSequence {
    /// Creates `len` cells holding the placeholder values `0..len`.
    pub fn new(len: usize) -> Self {
        Self::with_context(len, CaptureContext::new())
    }

    /// Creates the sequence and records the initial state of the sequence
    /// totals and of every cell.
    pub fn with_context(len: usize, context: CaptureContext) -> Self {
        let mut sequence = Self {
            cells: Vec::with_capacity(len),
            reads: 0,
            writes: 0,
            compares: 0,
            context,
            events: Vec::new(),
        };

        for field in [Field::Compares, Field::Reads, Field::Writes] {
            sequence.emit(Slot::Sequence, field, EventValue::Count(0));
        }

        for index in 0..len {
            let cell = Cell {
                value: index as Value,
                ..Cell::default()
            };
            sequence.cells.push(cell);

            let slot = Slot::Cell(index);
            for field in [Field::Read, Field::Write, Field::Reference] {
                sequence.emit(slot, field, EventValue::Flag(false));
            }
            for field in [Field::Reads, Field::Writes, Field::References] {
                sequence.emit(slot, field, EventValue::Count(0));
            }
            sequence.emit(slot, Field::Value, EventValue::Number(index as Value));
        }

        sequence
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the value at `index`, marking the cell as just read.
    pub fn read(&mut self, index: usize) -> Result<Value> {
        self.check(index)?;
        self.set_flag(index, Flag::Write, false);
        self.set_flag(index, Flag::Reference, false);
        self.set_flag(index, Flag::Read, true);
        self.bump_cell(index, CellCounter::Reads);
        self.bump_total(Total::Reads);
        Ok(self.cells[index].value)
    }

    /// Stores `value` at `index`, marking the cell as just written.
    pub fn write(&mut self, index: usize, value: Value) -> Result<()> {
        self.check(index)?;
        self.set_flag(index, Flag::Read, false);
        self.set_flag(index, Flag::Reference, false);
        self.set_flag(index, Flag::Write, true);
        self.bump_cell(index, CellCounter::Writes);
        self.bump_total(Total::Writes);
        self.cells[index].value = value;
        self.emit(Slot::Cell(index), Field::Value, EventValue::Number(value));
        Ok(())
    }

    /// Compares the values held at `a` and `b`, marking both cells as
    /// referenced. Comparing a cell with itself yields `Equal`.
    pub fn compare(&mut self, a: usize, b: usize) -> Result<Ordering> {
        self.check(a)?;
        self.check(b)?;
        for index in [a, b] {
            self.set_flag(index, Flag::Reference, true);
            self.bump_cell(index, CellCounter::References);
        }
        self.bump_total(Total::Compares);
        Ok(self.cells[a].value.cmp(&self.cells[b].value))
    }

    /// Exchanges two cells through instrumented reads and writes.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        let left = self.read(a)?;
        let right = self.read(b)?;
        self.write(a, right)?;
        self.write(b, left)
    }

    /// Plain snapshot of the values. Not instrumented.
    pub fn to_array(&self) -> Vec<Value> {
        self.cells.iter().map(|cell| cell.value).collect()
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn reads(&self) -> u64 {
        self.reads
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn compares(&self) -> u64 {
        self.compares
    }

    pub fn restart_clock(&mut self) {
        self.context.restart_clock();
    }

    /// Hands over every event recorded since the last call.
    pub fn take_events(&mut self) -> Vec<Event> {
        mem::take(&mut self.events)
    }

    fn check(&self, index: usize) -> Result<()> {
        if index < self.cells.len() {
            Ok(())
        } else {
            Err(AlgovizError::IndexOutOfBounds {
                index,
                len: self.cells.len(),
            })
        }
    }

    fn set_flag(&mut self, index: usize, flag: Flag, value: bool) {
        let stored = self.cells[index].flag_mut(flag);
        if *stored == value {
            return;
        }
        *stored = value;
        self.emit(Slot::Cell(index), flag.field(), EventValue::Flag(value));
    }

    fn bump_cell(&mut self, index: usize, counter: CellCounter) {
        let stored = self.cells[index].counter_mut(counter);
        *stored += 1;
        let count = *stored;
        self.emit(Slot::Cell(index), counter.field(), EventValue::Count(count));
    }

    fn bump_total(&mut self, total: Total) {
        let stored = match total {
            Total::Reads => &mut self.reads,
            Total::Writes => &mut self.writes,
            Total::Compares => &mut self.compares,
        };
        *stored += 1;
        let count = *stored;
        self.emit(Slot::Sequence, total.field(), EventValue::Count(count));
    }

    fn emit(&mut self, index: Slot, field: Field, value: EventValue) {
        let (id, time) = self.context.stamp();
        self.events.push(Event {
            id,
            time,
            index,
            field,
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields_for(events: &[Event], slot: Slot) -> Vec<Field> {
        events
            .iter()
            .filter(|event| event.index == slot)
            .map(|event| event.field)
            .collect()
    }

    #[test]
    fn construction_records_initial_state() {
        let mut sequence = InstrumentedSequence::new(2);
        let events = sequence.take_events();

        // three sequence totals, then seven attributes per cell
        assert_eq!(events.len(), 3 + 2 * 7);
        assert_eq!(
            fields_for(&events, Slot::Sequence),
            vec![Field::Compares, Field::Reads, Field::Writes]
        );
        assert_eq!(sequence.to_array(), vec![0, 1]);
        assert!(events.windows(2).all(|pair| pair[0].id < pair[1].id));
    }

    #[test]
    fn repeated_reads_only_notify_counters() {
        let mut sequence = InstrumentedSequence::new(3);
        sequence.take_events();

        assert_eq!(sequence.read(1).unwrap(), 1);
        let first = sequence.take_events();
        assert_eq!(
            first.iter().map(|e| e.field).collect::<Vec<_>>(),
            vec![Field::Read, Field::Reads, Field::Reads]
        );

        sequence.read(1).unwrap();
        let second = sequence.take_events();
        assert!(second.iter().all(|e| e.field == Field::Reads));
        assert_eq!(sequence.cell(1).unwrap().reads, 2);
        assert_eq!(sequence.reads(), 2);
    }

    #[test]
    fn writes_always_notify_value() {
        let mut sequence = InstrumentedSequence::new(2);
        sequence.take_events();

        sequence.write(0, 0).unwrap();
        sequence.write(0, 0).unwrap();
        let events = sequence.take_events();

        let values = events.iter().filter(|e| e.field == Field::Value).count();
        assert_eq!(values, 2);
        let write_flags = events.iter().filter(|e| e.field == Field::Write).count();
        assert_eq!(write_flags, 1);
        assert_eq!(sequence.cell(0).unwrap().writes, 2);
    }

    #[test]
    fn compare_marks_both_cells_and_orders_values() {
        let mut sequence = InstrumentedSequence::new(3);
        sequence.write(0, 9).unwrap();
        sequence.take_events();

        assert_eq!(sequence.compare(0, 2).unwrap(), Ordering::Greater);
        assert_eq!(sequence.compare(2, 0).unwrap(), Ordering::Less);
        assert_eq!(sequence.compare(1, 1).unwrap(), Ordering::Equal);

        let events = sequence.take_events();
        let references = events
            .iter()
            .filter(|e| e.field == Field::Reference)
            .count();
        // 0, 2 and 1 each raise their flag exactly once
        assert_eq!(references, 3);
        assert_eq!(sequence.compares(), 3);
        assert_eq!(sequence.cell(1).unwrap().references, 2);
        assert!(sequence.cell(0).unwrap().reference);
        // comparing leaves the write flag alone
        assert!(sequence.cell(0).unwrap().write);
    }

    #[test]
    fn every_access_names_the_attribute_it_changed() {
        let mut sequence = InstrumentedSequence::new(2);
        sequence.take_events();

        sequence.read(0).unwrap();
        sequence.write(1, 5).unwrap();
        sequence.compare(0, 1).unwrap();
        let events = sequence.take_events();

        let cell_fields = |slot| fields_for(&events, slot);
        assert_eq!(
            cell_fields(Slot::Cell(0)),
            vec![Field::Read, Field::Reads, Field::Reference, Field::References]
        );
        assert_eq!(
            cell_fields(Slot::Cell(1)),
            vec![Field::Write, Field::Writes, Field::Value, Field::Reference, Field::References]
        );
        assert_eq!(
            cell_fields(Slot::Sequence),
            vec![Field::Reads, Field::Writes, Field::Compares]
        );
        let cell = sequence.cell(0).unwrap();
        assert!(cell.read && cell.reference && !cell.write);
    }

    #[test]
    fn out_of_range_access_is_rejected() {
        let mut sequence = InstrumentedSequence::new(2);
        let err = sequence.read(2).unwrap_err();
        assert!(matches!(err, AlgovizError::IndexOutOfBounds { index: 2, len: 2 }));
        assert!(sequence.compare(0, 5).is_err());
        assert!(sequence.write(3, 1).is_err());
    }

    #[test]
    fn swap_exchanges_values() {
        let mut sequence = InstrumentedSequence::new(3);
        sequence.swap(0, 2).unwrap();
        assert_eq!(sequence.to_array(), vec![2, 1, 0]);
        assert_eq!(sequence.writes(), 2);
        assert_eq!(sequence.reads(), 2);
    }
}
