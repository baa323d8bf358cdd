use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::event::{Event, EventValue, Field, Slot, Value};
use crate::{AlgovizError, Result};

/// Last known attributes of one cell, as rebuilt from events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellView {
    pub value: Option<Value>,
    pub read: bool,
    pub write: bool,
    pub reference: bool,
    pub reads: u64,
    pub writes: u64,
    pub references: u64,
}

impl CellView {
    fn clear_transients(&mut self) {
        self.read = false;
        self.write = false;
        self.reference = false;
    }
}

/// Per-stream picture handed to renderers. Cells only exist once some
/// event has targeted them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    pub name: String,
    cells: BTreeMap<usize, CellView>,
    /// Time of the latest applied cell event.
    elapsed: f64,
    reads: u64,
    writes: u64,
    compares: u64,
}

impl VisualState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Lowers the read/write/reference flags of every cell.
    pub fn reset_transients(&mut self) {
        self.cells.values_mut().for_each(CellView::clear_transients);
    }

    /// Applies one event. Sequence-level events update the running totals
    /// only; cell events update the cell and the `elapsed` marker.
    pub fn apply(&mut self, event: &Event) -> Result<()> {
        match event.index {
            Slot::Sequence => {
                let total = match event.field {
                    Field::Reads => &mut self.reads,
                    Field::Writes => &mut self.writes,
                    Field::Compares => &mut self.compares,
                    other => return Err(unknown_field(other, event.index)),
                };
                let EventValue::Count(count) = event.value else {
                    return Err(mismatch(event));
                };
                *total = count;
            }
            Slot::Cell(index) => {
                if event.field == Field::Compares {
                    return Err(unknown_field(event.field, event.index));
                }
                if !fits(event.field, event.value) {
                    return Err(mismatch(event));
                }

                let cell = self.cells.entry(index).or_default();
                match (event.field, event.value) {
                    (Field::Value, EventValue::Number(value)) => cell.value = Some(value),
                    (Field::Read, EventValue::Flag(flag)) => cell.read = flag,
                    (Field::Write, EventValue::Flag(flag)) => cell.write = flag,
                    (Field::Reference, EventValue::Flag(flag)) => cell.reference = flag,
                    (Field::Reads, EventValue::Count(count)) => cell.reads = count,
                    (Field::Writes, EventValue::Count(count)) => cell.writes = count,
                    (Field::References, EventValue::Count(count)) => cell.references = count,
                    _ => {}
                }
                self.elapsed = event.time;
            }
        }
        Ok(())
    }

    pub fn cell(&self, index: usize) -> Option<&CellView> {
        self.cells.get(&index)
    }

    pub fn cells(&self) -> impl Iterator<Item = (usize, &CellView)> {
        self.cells.iter().map(|(index, cell)| (*index, cell))
    }

    /// Known cell values in index order.
    pub fn values(&self) -> Vec<Value> {
        self.cells.values().filter_map(|cell| cell.value).collect()
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
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
}

fn fits(field: Field, value: EventValue) -> bool {
    matches!(
        (field, value),
        (Field::Value, EventValue::Number(_))
            | (Field::Read | Field::Write | Field::Reference, EventValue::Flag(_))
            | (Field::Reads | Field::Writes | Field::References | Field::Compares, EventValue::Count(_))
    )
}

fn unknown_field(field: Field, slot: Slot) -> AlgovizError {
    AlgovizError::UnknownField {
        field: field.to_string(),
        index: slot.index(),
    }
}

fn mismatch(event: &Event) -> AlgovizError {
    AlgovizError::ValueMismatch {
        field: event.field,
        value: event.value,
    }
}
