use std::{collections::VecDeque, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{AlgovizError, Result};

/// Numeric payload stored in a sequence slot.
pub type Value = i64;

/// Attribute named by an [`Event`].
///
/// Cells carry `value`, the three transient flags and the three counters.
/// The sequence itself carries the `reads`, `writes` and `compares` totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Field {
    Value,
    Read,
    Write,
    Reference,
    Reads,
    Writes,
    References,
    Compares,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Value,
        Field::Read,
        Field::Write,
        Field::Reference,
        Field::Reads,
        Field::Writes,
        Field::References,
        Field::Compares,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Value => "value",
            Field::Read => "read",
            Field::Write => "write",
            Field::Reference => "reference",
            Field::Reads => "reads",
            Field::Writes => "writes",
            Field::References => "references",
            Field::Compares => "compares",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = AlgovizError;

    fn from_str(s: &str) -> Result<Self> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| AlgovizError::UnknownField {
                field: s.to_string(),
                index: -1,
            })
    }
}

impl TryFrom<String> for Field {
    type Error = AlgovizError;

    fn try_from(name: String) -> Result<Self> {
        name.parse()
    }
}

/// Target of an event: the whole sequence (`-1` on the wire) or one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Slot {
    Sequence,
    Cell(usize),
}

impl Slot {
    pub fn index(self) -> i64 {
        match self {
            Slot::Sequence => -1,
            Slot::Cell(index) => index as i64,
        }
    }

    pub fn cell(self) -> Option<usize> {
        match self {
            Slot::Sequence => None,
            Slot::Cell(index) => Some(index),
        }
    }
}

impl From<Slot> for i64 {
    fn from(slot: Slot) -> Self {
        slot.index()
    }
}

impl TryFrom<i64> for Slot {
    type Error = String;

    fn try_from(index: i64) -> std::result::Result<Self, Self::Error> {
        match index {
            -1 => Ok(Slot::Sequence),
            i if i >= 0 => Ok(Slot::Cell(i as usize)),
            other => Err(format!("invalid slot index {other}")),
        }
    }
}

/// New value carried by an event. Flags, counters and cell values are kept
/// apart so a visual state can reject a payload that does not fit its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventValue {
    Flag(bool),
    Count(u64),
    Number(Value),
}

impl EventValue {
    /// Whether the payload counts as "set": `true`, or any non-zero number.
    pub fn is_set(self) -> bool {
        match self {
            EventValue::Flag(flag) => flag,
            EventValue::Count(count) => count != 0,
            EventValue::Number(number) => number != 0,
        }
    }
}

/// One recorded attribute change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    /// Milliseconds since the capture clock origin.
    pub time: f64,
    pub index: Slot,
    pub field: Field,
    pub value: EventValue,
}

/// Ordered recording of one captured run together with the sequence
/// contents once the algorithm returned.
///
/// Playback consumes events from the front; consumed events are gone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    pub name: String,
    events: VecDeque<Event>,
    #[serde(rename = "final")]
    final_values: Vec<Value>,
}

impl EventLog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: VecDeque::new(),
            final_values: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, event: Event) {
        debug_assert!(self
            .events
            .back()
            .map(|last| last.time <= event.time)
            .unwrap_or(true));
        self.events.push_back(event);
    }

    pub(crate) fn set_final(&mut self, values: Vec<Value>) {
        self.final_values = values;
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn front(&self) -> Option<&Event> {
        self.events.front()
    }

    /// Discards the first `count` events.
    pub fn consume(&mut self, count: usize) {
        let count = count.min(self.events.len());
        self.events.drain(..count);
    }

    /// Sorted (or searched) snapshot recorded after the run.
    pub fn final_values(&self) -> &[Value] {
        &self.final_values
    }

    /// Time of the last recorded event, or zero for an empty log.
    pub fn duration(&self) -> f64 {
        self.events.back().map(|event| event.time).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: u64, time: f64) -> Event {
        Event {
            id,
            time,
            index: Slot::Cell(0),
            field: Field::Reads,
            value: EventValue::Count(id),
        }
    }

    #[test]
    fn parses_known_fields_and_rejects_others() {
        assert_eq!("references".parse::<Field>().unwrap(), Field::References);
        let err = "colour".parse::<Field>().unwrap_err();
        assert!(matches!(err, AlgovizError::UnknownField { ref field, index: -1 } if field == "colour"));
    }

    #[test]
    fn unknown_field_names_in_json_report_the_name() {
        let mut raw = serde_json::to_value(event(3, 1.5)).unwrap();
        assert_eq!(raw["field"], "reads");
        assert_eq!(serde_json::from_value::<Event>(raw.clone()).unwrap(), event(3, 1.5));

        raw["field"] = "colour".into();
        let err = serde_json::from_value::<Event>(raw).unwrap_err();
        assert!(err.to_string().contains("unknown field `colour`"), "{err}");
    }

    #[test]
    fn slots_serialize_as_signed_indices() {
        let json = serde_json::to_string(&[Slot::Sequence, Slot::Cell(4)]).unwrap();
        assert_eq!(json, "[-1,4]");

        let slots: Vec<Slot> = serde_json::from_str("[-1,7]").unwrap();
        assert_eq!(slots, vec![Slot::Sequence, Slot::Cell(7)]);
        assert!(serde_json::from_str::<Slot>("-3").is_err());
    }

    #[test]
    fn consume_discards_prefix_only() {
        let mut log = EventLog::new("demo");
        for id in 0..5 {
            log.push(event(id, id as f64));
        }

        log.consume(2);
        assert_eq!(log.len(), 3);
        assert_eq!(log.front().map(|e| e.id), Some(2));

        log.consume(10);
        assert!(log.is_empty());
        log.consume(1);
        assert!(log.is_empty());
    }

    #[test]
    fn flag_and_count_truthiness() {
        assert!(EventValue::Flag(true).is_set());
        assert!(!EventValue::Flag(false).is_set());
        assert!(!EventValue::Count(0).is_set());
        assert!(EventValue::Number(-2).is_set());
    }
}
