//! Sorting algorithms written against [`InstrumentedSequence`].
//!
//! Every algorithm touches the sequence only through `read`, `write`,
//! `swap` and the comparator it is handed, so each step shows up in the
//! captured log.

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::capture::Comparator;
use crate::event::Value;
use crate::instrument::InstrumentedSequence;
use crate::{AlgovizError, Result};

/// Registered algorithms, in the order they are animated by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    BinaryInsertion,
    Insertion,
    Heap,
    Quick,
    Merge,
    Bubble,
    BubbleAlt,
}

impl Algorithm {
    pub const ALL: [Algorithm; 7] = [
        Algorithm::BinaryInsertion,
        Algorithm::Insertion,
        Algorithm::Heap,
        Algorithm::Quick,
        Algorithm::Merge,
        Algorithm::Bubble,
        Algorithm::BubbleAlt,
    ];

    /// Short name used on the command line and in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::BinaryInsertion => "binary-insertion",
            Algorithm::Insertion => "insertion",
            Algorithm::Heap => "heap",
            Algorithm::Quick => "quick",
            Algorithm::Merge => "merge",
            Algorithm::Bubble => "bubble",
            Algorithm::BubbleAlt => "bubble-alt",
        }
    }

    /// Human readable label given to captured logs.
    pub fn label(self) -> &'static str {
        match self {
            Algorithm::BinaryInsertion => "binary insertion sort",
            Algorithm::Insertion => "insertion sort",
            Algorithm::Heap => "heap sort",
            Algorithm::Quick => "quick sort",
            Algorithm::Merge => "merge sort",
            Algorithm::Bubble => "bubble sort",
            Algorithm::BubbleAlt => "bubble alt",
        }
    }

    pub fn run(self, sequence: &mut InstrumentedSequence, cmp: Comparator) -> Result<()> {
        match self {
            Algorithm::BinaryInsertion => binary_insertion_sort(sequence, cmp),
            Algorithm::Insertion => insertion_sort(sequence, cmp),
            Algorithm::Heap => heap_sort(sequence, cmp),
            Algorithm::Quick => quick_sort(sequence, cmp),
            Algorithm::Merge => merge_sort(sequence, cmp),
            Algorithm::Bubble => bubble_sort(sequence, cmp),
            Algorithm::BubbleAlt => exchange_sort(sequence, cmp),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = AlgovizError;

    fn from_str(s: &str) -> Result<Self> {
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == s)
            .ok_or_else(|| AlgovizError::UnknownAlgorithm(s.to_string()))
    }
}

/// Insertion sort that finds each insertion point by binary search and
/// then shifts the tail right by one.
pub fn binary_insertion_sort(seq: &mut InstrumentedSequence, cmp: Comparator) -> Result<()> {
    for i in 1..seq.len() {
        let (mut lo, mut hi) = (0, i);
        while lo < hi {
            let mid = (lo + hi) / 2;
            if cmp(seq, i, mid)? == Ordering::Less {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        if lo == i {
            continue;
        }

        let value = seq.read(i)?;
        for j in (lo + 1..=i).rev() {
            let previous = seq.read(j - 1)?;
            seq.write(j, previous)?;
        }
        seq.write(lo, value)?;
    }
    Ok(())
}

pub fn insertion_sort(seq: &mut InstrumentedSequence, cmp: Comparator) -> Result<()> {
    for i in 1..seq.len() {
        let mut j = i;
        while j > 0 && cmp(seq, j - 1, j)? == Ordering::Greater {
            seq.swap(j - 1, j)?;
            j -= 1;
        }
    }
    Ok(())
}

pub fn heap_sort(seq: &mut InstrumentedSequence, cmp: Comparator) -> Result<()> {
    let len = seq.len();
    for start in (0..len / 2).rev() {
        sift_down(seq, cmp, start, len - 1)?;
    }
    for end in (1..len).rev() {
        seq.swap(end, 0)?;
        sift_down(seq, cmp, 0, end - 1)?;
    }
    Ok(())
}

fn sift_down(seq: &mut InstrumentedSequence, cmp: Comparator, start: usize, end: usize) -> Result<()> {
    let mut root = start;
    while root * 2 + 1 <= end {
        let child = root * 2 + 1;
        let mut largest = root;
        if cmp(seq, largest, child)? == Ordering::Less {
            largest = child;
        }
        if child < end && cmp(seq, largest, child + 1)? == Ordering::Less {
            largest = child + 1;
        }
        if largest == root {
            return Ok(());
        }
        seq.swap(root, largest)?;
        root = largest;
    }
    Ok(())
}

pub fn quick_sort(seq: &mut InstrumentedSequence, cmp: Comparator) -> Result<()> {
    let len = seq.len();
    if len > 1 {
        quick_sort_range(seq, cmp, 0, len - 1)?;
    }
    Ok(())
}

fn quick_sort_range(seq: &mut InstrumentedSequence, cmp: Comparator, lo: usize, hi: usize) -> Result<()> {
    if lo >= hi {
        return Ok(());
    }
    let wall = partition(seq, cmp, lo, hi)?;
    if wall > lo {
        quick_sort_range(seq, cmp, lo, wall - 1)?;
    }
    quick_sort_range(seq, cmp, wall + 1, hi)
}

// Lomuto partition around the value at `hi`.
fn partition(seq: &mut InstrumentedSequence, cmp: Comparator, lo: usize, hi: usize) -> Result<usize> {
    let mut wall = lo;
    for j in lo..hi {
        if cmp(seq, j, hi)? == Ordering::Less {
            if j != wall {
                seq.swap(wall, j)?;
            }
            wall += 1;
        }
    }
    if wall != hi {
        seq.swap(wall, hi)?;
    }
    Ok(wall)
}

pub fn merge_sort(seq: &mut InstrumentedSequence, cmp: Comparator) -> Result<()> {
    let len = seq.len();
    if len > 1 {
        let mut buffer = Vec::with_capacity(len);
        merge_sort_range(seq, cmp, &mut buffer, 0, len - 1)?;
    }
    Ok(())
}

fn merge_sort_range(
    seq: &mut InstrumentedSequence,
    cmp: Comparator,
    buffer: &mut Vec<Value>,
    lo: usize,
    hi: usize,
) -> Result<()> {
    if lo >= hi {
        return Ok(());
    }
    let mid = (lo + hi) / 2;
    merge_sort_range(seq, cmp, buffer, lo, mid)?;
    merge_sort_range(seq, cmp, buffer, mid + 1, hi)?;

    buffer.clear();
    let (mut left, mut right) = (lo, mid + 1);
    while left <= mid && right <= hi {
        if cmp(seq, left, right)? != Ordering::Greater {
            buffer.push(seq.read(left)?);
            left += 1;
        } else {
            buffer.push(seq.read(right)?);
            right += 1;
        }
    }
    for index in (left..=mid).chain(right..=hi) {
        buffer.push(seq.read(index)?);
    }
    for (offset, value) in buffer.iter().enumerate() {
        seq.write(lo + offset, *value)?;
    }
    Ok(())
}

/// Bubble sort that shrinks each pass to the position of the last swap.
pub fn bubble_sort(seq: &mut InstrumentedSequence, cmp: Comparator) -> Result<()> {
    let mut end = seq.len();
    while end > 1 {
        let mut last_swap = 0;
        for i in 1..end {
            if cmp(seq, i - 1, i)? == Ordering::Greater {
                seq.swap(i - 1, i)?;
                last_swap = i;
            }
        }
        end = last_swap;
    }
    Ok(())
}

/// Compares every pair `(a, b)` with `a < b` and swaps when out of order.
pub fn exchange_sort(seq: &mut InstrumentedSequence, cmp: Comparator) -> Result<()> {
    let len = seq.len();
    for a in 0..len {
        for b in a + 1..len {
            if cmp(seq, a, b)? == Ordering::Greater {
                seq.swap(a, b)?;
            }
        }
    }
    Ok(())
}
