// SPDX: CC0-1.0

use crate::{format_number, CalcErr, ErrorKind, Number};
use chrono::{DateTime, Local};
use core::fmt;
use std::collections::VecDeque;

pub const HISTORY_CAPACITY: usize = 10;

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Value(Number),
    Error(ErrorKind),
}

impl From<&Result<Number, CalcErr>> for Outcome {
    fn from(res: &Result<Number, CalcErr>) -> Self {
        match res {
            Ok(val) => Self::Value(*val),
            Err(err) => Self::Error(err.kind()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(val) => write!(f, "{}", format_number(*val)),
            Self::Error(kind) => write!(f, "Error ({kind})"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Entry {
    input: String,
    outcome: Outcome,
    at: DateTime<Local>,
}

impl Entry {
    pub fn input(&self) -> &str {
        &self.input
    }

    pub const fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub const fn at(&self) -> &DateTime<Local> {
        &self.at
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.input, self.outcome)
    }
}

// Bounded record of evaluations. Once full, committing evicts the oldest
// entry.
#[derive(Clone, Debug, Default)]
pub struct History {
    // newest at the front
    entries: VecDeque<Entry>,
}

impl History {
    pub fn commit(&mut self, input: impl Into<String>, res: &Result<Number, CalcErr>) -> &Entry {
        self.commit_at(input, res, Local::now())
    }

    pub fn commit_at(
        &mut self,
        input: impl Into<String>,
        res: &Result<Number, CalcErr>,
        at: DateTime<Local>,
    ) -> &Entry {
        if self.entries.len() == HISTORY_CAPACITY {
            self.entries.pop_back();
        }
        self.entries.push_front(Entry {
            input: input.into(),
            outcome: res.into(),
            at,
        });
        &self.entries[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
