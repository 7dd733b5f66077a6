// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named feature streams of one video, each a matrix of row vectors
/// (e.g. `rgb` and `flow` for i3d, `vggish` for audio).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Features {
    streams: BTreeMap<String, Vec<Vec<f32>>>,
}

impl Features {
    pub fn new(streams: BTreeMap<String, Vec<Vec<f32>>>) -> Self {
        Self { streams }
    }

    pub fn stream(&self, name: &str) -> Option<&[Vec<f32>]> {
        self.streams.get(name).map(Vec::as_slice)
    }

    pub fn streams(&self) -> impl Iterator<Item = (&str, &[Vec<f32>])> {
        self.streams.iter().map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    /// (rows, columns) of a stream; columns come from the first row
    pub fn shape(&self, name: &str) -> Option<(usize, usize)> {
        self.streams
            .get(name)
            .map(|rows| (rows.len(), rows.first().map_or(0, Vec::len)))
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl fmt::Display for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, rows) in self.streams() {
            let columns = rows.first().map_or(0, Vec::len);
            writeln!(f, "{} ({}, {})", name, rows.len(), columns)?;
            for row in rows {
                writeln!(f, "  {:?}", row)?;
            }
        }
        Ok(())
    }
}
