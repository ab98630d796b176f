//! Simulation Result Module
//!
//! This module provides the data structures returned by simulation runs.
//!
//! # Key Components
//!
//! - [`Trace`]: time points plus a value matrix (rows = time points, columns = compositors)
//! - [`Segment`]: bookkeeping for one integrated interval of a pulse schedule
//! - [`PulseTrace`]: the stitched trace of a pulse schedule together with its segments
//!
//! Traces can be queried per compositor, resampled onto another time grid and written
//! out as CSV.

use std::io::Write;

use ndarray::{s, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use super::error::SimulationError;
use super::interpolation::resample;

/// A sampled solution of the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub time: Vec<f64>,
    pub values: Array2<f64>,
    names: Vec<String>,
}

impl Trace {
    /// Creates a trace.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::LengthMismatch`] if the number of rows differs from the
    /// number of time points or the number of columns from the number of names.
    pub fn new(
        time: Vec<f64>,
        values: Array2<f64>,
        names: Vec<String>,
    ) -> Result<Self, SimulationError> {
        if values.nrows() != time.len() {
            return Err(SimulationError::LengthMismatch {
                x: time.len(),
                y: values.nrows(),
            });
        }
        if values.ncols() != names.len() {
            return Err(SimulationError::LengthMismatch {
                x: names.len(),
                y: values.ncols(),
            });
        }

        Ok(Self { time, values, names })
    }

    /// An empty trace over the given columns.
    pub fn empty(names: Vec<String>) -> Self {
        Self {
            time: Vec::new(),
            values: Array2::zeros((0, names.len())),
            names,
        }
    }

    /// Compositor names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Values of one compositor over time.
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values.column(i))
    }

    /// State at the last time point.
    pub fn final_state(&self) -> Option<Vec<f64>> {
        self.values
            .axis_iter(Axis(0))
            .last()
            .map(|row| row.to_vec())
    }

    /// State at the given row.
    pub fn state_at(&self, row: usize) -> Option<Vec<f64>> {
        (row < self.len()).then(|| self.values.row(row).to_vec())
    }

    /// Appends another trace, dropping its first `skip` samples and shifting its times
    /// by `offset`.
    pub(crate) fn append_shifted(
        &mut self,
        other: &Trace,
        skip: usize,
        offset: f64,
    ) -> Result<usize, SimulationError> {
        let skip = skip.min(other.len());
        let kept = other.values.slice(s![skip.., ..]);

        self.time
            .extend(other.time[skip..].iter().map(|t| t + offset));
        self.values
            .append(Axis(0), kept)
            .map_err(|e| SimulationError::Integration {
                t: offset,
                message: e.to_string(),
            })?;

        Ok(other.len() - skip)
    }

    /// Resamples every column onto `grid` by linear interpolation.
    pub fn resample_onto(&self, grid: &[f64]) -> Result<Trace, SimulationError> {
        let mut values = Array2::zeros((grid.len(), self.names.len()));

        for (i, column) in self.values.axis_iter(Axis(1)).enumerate() {
            let column = column.to_vec();
            let resampled = resample(&self.time, &column, grid)?;
            values
                .column_mut(i)
                .assign(&ArrayView1::from(resampled.as_slice()));
        }

        Trace::new(grid.to_vec(), values, self.names.clone())
    }

    /// Writes the trace as CSV with a `time` column followed by one column per compositor.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writeln!(writer, "time,{}", self.names.join(","))?;

        for (t, row) in self.time.iter().zip(self.values.axis_iter(Axis(0))) {
            let row: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(writer, "{},{}", t, row.join(","))?;
        }

        writer.flush()
    }
}

/// One integrated interval of a pulse schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Absolute time of the pulse opening the segment.
    pub start_time: f64,
    /// Absolute time of the next pulse.
    pub end_time: f64,
    /// The override applied at the start, if any.
    pub applied: Option<(String, f64)>,
    /// State the integration started from, after the override.
    pub start_state: Vec<f64>,
    /// State at the end of the segment, carried into the next one.
    pub end_state: Vec<f64>,
    /// Number of samples contributed to the stitched trace.
    pub samples: usize,
}

/// Result of a pulse schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseTrace {
    pub trace: Trace,
    pub segments: Vec<Segment>,
}

impl PulseTrace {
    pub fn time(&self) -> &[f64] {
        &self.trace.time
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.trace.values
    }
}

impl From<PulseTrace> for Trace {
    fn from(result: PulseTrace) -> Self {
        result.trace
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use pretty_assertions::assert_eq;

    use super::*;

    fn names() -> Vec<String> {
        vec!["A".to_string(), "B".to_string()]
    }

    #[test]
    fn test_shape_checked() {
        let result = Trace::new(vec![0.0, 1.0], array![[1.0, 2.0]], names());
        assert!(matches!(
            result,
            Err(SimulationError::LengthMismatch { x: 2, y: 1 })
        ));
    }

    #[test]
    fn test_append_shifted() {
        let part = Trace::new(
            vec![0.0, 1.0, 2.0, 3.0],
            array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]],
            names(),
        )
        .unwrap();

        let mut stitched = Trace::empty(names());
        let kept = stitched.append_shifted(&part, 2, 10.0).unwrap();

        assert_eq!(kept, 2);
        assert_eq!(stitched.time, vec![12.0, 13.0]);
        assert_eq!(stitched.column("A").unwrap().to_vec(), vec![3.0, 4.0]);
        assert_eq!(stitched.final_state(), Some(vec![4.0, 0.0]));
    }

    #[test]
    fn test_write_csv() {
        let trace = Trace::new(vec![0.0, 0.5], array![[1.0, 2.0], [3.0, 4.0]], names()).unwrap();
        let mut buffer = Vec::new();
        trace.write_csv(&mut buffer).unwrap();

        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "time,A,B\n0,1,2\n0.5,3,4\n"
        );
    }

    #[test]
    fn test_resample_onto() {
        let trace = Trace::new(vec![0.0, 2.0], array![[0.0, 10.0], [2.0, 10.0]], names()).unwrap();
        let resampled = trace.resample_onto(&[0.0, 0.5, 1.0, 2.0]).unwrap();

        assert_eq!(
            resampled.column("A").unwrap().to_vec(),
            vec![0.0, 0.5, 1.0, 2.0]
        );
        assert_eq!(resampled.column("B").unwrap().to_vec(), vec![10.0; 4]);
    }
}
