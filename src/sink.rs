//! Destinations for trajectory observations.

use crate::error::SinkError;
use std::io::Write;
use std::sync::mpsc::SyncSender;

#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub time: f64,
    pub counts: Vec<i64>,
}

/// Receives `(time, counts)` records in emission order.
///
/// An error ends the run; the engine does not touch its state afterwards.
pub trait TrajectorySink {
    fn record(&mut self, time: f64, counts: &[i64]) -> Result<(), SinkError>;

    /// Called once when the run ends, whatever the reason.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<F> TrajectorySink for F
where
    F: FnMut(f64, &[i64]) -> Result<(), SinkError>,
{
    fn record(&mut self, time: f64, counts: &[i64]) -> Result<(), SinkError> {
        self(time, counts)
    }
}

/// In-memory trajectory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    observations: Vec<Observation>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Count of `species` at `time`, holding the last observed value.
    pub fn value_at(&self, species: usize, time: f64) -> Option<i64> {
        let idx = self.observations.partition_point(|obs| obs.time <= time);
        idx.checked_sub(1)
            .map(|last| self.observations[last].counts[species])
    }

    pub fn into_observations(self) -> Vec<Observation> {
        self.observations
    }
}

impl TrajectorySink for Trajectory {
    fn record(&mut self, time: f64, counts: &[i64]) -> Result<(), SinkError> {
        self.observations.push(Observation {
            time,
            counts: counts.to_vec(),
        });
        Ok(())
    }
}

/// Forwards observations over a bounded channel. `send` blocks while the
/// channel is full, so a slow consumer throttles the simulation.
#[derive(Debug)]
pub struct ChannelSink {
    sender: SyncSender<Observation>,
}

impl ChannelSink {
    pub fn new(sender: SyncSender<Observation>) -> Self {
        Self { sender }
    }
}

impl TrajectorySink for ChannelSink {
    fn record(&mut self, time: f64, counts: &[i64]) -> Result<(), SinkError> {
        self.sender
            .send(Observation {
                time,
                counts: counts.to_vec(),
            })
            .map_err(|_| SinkError::Disconnected)
    }
}

/// Writes `time,<species...>` rows.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    row: Vec<String>,
}

impl<W: Write> CsvSink<W> {
    pub fn new<S: AsRef<str>>(writer: W, species: &[S]) -> Result<Self, SinkError> {
        let mut writer = csv::Writer::from_writer(writer);
        let mut header = Vec::with_capacity(species.len() + 1);
        header.push("time");
        header.extend(species.iter().map(|name| name.as_ref()));
        writer.write_record(&header)?;
        Ok(Self {
            writer,
            row: Vec::with_capacity(species.len() + 1),
        })
    }

    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|err| SinkError::Io(err.into_error()))
    }
}

impl<W: Write> TrajectorySink for CsvSink<W> {
    fn record(&mut self, time: f64, counts: &[i64]) -> Result<(), SinkError> {
        self.row.clear();
        self.row.push(time.to_string());
        self.row.extend(counts.iter().map(i64::to_string));
        self.writer.write_record(&self.row)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}
