use super::{MetricDef, Sample};
use tokio::sync::mpsc;

const LOG_TARGET: &str = "   metrics";

/// Creates a connected sink and stream.
#[must_use]
pub fn channel() -> (MetricSink, SampleStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MetricSink { tx }, SampleStream { rx })
}

/// Cloneable sending side through which collectors report samples.
///
/// Sending never blocks, so collectors can report while the receiving side is
/// not yet reading.
#[derive(Debug, Clone)]
pub struct MetricSink {
    tx: mpsc::UnboundedSender<Sample>,
}

impl MetricSink {
    /// Reports a gauge value. Samples with the wrong number of labels are logged and dropped.
    pub fn gauge(&self, def: &'static MetricDef, value: f64, label_values: &[&str]) {
        match Sample::new(def, value, label_values) {
            Ok(sample) => self.send(sample),
            Err(e) => log::error!(target: LOG_TARGET, "Dropping sample: {e}"),
        }
    }

    pub fn send(&self, sample: Sample) {
        if let Err(e) = self.tx.send(sample) {
            log::trace!(target: LOG_TARGET, "Dropping late sample for '{}'", e.0.name());
        }
    }
}

/// Receiving side of a [`channel`].
#[derive(Debug)]
pub struct SampleStream {
    rx: mpsc::UnboundedReceiver<Sample>,
}

impl SampleStream {
    /// Takes every sample sent so far without waiting for more.
    pub fn drain(&mut self) -> Vec<Sample> {
        let mut samples = Vec::new();
        while let Ok(sample) = self.rx.try_recv() {
            samples.push(sample);
        }
        samples
    }
}
