//! Two-pass batch translation

use contracts::{RawSensorEvent, SensorEventBatch};

use crate::translator::translate;

/// A translated poll result
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedBatch {
    pub batch: SensorEventBatch,

    /// Raw events dropped for an unrecognized type tag
    pub unrecognized: usize,
}

/// Translate one poll's raw events.
///
/// The first pass counts recognized events so the canonical container is
/// allocated with exact capacity; the second translates them in poll order.
pub fn translate_batch(seq: u64, raw: &[RawSensorEvent]) -> TranslatedBatch {
    let recognized = raw.iter().filter(|e| e.kind().is_some()).count();

    let mut events = Vec::with_capacity(recognized);
    for event in raw {
        if let Some(kind) = event.kind() {
            events.push(translate(event, kind));
        }
    }
    debug_assert_eq!(events.len(), recognized);

    TranslatedBatch {
        batch: SensorEventBatch { seq, events },
        unrecognized: raw.len() - recognized,
    }
}
