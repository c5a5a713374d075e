//! Min/max peak summaries for drawing a waveform overview.

/// The lowest and highest sample within one display column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub min: f32,
    pub max: f32,
}

/// Summarize `samples` into `columns` min/max pairs.
///
/// Each column covers `ceil(len / columns)` consecutive samples. Columns past
/// the end of the data (possible when the length does not divide evenly) are
/// reported as silence.
pub fn waveform_peaks(samples: &[f32], columns: usize) -> Vec<Peak> {
    if samples.is_empty() || columns == 0 {
        return Vec::new();
    }
    let step = samples.len().div_ceil(columns);

    (0..columns)
        .map(|col| {
            let start = (col * step).min(samples.len());
            let end = (start + step).min(samples.len());
            let slice = &samples[start..end];
            if slice.is_empty() {
                return Peak { min: 0.0, max: 0.0 };
            }
            slice.iter().fold(
                Peak {
                    min: f32::INFINITY,
                    max: f32::NEG_INFINITY,
                },
                |peak, &s| Peak {
                    min: peak.min.min(s),
                    max: peak.max.max(s),
                },
            )
        })
        .collect()
}
