// Window extraction
// Slices the fixed-length block of samples preceding each gait event

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::channels::ChannelSelector;
use crate::events::GaitEvent;
use crate::trial::TrialTable;

/// Samples preceding one event across the selected channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    /// Column names in selection order
    pub channels: Vec<String>,

    /// `[window_size x num_channels]`
    pub samples: Array2<f32>,
}

impl Window {
    pub fn window_size(&self) -> usize {
        self.samples.nrows()
    }

    pub fn num_channels(&self) -> usize {
        self.samples.ncols()
    }

    /// One channel's waveform
    pub fn channel(&self, idx: usize) -> Vec<f32> {
        self.samples.column(idx).to_vec()
    }
}

/// Inclusive row range `[t - w - 1, t - 2]` for an event at row `t`
/// Returns `None` when the range would start before row 0
pub fn window_bounds(timestep: usize, window_size: usize) -> Option<(usize, usize)> {
    if window_size == 0 {
        return None;
    }

    let start = timestep.checked_sub(window_size + 1)?;
    Some((start, timestep - 2))
}

/// Extract the window for an event
///
/// Events too close to the trial start, or whose window runs past the
/// last row, produce no window. Missing cells inside the window read as 0.
pub fn extract_window(
    table: &TrialTable,
    event: &GaitEvent,
    window_size: usize,
    selector: &ChannelSelector,
) -> Option<Window> {
    let (start, end) = window_bounds(event.timestep, window_size)?;

    if end >= table.len() {
        log::debug!(
            "Event at row {} needs rows up to {}, trial has {}",
            event.timestep,
            end,
            table.len()
        );
        return None;
    }

    let columns = selector.select(event.laterality);
    let samples = Array2::from_shape_fn((window_size, columns.len()), |(r, c)| {
        table.value(start + r, columns[c]).unwrap_or(0.0) as f32
    });

    Some(Window {
        channels: selector.channel_names(event.laterality),
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{LateralityMode, ModalitySet};
    use crate::events::{Laterality, TriggerCode};

    /// Row index stored in every data column so slices are easy to check
    fn ramp_table(rows: usize) -> TrialTable {
        let headers = vec!["Right_Shank_Ax".to_string(), "Mode".to_string()];
        let data = (0..rows)
            .map(|r| vec![Some(r as f64), Some(1.0)])
            .collect();
        TrialTable::new(headers, data)
    }

    fn event_at(timestep: usize) -> GaitEvent {
        GaitEvent {
            timestep,
            trigger: TriggerCode::from_digits(2, 0, 3),
            laterality: Laterality::Right,
        }
    }

    #[test]
    fn test_window_bounds() {
        assert_eq!(window_bounds(600, 500), Some((99, 598)));
        assert_eq!(window_bounds(501, 500), Some((0, 499)));
        assert_eq!(window_bounds(500, 500), None);
        assert_eq!(window_bounds(10, 0), None);
    }

    #[test]
    fn test_extract_window_spans_preceding_rows() {
        let table = ramp_table(2000);
        let selector =
            ChannelSelector::new(table.headers(), LateralityMode::Bilateral, &ModalitySet::all());

        let window = extract_window(&table, &event_at(600), 500, &selector).unwrap();

        assert_eq!(window.window_size(), 500);
        assert_eq!(window.num_channels(), 2);
        assert_eq!(window.samples[[0, 0]], 99.0);
        assert_eq!(window.samples[[499, 0]], 598.0);
        assert_eq!(window.channels, vec!["Right_Shank_Ax", "Mode"]);
    }

    #[test]
    fn test_underflow_drops_window() {
        let table = ramp_table(2000);
        let selector =
            ChannelSelector::new(table.headers(), LateralityMode::Bilateral, &ModalitySet::all());

        assert!(extract_window(&table, &event_at(400), 500, &selector).is_none());
    }

    #[test]
    fn test_overflow_drops_window() {
        let table = ramp_table(550);
        let selector =
            ChannelSelector::new(table.headers(), LateralityMode::Bilateral, &ModalitySet::all());

        // Window would need row 598
        assert!(extract_window(&table, &event_at(600), 500, &selector).is_none());
    }
}
