// Gait event extraction
// Scans the sparse marker columns of a trial for heel-contact / toe-off events

use crate::events::types::{GaitEvent, GaitMarker, TriggerCode};
use crate::trial::TrialTable;

/// Extract every accepted gait event from a trial
///
/// Each marker column is scanned independently from row 0, so the output
/// is grouped by marker in `GaitMarker::ALL` order rather than sorted by
/// time. Events with an unreadable trigger or an invalid-mode digit are
/// dropped.
pub fn extract_events(table: &TrialTable) -> Vec<GaitEvent> {
    let mut events = Vec::new();

    for marker in GaitMarker::ALL {
        events.extend(scan_marker(table, marker));
    }

    events
}

/// Scan one marker column while its cells are populated
fn scan_marker(table: &TrialTable, marker: GaitMarker) -> Vec<GaitEvent> {
    let Some(marker_col) = table.column(marker.column_name()) else {
        log::debug!("Trial has no {} column", marker.column_name());
        return Vec::new();
    };
    let trigger_col = table.column(&marker.trigger_column());

    let mut events = Vec::new();
    let mut rejected = 0usize;

    for row in 0..table.len() {
        let Some(timestep) = table.value(row, marker_col) else {
            break;
        };

        let trigger = trigger_col
            .and_then(|col| table.value(row, col))
            .and_then(TriggerCode::parse);

        let Some(trigger) = trigger else {
            log::debug!(
                "{} row {}: unreadable trigger code, event dropped",
                marker.column_name(),
                row
            );
            rejected += 1;
            continue;
        };

        if !trigger.is_valid() || timestep < 0.0 {
            rejected += 1;
            continue;
        }

        events.push(GaitEvent {
            timestep: timestep as usize,
            trigger,
            laterality: marker.laterality(),
        });
    }

    if rejected > 0 {
        log::debug!(
            "{}: {} accepted, {} rejected",
            marker.column_name(),
            events.len(),
            rejected
        );
    }

    events
}
