//! Active section tracking for native scrolling (reduced motion)

/// Index of the last section whose top is at or above `center_y`.
///
/// `offsets` are section top offsets in document order. Returns 0 when the
/// viewport centre is above every section.
pub fn active_section(center_y: f64, offsets: &[f64]) -> usize {
    offsets
        .iter()
        .rposition(|&top| center_y >= top)
        .unwrap_or(0)
}
