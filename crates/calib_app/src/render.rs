//! Plain-text rendering for the terminal front end.
//!
//! The histogram is drawn as horizontal bars, one row per bin, scaled so the
//! fullest bin spans `width` characters.

use crate::session::TestRun;
use calib_core::{FormFields, Histogram};

/// Default bar width in characters.
pub const DEFAULT_BAR_WIDTH: usize = 40;

const BAR: char = '#';

/// Render the reprojection error histogram of a test run.
pub fn render_test_run(run: &TestRun, width: usize) -> String {
    let header = format!(
        "Reprojection Error Histogram\nmean error {} | {} samples | {} bins\n",
        run.mean_error,
        run.samples.len(),
        run.histogram.bins()
    );
    header + &render_histogram(&run.histogram, width)
}

/// Render histogram bins as `[lo, hi) | ### count` rows.
pub fn render_histogram(histogram: &Histogram, width: usize) -> String {
    let max = histogram.max_count();
    let mut rows = vec![format!("{:>21} | Frequency", "Error")];
    rows.extend(histogram.counts.iter().enumerate().map(|(i, &count)| {
        format!(
            "[{:>8.4}, {:>8.4}) | {} {}",
            histogram.edges[i],
            histogram.edges[i + 1],
            BAR.to_string().repeat(bar_length(count, max, width)),
            count
        )
    }));
    lines(rows)
}

fn bar_length(count: usize, max: usize, width: usize) -> usize {
    if max == 0 {
        return 0;
    }
    // Round so that any non-empty bin shows at least one character.
    let scaled = (count as f64 / max as f64 * width as f64).round() as usize;
    if count > 0 {
        scaled.max(1)
    } else {
        0
    }
}

/// Render every form field as `key = value` with its label.
pub fn render_form(form: &FormFields) -> String {
    let entries = form.entries();
    let key_width = entries
        .iter()
        .map(|(id, _)| id.to_string().len())
        .max()
        .unwrap_or(0);

    let rows = entries.into_iter().map(|(id, text)| {
        format!(
            "{:<width$} = {:<16} # {}",
            id.to_string(),
            text,
            id.label(),
            width = key_width
        )
    });
    lines(rows)
}

/// Newline-terminated concatenation of `rows`.
fn lines(rows: impl IntoIterator<Item = String>) -> String {
    rows.into_iter().map(|row| row + "\n").collect()
}
