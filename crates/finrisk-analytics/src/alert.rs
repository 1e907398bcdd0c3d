use time::Date;

use crate::dataset::DatasetRow;

/// Default predicted probability at or above which a ticker is flagged.
pub const DEFAULT_ALERT_THRESHOLD: f64 = 0.30;

/// Tickers whose row covering `today` has a predicted probability of at least
/// `threshold`. Rows and probabilities are paired by position; each ticker is
/// reported once, in order of first appearance.
pub fn flagged_tickers(
    rows: &[DatasetRow],
    probabilities: &[f64],
    today: Date,
    threshold: f64,
) -> Vec<String> {
    let mut flagged: Vec<String> = Vec::new();
    for (row, probability) in rows.iter().zip(probabilities) {
        let covers_today = row.start <= today && today <= row.end;
        if covers_today && *probability >= threshold && !flagged.contains(&row.ticker) {
            flagged.push(row.ticker.clone());
        }
    }
    flagged
}
