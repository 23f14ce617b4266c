//! Terminal rendering of a score view

use std::fmt::Write;

use super::error::DashboardError;
use super::formatter::{RankedFeature, RiskBand, ScoreView};

/// Gauge width in cells
pub const GAUGE_WIDTH: usize = 50;

pub const CACHED_NOTICE: &str = "Data already received for this client";

const NAME_WIDTH: usize = 32;

/// Cell index of a fraction of the gauge
fn cell(fraction: f64, cells: usize) -> usize {
    ((fraction * cells as f64).floor() as usize).min(cells - 1)
}

/// Low zone `=`, high zone `#`, client marker `O`, threshold `^` underneath
pub fn gauge(view: &ScoreView, width: usize) -> String {
    let cells = width.max(2);
    let threshold_at = cell(view.threshold / 100.0, cells);
    let marker_at = cell(view.gauge_position, cells);

    let bar: String = (0..cells)
        .map(|i| match i {
            _ if i == marker_at => 'O',
            _ if i < threshold_at => '=',
            _ => '#',
        })
        .collect();

    format!(
        "  0 [{}] 100\n     {}^ threshold {:.2}%",
        bar,
        " ".repeat(threshold_at),
        view.threshold
    )
}

pub fn banner(band: RiskBand) -> String {
    let label = band.label();
    let edge = format!("+{}+", "-".repeat(label.len() + 8));
    format!("{}\n|    {}    |\n{}", edge, label, edge)
}

fn table(out: &mut String, title: &str, rows: &[RankedFeature]) {
    let _ = writeln!(out, "{}", title);
    if rows.is_empty() {
        let _ = writeln!(out, "  (none)");
        return;
    }

    let _ = writeln!(out, "  {:<width$} {:>12} {:>14}", "feature", "attribution", "value", width = NAME_WIDTH);
    for row in rows {
        let _ = writeln!(
            out,
            "  {:<width$} {:>12.4} {:>14}",
            row.name,
            row.attribution,
            row.value.to_string(),
            width = NAME_WIDTH
        );
    }
}

/// Full report for one client
pub fn render_view(id: i64, view: &ScoreView) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "SK_ID_CURR {}: default probability {:.2}%", id, view.probability);
    let _ = writeln!(out, "{}", gauge(view, GAUGE_WIDTH));
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", banner(view.band));
    let _ = writeln!(out);

    table(&mut out, &format!("Top {} features reducing risk", view.decreasing.len()), &view.decreasing);
    let _ = writeln!(out);
    table(&mut out, &format!("Top {} features increasing risk", view.increasing.len()), &view.increasing);

    out
}

/// Message shown in place of a report
pub fn render_error(err: &DashboardError) -> String {
    if let DashboardError::InvalidInput(_) = err {
        return err.to_string();
    }

    match err.server_kind() {
        Some("not_found") => format!("No client with this identifier. {}", err),
        Some("ambiguous_record") => format!("Identifier matches several clients. {}", err),
        Some("model_not_loaded") => format!("Scoring service is not ready. {}", err),
        _ => format!("Error while calling the scoring API: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::formatter::{DisplayValue, RankedFeature};

    fn view(probability: f64, band: RiskBand) -> ScoreView {
        ScoreView {
            probability,
            threshold: 44.5262,
            band,
            gauge_position: probability / 100.0,
            decreasing: vec![RankedFeature {
                name: "EXT_SOURCE_2".into(),
                attribution: -0.42,
                value: DisplayValue::Fractional(0.26),
            }],
            increasing: vec![],
        }
    }

    #[test]
    fn test_gauge_marker_positions() {
        let text = gauge(&view(10.0, RiskBand::Low), 10);
        let bar = text.lines().next().unwrap();
        assert_eq!(bar, "  0 [=O==######] 100");
        assert!(text.contains("threshold 44.53%"));
    }

    #[test]
    fn test_gauge_clamps_full_probability() {
        let text = gauge(&view(100.0, RiskBand::High), 10);
        assert!(text.starts_with("  0 [====#####O] 100"));
    }

    #[test]
    fn test_banner_label() {
        assert!(banner(RiskBand::High).contains("|    Potential risk    |"));
        assert!(banner(RiskBand::Low).contains("Low risk"));
    }

    #[test]
    fn test_render_view() {
        let text = render_view(100002, &view(12.5, RiskBand::Low));

        assert!(text.starts_with("SK_ID_CURR 100002: default probability 12.50%"));
        assert!(text.contains("Top 1 features reducing risk"));
        assert!(text.contains("EXT_SOURCE_2"));
        assert!(text.contains("0.26"));
        assert!(text.contains("Top 0 features increasing risk\n  (none)"));
    }

    #[test]
    fn test_render_not_found() {
        let err = DashboardError::Server {
            status: 404,
            kind: Some("not_found".into()),
            message: "no record with SK_ID_CURR 1".into(),
        };
        assert!(render_error(&err).starts_with("No client with this identifier."));
    }

    #[test]
    fn test_render_input_error() {
        let err = DashboardError::InvalidInput("'abc' is not a client identifier".into());
        assert_eq!(render_error(&err), "Invalid input: 'abc' is not a client identifier");
    }
}
