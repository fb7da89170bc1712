//! Dashboard export builders: pure formatting over a stats snapshot and the
//! chart series that accompany it.
//!
//! CSV is always available. PDF rendering sits behind the `pdf-export`
//! feature; a build without it reports a descriptive failure instead of
//! crashing, mirroring how an optional rendering library would be handled.

use crate::reporting::{ChartData, DashboardStats};
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::BTreeMap;

/// Summary rows shared by every export format.
fn summary_rows(stats: &DashboardStats) -> Vec<(&'static str, String)> {
    vec![
        ("Active Jobs", stats.active_jobs.to_string()),
        ("Scheduled Jobs", stats.scheduled_jobs.to_string()),
        ("Completed Jobs", stats.completed_jobs.to_string()),
        ("Pending Estimates", stats.pending_estimates.to_string()),
        ("Accepted Estimates", stats.accepted_estimates.to_string()),
        ("Paid Invoices", stats.paid_invoices.to_string()),
        ("Overdue Invoices", stats.overdue_invoices.to_string()),
        ("Total Revenue", money(stats.total_revenue)),
        ("Pending Revenue", money(stats.pending_revenue)),
        ("Material Spend", money(stats.material_spend)),
        (
            "Average Job Duration (days)",
            stats.average_job_duration.to_string(),
        ),
        (
            "Worker Availability (%)",
            format!("{:.1}%", stats.worker_availability),
        ),
        (
            "Customer Satisfaction (%)",
            format!("{:.1}%", stats.customer_satisfaction),
        ),
    ]
}

fn money(value: Decimal) -> String {
    format!("${}", value.round_dp(2))
}

/// Render the dashboard as a CSV workbook: summary, activity feed and one
/// section per chart series.
pub fn build_csv_report(
    stats: &DashboardStats,
    charts: &BTreeMap<&'static str, ChartData>,
) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    write_csv_sections(&mut writer, stats, charts)
        .map_err(|e| AppError::ExportError(format!("Failed to write CSV report: {}", e)))?;

    writer
        .into_inner()
        .map_err(|e| AppError::ExportError(format!("Failed to finish CSV report: {}", e)))
}

fn write_csv_sections(
    writer: &mut csv::Writer<Vec<u8>>,
    stats: &DashboardStats,
    charts: &BTreeMap<&'static str, ChartData>,
) -> Result<(), csv::Error> {
    writer.write_record(["Metric", "Value"])?;
    for (label, value) in summary_rows(stats) {
        writer.write_record([label, value.as_str()])?;
    }
    writer.write_record([""])?;

    writer.write_record(["Recent Activity"])?;
    writer.write_record(["Type", "Title", "Status", "Timestamp"])?;
    for item in &stats.recent_activity {
        writer.write_record([
            item.entity.as_str(),
            item.title.as_str(),
            item.status.as_str(),
            &item.timestamp.to_rfc3339(),
        ])?;
    }

    for chart in charts.values() {
        writer.write_record([""])?;
        writer.write_record([chart.title])?;
        for series in &chart.series {
            writer.write_record([series.name.as_str()])?;
            for (label, value) in chart.labels.iter().zip(&series.values) {
                writer.write_record([label.as_str(), &value.to_string()])?;
            }
        }
    }

    Ok(())
}

/// Render the dashboard as a single PDF document.
///
/// Chart images are referenced by title only; the PDF carries the summary
/// numbers and the chart series inventory.
#[cfg(feature = "pdf-export")]
pub fn build_pdf_report(
    stats: &DashboardStats,
    charts: &BTreeMap<&'static str, ChartData>,
) -> Result<Vec<u8>, AppError> {
    use printpdf::{BuiltinFont, Mm, PdfDocument};

    const PAGE_WIDTH: f32 = 297.0;
    const PAGE_HEIGHT: f32 = 210.0;
    const MARGIN: f32 = 15.0;
    const LINE_HEIGHT: f32 = 7.0;

    let (doc, page, layer) = PdfDocument::new(
        "Construction Intelligence Dashboard",
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Summary",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| AppError::ExportError(format!("Failed to load PDF font: {}", e)))?;
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| AppError::ExportError(format!("Failed to load PDF font: {}", e)))?;

    let mut layer = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT - 20.0;

    layer.use_text(
        "Construction Intelligence Dashboard",
        22.0,
        Mm(MARGIN),
        Mm(y),
        &font_bold,
    );
    y -= 10.0;
    layer.use_text(
        format!("Generated {}", stats.last_updated.format("%Y-%m-%d %H:%M")),
        11.0,
        Mm(MARGIN),
        Mm(y),
        &font,
    );
    y -= 12.0;

    for (label, value) in summary_rows(stats) {
        if y < MARGIN {
            let (next_page, next_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Summary");
            layer = doc.get_page(next_page).get_layer(next_layer);
            y = PAGE_HEIGHT - 20.0;
        }
        layer.use_text(
            format!("{}: {}", label, value),
            11.0,
            Mm(MARGIN),
            Mm(y),
            &font,
        );
        y -= LINE_HEIGHT;
    }

    if !charts.is_empty() {
        let (chart_page, chart_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Charts");
        layer = doc.get_page(chart_page).get_layer(chart_layer);
        y = PAGE_HEIGHT - 20.0;
        layer.use_text("Charts", 16.0, Mm(MARGIN), Mm(y), &font_bold);
        y -= 10.0;

        for chart in charts.values() {
            if y < MARGIN {
                let (next_page, next_layer) =
                    doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Charts");
                layer = doc.get_page(next_page).get_layer(next_layer);
                y = PAGE_HEIGHT - 20.0;
            }
            let points: usize = chart.labels.len();
            layer.use_text(
                format!("{} ({} data points)", chart.title, points),
                11.0,
                Mm(MARGIN),
                Mm(y),
                &font,
            );
            y -= LINE_HEIGHT;
        }
    }

    doc.save_to_bytes()
        .map_err(|e| AppError::ExportError(format!("Failed to render PDF report: {}", e)))
}

/// Placeholder used when the service is compiled without PDF support.
#[cfg(not(feature = "pdf-export"))]
pub fn build_pdf_report(
    _stats: &DashboardStats,
    _charts: &BTreeMap<&'static str, ChartData>,
) -> Result<Vec<u8>, AppError> {
    Err(AppError::ExportError(
        "PDF export is not available in this build; enable the pdf-export feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::stats::ActivityItem;
    use crate::reporting::WorkerCounts;
    use chrono::Utc;

    fn sample_stats() -> DashboardStats {
        DashboardStats {
            active_jobs: 2,
            scheduled_jobs: 3,
            completed_jobs: 5,
            pending_estimates: 1,
            accepted_estimates: 4,
            paid_invoices: 5,
            overdue_invoices: 1,
            total_revenue: Decimal::new(1740000, 2),
            pending_revenue: Decimal::new(500000, 2),
            worker_availability: 75.0,
            worker_counts: WorkerCounts {
                total: 4,
                available: 3,
            },
            material_spend: Decimal::new(123456, 2),
            average_job_duration: 9,
            customer_satisfaction: 62.5,
            recent_activity: vec![ActivityItem {
                entity: "Invoice".to_string(),
                title: "INV-00001".to_string(),
                status: "PAID".to_string(),
                timestamp: Utc::now(),
            }],
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn csv_report_contains_summary_and_activity() {
        let csv_bytes = build_csv_report(&sample_stats(), &BTreeMap::new()).unwrap();
        let text = String::from_utf8(csv_bytes).unwrap();
        assert!(text.starts_with("Metric,Value"));
        assert!(text.contains("Total Revenue,$17400.00"));
        assert!(text.contains("Recent Activity"));
        assert!(text.contains("INV-00001"));
    }

    #[cfg(feature = "pdf-export")]
    #[test]
    fn pdf_report_renders_bytes() {
        let pdf = build_pdf_report(&sample_stats(), &BTreeMap::new()).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }
}
