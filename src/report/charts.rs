//! Chart rendering.
//!
//! Renders the five standalone PNG charts for a run. Chart rendering is
//! best-effort: each chart is isolated, and a failure (bad path, missing
//! system fonts, degenerate data) logs a warning and leaves the
//! remaining charts untouched. The workbook is the primary artifact;
//! callers treat the returned count as informational.

use crate::kpi;
use crate::models::{CompetitorRecord, MonthlyKpi, ProductPricing, RegionKpi, ReportTables};
use anyhow::{Context, Result};
use chrono::{Months, NaiveDate};
use plotters::prelude::*;
use std::path::Path;
use tracing::{debug, warn};

/// Chart file names in render order.
pub const CHART_FILES: [&str; 5] = [
    "monthly_revenue.png",
    "region_revenue.png",
    "funnel_rates.png",
    "price_vs_win_rate.png",
    "competitor_share.png",
];

/// Pixel dimensions for rendered charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartSize {
    fn default() -> Self {
        Self {
            width: 900,
            height: 600,
        }
    }
}

impl From<&crate::config::ChartsConfig> for ChartSize {
    fn from(config: &crate::config::ChartsConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
        }
    }
}

/// Renders all charts into `dir`, creating it if needed. Returns how
/// many charts were written successfully.
pub fn render_charts(dir: &Path, tables: &ReportTables, size: ChartSize) -> usize {
    if let Err(e) = std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create charts directory {}", dir.display()))
    {
        warn!("Skipping charts: {:#}", e);
        return 0;
    }

    let mut rendered = 0;
    let mut run = |name: &str, result: Result<()>| match result {
        Ok(()) => {
            debug!("Rendered {}", name);
            rendered += 1;
        }
        Err(e) => warn!("Failed to render {}: {:#}", name, e),
    };

    run(
        CHART_FILES[0],
        monthly_revenue_chart(&dir.join(CHART_FILES[0]), &tables.monthly, size),
    );
    run(
        CHART_FILES[1],
        region_revenue_chart(&dir.join(CHART_FILES[1]), &tables.regions, size),
    );
    run(
        CHART_FILES[2],
        funnel_rates_chart(&dir.join(CHART_FILES[2]), &tables.monthly, size),
    );
    run(
        CHART_FILES[3],
        price_vs_win_chart(&dir.join(CHART_FILES[3]), &tables.products, size),
    );
    run(
        CHART_FILES[4],
        competitor_share_chart(&dir.join(CHART_FILES[4]), &tables.competitors, size),
    );

    rendered
}

/// Upper bound for a y axis starting at zero. Falls back to 1.0 so an
/// all-zero series still gets a drawable range.
fn y_axis_max(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(0.0f64, f64::max);
    if max > 0.0 {
        max * 1.05
    } else {
        1.0
    }
}

/// Padded axis range for scatter data. Falls back to 0..1 when there
/// are no points, and pads a single point into a usable span.
fn axis_range(values: &[f64]) -> std::ops::Range<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }

    let pad = ((max - min) * 0.1).max(max.abs() * 0.05).max(0.5);
    (min - pad)..(max + pad)
}

/// Date span for the monthly chart's x axis. A single month (or none)
/// is widened to a one-month span so the axis stays drawable.
fn month_axis_range(monthly: &[MonthlyKpi]) -> (NaiveDate, NaiveDate) {
    match (monthly.first(), monthly.last()) {
        (Some(first), Some(last)) if last.month > first.month => (first.month, last.month),
        (Some(only), _) => (only.month, only.month + Months::new(1)),
        _ => (NaiveDate::default(), NaiveDate::default() + Months::new(1)),
    }
}

/// Line chart of total revenue per month. Months go on a real date
/// axis, so a gap in the data reads as a gap on the chart.
fn monthly_revenue_chart(path: &Path, monthly: &[MonthlyKpi], size: ChartSize) -> Result<()> {
    let revenues: Vec<f64> = monthly.iter().map(|m| m.revenue).collect();
    let (first, last) = month_axis_range(monthly);

    let root = BitMapBackend::new(path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Revenue", ("sans-serif", 28))
        .margin(16)
        .x_label_area_size(48)
        .y_label_area_size(80)
        .build_cartesian_2d(first..last, 0f64..y_axis_max(&revenues))?;

    chart
        .configure_mesh()
        .x_desc("Month")
        .y_desc("Revenue")
        .x_labels(monthly.len().clamp(2, 12))
        .x_label_formatter(&|date: &NaiveDate| date.format("%Y-%m").to_string())
        .draw()?;

    chart.draw_series(LineSeries::new(
        monthly.iter().map(|m| (m.month, m.revenue)),
        &BLUE,
    ))?;

    root.present()?;
    Ok(())
}

/// Bar chart of total revenue per region, highest first.
fn region_revenue_chart(path: &Path, regions: &[RegionKpi], size: ChartSize) -> Result<()> {
    let mut totals: Vec<(&str, f64)> = regions
        .iter()
        .map(|r| (r.region.as_str(), r.revenue))
        .collect();
    totals.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let labels: Vec<String> = totals.iter().map(|(region, _)| region.to_string()).collect();
    let values: Vec<f64> = totals.iter().map(|(_, revenue)| *revenue).collect();

    draw_bar_chart(
        path,
        "Revenue by Region (Total)",
        "Region",
        "Revenue",
        &labels,
        &values,
        size,
    )
}

/// Bar chart of the three funnel stage averages.
fn funnel_rates_chart(path: &Path, monthly: &[MonthlyKpi], size: ChartSize) -> Result<()> {
    let averages = kpi::funnel_averages(monthly);
    let labels: Vec<String> = ["Lead→Opp", "Opp→Win", "Lead→Win"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let values = [averages.lead_to_opp, averages.opp_to_win, averages.lead_to_win];

    draw_bar_chart(
        path,
        "Average Conversion Rates",
        "Stage",
        "Rate",
        &labels,
        &values,
        size,
    )
}

/// Scatter of average price against win rate, one labelled point per
/// product. Products with an undefined win rate are left out.
fn price_vs_win_chart(path: &Path, products: &[ProductPricing], size: ChartSize) -> Result<()> {
    let points: Vec<(&str, f64, f64)> = products
        .iter()
        .filter_map(|p| p.win_rate.map(|rate| (p.product.as_str(), p.avg_price, rate)))
        .collect();
    let prices: Vec<f64> = points.iter().map(|(_, price, _)| *price).collect();
    let rates: Vec<f64> = points.iter().map(|(_, _, rate)| *rate).collect();

    let root = BitMapBackend::new(path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Avg Price vs Win Rate (by Product)", ("sans-serif", 28))
        .margin(16)
        .x_label_area_size(48)
        .y_label_area_size(80)
        .build_cartesian_2d(axis_range(&prices), axis_range(&rates))?;

    chart
        .configure_mesh()
        .x_desc("Average Price")
        .y_desc("Win Rate")
        .draw()?;

    for (name, price, rate) in &points {
        chart.draw_series(std::iter::once(
            EmptyElement::at((*price, *rate))
                + Circle::new((0, 0), 5, BLUE.filled())
                + Text::new((*name).to_string(), (8, -10), ("sans-serif", 14)),
        ))?;
    }

    root.present()?;
    Ok(())
}

/// Bar chart of mean market share per competitor.
fn competitor_share_chart(
    path: &Path,
    observations: &[CompetitorRecord],
    size: ChartSize,
) -> Result<()> {
    let shares = kpi::competitor_share_means(observations);
    let labels: Vec<String> = shares.iter().map(|(name, _)| name.clone()).collect();
    let values: Vec<f64> = shares.iter().map(|(_, share)| *share).collect();

    draw_bar_chart(
        path,
        "Average Competitor Share",
        "Competitor",
        "Share",
        &labels,
        &values,
        size,
    )
}

/// Shared vertical bar chart: one bar per label, y starting at zero.
fn draw_bar_chart(
    path: &Path,
    caption: &str,
    x_desc: &str,
    y_desc: &str,
    labels: &[String],
    values: &[f64],
    size: ChartSize,
) -> Result<()> {
    let root = BitMapBackend::new(path, (size.width, size.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 28))
        .margin(16)
        .x_label_area_size(48)
        .y_label_area_size(80)
        .build_cartesian_2d(
            (0..labels.len().max(1)).into_segmented(),
            0f64..y_axis_max(values),
        )?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_labels(labels.len().max(2))
        .x_label_formatter(&|segment: &SegmentValue<usize>| match segment {
            SegmentValue::Exact(index) | SegmentValue::CenterOf(index) => {
                labels.get(*index).cloned().unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        })
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(index, value)| {
        let mut bar = Rectangle::new(
            [
                (SegmentValue::Exact(index), 0.0),
                (SegmentValue::Exact(index + 1), *value),
            ],
            BLUE.filled(),
        );
        bar.set_margin(0, 0, 12, 12);
        bar
    }))?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompetitorRecord, RawTable, ReportTables, SalesRecord};
    use std::fs;
    use tempfile::TempDir;

    fn sample_tables() -> ReportTables {
        let sales = vec![
            SalesRecord {
                month: "2024-01".to_string(),
                region: "North".to_string(),
                product: "Basic".to_string(),
                leads: 100,
                opportunities: 20,
                deals_won: 5,
                units_sold: 12,
                price: 199.0,
                marketing_spend: 4000.0,
            },
            SalesRecord {
                month: "2024-02".to_string(),
                region: "South".to_string(),
                product: "Pro".to_string(),
                leads: 80,
                opportunities: 16,
                deals_won: 4,
                units_sold: 9,
                price: 499.0,
                marketing_spend: 6000.0,
            },
        ];
        let competitors = vec![
            CompetitorRecord {
                region: "North".to_string(),
                product: "Basic".to_string(),
                competitor: "Acme".to_string(),
                price_index: 1.1,
                feature_rating: 3.5,
                market_share_estimate: 0.25,
            },
            CompetitorRecord {
                region: "South".to_string(),
                product: "Pro".to_string(),
                competitor: "Globex".to_string(),
                price_index: 0.9,
                feature_rating: 4.0,
                market_share_estimate: 0.4,
            },
        ];

        let monthly = kpi::monthly_kpis(&sales).unwrap();
        let regions = kpi::region_kpis(&sales);
        let products = kpi::product_pricing(&sales);
        let competitor_summary = kpi::competitor_summary(&competitors);

        ReportTables {
            sales,
            competitors,
            survey: RawTable::default(),
            monthly,
            regions,
            products,
            competitor_summary,
        }
    }

    fn empty_tables() -> ReportTables {
        ReportTables {
            sales: Vec::new(),
            competitors: Vec::new(),
            survey: RawTable::default(),
            monthly: Vec::new(),
            regions: Vec::new(),
            products: Vec::new(),
            competitor_summary: Vec::new(),
        }
    }

    fn month_row(month: &str, revenue: f64) -> MonthlyKpi {
        MonthlyKpi {
            month: NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").unwrap(),
            leads: 0,
            opportunities: 0,
            deals_won: 0,
            units_sold: 0,
            revenue,
            opp_rate: 0.0,
            win_rate: 0.0,
            lead_to_win: 0.0,
            rev_growth_pct: 0.0,
        }
    }

    #[test]
    fn test_chart_size_default() {
        let size = ChartSize::default();
        assert_eq!(size.width, 900);
        assert_eq!(size.height, 600);
    }

    #[test]
    fn test_chart_size_from_config() {
        let config = crate::config::ChartsConfig {
            width: 640,
            height: 480,
        };
        let size = ChartSize::from(&config);
        assert_eq!(size.width, 640);
        assert_eq!(size.height, 480);
    }

    #[test]
    fn test_y_axis_max_pads_positive_values() {
        assert_eq!(y_axis_max(&[100.0, 400.0]), 400.0 * 1.05);
    }

    #[test]
    fn test_y_axis_max_falls_back_for_zero_series() {
        assert_eq!(y_axis_max(&[]), 1.0);
        assert_eq!(y_axis_max(&[0.0, 0.0]), 1.0);
    }

    #[test]
    fn test_axis_range_empty_falls_back() {
        let range = axis_range(&[]);
        assert_eq!(range.start, 0.0);
        assert_eq!(range.end, 1.0);
    }

    #[test]
    fn test_axis_range_pads_single_point() {
        let range = axis_range(&[100.0]);
        assert!(range.start < 100.0);
        assert!(range.end > 100.0);
    }

    #[test]
    fn test_axis_range_spans_all_points() {
        let range = axis_range(&[10.0, 50.0, 30.0]);
        assert!(range.start < 10.0);
        assert!(range.end > 50.0);
    }

    #[test]
    fn test_month_axis_range_spans_first_to_last() {
        let monthly = vec![month_row("2024-01", 1000.0), month_row("2024-03", 1200.0)];

        let (first, last) = month_axis_range(&monthly);
        assert_eq!(Some(first), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(Some(last), NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_month_axis_range_widens_single_month() {
        let monthly = vec![month_row("2024-05", 1000.0)];

        let (first, last) = month_axis_range(&monthly);
        assert_eq!(Some(first), NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(Some(last), NaiveDate::from_ymd_opt(2024, 6, 1));
    }

    #[test]
    fn test_month_axis_range_empty_is_still_a_span() {
        let (first, last) = month_axis_range(&[]);
        assert!(first < last);
    }

    // Chart rendering needs a usable system font, so individual renders
    // may fail on minimal systems. render_charts absorbs that; the
    // assertions only cover files that were actually written.
    #[test]
    fn test_render_charts_writes_pngs() {
        let dir = TempDir::new().unwrap();
        let charts_dir = dir.path().join("charts");

        let rendered = render_charts(&charts_dir, &sample_tables(), ChartSize::default());
        assert!(rendered <= CHART_FILES.len());

        for name in CHART_FILES {
            let path = charts_dir.join(name);
            if path.exists() {
                let bytes = fs::read(&path).unwrap();
                assert!(bytes.len() > 8);
                assert_eq!(&bytes[1..4], b"PNG");
            }
        }
    }

    #[test]
    fn test_render_charts_creates_directory() {
        let dir = TempDir::new().unwrap();
        let charts_dir = dir.path().join("outputs").join("charts");

        render_charts(&charts_dir, &empty_tables(), ChartSize::default());
        assert!(charts_dir.is_dir());
    }

    #[test]
    fn test_render_charts_tolerates_empty_tables() {
        let dir = TempDir::new().unwrap();
        let rendered = render_charts(dir.path(), &empty_tables(), ChartSize::default());
        assert!(rendered <= CHART_FILES.len());
    }
}
