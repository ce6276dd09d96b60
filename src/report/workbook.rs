//! Multi-sheet workbook export.
//!
//! Writes the seven report sheets into a single .xlsx file: the three
//! datasets as loaded (sales with the derived revenue column appended),
//! then the four KPI tables. Header rows are bold and every sheet is
//! autofitted. A blank cell stands for an undefined ratio.

use crate::models::{
    CompetitorRecord, CompetitorSummary, MonthlyKpi, ProductPricing, RawTable, RegionKpi,
    ReportTables, SalesRecord,
};
use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;
use tracing::debug;

/// Sheet names in workbook order.
pub const SHEET_NAMES: [&str; 7] = [
    "raw_sales",
    "competitors",
    "survey",
    "kpi_by_month",
    "kpi_by_region",
    "price_vs_win",
    "competitor_summary",
];

/// Writes the complete report workbook to `path`.
pub fn write_workbook(path: &Path, tables: &ReportTables) -> Result<()> {
    let mut workbook = build_workbook(tables)?;

    workbook
        .save(path)
        .with_context(|| format!("failed to save workbook to {}", path.display()))?;

    debug!("Wrote workbook to {}", path.display());
    Ok(())
}

/// Builds the in-memory workbook, one sheet per `SHEET_NAMES` entry in
/// that order.
fn build_workbook(tables: &ReportTables) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    write_raw_sales(add_sheet(&mut workbook, SHEET_NAMES[0])?, &header, &tables.sales)?;
    write_competitors(
        add_sheet(&mut workbook, SHEET_NAMES[1])?,
        &header,
        &tables.competitors,
    )?;
    write_survey(add_sheet(&mut workbook, SHEET_NAMES[2])?, &header, &tables.survey)?;
    write_monthly(
        add_sheet(&mut workbook, SHEET_NAMES[3])?,
        &header,
        &tables.monthly,
    )?;
    write_regions(
        add_sheet(&mut workbook, SHEET_NAMES[4])?,
        &header,
        &tables.regions,
    )?;
    write_products(
        add_sheet(&mut workbook, SHEET_NAMES[5])?,
        &header,
        &tables.products,
    )?;
    write_competitor_summary(
        add_sheet(&mut workbook, SHEET_NAMES[6])?,
        &header,
        &tables.competitor_summary,
    )?;

    Ok(workbook)
}

fn add_sheet<'a>(workbook: &'a mut Workbook, name: &str) -> Result<&'a mut Worksheet> {
    workbook
        .add_worksheet()
        .set_name(name)
        .with_context(|| format!("failed to name sheet {name:?}"))
}

fn write_header_row(worksheet: &mut Worksheet, format: &Format, titles: &[&str]) -> Result<()> {
    for (col, title) in titles.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, format)?;
    }
    Ok(())
}

fn write_raw_sales(
    worksheet: &mut Worksheet,
    header: &Format,
    sales: &[SalesRecord],
) -> Result<()> {
    write_header_row(
        worksheet,
        header,
        &[
            "month",
            "region",
            "product",
            "leads",
            "opportunities",
            "deals_won",
            "units_sold",
            "price",
            "marketing_spend",
            "revenue",
        ],
    )?;

    for (i, record) in sales.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, &record.month)?;
        worksheet.write_string(row, 1, &record.region)?;
        worksheet.write_string(row, 2, &record.product)?;
        worksheet.write_number(row, 3, record.leads as f64)?;
        worksheet.write_number(row, 4, record.opportunities as f64)?;
        worksheet.write_number(row, 5, record.deals_won as f64)?;
        worksheet.write_number(row, 6, record.units_sold as f64)?;
        worksheet.write_number(row, 7, record.price)?;
        worksheet.write_number(row, 8, record.marketing_spend)?;
        worksheet.write_number(row, 9, record.revenue())?;
    }

    worksheet.autofit();
    Ok(())
}

fn write_competitors(
    worksheet: &mut Worksheet,
    header: &Format,
    competitors: &[CompetitorRecord],
) -> Result<()> {
    write_header_row(
        worksheet,
        header,
        &[
            "region",
            "product",
            "competitor",
            "price_index",
            "feature_rating",
            "market_share_estimate",
        ],
    )?;

    for (i, record) in competitors.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, &record.region)?;
        worksheet.write_string(row, 1, &record.product)?;
        worksheet.write_string(row, 2, &record.competitor)?;
        worksheet.write_number(row, 3, record.price_index)?;
        worksheet.write_number(row, 4, record.feature_rating)?;
        worksheet.write_number(row, 5, record.market_share_estimate)?;
    }

    worksheet.autofit();
    Ok(())
}

fn write_survey(worksheet: &mut Worksheet, header: &Format, survey: &RawTable) -> Result<()> {
    for (col, title) in survey.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, title.as_str(), header)?;
    }

    for (i, row) in survey.rows.iter().enumerate() {
        let excel_row = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            // Numeric-looking cells stay numbers in the passthrough.
            match cell.parse::<f64>() {
                Ok(value) if value.is_finite() => {
                    worksheet.write_number(excel_row, col as u16, value)?;
                }
                _ => {
                    worksheet.write_string(excel_row, col as u16, cell.as_str())?;
                }
            }
        }
    }

    worksheet.autofit();
    Ok(())
}

fn write_monthly(
    worksheet: &mut Worksheet,
    header: &Format,
    monthly: &[MonthlyKpi],
) -> Result<()> {
    write_header_row(
        worksheet,
        header,
        &[
            "month",
            "leads",
            "opportunities",
            "deals_won",
            "units_sold",
            "revenue",
            "opp_rate",
            "win_rate",
            "lead_to_win",
            "rev_growth_pct",
        ],
    )?;

    for (i, kpi) in monthly.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, kpi.month_label())?;
        worksheet.write_number(row, 1, kpi.leads as f64)?;
        worksheet.write_number(row, 2, kpi.opportunities as f64)?;
        worksheet.write_number(row, 3, kpi.deals_won as f64)?;
        worksheet.write_number(row, 4, kpi.units_sold as f64)?;
        worksheet.write_number(row, 5, kpi.revenue)?;
        worksheet.write_number(row, 6, kpi.opp_rate)?;
        worksheet.write_number(row, 7, kpi.win_rate)?;
        worksheet.write_number(row, 8, kpi.lead_to_win)?;
        worksheet.write_number(row, 9, kpi.rev_growth_pct)?;
    }

    worksheet.autofit();
    Ok(())
}

fn write_regions(worksheet: &mut Worksheet, header: &Format, regions: &[RegionKpi]) -> Result<()> {
    write_header_row(
        worksheet,
        header,
        &[
            "region",
            "leads",
            "opportunities",
            "deals_won",
            "units_sold",
            "revenue",
            "marketing_spend",
            "CAC",
            "ACV",
        ],
    )?;

    for (i, kpi) in regions.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, &kpi.region)?;
        worksheet.write_number(row, 1, kpi.leads as f64)?;
        worksheet.write_number(row, 2, kpi.opportunities as f64)?;
        worksheet.write_number(row, 3, kpi.deals_won as f64)?;
        worksheet.write_number(row, 4, kpi.units_sold as f64)?;
        worksheet.write_number(row, 5, kpi.revenue)?;
        worksheet.write_number(row, 6, kpi.marketing_spend)?;
        if let Some(cac) = kpi.cac {
            worksheet.write_number(row, 7, cac)?;
        }
        if let Some(acv) = kpi.acv {
            worksheet.write_number(row, 8, acv)?;
        }
    }

    worksheet.autofit();
    Ok(())
}

fn write_products(
    worksheet: &mut Worksheet,
    header: &Format,
    products: &[ProductPricing],
) -> Result<()> {
    write_header_row(worksheet, header, &["product", "avg_price", "win_rate"])?;

    for (i, product) in products.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, &product.product)?;
        worksheet.write_number(row, 1, product.avg_price)?;
        if let Some(win_rate) = product.win_rate {
            worksheet.write_number(row, 2, win_rate)?;
        }
    }

    worksheet.autofit();
    Ok(())
}

fn write_competitor_summary(
    worksheet: &mut Worksheet,
    header: &Format,
    summary: &[CompetitorSummary],
) -> Result<()> {
    write_header_row(
        worksheet,
        header,
        &[
            "region",
            "product",
            "avg_price_index",
            "avg_feature_rating",
            "avg_competitor_share",
        ],
    )?;

    for (i, pair) in summary.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, &pair.region)?;
        worksheet.write_string(row, 1, &pair.product)?;
        worksheet.write_number(row, 2, pair.avg_price_index)?;
        worksheet.write_number(row, 3, pair.avg_feature_rating)?;
        worksheet.write_number(row, 4, pair.avg_competitor_share)?;
    }

    worksheet.autofit();
    Ok(())
}
