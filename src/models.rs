//! Data models for the report pipeline.
//!
//! This module contains the raw dataset records, the derived KPI row
//! types, and the bundle of tables handed to the exporters.

use chrono::NaiveDate;
use serde::Deserialize;

/// A single row of the sales dataset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SalesRecord {
    /// Calendar month in "YYYY-MM" form.
    pub month: String,
    /// Sales region name.
    pub region: String,
    /// Product name.
    pub product: String,
    /// Leads generated.
    pub leads: u64,
    /// Qualified opportunities.
    pub opportunities: u64,
    /// Deals closed won.
    pub deals_won: u64,
    /// Units sold.
    pub units_sold: u64,
    /// Unit price.
    pub price: f64,
    /// Marketing spend attributed to this row.
    pub marketing_spend: f64,
}

impl SalesRecord {
    /// Row revenue: units sold times unit price.
    pub fn revenue(&self) -> f64 {
        self.units_sold as f64 * self.price
    }

    /// Returns the month as the first day of the calendar month, or
    /// None when the value is not "YYYY-MM".
    pub fn month_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&format!("{}-01", self.month), "%Y-%m-%d").ok()
    }
}

/// A single competitor observation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompetitorRecord {
    /// Sales region name.
    pub region: String,
    /// Product the observation applies to.
    pub product: String,
    /// Competitor name.
    pub competitor: String,
    /// Competitor price relative to ours (1.0 is parity).
    pub price_index: f64,
    /// Feature completeness rating.
    pub feature_rating: f64,
    /// Estimated share of the market held by the competitor.
    pub market_share_estimate: f64,
}

/// An untyped table: header names plus rows of string cells.
///
/// Used for the survey dataset, which is carried into the workbook
/// without interpretation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column names from the header row.
    pub headers: Vec<String>,
    /// Data rows, each with one cell per column.
    pub rows: Vec<Vec<String>>,
}

/// Per-month aggregate KPIs, one row per calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyKpi {
    /// First day of the calendar month.
    pub month: NaiveDate,
    /// Total leads for the month.
    pub leads: u64,
    /// Total opportunities for the month.
    pub opportunities: u64,
    /// Total deals won for the month.
    pub deals_won: u64,
    /// Total units sold for the month.
    pub units_sold: u64,
    /// Total revenue for the month.
    pub revenue: f64,
    /// Opportunities per lead; 0.0 when the month has no leads.
    pub opp_rate: f64,
    /// Deals won per opportunity; 0.0 when the month has no opportunities.
    pub win_rate: f64,
    /// Deals won per lead; 0.0 when the month has no leads.
    pub lead_to_win: f64,
    /// Fractional revenue change versus the previous month; 0.0 for the
    /// first month and whenever the previous month had no revenue.
    pub rev_growth_pct: f64,
}

impl MonthlyKpi {
    /// Returns the month formatted back to "YYYY-MM" for sheet cells
    /// and chart labels.
    pub fn month_label(&self) -> String {
        self.month.format("%Y-%m").to_string()
    }
}

/// Per-region aggregate KPIs, one row per region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionKpi {
    /// Region name.
    pub region: String,
    /// Total leads for the region.
    pub leads: u64,
    /// Total opportunities for the region.
    pub opportunities: u64,
    /// Total deals won for the region.
    pub deals_won: u64,
    /// Total units sold for the region.
    pub units_sold: u64,
    /// Total revenue for the region.
    pub revenue: f64,
    /// Total marketing spend for the region.
    pub marketing_spend: f64,
    /// Customer acquisition cost: spend per deal won. None when the
    /// region closed no deals.
    pub cac: Option<f64>,
    /// Average contract value: revenue per deal won. None when the
    /// region closed no deals.
    pub acv: Option<f64>,
}

/// Per-product pricing versus win-rate view.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPricing {
    /// Product name.
    pub product: String,
    /// Mean unit price across the product's sales rows.
    pub avg_price: f64,
    /// Deals won per opportunity across all of the product's rows.
    /// None when the product had no opportunities.
    pub win_rate: Option<f64>,
}

/// Mean competitor positioning for one (region, product) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitorSummary {
    /// Region name.
    pub region: String,
    /// Product name.
    pub product: String,
    /// Mean competitor price index.
    pub avg_price_index: f64,
    /// Mean competitor feature rating.
    pub avg_feature_rating: f64,
    /// Mean estimated competitor market share.
    pub avg_competitor_share: f64,
}

/// Mean funnel conversion rates across all months.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FunnelAverages {
    /// Mean monthly lead-to-opportunity rate.
    pub lead_to_opp: f64,
    /// Mean monthly opportunity-to-win rate.
    pub opp_to_win: f64,
    /// Mean monthly lead-to-win rate.
    pub lead_to_win: f64,
}

/// Everything the exporters need: the loaded datasets plus the derived
/// KPI tables.
#[derive(Debug, Clone)]
pub struct ReportTables {
    /// Sales rows as loaded.
    pub sales: Vec<SalesRecord>,
    /// Competitor rows as loaded.
    pub competitors: Vec<CompetitorRecord>,
    /// Survey table as loaded.
    pub survey: RawTable,
    /// Monthly KPI rows, chronological.
    pub monthly: Vec<MonthlyKpi>,
    /// Regional KPI rows, ordered by region name.
    pub regions: Vec<RegionKpi>,
    /// Product pricing rows, ordered by product name.
    pub products: Vec<ProductPricing>,
    /// Competitor summary rows, ordered by (region, product).
    pub competitor_summary: Vec<CompetitorSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> SalesRecord {
        SalesRecord {
            month: "2024-03".to_string(),
            region: "North".to_string(),
            product: "Basic".to_string(),
            leads: 120,
            opportunities: 30,
            deals_won: 9,
            units_sold: 40,
            price: 199.5,
            marketing_spend: 5000.0,
        }
    }

    #[test]
    fn test_revenue_is_units_times_price() {
        let record = sample_record();
        assert_eq!(record.revenue(), 40.0 * 199.5);
    }

    #[test]
    fn test_month_date_parses_valid_month() {
        let record = sample_record();
        assert_eq!(record.month_date(), NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_month_date_rejects_invalid_month() {
        let mut record = sample_record();

        record.month = "2024-13".to_string();
        assert!(record.month_date().is_none());

        record.month = "March 2024".to_string();
        assert!(record.month_date().is_none());

        record.month = "2024-03-15".to_string();
        assert!(record.month_date().is_none());
    }

    #[test]
    fn test_month_label_formats_back_to_year_month() {
        let kpi = MonthlyKpi {
            month: NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
            leads: 0,
            opportunities: 0,
            deals_won: 0,
            units_sold: 0,
            revenue: 0.0,
            opp_rate: 0.0,
            win_rate: 0.0,
            lead_to_win: 0.0,
            rev_growth_pct: 0.0,
        };
        assert_eq!(kpi.month_label(), "2024-11");
    }

    #[test]
    fn test_raw_table_default_is_empty() {
        let table = RawTable::default();
        assert!(table.headers.is_empty());
        assert!(table.rows.is_empty());
    }
}
