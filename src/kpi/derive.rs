//! Aggregation from raw rows to KPI tables.
//!
//! Grouping uses BTreeMap throughout so every table comes out in a
//! deterministic order: months chronological, everything else ascending
//! by its group key.
//!
//! Two distinct rules cover division by zero and they are not
//! interchangeable: funnel rate columns collapse non-finite results to
//! 0.0, while CAC, ACV, and the per-product win rate stay None so the
//! exporters can leave the cell blank or skip the point.

use crate::models::{
    CompetitorRecord, CompetitorSummary, FunnelAverages, MonthlyKpi, ProductPricing, RegionKpi,
    SalesRecord,
};
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Division with the zero-fill rule: a ratio that comes out non-finite
/// collapses to 0.0.
fn zero_filled(numerator: f64, denominator: f64) -> f64 {
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

/// Running sums for one group of sales rows.
#[derive(Debug, Default, Clone, Copy)]
struct SalesTotals {
    leads: u64,
    opportunities: u64,
    deals_won: u64,
    units_sold: u64,
    revenue: f64,
    marketing_spend: f64,
}

impl SalesTotals {
    fn add(&mut self, record: &SalesRecord) {
        self.leads += record.leads;
        self.opportunities += record.opportunities;
        self.deals_won += record.deals_won;
        self.units_sold += record.units_sold;
        self.revenue += record.revenue();
        self.marketing_spend += record.marketing_spend;
    }
}

/// Aggregates sales per calendar month, in chronological order, and
/// derives the funnel rates plus month-over-month revenue growth.
///
/// Growth is a fraction, not a percentage: 0.10 means revenue grew ten
/// percent versus the previous month. The first month is always 0.0.
pub fn monthly_kpis(sales: &[SalesRecord]) -> Result<Vec<MonthlyKpi>> {
    let mut groups: BTreeMap<NaiveDate, SalesTotals> = BTreeMap::new();
    for record in sales {
        let month = record
            .month_date()
            .ok_or_else(|| anyhow!("invalid month {:?}: expected YYYY-MM", record.month))?;
        groups.entry(month).or_default().add(record);
    }

    let mut rows = Vec::with_capacity(groups.len());
    let mut prev_revenue: Option<f64> = None;
    for (month, totals) in groups {
        let rev_growth_pct = match prev_revenue {
            Some(prev) => zero_filled(totals.revenue - prev, prev),
            None => 0.0,
        };
        prev_revenue = Some(totals.revenue);

        rows.push(MonthlyKpi {
            month,
            leads: totals.leads,
            opportunities: totals.opportunities,
            deals_won: totals.deals_won,
            units_sold: totals.units_sold,
            revenue: totals.revenue,
            opp_rate: zero_filled(totals.opportunities as f64, totals.leads as f64),
            win_rate: zero_filled(totals.deals_won as f64, totals.opportunities as f64),
            lead_to_win: zero_filled(totals.deals_won as f64, totals.leads as f64),
            rev_growth_pct,
        });
    }
    Ok(rows)
}

/// Aggregates sales per region, ascending by region name, with customer
/// acquisition cost and average contract value. Both are None for a
/// region that closed no deals.
pub fn region_kpis(sales: &[SalesRecord]) -> Vec<RegionKpi> {
    let mut groups: BTreeMap<String, SalesTotals> = BTreeMap::new();
    for record in sales {
        groups
            .entry(record.region.clone())
            .or_default()
            .add(record);
    }

    groups
        .into_iter()
        .map(|(region, totals)| {
            let (cac, acv) = if totals.deals_won == 0 {
                (None, None)
            } else {
                let deals = totals.deals_won as f64;
                (
                    Some(totals.marketing_spend / deals),
                    Some(totals.revenue / deals),
                )
            };
            RegionKpi {
                region,
                leads: totals.leads,
                opportunities: totals.opportunities,
                deals_won: totals.deals_won,
                units_sold: totals.units_sold,
                revenue: totals.revenue,
                marketing_spend: totals.marketing_spend,
                cac,
                acv,
            }
        })
        .collect()
}

/// Per-product mean unit price and aggregate win rate, ascending by
/// product name. The win rate is None for a product that never had an
/// opportunity.
pub fn product_pricing(sales: &[SalesRecord]) -> Vec<ProductPricing> {
    #[derive(Default)]
    struct ProductTotals {
        price_sum: f64,
        row_count: u64,
        opportunities: u64,
        deals_won: u64,
    }

    let mut groups: BTreeMap<String, ProductTotals> = BTreeMap::new();
    for record in sales {
        let entry = groups.entry(record.product.clone()).or_default();
        entry.price_sum += record.price;
        entry.row_count += 1;
        entry.opportunities += record.opportunities;
        entry.deals_won += record.deals_won;
    }

    groups
        .into_iter()
        .map(|(product, totals)| {
            // A group always holds at least one row.
            let avg_price = totals.price_sum / totals.row_count as f64;
            let win_rate = if totals.opportunities == 0 {
                None
            } else {
                Some(totals.deals_won as f64 / totals.opportunities as f64)
            };
            ProductPricing {
                product,
                avg_price,
                win_rate,
            }
        })
        .collect()
}

/// Mean competitor positioning per (region, product) pair, ascending by
/// region then product.
pub fn competitor_summary(observations: &[CompetitorRecord]) -> Vec<CompetitorSummary> {
    #[derive(Default)]
    struct PairSums {
        price_index: f64,
        feature_rating: f64,
        market_share: f64,
        count: u64,
    }

    let mut groups: BTreeMap<(String, String), PairSums> = BTreeMap::new();
    for obs in observations {
        let entry = groups
            .entry((obs.region.clone(), obs.product.clone()))
            .or_default();
        entry.price_index += obs.price_index;
        entry.feature_rating += obs.feature_rating;
        entry.market_share += obs.market_share_estimate;
        entry.count += 1;
    }

    groups
        .into_iter()
        .map(|((region, product), sums)| {
            let count = sums.count as f64;
            CompetitorSummary {
                region,
                product,
                avg_price_index: sums.price_index / count,
                avg_feature_rating: sums.feature_rating / count,
                avg_competitor_share: sums.market_share / count,
            }
        })
        .collect()
}

/// Mean estimated market share per competitor, ascending by name.
pub fn competitor_share_means(observations: &[CompetitorRecord]) -> Vec<(String, f64)> {
    let mut groups: BTreeMap<String, (f64, u64)> = BTreeMap::new();
    for obs in observations {
        let entry = groups.entry(obs.competitor.clone()).or_default();
        entry.0 += obs.market_share_estimate;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(competitor, (sum, count))| (competitor, sum / count as f64))
        .collect()
}

/// Mean of each monthly funnel rate across all months. All zeros when
/// there are no months.
pub fn funnel_averages(monthly: &[MonthlyKpi]) -> FunnelAverages {
    if monthly.is_empty() {
        return FunnelAverages::default();
    }

    let count = monthly.len() as f64;
    FunnelAverages {
        lead_to_opp: monthly.iter().map(|m| m.opp_rate).sum::<f64>() / count,
        opp_to_win: monthly.iter().map(|m| m.win_rate).sum::<f64>() / count,
        lead_to_win: monthly.iter().map(|m| m.lead_to_win).sum::<f64>() / count,
    }
}
