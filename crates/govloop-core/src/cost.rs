//! Closed-loop cost/benefit evaluator
//!
//! Turns a stream of realized `(CycleCost, CycleBenefit)` pairs into running
//! ROI, marginal ROI, trend, and confidence signals. Forecasts never enter
//! the ledger: every number is computed from already-measured cycles.
//!
//! # State
//!
//! `CostEvaluator` owns three parallel append-only vectors (costs, benefits,
//! snapshots). Index `i` of each refers to the same cycle. Nothing is ever
//! removed or rewritten; `history()` is a plain slice.
//!
//! # Arithmetic guards
//!
//! Division by a zero cost yields `0.0` for both ROI and marginal ROI. Inputs
//! are not validated; rejecting negative costs is the caller's job.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::hasher::{self, SemanticHash};

// ── Constants ─────────────────────────────────────────────

pub const INSIGHT_WEIGHT: f64 = 10.0;
pub const PROBLEM_WEIGHT: f64 = 50.0;
pub const ASSUMPTION_WEIGHT: f64 = 20.0;
pub const EFFICIENCY_WEIGHT: f64 = 100.0;
pub const ERROR_REDUCTION_WEIGHT: f64 = 200.0;

/// Most recent snapshots considered for the trend
pub const TREND_WINDOW: usize = 3;
/// Mean marginal-ROI change separating stable from improving/declining
pub const TREND_THRESHOLD: f64 = 0.05;

const CONFIDENCE_BASE: f64 = 0.5;
const CONFIDENCE_STEP: f64 = 0.1;
const CONFIDENCE_CAP: f64 = 0.99;

// ── Inputs ────────────────────────────────────────────────

/// Realized cost of one loop iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleCost {
    pub cycle_id: String,
    #[serde(default)]
    pub compute_cost: f64,
    #[serde(default)]
    pub time_cost_seconds: f64,
    #[serde(default)]
    pub human_effort_hours: f64,
    #[serde(default)]
    pub opportunity_cost: f64,
}

impl CycleCost {
    pub fn new(cycle_id: impl Into<String>) -> Self {
        CycleCost {
            cycle_id: cycle_id.into(),
            compute_cost: 0.0,
            time_cost_seconds: 0.0,
            human_effort_hours: 0.0,
            opportunity_cost: 0.0,
        }
    }

    pub fn with_compute_cost(mut self, value: f64) -> Self {
        self.compute_cost = value;
        self
    }

    pub fn with_time_cost_seconds(mut self, value: f64) -> Self {
        self.time_cost_seconds = value;
        self
    }

    pub fn with_human_effort_hours(mut self, value: f64) -> Self {
        self.human_effort_hours = value;
        self
    }

    pub fn with_opportunity_cost(mut self, value: f64) -> Self {
        self.opportunity_cost = value;
        self
    }

    /// `compute_cost + opportunity_cost`
    ///
    /// Time and human effort are tracked for reporting but are not part of
    /// the total.
    pub fn total(&self) -> f64 {
        self.compute_cost + self.opportunity_cost
    }
}

/// Realized benefit of one loop iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleBenefit {
    pub cycle_id: String,
    #[serde(default)]
    pub insights_documented: u32,
    #[serde(default)]
    pub problems_resolved: u32,
    #[serde(default)]
    pub assumptions_eliminated: u32,
    #[serde(default)]
    pub efficiency_gain_measured: f64,
    #[serde(default)]
    pub error_rate_reduction: f64,
}

impl CycleBenefit {
    pub fn new(cycle_id: impl Into<String>) -> Self {
        CycleBenefit {
            cycle_id: cycle_id.into(),
            insights_documented: 0,
            problems_resolved: 0,
            assumptions_eliminated: 0,
            efficiency_gain_measured: 0.0,
            error_rate_reduction: 0.0,
        }
    }

    pub fn with_insights_documented(mut self, value: u32) -> Self {
        self.insights_documented = value;
        self
    }

    pub fn with_problems_resolved(mut self, value: u32) -> Self {
        self.problems_resolved = value;
        self
    }

    pub fn with_assumptions_eliminated(mut self, value: u32) -> Self {
        self.assumptions_eliminated = value;
        self
    }

    pub fn with_efficiency_gain_measured(mut self, value: f64) -> Self {
        self.efficiency_gain_measured = value;
        self
    }

    pub fn with_error_rate_reduction(mut self, value: f64) -> Self {
        self.error_rate_reduction = value;
        self
    }

    /// Weighted sum of the measured outcomes
    pub fn benefit_score(&self) -> f64 {
        f64::from(self.insights_documented) * INSIGHT_WEIGHT
            + f64::from(self.problems_resolved) * PROBLEM_WEIGHT
            + f64::from(self.assumptions_eliminated) * ASSUMPTION_WEIGHT
            + self.efficiency_gain_measured * EFFICIENCY_WEIGHT
            + self.error_rate_reduction * ERROR_REDUCTION_WEIGHT
    }
}

/// One cost/benefit pair as read from an input file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub cost: CycleCost,
    pub benefit: CycleBenefit,
}

// ── Outputs ───────────────────────────────────────────────

/// Direction of marginal ROI over the recent window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
    InsufficientData,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Declining => "declining",
            Trend::InsufficientData => "insufficient_data",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advice derived from `(roi, trend)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongContinue,
    Continue,
    ContinueWithCaution,
    ConsiderStopping,
    Monitor,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::StrongContinue => "STRONG_CONTINUE",
            Recommendation::Continue => "CONTINUE",
            Recommendation::ContinueWithCaution => "CONTINUE_WITH_CAUTION",
            Recommendation::ConsiderStopping => "CONSIDER_STOPPING",
            Recommendation::Monitor => "MONITOR",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable evaluation result for one recorded cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBenefitSnapshot {
    pub cycle_id: String,
    pub cumulative_cost: f64,
    pub cumulative_benefit_score: f64,
    pub roi: f64,
    pub marginal_roi: f64,
    pub trend: Trend,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl CostBenefitSnapshot {
    /// Plain mapping with the snapshot's field names
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::json!({
            "cycle_id": self.cycle_id,
            "cumulative_cost": self.cumulative_cost,
            "cumulative_benefit_score": self.cumulative_benefit_score,
            "roi": self.roi,
            "marginal_roi": self.marginal_roi,
            "trend": self.trend.as_str(),
            "confidence": self.confidence,
            "timestamp": self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        })
    }

    /// Structural hash of the snapshot with `timestamp` excluded
    ///
    /// Two evaluators fed the same cycles produce the same evidence hashes
    /// regardless of when they ran.
    pub fn evidence_hash(&self) -> SemanticHash {
        hasher::hash_value(&self.to_dict(), &["timestamp"])
    }

    pub fn recommendation(&self) -> Recommendation {
        recommend(self.roi, self.trend)
    }
}

/// Latest-state report returned by [`CostEvaluator::summary`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum Summary {
    #[serde(rename = "no_data")]
    NoData { cycles: usize },
    #[serde(rename = "POSITIVE")]
    Positive(SummaryReport),
    #[serde(rename = "NEGATIVE")]
    Negative(SummaryReport),
}

impl Summary {
    pub fn status(&self) -> &'static str {
        match self {
            Summary::NoData { .. } => "no_data",
            Summary::Positive(_) => "POSITIVE",
            Summary::Negative(_) => "NEGATIVE",
        }
    }

    pub fn report(&self) -> Option<&SummaryReport> {
        match self {
            Summary::NoData { .. } => None,
            Summary::Positive(r) | Summary::Negative(r) => Some(r),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub cycles: usize,
    pub cumulative_cost: f64,
    pub cumulative_benefit: f64,
    pub roi: f64,
    pub marginal_roi: f64,
    pub trend: Trend,
    pub confidence: f64,
    pub recommendation: Recommendation,
    pub timestamp: DateTime<Utc>,
}

// ── Decision table ────────────────────────────────────────

/// Map `(roi, trend)` to a recommendation
pub fn recommend(roi: f64, trend: Trend) -> Recommendation {
    if roi > 0.5 && trend == Trend::Improving {
        Recommendation::StrongContinue
    } else if roi > 0.0 && trend != Trend::Declining {
        Recommendation::Continue
    } else if roi > 0.0 {
        Recommendation::ContinueWithCaution
    } else if trend == Trend::Declining {
        Recommendation::ConsiderStopping
    } else {
        Recommendation::Monitor
    }
}

/// `(benefit - cost) / cost`, or `0.0` when `cost` is not positive
fn guarded_roi(benefit: f64, cost: f64) -> f64 {
    if cost > 0.0 {
        (benefit - cost) / cost
    } else {
        0.0
    }
}

/// `min(0.99, 0.5 + 0.1 * cycles)`
pub fn confidence_for(cycles: usize) -> f64 {
    (CONFIDENCE_BASE + CONFIDENCE_STEP * cycles as f64).min(CONFIDENCE_CAP)
}

/// Classify the mean consecutive change of `marginal_rois`
pub fn classify_trend(marginal_rois: &[f64]) -> Trend {
    if marginal_rois.len() < 2 {
        return Trend::InsufficientData;
    }
    let diffs: Vec<f64> = marginal_rois.windows(2).map(|w| w[1] - w[0]).collect();
    let mean = diffs.iter().sum::<f64>() / diffs.len() as f64;
    if mean > TREND_THRESHOLD {
        Trend::Improving
    } else if mean < -TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

// ── Evaluator ─────────────────────────────────────────────

/// Append-only cost/benefit ledger for one governance loop run
///
/// Not internally synchronized: concurrent writers must serialize calls to
/// [`CostEvaluator::record_cycle`] themselves.
#[derive(Debug, Clone, Default)]
pub struct CostEvaluator {
    costs: Vec<CycleCost>,
    benefits: Vec<CycleBenefit>,
    snapshots: Vec<CostBenefitSnapshot>,
}

impl CostEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cycle stamped with the current time
    pub fn record_cycle(&mut self, cost: CycleCost, benefit: CycleBenefit) -> CostBenefitSnapshot {
        self.record_cycle_at(cost, benefit, Utc::now())
    }

    /// Record a cycle with an explicit timestamp
    pub fn record_cycle_at(
        &mut self,
        cost: CycleCost,
        benefit: CycleBenefit,
        timestamp: DateTime<Utc>,
    ) -> CostBenefitSnapshot {
        if cost.cycle_id != benefit.cycle_id {
            warn!(
                cost_cycle = %cost.cycle_id,
                benefit_cycle = %benefit.cycle_id,
                "Cost and benefit cycle ids differ"
            );
        }

        let cycle_cost = cost.total();
        let cycle_benefit = benefit.benefit_score();
        let cycle_id = cost.cycle_id.clone();

        // ── Step 1: append inputs ──────────────────────────
        self.costs.push(cost);
        self.benefits.push(benefit);

        // ── Step 2: cumulative totals ──────────────────────
        let cumulative_cost: f64 = self.costs.iter().map(CycleCost::total).sum();
        let cumulative_benefit: f64 = self.benefits.iter().map(CycleBenefit::benefit_score).sum();

        // ── Steps 3-4: ROI ─────────────────────────────────
        let roi = guarded_roi(cumulative_benefit, cumulative_cost);
        let marginal_roi = guarded_roi(cycle_benefit, cycle_cost);

        // ── Step 5: trend over prior snapshots only ────────
        let trend = self.prior_trend();

        // ── Step 6: confidence ─────────────────────────────
        let confidence = confidence_for(self.costs.len());

        // ── Step 7: snapshot ───────────────────────────────
        let snapshot = CostBenefitSnapshot {
            cycle_id,
            cumulative_cost,
            cumulative_benefit_score: cumulative_benefit,
            roi,
            marginal_roi,
            trend,
            confidence,
            timestamp,
        };
        self.snapshots.push(snapshot.clone());

        info!(
            cycle_id = %snapshot.cycle_id,
            roi = snapshot.roi,
            marginal_roi = snapshot.marginal_roi,
            trend = %snapshot.trend,
            "Recorded cycle"
        );
        snapshot
    }

    /// Convenience for records read from input files
    pub fn record(&mut self, record: CycleRecord) -> CostBenefitSnapshot {
        self.record_cycle(record.cost, record.benefit)
    }

    fn prior_trend(&self) -> Trend {
        let start = self.snapshots.len().saturating_sub(TREND_WINDOW);
        let window: Vec<f64> = self.snapshots[start..]
            .iter()
            .map(|s| s.marginal_roi)
            .collect();
        let trend = classify_trend(&window);
        debug!(window = ?window, %trend, "Computed trend");
        trend
    }

    /// Latest-state report; `NoData` before the first cycle
    pub fn summary(&self) -> Summary {
        let Some(latest) = self.snapshots.last() else {
            return Summary::NoData { cycles: 0 };
        };
        let report = SummaryReport {
            cycles: self.snapshots.len(),
            cumulative_cost: latest.cumulative_cost,
            cumulative_benefit: latest.cumulative_benefit_score,
            roi: latest.roi,
            marginal_roi: latest.marginal_roi,
            trend: latest.trend,
            confidence: latest.confidence,
            recommendation: latest.recommendation(),
            timestamp: latest.timestamp,
        };
        if latest.roi > 0.0 {
            Summary::Positive(report)
        } else {
            Summary::Negative(report)
        }
    }

    /// Snapshots in recording order, oldest first
    pub fn history(&self) -> &[CostBenefitSnapshot] {
        &self.snapshots
    }

    /// History as a JSON array of plain mappings for evidence export
    pub fn history_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.snapshots.iter().map(CostBenefitSnapshot::to_dict).collect())
    }

    pub fn latest(&self) -> Option<&CostBenefitSnapshot> {
        self.snapshots.last()
    }

    pub fn costs(&self) -> &[CycleCost] {
        &self.costs
    }

    pub fn benefits(&self) -> &[CycleBenefit] {
        &self.benefits
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
