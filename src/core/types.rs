use serde::{Deserialize, Serialize};

use super::error::{InputError, non_negative, positive};

/// Scalar inputs of the three-bucket withdrawal strategy. Rates are percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketInputs {
    pub monthly_requirement: f64,
    pub inflation_pct: f64,
    pub tier1_duration_months: u32,
    pub tier1_return_pct: f64,
    pub tier2_duration_months: u32,
    pub tier2_return_pct: f64,
    pub tier3a_principal: f64,
    pub tier3a_dividend_yield_pct: f64,
    pub tier3b_principal: f64,
    pub tier3_return_pct: f64,
}

impl Default for BucketInputs {
    fn default() -> Self {
        Self {
            monthly_requirement: 50_000.0,
            inflation_pct: 6.0,
            tier1_duration_months: 16,
            tier1_return_pct: 6.0,
            tier2_duration_months: 24,
            tier2_return_pct: 8.0,
            tier3a_principal: 5_000_000.0,
            tier3a_dividend_yield_pct: 2.0,
            tier3b_principal: 3_000_000.0,
            tier3_return_pct: 12.0,
        }
    }
}

impl BucketInputs {
    pub fn validate(&self) -> Result<(), InputError> {
        positive("monthlyRequirement", self.monthly_requirement)?;
        non_negative("inflationPct", self.inflation_pct)?;
        non_negative("tier1ReturnPct", self.tier1_return_pct)?;
        non_negative("tier2ReturnPct", self.tier2_return_pct)?;
        non_negative("tier3aPrincipal", self.tier3a_principal)?;
        non_negative("tier3aDividendYieldPct", self.tier3a_dividend_yield_pct)?;
        non_negative("tier3bPrincipal", self.tier3b_principal)?;
        non_negative("tier3ReturnPct", self.tier3_return_pct)?;

        if self.tier1_duration_months == 0 {
            return Err(InputError::OutOfRange {
                field: "tier1DurationMonths",
                bound: ">= 1",
                value: 0.0,
            });
        }
        if self.tier2_duration_months < self.tier1_duration_months {
            return Err(InputError::Ordering {
                field: "tier2DurationMonths",
                other: "tier1DurationMonths",
                value: self.tier2_duration_months as f64,
                other_value: self.tier1_duration_months as f64,
            });
        }
        Ok(())
    }
}

/// One simulated month. Balances are end-of-month and never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRecord {
    pub month: u32,
    pub requirement: f64,
    pub dividend: f64,
    pub tier1: f64,
    pub tier2: f64,
    pub tier3a: f64,
    pub tier3b: f64,
    pub tier2_return: f64,
    pub tier2_return_pct: f64,
    pub tier3_return: f64,
    pub tier3_return_pct: f64,
    pub tier1_refilled: bool,
    pub tier2_refilled: bool,
    pub tier2_refill_skipped: bool,
}

impl MonthRecord {
    pub fn total_corpus(&self) -> f64 {
        self.tier1 + self.tier2 + self.tier3a + self.tier3b
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExhaustionCause {
    Tier1RefillFailed,
    AllTiersDepleted,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Termination {
    HorizonReached,
    Exhausted { month: u32, cause: ExhaustionCause },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketResult {
    pub months: Vec<MonthRecord>,
    pub termination: Termination,
    /// `None` when the corpus survived the whole horizon cap.
    pub years_lasted: Option<u32>,
    pub initial_corpus: f64,
    pub final_corpus: f64,
    pub total_dividends: f64,
}

impl BucketResult {
    pub fn is_exhausted(&self) -> bool {
        matches!(self.termination, Termination::Exhausted { .. })
    }

    pub fn months_lasted(&self) -> u32 {
        match self.termination {
            Termination::Exhausted { month, .. } => month,
            Termination::HorizonReached => self.months.len() as u32,
        }
    }
}

/// Annual escalation of a recurring monthly contribution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum StepUp {
    #[default]
    None,
    /// Compounding percentage raise each year.
    Percent(f64),
    /// Flat amount added to the monthly contribution each year.
    Flat(f64),
}

impl StepUp {
    pub fn contribution(self, base: f64, year_index: u32) -> f64 {
        match self {
            StepUp::None => base,
            StepUp::Percent(pct) => base * (1.0 + pct / 100.0).powi(year_index as i32),
            StepUp::Flat(amount) => base + amount * year_index as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ReturnSchedule {
    /// Constant monthly rate equivalent to the annual percentage.
    Fixed { annual_pct: f64 },
    /// Synthetic cycle compounding to the annual percentage.
    Variable { annual_pct: f64 },
}

impl ReturnSchedule {
    pub fn annual_pct(self) -> f64 {
        match self {
            ReturnSchedule::Fixed { annual_pct } | ReturnSchedule::Variable { annual_pct } => {
                annual_pct
            }
        }
    }
}

/// One-time deposit at the start of month index `month`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lumpsum {
    pub amount: f64,
    pub month: u32,
}

/// Withdrawal paid after the growth of 0-based month index `month`, priced in
/// today's money and inflated over `month / 12` years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledWithdrawal {
    pub label: String,
    pub present_value: f64,
    pub inflation_pct: f64,
    pub month: u32,
}

impl ScheduledWithdrawal {
    pub fn inflated_amount(&self) -> f64 {
        let years = self.month as f64 / 12.0;
        self.present_value * (1.0 + self.inflation_pct / 100.0).powf(years)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInputs {
    pub initial_principal: f64,
    pub monthly_contribution: f64,
    pub step_up: StepUp,
    pub returns: ReturnSchedule,
    pub contribution_months: u32,
    pub total_months: u32,
    pub lumpsums: Vec<Lumpsum>,
    pub withdrawals: Vec<ScheduledWithdrawal>,
}

impl ProjectionInputs {
    pub fn validate(&self) -> Result<(), InputError> {
        non_negative("initialPrincipal", self.initial_principal)?;
        non_negative("monthlyContribution", self.monthly_contribution)?;
        match self.step_up {
            StepUp::None => {}
            StepUp::Percent(pct) => {
                non_negative("stepUpPct", pct)?;
            }
            StepUp::Flat(amount) => {
                non_negative("stepUpAmount", amount)?;
            }
        }
        non_negative("annualReturnPct", self.returns.annual_pct())?;
        for lumpsum in &self.lumpsums {
            non_negative("lumpsumAmount", lumpsum.amount)?;
        }
        for withdrawal in &self.withdrawals {
            non_negative("withdrawalPresentValue", withdrawal.present_value)?;
            non_negative("withdrawalInflationPct", withdrawal.inflation_pct)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalEvent {
    pub label: String,
    pub month: u32,
    pub requested: f64,
    pub paid: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRow {
    pub year: u32,
    pub start_balance: f64,
    pub contributions: f64,
    pub growth: f64,
    pub withdrawals: f64,
    pub end_balance: f64,
    pub cumulative_principal: f64,
    pub events: Vec<WithdrawalEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionTotals {
    pub contributions: f64,
    pub lumpsums: f64,
    pub growth: f64,
    pub withdrawals: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub years: Vec<YearRow>,
    pub final_balance: f64,
    pub totals: ProjectionTotals,
    pub total_months: u32,
}
