use serde::{Deserialize, Serialize};

use super::error::{InputError, non_negative};
use super::projection::{MonthlyProjector, project};
use super::types::{
    Lumpsum, ProjectionInputs, ProjectionResult, ReturnSchedule, ScheduledWithdrawal, StepUp,
    YearRow,
};

/// Corpus needed for FIRE, in years of the current annualized expense.
pub const FIRE_EXPENSE_MULTIPLE: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearLumpsum {
    pub amount: f64,
    /// Deposited at the start of this year (0 = today).
    pub year: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SipInputs {
    pub initial_investment: f64,
    pub monthly_sip: f64,
    pub step_up_pct: f64,
    pub expected_return_pct: f64,
    pub sip_years: u32,
    pub invest_years: u32,
    pub lumpsums: Vec<YearLumpsum>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipYearPoint {
    pub year: u32,
    pub principal: f64,
    pub value: f64,
    pub gains: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipSummary {
    pub total_principal: f64,
    pub final_value: f64,
    pub total_gains: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipResult {
    pub points: Vec<SipYearPoint>,
    pub years: Vec<YearRow>,
    pub summary: SipSummary,
}

pub fn sip_growth(inputs: &SipInputs) -> Result<SipResult, InputError> {
    non_negative("expectedReturnPct", inputs.expected_return_pct)?;
    let sip_years = inputs.sip_years.min(inputs.invest_years);

    let projection_inputs = ProjectionInputs {
        initial_principal: inputs.initial_investment,
        monthly_contribution: inputs.monthly_sip,
        step_up: StepUp::Percent(inputs.step_up_pct),
        returns: ReturnSchedule::Fixed {
            annual_pct: inputs.expected_return_pct,
        },
        contribution_months: sip_years * 12,
        total_months: inputs.invest_years * 12,
        lumpsums: inputs
            .lumpsums
            .iter()
            .filter(|l| l.year <= inputs.invest_years)
            .map(|l| Lumpsum {
                amount: l.amount,
                month: l.year * 12,
            })
            .collect(),
        withdrawals: Vec::new(),
    };
    let projection = project(&projection_inputs)?;

    let mut points = Vec::with_capacity(projection.years.len() + 1);
    points.push(SipYearPoint {
        year: 0,
        principal: inputs.initial_investment,
        value: inputs.initial_investment,
        gains: 0.0,
    });
    points.extend(projection.years.iter().map(|row| SipYearPoint {
        year: row.year,
        principal: row.cumulative_principal,
        value: row.end_balance,
        gains: (row.end_balance - row.cumulative_principal).max(0.0),
    }));

    let total_principal = points.last().map_or(0.0, |p| p.principal);
    let final_value = projection.final_balance;
    Ok(SipResult {
        points,
        years: projection.years,
        summary: SipSummary {
            total_principal,
            final_value,
            total_gains: final_value - total_principal,
        },
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireInputs {
    pub current_age: u32,
    pub monthly_expense: f64,
    pub inflation_pct: f64,
    pub current_investment: f64,
    pub sip_monthly: f64,
    pub step_up_pct: f64,
    pub expected_return_pct: f64,
    pub horizon_years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireYearRow {
    pub year: u32,
    pub age: u32,
    pub portfolio: f64,
    pub annual_expense: f64,
    pub fire_target: f64,
    pub sip_monthly: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireResult {
    pub yearly: Vec<FireYearRow>,
    pub fire_reached: bool,
    /// 0-based month in which the portfolio first covered the target.
    pub fire_month_index: Option<u32>,
    pub years_to_fire: Option<u32>,
    pub fire_age: Option<u32>,
}

pub fn fire_horizon(inputs: &FireInputs) -> Result<FireResult, InputError> {
    non_negative("monthlyExpense", inputs.monthly_expense)?;
    non_negative("inflationPct", inputs.inflation_pct)?;
    non_negative("expectedReturnPct", inputs.expected_return_pct)?;
    if inputs.horizon_years == 0 {
        return Err(InputError::OutOfRange {
            field: "horizonYears",
            bound: ">= 1",
            value: 0.0,
        });
    }

    let total_months = inputs.horizon_years * 12;
    let projection_inputs = ProjectionInputs {
        initial_principal: inputs.current_investment,
        monthly_contribution: inputs.sip_monthly,
        step_up: StepUp::Percent(inputs.step_up_pct),
        returns: ReturnSchedule::Fixed {
            annual_pct: inputs.expected_return_pct,
        },
        contribution_months: total_months,
        total_months,
        lumpsums: Vec::new(),
        withdrawals: Vec::new(),
    };
    let mut projector = MonthlyProjector::new(&projection_inputs)?;
    let monthly_inflation = (1.0 + inputs.inflation_pct / 100.0).powf(1.0 / 12.0) - 1.0;

    let mut monthly_expense = inputs.monthly_expense;
    let mut fire_month_index = None;
    let mut yearly = Vec::with_capacity(inputs.horizon_years as usize);

    while let Some(flow) = projector.step() {
        monthly_expense *= 1.0 + monthly_inflation;
        let annual_expense = monthly_expense * 12.0;
        let fire_target = FIRE_EXPENSE_MULTIPLE * annual_expense;

        if fire_month_index.is_none() && flow.end_balance >= fire_target {
            fire_month_index = Some(flow.month);
        }

        if flow.month % 12 == 11 {
            let years_elapsed = flow.month / 12;
            yearly.push(FireYearRow {
                year: years_elapsed + 1,
                age: inputs.current_age + years_elapsed,
                portfolio: flow.end_balance,
                annual_expense,
                fire_target,
                sip_monthly: flow.contribution,
            });
        }
    }

    let years_to_fire = fire_month_index.map(|m| m / 12);
    Ok(FireResult {
        yearly,
        fire_reached: fire_month_index.is_some(),
        fire_month_index,
        years_to_fire,
        fire_age: years_to_fire.map(|years| inputs.current_age + years),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneInput {
    pub label: String,
    /// Cost in today's money.
    pub current_value: f64,
    pub target_age: f64,
    pub inflation_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MilestoneInputs {
    pub current_age: f64,
    pub milestones: Vec<MilestoneInput>,
    pub initial_investment: f64,
    pub sip_monthly: f64,
    /// Flat amount added to the monthly SIP each year.
    pub step_up_annual: f64,
    pub cagr_pct: f64,
    pub sip_years: u32,
    pub post_sip_years: u32,
}

impl Default for MilestoneInputs {
    fn default() -> Self {
        let milestone = |label: &str, target_age: f64, inflation_pct: f64| MilestoneInput {
            label: label.to_string(),
            current_value: 0.0,
            target_age,
            inflation_pct,
        };
        Self {
            current_age: 3.0,
            milestones: vec![
                milestone("UG", 15.0, 6.0),
                milestone("PG", 19.0, 6.0),
                milestone("Business", 24.0, 5.0),
                milestone("Marriage", 25.0, 5.0),
            ],
            initial_investment: 170_000.0,
            sip_monthly: 15_000.0,
            step_up_annual: 1_000.0,
            cagr_pct: 12.0,
            sip_years: 20,
            post_sip_years: 25,
        }
    }
}

impl MilestoneInputs {
    pub fn total_years(&self) -> u32 {
        self.sip_years + self.post_sip_years
    }

    pub fn validate(&self) -> Result<(), InputError> {
        non_negative("currentAge", self.current_age)?;
        for m in &self.milestones {
            non_negative("milestoneTargetAge", m.target_age)?;
            if m.target_age <= self.current_age {
                return Err(InputError::MilestoneNotInFuture {
                    label: m.label.clone(),
                    target_age: m.target_age,
                    current_age: self.current_age,
                });
            }
            non_negative("milestoneCurrentValue", m.current_value)?;
            non_negative("milestoneInflationPct", m.inflation_pct)?;
        }
        non_negative("initialInvestment", self.initial_investment)?;
        non_negative("sipMonthly", self.sip_monthly)?;
        non_negative("stepUpAnnual", self.step_up_annual)?;
        non_negative("cagrPct", self.cagr_pct)?;

        // Events are paid at 0-based month indices below the horizon.
        let horizon_months = self.total_years() * 12;
        let latest = self
            .milestones
            .iter()
            .map(|m| m.target_age - self.current_age)
            .fold(0.0, f64::max);
        if milestone_event_month(latest) >= horizon_months {
            return Err(InputError::HorizonBeforeMilestone {
                horizon_years: self.total_years(),
                milestone_years: latest,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneScheduleItem {
    pub label: String,
    pub target_age: f64,
    pub years_from_now: f64,
    /// Months from now at which the cost is withdrawn.
    pub event_month: u32,
    pub inflated_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestonePlan {
    pub schedule: Vec<MilestoneScheduleItem>,
    pub projection: ProjectionResult,
}

pub fn milestone_schedule(inputs: &MilestoneInputs) -> Vec<MilestoneScheduleItem> {
    inputs
        .milestones
        .iter()
        .map(|m| {
            let years_from_now = (m.target_age - inputs.current_age).max(0.0);
            let event_month = milestone_event_month(years_from_now);
            let withdrawal = milestone_withdrawal(m, event_month);
            MilestoneScheduleItem {
                label: m.label.clone(),
                target_age: m.target_age,
                years_from_now,
                event_month,
                inflated_cost: withdrawal.inflated_amount(),
            }
        })
        .collect()
}

/// 0-based month index in which a milestone `years_from_now` away is paid.
fn milestone_event_month(years_from_now: f64) -> u32 {
    (years_from_now.max(0.0) * 12.0).round() as u32
}

fn milestone_withdrawal(milestone: &MilestoneInput, event_month: u32) -> ScheduledWithdrawal {
    ScheduledWithdrawal {
        label: milestone.label.clone(),
        present_value: milestone.current_value,
        inflation_pct: milestone.inflation_pct,
        month: event_month,
    }
}

pub fn milestone_plan(inputs: &MilestoneInputs) -> Result<MilestonePlan, InputError> {
    inputs.validate()?;
    let schedule = milestone_schedule(inputs);

    let projection_inputs = ProjectionInputs {
        initial_principal: inputs.initial_investment,
        monthly_contribution: inputs.sip_monthly,
        step_up: StepUp::Flat(inputs.step_up_annual),
        returns: ReturnSchedule::Fixed {
            annual_pct: inputs.cagr_pct,
        },
        contribution_months: inputs.sip_years * 12,
        total_months: inputs.total_years() * 12,
        lumpsums: Vec::new(),
        withdrawals: inputs
            .milestones
            .iter()
            .zip(&schedule)
            .map(|(m, item)| milestone_withdrawal(m, item.event_month))
            .collect(),
    };

    Ok(MilestonePlan {
        schedule,
        projection: project(&projection_inputs)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_sip() -> SipInputs {
        SipInputs {
            initial_investment: 10_000_000.0,
            monthly_sip: 60_000.0,
            step_up_pct: 5.0,
            expected_return_pct: 12.0,
            sip_years: 10,
            invest_years: 20,
            lumpsums: Vec::new(),
        }
    }

    fn sample_fire() -> FireInputs {
        FireInputs {
            current_age: 30,
            monthly_expense: 2_000.0,
            inflation_pct: 5.0,
            current_investment: 25_000.0,
            sip_monthly: 1_000.0,
            step_up_pct: 10.0,
            expected_return_pct: 10.0,
            horizon_years: 60,
        }
    }

    #[test]
    fn sip_principal_counts_stepped_contributions() {
        let mut inputs = sample_sip();
        inputs.expected_return_pct = 0.0;
        inputs.initial_investment = 0.0;
        inputs.monthly_sip = 1_000.0;
        inputs.step_up_pct = 10.0;
        inputs.sip_years = 2;
        inputs.invest_years = 3;

        let result = sip_growth(&inputs).expect("valid inputs");
        assert_eq!(result.points.len(), 4);
        assert_approx(result.points[1].principal, 12_000.0);
        assert_approx(result.points[2].principal, 25_200.0);
        assert_approx(result.points[3].principal, 25_200.0);
        assert_approx(result.summary.total_gains, 0.0);
    }

    #[test]
    fn sip_years_are_clamped_to_horizon_and_late_lumpsums_ignored() {
        let mut inputs = sample_sip();
        inputs.expected_return_pct = 0.0;
        inputs.initial_investment = 0.0;
        inputs.monthly_sip = 100.0;
        inputs.step_up_pct = 0.0;
        inputs.sip_years = 5;
        inputs.invest_years = 2;
        inputs.lumpsums = vec![
            YearLumpsum {
                amount: 1_000.0,
                year: 1,
            },
            YearLumpsum {
                amount: 9_999.0,
                year: 3,
            },
        ];

        let result = sip_growth(&inputs).expect("valid inputs");
        assert_approx(result.summary.total_principal, 2_400.0 + 1_000.0);
        assert_approx(result.summary.final_value, 3_400.0);
    }

    #[test]
    fn sip_growth_reports_gains_over_principal() {
        let result = sip_growth(&sample_sip()).expect("valid inputs");
        assert_eq!(result.points.len(), 21);
        assert!(result.summary.final_value > result.summary.total_principal);
        assert_approx(
            result.summary.total_gains,
            result.summary.final_value - result.summary.total_principal,
        );
        for pair in result.points.windows(2) {
            assert!(pair[1].principal >= pair[0].principal);
        }
    }

    #[test]
    fn fire_reports_first_crossing_month() {
        let mut inputs = sample_fire();
        inputs.current_investment = 10_000_000.0;
        let result = fire_horizon(&inputs).expect("valid inputs");
        assert!(result.fire_reached);
        assert_eq!(result.fire_month_index, Some(0));
        assert_eq!(result.years_to_fire, Some(0));
        assert_eq!(result.fire_age, Some(30));
        assert_eq!(result.yearly.len(), 60);
    }

    #[test]
    fn fire_not_reached_without_savings() {
        let mut inputs = sample_fire();
        inputs.current_investment = 0.0;
        inputs.sip_monthly = 0.0;
        let result = fire_horizon(&inputs).expect("valid inputs");
        assert!(!result.fire_reached);
        assert_eq!(result.fire_age, None);
    }

    #[test]
    fn oracle_fire_target_tracks_monthly_inflated_expense() {
        let mut inputs = sample_fire();
        inputs.horizon_years = 1;
        inputs.inflation_pct = 12.0;
        let result = fire_horizon(&inputs).expect("valid inputs");
        let row = &result.yearly[0];
        assert_approx(row.annual_expense, 2_000.0 * 1.12 * 12.0);
        assert_approx(row.fire_target, 60.0 * 2_000.0 * 1.12 * 12.0);
        assert_eq!(row.age, 30);
    }

    #[test]
    fn fire_sip_steps_up_each_year() {
        let result = fire_horizon(&sample_fire()).expect("valid inputs");
        assert_approx(result.yearly[0].sip_monthly, 1_000.0);
        assert_approx(result.yearly[1].sip_monthly, 1_100.0);
        assert_approx(result.yearly[2].sip_monthly, 1_210.0);
    }

    #[test]
    fn fire_rejects_zero_horizon() {
        let mut inputs = sample_fire();
        inputs.horizon_years = 0;
        assert!(fire_horizon(&inputs).is_err());
    }

    #[test]
    fn milestone_schedule_inflates_costs_to_event_month() {
        let mut inputs = MilestoneInputs::default();
        inputs.milestones[0].current_value = 1_000_000.0;
        let schedule = milestone_schedule(&inputs);
        assert_eq!(schedule.len(), 4);
        assert_eq!(schedule[0].event_month, 144);
        assert_approx(schedule[0].years_from_now, 12.0);
        assert_approx(schedule[0].inflated_cost, 1_000_000.0 * 1.06f64.powi(12));
    }

    #[test]
    fn milestone_withdrawals_are_clamped_to_balance() {
        let mut inputs = MilestoneInputs::default();
        inputs.initial_investment = 0.0;
        inputs.sip_monthly = 0.0;
        inputs.step_up_annual = 0.0;
        inputs.milestones[0].current_value = 500_000.0;

        let plan = milestone_plan(&inputs).expect("valid inputs");
        let row = &plan.projection.years[12];
        assert_eq!(row.events.len(), 1);
        assert_approx(row.events[0].paid, 0.0);
        assert!(row.events[0].requested > 0.0);
    }

    #[test]
    fn milestone_plan_pays_costs_from_corpus() {
        let mut inputs = MilestoneInputs::default();
        inputs.milestones[0].current_value = 1_000_000.0;
        let plan = milestone_plan(&inputs).expect("valid inputs");
        assert_eq!(plan.projection.years.len(), 45);
        let withdrawn: f64 = plan.projection.years.iter().map(|y| y.withdrawals).sum();
        assert_approx(withdrawn, plan.schedule[0].inflated_cost);
    }

    #[test]
    fn milestone_validation_rejects_past_targets_and_short_horizons() {
        let mut inputs = MilestoneInputs::default();
        inputs.milestones[1].target_age = 3.0;
        let err = milestone_plan(&inputs).expect_err("target age not in future");
        assert!(err.to_string().contains("PG"));

        let mut inputs = MilestoneInputs::default();
        inputs.sip_years = 10;
        inputs.post_sip_years = 5;
        let err = milestone_plan(&inputs).expect_err("horizon too short");
        assert!(matches!(err, InputError::HorizonBeforeMilestone { .. }));

        let mut inputs = MilestoneInputs::default();
        inputs.cagr_pct = -1.0;
        assert!(milestone_plan(&inputs).is_err());
    }

    #[test]
    fn milestone_landing_on_the_horizon_is_rejected() {
        let mut inputs = MilestoneInputs::default();
        inputs.sip_years = 20;
        inputs.post_sip_years = 2;
        let err = milestone_plan(&inputs).expect_err("event on the horizon");
        assert_eq!(
            err,
            InputError::HorizonBeforeMilestone {
                horizon_years: 22,
                milestone_years: 22.0,
            }
        );

        inputs.post_sip_years = 3;
        let plan = milestone_plan(&inputs).expect("one spare year");
        assert_eq!(plan.schedule[3].event_month, 264);
        assert_eq!(plan.projection.years[22].events.len(), 1);
    }

    #[test]
    fn sub_month_milestone_is_paid_in_the_first_month() {
        let mut inputs = MilestoneInputs::default();
        inputs.milestones = vec![MilestoneInput {
            label: "Admission".to_string(),
            current_value: 10_000.0,
            target_age: 3.04,
            inflation_pct: 6.0,
        }];
        let plan = milestone_plan(&inputs).expect("valid inputs");
        assert_eq!(plan.schedule[0].event_month, 0);

        let first_year = &plan.projection.years[0];
        assert_eq!(first_year.events.len(), 1);
        assert_approx(first_year.events[0].requested, 10_000.0);
        assert_approx(first_year.events[0].paid, 10_000.0);
        assert_approx(plan.projection.totals.withdrawals, 10_000.0);
    }

    #[test]
    fn oracle_year_boundary_milestone_lands_in_following_year() {
        let inputs = MilestoneInputs {
            current_age: 10.0,
            milestones: vec![MilestoneInput {
                label: "Camp".to_string(),
                current_value: 100.0,
                target_age: 11.0,
                inflation_pct: 0.0,
            }],
            initial_investment: 1_000.0,
            sip_monthly: 0.0,
            step_up_annual: 0.0,
            cagr_pct: 12.0,
            sip_years: 0,
            post_sip_years: 2,
        };
        let plan = milestone_plan(&inputs).expect("valid inputs");
        let years = &plan.projection.years;
        assert!(years[0].events.is_empty());
        assert_approx(years[0].end_balance, 1_120.0);
        assert_eq!(years[1].events.len(), 1);
        let expected = 1_254.4 - 100.0 * 1.12f64.powf(11.0 / 12.0);
        assert_approx(years[1].end_balance, expected);
    }

    #[test]
    fn milestone_inputs_deserialize_with_defaults() {
        let json = r#"{ "currentAge": 5, "sipMonthly": 20000 }"#;
        let inputs: MilestoneInputs = serde_json::from_str(json).expect("valid json");
        assert_approx(inputs.current_age, 5.0);
        assert_approx(inputs.sip_monthly, 20_000.0);
        assert_eq!(inputs.milestones.len(), 4);
        assert_eq!(inputs.sip_years, 20);
    }
}
