use serde::Serialize;
use thiserror::Error;

use super::engine::{HORIZON_YEARS, simulate_bucket_strategy};
use super::error::InputError;
use super::types::BucketInputs;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GoalType {
    /// Smallest Tier-3 corpus that lasts the target.
    RequiredCorpus,
    /// Largest monthly requirement that lasts the target.
    MaxRequirement,
}

#[derive(Debug, Clone, Copy)]
pub struct GoalSolveConfig {
    pub goal_type: GoalType,
    pub target_years: u32,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("targetYears must be between 1 and {max}, got {0}", max = HORIZON_YEARS)]
    TargetYears(u32),
    #[error("search bounds must be finite with searchMax > searchMin")]
    SearchBounds,
    #[error("searchMin must be > 0 when solving for the monthly requirement")]
    RequirementLowerBound,
    #[error("tolerance must be > 0")]
    Tolerance,
    #[error("maxIterations must be > 0")]
    MaxIterations,
    #[error(transparent)]
    Input(#[from] InputError),
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_value: f64,
    pub months_lasted: u32,
    pub meets_target: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier3Allocation {
    pub stocks: f64,
    pub funds: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveResult {
    pub goal_type: GoalType,
    pub target_years: u32,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub solved_value: Option<f64>,
    pub solved_allocation: Option<Tier3Allocation>,
    pub achieved_months: Option<u32>,
    pub iterations: Vec<GoalSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
struct Tier3Mix {
    stocks: f64,
    funds: f64,
    total: f64,
}

impl Tier3Mix {
    fn from_inputs(inputs: &BucketInputs) -> Self {
        let stocks = inputs.tier3a_principal.max(0.0);
        let funds = inputs.tier3b_principal.max(0.0);
        Self {
            stocks,
            funds,
            total: stocks + funds,
        }
    }

    fn allocation_for_total(self, total: f64) -> Tier3Allocation {
        let total = total.max(0.0);
        if self.total <= 1e-12 {
            return Tier3Allocation {
                stocks: total,
                funds: 0.0,
            };
        }

        let scale = total / self.total;
        Tier3Allocation {
            stocks: self.stocks * scale,
            funds: self.funds * scale,
        }
    }
}

pub fn solve_goal(
    inputs: &BucketInputs,
    config: GoalSolveConfig,
) -> Result<GoalSolveResult, SolveError> {
    validate_config(config)?;
    inputs.validate()?;

    let mix = Tier3Mix::from_inputs(inputs);
    let target_months = config.target_years * 12;

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let low_eval = evaluate_candidate(inputs, config, config.search_min, mix)?;
    let high_eval = evaluate_candidate(inputs, config, config.search_max, mix)?;

    let mut solved_value = None;
    let mut converged = false;
    let feasible;
    let message;

    let bracket = classify_bracket(
        config.goal_type,
        low_eval >= target_months,
        high_eval >= target_months,
    );

    if bracket == Bracket::Infeasible {
        feasible = false;
        message = match config.goal_type {
            GoalType::RequiredCorpus => "No corpus within the search bounds lasts the target.",
            GoalType::MaxRequirement => "No requirement within the search bounds lasts the target.",
        }
        .to_string();
    } else if bracket == Bracket::SolvedAtBound {
        solved_value = Some(match config.goal_type {
            GoalType::RequiredCorpus => config.search_min,
            GoalType::MaxRequirement => config.search_max,
        });
        converged = true;
        feasible = true;
        message = match config.goal_type {
            GoalType::RequiredCorpus => "Already lasts the target at the lower corpus bound.",
            GoalType::MaxRequirement => {
                "Upper requirement bound still lasts the target; increase search max."
            }
        }
        .to_string();
    } else {
        let mut lo = config.search_min;
        let mut hi = config.search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            let months_lasted = evaluate_candidate(inputs, config, mid, mix)?;
            let meets_target = months_lasted >= target_months;
            iterations.push(GoalSolveIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_value: mid,
                months_lasted,
                meets_target,
            });

            match (config.goal_type, meets_target) {
                (GoalType::RequiredCorpus, true) | (GoalType::MaxRequirement, false) => hi = mid,
                (GoalType::RequiredCorpus, false) | (GoalType::MaxRequirement, true) => lo = mid,
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                break;
            }
        }
        solved_value = Some(match config.goal_type {
            GoalType::RequiredCorpus => hi,
            GoalType::MaxRequirement => lo,
        });
        feasible = true;
        message = if converged {
            match config.goal_type {
                GoalType::RequiredCorpus => "Solved required corpus.",
                GoalType::MaxRequirement => "Solved maximum sustainable requirement.",
            }
            .to_string()
        } else {
            "Reached max iterations before tolerance was met; returning best estimate.".to_string()
        };
    }

    let mut achieved_months = None;
    let mut solved_allocation = None;
    if let Some(value) = solved_value {
        achieved_months = Some(evaluate_candidate(inputs, config, value, mix)?);
        if config.goal_type == GoalType::RequiredCorpus {
            solved_allocation = Some(mix.allocation_for_total(value));
        }
    }
    log::info!(
        "goal solve {:?} for {} years: {message}",
        config.goal_type,
        config.target_years
    );

    Ok(GoalSolveResult {
        goal_type: config.goal_type,
        target_years: config.target_years,
        search_min: config.search_min,
        search_max: config.search_max,
        tolerance: config.tolerance,
        max_iterations: config.max_iterations,
        solved_value,
        solved_allocation,
        achieved_months,
        iterations,
        converged,
        feasible,
        message,
    })
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Bracket {
    SolvedAtBound,
    Infeasible,
    Bisect,
}

/// Classifies the search bounds. The corpus goal checks its lower bound
/// first, the requirement goal checks feasibility first.
fn classify_bracket(goal_type: GoalType, at_min_ok: bool, at_max_ok: bool) -> Bracket {
    match goal_type {
        GoalType::RequiredCorpus if at_min_ok => Bracket::SolvedAtBound,
        GoalType::RequiredCorpus if !at_max_ok => Bracket::Infeasible,
        GoalType::MaxRequirement if !at_min_ok => Bracket::Infeasible,
        GoalType::MaxRequirement if at_max_ok => Bracket::SolvedAtBound,
        _ => Bracket::Bisect,
    }
}

/// Months the strategy lasts with the candidate applied.
fn evaluate_candidate(
    base_inputs: &BucketInputs,
    config: GoalSolveConfig,
    candidate_value: f64,
    mix: Tier3Mix,
) -> Result<u32, InputError> {
    let mut inputs = *base_inputs;
    match config.goal_type {
        GoalType::RequiredCorpus => {
            let allocation = mix.allocation_for_total(candidate_value);
            inputs.tier3a_principal = allocation.stocks;
            inputs.tier3b_principal = allocation.funds;
        }
        GoalType::MaxRequirement => {
            inputs.monthly_requirement = candidate_value;
        }
    }
    Ok(simulate_bucket_strategy(&inputs)?.months_lasted())
}

fn validate_config(config: GoalSolveConfig) -> Result<(), SolveError> {
    if config.target_years == 0 || config.target_years > HORIZON_YEARS {
        return Err(SolveError::TargetYears(config.target_years));
    }
    if !config.search_min.is_finite()
        || !config.search_max.is_finite()
        || config.search_min < 0.0
        || config.search_max <= config.search_min
    {
        return Err(SolveError::SearchBounds);
    }
    if config.goal_type == GoalType::MaxRequirement && config.search_min <= 0.0 {
        return Err(SolveError::RequirementLowerBound);
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(SolveError::Tolerance);
    }
    if config.max_iterations == 0 {
        return Err(SolveError::MaxIterations);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::HORIZON_MONTHS;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn flat_inputs() -> BucketInputs {
        BucketInputs {
            monthly_requirement: 10_000.0,
            inflation_pct: 0.0,
            tier1_duration_months: 12,
            tier1_return_pct: 0.0,
            tier2_duration_months: 24,
            tier2_return_pct: 0.0,
            tier3a_principal: 600_000.0,
            tier3a_dividend_yield_pct: 0.0,
            tier3b_principal: 400_000.0,
            tier3_return_pct: 0.0,
        }
    }

    fn corpus_config() -> GoalSolveConfig {
        GoalSolveConfig {
            goal_type: GoalType::RequiredCorpus,
            target_years: 10,
            search_min: 0.0,
            search_max: 5_000_000.0,
            tolerance: 1_000.0,
            max_iterations: 60,
        }
    }

    #[test]
    fn required_corpus_keeps_stock_fund_ratio() {
        let result = solve_goal(&flat_inputs(), corpus_config()).expect("must solve");
        assert!(result.feasible);
        assert!(result.converged);

        let value = result.solved_value.expect("value expected");
        let allocation = result.solved_allocation.expect("allocation expected");
        assert_close(allocation.stocks + allocation.funds, value, 1e-6);
        assert_close(allocation.stocks / value, 0.6, 1e-9);
        assert!(result.achieved_months.expect("months expected") >= 120);
    }

    #[test]
    fn solved_corpus_is_near_the_boundary() {
        let inputs = flat_inputs();
        let config = corpus_config();
        let result = solve_goal(&inputs, config).expect("must solve");
        let value = result.solved_value.expect("value expected");

        let mut shorter = inputs;
        let allocation = Tier3Mix::from_inputs(&inputs)
            .allocation_for_total((value - 2.0 * config.tolerance).max(0.0));
        shorter.tier3a_principal = allocation.stocks;
        shorter.tier3b_principal = allocation.funds;
        let lasted = simulate_bucket_strategy(&shorter)
            .expect("valid inputs")
            .months_lasted();
        assert!(lasted < 120, "smaller corpus should fail, lasted {lasted}");
    }

    #[test]
    fn max_requirement_shrinks_as_target_grows() {
        let mut config = corpus_config();
        config.goal_type = GoalType::MaxRequirement;
        config.search_min = 100.0;
        config.search_max = 200_000.0;
        config.tolerance = 10.0;

        config.target_years = 5;
        let short = solve_goal(&flat_inputs(), config).expect("must solve");
        config.target_years = 15;
        let long = solve_goal(&flat_inputs(), config).expect("must solve");

        let short_value = short.solved_value.expect("value expected");
        let long_value = long.solved_value.expect("value expected");
        assert!(short_value > long_value);
        assert!(short.solved_allocation.is_none());
        assert!(!short.iterations.is_empty());
    }

    #[test]
    fn reports_infeasible_when_bounds_too_low() {
        let mut config = corpus_config();
        config.target_years = HORIZON_YEARS;
        config.search_max = 10_000.0;

        let result = solve_goal(&flat_inputs(), config).expect("must return result");
        assert!(!result.feasible);
        assert!(result.solved_value.is_none());
        assert!(result.achieved_months.is_none());
    }

    #[test]
    fn lower_bound_already_lasting_short_circuits() {
        let mut config = corpus_config();
        config.target_years = 1;
        config.search_min = 4_000_000.0;

        let result = solve_goal(&flat_inputs(), config).expect("must solve");
        assert_eq!(result.solved_value, Some(4_000_000.0));
        assert!(result.iterations.is_empty());
        assert!(result.achieved_months.expect("months expected") <= HORIZON_MONTHS);
    }

    #[test]
    fn bracket_checks_follow_goal_direction() {
        use Bracket::*;
        let corpus = GoalType::RequiredCorpus;
        let requirement = GoalType::MaxRequirement;

        assert_eq!(classify_bracket(corpus, true, true), SolvedAtBound);
        assert_eq!(classify_bracket(corpus, true, false), SolvedAtBound);
        assert_eq!(classify_bracket(corpus, false, false), Infeasible);
        assert_eq!(classify_bracket(corpus, false, true), Bisect);

        assert_eq!(classify_bracket(requirement, false, true), Infeasible);
        assert_eq!(classify_bracket(requirement, false, false), Infeasible);
        assert_eq!(classify_bracket(requirement, true, true), SolvedAtBound);
        assert_eq!(classify_bracket(requirement, true, false), Bisect);
    }

    #[test]
    fn rejects_invalid_configs() {
        let mut config = corpus_config();
        config.target_years = 0;
        assert_eq!(
            solve_goal(&flat_inputs(), config).expect_err("zero target"),
            SolveError::TargetYears(0)
        );

        let mut config = corpus_config();
        config.search_max = config.search_min;
        assert_eq!(
            solve_goal(&flat_inputs(), config).expect_err("empty bounds"),
            SolveError::SearchBounds
        );

        let mut config = corpus_config();
        config.goal_type = GoalType::MaxRequirement;
        assert_eq!(
            solve_goal(&flat_inputs(), config).expect_err("zero requirement bound"),
            SolveError::RequirementLowerBound
        );

        let mut inputs = flat_inputs();
        inputs.inflation_pct = -2.0;
        assert!(matches!(
            solve_goal(&inputs, corpus_config()),
            Err(SolveError::Input(_))
        ));
    }
}
