use super::error::InputError;
use super::ledger::{BucketState, MonthReturns, step_month};
use super::returns::ReturnCycle;
use super::types::{BucketInputs, BucketResult, MonthRecord, Termination};

pub const HORIZON_YEARS: u32 = 40;
pub const HORIZON_MONTHS: u32 = HORIZON_YEARS * 12;

pub fn simulate_bucket_strategy(inputs: &BucketInputs) -> Result<BucketResult, InputError> {
    simulate_from_state(inputs, BucketState::initial(inputs))
}

/// Runs the bucket strategy from an arbitrary starting ledger.
pub fn simulate_from_state(
    inputs: &BucketInputs,
    initial: BucketState,
) -> Result<BucketResult, InputError> {
    inputs.validate()?;

    let tier2_returns = ReturnCycle::new(inputs.tier2_return_pct)?.generate(HORIZON_MONTHS as usize);
    let tier3_returns = ReturnCycle::new(inputs.tier3_return_pct)?.generate(HORIZON_MONTHS as usize);

    let mut months: Vec<MonthRecord> = Vec::with_capacity(HORIZON_MONTHS as usize);
    let mut state = initial;
    let mut termination = Termination::HorizonReached;

    for (index, (tier2, tier3)) in tier2_returns.iter().zip(tier3_returns.iter()).enumerate() {
        let month = index as u32 + 1;
        let step = step_month(
            state,
            inputs,
            month,
            MonthReturns {
                tier2: *tier2,
                tier3: *tier3,
            },
        );
        months.push(step.record);
        state = step.state;

        if let Some(cause) = step.exhaustion {
            termination = Termination::Exhausted { month, cause };
            break;
        }
    }

    let years_lasted = match termination {
        Termination::Exhausted { month, .. } => Some(month / 12),
        Termination::HorizonReached => None,
    };
    match termination {
        Termination::Exhausted { month, cause } => {
            log::info!("bucket strategy exhausted in month {month} ({cause:?})")
        }
        Termination::HorizonReached => {
            log::info!("bucket strategy lasted the {HORIZON_YEARS}-year horizon")
        }
    }

    let initial_corpus = initial.total().max(0.0);
    let final_corpus = months.last().map_or(initial_corpus, MonthRecord::total_corpus);
    let total_dividends = months.iter().map(|m| m.dividend).sum();

    Ok(BucketResult {
        months,
        termination,
        years_lasted,
        initial_corpus,
        final_corpus,
        total_dividends,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ExhaustionCause;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_inputs() -> BucketInputs {
        BucketInputs::default()
    }

    fn assert_record_invariants(result: &BucketResult) {
        for (index, record) in result.months.iter().enumerate() {
            assert_eq!(record.month, index as u32 + 1);
            for (label, balance) in [
                ("tier1", record.tier1),
                ("tier2", record.tier2),
                ("tier3a", record.tier3a),
                ("tier3b", record.tier3b),
            ] {
                assert!(
                    balance.is_finite() && balance >= 0.0,
                    "{label} must be finite and non-negative in month {}, got {balance}",
                    record.month
                );
            }
        }
    }

    #[test]
    fn reference_scenario_runs_one_record_per_month() {
        let result = simulate_bucket_strategy(&sample_inputs()).expect("valid inputs");
        assert_record_invariants(&result);

        match result.termination {
            Termination::HorizonReached => {
                assert_eq!(result.months.len(), HORIZON_MONTHS as usize);
                assert_eq!(result.years_lasted, None);
            }
            Termination::Exhausted { month, .. } => {
                assert_eq!(result.months.len(), month as usize);
                assert_eq!(result.years_lasted, Some(month / 12));
            }
        }
        assert_approx(result.initial_corpus, 50_000.0 * 40.0 + 8_000_000.0);
    }

    #[test]
    fn tier2_unable_to_cover_first_refill_exhausts_in_month_one() {
        let inputs = BucketInputs {
            monthly_requirement: 10_000.0,
            inflation_pct: 0.0,
            tier1_duration_months: 1,
            tier1_return_pct: 0.0,
            tier2_duration_months: 1,
            tier2_return_pct: 0.0,
            tier3a_principal: 0.0,
            tier3a_dividend_yield_pct: 0.0,
            tier3b_principal: 0.0,
            tier3_return_pct: 0.0,
        };
        let start = BucketState {
            tier2: 0.0,
            ..BucketState::initial(&inputs)
        };

        let result = simulate_from_state(&inputs, start).expect("valid inputs");
        assert_eq!(
            result.termination,
            Termination::Exhausted {
                month: 1,
                cause: ExhaustionCause::Tier1RefillFailed,
            }
        );
        assert_eq!(result.months.len(), 1);
        assert_eq!(result.years_lasted, Some(0));
        assert_approx(result.final_corpus, 0.0);
    }

    #[test]
    fn single_month_buckets_without_growth_pool_run_out_quickly() {
        let inputs = BucketInputs {
            monthly_requirement: 10_000.0,
            inflation_pct: 0.0,
            tier1_duration_months: 1,
            tier1_return_pct: 0.0,
            tier2_duration_months: 1,
            tier2_return_pct: 0.0,
            tier3a_principal: 0.0,
            tier3a_dividend_yield_pct: 0.0,
            tier3b_principal: 0.0,
            tier3_return_pct: 0.0,
        };

        let result = simulate_bucket_strategy(&inputs).expect("valid inputs");
        assert!(result.is_exhausted());
        assert!(result.months_lasted() <= 2);
        assert_eq!(result.years_lasted, Some(0));
        assert_record_invariants(&result);
    }

    #[test]
    fn large_growth_pool_reaches_horizon_cap() {
        let mut inputs = sample_inputs();
        inputs.monthly_requirement = 1_000.0;
        inputs.inflation_pct = 0.0;
        inputs.tier3a_principal = 5_000_000.0;
        inputs.tier3b_principal = 5_000_000.0;

        let result = simulate_bucket_strategy(&inputs).expect("valid inputs");
        assert_eq!(result.termination, Termination::HorizonReached);
        assert_eq!(result.years_lasted, None);
        assert_eq!(result.months.len(), HORIZON_MONTHS as usize);
        assert_eq!(result.months_lasted(), HORIZON_MONTHS);
    }

    #[test]
    fn rejects_invalid_inputs_before_simulating() {
        let mut inputs = sample_inputs();
        inputs.tier2_duration_months = inputs.tier1_duration_months - 1;
        let err = simulate_bucket_strategy(&inputs).expect_err("tier 2 shorter than tier 1");
        assert!(err.to_string().contains("tier2DurationMonths"));

        let mut inputs = sample_inputs();
        inputs.inflation_pct = -1.0;
        assert!(simulate_bucket_strategy(&inputs).is_err());

        let mut inputs = sample_inputs();
        inputs.tier1_duration_months = 0;
        assert!(simulate_bucket_strategy(&inputs).is_err());

        let mut inputs = sample_inputs();
        inputs.monthly_requirement = 0.0;
        assert!(simulate_bucket_strategy(&inputs).is_err());
    }

    #[test]
    fn dividends_accumulate_at_quarter_ends_only() {
        let result = simulate_bucket_strategy(&sample_inputs()).expect("valid inputs");
        for record in &result.months {
            if record.month % 3 != 0 {
                assert_approx(record.dividend, 0.0);
            } else {
                assert!(record.dividend >= 0.0);
            }
        }
        let summed: f64 = result.months.iter().map(|m| m.dividend).sum();
        assert_approx(result.total_dividends, summed);
    }

    #[test]
    fn reruns_with_identical_inputs_are_identical() {
        let inputs = sample_inputs();
        let a = simulate_bucket_strategy(&inputs).expect("valid inputs");
        let b = simulate_bucket_strategy(&inputs).expect("valid inputs");
        assert_eq!(a, b);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_balances_never_negative_and_months_are_contiguous(
            requirement in 1_000u32..200_000,
            inflation_bp in 0u32..1200,
            tier1_duration in 1u32..24,
            tier2_extra in 0u32..36,
            tier1_return_bp in 0u32..900,
            tier2_return_bp in 0u32..1200,
            tier3_return_bp in 0u32..2000,
            stocks in 0u32..20_000_000,
            funds in 0u32..20_000_000,
            yield_bp in 0u32..600
        ) {
            let inputs = BucketInputs {
                monthly_requirement: requirement as f64,
                inflation_pct: inflation_bp as f64 / 100.0,
                tier1_duration_months: tier1_duration,
                tier1_return_pct: tier1_return_bp as f64 / 100.0,
                tier2_duration_months: tier1_duration + tier2_extra,
                tier2_return_pct: tier2_return_bp as f64 / 100.0,
                tier3a_principal: stocks as f64,
                tier3a_dividend_yield_pct: yield_bp as f64 / 100.0,
                tier3b_principal: funds as f64,
                tier3_return_pct: tier3_return_bp as f64 / 100.0,
            };
            let result = simulate_bucket_strategy(&inputs).expect("valid inputs");
            prop_assert!(!result.months.is_empty());
            prop_assert!(result.months.len() <= HORIZON_MONTHS as usize);
            assert_record_invariants(&result);

            match result.termination {
                Termination::Exhausted { month, .. } => {
                    prop_assert_eq!(result.months.len(), month as usize);
                    prop_assert_eq!(result.years_lasted, Some(month / 12));
                }
                Termination::HorizonReached => {
                    prop_assert_eq!(result.months.len(), HORIZON_MONTHS as usize);
                    prop_assert_eq!(result.years_lasted, None);
                }
            }
        }

        #[test]
        fn prop_requirement_steps_up_once_a_year(
            inflation_bp in 1u32..1200,
            stocks in 10_000_000u32..40_000_000
        ) {
            let mut inputs = sample_inputs();
            inputs.inflation_pct = inflation_bp as f64 / 100.0;
            inputs.tier3a_principal = stocks as f64;
            let result = simulate_bucket_strategy(&inputs).expect("valid inputs");

            for pair in result.months.windows(2) {
                let (prev, next) = (&pair[0], &pair[1]);
                prop_assert!(next.requirement >= prev.requirement);
                if prev.month % 12 == 0 {
                    prop_assert!(next.requirement > prev.requirement);
                } else {
                    prop_assert_eq!(next.requirement, prev.requirement);
                }
            }
        }
    }
}
