use super::types::{BucketInputs, ExhaustionCause, MonthRecord};

/// Balances and refill timers carried from one simulated month to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketState {
    pub tier1: f64,
    pub tier2: f64,
    pub tier3a: f64,
    pub tier3b: f64,
    pub months_since_tier1_refill: u32,
    pub months_since_tier2_refill: u32,
    pub current_requirement: f64,
}

impl BucketState {
    pub fn initial(inputs: &BucketInputs) -> Self {
        Self {
            tier1: inputs.monthly_requirement * inputs.tier1_duration_months as f64,
            tier2: inputs.monthly_requirement * inputs.tier2_duration_months as f64,
            tier3a: inputs.tier3a_principal,
            tier3b: inputs.tier3b_principal,
            months_since_tier1_refill: 0,
            months_since_tier2_refill: 0,
            current_requirement: inputs.monthly_requirement,
        }
    }

    pub fn total(&self) -> f64 {
        self.tier1 + self.tier2 + self.tier3a + self.tier3b
    }

    pub fn tier3_total(&self) -> f64 {
        self.tier3a + self.tier3b
    }

    fn all_depleted(&self) -> bool {
        self.tier1 <= 0.0 && self.tier2 <= 0.0 && self.tier3a <= 0.0 && self.tier3b <= 0.0
    }

    fn clamped(self) -> Self {
        Self {
            tier1: self.tier1.max(0.0),
            tier2: self.tier2.max(0.0),
            tier3a: self.tier3a.max(0.0),
            tier3b: self.tier3b.max(0.0),
            ..self
        }
    }
}

/// Fractional market returns applied to the variable tiers for one month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthReturns {
    pub tier2: f64,
    pub tier3: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthStep {
    pub state: BucketState,
    pub record: MonthRecord,
    pub exhaustion: Option<ExhaustionCause>,
}

/// Splits `amount` across the two growth sub-accounts in proportion to their
/// balances. An empty pair is split evenly.
pub fn split_proportional(tier3a: f64, tier3b: f64, amount: f64) -> (f64, f64) {
    let total = tier3a + tier3b;
    if total <= 0.0 {
        let half = amount * 0.5;
        return (half, amount - half);
    }
    let from_a = amount * (tier3a / total);
    (from_a, amount - from_a)
}

/// Advances the ledger by one month. `month` is 1-based; month 0 is treated
/// as an opening month with no quarter-end or anniversary.
pub fn step_month(
    state: BucketState,
    inputs: &BucketInputs,
    month: u32,
    returns: MonthReturns,
) -> MonthStep {
    let mut next = state;
    let requirement = state.current_requirement;

    let dividend = if month > 0 && month % 3 == 0 {
        next.tier3a * (inputs.tier3a_dividend_yield_pct / 100.0) / 4.0
    } else {
        0.0
    };

    let tier2_return = next.tier2 * returns.tier2;
    next.tier2 += tier2_return;

    let tier3_base = next.tier3_total();
    let tier3a_return = next.tier3a * returns.tier3;
    let tier3b_return = next.tier3b * returns.tier3;
    next.tier3a += tier3a_return;
    next.tier3b += tier3b_return;
    let tier3_return = tier3a_return + tier3b_return;
    let tier3_return_pct = if tier3_base > 0.0 {
        tier3_return / tier3_base * 100.0
    } else {
        0.0
    };

    next.tier1 += next.tier1 * (inputs.tier1_return_pct / 100.0) / 12.0;
    next.tier1 -= requirement;
    next.months_since_tier1_refill += 1;
    next.months_since_tier2_refill += 1;

    let mut record = MonthRecord {
        month,
        requirement,
        dividend,
        tier1: 0.0,
        tier2: 0.0,
        tier3a: 0.0,
        tier3b: 0.0,
        tier2_return,
        tier2_return_pct: returns.tier2 * 100.0,
        tier3_return,
        tier3_return_pct,
        tier1_refilled: false,
        tier2_refilled: false,
        tier2_refill_skipped: false,
    };

    if next.months_since_tier1_refill >= inputs.tier1_duration_months || next.tier1 <= 0.0 {
        let refill = requirement * inputs.tier1_duration_months as f64;
        if next.tier2 >= refill {
            next.tier2 -= refill;
            next.tier1 += refill;
            next.months_since_tier1_refill = 0;
            record.tier1_refilled = true;
            log::debug!("month {month}: refilled tier 1 with {refill:.2} from tier 2");
        } else {
            log::debug!(
                "month {month}: tier 2 ({:.2}) cannot cover tier 1 refill of {refill:.2}",
                next.tier2
            );
            let next = next.clamped();
            fill_balances(&mut record, &next);
            return MonthStep {
                state: next,
                record,
                exhaustion: Some(ExhaustionCause::Tier1RefillFailed),
            };
        }
    }

    if next.months_since_tier2_refill >= inputs.tier2_duration_months {
        let refill = requirement * inputs.tier2_duration_months as f64;
        if next.tier3_total() >= refill {
            let (from_a, from_b) = split_proportional(next.tier3a, next.tier3b, refill);
            next.tier3a -= from_a;
            next.tier3b -= from_b;
            next.tier2 += refill;
            next.months_since_tier2_refill = 0;
            record.tier2_refilled = true;
            log::debug!("month {month}: refilled tier 2 with {refill:.2} from tier 3");
        } else {
            // Tier 1 still has runway; retry next month.
            record.tier2_refill_skipped = true;
            log::debug!(
                "month {month}: skipped tier 2 refill of {refill:.2}, tier 3 holds {:.2}",
                next.tier3_total()
            );
        }
    }

    let next_clamped = next.clamped();
    fill_balances(&mut record, &next_clamped);

    let mut next = next_clamped;
    if month > 0 && month % 12 == 0 {
        next.current_requirement *= 1.0 + inputs.inflation_pct / 100.0;
    }

    let exhaustion = next
        .all_depleted()
        .then_some(ExhaustionCause::AllTiersDepleted);

    MonthStep {
        state: next,
        record,
        exhaustion,
    }
}

fn fill_balances(record: &mut MonthRecord, state: &BucketState) {
    record.tier1 = state.tier1;
    record.tier2 = state.tier2;
    record.tier3a = state.tier3a;
    record.tier3b = state.tier3b;
}
