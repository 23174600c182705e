use super::error::{InputError, growth_pct};

pub const CYCLE_YEARS: usize = 7;
pub const MONTHS_PER_CYCLE: usize = CYCLE_YEARS * 12;

// Annual returns of the reference cycle: two down years among mostly positive ones.
const YEARLY_PATTERN: [f64; CYCLE_YEARS] = [-0.03, 0.18, -0.05, 0.22, 0.08, 0.15, 0.12];

// Month-to-month shape for each pattern year, in the same order as YEARLY_PATTERN.
const MONTHLY_SHAPES: [[f64; 12]; CYCLE_YEARS] = [
    [
        0.02, -0.01, 0.03, -0.02, 0.01, -0.015, 0.025, -0.01, 0.02, -0.005, 0.015, -0.01,
    ],
    [
        0.03, 0.04, 0.02, 0.03, 0.025, 0.02, 0.015, 0.02, 0.01, 0.015, 0.02, 0.025,
    ],
    [
        -0.02, -0.03, -0.01, 0.01, -0.015, -0.02, 0.005, -0.01, -0.015, 0.01, -0.005, -0.01,
    ],
    [
        0.04, 0.03, 0.05, 0.02, 0.03, 0.025, 0.02, 0.015, 0.01, 0.02, 0.015, 0.01,
    ],
    [
        0.015, 0.02, 0.01, 0.015, 0.005, 0.01, 0.02, 0.005, 0.015, 0.01, 0.005, 0.01,
    ],
    [
        0.025, 0.03, 0.02, 0.015, 0.025, 0.01, 0.015, 0.02, 0.01, 0.015, 0.005, 0.01,
    ],
    [
        0.02, 0.015, 0.025, 0.01, 0.02, 0.015, 0.01, 0.015, 0.005, 0.01, 0.015, 0.01,
    ],
];

/// Deterministic monthly return generator shaped around a repeating 7-year cycle.
///
/// The raw cycle is rescaled on gross returns: every pattern year is multiplied
/// by `(1 + expected) / (1 + pattern_cagr)`, so a full cycle compounds to
/// `(1 + expected)^7`. Within a year, each month's gross return is multiplied by
/// `((1 + year_target) / (1 + shape_return))^(1/12)`, so the 12 months compound
/// to the year's target exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnCycle {
    expected_annual_return: f64,
    year_targets: [f64; CYCLE_YEARS],
    month_factors: [f64; CYCLE_YEARS],
}

impl ReturnCycle {
    pub fn new(expected_annual_return_pct: f64) -> Result<Self, InputError> {
        let expected = growth_pct("expectedAnnualReturnPct", expected_annual_return_pct)? / 100.0;

        let pattern_growth = YEARLY_PATTERN
            .iter()
            .fold(1.0, |acc, year_return| acc * (1.0 + year_return));
        let pattern_cagr = pattern_growth.powf(1.0 / CYCLE_YEARS as f64) - 1.0;
        let year_scale = (1.0 + expected) / (1.0 + pattern_cagr);

        let mut year_targets = [0.0; CYCLE_YEARS];
        let mut month_factors = [0.0; CYCLE_YEARS];
        for (year, raw) in YEARLY_PATTERN.iter().enumerate() {
            let target = (1.0 + raw) * year_scale - 1.0;
            let shape_growth = MONTHLY_SHAPES[year]
                .iter()
                .fold(1.0, |acc, month_return| acc * (1.0 + month_return));
            year_targets[year] = target;
            month_factors[year] = ((1.0 + target) / shape_growth).powf(1.0 / 12.0);
        }

        Ok(Self {
            expected_annual_return: expected,
            year_targets,
            month_factors,
        })
    }

    pub fn expected_annual_return(&self) -> f64 {
        self.expected_annual_return
    }

    /// Scaled annual return of pattern year `year_in_cycle` (0..7).
    pub fn year_target(&self, year_in_cycle: usize) -> f64 {
        self.year_targets[year_in_cycle % CYCLE_YEARS]
    }

    /// Fractional return for the 0-based month index.
    pub fn monthly_return(&self, month_index: usize) -> f64 {
        let year_in_cycle = (month_index / 12) % CYCLE_YEARS;
        let month_in_year = month_index % 12;
        (1.0 + MONTHLY_SHAPES[year_in_cycle][month_in_year]) * self.month_factors[year_in_cycle]
            - 1.0
    }

    pub fn generate(&self, num_months: usize) -> Vec<f64> {
        (0..num_months).map(|m| self.monthly_return(m)).collect()
    }
}

pub fn generate_monthly_returns(
    expected_annual_return_pct: f64,
    num_months: usize,
) -> Result<Vec<f64>, InputError> {
    Ok(ReturnCycle::new(expected_annual_return_pct)?.generate(num_months))
}
