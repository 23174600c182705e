use super::error::InputError;
use super::returns::ReturnCycle;
use super::types::{
    ProjectionInputs, ProjectionResult, ProjectionTotals, ReturnSchedule, WithdrawalEvent, YearRow,
};

/// Cash flows of a single projected month.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonthFlow {
    /// 0-based month index.
    pub month: u32,
    pub lumpsum: f64,
    pub contribution: f64,
    pub growth: f64,
    pub withdrawals: Vec<WithdrawalEvent>,
    pub end_balance: f64,
}

impl MonthFlow {
    pub fn withdrawn(&self) -> f64 {
        self.withdrawals.iter().map(|w| w.paid).sum()
    }
}

#[derive(Debug, Clone)]
enum MonthlyRates {
    Fixed(f64),
    Variable(ReturnCycle),
}

impl MonthlyRates {
    fn rate(&self, month_index: u32) -> f64 {
        match self {
            MonthlyRates::Fixed(rate) => *rate,
            MonthlyRates::Variable(cycle) => cycle.monthly_return(month_index as usize),
        }
    }
}

pub fn monthly_rate(annual_pct: f64) -> f64 {
    (1.0 + annual_pct / 100.0).powf(1.0 / 12.0) - 1.0
}

/// Single-balance compounding loop. Each call to [`MonthlyProjector::step`]
/// deposits due lumpsums and the month's contribution, applies growth, then
/// pays withdrawals scheduled for the same 0-based month index. Events at or
/// beyond `total_months` never fire.
#[derive(Debug, Clone)]
pub struct MonthlyProjector<'a> {
    inputs: &'a ProjectionInputs,
    rates: MonthlyRates,
    balance: f64,
    principal: f64,
    month: u32,
}

impl<'a> MonthlyProjector<'a> {
    pub fn new(inputs: &'a ProjectionInputs) -> Result<Self, InputError> {
        inputs.validate()?;
        let rates = match inputs.returns {
            ReturnSchedule::Fixed { annual_pct } => MonthlyRates::Fixed(monthly_rate(annual_pct)),
            ReturnSchedule::Variable { annual_pct } => {
                MonthlyRates::Variable(ReturnCycle::new(annual_pct)?)
            }
        };
        Ok(Self {
            inputs,
            rates,
            balance: inputs.initial_principal,
            principal: inputs.initial_principal,
            month: 0,
        })
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Initial principal plus every contribution and lumpsum so far.
    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn is_finished(&self) -> bool {
        self.month >= self.inputs.total_months
    }

    /// Contribution scheduled for the 0-based month index, zero after the SIP ends.
    pub fn contribution_for(&self, month: u32) -> f64 {
        if month >= self.inputs.contribution_months {
            return 0.0;
        }
        self.inputs
            .step_up
            .contribution(self.inputs.monthly_contribution, month / 12)
    }

    pub fn step(&mut self) -> Option<MonthFlow> {
        if self.is_finished() {
            return None;
        }
        let month = self.month;

        let lumpsum: f64 = self
            .inputs
            .lumpsums
            .iter()
            .filter(|l| l.month == month)
            .map(|l| l.amount)
            .sum();
        let contribution = self.contribution_for(month);
        self.balance += lumpsum + contribution;
        self.principal += lumpsum + contribution;

        let growth = self.balance * self.rates.rate(month);
        self.balance += growth;

        let mut withdrawals = Vec::new();
        for scheduled in self.inputs.withdrawals.iter().filter(|w| w.month == month) {
            let requested = scheduled.inflated_amount();
            let paid = requested.min(self.balance).max(0.0);
            self.balance -= paid;
            withdrawals.push(WithdrawalEvent {
                label: scheduled.label.clone(),
                month: scheduled.month,
                requested,
                paid,
            });
        }

        self.month += 1;
        Some(MonthFlow {
            month,
            lumpsum,
            contribution,
            growth,
            withdrawals,
            end_balance: self.balance,
        })
    }
}

pub fn project(inputs: &ProjectionInputs) -> Result<ProjectionResult, InputError> {
    let mut projector = MonthlyProjector::new(inputs)?;
    let mut totals = ProjectionTotals::default();
    let mut years: Vec<YearRow> = Vec::new();
    let mut current: Option<YearRow> = None;

    loop {
        let opening_balance = projector.balance();
        let Some(flow) = projector.step() else {
            break;
        };
        let row = current.get_or_insert_with(|| YearRow {
            year: flow.month / 12 + 1,
            start_balance: opening_balance,
            contributions: 0.0,
            growth: 0.0,
            withdrawals: 0.0,
            end_balance: 0.0,
            cumulative_principal: 0.0,
            events: Vec::new(),
        });

        let withdrawn = flow.withdrawn();
        row.contributions += flow.contribution + flow.lumpsum;
        row.growth += flow.growth;
        row.withdrawals += withdrawn;
        row.end_balance = flow.end_balance;
        row.cumulative_principal = projector.principal();
        row.events.extend(flow.withdrawals);

        totals.contributions += flow.contribution;
        totals.lumpsums += flow.lumpsum;
        totals.growth += flow.growth;
        totals.withdrawals += withdrawn;

        if flow.month % 12 == 11 || projector.is_finished() {
            years.extend(current.take());
        }
    }

    Ok(ProjectionResult {
        years,
        final_balance: projector.balance(),
        totals,
        total_months: inputs.total_months,
    })
}
