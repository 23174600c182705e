mod calculators;
mod engine;
mod error;
mod expenses;
mod ledger;
mod projection;
mod returns;
mod solver;
mod types;

pub use calculators::{
    FIRE_EXPENSE_MULTIPLE, FireInputs, FireResult, FireYearRow, MilestoneInput, MilestoneInputs,
    MilestonePlan, MilestoneScheduleItem, SipInputs, SipResult, SipSummary, SipYearPoint,
    YearLumpsum, fire_horizon, milestone_plan, milestone_schedule, sip_growth,
};
pub use engine::{HORIZON_MONTHS, HORIZON_YEARS, simulate_bucket_strategy, simulate_from_state};
pub use error::InputError;
pub use expenses::{
    ExpenseCategory, ExpenseGroup, ExpenseInputs, ExpenseItem, ExpenseSummary, Frequency,
    GroupTotals, summarize_expenses,
};
pub use ledger::{BucketState, MonthReturns, MonthStep, split_proportional, step_month};
pub use projection::{MonthFlow, MonthlyProjector, monthly_rate, project};
pub use returns::{CYCLE_YEARS, MONTHS_PER_CYCLE, ReturnCycle, generate_monthly_returns};
pub use solver::{
    GoalSolveConfig, GoalSolveIteration, GoalSolveResult, GoalType, SolveError, Tier3Allocation,
    solve_goal,
};
pub use types::{
    BucketInputs, BucketResult, ExhaustionCause, Lumpsum, MonthRecord, ProjectionInputs,
    ProjectionResult, ProjectionTotals, ReturnSchedule, ScheduledWithdrawal, StepUp, Termination,
    WithdrawalEvent, YearRow,
};
