use clap::{Args, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

use crate::core::{
    BucketInputs, FireInputs, GoalSolveConfig, GoalType, SipInputs, YearLumpsum,
};

#[derive(Args, Debug, Clone, PartialEq)]
pub struct BucketArgs {
    #[arg(long, default_value_t = 50_000.0, help = "Monthly expense drawn from Tier 1")]
    pub monthly_requirement: f64,
    #[arg(long, default_value_t = 6.0, help = "Annual inflation in percent")]
    pub inflation: f64,
    #[arg(long, default_value_t = 16, help = "Months of expenses held in Tier 1")]
    pub tier1_months: u32,
    #[arg(long, default_value_t = 6.0, help = "Tier 1 annual return in percent")]
    pub tier1_return: f64,
    #[arg(long, default_value_t = 24, help = "Months of expenses held in Tier 2")]
    pub tier2_months: u32,
    #[arg(long, default_value_t = 8.0, help = "Tier 2 expected annual return in percent")]
    pub tier2_return: f64,
    #[arg(long, default_value_t = 5_000_000.0)]
    pub stocks_principal: f64,
    #[arg(long, default_value_t = 2.0, help = "Stock dividend yield in percent")]
    pub dividend_yield: f64,
    #[arg(long, default_value_t = 3_000_000.0)]
    pub funds_principal: f64,
    #[arg(long, default_value_t = 12.0, help = "Tier 3 expected annual return in percent")]
    pub tier3_return: f64,
}

impl Default for BucketArgs {
    fn default() -> Self {
        Self {
            monthly_requirement: 50_000.0,
            inflation: 6.0,
            tier1_months: 16,
            tier1_return: 6.0,
            tier2_months: 24,
            tier2_return: 8.0,
            stocks_principal: 5_000_000.0,
            dividend_yield: 2.0,
            funds_principal: 3_000_000.0,
            tier3_return: 12.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BucketPayload {
    monthly_requirement: Option<f64>,
    inflation: Option<f64>,
    tier1_months: Option<u32>,
    tier1_return: Option<f64>,
    tier2_months: Option<u32>,
    tier2_return: Option<f64>,
    stocks_principal: Option<f64>,
    dividend_yield: Option<f64>,
    funds_principal: Option<f64>,
    tier3_return: Option<f64>,
}

impl BucketPayload {
    pub fn apply(self, args: &mut BucketArgs) {
        if let Some(v) = self.monthly_requirement {
            args.monthly_requirement = v;
        }
        if let Some(v) = self.inflation {
            args.inflation = v;
        }
        if let Some(v) = self.tier1_months {
            args.tier1_months = v;
        }
        if let Some(v) = self.tier1_return {
            args.tier1_return = v;
        }
        if let Some(v) = self.tier2_months {
            args.tier2_months = v;
        }
        if let Some(v) = self.tier2_return {
            args.tier2_return = v;
        }
        if let Some(v) = self.stocks_principal {
            args.stocks_principal = v;
        }
        if let Some(v) = self.dividend_yield {
            args.dividend_yield = v;
        }
        if let Some(v) = self.funds_principal {
            args.funds_principal = v;
        }
        if let Some(v) = self.tier3_return {
            args.tier3_return = v;
        }
    }
}

pub fn build_bucket_inputs(args: &BucketArgs) -> Result<BucketInputs, String> {
    let inputs = BucketInputs {
        monthly_requirement: args.monthly_requirement,
        inflation_pct: args.inflation,
        tier1_duration_months: args.tier1_months,
        tier1_return_pct: args.tier1_return,
        tier2_duration_months: args.tier2_months,
        tier2_return_pct: args.tier2_return,
        tier3a_principal: args.stocks_principal,
        tier3a_dividend_yield_pct: args.dividend_yield,
        tier3b_principal: args.funds_principal,
        tier3_return_pct: args.tier3_return,
    };
    inputs.validate().map_err(|e| e.to_string())?;
    Ok(inputs)
}

/// Parses `AMOUNT@YEAR`, e.g. `500000@3`.
fn parse_lumpsum(raw: &str) -> Result<YearLumpsum, String> {
    let (amount, year) = raw
        .split_once('@')
        .ok_or_else(|| format!("expected AMOUNT@YEAR, got {raw:?}"))?;
    let amount = amount
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid lumpsum amount {amount:?}: {e}"))?;
    let year = year
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid lumpsum year {year:?}: {e}"))?;
    Ok(YearLumpsum { amount, year })
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct SipArgs {
    #[arg(long, default_value_t = 10_000_000.0)]
    pub initial_investment: f64,
    #[arg(long, default_value_t = 60_000.0)]
    pub monthly_sip: f64,
    #[arg(long, default_value_t = 5.0, help = "Annual SIP step-up in percent")]
    pub step_up: f64,
    #[arg(long, default_value_t = 12.0, help = "Expected annual return in percent")]
    pub expected_return: f64,
    #[arg(long, default_value_t = 10, help = "Years of monthly contributions")]
    pub sip_years: u32,
    #[arg(long, default_value_t = 20, help = "Total investment horizon in years")]
    pub invest_years: u32,
    #[arg(
        long = "lumpsum",
        value_parser = parse_lumpsum,
        help = "One-time deposit as AMOUNT@YEAR; repeatable"
    )]
    pub lumpsums: Vec<YearLumpsum>,
}

impl Default for SipArgs {
    fn default() -> Self {
        Self {
            initial_investment: 10_000_000.0,
            monthly_sip: 60_000.0,
            step_up: 5.0,
            expected_return: 12.0,
            sip_years: 10,
            invest_years: 20,
            lumpsums: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SipPayload {
    initial_investment: Option<f64>,
    monthly_sip: Option<f64>,
    step_up: Option<f64>,
    expected_return: Option<f64>,
    sip_years: Option<u32>,
    invest_years: Option<u32>,
    lumpsums: Option<Vec<YearLumpsum>>,
}

impl SipPayload {
    pub fn apply(self, args: &mut SipArgs) {
        if let Some(v) = self.initial_investment {
            args.initial_investment = v;
        }
        if let Some(v) = self.monthly_sip {
            args.monthly_sip = v;
        }
        if let Some(v) = self.step_up {
            args.step_up = v;
        }
        if let Some(v) = self.expected_return {
            args.expected_return = v;
        }
        if let Some(v) = self.sip_years {
            args.sip_years = v;
        }
        if let Some(v) = self.invest_years {
            args.invest_years = v;
        }
        if let Some(v) = self.lumpsums {
            args.lumpsums = v;
        }
    }
}

pub fn build_sip_inputs(args: &SipArgs) -> Result<SipInputs, String> {
    if args.invest_years == 0 {
        return Err("--invest-years must be > 0".to_string());
    }
    Ok(SipInputs {
        initial_investment: args.initial_investment,
        monthly_sip: args.monthly_sip,
        step_up_pct: args.step_up,
        expected_return_pct: args.expected_return,
        sip_years: args.sip_years,
        invest_years: args.invest_years,
        lumpsums: args.lumpsums.clone(),
    })
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct FireArgs {
    #[arg(long, default_value_t = 30)]
    pub age: u32,
    #[arg(long, default_value_t = 2_000.0)]
    pub monthly_expense: f64,
    #[arg(long, default_value_t = 5.0, help = "Annual inflation in percent")]
    pub inflation: f64,
    #[arg(long, default_value_t = 25_000.0)]
    pub current_investment: f64,
    #[arg(long, default_value_t = 1_000.0)]
    pub sip_monthly: f64,
    #[arg(long, default_value_t = 10.0, help = "Annual SIP step-up in percent")]
    pub step_up: f64,
    #[arg(long, default_value_t = 10.0, help = "Expected annual return in percent")]
    pub cagr: f64,
    #[arg(long, default_value_t = 60, help = "Years to simulate before giving up")]
    pub horizon_years: u32,
}

impl Default for FireArgs {
    fn default() -> Self {
        Self {
            age: 30,
            monthly_expense: 2_000.0,
            inflation: 5.0,
            current_investment: 25_000.0,
            sip_monthly: 1_000.0,
            step_up: 10.0,
            cagr: 10.0,
            horizon_years: 60,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FirePayload {
    age: Option<u32>,
    monthly_expense: Option<f64>,
    inflation: Option<f64>,
    current_investment: Option<f64>,
    sip_monthly: Option<f64>,
    step_up: Option<f64>,
    cagr: Option<f64>,
    horizon_years: Option<u32>,
}

impl FirePayload {
    pub fn apply(self, args: &mut FireArgs) {
        if let Some(v) = self.age {
            args.age = v;
        }
        if let Some(v) = self.monthly_expense {
            args.monthly_expense = v;
        }
        if let Some(v) = self.inflation {
            args.inflation = v;
        }
        if let Some(v) = self.current_investment {
            args.current_investment = v;
        }
        if let Some(v) = self.sip_monthly {
            args.sip_monthly = v;
        }
        if let Some(v) = self.step_up {
            args.step_up = v;
        }
        if let Some(v) = self.cagr {
            args.cagr = v;
        }
        if let Some(v) = self.horizon_years {
            args.horizon_years = v;
        }
    }
}

pub fn build_fire_inputs(args: &FireArgs) -> FireInputs {
    FireInputs {
        current_age: args.age,
        monthly_expense: args.monthly_expense,
        inflation_pct: args.inflation,
        current_investment: args.current_investment,
        sip_monthly: args.sip_monthly,
        step_up_pct: args.step_up,
        expected_return_pct: args.cagr,
        horizon_years: args.horizon_years,
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CliGoalType {
    RequiredCorpus,
    MaxRequirement,
}

impl From<CliGoalType> for GoalType {
    fn from(value: CliGoalType) -> Self {
        match value {
            CliGoalType::RequiredCorpus => GoalType::RequiredCorpus,
            CliGoalType::MaxRequirement => GoalType::MaxRequirement,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct SolveArgs {
    #[command(flatten)]
    pub bucket: BucketArgs,
    #[arg(long, value_enum, default_value_t = CliGoalType::RequiredCorpus)]
    pub goal: CliGoalType,
    #[arg(long, default_value_t = 30, help = "Years the corpus must last")]
    pub target_years: u32,
    #[arg(long, help = "Lower search bound; defaults depend on --goal")]
    pub search_min: Option<f64>,
    #[arg(long, help = "Upper search bound; defaults depend on --goal")]
    pub search_max: Option<f64>,
    #[arg(long, default_value_t = 100.0)]
    pub tolerance: f64,
    #[arg(long, default_value_t = 60)]
    pub max_iterations: u32,
}

impl Default for SolveArgs {
    fn default() -> Self {
        Self {
            bucket: BucketArgs::default(),
            goal: CliGoalType::RequiredCorpus,
            target_years: 30,
            search_min: None,
            search_max: None,
            tolerance: 100.0,
            max_iterations: 60,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolvePayload {
    #[serde(flatten)]
    bucket: BucketPayload,
    goal: Option<CliGoalType>,
    target_years: Option<u32>,
    search_min: Option<f64>,
    search_max: Option<f64>,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
}

impl SolvePayload {
    pub fn apply(self, args: &mut SolveArgs) {
        self.bucket.apply(&mut args.bucket);
        if let Some(v) = self.goal {
            args.goal = v;
        }
        if let Some(v) = self.target_years {
            args.target_years = v;
        }
        if self.search_min.is_some() {
            args.search_min = self.search_min;
        }
        if self.search_max.is_some() {
            args.search_max = self.search_max;
        }
        if let Some(v) = self.tolerance {
            args.tolerance = v;
        }
        if let Some(v) = self.max_iterations {
            args.max_iterations = v;
        }
    }
}

pub fn build_solve_request(args: &SolveArgs) -> Result<(BucketInputs, GoalSolveConfig), String> {
    let inputs = build_bucket_inputs(&args.bucket)?;
    let (default_min, default_max) = match args.goal {
        CliGoalType::RequiredCorpus => (0.0, 1_000_000_000.0),
        CliGoalType::MaxRequirement => (1.0, 10_000_000.0),
    };
    let config = GoalSolveConfig {
        goal_type: args.goal.into(),
        target_years: args.target_years,
        search_min: args.search_min.unwrap_or(default_min),
        search_max: args.search_max.unwrap_or(default_max),
        tolerance: args.tolerance,
        max_iterations: args.max_iterations,
    };
    Ok((inputs, config))
}

#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct InputFileArgs {
    #[arg(long, help = "JSON request file; built-in defaults when omitted")]
    pub input: Option<PathBuf>,
}

impl InputFileArgs {
    pub fn load<T>(&self) -> Result<T, String>
    where
        T: for<'de> Deserialize<'de> + Default,
    {
        let Some(path) = &self.input else {
            return Ok(T::default());
        };
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        serde_json::from_str(&raw).map_err(|e| format!("invalid JSON in {}: {e}", path.display()))
    }
}
