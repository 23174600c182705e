use serde::{Deserialize, Serialize};

use super::error::{InputError, non_negative};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Frequency {
    Monthly,
    Quarterly,
    HalfYearly,
    Annual,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::HalfYearly,
        Frequency::Annual,
    ];

    pub fn periods_per_year(self) -> f64 {
        match self {
            Frequency::Monthly => 12.0,
            Frequency::Quarterly => 4.0,
            Frequency::HalfYearly => 2.0,
            Frequency::Annual => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseItem {
    pub name: String,
    /// Amount paid once per period, in today's money.
    pub amount: f64,
    pub inflation_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCategory {
    pub name: String,
    pub items: Vec<ExpenseItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpenseGroup {
    pub categories: Vec<ExpenseCategory>,
    /// Emergency margin added on top of the group's total.
    pub buffer_pct: f64,
}

impl Default for ExpenseGroup {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            buffer_pct: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpenseInputs {
    pub monthly: ExpenseGroup,
    pub quarterly: ExpenseGroup,
    pub half_yearly: ExpenseGroup,
    pub annual: ExpenseGroup,
    pub years_to_retirement: f64,
    pub fire_multiplier: f64,
}

fn item(name: &str, amount: f64, inflation_pct: f64) -> ExpenseItem {
    ExpenseItem {
        name: name.to_string(),
        amount,
        inflation_pct,
    }
}

fn category(name: &str, items: Vec<ExpenseItem>) -> ExpenseCategory {
    ExpenseCategory {
        name: name.to_string(),
        items,
    }
}

impl Default for ExpenseInputs {
    fn default() -> Self {
        Self {
            monthly: ExpenseGroup {
                categories: vec![
                    category(
                        "Housing & Home",
                        vec![
                            item("Groceries", 5_000.0, 5.0),
                            item("Vegetables", 5_000.0, 5.0),
                            item("Gas (Utilities)", 1_000.0, 4.0),
                            item("Internet & TV", 1_000.0, 3.0),
                        ],
                    ),
                    category(
                        "Transportation",
                        vec![
                            item("Car Fuel", 3_000.0, 6.0),
                            item("Bike Fuel", 1_500.0, 6.0),
                        ],
                    ),
                    category(
                        "Health",
                        vec![
                            item("Health Insurance", 4_000.0, 8.0),
                            item("Medicine", 5_000.0, 7.0),
                        ],
                    ),
                ],
                buffer_pct: 30.0,
            },
            quarterly: ExpenseGroup {
                categories: vec![
                    category("Utilities", vec![item("Electricity", 10_000.0, 5.0)]),
                    category("Travel", vec![item("Vacation", 50_000.0, 6.0)]),
                ],
                buffer_pct: 30.0,
            },
            half_yearly: ExpenseGroup {
                categories: vec![category(
                    "Vehicle Maintenance",
                    vec![
                        item("Car Maintenance", 6_000.0, 5.0),
                        item("Bike Maintenance", 1_500.0, 5.0),
                    ],
                )],
                buffer_pct: 50.0,
            },
            annual: ExpenseGroup {
                categories: vec![
                    category(
                        "Insurance",
                        vec![
                            item("Car Insurance", 6_000.0, 6.0),
                            item("Bike Insurance", 1_500.0, 6.0),
                        ],
                    ),
                    category("Housing", vec![item("Housing Maintenance", 50_000.0, 5.0)]),
                ],
                buffer_pct: 50.0,
            },
            years_to_retirement: 20.0,
            fire_multiplier: 25.0,
        }
    }
}

impl ExpenseInputs {
    pub fn group(&self, frequency: Frequency) -> &ExpenseGroup {
        match frequency {
            Frequency::Monthly => &self.monthly,
            Frequency::Quarterly => &self.quarterly,
            Frequency::HalfYearly => &self.half_yearly,
            Frequency::Annual => &self.annual,
        }
    }

    pub fn validate(&self) -> Result<(), InputError> {
        non_negative("yearsToRetirement", self.years_to_retirement)?;
        non_negative("fireMultiplier", self.fire_multiplier)?;
        for frequency in Frequency::ALL {
            let group = self.group(frequency);
            non_negative("bufferPct", group.buffer_pct)?;
            for item in group.categories.iter().flat_map(|c| &c.items) {
                non_negative("expenseAmount", item.amount)?;
                non_negative("expenseInflationPct", item.inflation_pct)?;
            }
        }
        Ok(())
    }
}

/// Annualized totals of one frequency group, buffer included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTotals {
    pub frequency: Frequency,
    pub buffer_pct: f64,
    pub current_annual: f64,
    pub future_annual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub groups: Vec<GroupTotals>,
    pub current_annual: f64,
    pub future_annual: f64,
    pub fire_number: f64,
    /// Growth of the annual total in percent. `None` when nothing is spent today.
    pub inflation_impact_pct: Option<f64>,
    pub additional_annual_need: f64,
}

fn group_totals(frequency: Frequency, group: &ExpenseGroup, years: f64) -> GroupTotals {
    let mut current = 0.0;
    let mut future = 0.0;
    for item in group.categories.iter().flat_map(|c| &c.items) {
        let annual = item.amount * frequency.periods_per_year();
        current += annual;
        future += annual * (1.0 + item.inflation_pct / 100.0).powf(years);
    }
    let buffer = 1.0 + group.buffer_pct / 100.0;
    GroupTotals {
        frequency,
        buffer_pct: group.buffer_pct,
        current_annual: current * buffer,
        future_annual: future * buffer,
    }
}

pub fn summarize_expenses(inputs: &ExpenseInputs) -> Result<ExpenseSummary, InputError> {
    inputs.validate()?;

    let groups: Vec<GroupTotals> = Frequency::ALL
        .into_iter()
        .map(|f| group_totals(f, inputs.group(f), inputs.years_to_retirement))
        .collect();
    let current_annual: f64 = groups.iter().map(|g| g.current_annual).sum();
    let future_annual: f64 = groups.iter().map(|g| g.future_annual).sum();

    let inflation_impact_pct =
        (current_annual > 0.0).then(|| (future_annual - current_annual) / current_annual * 100.0);

    Ok(ExpenseSummary {
        groups,
        current_annual,
        future_annual,
        fire_number: future_annual * inputs.fire_multiplier,
        inflation_impact_pct,
        additional_annual_need: future_annual - current_annual,
    })
}
