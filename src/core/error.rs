use thiserror::Error;

/// Rejected calculator input. Raised before any simulation work starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must be {bound}, got {value}")]
    OutOfRange {
        field: &'static str,
        bound: &'static str,
        value: f64,
    },

    #[error("{field} must be >= {other} ({value} < {other_value})")]
    Ordering {
        field: &'static str,
        other: &'static str,
        value: f64,
        other_value: f64,
    },

    #[error("{label} target age ({target_age}) must be greater than current age ({current_age})")]
    MilestoneNotInFuture {
        label: String,
        target_age: f64,
        current_age: f64,
    },

    #[error(
        "projection horizon ({horizon_years} years) must extend past the latest milestone ({milestone_years} years)"
    )]
    HorizonBeforeMilestone {
        horizon_years: u32,
        milestone_years: f64,
    },
}

pub(crate) fn finite(field: &'static str, value: f64) -> Result<f64, InputError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InputError::NotFinite { field })
    }
}

pub(crate) fn non_negative(field: &'static str, value: f64) -> Result<f64, InputError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(InputError::OutOfRange {
            field,
            bound: ">= 0",
            value,
        });
    }
    Ok(value)
}

pub(crate) fn positive(field: &'static str, value: f64) -> Result<f64, InputError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(InputError::OutOfRange {
            field,
            bound: "> 0",
            value,
        });
    }
    Ok(value)
}

/// Growth rates in percent: anything that keeps `1 + pct/100` positive.
pub(crate) fn growth_pct(field: &'static str, value: f64) -> Result<f64, InputError> {
    finite(field, value)?;
    if value <= -100.0 {
        return Err(InputError::OutOfRange {
            field,
            bound: "> -100",
            value,
        });
    }
    Ok(value)
}
