use super::types::{CommissionPlan, Tier};

pub const TIERS: [Tier; 3] = [
    Tier {
        min: 5_000.0,
        max: Some(8_999.0),
        flow_rate: 0.06,
        balance_rate: 0.03,
        label: "Rango I",
    },
    Tier {
        min: 9_000.0,
        max: Some(12_000.0),
        flow_rate: 0.07,
        balance_rate: 0.035,
        label: "Rango II",
    },
    Tier {
        min: 12_001.0,
        max: None,
        flow_rate: 0.08,
        balance_rate: 0.04,
        label: "Rango III",
    },
];

pub const BONUS_THRESHOLD: f64 = 70_000.0;
pub const BONUS_AMOUNT: f64 = 1_000.0;
pub const ADVISOR_GOAL: f64 = 130_000.0;
pub const UNBOUNDED_SPAN: f64 = 8_000.0;
pub const MAX_ITERATIONS: usize = 300;

pub const STANDARD_PLAN: CommissionPlan = CommissionPlan {
    tiers: &TIERS,
    bonus_threshold: BONUS_THRESHOLD,
    bonus_amount: BONUS_AMOUNT,
    advisor_goal: ADVISOR_GOAL,
    unbounded_span: UNBOUNDED_SPAN,
    max_iterations: MAX_ITERATIONS,
};
