mod engine;
mod plan;
mod types;

pub use engine::{compare, simulate, simulate_with_plan};
pub use plan::{
    ADVISOR_GOAL, BONUS_AMOUNT, BONUS_THRESHOLD, MAX_ITERATIONS, STANDARD_PLAN, TIERS,
    UNBOUNDED_SPAN,
};
pub use types::{
    CommissionPlan, CommissionType, Comparison, SimulationClient, SimulationResult, Tier,
};
