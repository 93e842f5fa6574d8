use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionType {
    Flow,
    Balance,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub min: f64,
    pub max: Option<f64>,
    pub flow_rate: f64,
    pub balance_rate: f64,
    pub label: &'static str,
}

impl Tier {
    pub fn rate(&self, commission_type: CommissionType) -> f64 {
        match commission_type {
            CommissionType::Flow => self.flow_rate,
            CommissionType::Balance => self.balance_rate,
        }
    }
}

#[derive(Copy, Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionPlan {
    pub tiers: &'static [Tier],
    pub bonus_threshold: f64,
    pub bonus_amount: f64,
    pub advisor_goal: f64,
    pub unbounded_span: f64,
    pub max_iterations: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationClient {
    pub transfer_amount: f64,
    pub commission: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub tier_index: usize,
    pub tier: Tier,
    pub rate: f64,
    pub clients: Vec<SimulationClient>,
    pub total_transfer: f64,
    pub total_commission: f64,
    pub bonus_applied: bool,
    pub bonus_step: Option<usize>,
    pub meta_percent: f64,
    pub commission_type: CommissionType,
    pub target_met: bool,
}

#[derive(Debug, Clone)]
pub struct Comparison {
    pub flow: Vec<SimulationResult>,
    pub balance: Vec<SimulationResult>,
}
