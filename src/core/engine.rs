use super::plan::STANDARD_PLAN;
use super::types::{
    CommissionPlan, CommissionType, Comparison, SimulationClient, SimulationResult, Tier,
};

const TRANSFER_STEP: f64 = 100.0;
const WAVE_ITERATION_FREQ: f64 = 3.7;
const WAVE_TIER_PHASE: f64 = 2.1;
const WAVE_AMPLITUDE: f64 = 0.35;
const WAVE_CENTER: f64 = 0.5;

#[derive(Debug)]
struct GenerationState {
    remaining: f64,
    total_transfer: f64,
    bonus_step: Option<usize>,
    clients: Vec<SimulationClient>,
}

pub fn simulate(
    target_commission: f64,
    locked_tier: Option<usize>,
    commission_type: CommissionType,
) -> Vec<SimulationResult> {
    simulate_with_plan(&STANDARD_PLAN, target_commission, locked_tier, commission_type)
}

// Callers clamp the target to a finite, non-negative amount. A lock outside
// the tier table matches nothing.
pub fn simulate_with_plan(
    plan: &CommissionPlan,
    target_commission: f64,
    locked_tier: Option<usize>,
    commission_type: CommissionType,
) -> Vec<SimulationResult> {
    plan.tiers
        .iter()
        .enumerate()
        .filter(|(tier_index, _)| locked_tier.is_none_or(|locked| locked == *tier_index))
        .map(|(tier_index, tier)| {
            simulate_tier(plan, tier_index, tier, target_commission, commission_type)
        })
        .collect()
}

pub fn compare(target_commission: f64, locked_tier: Option<usize>) -> Comparison {
    Comparison {
        flow: simulate(target_commission, locked_tier, CommissionType::Flow),
        balance: simulate(target_commission, locked_tier, CommissionType::Balance),
    }
}

fn simulate_tier(
    plan: &CommissionPlan,
    tier_index: usize,
    tier: &Tier,
    target_commission: f64,
    commission_type: CommissionType,
) -> SimulationResult {
    let rate = tier.rate(commission_type);
    let span = transfer_span(plan, tier);
    let mut state = GenerationState {
        remaining: target_commission,
        total_transfer: 0.0,
        bonus_step: None,
        clients: Vec::new(),
    };

    let mut iteration = 0;
    while state.remaining > 0.0 && iteration < plan.max_iterations {
        let transfer_amount = synthetic_transfer(tier, span, tier_index, iteration);
        let commission = transfer_amount * rate;
        state.clients.push(SimulationClient {
            transfer_amount,
            commission,
        });
        state.total_transfer += transfer_amount;
        state.remaining -= commission;

        if commission_type == CommissionType::Flow
            && state.bonus_step.is_none()
            && state.total_transfer >= plan.bonus_threshold
        {
            state.remaining -= plan.bonus_amount;
            state.bonus_step = Some(iteration);
        }
        iteration += 1;
    }

    let target_met = state.remaining <= 0.0;
    if !target_met {
        log::debug!(
            "{} {:?}: stopped at {} clients with {:.2} commission outstanding",
            tier.label,
            commission_type,
            state.clients.len(),
            state.remaining
        );
    }

    let bonus_applied = state.bonus_step.is_some();
    let total_commission = state
        .clients
        .iter()
        .fold(0.0, |sum, client| sum + client.commission)
        + if bonus_applied { plan.bonus_amount } else { 0.0 };

    SimulationResult {
        tier_index,
        tier: *tier,
        rate,
        total_transfer: state.total_transfer,
        total_commission,
        bonus_applied,
        bonus_step: state.bonus_step,
        meta_percent: (state.total_transfer / plan.advisor_goal) * 100.0,
        commission_type,
        target_met,
        clients: state.clients,
    }
}

fn transfer_span(plan: &CommissionPlan, tier: &Tier) -> f64 {
    match tier.max {
        Some(max) => max - tier.min,
        None => plan.unbounded_span,
    }
}

// Stays within [0.15, 0.85].
fn wave(iteration: usize, tier_index: usize) -> f64 {
    (iteration as f64 * WAVE_ITERATION_FREQ + tier_index as f64 * WAVE_TIER_PHASE).sin()
        * WAVE_AMPLITUDE
        + WAVE_CENTER
}

fn synthetic_transfer(tier: &Tier, span: f64, tier_index: usize, iteration: usize) -> f64 {
    let raw = tier.min + span * wave(iteration, tier_index);
    let rounded = round_half_up(raw / TRANSFER_STEP) * TRANSFER_STEP;
    rounded.max(tier.min)
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plan::{
        BONUS_AMOUNT, BONUS_THRESHOLD, MAX_ITERATIONS, TIERS, UNBOUNDED_SPAN,
    };
    use proptest::prelude::{Just, prop_assert, prop_assert_eq, prop_oneof, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn transfers(result: &SimulationResult) -> Vec<f64> {
        result.clients.iter().map(|c| c.transfer_amount).collect()
    }

    fn net_commission(result: &SimulationResult, clients: usize) -> f64 {
        let earned: f64 = result.clients[..clients]
            .iter()
            .fold(0.0, |sum, c| sum + c.commission);
        match result.bonus_step {
            Some(step) if step < clients => earned + BONUS_AMOUNT,
            _ => earned,
        }
    }

    fn assert_result_invariants(result: &SimulationResult) {
        assert!(result.clients.len() <= MAX_ITERATIONS);

        let transfer_sum: f64 = result.clients.iter().map(|c| c.transfer_amount).sum();
        assert_approx(result.total_transfer, transfer_sum);

        let commission_sum = result.clients.iter().fold(0.0, |s, c| s + c.commission);
        let bonus = if result.bonus_applied { BONUS_AMOUNT } else { 0.0 };
        assert_approx(result.total_commission, commission_sum + bonus);

        assert_eq!(result.bonus_applied, result.bonus_step.is_some());
        if result.bonus_applied {
            assert_eq!(result.commission_type, CommissionType::Flow);
        }

        assert_approx(
            result.meta_percent,
            result.total_transfer / STANDARD_PLAN.advisor_goal * 100.0,
        );

        let tier = &TIERS[result.tier_index];
        assert_eq!(result.tier, *tier);
        assert_eq!(result.rate, tier.rate(result.commission_type));
        for client in &result.clients {
            assert_eq!(client.transfer_amount % 100.0, 0.0);
            assert!(client.transfer_amount >= tier.min);
            assert_eq!(client.commission, client.transfer_amount * result.rate);
        }
    }

    fn commission_type_strategy() -> impl proptest::strategy::Strategy<Value = CommissionType> {
        prop_oneof![Just(CommissionType::Flow), Just(CommissionType::Balance)]
    }

    fn lock_strategy() -> impl proptest::strategy::Strategy<Value = Option<usize>> {
        prop_oneof![Just(None), Just(Some(0)), Just(Some(1)), Just(Some(2))]
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_results_respect_totals_bonus_and_bound(
            target in 0u32..400_000,
            locked_tier in lock_strategy(),
            commission_type in commission_type_strategy()
        ) {
            let results = simulate(target as f64, locked_tier, commission_type);
            prop_assert_eq!(results.len(), if locked_tier.is_some() { 1 } else { 3 });
            for result in &results {
                prop_assert_eq!(result.commission_type, commission_type);
                assert_result_invariants(result);
            }
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_reruns_are_bit_identical(
            target in 0u32..200_000,
            locked_tier in lock_strategy(),
            commission_type in commission_type_strategy()
        ) {
            let first = simulate(target as f64, locked_tier, commission_type);
            let second = simulate(target as f64, locked_tier, commission_type);
            prop_assert_eq!(first.len(), second.len());
            for (a, b) in first.iter().zip(second.iter()) {
                prop_assert_eq!(&a.clients, &b.clients);
                prop_assert_eq!(a.total_transfer.to_bits(), b.total_transfer.to_bits());
                prop_assert_eq!(a.total_commission.to_bits(), b.total_commission.to_bits());
                prop_assert_eq!(a.bonus_step, b.bonus_step);
            }
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_generation_stops_on_the_first_client_that_meets_the_target(
            target in 1u32..60_000,
            tier_index in 0usize..3,
            commission_type in commission_type_strategy()
        ) {
            let target = target as f64;
            let results = simulate(target, Some(tier_index), commission_type);
            let result = &results[0];
            prop_assert!(!result.clients.is_empty());
            if result.target_met {
                let n = result.clients.len();
                prop_assert!(net_commission(result, n) >= target - EPS);
                prop_assert!(net_commission(result, n - 1) < target + EPS);
            } else {
                prop_assert_eq!(result.clients.len(), MAX_ITERATIONS);
            }

            let mut running = 0.0;
            for (step, client) in result.clients.iter().enumerate() {
                let previous = running;
                running += client.transfer_amount;
                prop_assert!(running >= previous);
                if result.bonus_step == Some(step) {
                    prop_assert!(previous < BONUS_THRESHOLD);
                    prop_assert!(running >= BONUS_THRESHOLD);
                }
            }
        }
    }

    #[test]
    fn unlocked_simulation_returns_every_tier_in_order() {
        let results = simulate(10_000.0, None, CommissionType::Balance);
        let indices: Vec<usize> = results.iter().map(|r| r.tier_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn locked_simulation_returns_only_that_tier() {
        for tier_index in 0..TIERS.len() {
            let results = simulate(10_000.0, Some(tier_index), CommissionType::Flow);
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].tier_index, tier_index);
        }
    }

    #[test]
    fn lock_outside_the_table_matches_nothing() {
        assert!(simulate(10_000.0, Some(3), CommissionType::Flow).is_empty());
    }

    #[test]
    fn zero_target_produces_empty_results() {
        let results = simulate(0.0, None, CommissionType::Flow);
        assert_eq!(results.len(), 3);
        for result in &results {
            assert!(result.clients.is_empty());
            assert_eq!(result.total_transfer, 0.0);
            assert_eq!(result.total_commission, 0.0);
            assert_eq!(result.meta_percent, 0.0);
            assert!(!result.bonus_applied);
            assert!(result.target_met);
        }
    }

    #[test]
    fn oracle_middle_tier_flow_matches_hand_calculation() {
        let results = simulate(10_000.0, Some(1), CommissionType::Flow);
        let result = &results[0];
        assert_eq!(
            transfers(result),
            vec![
                11_400.0, 10_000.0, 10_400.0, 11_100.0, 9_500.0, 11_500.0, 9_700.0, 10_800.0,
                10_800.0, 9_700.0, 11_500.0, 9_500.0, 11_100.0,
            ]
        );
        assert_approx(result.total_transfer, 137_000.0);
        assert_approx(result.total_commission, 137_000.0 * 0.07 + BONUS_AMOUNT);
        assert!(result.bonus_applied);
        // 73_600 after the seventh client; 63_900 before it.
        assert_eq!(result.bonus_step, Some(6));
        assert_approx(result.meta_percent, 137_000.0 / 130_000.0 * 100.0);
        assert!(result.target_met);
        assert_result_invariants(result);
    }

    #[test]
    fn oracle_middle_tier_balance_never_earns_the_bonus() {
        let results = simulate(10_000.0, Some(1), CommissionType::Balance);
        let result = &results[0];
        assert_eq!(result.clients.len(), 28);
        assert_approx(result.total_transfer, 294_900.0);
        assert!(!result.bonus_applied);
        assert_eq!(result.bonus_step, None);
        assert_eq!(result.rate, 0.035);
    }

    #[test]
    fn oracle_lowest_tier_small_target_stays_below_bonus_threshold() {
        let results = simulate(3_000.0, Some(0), CommissionType::Flow);
        let result = &results[0];
        assert_eq!(
            transfers(result),
            vec![7_000.0, 6_300.0, 8_300.0, 5_600.0, 8_100.0, 6_500.0, 6_700.0, 8_000.0]
        );
        assert_approx(result.total_transfer, 56_500.0);
        assert_approx(result.total_commission, 3_390.0);
        assert!(!result.bonus_applied);
    }

    #[test]
    fn top_tier_uses_the_fallback_span() {
        let results = simulate(5_000.0, Some(2), CommissionType::Balance);
        let result = &results[0];
        assert_eq!(
            transfers(result),
            vec![
                13_600.0, 18_800.0, 13_700.0, 17_100.0, 16_400.0, 14_200.0, 18_700.0, 13_300.0,
            ]
        );
        for client in &result.clients {
            assert!(client.transfer_amount <= TIERS[2].min + UNBOUNDED_SPAN);
        }
    }

    #[test]
    fn huge_target_stops_at_the_iteration_cap() {
        let results = simulate(1e9, Some(0), CommissionType::Balance);
        let result = &results[0];
        assert_eq!(result.clients.len(), MAX_ITERATIONS);
        assert!(!result.target_met);
        assert_approx(result.total_transfer, 2_100_100.0);
        assert!(result.total_commission < 1e9);
    }

    #[test]
    fn custom_plan_caps_iterations() {
        let plan = CommissionPlan {
            max_iterations: 5,
            ..STANDARD_PLAN
        };
        let results = simulate_with_plan(&plan, 1e6, None, CommissionType::Flow);
        assert_eq!(results.len(), 3);
        for result in &results {
            assert_eq!(result.clients.len(), 5);
            assert!(!result.target_met);
        }
    }

    #[test]
    fn bonus_threshold_of_plan_is_honored() {
        let plan = CommissionPlan {
            bonus_threshold: 0.0,
            ..STANDARD_PLAN
        };
        let results = simulate_with_plan(&plan, 500.0, Some(0), CommissionType::Flow);
        let result = &results[0];
        assert_eq!(result.bonus_step, Some(0));
        assert_eq!(result.clients.len(), 1);
        assert_approx(result.total_commission, 7_000.0 * 0.06 + BONUS_AMOUNT);
    }

    #[test]
    fn compare_runs_both_commission_types_over_the_same_lock() {
        let comparison = compare(10_000.0, Some(1));
        assert_eq!(comparison.flow.len(), 1);
        assert_eq!(comparison.balance.len(), 1);
        assert_eq!(comparison.flow[0].commission_type, CommissionType::Flow);
        assert_eq!(comparison.balance[0].commission_type, CommissionType::Balance);
        assert!(comparison.flow[0].clients.len() < comparison.balance[0].clients.len());
    }

    #[test]
    fn wave_stays_within_its_band() {
        for tier_index in 0..3 {
            for iteration in 0..MAX_ITERATIONS {
                let w = wave(iteration, tier_index);
                assert!((0.15 - EPS..=0.85 + EPS).contains(&w));
            }
        }
    }

    #[test]
    fn round_half_up_rounds_halves_upward() {
        assert_eq!(round_half_up(94.5), 95.0);
        assert_eq!(round_half_up(94.49), 94.0);
        assert_eq!(round_half_up(70.0), 70.0);
    }
}
