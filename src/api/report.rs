use std::fmt::{self, Write};

use crate::core::{
    ADVISOR_GOAL, BONUS_AMOUNT, BONUS_THRESHOLD, CommissionType, Comparison, SimulationResult,
    Tier,
};

pub fn format_amount(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}S/ {grouped}.{:02}", cents % 100)
}

pub fn format_rate(rate: f64, commission_type: CommissionType) -> String {
    match commission_type {
        CommissionType::Flow => format!("{:.0}%", rate * 100.0),
        CommissionType::Balance => format!("{:.1}%", rate * 100.0),
    }
}

fn commission_type_label(commission_type: CommissionType) -> &'static str {
    match commission_type {
        CommissionType::Flow => "Flow",
        CommissionType::Balance => "Balance",
    }
}

fn tier_range(tier: &Tier) -> String {
    match tier.max {
        Some(max) => format!("{} - {}", format_amount(tier.min), format_amount(max)),
        None => format!("{} and above", format_amount(tier.min)),
    }
}

pub fn render_results(
    results: &[SimulationResult],
    details: bool,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    for result in results {
        render_result(&mut out, result, details)?;
        out.push('\n');
    }
    Ok(out)
}

fn render_result(out: &mut String, result: &SimulationResult, details: bool) -> fmt::Result {
    writeln!(
        out,
        "{}  {}  {} {}",
        result.tier.label,
        tier_range(&result.tier),
        format_rate(result.rate, result.commission_type),
        commission_type_label(result.commission_type)
    )?;
    writeln!(out, "  Clients:           {}", result.clients.len())?;
    writeln!(
        out,
        "  Total commission:  {}",
        format_amount(result.total_commission)
    )?;
    writeln!(
        out,
        "  Total transfer:    {}",
        format_amount(result.total_transfer)
    )?;
    writeln!(
        out,
        "  Goal {}: {:.1}%",
        format_amount(ADVISOR_GOAL),
        result.meta_percent
    )?;
    if let Some(step) = result.bonus_step {
        writeln!(
            out,
            "  Bonus of {} applied: flow transfer passed {} at client {:02}",
            format_amount(BONUS_AMOUNT),
            format_amount(BONUS_THRESHOLD),
            step + 1
        )?;
    }
    if !result.target_met {
        writeln!(
            out,
            "  Target not reached within {} clients",
            result.clients.len()
        )?;
    }

    if details && !result.clients.is_empty() {
        writeln!(out, "  {:<5}{:>18}{:>16}", "No.", "Transfer", "Commission")?;
        for (i, client) in result.clients.iter().enumerate() {
            writeln!(
                out,
                "  {:<5}{:>18}{:>16}",
                format!("{:02}", i + 1),
                format_amount(client.transfer_amount),
                format_amount(client.commission)
            )?;
        }
    }
    Ok(())
}

pub fn render_comparison(comparison: &Comparison) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "Flow vs balance")?;
    writeln!(
        out,
        "{:<11}{:>6}{:>9}{:>16}  {:>6}{:>9}{:>16}",
        "Tier", "Flow", "Clients", "Total", "Bal.", "Clients", "Total"
    )?;
    for (flow, balance) in comparison.flow.iter().zip(comparison.balance.iter()) {
        writeln!(
            out,
            "{:<11}{:>6}{:>9}{:>16}  {:>6}{:>9}{:>16}",
            flow.tier.label,
            format_rate(flow.rate, CommissionType::Flow),
            flow.clients.len(),
            format_amount(flow.total_commission),
            format_rate(balance.rate, CommissionType::Balance),
            balance.clients.len(),
            format_amount(balance.total_commission)
        )?;
    }
    Ok(out)
}
