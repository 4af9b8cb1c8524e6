//! Compare rule revisions on the cards where they disagree

use chip_billing_core::{
    BillingPeriod, EligibilityEngine, RuleSet, RuleVersion, SimRecord, SimStatus,
};
use chrono::NaiveDate;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("📏 Chip Billing Core - Rule Versions Example\n");

    let period = BillingPeriod::parse("2025-04")?;
    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);

    let cards = vec![
        (
            "suspended, loyalty deadline in May",
            SimRecord::new("8955010000000000001".to_string(), SimStatus::Suspenso)
                .with_dates(date(2025, 2, 10), None, date(2025, 3, 20)),
        ),
        (
            "suspended after the period",
            SimRecord::new("8955010000000000002".to_string(), SimStatus::Suspenso)
                .with_dates(date(2024, 6, 1), None, date(2025, 5, 5)),
        ),
        (
            "test chip outside every list",
            SimRecord::new("8955010000000000003".to_string(), SimStatus::NotInInternalDb)
                .with_membership(false, true),
        ),
    ];

    for version in RuleVersion::ALL {
        let engine = EligibilityEngine::new(RuleSet::new(version));
        println!("🔖 Rules {}:", version);
        for (label, card) in &cards {
            let decision = engine.evaluate(card, &period);
            println!(
                "  {:<36} {:<4} {}",
                label,
                if decision.billable { "SIM" } else { "NÃO" },
                decision.reason_label()
            );
        }
        println!();
    }

    println!("🔧 Rules v3 with late suspensions billed:");
    let engine = EligibilityEngine::new(RuleSet::new(RuleVersion::V3).with_suspension_after_period(true));
    let decision = engine.evaluate(&cards[1].1, &period);
    println!("  {:<36} {}", cards[1].0, if decision.billable { "SIM" } else { "NÃO" });

    Ok(())
}
