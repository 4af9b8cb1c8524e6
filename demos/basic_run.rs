//! Basic reconciliation run over in-memory tables

use chip_billing_core::{
    render_summary, BillingReconciliation, CsvDetailExporter, DatasetKind, DetailExporter,
    MemoryStorage, Table,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("📡 Chip Billing Core - Basic Run Example\n");

    // 1. Supply the four datasets
    println!("📥 Loading datasets...");
    let storage = MemoryStorage::new()
        .with_table(
            DatasetKind::SupplierRoster,
            Table::from_strings(
                &["Iccid"],
                &[
                    &["8955010000000000001"],
                    &["8955010000000000002"],
                    &["8955010000000000003"],
                    &["8955010000000000004"],
                    &["8955010000000000005"],
                ],
            ),
        )
        .with_table(
            DatasetKind::InternalDatabase,
            Table::from_strings(
                &["ICCID", "STATUS", "DATA DE ATIVAÇÃO", "DATA DE CANCELAMENTO", "DATA DE SUSPENSÃO"],
                &[
                    &["8955010000000000001", "ATIVO", "10/03/2025", "", ""],
                    &["8955010000000000002", "SUSPENSO", "15/01/2025", "", "10/02/2025"],
                    &["8955010000000000003", "EXTRAVIADO", "01/12/2024", "", ""],
                    &["8955010000000000004", "INATIVO", "", "", ""],
                ],
            ),
        )
        .with_table(
            DatasetKind::AcquisitionList,
            Table::from_strings(&["iccid"], &[&["8955010000000000005"]]),
        )
        .with_table(
            DatasetKind::TestChipList,
            Table::from_strings(&["ICCID"], &[&["8955010000000000004"]]),
        );
    println!("  ✓ Supplier roster, internal database, acquisition list, test chips\n");

    // 2. Reconcile April 2025 for VIVO
    println!("⚖️  Reconciling 2025-04 for VIVO...\n");
    let reconciliation = BillingReconciliation::with_defaults(storage);
    let run = reconciliation.run(Some("2025-04"), "VIVO")?;

    for record in &run.records {
        let outcome = if record.billable { "SIM" } else { "NÃO" };
        println!(
            "  {} {:<20} {:<4} {}",
            record.iccid,
            record.status.label(),
            outcome,
            record.reason_label()
        );
    }
    println!();

    // 3. Detail table as CSV
    println!("📄 Detail table:");
    let mut detail = CsvDetailExporter::new(Vec::new());
    detail.export_detail(&run)?;
    println!("{}", String::from_utf8(detail.into_inner()?)?);

    // 4. Summary document
    println!("📊 Summary:\n");
    let timezone = reconciliation.config().timezone()?;
    println!("{}", render_summary(&run, &timezone, Some("ACME Telemetria"))?);

    Ok(())
}
