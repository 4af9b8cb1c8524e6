//! Integration tests for chip-billing-core

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chip_billing_core::{
    evaluate, normalize_iccid, read_workbook_table, render_summary, BillingConfig, BillingError,
    BillingPeriod, BillingReconciliation, CsvDetailExporter, DatasetKind, Decision, DetailExporter,
    EligibilityEngine, FileSource, MemoryStorage, NonBillingReason, ReconciliationRun, RuleSet,
    RuleVersion, SimRecord, SimStatus, SummaryExporter, Table, TextSummaryExporter,
    XlsxDetailExporter,
};
use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

static ICCID: [&str; 10] = [
    "8955010000000000001",
    "8955010000000000002",
    "8955010000000000003",
    "8955010000000000004",
    "8955010000000000005",
    "8955010000000000006",
    "8955010000000000007",
    "8955010000000000008",
    "8955010000000000009",
    "8955010000000000010",
];

fn fixture() -> MemoryStorage {
    let roster: Vec<&[&str]> = ICCID.iter().map(std::slice::from_ref).collect();

    MemoryStorage::new()
        .with_table(DatasetKind::SupplierRoster, Table::from_strings(&["Iccid"], &roster))
        .with_table(
            DatasetKind::InternalDatabase,
            Table::from_strings(
                &[
                    "ICCID",
                    "STATUS",
                    "PLANO",
                    "DATA DE ATIVAÇÃO",
                    "DATA DE CANCELAMENTO",
                    "DATA DE SUSPENSÃO",
                ],
                &[
                    &[" 8955010000000000001", "ATIVO", "M2M", "30/04/2025", "", ""],
                    &["8955010000000000002", "ATIVO", "M2M", "2025-05-01", "", ""],
                    &["8955010000000000003", "SUSPENSO", "M2M", "2025-01-15", "", "2025-02-10"],
                    &["8955010000000000004", "INATIVO", "DADOS", "", "", ""],
                    &["8955010000000000007", "EXTRAVIADO", "M2M", "2024-11-01", "", ""],
                    &["8955010000000000008", "CANCELADO", "M2M", "", "03/04/2025", ""],
                    &["8955010000000000009", "CANCELADO", "M2M", "", "31/03/2025", ""],
                    &["8955010000000000010", "SUSPENSO", "M2M", "2024-01-01", "", "2025-06-01"],
                ],
            ),
        )
        .with_table(
            DatasetKind::AcquisitionList,
            Table::from_strings(&["iccid"], &[&["8955010000000000006"], &["8955010000000000007"]]),
        )
        .with_table(
            DatasetKind::TestChipList,
            Table::from_strings(&["ICCID"], &[&["8955010000000000004"], &["8955010000000000007"]]),
        )
}

fn run_with(config: BillingConfig) -> ReconciliationRun {
    BillingReconciliation::new(fixture(), config)
        .run(Some("2025-04"), "VIVO")
        .unwrap()
}

fn decisions(run: &ReconciliationRun) -> Vec<Decision> {
    run.records.iter().map(SimRecord::decision).collect()
}

#[test]
fn test_complete_reconciliation_workflow() {
    let run = run_with(BillingConfig::default());
    let reject = Decision::reject;

    assert_eq!(
        decisions(&run),
        vec![
            Decision::bill(),
            reject(NonBillingReason::ActivationOutsideBillingMonth),
            Decision::bill(),
            Decision::bill(),
            reject(NonBillingReason::OutsideInternalDbAndAcquisitionList),
            Decision::bill(),
            reject(NonBillingReason::InvalidStatusLost),
            Decision::bill(),
            reject(NonBillingReason::CancellationOutsideBillingMonth),
            reject(NonBillingReason::SuspensionOutsideRules),
        ]
    );

    // loyalty deadline is only filled for suspended cards
    assert_eq!(run.records[2].loyalty_deadline, NaiveDate::from_ymd_opt(2025, 4, 15));
    assert_eq!(run.records[0].loyalty_deadline, None);

    assert_eq!(run.stats.matched, 8);
    assert_eq!(run.stats.unmatched, 2);
    assert_eq!(run.stats.test_chip_hits, 2);

    let summary = &run.summary;
    assert_eq!(summary.original.total_count, 10);
    assert_eq!(summary.original.total_value, BigDecimal::from_str("35.00").unwrap());
    assert_eq!(summary.revised.total_count, 5);
    assert_eq!(summary.revised.total_value, BigDecimal::from_str("17.50").unwrap());
    assert_eq!(summary.revised.count_for("NOT_IN_INTERNAL_DB"), 1);
    assert_eq!(summary.revised.count_for("CANCELADO"), 1);
    assert_eq!(summary.original.count_for("CANCELADO"), 2);
    assert_eq!(summary.excluded_count, 5);
    assert_eq!(summary.exclusions.len(), 5);
}

#[test]
fn test_revised_total_is_billable_count_times_price() {
    let mut config = BillingConfig::default();
    config.suppliers[0].unit_price = BigDecimal::from_str("7.33").unwrap();
    let run = run_with(config);

    let billable = run.records.iter().filter(|r| r.billable).count();
    let counted: usize = run.summary.revised.lines.iter().map(|l| l.count).sum();
    assert_eq!(counted, billable);
    assert_eq!(
        run.summary.revised.total_value,
        BigDecimal::from_str("36.65").unwrap()
    );
}

#[test]
fn test_suspension_after_period_flag() {
    let mut config = BillingConfig::default();
    config.rules = RuleSet::new(RuleVersion::V3).with_suspension_after_period(true);
    let run = run_with(config);
    assert!(run.records[9].billable);
    assert_eq!(run.summary.revised.total_count, 6);

    // V1 has the branch on unless overridden
    let mut config = BillingConfig::default();
    config.rules = RuleSet::new(RuleVersion::V1);
    assert!(run_with(config.clone()).records[9].billable);
    config.rules = config.rules.with_suspension_after_period(false);
    assert!(!run_with(config).records[9].billable);
}

#[test]
fn test_rule_versions_differ_only_where_documented() {
    let v3 = run_with(BillingConfig::default());
    for version in RuleVersion::ALL {
        let mut config = BillingConfig::default();
        config.rules = RuleSet::new(version).with_suspension_after_period(false);
        let run = run_with(config);
        // the fixture has no late loyalty deadline and no test chip outside the database
        assert_eq!(decisions(&run), decisions(&v3), "{version}");
    }
}

#[test]
fn test_missing_inputs_are_reported() {
    let reconciliation = BillingReconciliation::with_defaults(fixture());
    assert!(matches!(
        reconciliation.run(None, "VIVO"),
        Err(BillingError::MissingReferenceMonth)
    ));
    assert!(matches!(
        reconciliation.run(Some("2025-4"), "VIVO"),
        Err(BillingError::InvalidReferenceMonth(_))
    ));

    for kind in DatasetKind::ALL {
        let mut storage = fixture();
        storage.remove(kind);
        let err = BillingReconciliation::with_defaults(storage)
            .run(Some("2025-04"), "VIVO")
            .unwrap_err();
        assert!(matches!(err, BillingError::MissingDataset(k) if k == kind));
        assert!(err.to_string().contains(&kind.to_string()));
    }
}

#[test]
fn test_duplicate_internal_identifier_fails_the_run() {
    let mut storage = fixture();
    storage.insert(
        DatasetKind::InternalDatabase,
        Table::from_strings(
            &["ICCID", "STATUS"],
            &[&["8955010000000000001", "ATIVO"], &["8955010000000000001", "INATIVO"]],
        ),
    );
    let err = BillingReconciliation::with_defaults(storage)
        .run(Some("2025-04"), "VIVO")
        .unwrap_err();
    assert!(matches!(err, BillingError::DuplicateIdentifier { count: 2, .. }));
}

#[test]
fn test_csv_detail_export() {
    let run = run_with(BillingConfig::default());
    let mut exporter = CsvDetailExporter::new(Vec::new());
    exporter.export_detail(&run).unwrap();
    let output = String::from_utf8(exporter.into_inner().unwrap()).unwrap();

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 11);
    assert_eq!(
        lines[0],
        "ICCID;STATUS;PLANO;DATA DE ATIVAÇÃO;DATA DE CANCELAMENTO;DATA DE SUSPENSÃO;\
         CONSTA BASE B2;LISTA DE AQUISIÇÃO RNP;CHIP TESTE;FIDELIDADE LIMITE;\
         APTO A FATURAR;MOTIVO NÃO FATURAMENTO"
    );
    assert_eq!(
        lines[3],
        "8955010000000000003;SUSPENSO;M2M;15/01/2025;;10/02/2025;SIM;NÃO;NÃO;15/04/2025;SIM;"
    );
    assert_eq!(
        lines[5],
        "8955010000000000005;NOT_IN_INTERNAL_DB;;;;;NÃO;NÃO;NÃO;;NÃO;\
         outside internal DB and outside acquisition list"
    );
}

#[test]
fn test_xlsx_detail_export_reads_back() {
    let run = run_with(BillingConfig::default());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("detalhe.xlsx");

    XlsxDetailExporter::new(&path).export_detail(&run).unwrap();

    let table = read_workbook_table(&path, Some("Detalhe"), 0).unwrap();
    assert_eq!(table.len(), 10);
    let billable = table.column_index("APTO A FATURAR").unwrap();
    let reason = table.column_index("MOTIVO NÃO FATURAMENTO").unwrap();
    assert_eq!(table.cell(0, 0).to_text(), "8955010000000000001");
    assert_eq!(table.cell(0, billable).to_text(), "SIM");
    assert_eq!(table.cell(6, reason).to_text(), "invalid status - lost");
}

#[test]
fn test_summary_document() {
    let mut run = run_with(BillingConfig::default());
    run.created_at = Utc.with_ymd_and_hms(2025, 5, 2, 13, 5, 0).unwrap();
    let brasilia = FixedOffset::west_opt(3 * 3600).unwrap();

    let mut exporter = TextSummaryExporter::new(Vec::new(), brasilia);
    exporter.export_summary(&run).unwrap();
    let document = String::from_utf8(exporter.into_inner()).unwrap();

    assert!(document.contains("Fornecedor:       VIVO"));
    assert!(document.contains("Competência:      2025-04"));
    assert!(document.contains(&run.run_id.to_string()));
    assert!(document.contains("R$ 35,00"));
    assert!(document.contains("R$ 17,50"));
    assert!(document.contains("suspension outside rules"));
    assert!(document.contains("Total excluído: 5 chips, R$ 17,50"));
    assert!(document.starts_with("Resumo da Análise de Faturamento\n"));
    assert!(document.ends_with("Gerado em 02/05/2025 10:05 (UTC-03:00)\n"));
}

#[test]
fn test_summary_document_header_line() {
    let run = run_with(BillingConfig::default());
    let utc = FixedOffset::east_opt(0).unwrap();

    let document = render_summary(&run, &utc, Some("  ACME Telemetria  ")).unwrap();
    assert!(document.starts_with("ACME Telemetria\n\nResumo da Análise de Faturamento\n"));

    let blank = render_summary(&run, &utc, Some("   ")).unwrap();
    assert_eq!(blank, render_summary(&run, &utc, None).unwrap());

    let config = BillingConfig::from_toml_str("summary_header = \"ACME Telemetria\"").unwrap();
    let mut exporter = TextSummaryExporter::new(Vec::new(), utc).with_header(config.summary_header);
    exporter.export_summary(&run).unwrap();
    let written = String::from_utf8(exporter.into_inner()).unwrap();
    assert_eq!(written, document);
}

#[test]
fn test_summary_serializes() {
    let run = run_with(BillingConfig::default());
    let json = serde_json::to_value(&run.summary).unwrap();
    assert_eq!(json["revised"]["total_count"], 5);
    assert_eq!(json["exclusions"].as_array().map(Vec::len), Some(5));
    assert!(serde_json::to_string(&run).is_ok());
}

#[test]
fn test_file_backed_run() {
    let dir = tempfile::tempdir().unwrap();
    let write = |name: &str, content: &str| {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    };

    let source = FileSource::new()
        .with(
            DatasetKind::SupplierRoster,
            write("roster.csv", "Iccid;Valor\n8955010000000000001;3,50\n8955010000000000002;3,50\n"),
        )
        .with(
            DatasetKind::InternalDatabase,
            write(
                "internal.csv",
                "BASE B2\n\
                 ICCID;STATUS;DATA DE ATIVAÇÃO;DATA DE CANCELAMENTO;DATA DE SUSPENSÃO\n\
                 8955010000000000001;ATIVO;2025-02-01;;\n\
                 8955010000000000002;CANCELADO;;2025-01-20;\n",
            ),
        )
        .with(DatasetKind::AcquisitionList, write("acquisition.csv", "iccid\n"))
        .with(DatasetKind::TestChipList, write("tests.csv", "ICCID\n"));

    let run = BillingReconciliation::with_defaults(source)
        .run(Some("2025-04"), "claro")
        .unwrap();
    assert_eq!(run.supplier.name, "CLARO");
    assert!(run.records[0].billable);
    assert_eq!(
        run.records[1].non_billing_reason,
        Some(NonBillingReason::CancellationOutsideBillingMonth)
    );
}

#[test]
fn test_config_file_drives_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("billing.toml");
    std::fs::write(
        &path,
        "[rules]\nversion = \"v1\"\n\n[[suppliers]]\nname = \"VIVO\"\nunit_price = \"1.00\"\n",
    )
    .unwrap();

    let config = BillingConfig::from_file(&path).unwrap();
    let run = run_with(config);
    assert_eq!(run.rules.version, RuleVersion::V1);
    assert_eq!(run.summary.revised.total_value, BigDecimal::from_str("6.00").unwrap());
}

fn status_strategy() -> impl Strategy<Value = SimStatus> {
    prop_oneof![
        Just(SimStatus::Ativo),
        Just(SimStatus::Cancelado),
        Just(SimStatus::Extraviado),
        Just(SimStatus::Inativo),
        Just(SimStatus::Suspenso),
        Just(SimStatus::NotInInternalDb),
        Just(SimStatus::Other("BLOQUEADO".to_string())),
    ]
}

fn date_strategy() -> impl Strategy<Value = Option<NaiveDate>> {
    proptest::option::of((0u64..900).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.checked_add_days(chrono::Days::new(offset)))
            .unwrap()
    }))
}

fn record_strategy() -> impl Strategy<Value = SimRecord> {
    (
        status_strategy(),
        date_strategy(),
        date_strategy(),
        date_strategy(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(status, activation, cancellation, suspension, acquisition, test)| {
            SimRecord::new("8955010000000000001".to_string(), status)
                .with_dates(activation, cancellation, suspension)
                .with_membership(acquisition, test)
        })
}

fn period_strategy() -> impl Strategy<Value = BillingPeriod> {
    (2024i32..2027, 1u32..=12)
        .prop_map(|(year, month)| BillingPeriod::from_year_month(year, month).unwrap())
}

fn rules_strategy() -> impl Strategy<Value = RuleSet> {
    (
        prop_oneof![Just(RuleVersion::V1), Just(RuleVersion::V2), Just(RuleVersion::V3)],
        proptest::option::of(any::<bool>()),
    )
        .prop_map(|(version, flag)| RuleSet {
            version,
            suspension_after_period_billable: flag,
        })
}

proptest! {
    #[test]
    fn prop_evaluation_is_idempotent(record in record_strategy(), period in period_strategy()) {
        prop_assert_eq!(evaluate(&record, &period), evaluate(&record, &period));
    }

    #[test]
    fn prop_reason_present_iff_not_billable(
        record in record_strategy(),
        period in period_strategy(),
        rules in rules_strategy(),
    ) {
        let decision = EligibilityEngine::new(rules).evaluate(&record, &period);
        prop_assert_eq!(decision.billable, decision.reason.is_none());
        prop_assert_eq!(decision.billable, decision.reason_label().is_empty());
    }

    #[test]
    fn prop_lost_cards_are_never_billed(
        record in record_strategy(),
        period in period_strategy(),
        rules in rules_strategy(),
    ) {
        let mut record = record;
        record.status = SimStatus::Extraviado;
        record.in_internal_db = true;
        let decision = EligibilityEngine::new(rules).evaluate(&record, &period);
        prop_assert!(!decision.billable);
    }

    #[test]
    fn prop_normalization_is_idempotent(raw in "[ \t]{0,3}[0-9]{1,22}[ \t]{0,3}") {
        let once = normalize_iccid(&raw).unwrap();
        prop_assert_eq!(normalize_iccid(&once), Some(once.clone()));
        prop_assert!(once.len() >= 19);
    }
}
