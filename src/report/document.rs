//! Plain-text summary document

use std::fmt::Write as _;
use std::io::Write;

use bigdecimal::BigDecimal;
use chrono::FixedOffset;

use crate::reconciliation::ReconciliationRun;
use crate::report::summary::Distribution;
use crate::traits::SummaryExporter;
use crate::types::*;

/// Brazilian currency rendering: `R$ 1.234,50`
pub fn format_brl(value: &BigDecimal) -> String {
    let text = value.round(2).with_scale(2).to_string();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.as_str()),
    };
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{}R$ {},{}", if negative { "-" } else { "" }, grouped, fraction)
}

/// `UTC-03:00` style label for a fixed offset
fn offset_label(offset: &FixedOffset) -> String {
    let seconds = offset.local_minus_utc();
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    format!("UTC{}{:02}:{:02}", sign, minutes / 60, minutes % 60)
}

fn write_distribution(out: &mut String, title: &str, distribution: &Distribution) -> std::fmt::Result {
    writeln!(out, "{}", title)?;
    writeln!(out, "  {:<24} {:>10} {:>18}", "STATUS", "CHIPS", "VALOR")?;
    for line in &distribution.lines {
        writeln!(
            out,
            "  {:<24} {:>10} {:>18}",
            line.status,
            line.count,
            format_brl(&line.value)
        )?;
    }
    writeln!(
        out,
        "  {:<24} {:>10} {:>18}",
        "TOTAL",
        distribution.total_count,
        format_brl(&distribution.total_value)
    )?;
    writeln!(out)
}

fn write_document(
    out: &mut String,
    run: &ReconciliationRun,
    offset: &FixedOffset,
    header: Option<&str>,
) -> std::fmt::Result {
    let summary = &run.summary;

    if let Some(header) = header.map(str::trim).filter(|h| !h.is_empty()) {
        writeln!(out, "{}", header)?;
        writeln!(out)?;
    }
    writeln!(out, "Resumo da Análise de Faturamento")?;
    writeln!(out, "================================")?;
    writeln!(out, "Fornecedor:       {}", run.supplier.name)?;
    writeln!(out, "Competência:      {}", run.period)?;
    writeln!(out, "Regras:           {}", run.rules.version)?;
    writeln!(out, "Valor unitário:   {}", format_brl(&summary.unit_price))?;
    writeln!(out, "Execução:         {}", run.run_id)?;
    writeln!(out)?;

    write_distribution(out, "Faturamento original do fornecedor", &summary.original)?;
    write_distribution(out, "Faturamento revisado", &summary.revised)?;

    writeln!(out, "Chips excluídos")?;
    if summary.exclusions.is_empty() {
        writeln!(out, "  nenhum")?;
    } else {
        writeln!(out, "  {:<24} {:<50} {:>10}", "STATUS", "MOTIVO", "CHIPS")?;
        for line in &summary.exclusions {
            writeln!(
                out,
                "  {:<24} {:<50} {:>10}",
                line.status,
                line.reason_label(),
                line.count
            )?;
        }
    }
    writeln!(
        out,
        "  Total excluído: {} chips, {}",
        summary.excluded_count,
        format_brl(&summary.excluded_value)
    )?;
    writeln!(out)?;

    let local = run.created_at.with_timezone(offset);
    writeln!(
        out,
        "Gerado em {} ({})",
        local.format("%d/%m/%Y %H:%M"),
        offset_label(offset)
    )
}

/// Render the summary of a run, stamping it in the given timezone.
/// `header` is an optional organization line printed above the title.
pub fn render_summary(
    run: &ReconciliationRun,
    offset: &FixedOffset,
    header: Option<&str>,
) -> BillingResult<String> {
    let mut out = String::new();
    write_document(&mut out, run, offset, header)
        .map_err(|e| BillingError::Export(format!("summary: {}", e)))?;
    Ok(out)
}

/// Writes the rendered summary to any writer
pub struct TextSummaryExporter<W: Write> {
    writer: W,
    offset: FixedOffset,
    header: Option<String>,
}

impl<W: Write> TextSummaryExporter<W> {
    pub fn new(writer: W, offset: FixedOffset) -> Self {
        Self {
            writer,
            offset,
            header: None,
        }
    }

    /// Print an organization line above the summary title
    pub fn with_header(mut self, header: Option<String>) -> Self {
        self.header = header;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SummaryExporter for TextSummaryExporter<W> {
    fn export_summary(&mut self, run: &ReconciliationRun) -> BillingResult<()> {
        let document = render_summary(run, &self.offset, self.header.as_deref())?;
        self.writer.write_all(document.as_bytes())?;
        self.writer.flush()?;
        log::info!("summary: rendered run {}", run.run_id);
        Ok(())
    }
}
