// src/services/csv_export.rs

use crate::{
    common::{error::AppError, format::format_plain},
    models::statement::Statement,
};

pub const CSV_HEADER: [&str; 5] = ["fecha", "descripcion", "tipo", "monto", "saldo"];

// Planilhas executam células que começam com estes caracteres como fórmula
const FORMULA_PREFIXES: [char; 6] = ['=', '+', '-', '@', '\t', '\r'];

fn spreadsheet_safe(text: &str) -> String {
    if text.starts_with(FORMULA_PREFIXES) {
        format!("'{}", text)
    } else {
        text.to_string()
    }
}

/// Extrato em CSV: cabeçalho, saldo anterior (se houver filtro), um registro
/// por movimento e o saldo final.
pub fn statement_csv(statement: &Statement) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    if statement.range.from.is_some() {
        let opening = format_plain(statement.opening_balance);
        writer.write_record(["Saldo anterior", "", "", "", opening.as_str()])?;
    }

    for line in &statement.lines {
        writer.write_record([
            line.date.format("%Y-%m-%d").to_string(),
            spreadsheet_safe(&line.description),
            line.kind.code().to_string(),
            format_plain(line.amount),
            format_plain(line.balance),
        ])?;
    }

    let closing = format_plain(statement.final_balance);
    writer.write_record(["Saldo final", "", "", "", closing.as_str()])?;

    writer
        .into_inner()
        .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("Falha ao finalizar o CSV: {}", e)))
}
