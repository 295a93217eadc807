// src/services/document_service.rs

use std::{ops::Range, path::PathBuf};

use genpdf::{elements, style, Alignment, Element};

use crate::{
    common::{
        error::AppError,
        format::{format_date, format_money},
    },
    models::statement::Statement,
};

// A primeira página tem o cabeçalho do documento, então cabe menos linha
pub const FIRST_PAGE_ROWS: usize = 22;
pub const ROWS_PER_PAGE: usize = 34;

const COLUMN_WEIGHTS: [usize; 5] = [2, 5, 2, 2, 2];
const COLUMN_TITLES: [&str; 5] = ["Fecha", "Descripción", "Tipo", "Monto", "Saldo"];

#[derive(Debug, Clone)]
pub struct PdfSettings {
    pub fonts_dir: PathBuf,
    pub font_family: String,
    pub logo_path: PathBuf,
    pub subtitle: String,
}

#[derive(Clone)]
pub struct DocumentService {
    settings: PdfSettings,
}

impl DocumentService {
    pub fn new(settings: PdfSettings) -> Self {
        Self { settings }
    }

    /// Gera o PDF do extrato fora do runtime assíncrono.
    pub async fn generate_statement_pdf(&self, statement: Statement) -> Result<Vec<u8>, AppError> {
        let settings = self.settings.clone();
        tokio::task::spawn_blocking(move || render_statement_pdf(&settings, &statement))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de geração do PDF: {}", e))?
    }
}

/// Fatias de linhas por página. Sempre existe ao menos uma página.
pub fn page_ranges(total: usize, first: usize, rest: usize) -> Vec<Range<usize>> {
    let (first, rest) = (first.max(1), rest.max(1));
    let mut ranges = vec![0..total.min(first)];
    let mut start = ranges[0].end;
    while start < total {
        let end = (start + rest).min(total);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Células já formatadas de cada movimento, na ordem das colunas.
pub fn pdf_rows(statement: &Statement) -> Vec<[String; 5]> {
    statement
        .lines
        .iter()
        .map(|line| {
            [
                format_date(line.date),
                line.description.clone(),
                line.kind.label().to_string(),
                format_money(line.amount),
                format_money(line.balance),
            ]
        })
        .collect()
}

/// Linhas de totais impressas depois da tabela; a última é o saldo final.
pub fn summary_lines(statement: &Statement) -> [String; 2] {
    [
        format!(
            "Compras: {}    Abonos: {}",
            format_money(statement.total_purchases),
            format_money(statement.total_payments)
        ),
        format!("Saldo final: {}", format_money(statement.final_balance)),
    ]
}

/// Nome de arquivo seguro para o Content-Disposition.
pub fn statement_filename(customer_name: &str, extension: &str) -> String {
    let mut slug = String::with_capacity(customer_name.len());
    for ch in customer_name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    let slug = if slug.is_empty() { "cliente" } else { slug };
    format!("{}_estado_cuenta.{}", slug, extension)
}

fn pdf_error(e: genpdf::error::Error) -> AppError {
    AppError::PdfError(e.to_string())
}

fn table_header() -> Result<elements::TableLayout, AppError> {
    let mut table = elements::TableLayout::new(COLUMN_WEIGHTS.to_vec());
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let style_bold = style::Style::new().bold();
    let mut row = table.row();
    for title in COLUMN_TITLES {
        row = row.element(elements::Paragraph::new(title).styled(style_bold).padded(1));
    }
    row.push().map_err(pdf_error)?;
    Ok(table)
}

fn right_aligned(text: String) -> elements::Paragraph {
    let mut paragraph = elements::Paragraph::new(text);
    paragraph.set_alignment(Alignment::Right);
    paragraph
}

pub fn render_statement_pdf(settings: &PdfSettings, statement: &Statement) -> Result<Vec<u8>, AppError> {
    // Carrega a fonte da pasta configurada
    let font_family = genpdf::fonts::from_files(&settings.fonts_dir, &settings.font_family, None)
        .map_err(|e| {
            AppError::FontNotFound(format!(
                "{} em {}: {}",
                settings.font_family,
                settings.fonts_dir.display(),
                e
            ))
        })?;

    let customer_name = &statement.customer.name;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(format!("Estado de cuenta - {}", customer_name));
    doc.set_paper_size(genpdf::PaperSize::A4);
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    // --- CABEÇALHO ---
    if settings.logo_path.exists() {
        match elements::Image::from_path(&settings.logo_path) {
            Ok(logo) => doc.push(logo.with_scale(genpdf::Scale::new(0.4, 0.4))),
            Err(e) => tracing::warn!("Logo {} ignorado: {}", settings.logo_path.display(), e),
        }
    }

    doc.push(
        elements::Paragraph::new(format!("Estado de cuenta - {}", customer_name))
            .styled(style::Style::new().bold().with_font_size(16)),
    );
    doc.push(elements::Paragraph::new(settings.subtitle.clone()).styled(style::Style::new().with_font_size(11)));
    doc.push(
        elements::Paragraph::new(format!("Generado: {}", chrono::Local::now().format("%d/%m/%Y %H:%M")))
            .styled(style::Style::new().with_font_size(9)),
    );

    if !statement.range.is_open() {
        let from = statement.range.from.map(format_date).unwrap_or_else(|| "inicio".into());
        let to = statement.range.to.map(format_date).unwrap_or_else(|| "hoy".into());
        doc.push(elements::Paragraph::new(format!("Período: {} a {}", from, to)));
    }
    if statement.range.from.is_some() {
        doc.push(elements::Paragraph::new(format!(
            "Saldo anterior: {}",
            format_money(statement.opening_balance)
        )));
    }

    doc.push(elements::Break::new(1));

    // --- TABELA, com o cabeçalho repetido em cada página ---
    let rows = pdf_rows(statement);
    for (page, range) in page_ranges(rows.len(), FIRST_PAGE_ROWS, ROWS_PER_PAGE).into_iter().enumerate() {
        if page > 0 {
            doc.push(elements::PageBreak::new());
        }

        let mut table = table_header()?;
        for cells in &rows[range] {
            let [date, description, kind, amount, balance] = cells.clone();
            table
                .row()
                .element(elements::Paragraph::new(date).padded(1))
                .element(elements::Paragraph::new(description).padded(1))
                .element(elements::Paragraph::new(kind).padded(1))
                .element(right_aligned(amount).padded(1))
                .element(right_aligned(balance).padded(1))
                .push()
                .map_err(pdf_error)?;
        }
        doc.push(table);
    }

    doc.push(elements::Break::new(1.5));

    // --- TOTAIS ---
    let [totals, final_line] = summary_lines(statement);
    doc.push(right_aligned(totals));
    doc.push(right_aligned(final_line).styled(style::Style::new().bold().with_font_size(14)));

    // Renderiza para Buffer (Memória)
    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(pdf_error)?;

    tracing::info!(
        "📄 PDF do cliente '{}' gerado ({} movimentos, {} bytes)",
        customer_name,
        rows.len(),
        buffer.len()
    );
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            customer::Customer,
            movement::{Movement, MovementKind},
            statement::StatementRange,
        },
        services::ledger::build_statement,
    };
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn statement(count: usize) -> Statement {
        let customer = Customer {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            phone: None,
            identification: None,
            cobrador_id: None,
            user_id: None,
            balance: Decimal::ZERO,
            created_at: Utc::now(),
        };
        let movements: Vec<Movement> = (0..count)
            .map(|i| Movement {
                id: Uuid::new_v4(),
                customer_id: customer.id,
                movement_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                description: format!("Item {i}"),
                kind: if i % 2 == 0 { MovementKind::Purchase } else { MovementKind::Payment },
                amount: Decimal::new(1000 + i as i64, 2),
                recorded_by: None,
                created_at: Utc::now(),
            })
            .collect();
        build_statement(customer, &movements, StatementRange::default())
    }

    #[test]
    fn page_ranges_cover_every_row_once() {
        for total in [0, 1, 21, 22, 23, 56, 57, 200] {
            let ranges = page_ranges(total, FIRST_PAGE_ROWS, ROWS_PER_PAGE);
            assert_eq!(ranges[0].start, 0);
            assert!(ranges[0].len() <= FIRST_PAGE_ROWS);
            assert!(ranges.iter().skip(1).all(|r| !r.is_empty() && r.len() <= ROWS_PER_PAGE));
            assert!(ranges.windows(2).all(|w| w[0].end == w[1].start));
            assert_eq!(ranges.last().unwrap().end, total);
        }
    }

    #[test]
    fn page_counts() {
        assert_eq!(page_ranges(0, 22, 34).len(), 1);
        assert_eq!(page_ranges(22, 22, 34).len(), 1);
        assert_eq!(page_ranges(23, 22, 34).len(), 2);
        assert_eq!(page_ranges(22 + 34 + 1, 22, 34).len(), 3);
    }

    #[test]
    fn one_pdf_row_per_movement_with_running_balance() {
        let statement = statement(5);
        let rows = pdf_rows(&statement);

        assert_eq!(rows.len(), statement.lines.len());
        assert_eq!(rows[0][0], "01/01/2024");
        assert_eq!(rows[0][2], "Compra");
        assert_eq!(rows[1][2], "Abono");
        assert_eq!(rows[0][3], "₡10.00");
        assert_eq!(
            rows.last().unwrap()[4],
            format_money(statement.final_balance)
        );
    }

    #[test]
    fn printed_final_balance_matches_the_fold() {
        let statement = statement(7);
        let fold = crate::services::ledger::final_balance(
            statement.lines.iter().map(|l| (l.kind, l.amount)),
        );
        let [totals, final_line] = summary_lines(&statement);

        assert_eq!(fold, statement.final_balance);
        assert_eq!(final_line, format!("Saldo final: {}", format_money(fold)));
        assert_eq!(
            totals,
            format!(
                "Compras: {}    Abonos: {}",
                format_money(statement.total_purchases),
                format_money(statement.total_payments)
            )
        );
        assert_eq!(statement.total_purchases - statement.total_payments, fold);
    }

    #[test]
    fn filenames_are_header_safe() {
        assert_eq!(statement_filename("Ana Solís", "pdf"), "Ana_Sol_s_estado_cuenta.pdf");
        assert_eq!(statement_filename("  Juan  ", "csv"), "Juan_estado_cuenta.csv");
        assert_eq!(statement_filename("ñññ", "pdf"), "cliente_estado_cuenta.pdf");
    }

    #[test]
    fn missing_fonts_are_reported() {
        let settings = PdfSettings {
            fonts_dir: PathBuf::from("/nonexistent/fonts"),
            font_family: "Roboto".into(),
            logo_path: PathBuf::from("/nonexistent/logo.jpg"),
            subtitle: String::new(),
        };
        assert!(matches!(
            render_statement_pdf(&settings, &statement(1)),
            Err(AppError::FontNotFound(_))
        ));
    }
}
