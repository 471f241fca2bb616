//! Report encoders: spreadsheet, delimited text and paginated document
//!
//! Spreadsheet and CSV use the wide projection (one row per zone); the
//! document uses the long projection (one row per zone and class).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb};
use rust_xlsxwriter::{Format, Workbook};

use super::pivot::CountReport;

/// Base name shared by every export
pub const FILE_STEM: &str = "Reporte_Analitica_Vial";
/// Leading columns of the wide projection
pub const ZONE_HEADER: &str = "Carril";
pub const TYPE_HEADER: &str = "Tipo";
pub const SHEET_NAME: &str = "Censo";
pub const DOCUMENT_TITLE: &str = "ANALÍTICA VIAL IA - REPORTE DE CENSO";
/// Zone, mode, class, count
pub const TABLE_HEADER: [&str; 4] = ["Zona", "Modo", "Clase", "Cantidad"];

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
    Pdf,
}

impl ExportFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// Default path of this export inside `dir`
    pub fn default_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.{}", FILE_STEM, self.extension()))
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            other => anyhow::bail!("Unknown export format '{other}' (expected xlsx, csv or pdf)"),
        }
    }
}

/// Write `report` to `path` in the given format
pub fn export_report(report: &CountReport, format: ExportFormat, path: &Path) -> Result<()> {
    match format {
        ExportFormat::Xlsx => write_xlsx(report, path)?,
        ExportFormat::Csv => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_csv(report, BufWriter::new(file))?;
        }
        ExportFormat::Pdf => write_pdf(report, path)?,
    }
    log::info!("Exported {} zones to {}", report.tallies.len(), path.display());
    Ok(())
}

/// Header row of the wide projection
fn wide_header(report: &CountReport) -> Vec<String> {
    [ZONE_HEADER.to_string(), TYPE_HEADER.to_string()]
        .into_iter()
        .chain(report.class_columns().iter().map(|c| c.to_string()))
        .collect()
}

// ============================================================================
// Delimited text
// ============================================================================

/// Comma-separated UTF-8, one row per zone; blank cells for unmonitored classes
pub fn write_csv<W: Write>(report: &CountReport, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(wide_header(report))?;

    for row in report.wide_rows() {
        let record = [row.zone.to_string(), row.label.to_string()]
            .into_iter()
            .chain(
                row.cells
                    .iter()
                    .map(|cell| cell.map(|n| n.to_string()).unwrap_or_default()),
            );
        wtr.write_record(record)?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

// ============================================================================
// Spreadsheet
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
enum SheetCell {
    Text(String),
    Count(u64),
    Blank,
}

/// Sheet contents row by row, the header first
fn sheet_rows(report: &CountReport) -> Vec<Vec<SheetCell>> {
    let header = wide_header(report).into_iter().map(SheetCell::Text).collect();
    let body = report.wide_rows().into_iter().map(|row| {
        [
            SheetCell::Text(row.zone.to_string()),
            SheetCell::Text(row.label.to_string()),
        ]
        .into_iter()
        .chain(row.cells.into_iter().map(|cell| match cell {
            Some(count) => SheetCell::Count(count),
            None => SheetCell::Blank,
        }))
        .collect()
    });
    std::iter::once(header).chain(body).collect()
}

fn write_xlsx(report: &CountReport, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (r, row) in sheet_rows(report).iter().enumerate() {
        let r = r as u32;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                SheetCell::Text(text) if r == 0 => {
                    worksheet.write_string_with_format(r, c, text, &bold)?;
                }
                SheetCell::Text(text) => {
                    worksheet.write_string(r, c, text)?;
                }
                SheetCell::Count(count) => {
                    worksheet.write_number(r, c, *count as f64)?;
                }
                SheetCell::Blank => {}
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save spreadsheet: {}", path.display()))?;
    Ok(())
}

// ============================================================================
// Paginated document
// ============================================================================

/// A4 portrait page layout, in millimetres
mod page {
    pub const WIDTH: f32 = 210.0;
    pub const HEIGHT: f32 = 297.0;
    pub const MARGIN_X: f32 = 14.0;
    pub const TITLE_Y: f32 = 277.0;
    /// Table header baseline on the first page (below the title)
    pub const FIRST_TABLE_Y: f32 = 267.0;
    /// Table header baseline on continuation pages
    pub const NEXT_TABLE_Y: f32 = 277.0;
    pub const ROW_HEIGHT: f32 = 7.0;
    pub const BOTTOM_MARGIN: f32 = 15.0;
    /// Left edge of each table column
    pub const COLUMNS: [f32; 4] = [14.0, 80.0, 115.0, 160.0];
    /// Header fill, RGB(14, 165, 233)
    pub const HEADER_FILL: (f32, f32, f32) = (14.0 / 255.0, 165.0 / 255.0, 233.0 / 255.0);
}

/// Number of body rows that fit under a table header at `header_y`
fn rows_per_page(header_y: f32) -> usize {
    let first_row = header_y - page::ROW_HEIGHT;
    ((first_row - page::BOTTOM_MARGIN) / page::ROW_HEIGHT).floor() as usize + 1
}

/// Split `total` body rows into per-page counts (always at least one page)
fn paginate(total: usize) -> Vec<usize> {
    let mut pages = Vec::new();
    let mut remaining = total;
    let mut capacity = rows_per_page(page::FIRST_TABLE_Y);
    loop {
        let take = remaining.min(capacity);
        pages.push(take);
        remaining -= take;
        if remaining == 0 {
            return pages;
        }
        capacity = rows_per_page(page::NEXT_TABLE_Y);
    }
}

/// Table rows for each page; every page repeats the header as its first row
fn document_pages(report: &CountReport) -> Vec<Vec<[String; 4]>> {
    let rows = report.rows();
    let sizes = paginate(rows.len());
    let mut body = rows.into_iter().map(|row| {
        [
            row.zone.to_string(),
            row.label.to_string(),
            row.class.to_string(),
            row.count.to_string(),
        ]
    });
    let header = TABLE_HEADER.map(String::from);
    sizes
        .into_iter()
        .map(|count| {
            std::iter::once(header.clone())
                .chain(body.by_ref().take(count))
                .collect()
        })
        .collect()
}

fn draw_table_header(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    header: &[String; 4],
    y: f32,
) {
    let (r, g, b) = page::HEADER_FILL;
    layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
    layer.add_rect(Rect::new(
        Mm(page::MARGIN_X),
        Mm(y - 2.0),
        Mm(page::WIDTH - page::MARGIN_X),
        Mm(y + page::ROW_HEIGHT - 2.0),
    ));

    layer.set_fill_color(Color::Rgb(Rgb::new(1.0, 1.0, 1.0, None)));
    for (title, x) in header.iter().zip(page::COLUMNS) {
        layer.use_text(title.as_str(), 10.0, Mm(x + 1.0), Mm(y), font);
    }
    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
}

fn write_pdf(report: &CountReport, path: &Path) -> Result<()> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(DOCUMENT_TITLE, Mm(page::WIDTH), Mm(page::HEIGHT), "Capa 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow::anyhow!("Failed to load PDF font: {e}"))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow::anyhow!("Failed to load PDF font: {e}"))?;

    let mut first = Some(doc.get_page(first_page).get_layer(first_layer));

    for (index, rows) in document_pages(report).into_iter().enumerate() {
        let Some((header, body)) = rows.split_first() else {
            continue;
        };
        let (layer, header_y) = if let Some(layer) = first.take() {
            layer.use_text(DOCUMENT_TITLE, 14.0, Mm(page::MARGIN_X), Mm(page::TITLE_Y), &bold);
            (layer, page::FIRST_TABLE_Y)
        } else {
            let (p, l) = doc.add_page(
                Mm(page::WIDTH),
                Mm(page::HEIGHT),
                format!("Capa {}", index + 1),
            );
            (doc.get_page(p).get_layer(l), page::NEXT_TABLE_Y)
        };

        draw_table_header(&layer, &bold, header, header_y);

        let mut y = header_y - page::ROW_HEIGHT;
        for cells in body {
            for (text, x) in cells.iter().zip(page::COLUMNS) {
                layer.use_text(text.as_str(), 10.0, Mm(x + 1.0), Mm(y), &font);
            }
            y -= page::ROW_HEIGHT;
        }
    }

    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| anyhow::anyhow!("Failed to write PDF {}: {e}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassId, ClassSelection, LiveCounts, Point, ToolKind, Zone};

    fn report() -> CountReport {
        let line = Zone::new(
            "Carril 1",
            ToolKind::Line,
            vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
            &ClassSelection::new([ClassId::Auto, ClassId::Moto]),
        )
        .unwrap();
        let area = Zone::new(
            "Plaza, centro",
            ToolKind::Polygon,
            vec![Point::new(0.0, 0.0); 4],
            &ClassSelection::new([ClassId::Peaton]),
        )
        .unwrap();
        let mut counts = LiveCounts::default();
        counts.set(0, ClassId::Auto, 5);
        counts.set(1, ClassId::Peaton, 12);
        CountReport::new(&[line, area], &counts)
    }

    #[test]
    fn test_format_parse_and_paths() {
        assert_eq!("XLSX".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert_eq!("pdf".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert!("docx".parse::<ExportFormat>().is_err());
        assert_eq!(
            ExportFormat::Csv.default_path(Path::new("/out")),
            PathBuf::from("/out/Reporte_Analitica_Vial.csv")
        );
    }

    #[test]
    fn test_csv_has_one_row_per_zone() {
        let mut out = Vec::new();
        write_csv(&report(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Carril,Tipo,Auto,Moto,Peaton\n\
             Carril 1,Cruce,5,0,\n\
             \"Plaza, centro\",Área,,,12\n"
        );
    }

    #[test]
    fn test_csv_with_no_zones_is_header_only() {
        let mut out = Vec::new();
        write_csv(&CountReport::default(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Carril,Tipo\n");
    }

    #[test]
    fn test_xlsx_writes_a_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = ExportFormat::Xlsx.default_path(dir.path());
        export_report(&report(), ExportFormat::Xlsx, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_sheet_has_header_and_one_row_per_zone() {
        use super::SheetCell::{Blank, Count, Text};
        let text = |s: &str| Text(s.to_string());
        assert_eq!(
            sheet_rows(&report()),
            vec![
                vec![text("Carril"), text("Tipo"), text("Auto"), text("Moto"), text("Peaton")],
                vec![text("Carril 1"), text("Cruce"), Count(5), Count(0), Blank],
                vec![text("Plaza, centro"), text("Área"), Blank, Blank, Count(12)],
            ]
        );
        assert_eq!(
            sheet_rows(&CountReport::default()),
            vec![vec![text("Carril"), text("Tipo")]]
        );
    }

    #[test]
    fn test_pdf_writes_a_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = ExportFormat::Pdf.default_path(dir.path());
        export_report(&report(), ExportFormat::Pdf, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_document_has_one_row_per_zone_and_class() {
        let row = |cells: [&str; 4]| cells.map(String::from);
        assert_eq!(
            document_pages(&report()),
            vec![vec![
                row(TABLE_HEADER),
                row(["Carril 1", "Cruce", "Auto", "5"]),
                row(["Carril 1", "Cruce", "Moto", "0"]),
                row(["Plaza, centro", "Área", "Peaton", "12"]),
            ]]
        );
        assert_eq!(
            document_pages(&CountReport::default()),
            vec![vec![row(TABLE_HEADER)]]
        );
    }

    #[test]
    fn test_long_document_repeats_header_per_page() {
        let zones: Vec<Zone> = (0..40)
            .map(|i| {
                Zone::new(
                    &format!("Carril {}", i + 1),
                    ToolKind::Line,
                    vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
                    &ClassSelection::new([ClassId::Auto]),
                )
                .unwrap()
            })
            .collect();
        let mut counts = LiveCounts::default();
        counts.set(39, ClassId::Auto, 3);
        let pages = document_pages(&CountReport::new(&zones, &counts));

        assert_eq!(pages.iter().map(Vec::len).collect::<Vec<_>>(), vec![37, 5]);
        assert!(pages.iter().all(|p| p[0] == TABLE_HEADER.map(String::from)));
        assert_eq!(pages[0][1][0], "Carril 1");
        assert_eq!(pages[1][4], ["Carril 40", "Cruce", "Auto", "3"].map(String::from));
    }

    #[test]
    fn test_pagination() {
        let first = rows_per_page(page::FIRST_TABLE_Y);
        let next = rows_per_page(page::NEXT_TABLE_Y);
        assert_eq!(first, 36);
        assert_eq!(next, 37);

        assert_eq!(paginate(0), vec![0]);
        assert_eq!(paginate(first), vec![first]);
        assert_eq!(paginate(first + 1), vec![first, 1]);
        assert_eq!(paginate(first + next + 2), vec![first, next, 2]);
    }
}
