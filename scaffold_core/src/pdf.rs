//! # PDF Generation Module
//!
//! Renders the calculation report to PDF using Typst.
//!
//! ## Architecture
//!
//! - The Typst template is embedded as a string constant
//! - Data is injected via placeholder replacement before compilation,
//!   escaped for the position it lands in (markup or string literal)
//! - Fonts come from `typst-assets` and are loaded once per process
//! - Output is raw PDF bytes (`Vec<u8>`)

use chrono::{Datelike, Local};
use once_cell::sync::Lazy;
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::errors::{CalcError, CalcResult};
use crate::export::{ExportReport, REPORT_TITLE};

/// Bundled fonts, parsed on first use
static FONTS: Lazy<Vec<Font>> = Lazy::new(|| {
    let mut fonts = Vec::new();
    for font_bytes in typst_assets::fonts() {
        let buffer = Bytes::new(font_bytes.to_vec());
        for font in Font::iter(buffer) {
            fonts.push(font);
        }
    }
    tracing::debug!(count = fonts.len(), "Loaded bundled fonts");
    fonts
});

// ============================================================================
// Typst World Implementation
// ============================================================================

/// A minimal Typst world for compiling a single in-memory document.
struct PdfWorld {
    main: Source,
    book: LazyHash<FontBook>,
    library: LazyHash<Library>,
}

impl PdfWorld {
    fn new(source: String) -> Self {
        PdfWorld {
            main: Source::detached(source),
            book: LazyHash::new(FontBook::from_fonts(FONTS.iter())),
            library: LazyHash::new(Library::default()),
        }
    }
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        FONTS.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Local::now();
        Datetime::from_ymd(now.year(), now.month() as u8, now.day() as u8)
    }
}

// ============================================================================
// PDF Template
// ============================================================================

const REPORT_TEMPLATE: &str = r##"
#set page(
  paper: "a4",
  margin: (top: 2cm, bottom: 2cm, left: 2.5cm, right: 1.5cm),
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr),
      align(left)[#text(size: 9pt)[{{DATE}}]],
      align(right)[#text(size: 9pt)[Стр. #counter(page).display()]],
    )
  ]
)

#set text(font: "Libertinus Serif", size: 11pt, lang: "ru")

#align(center)[
  #block(width: 100%, fill: rgb("#eef2f7"), inset: 12pt, radius: 4pt)[
    #text(size: 18pt, weight: "bold")[{{TITLE}}]
  ]
]

#v(12pt)

== Исходные данные

#table(
  columns: (1fr, auto),
  inset: 8pt,
  stroke: 0.5pt,
  align: (left, right),
  table.header([*Параметр*], [*Значение*]),
{{INPUT_ROWS}}
)

#v(12pt)

== Результаты расчета

#align(center)[
  #block(fill: rgb("#f8faff"), stroke: 0.5pt + rgb("#b3d7ff"), inset: 14pt, radius: 4pt)[
    #text(size: 12pt)[Расчетный объем работ:]
    #v(2pt)
    #text(size: 20pt, weight: "bold", fill: rgb("#0056b3"))[{{VOLUME}} м²]
  ]
]

#v(8pt)

{{FORMULA_BLOCK}}

{{BREAKDOWN_BLOCK}}

{{COEFFICIENT_BLOCK}}

{{JUSTIFICATION_BLOCK}}

#v(24pt)
#line(length: 100%, stroke: 0.5pt)
#v(8pt)

#text(size: 9pt, fill: gray)[
  Расчет выполнен сервисом расчета объема строительных лесов.
]
"##;

// ============================================================================
// PDF Rendering
// ============================================================================

/// Render the report to PDF bytes.
pub fn render_report_pdf(report: &ExportReport) -> CalcResult<Vec<u8>> {
    let source = build_source(report);

    let world = PdfWorld::new(source);

    let warned = typst::compile(&world);

    let document = warned.output.map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CalcError::export_failed(format!("Typst compilation failed: {}", error_msgs.join("; ")))
    })?;

    typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CalcError::export_failed(format!("PDF rendering failed: {}", error_msgs.join("; ")))
    })
}

/// Fill the template with report data
fn build_source(report: &ExportReport) -> String {
    let result = &report.result;

    let formula_block = if result.formula.is_empty() {
        String::new()
    } else {
        format!("*Формула расчета:* #raw(\"{}\")", escape_typst_str(&result.formula))
    };

    let breakdown_block = if result.formula_breakdown.is_empty() {
        String::new()
    } else {
        let items: Vec<String> = result
            .formula_breakdown
            .iter()
            .map(|line| format!("- {}", escape_typst(line)))
            .collect();
        format!("где:\n\n{}", items.join("\n"))
    };

    let coefficient_block = match &result.coefficient {
        Some(c) => {
            let mut block = format!(
                "#v(8pt)\n#line(length: 100%, stroke: (paint: rgb(\"#b3d7ff\"), dash: \"dashed\"))\n\n*{}*\n\nФормула коэффициента: #raw(\"{}\")",
                escape_typst(&c.explanation),
                escape_typst_str(&c.formula)
            );
            let value = c.display_value();
            if !value.is_empty() {
                block.push_str(&format!("\n\nЗначение коэффициента: {}", escape_typst(&value)));
            }
            block
        }
        None => String::new(),
    };

    let justification_block = match &result.justification {
        Some(j) => format!(
            "== Обоснование\n\n*{}:*\n\n#quote(block: true)[{}]",
            escape_typst(&j.title),
            escape_typst(&j.text)
        ),
        None => String::new(),
    };

    REPORT_TEMPLATE
        .replace("{{TITLE}}", REPORT_TITLE)
        .replace("{{DATE}}", &report.date_display())
        .replace("{{INPUT_ROWS}}", &build_input_rows(report))
        .replace("{{VOLUME}}", &escape_typst(&result.volume_display()))
        .replace("{{FORMULA_BLOCK}}", &formula_block)
        .replace("{{BREAKDOWN_BLOCK}}", &breakdown_block)
        .replace("{{COEFFICIENT_BLOCK}}", &coefficient_block)
        .replace("{{JUSTIFICATION_BLOCK}}", &justification_block)
}

/// Build input table rows
fn build_input_rows(report: &ExportReport) -> String {
    let mut rows = Vec::new();
    if let Some(location) = report.location {
        rows.push(format!("  [Расположение], [{}],", escape_typst(location.summary())));
    }
    if let Some(inside_type) = report.inside_type {
        rows.push(format!("  [Тип работ], [{}],", escape_typst(inside_type.display_name())));
    }
    for (name, value) in &report.inputs {
        rows.push(format!("  [{}], [{}],", escape_typst(name.label()), escape_typst(value)));
    }
    rows.join("\n")
}

/// Escape special Typst characters in user-provided markup text
fn escape_typst(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '*' | '_' | '#' | '$' | '@' | '<' | '>' | '\\' | '`' | '[' | ']' | '=' | '-' | '+' | '/' | '~'
            | '"' | '\'' => format!("\\{}", c),
            '\n' => " ".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

/// Escape text placed inside a Typst string literal
fn escape_typst_str(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '"' => "\\\"".to_string(),
            '\\' => "\\\\".to_string(),
            '\n' => "\\n".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CalculationResult, Coefficient, Justification};
    use crate::form::{FieldName, FormState, InsideType, Location};

    fn report() -> ExportReport {
        let mut form = FormState::default();
        form.select_location(Location::Inside);
        form.select_inside_type(InsideType::Ceiling);
        form.set_field(FieldName::RoomWidth, "5");
        form.set_field(FieldName::RoomLength, "6");

        ExportReport::new(
            &form,
            CalculationResult {
                volume: 30.0,
                formula: "S = A * B".into(),
                formula_breakdown: vec!["A = 5 м".into(), "B = 6 м".into()],
                coefficient: Some(Coefficient {
                    value: serde_json::json!(1.1),
                    explanation: "Коэффициент [высоты]".into(),
                    formula: "k = \"1.1\"".into(),
                }),
                justification: Some(Justification {
                    title: "ГЭСН 08-07-001".into(),
                    text: "Площадь лесов = площадь потолка #1".into(),
                }),
            },
        )
    }

    #[test]
    fn test_source_escapes_user_text() {
        let source = build_source(&report());
        assert!(source.contains("[Ширина помещения (A), м], [5],"));
        assert!(source.contains("#raw(\"S = A * B\")"));
        assert!(source.contains("#raw(\"k = \\\"1.1\\\"\")"));
        assert!(source.contains("Коэффициент \\[высоты\\]"));
        assert!(source.contains("потолка \\#1"));
        assert!(!source.contains("{{"));
    }

    #[test]
    fn test_pdf_generation() {
        let pdf = render_report_pdf(&report());

        assert!(pdf.is_ok(), "PDF generation failed: {:?}", pdf.err());

        let pdf_bytes = pdf.unwrap();
        assert!(pdf_bytes.starts_with(b"%PDF"), "Output is not a valid PDF");
        assert!(pdf_bytes.len() > 1000, "PDF seems too small");
    }

    #[test]
    fn test_escape_typst() {
        assert_eq!(escape_typst("a*b_c"), "a\\*b\\_c");
        assert_eq!(escape_typst("Высота"), "Высота");
    }
}
