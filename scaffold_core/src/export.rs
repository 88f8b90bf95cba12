//! # Export Module
//!
//! Turns the current calculation into a downloadable document. Two formats:
//!
//! - [`ExportFormat::Word`] - HTML wrapped so Word opens it as a `.doc`
//! - [`ExportFormat::Pdf`] - Typst-rendered PDF (native builds, see [`crate::pdf`])
//!
//! Both are built from an [`ExportReport`], a snapshot of the inputs and the
//! result. No network is involved.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::api::CalculationResult;
use crate::errors::CalcResult;
use crate::form::{FieldName, FormState, InsideType, Location};

/// Document title used by every format
pub const REPORT_TITLE: &str = "Расчет объема строительных лесов";

/// Available document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Word,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Word, ExportFormat::Pdf];

    /// Fixed download name
    pub fn filename(&self) -> &'static str {
        match self {
            ExportFormat::Word => "raschet-lesov.doc",
            ExportFormat::Pdf => "raschet-lesov.pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Word => "application/msword",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ExportFormat::Word => "Экспорт в Word (.doc)",
            ExportFormat::Pdf => "Экспорт в PDF",
        }
    }

    /// Whether this build can render the format
    pub fn is_available(&self) -> bool {
        match self {
            ExportFormat::Word => true,
            ExportFormat::Pdf => cfg!(not(target_arch = "wasm32")),
        }
    }
}

/// A rendered document, ready to save or download
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub filename: &'static str,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Snapshot of what gets exported
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportReport {
    pub location: Option<Location>,
    pub inside_type: Option<InsideType>,
    /// Active inputs, as typed
    pub inputs: Vec<(FieldName, String)>,
    pub result: CalculationResult,
    pub generated_at: DateTime<Local>,
}

impl ExportReport {
    pub fn new(form: &FormState, result: CalculationResult) -> Self {
        let inputs = form
            .active_fields()
            .iter()
            .map(|&name| (name, form.field(name).trim().to_string()))
            .filter(|(_, value)| !value.is_empty())
            .collect();

        ExportReport {
            location: form.location,
            inside_type: match form.location {
                Some(Location::Inside) => form.inside_type,
                _ => None,
            },
            inputs,
            result,
            generated_at: Local::now(),
        }
    }

    pub fn date_display(&self) -> String {
        self.generated_at.format("%d.%m.%Y").to_string()
    }

    pub fn render(&self, format: ExportFormat) -> CalcResult<ExportFile> {
        let bytes = match format {
            ExportFormat::Word => render_word_html(self).into_bytes(),
            ExportFormat::Pdf => render_pdf(self)?,
        };

        tracing::info!(format = ?format, bytes = bytes.len(), "Report rendered");

        Ok(ExportFile {
            filename: format.filename(),
            mime_type: format.mime_type(),
            bytes,
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn render_pdf(report: &ExportReport) -> CalcResult<Vec<u8>> {
    crate::pdf::render_report_pdf(report)
}

#[cfg(target_arch = "wasm32")]
fn render_pdf(_report: &ExportReport) -> CalcResult<Vec<u8>> {
    Err(crate::errors::CalcError::export_failed("PDF export is not available in the browser build"))
}

/// Build the Word-compatible HTML document.
pub fn render_word_html(report: &ExportReport) -> String {
    let result = &report.result;
    let mut content = format!("<h1>{}</h1>", REPORT_TITLE);

    content.push_str("<h2>Исходные данные:</h2><ul>");
    if let Some(location) = report.location {
        content.push_str(&format!(
            "<li><strong>Расположение:</strong> {}</li>",
            escape_html(location.summary())
        ));
    }
    if let Some(inside_type) = report.inside_type {
        content.push_str(&format!(
            "<li><strong>Тип работ:</strong> {}</li>",
            escape_html(inside_type.display_name())
        ));
    }
    for (name, value) in &report.inputs {
        content.push_str(&format!(
            "<li><strong>{}:</strong> {}</li>",
            escape_html(name.label()),
            escape_html(value)
        ));
    }
    content.push_str("</ul>");

    content.push_str("<h2>Результаты расчета:</h2>");
    content.push_str(&format!(
        "<p><strong>Расчетный объем работ: {} м²</strong></p>",
        escape_html(&result.volume_display())
    ));

    if !result.formula.is_empty() {
        content.push_str(&format!(
            "<p><strong>Формула расчета:</strong> <code>{}</code></p>",
            escape_html(&result.formula)
        ));
    }

    if !result.formula_breakdown.is_empty() {
        content.push_str("<p>где:</p><ul>");
        for line in &result.formula_breakdown {
            content.push_str(&format!("<li>{}</li>", escape_html(line)));
        }
        content.push_str("</ul>");
    }

    if let Some(coefficient) = &result.coefficient {
        content.push_str(&format!(
            "<p><strong>{}</strong></p><p>Формула коэффициента: <code>{}</code></p>",
            escape_html(&coefficient.explanation),
            escape_html(&coefficient.formula)
        ));
        let value = coefficient.display_value();
        if !value.is_empty() {
            content.push_str(&format!("<p>Значение коэффициента: {}</p>", escape_html(&value)));
        }
    }

    if let Some(justification) = &result.justification {
        content.push_str(&format!(
            "<h2>Обоснование:</h2><p><strong>{}:</strong></p><blockquote>{}</blockquote>",
            escape_html(&justification.title),
            escape_html(&justification.text)
        ));
    }

    content.push_str(&format!("<p>Дата расчета: {}</p>", report.date_display()));

    format!(
        "<!DOCTYPE html><html><head><meta charset='utf-8'><title>Расчет</title></head><body>{}</body></html>",
        content
    )
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
