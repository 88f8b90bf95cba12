//! Results Panel
//!
//! Exactly one of: nothing (no calculation yet), the error message, or the
//! result with its export buttons.

use iced::widget::{button, column, container, row, rule, text, Column, Space};
use iced::{Element, Length, Padding};

use scaffold_core::api::{Coefficient, Justification};
use scaffold_core::session::Outcome;
use scaffold_core::{CalculationResult, ExportFormat, ViewState};

use crate::Message;

/// Render the result area for the current outcome
pub fn view_results_panel(state: &ViewState) -> Element<'_, Message> {
    let content: Column<'_, Message> = match &state.outcome {
        None => return Space::new().height(0).into(),
        Some(Outcome::Error(message)) => column![
            text("Ошибка").size(14).color([0.8, 0.2, 0.2]),
            text(message.as_str()).size(12).color([0.8, 0.2, 0.2]),
        ]
        .spacing(6),
        Some(Outcome::Result(result)) => view_result(result, state.justification_open, state.busy),
    };

    container(content)
        .width(Length::Fill)
        .style(container::bordered_box)
        .padding(10)
        .into()
}

fn view_result(result: &CalculationResult, justification_open: bool, busy: bool) -> Column<'_, Message> {
    let mut content = column![
        text("Результат расчета").size(14),
        text(format!("Расчетный объем работ: {} м²", result.volume_display()))
            .size(20)
            .color([0.0, 0.34, 0.7]),
    ]
    .spacing(8);

    if !result.formula.is_empty() {
        content = content.push(text(format!("Формула расчета: {}", result.formula)).size(12));
    }

    if !result.formula_breakdown.is_empty() {
        let breakdown = result
            .formula_breakdown
            .iter()
            .fold(column![text("где:").size(11)].spacing(2), |col, line| {
                col.push(text(format!("  {}", line)).size(11))
            });
        content = content.push(breakdown);
    }

    if let Some(coefficient) = &result.coefficient {
        content = content.push(rule::horizontal(1)).push(view_coefficient(coefficient));
    }

    if let Some(justification) = &result.justification {
        content = content.push(view_justification(justification, justification_open));
    }

    let exports = ExportFormat::ALL
        .iter()
        .filter(|format| format.is_available())
        .fold(row![].spacing(6), |r, &format| {
            r.push(
                button(text(format.display_name()).size(11))
                    .on_press_maybe((!busy).then_some(Message::Export(format)))
                    .padding(Padding::from([6, 12]))
                    .style(button::secondary),
            )
        });

    content.push(Space::new().height(4)).push(exports)
}

fn view_coefficient(coefficient: &Coefficient) -> Element<'_, Message> {
    let mut block = column![
        text(coefficient.explanation.as_str()).size(12),
        text(format!("Формула коэффициента: {}", coefficient.formula)).size(11),
    ]
    .spacing(4);

    let value = coefficient.display_value();
    if !value.is_empty() {
        block = block.push(text(format!("Значение коэффициента: {}", value)).size(11));
    }

    block.into()
}

/// Collapsible justification section
fn view_justification(justification: &Justification, open: bool) -> Element<'_, Message> {
    let toggle_label = if open { "Обоснование ▲" } else { "Обоснование ▼" };
    let toggle = button(text(toggle_label).size(11))
        .on_press(Message::ToggleJustification)
        .padding(Padding::from([4, 8]))
        .style(if open { button::primary } else { button::secondary });

    let mut section = column![toggle].spacing(6);
    if open {
        section = section.push(
            container(
                column![
                    text(format!("{}:", justification.title)).size(12),
                    text(justification.text.as_str()).size(11),
                ]
                .spacing(4),
            )
            .padding(8)
            .style(container::rounded_box),
        );
    }

    section.into()
}
