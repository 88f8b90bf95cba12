//! Input Panel
//!
//! Displays:
//! - Location choice (outside / inside)
//! - Inside work type, only once "inside" is chosen
//! - The numeric fields the current choice requires
//! - The calculate button

use iced::widget::{button, column, container, radio, row, text, text_input, Column, Space};
use iced::{Alignment, Element, Length, Padding};

use scaffold_core::form::{FieldName, InsideType, Location};
use scaffold_core::ViewState;

use crate::Message;

/// Render the form
pub fn view_input_panel(state: &ViewState) -> Element<'_, Message> {
    let form = &state.form;

    let location_choice = Location::ALL.iter().fold(Column::new().spacing(6), |col, &location| {
        col.push(
            radio(location.display_name(), location, form.location, Message::LocationSelected)
                .size(14)
                .text_size(12),
        )
    });

    let mut panel = column![
        text("Где будут устанавливаться леса?").size(14),
        location_choice,
    ]
    .spacing(8);

    if form.location == Some(Location::Inside) {
        let inside_choice = InsideType::ALL.iter().fold(Column::new().spacing(6), |col, &inside_type| {
            col.push(
                radio(inside_type.display_name(), inside_type, form.inside_type, Message::InsideTypeSelected)
                    .size(14)
                    .text_size(12),
            )
        });
        panel = panel
            .push(Space::new().height(4))
            .push(text("Какие работы выполняются?").size(14))
            .push(inside_choice);
    }

    let fields = state.visible_fields();
    if !fields.is_empty() {
        panel = panel.push(Space::new().height(4));
        for &name in fields {
            panel = panel.push(labeled_input(name, form.field(name), state.busy));
        }
    }

    let button_label = if state.busy { "Выполняется расчет..." } else { "Рассчитать" };
    let calculate = button(text(button_label).size(13))
        .on_press_maybe((!state.busy).then_some(Message::Calculate))
        .padding(Padding::from([8, 20]))
        .style(button::primary);

    panel = panel.push(Space::new().height(6)).push(calculate);

    container(panel)
        .width(Length::Fill)
        .style(container::bordered_box)
        .padding(10)
        .into()
}

/// Helper to create a labeled numeric input
fn labeled_input(name: FieldName, value: &str, locked: bool) -> Element<'_, Message> {
    let mut input = text_input("0.0", value).width(Length::Fill).padding(4).size(12);
    if !locked {
        input = input.on_input(move |v| Message::FieldChanged(name, v));
    }

    row![
        text(name.label()).size(12).width(Length::Fixed(200.0)),
        input,
    ]
    .align_y(Alignment::Center)
    .into()
}
