//! Access token entry
//!
//! The field is prefilled from the launch URL, the payment exchange or
//! storage. Whatever is typed here is saved on the next calculation.

use iced::widget::{column, container, text, text_input};
use iced::{Element, Length};

use scaffold_core::ViewState;

use crate::Message;

pub fn view_token_panel(state: &ViewState) -> Element<'_, Message> {
    let mut input = text_input("Введите токен доступа", &state.token)
        .padding(6)
        .size(12);
    if !state.busy {
        input = input.on_input(Message::TokenChanged);
    }

    container(
        column![
            text("Токен доступа").size(14),
            input,
            text("Токен выдается после оплаты и сохраняется на этом устройстве")
                .size(10)
                .color([0.5, 0.5, 0.5]),
        ]
        .spacing(6),
    )
    .width(Length::Fill)
    .style(container::bordered_box)
    .padding(10)
    .into()
}
