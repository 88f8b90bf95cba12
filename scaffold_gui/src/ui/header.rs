//! Header component

use iced::widget::{column, text};
use iced::Element;

use crate::Message;

/// Render the window heading
pub fn view_header(title: &str) -> Element<'_, Message> {
    column![
        text(title).size(26),
        text("Объем работ рассчитывается сервером по введенным размерам")
            .size(11)
            .color([0.5, 0.5, 0.5]),
    ]
    .spacing(4)
    .into()
}
