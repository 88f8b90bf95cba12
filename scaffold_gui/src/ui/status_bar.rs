//! Status Bar (Bottom)
//!
//! Shows the view state's notice when there is one, otherwise the app status.

use iced::widget::{row, text, Space};
use iced::{Element, Length, Padding};

use scaffold_core::ViewState;

use crate::Message;

/// Render the status bar
pub fn view_status_bar<'a>(state: &'a ViewState, status: &'a str) -> Element<'a, Message> {
    let activity = if state.busy { "Ожидание ответа сервера..." } else { "" };

    let line = match &state.notice {
        Some(notice) => text(notice.as_str()).size(10).color([0.1, 0.5, 0.2]),
        None => text(status).size(10),
    };

    row![
        line,
        Space::new().width(Length::Fill),
        text(activity).size(10).color([0.6, 0.3, 0.0]),
    ]
    .padding(Padding::from([4, 0]))
    .into()
}
