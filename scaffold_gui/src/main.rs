//! # Scaffolding Calculator GUI
//!
//! Single-screen Iced front end over [`scaffold_core::ViewState`]:
//! token entry, location choice, the fields that choice requires, and the
//! server's answer with export buttons underneath.
//!
//! Runs natively (wgpu, tokio) and in the browser (wasm32). Platform
//! differences live in [`platform`].

mod platform;
mod ui;

use iced::widget::{column, container, scrollable};
use iced::{Element, Length, Task};

use scaffold_core::form::{FieldName, InsideType, Location};
use scaffold_core::launch::LaunchUrl;
use scaffold_core::token_store::TokenStore;
use scaffold_core::{ApiClient, CalcError, CalcResult, CalculationResult, Config, ExportFormat, ViewState};

const WINDOW_TITLE: &str = "Калькулятор строительных лесов";

pub struct App {
    pub state: ViewState,
    /// Client, or the configuration error that prevented building one
    client: Result<ApiClient, CalcError>,
    store: Box<dyn TokenStore>,
    /// Bottom-line status when the view state has no notice of its own
    pub status: String,
}

#[derive(Debug, Clone)]
pub enum Message {
    TokenChanged(String),
    LocationSelected(Location),
    InsideTypeSelected(InsideType),
    FieldChanged(FieldName, String),
    Calculate,
    CalculationFinished(CalcResult<CalculationResult>),
    TokenExchanged(CalcResult<String>),
    ToggleJustification,
    Export(ExportFormat),
    ExportFinished(CalcResult<Option<String>>),
}

impl App {
    fn new() -> (Self, Task<Message>) {
        let mut config = Config::load();
        if let Some(api_url) = platform::api_url_override() {
            config = config.with_api_base_url(api_url);
        }

        let client = ApiClient::new(config);
        let status = match &client {
            Ok(client) => format!("Сервер: {}", client.config().api_base_url),
            Err(e) => {
                tracing::error!("Unusable configuration: {}", e);
                e.user_message()
            }
        };

        let launch = platform::launch_url().and_then(|url| match LaunchUrl::parse(&url) {
            Ok(launch) => Some(launch),
            Err(e) => {
                tracing::warn!("Ignoring launch URL: {}", e);
                None
            }
        });

        let mut app = App {
            state: ViewState::new(),
            client,
            store: platform::token_store(),
            status,
        };

        let params = launch.as_ref().map(|l| l.params.clone()).unwrap_or_default();
        let plan = app.state.mount(&params, app.store.as_mut());

        if plan.clean_url {
            if let Some(launch) = &launch {
                platform::replace_launch_url(&launch.cleaned);
            }
        }

        let task = match plan.exchange {
            Some(exchange) => match &app.client {
                Ok(client) => {
                    let client = client.clone();
                    Task::perform(
                        async move { client.exchange_payment(&exchange.user_id, &exchange.payment_id).await },
                        Message::TokenExchanged,
                    )
                }
                Err(e) => {
                    let outcome = Err(e.clone());
                    app.state.finish_token_exchange(outcome, app.store.as_mut());
                    Task::none()
                }
            },
            None => Task::none(),
        };

        (app, task)
    }

    /// Replace the status line. Any earlier notice is dropped with it.
    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.state.notice = None;
    }

    fn title(&self) -> String {
        WINDOW_TITLE.to_string()
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TokenChanged(token) => {
                self.state.set_token(token);
            }
            Message::LocationSelected(location) => {
                self.state.select_location(location);
            }
            Message::InsideTypeSelected(inside_type) => {
                self.state.select_inside_type(inside_type);
            }
            Message::FieldChanged(name, value) => {
                self.state.edit_field(name, value);
            }
            Message::Calculate => {
                let submission = match self.state.begin_submit(self.store.as_mut()) {
                    Ok(submission) => submission,
                    Err(_) => return Task::none(),
                };

                let client = match &self.client {
                    Ok(client) => client.clone(),
                    Err(e) => {
                        let outcome = Err(e.clone());
                        self.state.finish_submit(outcome, self.store.as_mut());
                        return Task::none();
                    }
                };

                self.set_status("Выполняется расчет...");
                return Task::perform(
                    async move { client.calculate(&submission.token, &submission.request).await },
                    Message::CalculationFinished,
                );
            }
            Message::CalculationFinished(outcome) => {
                let status = match &outcome {
                    Ok(_) => "Расчет выполнен".to_string(),
                    Err(e) => format!("Ошибка: {}", e.error_code()),
                };
                self.set_status(status);
                self.state.finish_submit(outcome, self.store.as_mut());
            }
            Message::TokenExchanged(outcome) => {
                self.state.finish_token_exchange(outcome, self.store.as_mut());
            }
            Message::ToggleJustification => {
                self.state.toggle_justification();
            }
            Message::Export(format) => match self.state.export(format) {
                Ok(file) => {
                    return Task::perform(platform::save_export(file), Message::ExportFinished);
                }
                Err(e) => {
                    tracing::warn!("Export failed: {}", e);
                    self.set_status(e.user_message());
                }
            },
            Message::ExportFinished(outcome) => match outcome {
                Ok(Some(location)) => {
                    self.state.notice = Some(format!("Отчет сохранен: {}", location));
                }
                Ok(None) => {
                    self.set_status("Экспорт отменен");
                }
                Err(e) => {
                    tracing::warn!("Saving export failed: {}", e);
                    self.set_status(e.user_message());
                }
            },
        }

        Task::none()
    }

    fn view(&self) -> Element<'_, Message> {
        let content = column![
            ui::header::view_header(WINDOW_TITLE),
            ui::token_panel::view_token_panel(&self.state),
            ui::input_panel::view_input_panel(&self.state),
            ui::results_panel::view_results_panel(&self.state),
            ui::status_bar::view_status_bar(&self.state, &self.status),
        ]
        .spacing(12)
        .padding(16)
        .max_width(720);

        container(scrollable(container(content).center_x(Length::Fill)))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scaffold_gui=info,scaffold_core=info".into()),
        )
        .init();

    run()
}

#[cfg(target_arch = "wasm32")]
fn main() -> iced::Result {
    console_error_panic_hook::set_once();
    run()
}

fn run() -> iced::Result {
    iced::application(App::new, App::update, App::view)
        .title(App::title)
        .window_size((760.0, 900.0))
        .run()
}
