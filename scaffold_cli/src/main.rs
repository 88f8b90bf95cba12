//! # Scaffolding Calculator CLI
//!
//! Terminal front end over the same view state as the GUI. Values missing
//! from the command line are asked for interactively unless `--no-prompt`
//! is given or stdin is not a terminal.
//!
//! ```text
//! scaffold calculate --location outside --length 12 --height 9
//! scaffold export --format pdf --out-dir reports
//! scaffold --url "https://calc.example.ru/?userId=42&paymentId=p-9" token show
//! ```

mod cli;

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use scaffold_core::form::{InsideType, Location};
use scaffold_core::launch::{LaunchParams, LaunchUrl};
use scaffold_core::token_store::{FileTokenStore, TokenStore};
use scaffold_core::{file_io, ApiClient, CalcError, CalcResult, CalculationResult, Config, ViewState};

use cli::{CalculateArgs, Cli, Commands, TokenCommands};

// ============================================================================
// Prompts
// ============================================================================

/// Read one trimmed line; `None` on EOF or I/O failure.
fn prompt_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    if io::stdout().flush().is_err() {
        return None;
    }

    let mut input = String::new();
    match io::stdin().lock().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim().to_string()),
    }
}

/// Numbered choice among `options`, re-asked until valid.
fn prompt_choice<T: Copy>(question: &str, options: &[(T, &str)]) -> Option<T> {
    println!("{}", question);
    for (i, (_, label)) in options.iter().enumerate() {
        println!("  [{}] {}", i + 1, label);
    }

    loop {
        let answer = prompt_line("> ")?;
        match answer.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Some(options[n - 1].0),
            _ => println!("Введите число от 1 до {}", options.len()),
        }
    }
}

// ============================================================================
// Calculation
// ============================================================================

/// Copy command-line values into the form.
fn apply_args(state: &mut ViewState, args: &CalculateArgs) {
    if let Some(token) = &args.token {
        state.set_token(token.clone());
    }
    if let Some(location) = args.location {
        state.select_location(location.into());
    }
    if let Some(inside_type) = args.inside_type {
        state.select_inside_type(inside_type.into());
    }
    apply_field_args(state, args);
}

/// Copy command-line field values for the fields now visible.
fn apply_field_args(state: &mut ViewState, args: &CalculateArgs) {
    for &name in state.visible_fields() {
        if let Some(value) = args.field(name) {
            state.edit_field(name, value);
        }
    }
}

/// Ask for whatever the form still lacks. Field values given on the
/// command line count once the prompted location makes them visible.
fn prompt_missing(state: &mut ViewState, args: &CalculateArgs) {
    if state.form.location.is_none() {
        let options: Vec<(Location, &str)> = Location::ALL.iter().map(|&l| (l, l.display_name())).collect();
        if let Some(location) = prompt_choice("Где будут устанавливаться леса?", &options) {
            state.select_location(location);
        }
    }

    if state.form.location == Some(Location::Inside) && state.form.inside_type.is_none() {
        let options: Vec<(InsideType, &str)> = InsideType::ALL.iter().map(|&t| (t, t.display_name())).collect();
        if let Some(inside_type) = prompt_choice("Какие работы выполняются?", &options) {
            state.select_inside_type(inside_type);
        }
    }

    apply_field_args(state, args);
    for &name in state.visible_fields() {
        if state.form.field(name).trim().is_empty() {
            if let Some(value) = prompt_line(&format!("{}: ", name.label())) {
                state.edit_field(name, value);
            }
        }
    }

    if state.token.trim().is_empty() {
        if let Some(token) = prompt_line("Токен доступа: ") {
            state.set_token(token);
        }
    }
}

/// Process the launch parameters the way the GUI does at startup: store a
/// direct token, or exchange payment ids for one.
async fn mount_launch(
    launch: &LaunchParams,
    client: &CalcResult<ApiClient>,
    store: &mut dyn TokenStore,
) -> ViewState {
    let mut state = ViewState::new();
    let plan = state.mount(launch, store);

    if let Some(exchange) = plan.exchange {
        let outcome = match client {
            Ok(client) => client.exchange_payment(&exchange.user_id, &exchange.payment_id).await,
            Err(e) => Err(e.clone()),
        };
        state.finish_token_exchange(outcome, store);
    }
    if let Some(message) = state.error() {
        eprintln!("{}", message);
    }
    if let Some(notice) = &state.notice {
        eprintln!("{}", notice);
    }

    state
}

/// Fill the form of a mounted state and submit it.
async fn calculate(
    mut state: ViewState,
    args: &CalculateArgs,
    client: &ApiClient,
    store: &mut dyn TokenStore,
) -> CalcResult<ViewState> {
    apply_args(&mut state, args);
    if !args.no_prompt && io::stdin().is_terminal() {
        prompt_missing(&mut state, args);
    }

    let submission = state.begin_submit(store)?;
    tracing::info!(location = ?submission.request.location, "Submitting calculation");
    let outcome = client.calculate(&submission.token, &submission.request).await;
    state.finish_submit(outcome.clone(), store);
    outcome?;

    Ok(state)
}

fn print_result(result: &CalculationResult, json: bool) -> CalcResult<()> {
    if json {
        let out = serde_json::to_string_pretty(result).map_err(|e| CalcError::SerializationError {
            reason: e.to_string(),
        })?;
        println!("{}", out);
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  РЕЗУЛЬТАТ РАСЧЕТА");
    println!("═══════════════════════════════════════");
    println!();
    println!("Расчетный объем работ: {} м²", result.volume_display());
    if !result.formula.is_empty() {
        println!("Формула расчета: {}", result.formula);
    }
    if !result.formula_breakdown.is_empty() {
        println!("где:");
        for line in &result.formula_breakdown {
            println!("  {}", line);
        }
    }
    if let Some(coefficient) = &result.coefficient {
        println!();
        println!("{}", coefficient.explanation);
        println!("Формула коэффициента: {}", coefficient.formula);
        let value = coefficient.display_value();
        if !value.is_empty() {
            println!("Значение коэффициента: {}", value);
        }
    }
    if let Some(justification) = &result.justification {
        println!();
        println!("Обоснование. {}:", justification.title);
        println!("  {}", justification.text);
    }
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

/// Report where the document went. Under `--json` stdout carries only the
/// result, so the line goes to `err`.
fn announce_saved<'a>(out: &'a mut dyn Write, err: &'a mut dyn Write, path: &Path, json: bool) {
    let target = if json { err } else { out };
    if let Err(e) = writeln!(target, "Отчет сохранен: {}", path.display()) {
        tracing::warn!("Could not print save location: {}", e);
    }
}

fn open_store(token_file: Option<&Path>) -> CalcResult<FileTokenStore> {
    match token_file {
        Some(path) => Ok(FileTokenStore::new(path)),
        None => FileTokenStore::default_location(),
    }
}

fn token_command(command: TokenCommands, store: &mut dyn TokenStore) -> CalcResult<()> {
    match command {
        TokenCommands::Set { token } => {
            let token = token.trim();
            if token.is_empty() {
                return Err(CalcError::MissingToken);
            }
            store.save(token)?;
            println!("Токен сохранен.");
        }
        TokenCommands::Show => match store.load() {
            Some(token) => println!("{}", token),
            None => println!("Токен не сохранен."),
        },
        TokenCommands::Clear => {
            store.clear()?;
            println!("Токен удален.");
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> CalcResult<()> {
    let Cli {
        api_url,
        token_file,
        url,
        command,
    } = cli;

    let mut config = Config::load();
    if let Some(api_url) = api_url {
        config = config.with_api_base_url(api_url);
    }

    let mut store = open_store(token_file.as_deref())?;
    tracing::debug!("Token file: {}", store.path().display());

    let launch = match url.as_deref() {
        Some(url) => LaunchUrl::parse(url)?.params,
        None => LaunchParams::default(),
    };

    let client = ApiClient::new(config);
    let state = mount_launch(&launch, &client, &mut store).await;

    match command {
        Commands::Token { command } => token_command(command, &mut store),
        Commands::Redeem { user_id, payment_id } => {
            let client = client?;
            let token = client.exchange_payment(&user_id, &payment_id).await?;
            store.save(&token)?;
            println!("Оплата подтверждена, токен сохранен.");
            Ok(())
        }
        Commands::Calculate(args) => {
            let client = client?;
            let state = calculate(state, &args, &client, &mut store).await?;
            match state.result() {
                Some(result) => print_result(result, args.json),
                None => Err(CalcError::NoResult),
            }
        }
        Commands::Export { calc, format, out_dir } => {
            let client = client?;
            let state = calculate(state, &calc, &client, &mut store).await?;
            if let Some(result) = state.result() {
                print_result(result, calc.json)?;
            }

            let file = state.export(format.into())?;
            let path = out_dir.join(file.filename);
            file_io::write_atomic(&path, &file.bytes)?;
            announce_saved(&mut io::stdout(), &mut io::stderr(), &path, calc.json);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scaffold_cli=warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(code = e.error_code(), "Command failed: {}", e);
            eprintln!("Ошибка: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cli::{InsideTypeArg, LocationArg};
    use scaffold_core::form::FieldName;
    use scaffold_core::token_store::MemoryTokenStore;

    #[test]
    fn test_apply_args_fills_only_active_fields() {
        let args = CalculateArgs {
            location: Some(LocationArg::Inside),
            inside_type: Some(InsideTypeArg::Ceiling),
            room_width: Some("5".into()),
            room_length: Some("6".into()),
            height: Some("9".into()),
            token: Some("tok".into()),
            ..Default::default()
        };

        let mut state = ViewState::new();
        apply_args(&mut state, &args);

        assert_eq!(state.form.location, Some(Location::Inside));
        assert_eq!(state.form.inside_type, Some(InsideType::Ceiling));
        assert_eq!(state.form.field(FieldName::RoomWidth), "5");
        assert_eq!(state.form.field(FieldName::RoomLength), "6");
        assert_eq!(state.form.field(FieldName::Height), "");
        assert_eq!(state.token, "tok");
    }

    #[test]
    fn test_apply_args_without_location_sets_nothing() {
        let args = CalculateArgs {
            length: Some("10".into()),
            ..Default::default()
        };

        let mut state = ViewState::new();
        apply_args(&mut state, &args);

        assert_eq!(state.form.location, None);
        assert_eq!(state.form.field(FieldName::Length), "");
    }

    #[test]
    fn test_field_args_apply_once_location_is_chosen() {
        let args = CalculateArgs {
            length: Some("10".into()),
            height: Some("4".into()),
            ..Default::default()
        };

        let mut state = ViewState::new();
        apply_args(&mut state, &args);
        state.select_location(Location::Outside);
        apply_field_args(&mut state, &args);

        assert_eq!(state.form.field(FieldName::Length), "10");
        assert_eq!(state.form.field(FieldName::Height), "4");
    }

    #[tokio::test]
    async fn test_launch_url_token_is_stored() {
        let launch = LaunchUrl::parse("https://calc.example.ru/?token=url-token").unwrap();
        let client = ApiClient::new(Config::default());
        let mut store = MemoryTokenStore::new();

        let state = mount_launch(&launch.params, &client, &mut store).await;

        assert_eq!(state.token, "url-token");
        assert_eq!(store.load().as_deref(), Some("url-token"));
    }

    #[tokio::test]
    async fn test_launch_payment_without_client_surfaces_error() {
        let launch = LaunchUrl::parse("https://calc.example.ru/?userId=42&paymentId=p-9").unwrap();
        let client = Err(CalcError::Config {
            reason: "bad url".into(),
        });
        let mut store = MemoryTokenStore::with_token("old");

        let state = mount_launch(&launch.params, &client, &mut store).await;

        assert!(!state.busy);
        assert!(state.error().is_some());
        assert_eq!(state.token, "old");
        assert_eq!(store.load().as_deref(), Some("old"));
    }

    #[test]
    fn test_saved_line_stays_off_stdout_under_json() {
        let path = Path::new("reports/raschet-lesov.doc");
        let (mut out, mut err) = (Vec::new(), Vec::new());

        announce_saved(&mut out, &mut err, path, true);
        assert!(out.is_empty());
        assert!(String::from_utf8(err).unwrap().starts_with("Отчет сохранен:"));

        let (mut out, mut err) = (Vec::new(), Vec::new());
        announce_saved(&mut out, &mut err, path, false);
        assert!(err.is_empty());
        assert!(String::from_utf8(out).unwrap().contains("raschet-lesov.doc"));
    }

    #[test]
    fn test_token_command_round_trip() {
        let path = std::env::temp_dir().join("scaffold_cli_test_token.json");
        let _ = std::fs::remove_file(&path);
        let mut store = FileTokenStore::new(&path);

        token_command(TokenCommands::Set { token: " abc ".into() }, &mut store).unwrap();
        assert_eq!(store.load().as_deref(), Some("abc"));

        token_command(TokenCommands::Clear, &mut store).unwrap();
        assert_eq!(store.load(), None);

        assert_eq!(
            token_command(TokenCommands::Set { token: "  ".into() }, &mut store),
            Err(CalcError::MissingToken)
        );
    }
}
