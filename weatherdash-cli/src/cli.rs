use std::sync::Arc;

use anyhow::Context;
use chrono::TimeZone;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select, Text};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::mpsc::UnboundedReceiver,
};
use tracing::debug;
use weatherdash_core::{
    Completion, Config, Coordinates, Dashboard, FixedLocator, IpLocator, Locator, RenderSink,
    TemperatureUnit, WeatherClient, provider_from_config,
};

use crate::render::{JsonRenderer, TerminalRenderer};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherdash", version, about = "Weather dashboard for the terminal")]
pub struct Cli {
    /// Enable verbose (debug) logging.
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key and dashboard defaults.
    Configure,

    /// Show the dashboard once and exit.
    Show {
        /// City to look up; without it the current location is used.
        city: Option<String>,

        #[command(flatten)]
        position: PositionArgs,

        /// Temperature unit: celsius or fahrenheit.
        #[arg(long)]
        units: Option<TemperatureUnit>,

        /// Print the dashboard as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Keep the dashboard open and read commands from stdin.
    Interactive {
        #[command(flatten)]
        position: PositionArgs,

        /// Temperature unit to start with.
        #[arg(long)]
        units: Option<TemperatureUnit>,
    },
}

#[derive(Debug, clap::Args)]
pub struct PositionArgs {
    /// Latitude to use instead of IP-based location.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude to use instead of IP-based location.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

impl PositionArgs {
    fn locator(&self) -> anyhow::Result<Arc<dyn Locator>> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Ok(Arc::new(FixedLocator(Coordinates::new(lat, lon)?))),
            _ => Ok(Arc::new(IpLocator::new())),
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, position, units, json } => {
                let config = load_config()?;
                let sink: Arc<dyn RenderSink> = if json {
                    Arc::new(JsonRenderer)
                } else {
                    Arc::new(TerminalRenderer)
                };
                show(&config, city, &position, units, sink).await
            }
            Command::Interactive { position, units } => {
                let config = load_config()?;
                interactive(&config, &position, units).await
            }
        }
    }
}

/// Config from disk with environment overrides applied.
fn load_config() -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    config.apply_env();
    Ok(config)
}

fn build_dashboard(
    config: &Config,
    position: &PositionArgs,
    units: Option<TemperatureUnit>,
    sink: Arc<dyn RenderSink>,
) -> anyhow::Result<(Dashboard, UnboundedReceiver<Completion>)> {
    let provider = provider_from_config(config)?;
    let unit = units.unwrap_or_else(|| config.unit());
    debug!(%unit, fallback = config.default_city(), "Starting dashboard");

    Ok(Dashboard::new(
        WeatherClient::new(provider),
        position.locator()?,
        sink,
        unit,
        config.default_city(),
    ))
}

async fn show(
    config: &Config,
    city: Option<String>,
    position: &PositionArgs,
    units: Option<TemperatureUnit>,
    sink: Arc<dyn RenderSink>,
) -> anyhow::Result<()> {
    let (mut dashboard, mut completions) = build_dashboard(config, position, units, sink)?;

    match city {
        Some(city) => dashboard.search(&city),
        None => dashboard.locate(),
    }
    dashboard.run_until_idle(&mut completions).await;

    if dashboard.state().latest().is_none() {
        anyhow::bail!("no weather data could be loaded");
    }
    Ok(())
}

const INTERACTIVE_HELP: &str = "\
Commands:
  <city>            search for a city
  search <city>     same as above
  locate            use the current location
  c | f             switch to Celsius or Fahrenheit
  help              show this help
  quit              leave the dashboard";

#[derive(Debug, PartialEq)]
enum Input {
    Search(String),
    Locate,
    Unit(TemperatureUnit),
    Help,
    Quit,
    Nothing,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    match head.to_lowercase().as_str() {
        "" => Input::Nothing,
        "quit" | "exit" | "q" => Input::Quit,
        "help" | "?" => Input::Help,
        "locate" => Input::Locate,
        "search" => Input::Search(rest.trim().to_string()),
        "unit" | "units" => match TemperatureUnit::try_from(rest) {
            Ok(unit) => Input::Unit(unit),
            Err(_) => Input::Help,
        },
        "c" | "celsius" => Input::Unit(TemperatureUnit::Celsius),
        "f" | "fahrenheit" => Input::Unit(TemperatureUnit::Fahrenheit),
        _ => Input::Search(line.to_string()),
    }
}

async fn interactive(
    config: &Config,
    position: &PositionArgs,
    units: Option<TemperatureUnit>,
) -> anyhow::Result<()> {
    let (mut dashboard, mut completions) =
        build_dashboard(config, position, units, Arc::new(TerminalRenderer))?;

    println!("{INTERACTIVE_HELP}\n");
    dashboard.locate();

    run_session(
        &mut dashboard,
        &mut completions,
        BufReader::new(tokio::io::stdin()),
    )
    .await
}

/// Feed commands from `input` to the dashboard while applying completions.
/// When input ends, requests still in flight are finished before returning.
async fn run_session<Tz, R>(
    dashboard: &mut Dashboard<Tz>,
    completions: &mut UnboundedReceiver<Completion>,
    input: R,
) -> anyhow::Result<()>
where
    Tz: TimeZone,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    dashboard.run_until_idle(completions).await;
                    break;
                };
                match parse_input(&line) {
                    Input::Search(city) => dashboard.search(&city),
                    Input::Locate => dashboard.locate(),
                    Input::Unit(unit) => dashboard.set_unit(unit),
                    Input::Help => println!("{INTERACTIVE_HELP}"),
                    Input::Quit => break,
                    Input::Nothing => {}
                }
            }
            Some(done) = completions.recv() => dashboard.handle_completion(done),
        }
    }

    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key.trim().to_string());

    let city = Text::new("Fallback city when location is unavailable:")
        .with_default(config.default_city())
        .prompt()
        .context("Failed to read default city")?;
    config.default_city = Some(city.trim().to_string());

    let units = vec![TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit];
    let start = units.iter().position(|u| *u == config.unit()).unwrap_or_default();
    let unit = Select::new("Default temperature unit:", units)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read temperature unit")?;
    config.units = Some(unit);

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use weatherdash_core::{
        Condition, CurrentConditions, CurrentReport, DashboardView, ForecastSample,
        WeatherError, WeatherProvider,
    };

    #[derive(Debug)]
    struct StaticProvider;

    fn report(name: &str) -> CurrentReport {
        let condition = Condition {
            code: 800,
            icon_hint: "01d".into(),
            main: "Clear".into(),
            description: "clear sky".into(),
        };
        CurrentReport {
            name: name.to_string(),
            coordinates: Coordinates::new(51.5, -0.12).unwrap(),
            conditions: CurrentConditions {
                observed_at: Utc::now(),
                temperature_c: 12.0,
                feels_like_c: 11.0,
                humidity_pct: 70,
                pressure_hpa: 1015,
                condition,
                wind_speed_mps: 2.0,
                cloudiness_pct: 0,
                visibility_m: Some(10_000),
                sunrise: None,
                sunset: None,
                country: None,
                utc_offset_secs: 0,
            },
        }
    }

    #[async_trait]
    impl WeatherProvider for StaticProvider {
        async fn current_by_city(&self, city: &str) -> Result<CurrentReport, WeatherError> {
            Ok(report(city))
        }

        async fn current_by_coordinates(
            &self,
            _coordinates: Coordinates,
        ) -> Result<CurrentReport, WeatherError> {
            Ok(report("Here"))
        }

        async fn forecast_by_coordinates(
            &self,
            _coordinates: Coordinates,
        ) -> Result<Vec<ForecastSample>, WeatherError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct LabelSink {
        labels: Mutex<Vec<String>>,
    }

    impl RenderSink for LabelSink {
        fn on_loading_start(&self) {}

        fn on_loading_end(&self) {}

        fn on_error(&self, _message: &str) {}

        fn on_result(&self, view: &DashboardView) {
            self.labels.lock().unwrap().push(view.location_label.clone());
        }
    }

    #[tokio::test]
    async fn closed_input_still_renders_pending_search() {
        let sink = Arc::new(LabelSink::default());
        let (mut dashboard, mut completions) = Dashboard::new(
            WeatherClient::new(Arc::new(StaticProvider)),
            Arc::new(FixedLocator(Coordinates::new(51.5, -0.12).unwrap())),
            sink.clone(),
            TemperatureUnit::Celsius,
            "London",
        );
        dashboard.locate();

        run_session(&mut dashboard, &mut completions, &b"Paris\n"[..]).await.unwrap();

        assert_eq!(dashboard.in_flight(), 0);
        assert_eq!(dashboard.state().latest().unwrap().location_label, "Paris");
        assert_eq!(sink.labels.lock().unwrap().last().map(String::as_str), Some("Paris"));
    }

    #[tokio::test]
    async fn quit_returns_without_waiting() {
        let (mut dashboard, mut completions) = Dashboard::new(
            WeatherClient::new(Arc::new(StaticProvider)),
            Arc::new(FixedLocator(Coordinates::new(51.5, -0.12).unwrap())),
            Arc::new(LabelSink::default()),
            TemperatureUnit::Celsius,
            "London",
        );

        run_session(&mut dashboard, &mut completions, &b"quit\nParis\n"[..]).await.unwrap();

        assert_eq!(dashboard.state().generation(), 0);
    }

    #[test]
    fn bare_text_is_a_search() {
        assert_eq!(parse_input("  New York "), Input::Search("New York".into()));
        assert_eq!(parse_input("search Rio de Janeiro"), Input::Search("Rio de Janeiro".into()));
    }

    #[test]
    fn keywords_map_to_actions() {
        assert_eq!(parse_input("locate"), Input::Locate);
        assert_eq!(parse_input("F"), Input::Unit(TemperatureUnit::Fahrenheit));
        assert_eq!(parse_input("unit celsius"), Input::Unit(TemperatureUnit::Celsius));
        assert_eq!(parse_input("unit kelvin"), Input::Help);
        assert_eq!(parse_input("quit"), Input::Quit);
        assert_eq!(parse_input(""), Input::Nothing);
    }

    #[test]
    fn search_keyword_without_city_is_empty_search() {
        assert_eq!(parse_input("search"), Input::Search(String::new()));
    }

    #[test]
    fn cli_parses_negative_coordinates() {
        let cli = Cli::try_parse_from(["weatherdash", "show", "--lat", "-33.87", "--lon", "151.21"])
            .unwrap();
        match cli.command {
            Command::Show { position, .. } => {
                assert_eq!(position.lat, Some(-33.87));
                assert_eq!(position.lon, Some(151.21));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_requires_both_coordinates() {
        assert!(Cli::try_parse_from(["weatherdash", "show", "--lat", "10"]).is_err());
    }

    #[test]
    fn cli_parses_units() {
        let cli = Cli::try_parse_from(["weatherdash", "show", "Oslo", "--units", "f"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Show { units: Some(TemperatureUnit::Fahrenheit), .. }
        ));
    }
}
