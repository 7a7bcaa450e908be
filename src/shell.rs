//! Line-based terminal front end. Each line of input is parsed into a
//! [Command] and handed to the matching [App] handler; results are rendered in
//! the current theme's colors.

use crate::{
    app::{App, Status, StatusKind},
    error::CommandError,
    state::{Palette, Theme},
    weather::WeatherReading,
};
use chrono::Local;
use log::{debug, info};
use std::{
    fmt::Display,
    io::{self, Write},
    str::FromStr,
    sync::mpsc::Receiver,
};

const HELP: &str = "\
Commands:
  city <name>        Show the weather for a city (or just type the name)
  notify on|off      Turn hourly notifications on or off
  theme light|dark   Switch color theme
  test               Check that the API key works
  status             Show current settings
  help               Show this message
  quit               Exit";

/// Something that happened on the input side of the shell
#[derive(Debug)]
pub enum ShellEvent {
    Line(String),
    /// Input closed
    Eof,
    /// Ctrl-C or a termination signal
    Interrupt,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    SelectCity(String),
    Notifications(bool),
    Theme(Theme),
    TestApi,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    /// Parse a line of input. Anything that doesn't start with a command word
    /// is taken to be a city name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let (word, argument) = match line.split_once(char::is_whitespace) {
            Some((word, argument)) => (word, argument.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "city" | "get" | "weather" => {
                if argument.is_empty() {
                    return Err(CommandError::EmptyCity);
                }
                Self::SelectCity(argument.into())
            }
            "notify" => match argument.to_lowercase().as_str() {
                "on" | "true" => Self::Notifications(true),
                "off" | "false" => Self::Notifications(false),
                _ => {
                    return Err(CommandError::InvalidArgument {
                        command: "notify",
                        argument: argument.into(),
                        expected: "`on` or `off`",
                    })
                }
            },
            "theme" => match argument.to_lowercase().as_str() {
                "light" => Self::Theme(Theme::Light),
                "dark" => Self::Theme(Theme::Dark),
                _ => {
                    return Err(CommandError::InvalidArgument {
                        command: "theme",
                        argument: argument.into(),
                        expected: "`light` or `dark`",
                    })
                }
            },
            "test" if argument.is_empty() => Self::TestApi,
            "status" if argument.is_empty() => Self::Status,
            "help" | "?" if argument.is_empty() => Self::Help,
            "quit" | "exit" if argument.is_empty() => Self::Quit,
            "" => return Err(CommandError::EmptyCity),
            _ => Self::SelectCity(line.into()),
        };
        Ok(command)
    }
}

pub struct Shell<W> {
    app: App,
    output: W,
}

impl<W: Write> Shell<W> {
    pub fn new(app: App, output: W) -> Self {
        Self { app, output }
    }

    /// Process input events until the user quits or input runs out, then shut
    /// the app down
    pub fn run(&mut self, events: Receiver<ShellEvent>) -> io::Result<()> {
        writeln!(self.output, "{}", self.accent("Weather Notifier"))?;
        writeln!(self.output, "Enter a city to start hourly notifications")?;
        self.prompt()?;

        // A closed channel means every sender is gone, same as EOF
        while let Ok(event) = events.recv() {
            match event {
                ShellEvent::Line(line) if line.trim().is_empty() => {}
                ShellEvent::Line(line) => {
                    debug!("Input: {line:?}");
                    let keep_going = match line.parse::<Command>() {
                        Ok(command) => self.handle(command)?,
                        Err(err) => {
                            self.error(&err)?;
                            true
                        }
                    };
                    if !keep_going {
                        break;
                    }
                }
                ShellEvent::Eof => break,
                ShellEvent::Interrupt => {
                    info!("Interrupted");
                    writeln!(self.output)?;
                    break;
                }
            }
            self.prompt()?;
        }

        self.app.shutdown();
        writeln!(self.output, "Weather Notifier closed")?;
        self.output.flush()
    }

    /// Run a single command. Return `false` if the shell should exit.
    pub fn handle(&mut self, command: Command) -> io::Result<bool> {
        match command {
            Command::SelectCity(city) => match self.app.select_city(&city) {
                Ok((reading, status)) => {
                    self.reading(&reading)?;
                    self.status(&status)?;
                }
                Err(err) => self.error(&err)?,
            },
            Command::Notifications(enabled) => {
                match self.app.set_notifications_enabled(enabled) {
                    Ok(status) => self.status(&status)?,
                    Err(err) => self.error(&err)?,
                }
            }
            Command::Theme(theme) => {
                self.app.set_theme(theme);
                self.status(&Status {
                    kind: StatusKind::Info,
                    text: format!("Switched to {} theme", theme_name(theme)),
                })?;
            }
            Command::TestApi => {
                let (message, status) = self.app.test_api();
                match message {
                    Ok(message) => writeln!(self.output, "{message}")?,
                    Err(err) => self.error(&err)?,
                }
                self.status(&status)?;
            }
            Command::Status => self.settings()?,
            Command::Help => writeln!(self.output, "{HELP}")?,
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn reading(&mut self, reading: &WeatherReading) -> io::Result<()> {
        let palette = self.palette();
        let updated = reading.fetched_at.with_timezone(&Local);
        writeln!(
            self.output,
            "{}",
            palette.accent.paint(&format!(
                "City: {}, {}",
                reading.city, reading.country
            ))
        )?;
        for line in [
            format!("Temperature: {}°C", reading.temperature),
            format!("Humidity: {}%", reading.humidity),
            format!("Wind Speed: {} m/s", reading.wind_speed),
            format!("Condition: {}", reading.condition),
        ] {
            writeln!(self.output, "{}", palette.foreground.paint(&line))?;
        }
        writeln!(
            self.output,
            "{}",
            palette
                .muted
                .paint(&format!("Updated {}", updated.format("%H:%M:%S")))
        )
    }

    fn settings(&mut self) -> io::Result<()> {
        let state = self.app.state();
        let city = state.current_city().unwrap_or_else(|| "--".into());
        let notifications = match (
            state.notifications_enabled(),
            self.app.scheduler().is_running(),
        ) {
            (true, true) => "on",
            (true, false) => "on (not running)",
            (false, _) => "off",
        };
        let theme = theme_name(state.theme());
        let muted = self.palette().muted;
        writeln!(self.output, "{}", muted.paint(&format!("City: {city}")))?;
        writeln!(
            self.output,
            "{}",
            muted.paint(&format!("Hourly notifications: {notifications}"))
        )?;
        writeln!(self.output, "{}", muted.paint(&format!("Theme: {theme}")))
    }

    fn status(&mut self, status: &Status) -> io::Result<()> {
        let palette = self.palette();
        let color = match status.kind {
            StatusKind::Info => palette.muted,
            StatusKind::Success => palette.success,
            StatusKind::Warning => palette.warning,
            StatusKind::Error => palette.error,
        };
        writeln!(self.output, "{}", color.paint(&status.text))
    }

    fn error(&mut self, error: &dyn Display) -> io::Result<()> {
        let color = self.palette().error;
        writeln!(self.output, "{}", color.paint(&format!("Error: {error}")))
    }

    fn prompt(&mut self) -> io::Result<()> {
        write!(self.output, "> ")?;
        self.output.flush()
    }

    fn accent(&self, text: &str) -> String {
        self.palette().accent.paint(text)
    }

    fn palette(&self) -> Palette {
        self.app.state().theme().palette()
    }
}

fn theme_name(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "light",
        Theme::Dark => "dark",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        test_util::{MockSink, MockWeatherClient},
    };
    use std::sync::{mpsc, Arc};

    fn shell(client: Arc<MockWeatherClient>) -> Shell<Vec<u8>> {
        let config = Config {
            notifications_enabled: false,
            poll_interval_ms: 5,
            ..Config::default()
        };
        let app =
            App::new(&config, client, Arc::new(MockSink::default())).unwrap();
        Shell::new(app, Vec::new())
    }

    fn output(shell: &Shell<Vec<u8>>) -> String {
        String::from_utf8(shell.output.clone()).unwrap()
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "city New York".parse::<Command>().unwrap(),
            Command::SelectCity("New York".into())
        );
        assert_eq!(
            "  São Paulo ".parse::<Command>().unwrap(),
            Command::SelectCity("São Paulo".into())
        );
        assert_eq!(
            "NOTIFY off".parse::<Command>().unwrap(),
            Command::Notifications(false)
        );
        assert_eq!(
            "theme dark".parse::<Command>().unwrap(),
            Command::Theme(Theme::Dark)
        );
        assert_eq!("test".parse::<Command>().unwrap(), Command::TestApi);
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Quit);
        // A city that happens to start with a command word
        assert_eq!(
            "test valley".parse::<Command>().unwrap(),
            Command::SelectCity("test valley".into())
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("".parse::<Command>(), Err(CommandError::EmptyCity)));
        assert!(matches!(
            "   ".parse::<Command>(),
            Err(CommandError::EmptyCity)
        ));
        assert!(matches!(
            "city   ".parse::<Command>(),
            Err(CommandError::EmptyCity)
        ));
        assert!(matches!(
            "notify sometimes".parse::<Command>(),
            Err(CommandError::InvalidArgument {
                command: "notify",
                ..
            })
        ));
        assert!(matches!(
            "theme sepia".parse::<Command>(),
            Err(CommandError::InvalidArgument { command: "theme", .. })
        ));
    }

    #[test]
    fn test_handle_select_city() {
        let client = Arc::new(MockWeatherClient::default());
        let mut shell = shell(client.clone());

        assert!(shell
            .handle(Command::SelectCity("London".into()))
            .unwrap());
        let output = output(&shell);
        assert!(output.contains("City: London, GB"));
        assert!(output.contains("Temperature: 15.2°C"));
        assert!(output.contains("Humidity: 70%"));
        assert!(output.contains("Wind Speed: 3.1 m/s"));
        assert!(output.contains("Condition: Clear Sky"));
        assert!(output
            .contains("Notifications are disabled. Showing data for London"));
        assert_eq!(client.fetches(), vec!["London".to_owned()]);
    }

    #[test]
    fn test_handle_error_is_shown() {
        let client = Arc::new(MockWeatherClient::default());
        client.fail();
        let mut shell = shell(client);

        assert!(shell.handle(Command::SelectCity("Lima".into())).unwrap());
        assert!(output(&shell).contains(
            "Error: Rate limit exceeded (HTTP 429). Please wait and try again."
        ));
    }

    #[test]
    fn test_handle_theme_repaints() {
        let mut shell = shell(Arc::new(MockWeatherClient::default()));
        shell.handle(Command::Theme(Theme::Dark)).unwrap();
        shell.handle(Command::Status).unwrap();

        let dark_muted = Theme::Dark.palette().muted.paint("Theme: dark");
        assert!(output(&shell).contains(&dark_muted));
    }

    #[test]
    fn test_run_until_quit() {
        let client = Arc::new(MockWeatherClient::default());
        let mut shell = shell(client.clone());
        let (sender, receiver) = mpsc::channel();
        for line in ["", "Paris", "notify on", "quit", "Oslo"] {
            sender.send(ShellEvent::Line(line.into())).unwrap();
        }

        shell.run(receiver).unwrap();
        // Everything after quit is ignored
        assert_eq!(client.fetches(), vec!["Paris".to_owned()]);
        assert_eq!(shell.app.scheduler().active_loops(), 0);
        let output = output(&shell);
        assert!(output.contains("Hourly notifications enabled"));
        assert!(output.ends_with("Weather Notifier closed\n"));
    }

    #[test]
    fn test_run_until_interrupt() {
        let mut shell = shell(Arc::new(MockWeatherClient::default()));
        let (sender, receiver) = mpsc::channel();
        sender.send(ShellEvent::Line("notify on".into())).unwrap();
        sender.send(ShellEvent::Interrupt).unwrap();

        shell.run(receiver).unwrap();
        assert!(!shell.app.scheduler().is_running());
        assert_eq!(shell.app.scheduler().active_loops(), 0);
    }
}
