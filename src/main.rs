use anyhow::Context;
use log::{error, LevelFilter};
use std::{
    io::{self, BufRead},
    sync::{mpsc, Arc},
    thread,
};
use weather_notifier::{
    app::App,
    config::Config,
    notify::DesktopNotifier,
    shell::{Shell, ShellEvent},
    weather::OpenWeatherMap,
};

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_module("weather_notifier", LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = Config::load()?;
    let client = Arc::new(OpenWeatherMap::new(&config));
    let sink = Arc::new(DesktopNotifier::new(&config.app_name));
    let app = App::new(&config, client, sink)?;

    let (sender, receiver) = mpsc::channel();

    // Ctrl-c/SIGTERM go through the shell so it can stop the notification
    // loop before we exit
    let interrupt = sender.clone();
    ctrlc::set_handler(move || {
        // If the shell is already gone there's nothing left to interrupt
        let _ = interrupt.send(ShellEvent::Interrupt);
    })
    .context("Error setting signal handler")?;

    // Reading stdin blocks, so do it off the main thread. This thread is never
    // joined; it dies with the process.
    thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if sender.send(ShellEvent::Line(line)).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        error!("Error reading input: {err}");
                        break;
                    }
                }
            }
            let _ = sender.send(ShellEvent::Eof);
        })
        .context("Error spawning input thread")?;

    Shell::new(app, io::stdout())
        .run(receiver)
        .context("Error writing to terminal")?;
    Ok(())
}
