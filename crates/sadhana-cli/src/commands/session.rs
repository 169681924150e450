//! Interactive round in the terminal.
//!
//! The controller is driven from two sources: stdin lines (user gestures)
//! and a 250ms interval (timer ticks and simulated clip endings). After
//! each step the queued outbound requests are executed against the
//! server and every event is printed to stdout as a JSON line. Prompts go
//! to stderr.

use std::time::Duration;

use chrono::Utc;
use clap::Args;
use sadhana_core::api::LOGIN_FAILED;
use sadhana_core::platform::SystemClock;
use sadhana_core::session::{Outbound, Phase, Platform, SaveStatus, SessionController};
use sadhana_core::{ApiClient, Config, Event, TransitionError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::platform::{SimulatedMedia, SimulatedWakeLock};

#[derive(Args)]
pub struct SessionArgs {
    /// Skip login and practise as a guest
    #[arg(long, conflicts_with = "username")]
    guest: bool,
    /// Log in as this user at the auth step
    #[arg(long, requires = "password")]
    username: Option<String>,
    #[arg(long, env = "SADHANA_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

const TICK: Duration = Duration::from_millis(250);

pub fn run(args: SessionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let client = ApiClient::with_timeout(&config.api.base_url, config.api.timeout())?;
    super::runtime()?.block_on(drive(args, config, client))
}

struct Driver {
    controller: SessionController,
    media: SimulatedMedia,
    client: ApiClient,
    args: SessionArgs,
    auto_continue: bool,
}

async fn drive(
    args: SessionArgs,
    config: Config,
    client: ApiClient,
) -> Result<(), Box<dyn std::error::Error>> {
    let media = SimulatedMedia::new(&config.simulation)?;
    let controller = SessionController::new(Platform {
        clock: Box::new(SystemClock),
        media: Box::new(media.clone()),
        wake_lock: Box::new(SimulatedWakeLock::new(config.simulation.wake_lock)),
    });
    let mut driver = Driver {
        controller,
        media,
        client,
        args,
        auto_continue: config.session.auto_continue,
    };
    info!(server = %driver.client.base_url(), "session started");
    prompt(Phase::Disclaimer);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut interval = tokio::time::interval(TICK);
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !driver.handle_input(line.trim()).await? {
                    break;
                }
            }
            _ = interval.tick() => driver.tick(),
        }
        driver.flush().await?;
    }
    info!("session closed");
    Ok(())
}

impl Driver {
    /// Returns false when the user asked to quit.
    async fn handle_input(&mut self, input: &str) -> Result<bool, Box<dyn std::error::Error>> {
        match input {
            "q" => return Ok(false),
            "" => {
                self.advance().await?;
                return Ok(true);
            }
            _ => {}
        }

        let ctl = &mut self.controller;
        let result = match input {
            "i" => {
                ctl.toggle_instructions();
                Ok(())
            }
            "r" => {
                if !ctl.retry_playback() {
                    eprintln!("Er wacht geen audio op een herstart.");
                }
                Ok(())
            }
            "s" => {
                println!("{}", serde_json::to_string(&ctl.snapshot())?);
                Ok(())
            }
            "l" => ctl.logout().map(drop),
            "x" => ctl.reset().map(drop),
            other => {
                eprintln!("onbekende invoer: {other:?}");
                Ok(())
            }
        };
        if let Err(err) = result {
            debug!(error = %err, "input ignored");
        }
        Ok(true)
    }

    /// Enter: the primary action of the current phase.
    async fn advance(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.controller.phase() == Phase::Auth {
            return self.authenticate().await;
        }

        let ctl = &mut self.controller;
        let result: Result<(), TransitionError> = match ctl.phase() {
            Phase::Disclaimer => ctl.acknowledge().map(drop),
            Phase::Auth => Ok(()),
            Phase::Dashboard => ctl.start_round().map(drop),
            Phase::Retention => ctl.tap_retention().map(drop),
            Phase::Summary => ctl.continue_from_summary().map(drop),
            Phase::Breathing | Phase::Meditation => {
                eprintln!("Luister naar de begeleiding...");
                Ok(())
            }
        };
        if let Err(err) = result {
            debug!(error = %err, "enter ignored");
        }
        Ok(())
    }

    async fn authenticate(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let credentials = match (&self.args.username, &self.args.password) {
            (Some(username), Some(password)) if !self.args.guest => Some((username, password)),
            _ => None,
        };
        let Some((username, password)) = credentials else {
            if let Err(err) = self.controller.start_as_guest() {
                debug!(error = %err, "guest start ignored");
            }
            return Ok(());
        };
        match self.client.login(username, password).await {
            Ok(user) => {
                if let Err(err) = self.controller.login_succeeded(user) {
                    debug!(error = %err, "login transition ignored");
                }
            }
            Err(err) => eprintln!("{}", err.user_message(LOGIN_FAILED)),
        }
        Ok(())
    }

    fn tick(&mut self) {
        for event in self.media.due_events(Utc::now()) {
            self.controller.on_media_event(event);
        }
        self.controller.tick();

        let summary_done = matches!(
            self.controller.save_status(),
            SaveStatus::Saved | SaveStatus::Failed(_)
        );
        if self.auto_continue
            && self.controller.phase() == Phase::Summary
            && summary_done
            && !self.controller.is_transition_locked()
        {
            if let Err(err) = self.controller.continue_from_summary() {
                debug!(error = %err, "auto continue ignored");
            }
        }
    }

    /// Execute queued requests, then print what happened.
    async fn flush(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            let outbound = self.controller.drain_outbound();
            if outbound.is_empty() {
                break;
            }
            for request in outbound {
                match request {
                    Outbound::SaveSession(body) => {
                        let result = self.client.save_session(&body).await;
                        self.controller.on_save_finished(result);
                    }
                    Outbound::FetchStats { user_id } => {
                        let result = self.client.fetch_stats(&user_id).await;
                        self.controller.on_stats_loaded(&user_id, result);
                    }
                }
            }
        }

        for event in self.controller.drain_events() {
            println!("{}", serde_json::to_string(&event)?);
            if let Event::PhaseChanged { to, .. } = event {
                prompt(to);
            }
        }
        Ok(())
    }
}

fn prompt(phase: Phase) {
    let hint = match phase {
        Phase::Disclaimer => "[Enter] akkoord  [i] instructies  [q] stoppen",
        Phase::Auth => "[Enter] verder (gast of inloggen)",
        Phase::Dashboard => "[Enter] start ronde  [l] uitloggen",
        Phase::Breathing | Phase::Meditation => "luister...  [r] audio opnieuw  [s] status",
        Phase::Retention => "adem vasthouden...  [Enter] loslaten",
        Phase::Summary => "[Enter] doorgaan  [s] status",
    };
    eprintln!("{phase}: {hint}");
}
