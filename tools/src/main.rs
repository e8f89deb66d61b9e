//! city-runner: headless driver for the City Clicker simulation.
//!
//! Usage:
//!   city-runner --ticks 600 --autoplay
//!   city-runner --save city.json --journal journal.db --ipc-mode
//!
//! Loads the save (or starts a new city), advances the clock, journals
//! every engine event, and saves on the way out.

use anyhow::Result;
use cityclicker_core::{
    command::PlayerCommand,
    engine::CityEngine,
    save::{SaveGateway, DEFAULT_SAVE_FILE},
    snapshot::{CityView, SNAPSHOT_INTERVAL},
    store::CityJournal,
    types::SessionId,
    zone::ZoneType,
    CityConfig, CityError,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick { count: u64 },
    Command { command: PlayerCommand },
    Save,
    Quit,
}

#[derive(serde::Serialize)]
struct IpcError<'a> {
    error:   &'a str,
    message: String,
}

struct Runner {
    engine:     CityEngine,
    journal:    CityJournal,
    session_id: SessionId,
    gateway:    SaveGateway,
}

impl Runner {
    fn tick(&mut self, count: u64) {
        for _ in 0..count {
            self.engine.tick();
            if self.engine.snapshot().day % SNAPSHOT_INTERVAL == 0 {
                if let Err(e) = self.journal.save_snapshot(&self.session_id, self.engine.snapshot()) {
                    log::error!("Journal snapshot failed: {e}");
                }
            }
        }
        self.flush_events();
    }

    fn execute(&mut self, command: &PlayerCommand) -> Result<(), CityError> {
        log::debug!("command {}", command.name());
        let outcome = self.engine.execute(command).map(|_| ());
        if outcome.is_ok() && *command == PlayerCommand::Reset {
            if let Err(e) = self.gateway.discard() {
                log::warn!("Could not remove save file: {e}");
            }
        }
        self.flush_events();
        outcome
    }

    /// Move buffered engine events into the journal. A journal failure is
    /// logged and the events are lost; the city itself is unaffected.
    fn flush_events(&mut self) {
        let events = self.engine.drain_events();
        if events.is_empty() {
            return;
        }
        if let Err(e) = self.journal.append_events(&self.session_id, &events) {
            log::error!("Journal write failed, {} events lost: {e}", events.len());
        }
    }

    /// Save and report; a failed save never stops the shutdown.
    fn save(&self) -> bool {
        match self.gateway.save(self.engine.snapshot()) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Could not save to {}: {e}", self.gateway.path().display());
                eprintln!("warning: progress was not saved: {e}");
                false
            }
        }
    }

    /// One greedy step: zone wherever demand allows, then buy the
    /// cheapest affordable upgrade.
    fn autoplay_step(&mut self) {
        let economy = self.engine.economy().clone();
        for zone in ZoneType::ALL {
            if self.engine.snapshot().demand[zone] >= economy.min_zone_demand {
                let _ = self.execute(&PlayerCommand::Zone { zone });
            }
        }
        let treasury = self.engine.snapshot().treasury;
        let pick = self
            .engine
            .list_available()
            .into_iter()
            .find(|u| u.cost <= treasury)
            .map(|u| u.id.clone());
        if let Some(id) = pick {
            let _ = self.execute(&PlayerCommand::BuyUpgrade { id });
        }
    }

    /// Batch mode: advance `ticks` days, then print the summary.
    fn run_batch(&mut self, ticks: u64, autoplay: bool) -> Result<()> {
        for _ in 0..ticks {
            if autoplay {
                self.autoplay_step();
            }
            self.tick(1);
        }
        print_summary(self)
    }

    /// Final flush and save, run however the session ended.
    fn shutdown(&mut self) -> bool {
        self.flush_events();
        self.save()
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ticks = parse_arg(&args, "--ticks", 60u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let autoplay = args.iter().any(|a| a == "--autoplay");
    let save_path = string_arg(&args, "--save").unwrap_or(DEFAULT_SAVE_FILE);
    let journal_path = string_arg(&args, "--journal").unwrap_or(":memory:");
    let data_dir = string_arg(&args, "--data-dir");

    if !ipc_mode {
        println!("City Clicker / city-runner");
        println!("  ticks:     {ticks}");
        println!("  save:      {save_path}");
        println!("  journal:   {journal_path}");
        println!("  data_dir:  {}", data_dir.unwrap_or("(built-in)"));
        println!();
    }

    let config = match data_dir {
        Some(dir) => CityConfig::load(dir)?,
        None => CityConfig::standard(),
    };
    let gateway = SaveGateway::new(save_path);
    let state = gateway.load_or_default(&config.economy);
    let engine = CityEngine::with_state(config, state);

    let city_name = engine.snapshot().city_name.clone();
    let (journal, session_id) = match open_journal(journal_path, &city_name) {
        Ok(opened) => opened,
        Err(e) => {
            log::error!("Journal {journal_path} unavailable ({e}); journaling in memory");
            open_journal(":memory:", &city_name)?
        }
    };

    let mut runner = Runner { engine, journal, session_id, gateway };

    let outcome = if ipc_mode {
        run_ipc_loop(&mut runner)
    } else {
        runner.run_batch(ticks, autoplay)
    };
    runner.shutdown();
    outcome
}

fn open_journal(path: &str, city_name: &str) -> Result<(CityJournal, SessionId)> {
    let journal = CityJournal::open(path)?;
    journal.migrate()?;
    let session_id = journal.start_session(city_name, env!("CARGO_PKG_VERSION"))?;
    Ok((journal, session_id))
}

fn run_ipc_loop(runner: &mut Runner) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err = IpcError { error: "bad_request", message: e.to_string() };
                writeln!(stdout, "{}", serde_json::to_string(&err)?)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => write_view(&mut stdout, runner)?,
            IpcCommand::Tick { count } => {
                runner.tick(count);
                write_view(&mut stdout, runner)?;
            }
            IpcCommand::Command { command } => match runner.execute(&command) {
                Ok(()) => write_view(&mut stdout, runner)?,
                Err(e) => {
                    let err = IpcError { error: e.kind(), message: e.to_string() };
                    writeln!(stdout, "{}", serde_json::to_string(&err)?)?;
                }
            },
            IpcCommand::Save => {
                if runner.save() {
                    write_view(&mut stdout, runner)?;
                } else {
                    let err = IpcError { error: "save_failed", message: "see log".into() };
                    writeln!(stdout, "{}", serde_json::to_string(&err)?)?;
                }
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn write_view(out: &mut impl Write, runner: &Runner) -> Result<()> {
    let view = CityView::capture(&runner.engine);
    writeln!(out, "{}", serde_json::to_string(&view)?)?;
    Ok(())
}

fn print_summary(runner: &Runner) -> Result<()> {
    let view = CityView::capture(&runner.engine);
    let state = &view.state;
    let count = |event_type: &str| {
        runner
            .journal
            .event_count(&runner.session_id, event_type)
            .unwrap_or_else(|e| {
                log::warn!("Journal query failed: {e}");
                0
            })
    };
    let rejected = count("action_rejected");
    let purchases = count("upgrade_purchased");

    println!("=== CITY SUMMARY ===");
    println!("  session:     {}", runner.session_id);
    println!("  city:        {}", state.city_name);
    println!("  date:        {} (day {})", view.date, state.day);
    println!("  treasury:    {:.2}", state.treasury);
    println!("  population:  {:.0}", state.population);
    println!("  income/tick: {:.2}", view.income_per_tick);
    println!("  growth/tick: {:.2}", view.growth_per_tick);
    println!("  tax rate:    {:.2}", state.tax_rate);
    println!("  upgrades:    {} owned, {purchases} bought this session", state.owned_upgrades.len());
    println!("  rejected:    {rejected}");

    println!();
    println!("=== ZONES ===");
    for (zone, count) in state.zone_counts.iter() {
        println!("  {:<12} parcels: {:>5} | demand: {:>6.2}", zone.name(), count, state.demand[zone]);
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cityclicker_core::EconomyConfig;

    /// A runner whose journal has no tables, so every journal write fails.
    fn runner_with_broken_journal(dir: &tempfile::TempDir) -> Runner {
        Runner {
            engine:     CityEngine::standard(),
            journal:    CityJournal::in_memory().unwrap(),
            session_id: "unjournaled".into(),
            gateway:    SaveGateway::new(dir.path().join("city.json")),
        }
    }

    #[test]
    fn journal_failure_does_not_stop_play_or_save() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        let mut runner = runner_with_broken_journal(&dir);

        runner.execute(&PlayerCommand::Zone { zone: ZoneType::Commercial }).unwrap();
        runner.tick(SNAPSHOT_INTERVAL);
        runner.autoplay_step();
        runner.run_batch(5, false).unwrap();
        assert_eq!(runner.engine.snapshot().day, SNAPSHOT_INTERVAL + 5);

        assert!(runner.shutdown());
        let saved = runner.gateway.load(&EconomyConfig::default()).unwrap();
        assert_eq!(&saved, runner.engine.snapshot());
    }

    #[test]
    fn reset_command_discards_the_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = runner_with_broken_journal(&dir);
        runner.tick(3);
        assert!(runner.save());
        assert!(runner.gateway.path().exists());

        runner.execute(&PlayerCommand::Reset).unwrap();
        assert!(!runner.gateway.path().exists());
    }
}
