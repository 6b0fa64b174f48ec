use std::{fs, path::PathBuf, sync::Arc};

use crate::{
    command::{Command, USAGE, split_item},
    config::{ConfigManager, MemprofConfig},
    event::{AppEvent, Event, EventHandler},
    plot::{PngSink, Plotter},
    sampler::{ExportMode, Family, Sampler},
    ui::{
        dashboard::{DashboardWidget, Watched},
        state::UiState,
    },
};
use color_eyre::eyre::Result;
use log::*;
use ratatui::{
    DefaultTerminal, Frame,
    crossterm::event::{KeyCode, KeyEvent, KeyModifiers},
};

/// Keys printed per line by `ls`.
const KEYS_PER_LINE: usize = 6;

/// What the interface should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The sampler, the plotter and the data directory the commands act on.
pub struct Session {
    pub sampler: Sampler,
    pub plotter: Plotter<PngSink>,
    data_dir: PathBuf,
}

impl Session {
    pub fn new(config: &MemprofConfig) -> Result<Self> {
        ensure_dirs(config)?;
        Ok(Self {
            sampler: Sampler::new(Arc::new(config.source()), config.sampler_settings()),
            plotter: Plotter::new(PngSink::new(config.font_path.as_deref()), &config.plot_dir),
            data_dir: config.data_dir.clone(),
        })
    }

    /// Apply reloaded settings. Collection already running keeps its interval.
    pub fn reconfigure(&mut self, config: &MemprofConfig) -> Result<()> {
        ensure_dirs(config)?;
        self.sampler.configure(config.sampler_settings());
        self.plotter = Plotter::new(PngSink::new(config.font_path.as_deref()), &config.plot_dir);
        self.data_dir = config.data_dir.clone();
        Ok(())
    }

    /// Parse and run one command line, reporting the outcome in the output pane.
    pub fn execute(&mut self, line: &str) -> Flow {
        if line.trim().is_empty() {
            return Flow::Continue;
        }
        info!(target: "memprof", "> {}", line.trim());
        match line.parse::<Command>() {
            Ok(command) => match self.dispatch(command) {
                Ok(flow) => flow,
                Err(e) => {
                    error!(target: "memprof", "{}", e);
                    Flow::Continue
                }
            },
            Err(e) => {
                error!(target: "memprof", "{}", e);
                if e.shows_usage() {
                    print_usage();
                }
                Flow::Continue
            }
        }
    }

    fn dispatch(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Start => {
                if self.sampler.start() {
                    info!(target: "memprof", "Collecting started");
                } else {
                    warn!(target: "memprof", "Already collecting");
                }
            }
            Command::Stop => {
                if self.sampler.stop() {
                    info!(target: "memprof", "Collecting stopped");
                } else {
                    warn!(target: "memprof", "Not collecting");
                }
            }
            Command::List { family } => {
                let family: Family = family.parse()?;
                let keys = self.sampler.list_keys(family);
                if keys.is_empty() {
                    info!(target: "memprof", "No {} items yet", family);
                }
                for chunk in keys.chunks(KEYS_PER_LINE) {
                    info!(target: "memprof", "{}", chunk.join("  "));
                }
            }
            Command::Plot { item } => {
                let (family, key) = split_item(&item)?;
                let path = self.plotter.plot(&self.sampler, family, key)?;
                info!(target: "memprof", "Saved {}", path.display());
            }
            Command::PlotDelta { item } => {
                let (family, key) = split_item(&item)?;
                let path = self.plotter.plot_delta(&self.sampler, family, key)?;
                info!(target: "memprof", "Saved {}", path.display());
            }
            Command::Export {
                mode,
                cpu_file,
                vm_file,
            } => {
                let mode: ExportMode = mode.parse()?;
                let cpu_path = self.export_path(mode, &cpu_file);
                let vm_path = self.export_path(mode, &vm_file);
                self.sampler.export(mode, &cpu_path, &vm_path)?;
                info!(
                    target: "memprof",
                    "Data exported to {} and {}",
                    cpu_path.display(),
                    vm_path.display()
                );
            }
            Command::Import { cpu_file, vm_file } => {
                let cpu_path = self.data_dir.join(cpu_file);
                let vm_path = self.data_dir.join(vm_file);
                self.sampler.import(&cpu_path, &vm_path)?;
                info!(
                    target: "memprof",
                    "Data imported from {} and {}",
                    cpu_path.display(),
                    vm_path.display()
                );
            }
            Command::Compare {
                file_a,
                file_b,
                item,
            } => {
                let (family, key) = split_item(&item)?;
                let path = self.plotter.plot_comparison(
                    &self.data_dir.join(file_a),
                    &self.data_dir.join(file_b),
                    family,
                    key,
                )?;
                info!(target: "memprof", "Saved {}", path.display());
            }
            Command::Quit => {
                self.sampler.stop();
                return Ok(Flow::Quit);
            }
            Command::Help => print_usage(),
        }
        Ok(Flow::Continue)
    }

    /// `{data_dir}/{abs|diff}_{file}`
    fn export_path(&self, mode: ExportMode, file: &str) -> PathBuf {
        self.data_dir.join(format!("{}_{}", mode.prefix(), file))
    }
}

pub struct App {
    pub running: bool,
    pub events: EventHandler,
    pub config: ConfigManager,
    pub session: Session,
    pub ui_state: UiState,
    watch: Vec<(Family, String)>,
}

impl App {
    pub fn new(config_path: PathBuf) -> Result<Self> {
        let events = EventHandler::new();
        let config = ConfigManager::new(config_path, events.clone_sender())?;
        let current = config.current();
        Ok(Self {
            running: true,
            events,
            config,
            session: Session::new(&current)?,
            ui_state: UiState::default(),
            watch: parse_watch(&current.watch),
        })
    }

    /// Run the application's main loop.
    pub async fn run(&mut self, mut terminal: DefaultTerminal) -> Result<()> {
        info!(target: "memprof", "Type h for help");
        while self.running {
            terminal.draw(|frame| self.draw(frame))?;
            match self.events.next().await? {
                Event::Tick => self.tick(),
                Event::Crossterm(event) => match event {
                    crossterm::event::Event::Key(key_event)
                        if key_event.kind == crossterm::event::KeyEventKind::Press =>
                    {
                        self.handle_key_events(key_event)?
                    }
                    _ => {}
                },
                Event::App(app_event) => match app_event {
                    AppEvent::Reload => self.reload_config(),
                    AppEvent::Quit => self.quit(),
                },
            }
        }
        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        let sampler = &self.session.sampler;
        let status = sampler.status();
        let watched: Vec<Watched> = self
            .watch
            .iter()
            .map(|(family, key)| Watched {
                family: *family,
                key: key.clone(),
                values: sampler.get_series(*family, key).unwrap_or_default(),
            })
            .collect();
        let mut dashboard = DashboardWidget {
            ui: &self.ui_state,
            status: &status,
            watched: &watched,
        };
        let area = frame.area();
        frame.render_widget(&mut dashboard, area);
        frame.set_cursor_position(dashboard.cursor_position(area));
    }

    /// Handles the key events and updates the state of [`App`].
    pub fn handle_key_events(&mut self, key_event: KeyEvent) -> Result<()> {
        let input = &mut self.ui_state.input;
        match key_event.code {
            KeyCode::Esc => self.events.send(AppEvent::Quit),
            KeyCode::Char('c' | 'C') if key_event.modifiers == KeyModifiers::CONTROL => {
                self.events.send(AppEvent::Quit)
            }
            KeyCode::Char(c) => input.insert(c),
            KeyCode::Backspace => input.backspace(),
            KeyCode::Delete => input.delete(),
            KeyCode::Left => input.left(),
            KeyCode::Right => input.right(),
            KeyCode::Home => input.home(),
            KeyCode::End => input.end(),
            KeyCode::Up => input.older(),
            KeyCode::Down => input.newer(),
            KeyCode::Enter => {
                let line = input.submit();
                if self.session.execute(&line) == Flow::Quit {
                    self.events.send(AppEvent::Quit);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Handles the tick event of the terminal.
    fn tick(&mut self) {
        self.ui_state.tick();
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.session.sampler.stop();
        self.running = false;
    }

    fn reload_config(&mut self) {
        debug!(target: "App", "Reload!");
        match self.config.reload() {
            Ok(config) => {
                if let Err(e) = self.session.reconfigure(&config) {
                    error!(target: "App", "{}", e);
                }
                self.watch = parse_watch(&config.watch);
                info!(target: "Config", "Reloaded; a new interval applies from the next s");
            }
            Err(e) => error!(target: "App", "{}", e),
        }
    }
}

fn print_usage() {
    for line in USAGE.lines() {
        info!(target: "memprof", "{}", line);
    }
}

fn ensure_dirs(config: &MemprofConfig) -> Result<()> {
    fs::create_dir_all(&config.plot_dir)?;
    fs::create_dir_all(&config.data_dir)?;
    Ok(())
}

/// Valid `family.key` entries of the watch list, in order.
fn parse_watch(items: &[String]) -> Vec<(Family, String)> {
    items
        .iter()
        .filter_map(|item| match split_item(item) {
            Ok((family, key)) => Some((family, key.to_string())),
            Err(e) => {
                warn!(target: "Config", "Ignoring watch item {:?}: {}", item, e);
                None
            }
        })
        .collect()
}
