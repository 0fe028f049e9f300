//! Commands the surrounding shell can trigger: pick an input file, start a
//! run, stop it, and open the spreadsheet it produced.

use crate::core::{EventSender, RunSummary, ScrapeSession, SessionConfig, SessionEvent, StopHandle};
use crate::input::load_terms;
use crate::page::BrowserLauncher;
use crate::storage::XlsxSink;
use crate::{ScraperError, ScraperResult};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tokio::task::JoinHandle;

struct ActiveRun {
    stop: StopHandle,
    task: JoinHandle<ScraperResult<RunSummary>>,
}

pub struct Controller {
    config: SessionConfig,
    launcher: Arc<dyn BrowserLauncher>,
    events: EventSender,
    input: Option<PathBuf>,
    active: Option<ActiveRun>,
}

impl Controller {
    pub fn new(config: SessionConfig, launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            config,
            launcher,
            events: EventSender::silent(),
            input: None,
            active: None,
        }
    }

    pub fn with_events(mut self, events: impl Into<EventSender>) -> Self {
        self.events = events.into();
        self
    }

    pub fn select_input<P: AsRef<Path>>(&mut self, path: P) -> ScraperResult<()> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ScraperError::InvalidInput(format!(
                "{} is not a readable file",
                path.display()
            )));
        }
        info!("Input file: {}", path.display());
        self.input = Some(path.to_path_buf());
        Ok(())
    }

    pub fn input(&self) -> Option<&Path> {
        self.input.as_deref()
    }

    /// The spreadsheet lives next to the input file.
    pub fn output_path(&self) -> Option<PathBuf> {
        let input = self.input.as_ref()?;
        let dir = input.parent().unwrap_or_else(|| Path::new("."));
        Some(dir.join(&self.config.output_file_name))
    }

    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .map(|run| !run.task.is_finished())
            .unwrap_or(false)
    }

    /// Starts a run in the background. Ignored (returns false) without an
    /// input file or while another run is in progress.
    pub fn start(&mut self) -> ScraperResult<bool> {
        let (Some(input), Some(output)) = (self.input.clone(), self.output_path()) else {
            debug!("Start ignored: no input file selected");
            return Ok(false);
        };
        if self.is_running() {
            debug!("Start ignored: a run is already in progress");
            return Ok(false);
        }

        let terms = load_terms(&input)?;
        let stop = StopHandle::new();
        let config = self.config.clone();
        let launcher = Arc::clone(&self.launcher);
        let events = self.events.clone();
        let control = stop.clone();

        let task = tokio::spawn(async move {
            let setup = async {
                let sink = XlsxSink::create(&output)?;
                let page = launcher.launch(&config).await?;
                ScrapeSession::new(config, page, Box::new(sink))
            }
            .await;

            match setup {
                Ok(session) => Ok(session
                    .with_stop_handle(control)
                    .with_events(events)
                    .run(terms)
                    .await),
                Err(e) => {
                    error!("Could not start run: {}", e);
                    events.send(SessionEvent::Done {
                        rows: 0,
                        stopped: false,
                    });
                    Err(e)
                }
            }
        });

        self.active = Some(ActiveRun { stop, task });
        Ok(true)
    }

    /// Handle on the active run, for stopping it from another task.
    pub fn stop_handle(&self) -> Option<StopHandle> {
        self.active.as_ref().map(|run| run.stop.clone())
    }

    /// Asks the active run to stop after its current term.
    pub fn stop(&self) -> bool {
        match &self.active {
            Some(run) => {
                info!("Stop requested");
                run.stop.request_stop();
                true
            }
            None => false,
        }
    }

    /// Waits for the active run, if any, and returns its summary.
    pub async fn wait(&mut self) -> ScraperResult<Option<RunSummary>> {
        let Some(run) = self.active.take() else {
            return Ok(None);
        };
        let summary = run
            .task
            .await
            .map_err(|e| ScraperError::TaskError(e.to_string()))??;
        Ok(Some(summary))
    }

    /// Opens the spreadsheet with the desktop's default application.
    pub fn open_output(&self) -> ScraperResult<bool> {
        let Some(path) = self.output_path().filter(|p| p.exists()) else {
            warn!("No spreadsheet to open yet");
            return Ok(false);
        };
        opener(&path).spawn()?;
        Ok(true)
    }
}

#[cfg(target_os = "macos")]
fn opener(path: &Path) -> Command {
    let mut command = Command::new("open");
    command.arg(path);
    command
}

#[cfg(target_os = "windows")]
fn opener(path: &Path) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(path);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener(path: &Path) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(path);
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DiscoveryMode, Timings};
    use crate::page::{FixturePage, FixtureSite, PageQuery};
    use async_trait::async_trait;
    use calamine::{open_workbook, Reader, Xlsx};
    use std::fs;
    use tokio::sync::mpsc;

    struct FixtureLauncher {
        site: FixtureSite,
    }

    #[async_trait]
    impl BrowserLauncher for FixtureLauncher {
        async fn launch(&self, _config: &SessionConfig) -> ScraperResult<Box<dyn PageQuery>> {
            Ok(Box::new(FixturePage::new(self.site.clone())))
        }
    }

    struct FailingLauncher;

    #[async_trait]
    impl BrowserLauncher for FailingLauncher {
        async fn launch(&self, _config: &SessionConfig) -> ScraperResult<Box<dyn PageQuery>> {
            Err(ScraperError::BrowserError("no browser here".to_string()))
        }
    }

    fn site() -> FixtureSite {
        FixtureSite::default().with_search(
            "Acme España",
            r#"<h1 class="DUwDvf lfPIob">Acme SL</h1>
               <button data-item-id="address">Calle Mayor 1, 31500 Tudela, España</button>"#,
        )
    }

    fn config() -> SessionConfig {
        SessionConfig::default()
            .with_timings(Timings::instant())
            .with_discovery(DiscoveryMode::Off)
    }

    #[tokio::test]
    async fn test_start_is_ignored_without_input() {
        let mut controller = Controller::new(config(), Arc::new(FixtureLauncher { site: site() }));
        assert!(!controller.start().unwrap());
        assert!(!controller.stop());
        assert!(controller.wait().await.unwrap().is_none());
        assert!(!controller.open_output().unwrap());
    }

    #[tokio::test]
    async fn test_select_input_rejects_missing_file() {
        let mut controller = Controller::new(config(), Arc::new(FixtureLauncher { site: site() }));
        assert!(matches!(
            controller.select_input("/nope/empresas.txt"),
            Err(ScraperError::InvalidInput(_))
        ));
        assert!(controller.input().is_none());
    }

    #[tokio::test]
    async fn test_full_run_writes_spreadsheet_next_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empresas.txt");
        fs::write(&input, "Acme\n\n  Ghost Corp \n").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel::<SessionEvent>();
        let mut controller = Controller::new(config(), Arc::new(FixtureLauncher { site: site() }))
            .with_events(tx);
        controller.select_input(&input).unwrap();
        assert_eq!(
            controller.output_path().unwrap(),
            dir.path().join("empresas_info.xlsx")
        );

        assert!(controller.start().unwrap());
        let summary = controller.wait().await.unwrap().unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.processed, 2);
        assert!(!summary.stopped);

        let mut workbook: Xlsx<_> = open_workbook(dir.path().join("empresas_info.xlsx")).unwrap();
        let range = workbook.worksheet_range("Empresas").unwrap();
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], "Acme");
        assert_eq!(rows[1][1], "Acme SL");
        assert_eq!(rows[2][0], "Ghost Corp");
        assert_eq!(rows[2][1], "No se encontró esta empresa en España");

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.first(), Some(&SessionEvent::Started { total: 2 }));
        assert_eq!(
            events.last(),
            Some(&SessionEvent::Done {
                rows: 2,
                stopped: false
            })
        );
    }

    #[tokio::test]
    async fn test_launch_failure_still_signals_done() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empresas.txt");
        fs::write(&input, "Acme\n").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel::<SessionEvent>();
        let mut controller = Controller::new(config(), Arc::new(FailingLauncher)).with_events(tx);
        controller.select_input(&input).unwrap();

        assert!(controller.start().unwrap());
        assert!(matches!(
            controller.wait().await,
            Err(ScraperError::BrowserError(_))
        ));
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::Done {
                rows: 0,
                stopped: false
            }
        );
        assert!(rx.try_recv().is_err());
    }
}
