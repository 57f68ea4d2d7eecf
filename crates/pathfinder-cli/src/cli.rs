//! Command dispatch for the `pf` binary.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result, bail};
use log::{info, warn};
use pathfinder_core::{
    Engine, SessionStatus,
    display::{CancelResult, CreateResult, DeleteResult, OperationStatus},
    params::{DeleteSession, ExportSession, Id, ListSessions, StartSession},
};

use crate::{
    args::{ExportArgs, SessionCommands, StartArgs},
    renderer::TerminalRenderer,
};

/// Runs parsed commands against an engine and renders the outcome.
pub struct Cli {
    engine: Engine,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(engine: Engine, renderer: TerminalRenderer) -> Self {
        Self { engine, renderer }
    }

    pub async fn handle_session_command(&self, command: SessionCommands) -> Result<()> {
        match command {
            SessionCommands::Start(args) => self.start(&args).await,
            SessionCommands::Show(args) => {
                let session = self.engine.session(&Id::from(args)).await?;
                self.renderer.render(&session.to_string())
            }
            SessionCommands::List(args) => self.list(&args.into()).await,
            SessionCommands::Cancel(args) => {
                let session = self.engine.cancel_session(&Id::from(args)).await?;
                self.renderer
                    .render(&CancelResult::new(session).to_string())
            }
            SessionCommands::Export(args) => self.export(&args).await,
            SessionCommands::Delete(args) => {
                let params = DeleteSession::from(args);
                match self.engine.delete_session(&params).await? {
                    Some(session) => self
                        .renderer
                        .render(&DeleteResult::new(session).to_string()),
                    None => bail!("Session not found: {}", params.id),
                }
            }
        }
    }

    /// Lists sessions; also what `pf` does without a subcommand.
    pub async fn list(&self, params: &ListSessions) -> Result<()> {
        let page = self.engine.list_sessions(params).await?;
        self.renderer.render(&page.to_string())
    }

    pub async fn stats(&self) -> Result<()> {
        let stats = self.engine.stats().await?;
        self.renderer.render(&stats.to_string())
    }

    /// Starts a session and follows it until it stops. Ctrl-C cancels the
    /// session and keeps waiting for the run to wind down.
    async fn start(&self, args: &StartArgs) -> Result<()> {
        let session = self.engine.start_session(&StartSession::from(args)).await?;
        self.renderer
            .render(&CreateResult::new(session.clone()).to_string())?;
        println!();

        let id = Id::from(session.id.as_str());
        let interval = Duration::from_millis(args.poll_interval_ms.max(1));
        let follow = self
            .engine
            .wait_for_session(&id, interval, |s| self.renderer.progress(s));

        let finished = tokio::select! {
            finished = follow => finished?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted; cancelling session {}", id.id);
                match self.engine.cancel_session(&id).await {
                    Ok(cancelled) => self
                        .renderer
                        .render(&CancelResult::new(cancelled).to_string())?,
                    Err(e) => warn!("Could not cancel session {}: {e}", id.id),
                }
                self.engine.wait_for_session(&id, interval, |_| {}).await?
            }
        };

        println!();
        self.renderer.render(&finished.to_string())?;

        match finished.status {
            SessionStatus::Completed => {
                let hint = format!("Export the results with: pf session export {}", finished.id);
                self.renderer
                    .render(&format!("\n{}", OperationStatus::success(hint)))
            }
            status => bail!("Session {} ended as {status}", finished.id),
        }
    }

    async fn export(&self, args: &ExportArgs) -> Result<()> {
        let params = ExportSession::from(args);
        let export = self.engine.export_session(&params).await?;

        match &args.output {
            Some(path) => {
                write_export(path, &export.data)?;
                let message = format!(
                    "Exported session {} as {} to {}",
                    params.id,
                    export.content_type,
                    path.display()
                );
                self.renderer
                    .render(&OperationStatus::success(message).to_string())
            }
            // Raw data; styling would corrupt JSON and reports
            None => {
                print!("{}", export.data);
                if !export.data.ends_with('\n') {
                    println!();
                }
                Ok(())
            }
        }
    }
}

fn write_export(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
}
