//! Non-interactive commands. Each one drives the same controller the console
//! uses and prints a plain-text report.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use log::{info, warn};

use crate::api::AgentApi;
use crate::cli::Command;
use crate::config::ConsoleSettings;
use crate::directory::{AgentDirectory, Badge};
use crate::form::{FormController, FormOptions, LocalFile, NoticeLevel, SubmitOutcome};

pub struct Headless<'a, W: Write> {
    api: Arc<dyn AgentApi>,
    options: FormOptions,
    out: &'a mut W,
}

impl<'a, W: Write> Headless<'a, W> {
    pub fn new(api: Arc<dyn AgentApi>, options: FormOptions, out: &'a mut W) -> Self {
        Self { api, options, out }
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::List => self.list().await,
            Command::Create {
                name,
                persona,
                files,
            } => self.create(&name, &persona, &files).await,
            Command::Upload { name, files } => self.upload(&name, &files).await,
            Command::Status { name } => self.status(&name).await,
            Command::Delete { name } => self.delete(&name).await,
            Command::Tui | Command::Init => {
                bail!("`{:?}` is not a headless command", command)
            }
        }
    }

    async fn list(&mut self) -> Result<()> {
        let mut directory = AgentDirectory::new(Arc::clone(&self.api));
        directory
            .refresh()
            .await
            .map_err(|err| anyhow!("failed to load agents: {}", err))?;
        if directory.is_empty() {
            writeln!(self.out, "no agents yet")?;
        }
        for agent in directory.agents() {
            writeln!(
                self.out,
                "{:<32} {:<10} {}",
                agent.name,
                Badge::of(agent).label(),
                agent.created_at.as_deref().unwrap_or("-")
            )?;
        }
        Ok(())
    }

    async fn create(&mut self, name: &str, persona: &str, files: &[PathBuf]) -> Result<()> {
        let mut form = FormController::create(Arc::clone(&self.api), self.options.clone());
        form.set_name(name);
        form.set_persona(persona);
        form.add_files(read_files(files).await?);
        self.submit(&mut form).await
    }

    async fn upload(&mut self, name: &str, files: &[PathBuf]) -> Result<()> {
        let mut form = self.load(name).await?;
        // Whatever a previous session left running must finish first.
        form.wait_for_processing().await;
        self.flush_notices(&mut form)?;
        form.add_files(read_files(files).await?);
        if !form.staging().has_pending_uploads() {
            self.flush_notices(&mut form)?;
            bail!("no files left to upload");
        }
        self.submit(&mut form).await
    }

    async fn status(&mut self, name: &str) -> Result<()> {
        let mut form = self.load(name).await?;
        form.wait_for_processing().await;
        self.flush_notices(&mut form)?;
        self.print_files(&form)
    }

    async fn delete(&mut self, name: &str) -> Result<()> {
        self.api
            .delete_agent(name)
            .await
            .map_err(|err| anyhow!("failed to delete {}: {}", name, err))?;
        info!("deleted agent {}", name);
        writeln!(self.out, "deleted {}", name)?;
        Ok(())
    }

    async fn load(&mut self, name: &str) -> Result<FormController> {
        FormController::load(Arc::clone(&self.api), name, self.options.clone())
            .await
            .map_err(|err| anyhow!("failed to load {}: {}", name, err))
    }

    async fn submit(&mut self, form: &mut FormController) -> Result<()> {
        let outcome = form.submit().await;
        self.flush_notices(form)?;
        match outcome {
            SubmitOutcome::Rejected | SubmitOutcome::Failed => {
                bail!("{} was not saved", form.name())
            }
            SubmitOutcome::Processing => {
                writeln!(self.out, "processing files for {}…", form.name())?;
                form.wait_for_processing().await;
                self.flush_notices(form)?;
            }
            SubmitOutcome::Saved | SubmitOutcome::NavigateToList => {}
        }
        writeln!(self.out, "saved {}", form.name())?;
        self.print_files(form)
    }

    fn print_files(&mut self, form: &FormController) -> Result<()> {
        for file in form.staging().iter() {
            match &file.message {
                Some(message) => writeln!(
                    self.out,
                    "  {:<40} {:<10} {}",
                    file.name(),
                    file.status.label(),
                    message
                )?,
                None => writeln!(self.out, "  {:<40} {}", file.name(), file.status.label())?,
            }
        }
        Ok(())
    }

    fn flush_notices(&mut self, form: &mut FormController) -> Result<()> {
        for notice in form.take_notices() {
            match notice.level {
                NoticeLevel::Warning | NoticeLevel::Error => {
                    warn!("{}: {}", notice.title, notice.detail)
                }
                NoticeLevel::Info | NoticeLevel::Success => {
                    info!("{}: {}", notice.title, notice.detail)
                }
            }
            writeln!(self.out, "{}: {}", notice.title, notice.detail)?;
        }
        Ok(())
    }
}

/// Writes `config/console.toml` with default values unless one already exists.
pub fn init_config(workspace_root: &Path, out: &mut impl Write) -> Result<()> {
    let path = ConsoleSettings::path(workspace_root);
    if path.exists() {
        writeln!(out, "{} already exists", path.display())?;
        return Ok(());
    }
    let written = ConsoleSettings::default().save_to_file(workspace_root)?;
    writeln!(out, "wrote {}", written.display())?;
    Ok(())
}

async fn read_files(paths: &[PathBuf]) -> Result<Vec<LocalFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = LocalFile::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        files.push(file);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{Call, FakeAgentApi, file, status};

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn create_uploads_files_and_waits_for_processing() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("guide.pdf");
        std::fs::write(&pdf, b"%PDF-1.4").unwrap();
        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, b"notes").unwrap();

        let api = Arc::new(FakeAgentApi::new());
        api.script_status(vec![
            status(false, &[("guide.pdf", "processing")]),
            status(true, &[("guide.pdf", "success")]),
        ]);
        let mut out = Vec::new();
        Headless::new(api.clone(), FormOptions::default(), &mut out)
            .run(Command::Create {
                name: "Guide".into(),
                persona: "Helpful".into(),
                files: vec![pdf, txt],
            })
            .await
            .unwrap();

        let text = output(out);
        assert!(text.contains("Some files were not added"));
        assert!(text.contains("notes.txt"));
        assert!(text.contains("guide.pdf"));
        assert!(text.contains("Processed"));
        assert_eq!(
            api.calls()[1],
            Call::Upload("Guide".into(), vec!["guide.pdf".into()])
        );
    }

    #[tokio::test]
    async fn invalid_name_fails_without_requests() {
        let api = Arc::new(FakeAgentApi::new());
        let mut out = Vec::new();
        let result = Headless::new(api.clone(), FormOptions::default(), &mut out)
            .run(Command::Create {
                name: "bad/name".into(),
                persona: String::new(),
                files: Vec::new(),
            })
            .await;
        assert!(result.is_err());
        assert!(api.calls().is_empty());
        assert!(output(out).contains("Invalid agent name"));
    }

    #[tokio::test]
    async fn list_prints_badges() {
        let api = Arc::new(FakeAgentApi::new());
        api.insert_agent("Alpha", "", vec![file("a.pdf", true, "success")]);
        let mut out = Vec::new();
        Headless::new(api, FormOptions::default(), &mut out)
            .run(Command::List)
            .await
            .unwrap();
        let text = output(out);
        assert!(text.contains("Alpha"));
        assert!(text.contains("Ready"));
    }

    #[tokio::test(start_paused = true)]
    async fn upload_with_only_rejected_files_stops_early() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, b"notes").unwrap();
        let api = Arc::new(FakeAgentApi::with_agent("Bot", ""));
        let mut out = Vec::new();
        let result = Headless::new(api.clone(), FormOptions::default(), &mut out)
            .run(Command::Upload {
                name: "Bot".into(),
                files: vec![txt],
            })
            .await;
        assert!(result.is_err());
        assert_eq!(api.count(|call| matches!(call, Call::Upload(..))), 0);
    }

    #[test]
    fn init_writes_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        init_config(dir.path(), &mut out).unwrap();
        init_config(dir.path(), &mut out).unwrap();
        let text = output(out);
        assert!(text.contains("wrote"));
        assert!(text.contains("already exists"));
        assert!(ConsoleSettings::path(dir.path()).exists());
    }
}
