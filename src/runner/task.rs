//! Task registry
//!
//! Every task the engine knows is a variant of [`TaskSpec`]. A task is
//! validated first, and only a valid task is run.

use crate::config::*;
use crate::error::{DeployError, ValidationError, ValidationResult};
use crate::runner::{archive, database, debug, download, fs, github, replace, vars};
use crate::runner::{DeploymentContext, Sandbox};
use serde_yaml::Value;
use std::path::Path;
use tracing::Instrument;

/// Names of all registered tasks
pub const TASK_NAMES: &[&str] = &[
    "ensure_dir",
    "remove_path",
    "move_path",
    "copy_path",
    "write_file",
    "unzip",
    "replace_string",
    "download_file",
    "download_github",
    "connect_database",
    "query_database",
    "load_vars",
    "dump_context",
    "wait",
    "fail",
];

/// A task together with its options
#[derive(Debug, Clone)]
pub enum TaskSpec {
    EnsureDir(EnsureDirOptions),
    RemovePath(RemovePathOptions),
    MovePath(TransferOptions),
    CopyPath(TransferOptions),
    WriteFile(WriteFileOptions),
    Unzip(UnzipOptions),
    ReplaceString(ReplaceStringOptions),
    DownloadFile(DownloadFileOptions),
    DownloadGithub(DownloadGithubOptions),
    ConnectDatabase(ConnectDatabaseOptions),
    QueryDatabase(QueryDatabaseOptions),
    LoadVars(LoadVarsOptions),
    DumpContext(DumpContextOptions),
    Wait(WaitOptions),
    Fail(FailOptions),
}

impl TaskSpec {
    /// Build a task from its name and a loosely typed option bag
    pub fn from_options(name: &str, options: Value) -> ValidationResult<Self> {
        Ok(match name {
            "ensure_dir" => TaskSpec::EnsureDir(parse_options(name, options)?),
            "remove_path" => TaskSpec::RemovePath(parse_options(name, options)?),
            "move_path" => TaskSpec::MovePath(parse_options(name, options)?),
            "copy_path" => TaskSpec::CopyPath(parse_options(name, options)?),
            "write_file" => TaskSpec::WriteFile(parse_options(name, options)?),
            "unzip" => TaskSpec::Unzip(parse_options(name, options)?),
            "replace_string" => TaskSpec::ReplaceString(parse_options(name, options)?),
            "download_file" => TaskSpec::DownloadFile(parse_options(name, options)?),
            "download_github" => TaskSpec::DownloadGithub(parse_options(name, options)?),
            "connect_database" => TaskSpec::ConnectDatabase(parse_options(name, options)?),
            "query_database" => TaskSpec::QueryDatabase(parse_options(name, options)?),
            "load_vars" => TaskSpec::LoadVars(parse_options(name, options)?),
            "dump_context" => TaskSpec::DumpContext(parse_options(name, options)?),
            "wait" => TaskSpec::Wait(parse_options(name, options)?),
            "fail" => TaskSpec::Fail(parse_options(name, options)?),
            other => return Err(ValidationError::UnknownTask(other.to_string())),
        })
    }

    /// The registered name of this task
    pub fn name(&self) -> &'static str {
        match self {
            TaskSpec::EnsureDir(_) => "ensure_dir",
            TaskSpec::RemovePath(_) => "remove_path",
            TaskSpec::MovePath(_) => "move_path",
            TaskSpec::CopyPath(_) => "copy_path",
            TaskSpec::WriteFile(_) => "write_file",
            TaskSpec::Unzip(_) => "unzip",
            TaskSpec::ReplaceString(_) => "replace_string",
            TaskSpec::DownloadFile(_) => "download_file",
            TaskSpec::DownloadGithub(_) => "download_github",
            TaskSpec::ConnectDatabase(_) => "connect_database",
            TaskSpec::QueryDatabase(_) => "query_database",
            TaskSpec::LoadVars(_) => "load_vars",
            TaskSpec::DumpContext(_) => "dump_context",
            TaskSpec::Wait(_) => "wait",
            TaskSpec::Fail(_) => "fail",
        }
    }

    /// Check the options without touching anything
    pub fn validate(&self) -> ValidationResult<()> {
        match self {
            TaskSpec::EnsureDir(o) => o.validate(),
            TaskSpec::RemovePath(o) => o.validate(),
            TaskSpec::MovePath(o) | TaskSpec::CopyPath(o) => o.validate(),
            TaskSpec::WriteFile(o) => o.validate(),
            TaskSpec::Unzip(o) => o.validate(),
            TaskSpec::ReplaceString(o) => o.validate(),
            TaskSpec::DownloadFile(o) => o.validate(),
            TaskSpec::DownloadGithub(o) => o.validate(),
            TaskSpec::ConnectDatabase(o) => o.validate(),
            TaskSpec::QueryDatabase(o) => o.validate(),
            TaskSpec::LoadVars(o) => o.validate(),
            TaskSpec::DumpContext(o) => o.validate(),
            TaskSpec::Wait(o) => o.validate(),
            TaskSpec::Fail(o) => o.validate(),
        }
    }

    /// Whether [`validate`](Self::validate) passes
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Run the task against `base` and the shared context.
    ///
    /// Options are validated again first; an invalid task never runs.
    pub async fn run(&self, base: &Path, ctx: &mut DeploymentContext) -> Result<(), DeployError> {
        self.validate()?;
        let sandbox = Sandbox::new(base);

        match self {
            TaskSpec::EnsureDir(o) => fs::ensure_dir(o, &sandbox).await,
            TaskSpec::RemovePath(o) => fs::remove_path(o, &sandbox).await,
            TaskSpec::MovePath(o) => fs::move_path(o, &sandbox).await,
            TaskSpec::CopyPath(o) => fs::copy_path(o, &sandbox).await,
            TaskSpec::WriteFile(o) => fs::write_file(o, &sandbox).await,
            TaskSpec::Unzip(o) => archive::unzip(o, &sandbox).await,
            TaskSpec::ReplaceString(o) => replace::replace_string(o, &sandbox, ctx).await,
            TaskSpec::DownloadFile(o) => download::download_file(o, &sandbox, ctx).await,
            TaskSpec::DownloadGithub(o) => github::download_github(o, &sandbox, ctx).await,
            TaskSpec::ConnectDatabase(o) => database::connect_database(o, ctx).await,
            TaskSpec::QueryDatabase(o) => database::query_database(o, &sandbox, ctx).await,
            TaskSpec::LoadVars(o) => vars::load_vars(o, &sandbox, ctx).await,
            TaskSpec::DumpContext(o) => vars::dump_context(o, ctx).await,
            TaskSpec::Wait(o) => debug::wait(o).await,
            TaskSpec::Fail(o) => debug::fail(o).await,
        }
    }

    /// Validate and run inside a `task` span, logging the outcome
    pub async fn execute(&self, base: &Path, ctx: &mut DeploymentContext) -> Result<(), DeployError> {
        let span = tracing::info_span!("task", name = self.name());
        async {
            if let Err(e) = self.validate() {
                tracing::error!(error = %e, "invalid task options");
                return Err(e.into());
            }

            tracing::info!("running task");
            let result = self.run(base, ctx).await;
            match &result {
                Ok(()) => tracing::debug!("task completed"),
                Err(e) => tracing::error!(error = %e, "task failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Validate a task given by name and raw options
pub fn validate(name: &str, options: Value) -> bool {
    TaskSpec::from_options(name, options)
        .map(|task| task.is_valid())
        .unwrap_or(false)
}
