use colored::Colorize;
use log::debug;
use mg_rewrite::RewriteError;
use std::path::PathBuf;

use crate::manifest::{FileTask, Manifest};
use crate::store::{FileStore, StoreError};
use crate::ui::{Style, StyledText, icons};

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("{path}: {error}")]
    Rewrite { path: PathBuf, error: RewriteError },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Terminal state of a single file task.
#[derive(Debug)]
pub enum TaskStatus {
    Written { applied: usize, noop: usize },
    /// Every rule was a no-op; the file was left alone.
    Unchanged { noop: usize },
    /// Dry run: the diff was printed instead of written.
    Previewed { applied: usize, noop: usize },
    Skipped,
    Failed(TaskError),
}

impl TaskStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, TaskStatus::Failed(_))
    }
}

#[derive(Debug)]
pub struct TaskReport {
    pub path: PathBuf,
    pub status: TaskStatus,
}

#[derive(Debug, Default)]
pub struct Report {
    tasks: Vec<TaskReport>,
}

impl Report {
    pub fn tasks(&self) -> &[TaskReport] {
        &self.tasks
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks.iter().filter(|t| t.status.is_failed())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn skipped(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| matches!(t.status, TaskStatus::Skipped))
            .count()
    }
}

/// Runs file tasks one at a time: load, rewrite, write.
///
/// A task that fails never stops the ones after it. Nothing is written for a
/// task whose rules fail.
pub struct Driver<S> {
    store: S,
    dry_run: bool,
}

impl<S: FileStore> Driver<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, yes: bool) -> Self {
        self.dry_run = yes;
        self
    }

    pub fn run(&self, manifest: &Manifest) -> Report {
        let tasks = manifest
            .tasks()
            .iter()
            .map(|task| TaskReport {
                path: task.path.clone(),
                status: self.run_task(task),
            })
            .collect();
        Report { tasks }
    }

    pub fn run_task(&self, task: &FileTask) -> TaskStatus {
        let display = task.path.display().to_string();

        let content = match self.store.load(&task.path) {
            Ok(content) => content,
            Err(StoreError::NotFound(_)) => {
                println!("{} Skipping {display} (not found)", icons::warning());
                return TaskStatus::Skipped;
            }
            Err(e) => return fail(e.into()),
        };

        println!("Updating {display}...");

        let result = match task.rules.apply(&content) {
            Ok(result) => result,
            Err(error) => {
                return fail(TaskError::Rewrite {
                    path: task.path.clone(),
                    error,
                });
            }
        };
        let applied = result.rules_applied();
        let noop = result.rules_noop();
        debug!("{display}: {applied} rules applied, {noop} no-op");

        if !result.changed() {
            println!(
                "{} {} (no changes)",
                icons::success(),
                display.with_style(Style::Green).bold()
            );
            return TaskStatus::Unchanged { noop };
        }

        if self.dry_run {
            print!("{}", result.diff(&display));
            return TaskStatus::Previewed { applied, noop };
        }

        if let Err(e) = self.store.store(&task.path, result.output()) {
            return fail(e.into());
        }

        println!(
            "{} Updated {} ({applied} applied, {noop} no-op)",
            icons::success(),
            display.with_style(Style::Green).bold()
        );
        TaskStatus::Written { applied, noop }
    }
}

fn fail(error: TaskError) -> TaskStatus {
    eprintln!("{} {}", icons::error(), error.to_string().with_style(Style::Red));
    TaskStatus::Failed(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use mg_rewrite::{Pattern, Rule, RuleSet};
    use std::path::Path;

    fn rename_rules() -> RuleSet {
        RuleSet::from(vec![
            Rule::replace(
                "project name",
                Pattern::literal("PotassiumPrediction"),
                "MagnesiumPrediction",
            )
            .required()
            .when_absent(Pattern::literal("MagnesiumPrediction")),
        ])
    }

    fn task(path: &str) -> FileTask {
        FileTask::new(path, rename_rules())
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let store = InMemoryStore::new();
        let status = Driver::new(&store).run_task(&task("absent.py"));
        assert!(matches!(status, TaskStatus::Skipped));
        assert!(store.writes().is_empty());
    }

    #[test]
    fn test_failures_do_not_stop_other_tasks() {
        let store = InMemoryStore::new()
            .with_file("drifted.py", "name = \"KPrediction\"\n")
            .with_file("locked.py", "name = \"PotassiumPrediction\"\n")
            .with_file("ok.py", "name = \"PotassiumPrediction\"\n")
            .read_only("locked.py");
        let manifest = Manifest::new(vec![
            task("drifted.py"),
            task("locked.py"),
            task("missing.py"),
            task("ok.py"),
        ]);

        let report = Driver::new(&store).run(&manifest);

        let statuses: Vec<_> = report.tasks().iter().map(|t| &t.status).collect();
        assert!(matches!(
            statuses[0],
            TaskStatus::Failed(TaskError::Rewrite {
                error: RewriteError::RequiredMatchNotFound { .. },
                ..
            })
        ));
        assert!(matches!(
            statuses[1],
            TaskStatus::Failed(TaskError::Store(StoreError::Write { .. }))
        ));
        assert!(matches!(statuses[2], TaskStatus::Skipped));
        assert!(matches!(
            statuses[3],
            TaskStatus::Written {
                applied: 1,
                noop: 0
            }
        ));

        assert!(report.has_failures());
        assert_eq!(report.failures().count(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(store.writes(), vec![PathBuf::from("ok.py")]);
        assert_eq!(
            store.get(Path::new("drifted.py")).as_deref(),
            Some("name = \"KPrediction\"\n")
        );
        assert_eq!(
            store.get(Path::new("ok.py")).as_deref(),
            Some("name = \"MagnesiumPrediction\"\n")
        );
    }

    #[test]
    fn test_rerun_is_a_no_op() {
        let store = InMemoryStore::new()
            .with_file("config.py", "name = \"PotassiumPrediction\"\n");
        let manifest = Manifest::new(vec![task("config.py")]);
        let driver = Driver::new(&store);

        assert!(!driver.run(&manifest).has_failures());
        let report = driver.run(&manifest);
        assert!(matches!(
            report.tasks()[0].status,
            TaskStatus::Unchanged { noop: 1 }
        ));
        assert_eq!(store.writes().len(), 1);
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let store = InMemoryStore::new()
            .with_file("config.py", "name = \"PotassiumPrediction\"\n");
        let status = Driver::new(&store)
            .dry_run(true)
            .run_task(&task("config.py"));
        assert!(matches!(status, TaskStatus::Previewed { applied: 1, .. }));
        assert!(store.writes().is_empty());
        assert_eq!(
            store.get(Path::new("config.py")).as_deref(),
            Some("name = \"PotassiumPrediction\"\n")
        );
    }

    #[test]
    fn test_full_manifest_in_memory() -> anyhow::Result<()> {
        let base = Path::new("/project");
        let store = InMemoryStore::new()
            .with_file(
                base.join("src/config/pipeline_config.py"),
                include_str!("../tests/fixtures/pipeline_config.py"),
            )
            .with_file(
                base.join("src/features/feature_engineering.py"),
                include_str!("../tests/fixtures/feature_engineering.py"),
            )
            .with_file(base.join("main.py"), include_str!("../tests/fixtures/main.py"))
            .with_file(base.join("CLAUDE.md"), include_str!("../tests/fixtures/CLAUDE.md"))
            .with_file(
                base.join("pyproject.toml"),
                include_str!("../tests/fixtures/pyproject.toml"),
            );

        let manifest = Manifest::potassium_to_magnesium(base)?;
        let report = Driver::new(&store).run(&manifest);

        assert!(!report.has_failures());
        assert_eq!(report.skipped(), 4);
        assert_eq!(store.writes().len(), 5);
        assert_eq!(
            store.get(&base.join("src/features/feature_engineering.py")).as_deref(),
            Some(include_str!("../tests/fixtures/feature_engineering.expected.py"))
        );
        assert_eq!(
            store.get(&base.join("pyproject.toml")).as_deref(),
            Some(include_str!("../tests/fixtures/pyproject.expected.toml"))
        );
        Ok(())
    }
}
