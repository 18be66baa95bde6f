use anyhow::{Context, Result};
use clap::Args;
use log::debug;
use std::path::{Path, PathBuf};

use crate::driver::Driver;
use crate::manifest::Manifest;
use crate::store::DiskStore;
use crate::ui::{self, Style, StyledText, icons};

/// Arguments for the migration
#[derive(Args, Debug, Default, Clone)]
pub struct MigrateArgs {
    /// Project directory to migrate. Defaults to the directory containing
    /// this executable.
    #[arg(long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub base_dir: Option<PathBuf>,

    /// Print a diff of every change instead of writing files
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the migration
pub fn execute(args: MigrateArgs) -> Result<()> {
    let base_dir = match args.base_dir {
        Some(dir) => dir,
        None => executable_dir()?,
    };
    debug!("Base directory: {}", base_dir.display());

    println!("{}", ui::rule());
    println!("Magnesium Pipeline Migration");
    println!("{}", ui::rule());

    let manifest = Manifest::potassium_to_magnesium(&base_dir)
        .context("Failed to build migration rules")?;
    let report = Driver::new(DiskStore)
        .dry_run(args.dry_run)
        .run(&manifest);

    let failed = report.failures().count();
    if failed > 0 {
        anyhow::bail!("Migration failed for {failed} file(s)");
    }

    println!();
    println!("{}", ui::rule());
    if args.dry_run {
        println!(
            "{} {}",
            icons::success(),
            "Dry run complete, no files written".with_style(Style::Green)
        );
    } else {
        println!(
            "{} {}",
            icons::success(),
            "Migration completed successfully!".with_style(Style::Green)
        );
    }
    println!("{}", ui::rule());
    println!("\nNext steps:");
    println!("1. Review the changes in the updated files");
    println!("2. Test configuration loading: python main.py --help");
    println!("3. If you have data, try a test training run");

    Ok(())
}

fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Cannot locate the running executable")?;
    exe.parent()
        .map(Path::to_path_buf)
        .context("Executable has no parent directory")
}
