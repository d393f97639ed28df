use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use plugtest_core::Artifact;
use plugtest_repository::{
    ComponentProject, RepositoryLayout, RepositoryTool, SettingsSources, StagingReport,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "plugtest")]
#[command(about = "Stage plugin artifacts into local repositories for test builds", long_about = None)]
struct Cli {
    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install an artifact and its reachable ancestor POMs into a test repository.
    Stage {
        #[command(flatten)]
        coordinates: CoordinateArgs,
        /// Built artifact file; defaults to the project POM for `pom` packaging.
        #[arg(long)]
        file: Option<PathBuf>,
        /// POM the project was built from.
        #[arg(long)]
        project_pom: PathBuf,
        /// POM to start the ancestor walk from; defaults to the project POM.
        #[arg(long)]
        real_pom: Option<PathBuf>,
        /// Root of the test repository.
        #[arg(long)]
        repo: PathBuf,
        #[arg(long, default_value = "default")]
        layout: RepositoryLayout,
        /// Print the staging report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the location of the normal local repository.
    LocalRepo {
        #[arg(long)]
        settings: Option<PathBuf>,
        #[arg(long)]
        global_settings: Option<PathBuf>,
    },
    /// Print the repository-relative path of an artifact.
    PathOf {
        #[command(flatten)]
        coordinates: CoordinateArgs,
        #[arg(long, default_value = "default")]
        layout: RepositoryLayout,
    },
}

#[derive(Args, Debug)]
struct CoordinateArgs {
    #[arg(long)]
    group_id: String,
    #[arg(long)]
    artifact_id: String,
    #[arg(long)]
    version: String,
    #[arg(long, default_value = "jar")]
    packaging: String,
    #[arg(long)]
    classifier: Option<String>,
}

impl CoordinateArgs {
    fn to_artifact(&self) -> Artifact {
        let artifact = Artifact::new(
            &self.group_id,
            &self.artifact_id,
            &self.version,
            &self.packaging,
        );
        match &self.classifier {
            Some(classifier) => artifact.with_classifier(classifier),
            None => artifact,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run_cli(cli)
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Stage {
            coordinates,
            file,
            project_pom,
            real_pom,
            repo,
            layout,
            json,
        } => {
            let mut artifact = coordinates.to_artifact();
            artifact.file = file;
            let real_pom = real_pom.unwrap_or_else(|| project_pom.clone());
            let project = ComponentProject::new(artifact, project_pom);

            let report = RepositoryTool::new()
                .with_layout(layout)
                .stage_component_project(&project, &real_pom, &repo)?;
            for line in format_staging_report(&report, json)? {
                println!("{line}");
            }
        }
        Commands::LocalRepo {
            settings,
            global_settings,
        } => {
            let mut sources = SettingsSources::from_env()?;
            if let Some(settings) = settings {
                sources = sources.with_user_settings(settings);
            }
            if let Some(global_settings) = global_settings {
                sources = sources.with_global_settings(global_settings);
            }
            debug!(?sources, "resolving local repository");

            let dir = RepositoryTool::new().find_local_repository_directory(&sources)?;
            println!("{}", dir.display());
        }
        Commands::PathOf {
            coordinates,
            layout,
        } => {
            let artifact = coordinates.to_artifact();
            artifact.validate()?;
            println!("{}", layout.path_of(&artifact).display());
        }
    }

    Ok(())
}

fn format_staging_report(report: &StagingReport, json: bool) -> Result<Vec<String>> {
    if json {
        let rendered =
            serde_json::to_string_pretty(report).context("failed to render staging report")?;
        return Ok(vec![rendered]);
    }

    let mut lines = vec![
        format!("repository: {}", report.repository.display()),
        format!("artifact: {}", report.artifact.display()),
    ];
    if report.ancestors.is_empty() {
        lines.push("ancestors: none reachable".to_string());
    }
    for ancestor in &report.ancestors {
        lines.push(format!(
            "ancestor: {} -> {}",
            ancestor.coordinates,
            ancestor.destination.display()
        ));
    }
    Ok(lines)
}
