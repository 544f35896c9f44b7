//! CLI command definitions and handlers.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;

use cask_network::NetworkTopology;

use crate::image::ImageStore;
use crate::runtime::orchestrator::{Orchestrator, RunRequest, containers_root};

/// Cask - Minimal Container Launcher
#[derive(Parser)]
#[command(name = "cask")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base directory for per-container working directories
    #[arg(long, global = true, env = "CASK_CONTAINERS_DIR")]
    pub containers_dir: Option<PathBuf>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Launcher commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run a command in a new container
    Run {
        /// Image name in the local store
        image: String,

        /// Volume mappings (host:container;host2:container2)
        #[arg(short = 'v', long = "volumes", default_value = "")]
        volumes: String,

        /// Port mappings (hostPort:containerPort;...)
        #[arg(short = 'p', long = "ports", default_value = "")]
        ports: String,

        /// Command line to run inside the container
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },

    /// List images in the local store
    Images,

    /// Container init role; only ever invoked by the launcher re-exec
    #[command(hide = true)]
    Init,
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run {
                image,
                volumes,
                ports,
                command,
            } => {
                let orchestrator = Orchestrator::new(
                    NetworkTopology::default(),
                    containers_root(self.containers_dir.as_deref()),
                );
                let request = RunRequest {
                    image,
                    command: command.join(" "),
                    volumes,
                    ports,
                };

                let exit_code = orchestrator
                    .run(request)
                    .await
                    .map_err(|e| color_eyre::eyre::eyre!("Failed to run container: {}", e))?;

                if exit_code != 0 {
                    std::process::exit(exit_code);
                }
                Ok(())
            }

            Commands::Images => {
                let store = ImageStore::new(cask_common::paths::CASK_IMAGES_DIR.clone());
                for image in store
                    .list()
                    .map_err(|e| color_eyre::eyre::eyre!("Failed to list images: {}", e))?
                {
                    println!("{}", image);
                }
                Ok(())
            }

            Commands::Init => {
                // Only reached inside the fresh namespaces; when the init
                // succeeds the exec replaces this process and never returns.
                match crate::init::run().await {
                    Ok(()) => Ok(()),
                    Err(err) => Err(color_eyre::eyre::eyre!("Container init failed: {}", err)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn run_parses_mappings_and_trailing_command() {
        let cli = Cli::parse_from([
            "cask", "run", "alpine", "-v", "/h:/c", "-p", "8080:80", "sleep", "30",
        ]);
        match cli.command {
            Commands::Run {
                image,
                volumes,
                ports,
                command,
            } => {
                assert_eq!(image, "alpine");
                assert_eq!(volumes, "/h:/c");
                assert_eq!(ports, "8080:80");
                assert_eq!(command, ["sleep", "30"]);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn run_requires_a_command() {
        assert!(Cli::try_parse_from(["cask", "run", "alpine"]).is_err());
    }
}
