mod cmd;
mod output;

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{
  InstallArgs, PackagesArgs, PlanArgs, ReleaseArgs, cmd_install, cmd_packages, cmd_plan, cmd_release,
  parse_network_override,
};
use crate::output::{OutputFormat, print_error};

/// Install a job of a release onto this machine
#[derive(Parser)]
#[command(name = "relkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Root directory packages and jobs are installed into
  #[arg(long, global = true, env = "RELKIT_INSTALL_DIR")]
  install_dir: Option<PathBuf>,

  /// Scratch directory for the local blobstore
  #[arg(long, global = true, env = "RELKIT_WORK_DIR")]
  work_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Install a job: its packages, rendered templates and apply spec
  Install {
    #[command(flatten)]
    repo: ReleaseArgs,

    /// Job to install
    job: String,

    /// Deployment manifest; without one the job is a single template of the same name
    #[arg(short = 'm', long)]
    manifest: Option<PathBuf>,

    /// Recompile packages even when the installed version matches
    #[arg(long)]
    force_compile: bool,

    /// Only render templates and write the apply spec; do not install packages
    #[arg(short = 't', long)]
    template_only: bool,

    /// Address for a network, as NAME=ADDRESS (repeatable)
    #[arg(short = 'N', long = "network", value_parser = parse_network_override)]
    networks: Vec<(String, String)>,

    /// Instance index
    #[arg(short = 'i', long, default_value_t = 0)]
    index: u32,

    /// Address of this machine (detected when omitted)
    #[arg(long)]
    ip_address: Option<IpAddr>,

    /// Program that renders job templates
    #[arg(long, env = "RELKIT_RENDER_COMMAND", default_value = "relkit-render")]
    render_command: String,
  },

  /// Install packages directly
  Packages {
    #[command(flatten)]
    repo: ReleaseArgs,

    /// Packages to install
    #[arg(required = true)]
    packages: Vec<String>,

    /// Install only the named packages, not their dependencies
    #[arg(long)]
    no_dependency: bool,

    /// Recompile packages even when the installed version matches
    #[arg(long)]
    force_compile: bool,
  },

  /// Show which packages a job needs and which would be installed
  Plan {
    #[command(flatten)]
    repo: ReleaseArgs,

    /// Job to plan
    job: String,

    /// Deployment manifest
    #[arg(short = 'm', long)]
    manifest: Option<PathBuf>,

    /// Plan as if packages were recompiled
    #[arg(long)]
    force_compile: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Show the release that would be used
  Release {
    #[command(flatten)]
    repo: ReleaseArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  if let Err(err) = run(cli) {
    print_error(&format!("{:#}", err));
    std::process::exit(1);
  }
}

fn run(cli: Cli) -> Result<()> {
  let install_dir = cli.install_dir.unwrap_or_else(relkit_lib::platform::paths::install_dir);
  let work_dir = cli.work_dir.unwrap_or_else(relkit_lib::platform::paths::work_dir);

  match cli.command {
    Commands::Install {
      repo,
      job,
      manifest,
      force_compile,
      template_only,
      networks,
      index,
      ip_address,
      render_command,
    } => cmd_install(&InstallArgs {
      repo,
      job,
      manifest,
      force_compile,
      template_only,
      networks: networks.into_iter().collect(),
      index,
      ip_address,
      render_command,
      install_dir,
      work_dir,
    }),
    Commands::Packages {
      repo,
      packages,
      no_dependency,
      force_compile,
    } => cmd_packages(&PackagesArgs {
      repo,
      packages,
      no_dependency,
      force_compile,
      install_dir,
    }),
    Commands::Plan {
      repo,
      job,
      manifest,
      force_compile,
      output,
    } => cmd_plan(
      &PlanArgs {
        repo,
        job,
        manifest,
        force_compile,
        install_dir,
      },
      output,
    ),
    Commands::Release { repo, output } => cmd_release(&repo, output),
  }
}
