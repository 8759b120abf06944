//! CLI command definitions and handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, eyre};
use serde::Serialize;
use tabled::{Table, Tabled};

use hardline_common::{HardlineError, HardlinePaths};
use hardline_lsm::{KernelParams, LsmConfigFile};

use crate::manager::{Collaborators, Manager, ManagerConfig, ScapAction, SecurityPolicyProfile};
use crate::rule::{Rule, Scope};
use crate::snapshot::TargetConfig;
use crate::target::InMemorySystem;

/// Hardline - Security policy checks for installed systems
#[derive(Parser)]
#[command(name = "hardline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Root directory of the target system
    #[arg(long, global = true, env = "HARDLINE_ROOT", default_value = "/")]
    pub root: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable table.
    Table,
    /// JSON.
    Json,
}

/// Hardline commands.
#[derive(Subcommand)]
pub enum Commands {
    /// List the known security policies
    Policies {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Report the rules that fail against a system
    Check {
        /// Path to the system state (JSON)
        #[arg(short, long)]
        state: PathBuf,

        /// Policy to evaluate (default: HARDLINE_SECURITY_POLICY)
        #[arg(short, long)]
        policy: Option<String>,

        /// Only evaluate rules of this scope
        #[arg(long)]
        scope: Option<Scope>,

        /// Evaluate disabled rules too
        #[arg(long)]
        include_disabled: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Run every automatic remediation and check again
    Fix {
        /// Path to the system state (JSON), updated in place
        #[arg(short, long)]
        state: PathBuf,

        /// Policy to evaluate (default: HARDLINE_SECURITY_POLICY)
        #[arg(short, long)]
        policy: Option<String>,
    },

    /// Persist failing rules and configure the remediation tool
    Write {
        /// Path to the system state (JSON)
        #[arg(short, long)]
        state: PathBuf,

        /// Policy to evaluate (default: HARDLINE_SECURITY_POLICY)
        #[arg(short, long)]
        policy: Option<String>,

        /// Remediation to run on the next boot
        #[arg(short, long)]
        action: Option<ScapAction>,

        /// Security policy profile to import first (JSON)
        #[arg(long)]
        profile: Option<PathBuf>,
    },

    /// Show the security module mode
    Mode {
        /// Kernel command line (default: the running kernel's)
        #[arg(long, conflicts_with = "cmdline_file")]
        cmdline: Option<String>,

        /// File holding the kernel command line
        #[arg(long)]
        cmdline_file: Option<PathBuf>,

        /// Security module configuration file (default: <root>/etc/selinux/config)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Serialize, Tabled)]
struct PolicyRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "VERSION")]
    version: String,
    #[tabled(rename = "RULES")]
    rules: usize,
}

#[derive(Debug, Serialize, Tabled)]
struct RuleReport {
    #[tabled(rename = "RULE")]
    id: String,
    #[tabled(rename = "SCOPE")]
    scope: Scope,
    #[tabled(rename = "ENABLED")]
    enabled: bool,
    #[tabled(rename = "FIXABLE")]
    fixable: bool,
    #[tabled(rename = "MESSAGE")]
    message: String,
}

impl RuleReport {
    fn new(rule: &dyn Rule, target: &TargetConfig) -> Self {
        Self {
            id: rule.id().to_string(),
            scope: rule.scope(),
            enabled: rule.enabled(),
            fixable: rule.fixable(),
            message: rule.failure_message(target),
        }
    }
}

impl Cli {
    /// Execute the CLI command.
    pub fn execute(self) -> Result<()> {
        let paths = HardlinePaths::with_root(&self.root);

        match self.command {
            Commands::Policies { format } => {
                let manager = load_manager(&paths, None)?;
                let rows: Vec<PolicyRow> = manager
                    .policies()
                    .iter()
                    .map(|policy| PolicyRow {
                        id: policy.id().to_string(),
                        name: policy.name().to_string(),
                        version: policy.version().to_string(),
                        rules: policy.rules().count(),
                    })
                    .collect();

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                    OutputFormat::Table => println!("{}", Table::new(rows)),
                }
                Ok(())
            }

            Commands::Check {
                state,
                policy,
                scope,
                include_disabled,
                format,
            } => {
                let manager = load_manager(&paths, policy.as_deref())?;
                let policy = manager
                    .enabled_policy()
                    .ok_or_else(|| eyre!(HardlineError::NoPolicyEnabled))?;
                let target = TargetConfig::new(open_state(&state)?);

                let reports: Vec<RuleReport> = policy
                    .failing_rules(&target, scope, include_disabled)
                    .into_iter()
                    .map(|rule| RuleReport::new(rule, &target))
                    .collect();

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
                    OutputFormat::Table if reports.is_empty() => {
                        println!("Policy {} passes", policy.id());
                    }
                    OutputFormat::Table => println!("{}", Table::new(reports)),
                }
                Ok(())
            }

            Commands::Fix { state, policy } => {
                let manager = load_manager(&paths, policy.as_deref())?;
                let policy = manager
                    .enabled_policy()
                    .ok_or_else(|| eyre!(HardlineError::NoPolicyEnabled))?;
                let system = open_state(&state)?;

                let issues = policy.validate(&TargetConfig::new(system.clone()));
                let fixed = issues
                    .fix_all()
                    .map_err(|e| eyre!("Failed to remediate: {e}"))?;
                println!("Fixed {fixed} of {} issues", issues.len());

                let remaining = policy.validate(&TargetConfig::new(system));
                for issue in &remaining {
                    println!("{issue}");
                }
                Ok(())
            }

            Commands::Write {
                state,
                policy,
                action,
                profile,
            } => {
                let mut manager = load_manager(&paths, None)?;
                if let Some(profile) = profile {
                    let json = std::fs::read_to_string(&profile)?;
                    manager
                        .import(&SecurityPolicyProfile::from_json(&json)?)
                        .map_err(|e| eyre!("Failed to import profile: {e}"))?;
                }
                if let Some(id) = policy {
                    manager.enable_policy(&id)?;
                }
                if let Some(action) = action {
                    manager.set_scap_action(action);
                }

                let target = TargetConfig::new(open_state(&state)?);
                let summary = manager
                    .write(&target)
                    .map_err(|e| eyre!("Failed to write security policy: {e}"))?;

                match &summary.policy {
                    None => println!("No security policy enabled"),
                    Some(id) => {
                        println!(
                            "Policy {id}: {} failing rules",
                            summary.failing_rules.len()
                        );
                        if let Some(path) = &summary.override_file {
                            println!("Configured {}", path.display());
                        }
                    }
                }
                Ok(())
            }

            Commands::Mode {
                cmdline,
                cmdline_file,
                config,
            } => {
                let params = match (cmdline, cmdline_file) {
                    (Some(cmdline), _) => KernelParams::parse(&cmdline)?,
                    (None, Some(path)) => KernelParams::parse(std::fs::read_to_string(path)?.trim())?,
                    (None, None) if paths.is_host_root() => KernelParams::from_running_kernel()?,
                    (None, None) => KernelParams::unknown(),
                };
                let config = LsmConfigFile::load(config.unwrap_or_else(|| paths.lsm_config()))?;

                let mode = hardline_lsm::resolve(&params, config.mode_value());
                println!("{mode}");
                Ok(())
            }
        }
    }
}

fn load_manager(paths: &HardlinePaths, policy: Option<&str>) -> Result<Manager> {
    let config = ManagerConfig::new(paths.clone())?;
    let mut manager = Manager::new(config, Collaborators::system(paths))?;
    if let Some(id) = policy {
        manager.enable_policy(id)?;
    }
    Ok(manager)
}

fn open_state(path: &Path) -> Result<Arc<InMemorySystem>> {
    let system = InMemorySystem::open(path)
        .map_err(|e| eyre!("Failed to load system state {}: {e}", path.display()))?;
    Ok(Arc::new(system))
}
