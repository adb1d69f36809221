use std::{
    backtrace::{Backtrace, BacktraceStatus},
    path::PathBuf,
    sync::Arc,
};

use alloy::primitives::{Address, Bytes};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use ramp::{
    cfg::Config,
    crypto::{OracleSignature, SecretKey},
    db::Db,
    digest::Report,
    host::Host,
    implementation::RampImplementation,
    proxy::Ramp,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    #[clap(long, short, default_values = ["config.toml"])]
    config_file: Vec<PathBuf>,
    #[clap(long, default_value = "false")]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the owner, committee, threshold and active logic module.
    Status,
    /// Replace the oracle committee.
    UpdateOracleNodes {
        #[arg(long, value_parser = SecretKey::from_hex)]
        secret_key: SecretKey,
        #[arg(required = true)]
        oracle_nodes: Vec<Address>,
    },
    /// Whitelist `source:target` chain pairs.
    UpdateChainWhitelist {
        #[arg(long, value_parser = SecretKey::from_hex)]
        secret_key: SecretKey,
        #[arg(required = true, value_parser = parse_chain_pair)]
        pairs: Vec<(u64, u64)>,
    },
    /// Allow an account to send requests.
    AddRampSender {
        #[arg(long, value_parser = SecretKey::from_hex)]
        secret_key: SecretKey,
        sender: Address,
    },
    /// Point the bridge at another configured logic module.
    UpdateImplementation {
        #[arg(long, value_parser = SecretKey::from_hex)]
        secret_key: SecretKey,
        implementation: Address,
    },
    /// Print the digest oracle nodes sign for a report.
    Digest {
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Sign a report as an oracle node.
    Sign {
        #[arg(long, value_parser = SecretKey::from_hex)]
        secret_key: SecretKey,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Print the event log.
    Events {
        #[arg(long, default_value_t = 0)]
        since: u64,
    },
}

#[derive(clap::Args, Debug)]
struct ReportArgs {
    /// ABI encoded report context, as hex.
    #[arg(long)]
    report_context: Bytes,
    #[arg(long)]
    message: Bytes,
    /// ABI encoded token amount, as hex.
    #[arg(long)]
    token_amount: Bytes,
}

impl Command {
    /// Whether the command changes the bridge's state.
    fn is_mutating(&self) -> bool {
        matches!(
            self,
            Command::UpdateOracleNodes { .. }
                | Command::UpdateChainWhitelist { .. }
                | Command::AddRampSender { .. }
                | Command::UpdateImplementation { .. }
        )
    }
}

impl From<ReportArgs> for Report {
    fn from(args: ReportArgs) -> Report {
        Report {
            report_context: args.report_context,
            message: args.message,
            token_amount: args.token_amount,
        }
    }
}

#[derive(Serialize)]
struct Status {
    chain_id: u64,
    address: Address,
    owner: Address,
    implementation: Address,
    version: String,
    oracle_nodes: Vec<Address>,
    signature_threshold: usize,
    forwarded_messages: u64,
}

#[derive(Serialize)]
struct Signed {
    signer: Address,
    signature: OracleSignature,
}

fn parse_chain_pair(s: &str) -> Result<(u64, u64)> {
    let (source, target) = s
        .split_once(':')
        .ok_or_else(|| anyhow!("expected <source>:<target>, got {s}"))?;
    Ok((source.parse()?, target.parse()?))
}

fn open(config: &Config) -> Result<Ramp> {
    let mut host = Host::new();
    host.deploy_module(
        config.implementation_address,
        Arc::new(RampImplementation::new(
            config.domain.name.clone(),
            config.domain.version.clone(),
        )),
    );
    for module in &config.modules {
        host.deploy_module(
            module.address,
            Arc::new(RampImplementation::new(
                module.domain.name.clone(),
                module.domain.version.clone(),
            )),
        );
    }

    let db = Db::new(config.data_dir.as_ref())?;
    Ok(Ramp::new(
        config.chain_id,
        config.ramp_address,
        host,
        db,
        config.genesis(),
    )?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(std::io::stderr);
    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    // Set a panic hook that records the panic as a `tracing` event at the `ERROR` verbosity level.
    std::panic::set_hook(Box::new(|panic| {
        let message = match panic.payload().downcast_ref::<&'static str>() {
            Some(s) => *s,
            None => match panic.payload().downcast_ref::<String>() {
                Some(s) => &s[..],
                None => "Box<dyn Any>",
            },
        };
        let backtrace = Backtrace::capture();
        let backtrace =
            (backtrace.status() == BacktraceStatus::Captured).then(|| backtrace.to_string());

        match panic.location() {
            Some(location) => tracing::error!(
                message,
                panic.file = location.file(),
                panic.line = location.line(),
                backtrace = backtrace.as_deref(),
            ),
            None => tracing::error!(message, backtrace = backtrace.as_deref()),
        }
    }));

    let config = Config::load(&args.config_file)?;
    run(&config, args.command)
}

fn run(config: &Config, command: Command) -> Result<()> {
    if command.is_mutating() && config.data_dir.is_none() {
        return Err(anyhow!(
            "no data_dir is configured, so the bridge is kept in memory and this change would be lost on exit"
        ));
    }
    let mut ramp = open(config)?;

    match command {
        Command::Status => {
            let status = Status {
                chain_id: ramp.chain_id(),
                address: ramp.address(),
                owner: ramp.owner()?,
                implementation: ramp.implementation(),
                version: ramp.version()?,
                oracle_nodes: ramp.oracle_nodes()?,
                signature_threshold: ramp.signature_threshold()?,
                forwarded_messages: ramp.forwarded_count()?,
            };
            print_json(&status)?;
        }
        Command::UpdateOracleNodes {
            secret_key,
            oracle_nodes,
        } => {
            ramp.update_oracle_nodes(secret_key.address(), oracle_nodes)?;
            info!(threshold = ramp.signature_threshold()?, "oracle nodes updated");
        }
        Command::UpdateChainWhitelist { secret_key, pairs } => {
            let (sources, targets) = pairs.into_iter().unzip();
            ramp.update_chain_id_whitelist(secret_key.address(), sources, targets)?;
        }
        Command::AddRampSender { secret_key, sender } => {
            ramp.add_ramp_sender(secret_key.address(), sender)?;
        }
        Command::UpdateImplementation {
            secret_key,
            implementation,
        } => {
            ramp.update_implementation(secret_key.address(), implementation)?;
        }
        Command::Digest { report } => {
            let domain = config
                .transmit_domain(ramp.implementation())
                .context("active implementation is not configured")?;
            println!("{}", Report::from(report).digest(&domain));
        }
        Command::Sign { secret_key, report } => {
            let domain = config
                .transmit_domain(ramp.implementation())
                .context("active implementation is not configured")?;
            let signature = Report::from(report).sign(&domain, &secret_key)?;
            print_json(&Signed {
                signer: secret_key.address(),
                signature,
            })?;
        }
        Command::Events { since } => {
            print_json(&ramp.events_since(since)?)?;
        }
    }

    Ok(())
}
