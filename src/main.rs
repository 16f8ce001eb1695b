//! Binary entry point for the Stratus CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use stratus::{
    CreateRequest, LifecycleError, MachineAttrs, MachineLifecycle, StratusClient, StratusConfig,
    UpdateRequest,
};

#[derive(Debug, Parser)]
#[command(
    name = "stratus",
    about = "Manage Stratus Cloud virtual machines",
    arg_required_else_help = true
)]
enum Cli {
    #[command(
        name = "create",
        about = "Create a machine and wait until it is reachable"
    )]
    Create(CreateCommand),
    #[command(name = "show", about = "Show a machine's attributes")]
    Show(MachineRef),
    #[command(
        name = "update",
        about = "Change a machine's capacity or power flags"
    )]
    Update(UpdateCommand),
    #[command(name = "delete", about = "Purge-delete a machine")]
    Delete(MachineRef),
    #[command(name = "exists", about = "Check whether a machine exists")]
    Exists(MachineRef),
}

#[derive(Debug, Parser)]
struct CreateCommand {
    /// Machine name.
    name: String,
    /// Core count; derived from --memory when omitted.
    #[arg(long, default_value_t = 0)]
    cores: u32,
    /// Memory in MiB; derived from --cores when omitted.
    #[arg(long, default_value_t = 0)]
    memory: u32,
    /// Distribution to image the root disc with; "none" skips imaging.
    #[arg(long)]
    os: Option<String>,
    /// Root disc size in MiB.
    #[arg(long)]
    disc_size: Option<u32>,
    /// Leave the machine powered off after provisioning.
    #[arg(long)]
    powered_off: bool,
    /// Explicit IPv4 address; omitted to let the remote side allocate.
    #[arg(long)]
    ipv4: Option<String>,
    /// Explicit IPv6 address; omitted to let the remote side allocate.
    #[arg(long)]
    ipv6: Option<String>,
    /// SSH public key material to install during imaging.
    #[arg(long)]
    ssh_public_key: Option<String>,
    /// Script to execute on first boot.
    #[arg(long)]
    firstboot_script: Option<String>,
    /// Group to create the machine in; the configured default applies.
    #[arg(long)]
    group: Option<String>,
    /// Zone to create the machine in; the configured default applies.
    #[arg(long)]
    zone: Option<String>,
}

#[derive(Debug, Parser)]
struct MachineRef {
    /// Machine identifier or name.
    id: String,
}

#[derive(Debug, Parser)]
struct UpdateCommand {
    /// Machine identifier or name.
    id: String,
    /// New core count; sent together with memory.
    #[arg(long)]
    cores: Option<u32>,
    /// New memory in MiB; sent together with cores.
    #[arg(long)]
    memory: Option<u32>,
    /// Explicit power intent; overrides the power cycle a resize implies.
    #[arg(long)]
    power_on: Option<bool>,
    /// Explicit auto-reboot intent.
    #[arg(long)]
    reboot: Option<bool>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("request error: {0}")]
    Request(String),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    let lifecycle = lifecycle_from_env()?;
    match cli {
        Cli::Create(command) => create_machine(&lifecycle, command).await,
        Cli::Show(command) => {
            let attrs = lifecycle.read(&command.id).await?;
            print_attrs(&attrs);
            Ok(0)
        }
        Cli::Update(command) => {
            let request = UpdateRequest {
                cores: command.cores,
                memory: command.memory,
                power_on: command.power_on,
                reboot: command.reboot,
            };
            lifecycle.update(&command.id, &request).await?;
            // The update response carries no disc or interface detail.
            let attrs = lifecycle.read(&command.id).await?;
            print_attrs(&attrs);
            Ok(0)
        }
        Cli::Delete(command) => {
            lifecycle.delete(&command.id).await?;
            writeln!(io::stdout(), "machine {} deleted", command.id).ok();
            Ok(0)
        }
        Cli::Exists(command) => {
            if lifecycle.exists(&command.id).await? {
                writeln!(io::stdout(), "present").ok();
                Ok(0)
            } else {
                writeln!(io::stdout(), "absent").ok();
                Ok(3)
            }
        }
    }
}

async fn create_machine(
    lifecycle: &MachineLifecycle,
    command: CreateCommand,
) -> Result<i32, CliError> {
    let mut builder = CreateRequest::builder()
        .name(command.name)
        .cores(command.cores)
        .memory(command.memory)
        .power_on(!command.powered_off)
        .group(command.group)
        .zone(command.zone)
        .ipv4(command.ipv4)
        .ipv6(command.ipv6)
        .ssh_public_key(command.ssh_public_key)
        .firstboot_script(command.firstboot_script);
    if let Some(os) = command.os {
        builder = builder.distribution(os);
    }
    if let Some(size) = command.disc_size {
        builder = builder.disc_size(size);
    }
    let request = builder
        .build()
        .map_err(|err| CliError::Request(err.to_string()))?;

    let attrs = lifecycle.create(&request).await?;
    print_attrs(&attrs);
    if let Some(password) = &attrs.root_password {
        writeln!(io::stdout(), "root_password: {password}").ok();
    }
    Ok(0)
}

fn lifecycle_from_env() -> Result<MachineLifecycle, CliError> {
    let config =
        StratusConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    config
        .validate()
        .map_err(|err| CliError::Config(err.to_string()))?;
    Ok(MachineLifecycle::new(StratusClient::new(config)))
}

fn print_attrs(attrs: &MachineAttrs) {
    let mut out = io::stdout();
    if let Some(id) = attrs.id {
        writeln!(out, "id: {id}").ok();
    }
    writeln!(out, "name: {}", attrs.name).ok();
    writeln!(out, "cores: {}", attrs.cores).ok();
    writeln!(out, "memory: {} MiB", attrs.memory).ok();
    writeln!(out, "power_on: {}", attrs.power_on).ok();
    writeln!(out, "reboot: {}", attrs.reboot).ok();
    writeln!(out, "group: {}", attrs.group).ok();
    if let Some(group_id) = attrs.group_id {
        writeln!(out, "group_id: {group_id}").ok();
    }
    writeln!(out, "zone: {}", attrs.zone).ok();
    if let Some(os) = &attrs.os {
        writeln!(out, "os: {os}").ok();
    }
    if let Some(ipv4) = &attrs.ipv4 {
        writeln!(out, "ipv4: {ipv4}").ok();
    }
    if let Some(ipv6) = &attrs.ipv6 {
        writeln!(out, "ipv6: {ipv6}").ok();
    }
    if let Some(disc_size) = attrs.disc_size {
        writeln!(out, "disc_size: {disc_size} MiB").ok();
    }
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
