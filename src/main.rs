/// Version injected at compile time via ONEVIEW_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("ONEVIEW_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use oneview::activity::{ActivityError, ProgressSink, Task, TaskProgress, TracingSink};
use oneview::appliance::{format_api_error, Credentials, OneViewClient, Outcome};
use oneview::config::Config;
use oneview::networking::{
    FcNetworkRequest, Networking, DEFAULT_LINK_STABILITY_SECS, DEFAULT_MAXIMUM_BANDWIDTH_GBPS,
    DEFAULT_TYPICAL_BANDWIDTH_GBPS,
};
use oneview::output::{render_json, render_table, render_task};
use oneview::resource::{get_all_resource_keys, id_from_uri, ListQuery};
use oneview::storage::{
    AddStorageVolume, AlertFixType, ProvisionType, SnapshotRequest, Storage,
    StorageVolumeTemplateRequest,
};
use oneview::WaitMode;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Command line client for HP OneView storage and FC networking
#[derive(Parser, Debug)]
#[command(name = "oneview", version = VERSION, about, long_about = None)]
struct Args {
    /// Appliance hostname or IP address
    #[arg(short = 'a', long, global = true)]
    host: Option<String>,

    /// Appliance user name
    #[arg(short = 'u', long, global = true)]
    user: Option<String>,

    /// Appliance password
    #[arg(short = 'p', long, global = true)]
    password: Option<String>,

    /// Trusted SSL certificate bundle in PEM format
    #[arg(short = 'c', long, global = true)]
    cert: Option<PathBuf>,

    /// Proxy in host:port format
    #[arg(short = 'y', long, global = true)]
    proxy: Option<String>,

    /// Authorized login domain
    #[arg(short = 'j', long, global = true)]
    domain: Option<String>,

    /// REST API version sent as X-API-Version
    #[arg(long, global = true)]
    api_version: Option<u32>,

    /// Accept self-signed appliance certificates
    #[arg(long, global = true)]
    insecure: bool,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Report every task poll
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Return as soon as the appliance accepts a change instead of waiting for its task
    #[arg(long, global = true)]
    no_wait: bool,

    /// Seconds to wait for a task
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Seconds between two task polls
    #[arg(long, global = true)]
    interval: Option<u64>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fibre Channel networks
    #[command(subcommand)]
    FcNetwork(FcNetworkCommand),
    /// Storage volume attachments
    #[command(subcommand)]
    Attachments(AttachmentCommand),
    /// Storage systems, pools, volumes and templates
    #[command(subcommand)]
    Storage(StorageCommand),
    /// Appliance tasks
    #[command(subcommand)]
    Task(TaskCommand),
    /// Show whether the EULA still has to be accepted
    Eula {
        /// Accept it, allowing HPE support access when set
        #[arg(long)]
        accept: bool,
        #[arg(long, requires = "accept")]
        support_access: bool,
    },
    /// List the resource names the client knows about
    Resources,
    /// Remember host, user and login domain for later runs
    SaveConfig,
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    /// Filter expression, e.g. "name='pool1'"
    #[arg(long)]
    filter: Vec<String>,
    /// Sort expression, e.g. "freeCapacity:desc"
    #[arg(long)]
    sort: Option<String>,
    #[arg(long)]
    start: Option<u32>,
    #[arg(long)]
    count: Option<i32>,
    /// Query expression, e.g. "availableNetworks IN [/rest/fc-networks/1]"
    #[arg(long)]
    query: Option<String>,
}

impl ListArgs {
    fn to_query(&self) -> ListQuery {
        let mut query = ListQuery::new();
        if self.start.is_some() || self.count.is_some() {
            query = query.page(self.start.unwrap_or(0), self.count.unwrap_or(-1));
        }
        if let Some(ref sort) = self.sort {
            query = query.sort(sort);
        }
        for filter in &self.filter {
            query = query.filter(filter);
        }
        if let Some(ref q) = self.query {
            query = query.query(q);
        }
        query
    }
}

#[derive(Subcommand, Debug)]
enum FcNetworkCommand {
    /// Add a Fibre Channel network
    Create {
        /// Name of the network
        #[arg(short = 'n', long)]
        name: String,
        /// Typical bandwidth between .1 and 20 Gb/s
        #[arg(short = 'b', long, default_value_t = DEFAULT_TYPICAL_BANDWIDTH_GBPS)]
        typical_bandwidth: f64,
        /// Maximum bandwidth between .1 and 20 Gb/s
        #[arg(short = 'm', long, default_value_t = DEFAULT_MAXIMUM_BANDWIDTH_GBPS)]
        max_bandwidth: f64,
        /// URI of the associated managed SAN
        #[arg(short = 's', long)]
        managed_san: Option<String>,
        /// Link stability interval between 1 and 1800 seconds
        #[arg(short = 'l', long, default_value_t = DEFAULT_LINK_STABILITY_SECS)]
        link_stability: u32,
        /// Disable automatic login redistribution
        #[arg(short = 'x', long)]
        no_redistribution: bool,
        /// DirectAttach fabric type
        #[arg(short = 'd', long, conflicts_with = "fabric", required_unless_present = "fabric")]
        direct: bool,
        /// FabricAttach fabric type
        #[arg(short = 'f', long)]
        fabric: bool,
    },
    List(ListArgs),
    Get { id: String },
    Delete {
        id: String,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum AttachmentCommand {
    /// Get all storage volume attachments
    List(ListArgs),
    /// Get a storage volume attachment by id
    Get { id: String },
    /// Get the attachments of a volume by volume URI
    ByVolume { volume_uri: String },
    /// Paths of an attachment
    Paths { id: String },
    /// Extra unmanaged volumes still presented to server profiles
    Repair(ListArgs),
}

#[derive(Subcommand, Debug)]
enum StorageCommand {
    #[command(subcommand)]
    Systems(SystemCommand),
    #[command(subcommand)]
    Pools(PoolCommand),
    #[command(subcommand)]
    Volumes(VolumeCommand),
    #[command(subcommand)]
    Templates(TemplateCommand),
}

#[derive(Subcommand, Debug)]
enum SystemCommand {
    List(ListArgs),
    Get { id: String },
    Add {
        #[arg(long)]
        ip: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    Remove {
        id: String,
        #[arg(long)]
        force: bool,
    },
    HostTypes,
    Pools {
        id: String,
        #[command(flatten)]
        list: ListArgs,
    },
    Ports {
        id: String,
        #[command(flatten)]
        list: ListArgs,
    },
}

#[derive(Subcommand, Debug)]
enum PoolCommand {
    List(ListArgs),
    Get { id: String },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        system_uri: String,
    },
    Remove {
        id: String,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum VolumeCommand {
    List(ListArgs),
    Get { id: String },
    Create {
        #[arg(long)]
        name: String,
        /// Capacity in GiB
        #[arg(long)]
        capacity: u64,
        #[arg(long)]
        pool_uri: String,
        #[arg(long)]
        shareable: bool,
        /// Thin or Full
        #[arg(long, default_value = "Thin")]
        provision: ProvisionType,
        #[arg(long, default_value = "")]
        description: String,
    },
    Remove {
        id: String,
        /// Remove from the appliance only, keep the volume on the storage system
        #[arg(long)]
        export_only: bool,
        #[arg(long)]
        force: bool,
    },
    Attachable(ListArgs),
    Snapshots { id: String },
    Snapshot {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    RemoveSnapshot {
        id: String,
        snapshot_id: String,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum TemplateCommand {
    List(ListArgs),
    Get { id: String },
    Create {
        #[arg(long)]
        name: String,
        /// Capacity in GiB
        #[arg(long)]
        capacity: u64,
        #[arg(long)]
        pool_uri: String,
        #[arg(long)]
        shareable: bool,
        #[arg(long, default_value = "Thin")]
        provision: ProvisionType,
        #[arg(long, default_value = "")]
        description: String,
    },
    Remove {
        id: String,
        #[arg(long)]
        force: bool,
    },
    Connectable(ListArgs),
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    /// Wait for a task to finish
    Wait { uri: String },
    Get { uri: String },
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", log_path.display(), e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("oneview {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("oneview").join("oneview.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".oneview").join("oneview.log");
    }
    PathBuf::from("oneview.log")
}

/// File, then environment, then flags
fn effective_config(args: &Args) -> Config {
    let mut config = Config::load().with_env();
    if let Some(ref host) = args.host {
        config.host = Some(host.clone());
    }
    if let Some(ref user) = args.user {
        config.user = Some(user.clone());
    }
    if let Some(ref domain) = args.domain {
        config.domain = Some(domain.clone());
    }
    if let Some(ref proxy) = args.proxy {
        config.proxy = Some(proxy.clone());
    }
    if let Some(ref cert) = args.cert {
        config.ca_bundle = Some(cert.clone());
    }
    if args.api_version.is_some() {
        config.api_version = args.api_version;
    }
    if args.timeout.is_some() {
        config.poll_timeout_secs = args.timeout;
    }
    if args.interval.is_some() {
        config.poll_interval_secs = args.interval;
    }
    config.insecure |= args.insecure;
    config
}

async fn connect(args: &Args, config: &Config) -> Result<OneViewClient> {
    let password = args
        .password
        .as_deref()
        .context("No password: pass -p")?;
    let credentials = Credentials::new(config.effective_user(), password, &config.effective_domain());

    let mut client = OneViewClient::new(&config.http_settings()?, credentials)?
        .with_poll_policy(config.poll_policy());
    if args.verbose {
        client = client.with_progress_sink(Arc::new(|progress: &TaskProgress| {
            eprintln!(
                "{} {} {}% ({}s)",
                progress.uri,
                progress.state,
                progress.percent_complete.unwrap_or(0),
                progress.elapsed.as_secs()
            );
            TracingSink.observe(progress);
        }));
    }

    client.ensure_eula_accepted().await?;
    client.login().await?;
    Ok(client)
}

struct Printer {
    json: bool,
}

impl Printer {
    fn list(&self, resource_key: &str, items: &[Value]) {
        if self.json {
            println!("{}", render_json(&Value::Array(items.to_vec())));
        } else {
            println!("{}", render_table(resource_key, items));
        }
    }

    fn value(&self, value: &Value) {
        println!("{}", render_json(value));
    }

    fn task(&self, task: &Task) {
        if self.json {
            println!("{}", render_json(&task.to_value()));
        } else {
            println!("{}", render_task(task));
        }
    }

    fn outcome(&self, outcome: &Outcome) {
        if let Some(ref resource) = outcome.resource {
            self.value(resource);
        } else if let Some(ref task) = outcome.task {
            self.task(task);
        } else {
            println!("Done");
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    if let Err(err) = run(args).await {
        eprintln!("Error: {}", describe_error(&err));
        tracing::error!("{:?}", err);
        std::process::exit(1);
    }
}

fn describe_error(err: &anyhow::Error) -> String {
    if let Some(activity) = err.downcast_ref::<ActivityError>() {
        return activity.to_string();
    }
    format_api_error(err)
}

async fn run(args: Args) -> Result<()> {
    let printer = Printer { json: args.json };
    let wait = if args.no_wait {
        WaitMode::Background
    } else {
        WaitMode::Blocking
    };
    let mut config = effective_config(&args);

    match args.command {
        Command::Resources => {
            for key in get_all_resource_keys() {
                println!("{}", key);
            }
            return Ok(());
        }
        Command::SaveConfig => {
            let host = config.effective_host()?.to_string();
            let user = config.effective_user().to_string();
            config.set_host(&host, &user)?;
            if let Some(path) = Config::config_path() {
                println!("Saved {}", path.display());
            }
            return Ok(());
        }
        _ => {}
    }

    let client = connect(&args, &config).await?;
    let result = dispatch(&args.command, &client, &printer, wait).await;

    if let Err(e) = client.logout().await {
        tracing::warn!("Logout failed: {}", e);
    }
    result
}

async fn dispatch(
    command: &Command,
    client: &OneViewClient,
    printer: &Printer,
    wait: WaitMode,
) -> Result<()> {
    match command {
        Command::FcNetwork(cmd) => fc_network(cmd, client, printer, wait).await,
        Command::Attachments(cmd) => attachments(cmd, client, printer).await,
        Command::Storage(cmd) => storage(cmd, client, printer, wait).await,
        Command::Task(TaskCommand::Wait { uri }) => {
            let task = Task {
                uri: uri.clone(),
                ..Default::default()
            };
            let task = client.wait_for_task(&task).await?;
            printer.task(&task);
            Ok(())
        }
        Command::Task(TaskCommand::Get { uri }) => {
            printer.value(&client.get(uri).await?);
            Ok(())
        }
        Command::Eula {
            accept,
            support_access,
        } => {
            if *accept {
                printer.value(&client.accept_eula(*support_access).await?);
            } else {
                let needed = client.get_eula_status().await?;
                println!("EULA acceptance needed: {}", needed);
            }
            Ok(())
        }
        Command::Resources | Command::SaveConfig => Ok(()),
    }
}

async fn fc_network(
    cmd: &FcNetworkCommand,
    client: &OneViewClient,
    printer: &Printer,
    wait: WaitMode,
) -> Result<()> {
    let net = Networking::new(client);
    match cmd {
        FcNetworkCommand::Create {
            name,
            typical_bandwidth,
            max_bandwidth,
            managed_san,
            link_stability,
            no_redistribution,
            direct,
            fabric: _,
        } => {
            let mut request = if *direct {
                FcNetworkRequest::direct_attach(name)
            } else {
                FcNetworkRequest::fabric_attach(name)
                    .auto_login_redistribution(!no_redistribution)
                    .link_stability_time(*link_stability)
            };
            request = request.bandwidth(*typical_bandwidth, *max_bandwidth);
            if let Some(san) = managed_san {
                request = request.managed_san(san);
            }
            let outcome = net.create_fc_network(&request, wait).await?;
            match outcome.resource {
                Some(ref network) if !printer.json => {
                    println!("\nCreated FC Network\n");
                    println!("{}\n", render_table("fc-networks", std::slice::from_ref(network)));
                }
                _ => printer.outcome(&outcome),
            }
        }
        FcNetworkCommand::List(list) => {
            printer.list("fc-networks", &net.get_fc_networks(&list.to_query()).await?)
        }
        FcNetworkCommand::Get { id } => printer.value(&net.get_fc_network_by_id(id_from_uri(id)).await?),
        FcNetworkCommand::Delete { id, force } => {
            printer.outcome(&net.delete_fc_network(id_from_uri(id), *force, wait).await?)
        }
    }
    Ok(())
}

async fn attachments(cmd: &AttachmentCommand, client: &OneViewClient, printer: &Printer) -> Result<()> {
    let sto = Storage::new(client);
    match cmd {
        AttachmentCommand::List(list) => {
            printer.list("attachments", &sto.get_attachments_volumes(&list.to_query()).await?)
        }
        AttachmentCommand::Get { id } => {
            printer.value(&sto.get_attachments_volumes_by_id(id_from_uri(id)).await?)
        }
        AttachmentCommand::ByVolume { volume_uri } => printer.list(
            "attachments",
            &sto.get_attachments_volumes_by_volume_uri(volume_uri).await?,
        ),
        AttachmentCommand::Paths { id } => {
            printer.value(&sto.get_attachments_volumes_paths(id_from_uri(id)).await?)
        }
        AttachmentCommand::Repair(list) => printer.list(
            "attachments-repair",
            &sto.get_attachments_volumes_repair(
                AlertFixType::ExtraUnmanagedStorageVolumes,
                &list.to_query(),
            )
            .await?,
        ),
    }
    Ok(())
}

async fn storage(
    cmd: &StorageCommand,
    client: &OneViewClient,
    printer: &Printer,
    wait: WaitMode,
) -> Result<()> {
    let sto = Storage::new(client);
    match cmd {
        StorageCommand::Systems(cmd) => match cmd {
            SystemCommand::List(list) => {
                printer.list("storage-systems", &sto.get_storage_systems(&list.to_query()).await?)
            }
            SystemCommand::Get { id } => {
                printer.value(&sto.get_storage_system_by_id(id_from_uri(id)).await?)
            }
            SystemCommand::Add {
                ip,
                username,
                password,
            } => printer.outcome(&sto.add_storage_system(ip, username, password, wait).await?),
            SystemCommand::Remove { id, force } => printer.outcome(
                &sto.remove_storage_system(id_from_uri(id), *force, wait)
                    .await?,
            ),
            SystemCommand::HostTypes => printer.value(&sto.get_storage_systems_host_types().await?),
            SystemCommand::Pools { id, list } => printer.list(
                "storage-pools",
                &sto.get_storage_pools_in_storage_system(id_from_uri(id), &list.to_query())
                    .await?,
            ),
            SystemCommand::Ports { id, list } => printer.list(
                "managed-ports",
                &sto.get_storage_system_managed_ports(id_from_uri(id), &list.to_query())
                    .await?,
            ),
        },
        StorageCommand::Pools(cmd) => match cmd {
            PoolCommand::List(list) => {
                printer.list("storage-pools", &sto.get_storage_pools(&list.to_query()).await?)
            }
            PoolCommand::Get { id } => printer.value(&sto.get_storage_pool_by_id(id_from_uri(id)).await?),
            PoolCommand::Add { name, system_uri } => {
                printer.outcome(&sto.add_storage_pool(name, system_uri, wait).await?)
            }
            PoolCommand::Remove { id, force } => {
                printer.outcome(&sto.remove_storage_pool(id_from_uri(id), *force, wait).await?)
            }
        },
        StorageCommand::Volumes(cmd) => match cmd {
            VolumeCommand::List(list) => {
                printer.list("storage-volumes", &sto.get_storage_volumes(&list.to_query()).await?)
            }
            VolumeCommand::Get { id } => {
                printer.value(&sto.get_storage_volume_by_id(id_from_uri(id)).await?)
            }
            VolumeCommand::Create {
                name,
                capacity,
                pool_uri,
                shareable,
                provision,
                description,
            } => {
                let request = AddStorageVolume::new(name, *capacity, pool_uri, *shareable, *provision)?
                    .description(description);
                printer.outcome(&sto.add_storage_volume(&request, wait).await?)
            }
            VolumeCommand::Remove {
                id,
                export_only,
                force,
            } => printer.outcome(
                &sto.remove_storage_volume(id_from_uri(id), *export_only, *force, wait)
                    .await?,
            ),
            VolumeCommand::Attachable(list) => printer.list(
                "storage-volumes",
                &sto.get_attachable_volumes(&list.to_query()).await?,
            ),
            VolumeCommand::Snapshots { id } => printer.list(
                "snapshots",
                &sto.get_snapshots_from_volume(id_from_uri(id), &ListQuery::new())
                    .await?,
            ),
            VolumeCommand::Snapshot {
                id,
                name,
                description,
            } => {
                let request = match name {
                    Some(name) => SnapshotRequest::new(name, description),
                    None => SnapshotRequest {
                        description: description.clone(),
                        ..Default::default()
                    },
                };
                printer.outcome(
                    &sto.add_snapshot_for_volume(id_from_uri(id), &request, wait)
                        .await?,
                )
            }
            VolumeCommand::RemoveSnapshot {
                id,
                snapshot_id,
                force,
            } => printer.outcome(
                &sto.remove_snapshot_from_volume(
                    id_from_uri(id),
                    id_from_uri(snapshot_id),
                    *force,
                    wait,
                )
                .await?,
            ),
        },
        StorageCommand::Templates(cmd) => match cmd {
            TemplateCommand::List(list) => printer.list(
                "vol-templates",
                &sto.get_storage_volume_templates(&list.to_query()).await?,
            ),
            TemplateCommand::Get { id } => {
                printer.value(&sto.get_storage_volume_template_by_id(id_from_uri(id)).await?)
            }
            TemplateCommand::Create {
                name,
                capacity,
                pool_uri,
                shareable,
                provision,
                description,
            } => {
                let request =
                    StorageVolumeTemplateRequest::new(name, *capacity, pool_uri, *shareable, *provision)?
                        .description(description);
                printer.outcome(&sto.add_storage_volume_template(&request, wait).await?)
            }
            TemplateCommand::Remove { id, force } => printer.outcome(
                &sto.remove_storage_volume_template(id_from_uri(id), *force, wait)
                    .await?,
            ),
            TemplateCommand::Connectable(list) => printer.value(
                &sto.get_connectable_storage_volume_templates(&list.to_query())
                    .await?,
            ),
        },
    }
    Ok(())
}
