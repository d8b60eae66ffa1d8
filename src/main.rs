use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing_subscriber::{EnvFilter, fmt};

use redgrant::acl::{Privilege, PrivilegeSet, TargetKind};
use redgrant::config::{self, ClusterArgs, ClusterConfig};
use redgrant::credentials::{CredentialProvider, EnvCredentials};
use redgrant::db;
use redgrant::grant::{GrantSpec, GrantTarget, Grantee, GranteeKind};
use redgrant::identity::GrantId;
use redgrant::reconcile::{GrantReconciler, GroupReconciler, SchemaReconciler, UserReconciler};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, default_value = "redgrant.yaml", global = true)]
    config_file: String,

    /// Enable verbose output (info level)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress all non-essential output (error level only)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Enable debug output (debug level)
    #[arg(long, global = true)]
    debug: bool,

    #[command(flatten)]
    cluster: ClusterArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Converge a grant to the declared privilege set
    Apply(GrantArgs),
    /// Read back the observed state behind a grant identifier
    Refresh(RefreshArgs),
    /// Revoke everything a grant controls
    Destroy(DestroyArgs),
    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Manage groups
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },
    /// Manage schemas
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
}

#[derive(clap::Args)]
struct GrantArgs {
    /// Grantee kind
    #[arg(long, value_enum)]
    kind: GranteeKind,

    /// Grantee name
    #[arg(long)]
    grantee: String,

    /// Schema the grant applies to
    #[arg(long)]
    schema: String,

    /// Grant scope: the schema itself, or all tables in it
    #[arg(long, value_enum, default_value = "schema")]
    target: TargetKind,

    /// Owner whose future tables the default privileges cover
    /// (required with --target all-tables)
    #[arg(long)]
    owner: Option<String>,

    /// Comma-separated privilege list, e.g. usage,create or select,insert
    #[arg(long)]
    privileges: String,
}

#[derive(clap::Args)]
struct RefreshArgs {
    /// Grantee kind the identifier was issued for
    #[arg(long, value_enum)]
    kind: GranteeKind,

    /// Grant scope the identifier was issued for
    #[arg(long, value_enum, default_value = "schema")]
    target: TargetKind,

    /// Composite grant identifier
    id: String,
}

#[derive(clap::Args)]
struct DestroyArgs {
    #[arg(long, value_enum)]
    kind: GranteeKind,

    #[arg(long)]
    grantee: String,

    #[arg(long)]
    schema: String,

    #[arg(long, value_enum, default_value = "schema")]
    target: TargetKind,

    #[arg(long)]
    owner: Option<String>,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user; the password comes from the credential provider
    Create { name: String },
    /// Rename a user
    Rename { old: String, new: String },
    /// Rotate a user's password from the credential provider
    SetPassword { name: String },
    /// Drop a user
    Drop { name: String },
    /// Show the user name behind a durable id
    Read { id: String },
}

#[derive(Subcommand)]
enum GroupCommands {
    /// Create a group, optionally seeded with members
    Create {
        name: String,
        #[arg(long, value_delimiter = ',')]
        members: Vec<String>,
    },
    /// Rename a group
    Rename { old: String, new: String },
    /// Replace the group's membership
    SetMembers {
        name: String,
        #[arg(long, value_delimiter = ',')]
        current: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        desired: Vec<String>,
    },
    /// Drop a group
    Drop { name: String },
    /// Show the group state behind a durable id
    Read { id: String },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Create a schema, optionally owned by another user
    Create {
        name: String,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Rename a schema
    Rename { old: String, new: String },
    /// Transfer schema ownership
    SetOwner { name: String, owner: String },
    /// Drop a schema
    Drop { name: String },
    /// Show the schema state behind a durable id
    Read { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli);

    let file = config::load_config(&cli.config_file)?;
    let cluster = ClusterConfig::resolve(&file, &cli.cluster)?;
    let provider = EnvCredentials::new(config::password_env(&file));
    let password = provider.password(&cluster.user)?;
    let pool = db::connect_with_retry(cluster.connect_options(&password)?).await?;

    match cli.command {
        Commands::Apply(args) => {
            let spec = GrantSpec {
                grantee: Grantee::new(args.kind, args.grantee),
                target: grant_target(args.target, args.schema, args.owner)?,
                privileges: parse_privileges(&args.privileges)?,
            };
            let id = GrantReconciler::new(&pool).apply(&spec).await?;
            println!("{id}");
        }
        Commands::Refresh(args) => {
            let id = GrantId::parse(args.target, &args.id)?;
            match GrantReconciler::new(&pool).refresh(args.kind, &id).await? {
                Some(state) => {
                    let privileges = state
                        .privileges
                        .keywords(args.target)
                        .join(",");
                    match state.owner {
                        Some(owner) => println!(
                            "{} on {} (owner {}): {}",
                            state.grantee.name(),
                            state.schema,
                            owner,
                            privileges
                        ),
                        None => println!(
                            "{} on {}: {}",
                            state.grantee.name(),
                            state.schema,
                            privileges
                        ),
                    }
                }
                None => println!("absent"),
            }
        }
        Commands::Destroy(args) => {
            let grantee = Grantee::new(args.kind, args.grantee);
            let target = grant_target(args.target, args.schema, args.owner)?;
            GrantReconciler::new(&pool).destroy(&grantee, &target).await?;
        }
        Commands::User { command } => match command {
            UserCommands::Create { name } => {
                let password = provider.password(&name)?;
                let id = UserReconciler::new(&pool).create(&name, &password).await?;
                println!("{id}");
            }
            UserCommands::Rename { old, new } => {
                UserReconciler::new(&pool).rename(&old, &new).await?;
            }
            UserCommands::SetPassword { name } => {
                let password = provider.password(&name)?;
                UserReconciler::new(&pool).set_password(&name, &password).await?;
            }
            UserCommands::Drop { name } => {
                UserReconciler::new(&pool).destroy(&name).await?;
            }
            UserCommands::Read { id } => match UserReconciler::new(&pool).read(&id).await? {
                Some(name) => println!("{name}"),
                None => println!("absent"),
            },
        },
        Commands::Group { command } => match command {
            GroupCommands::Create { name, members } => {
                let id = GroupReconciler::new(&pool).create(&name, &members).await?;
                println!("{id}");
            }
            GroupCommands::Rename { old, new } => {
                GroupReconciler::new(&pool).rename(&old, &new).await?;
            }
            GroupCommands::SetMembers {
                name,
                current,
                desired,
            } => {
                GroupReconciler::new(&pool)
                    .replace_members(&name, &current, &desired)
                    .await?;
            }
            GroupCommands::Drop { name } => {
                GroupReconciler::new(&pool).destroy(&name).await?;
            }
            GroupCommands::Read { id } => match GroupReconciler::new(&pool).read(&id).await? {
                Some(state) => println!("{} [{}]", state.name, state.members.join(",")),
                None => println!("absent"),
            },
        },
        Commands::Schema { command } => match command {
            SchemaCommands::Create { name, owner } => {
                let id = SchemaReconciler::new(&pool)
                    .create(&name, owner.as_deref())
                    .await?;
                println!("{id}");
            }
            SchemaCommands::Rename { old, new } => {
                SchemaReconciler::new(&pool).rename(&old, &new).await?;
            }
            SchemaCommands::SetOwner { name, owner } => {
                SchemaReconciler::new(&pool).set_owner(&name, &owner).await?;
            }
            SchemaCommands::Drop { name } => {
                SchemaReconciler::new(&pool).destroy(&name).await?;
            }
            SchemaCommands::Read { id } => match SchemaReconciler::new(&pool).read(&id).await? {
                Some(state) => println!("{} (owner {})", state.name, state.owner),
                None => println!("absent"),
            },
        },
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("redgrant={level}")));
    fmt().with_env_filter(filter).init();
}

fn grant_target(kind: TargetKind, schema: String, owner: Option<String>) -> Result<GrantTarget> {
    Ok(match kind {
        TargetKind::Schema => {
            if owner.is_some() {
                bail!("--owner only applies to --target all-tables");
            }
            GrantTarget::Schema { schema }
        }
        TargetKind::AllTables => GrantTarget::AllTables {
            schema,
            owner: owner.context("--owner is required with --target all-tables")?,
        },
    })
}

fn parse_privileges(list: &str) -> Result<PrivilegeSet> {
    let mut set = PrivilegeSet::new();
    for word in list.split(',').map(str::trim).filter(|w| !w.is_empty()) {
        match Privilege::from_keyword(word) {
            Some(privilege) => set.insert(privilege),
            None => bail!(
                "unknown privilege {word:?} (expected usage, create, select, insert, update, \
                 delete, or references)"
            ),
        }
    }
    Ok(set)
}
