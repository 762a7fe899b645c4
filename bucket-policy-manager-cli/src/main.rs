//! bucket-policy-manager - apply, remove, back up and restore S3 bucket policy statements
//!
//! Usage:
//!   bucket-policy-manager apply --template NAME [--no-backup]
//!   bucket-policy-manager remove --sid SID
//!   bucket-policy-manager restore --bucket NAME --backup-file PATH
//!   bucket-policy-manager list-templates
//!   bucket-policy-manager list-backups [--bucket NAME]

mod output;

use anyhow::{Context, Result};
use bucket_policy_manager_core::{
    select_buckets, ApplyOptions, AwsOptions, AwsS3PolicyStore, PolicyManagerService,
    TemplateCatalog,
};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use log::debug;
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Action {
    /// Merge a template statement into the policies of selected buckets
    Apply,
    /// Remove a statement by Sid from the policies of selected buckets
    Remove,
    /// Upload a backup file as a bucket's policy
    Restore,
    /// List available policy templates
    ListTemplates,
    /// List policy backups for the current account
    ListBackups,
}

#[derive(Parser, Debug)]
#[command(name = "bucket-policy-manager", version, about = "Manage S3 bucket policies")]
struct Cli {
    /// Action to perform
    #[arg(value_enum)]
    action: Action,

    /// Name of the policy template to apply
    #[arg(long)]
    template: Option<String>,

    /// Policy Sid to remove
    #[arg(long)]
    sid: Option<String>,

    /// Specific bucket for backup listing/restoration
    #[arg(long)]
    bucket: Option<String>,

    /// Backup file to restore from
    #[arg(long)]
    backup_file: Option<PathBuf>,

    /// Skip backing up existing policies
    #[arg(long)]
    no_backup: bool,

    /// Directory holding policy templates
    #[arg(long, env = "BUCKET_POLICY_TEMPLATES_DIR", default_value = "policy_templates")]
    templates_dir: PathBuf,

    /// Directory under which policy_backups_<account_id> is created
    #[arg(long, env = "BUCKET_POLICY_BACKUP_ROOT", default_value = ".")]
    backup_root: PathBuf,

    /// AWS profile to use instead of the default credential chain
    #[arg(long)]
    profile: Option<String>,

    /// AWS region for the initial S3 and STS clients
    #[arg(long)]
    region: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// A fully validated request.
#[derive(Debug)]
enum Request {
    Apply { template: String, backup: bool },
    Remove { sid: String },
    Restore { bucket: String, backup_file: PathBuf },
    ListTemplates,
    ListBackups { bucket: Option<String> },
}

impl Cli {
    fn request(&self) -> Result<Request, clap::Error> {
        let missing = |message: &str| {
            Cli::command().error(ErrorKind::MissingRequiredArgument, message)
        };

        Ok(match self.action {
            Action::Apply => Request::Apply {
                template: self
                    .template
                    .clone()
                    .ok_or_else(|| missing("--template is required for apply action"))?,
                backup: !self.no_backup,
            },
            Action::Remove => Request::Remove {
                sid: self
                    .sid
                    .clone()
                    .ok_or_else(|| missing("--sid is required for remove action"))?,
            },
            Action::Restore => match (&self.bucket, &self.backup_file) {
                (Some(bucket), Some(backup_file)) => Request::Restore {
                    bucket: bucket.clone(),
                    backup_file: backup_file.clone(),
                },
                _ => {
                    return Err(missing(
                        "Both --bucket and --backup-file are required for restore action",
                    ))
                }
            },
            Action::ListTemplates => Request::ListTemplates,
            Action::ListBackups => Request::ListBackups {
                bucket: self.bucket.clone(),
            },
        })
    }

    fn aws_options(&self) -> AwsOptions {
        AwsOptions {
            profile: self.profile.clone(),
            region: self.region.clone(),
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

async fn connect(cli: &Cli) -> Result<PolicyManagerService<AwsS3PolicyStore>> {
    PolicyManagerService::connect(&cli.aws_options(), &cli.backup_root)
        .await
        .context("Error getting AWS account ID")
}

/// Show the bucket menu on stderr and read the operator's choice from stdin.
async fn choose_buckets(service: &PolicyManagerService<AwsS3PolicyStore>) -> Result<Vec<String>> {
    let buckets = service
        .list_buckets()
        .await
        .context("Error listing buckets")?;

    let stdin = std::io::stdin();
    let stderr = std::io::stderr();
    select_buckets(&buckets, &mut stdin.lock(), &mut stderr.lock())
        .context("Error selecting buckets")
}

/// Run the request and return the process exit code.
async fn run(cli: &Cli, request: Request) -> Result<i32> {
    let catalog = TemplateCatalog::new(&cli.templates_dir);
    debug!("Running {:?}", request);

    match request {
        Request::ListTemplates => {
            let templates = catalog.list().await?;
            Ok(output::print_templates(&catalog, &templates))
        }
        Request::ListBackups { bucket } => {
            let service = connect(cli).await?;
            let backups = service.backups().list(bucket.as_deref()).await?;
            output::print_backups(service.backups(), &backups);
            Ok(0)
        }
        Request::Restore {
            bucket,
            backup_file,
        } => {
            let service = connect(cli).await?;
            let result = service.restore(&bucket, &backup_file).await;
            output::print_restore(&bucket, &result)?;
            Ok(0)
        }
        Request::Apply { template, backup } => {
            let template = catalog
                .load(&template)
                .await
                .context("Failed to load policy template")?;
            let service = connect(cli).await?;
            let buckets = choose_buckets(&service).await?;
            let report = service
                .apply(&buckets, &template, ApplyOptions { backup })
                .await;
            Ok(output::print_report(&report)?)
        }
        Request::Remove { sid } => {
            let service = connect(cli).await?;
            let buckets = choose_buckets(&service).await?;
            let report = service.remove(&buckets, &sid).await;
            Ok(output::print_report(&report)?)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let request = match cli.request() {
        Ok(request) => request,
        Err(e) => e.exit(),
    };

    match run(&cli, request).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
