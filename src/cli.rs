// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Command line interface and subcommand dispatch.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use kube::Client;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::cmd::{self, DumpOptions};
use crate::config::Config;
use crate::install;
use crate::kubernetes::{create_client, ApplyOutcome, ClientOptions, Collection};
use crate::olm::{self, OlmOptions};

#[derive(Parser, Debug)]
#[command(name = "yaks")]
#[command(about = "Client for the YAKS test operator on Kubernetes")]
#[command(version)]
pub struct Cli {
    /// Namespace to use for all operations
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    /// Path to the kubeconfig file
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or update a test from a feature file or URL
    Test(TestArgs),
    /// Dump the state of YAKS resources in a namespace
    Dump(DumpArgs),
    /// Install the cluster prerequisites and optionally the operator via OLM
    Install(InstallArgs),
    /// Remove an operator installed via OLM
    Uninstall(UninstallArgs),
}

#[derive(Args, Debug)]
pub struct TestArgs {
    /// Feature file path or HTTP(S) URL
    pub source: String,
}

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Write the dump to this file instead of stdout
    pub filename: Option<PathBuf>,

    /// Name of the test to dump
    #[arg(short, long)]
    pub test: Option<String>,

    /// Label selector to include pods when scraping pod logs
    #[arg(short, long)]
    pub includes: Vec<String>,

    /// Number of pod log lines to print, 0 for all
    #[arg(short, long, default_value_t = 0)]
    pub lines: i64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
}

#[derive(Args, Debug, Default)]
pub struct OlmArgs {
    /// Prefix of the operator cluster service version name
    #[arg(long)]
    pub olm_operator_name: Option<String>,
    /// OLM package to subscribe to
    #[arg(long)]
    pub olm_package: Option<String>,
    /// OLM channel to follow
    #[arg(long)]
    pub olm_channel: Option<String>,
    /// Catalog source providing the package
    #[arg(long)]
    pub olm_source: Option<String>,
    /// Namespace of the catalog source
    #[arg(long)]
    pub olm_source_namespace: Option<String>,
    /// Cluster service version to install first
    #[arg(long)]
    pub olm_starting_csv: Option<String>,
    /// Namespace for operators watching all namespaces
    #[arg(long)]
    pub olm_global_namespace: Option<String>,
}

impl OlmArgs {
    /// Overlay the flags on the configured options
    pub fn merge(&self, base: &OlmOptions) -> OlmOptions {
        let pick = |flag: &Option<String>, value: &String| flag.clone().unwrap_or_else(|| value.clone());
        OlmOptions {
            operator_name: pick(&self.olm_operator_name, &base.operator_name),
            package: pick(&self.olm_package, &base.package),
            channel: pick(&self.olm_channel, &base.channel),
            source: pick(&self.olm_source, &base.source),
            source_namespace: pick(&self.olm_source_namespace, &base.source_namespace),
            starting_csv: pick(&self.olm_starting_csv, &base.starting_csv),
            global_namespace: pick(&self.olm_global_namespace, &base.global_namespace),
        }
    }
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Skip the installation of CRDs and cluster roles
    #[arg(long)]
    pub skip_cluster_setup: bool,

    /// Install the operator through the Operator Lifecycle Manager
    #[arg(long)]
    pub olm: bool,

    /// Install the operator for all namespaces
    #[arg(long)]
    pub global: bool,

    /// Environment variable for the operator, as KEY=VALUE
    #[arg(long = "operator-env")]
    pub operator_env: Vec<String>,

    /// Print the resources instead of installing them
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    #[command(flatten)]
    pub olm_args: OlmArgs,
}

#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Remove the OLM subscription and cluster service version
    #[arg(long)]
    pub olm: bool,

    /// The operator was installed for all namespaces
    #[arg(long)]
    pub global: bool,

    #[command(flatten)]
    pub olm_args: OlmArgs,
}

/// First namespace found in command line, environment and kubeconfig context
pub fn resolve_namespace(cli: Option<&str>, config: &Config, context: &str) -> String {
    cli.or(config.namespace.as_deref())
        .filter(|ns| !ns.is_empty())
        .or(Some(context).filter(|ns| !ns.is_empty()))
        .unwrap_or("default")
        .to_string()
}

/// Run the selected subcommand
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let client_options = ClientOptions {
        kubeconfig: cli.kubeconfig.clone(),
        context: cli.context.clone(),
    };
    let (client, context_namespace) = create_client(&client_options)
        .await
        .context("Failed to connect to the cluster")?;
    let namespace = resolve_namespace(cli.namespace.as_deref(), &config, &context_namespace);
    debug!("Using namespace {}", namespace);

    match cli.command {
        Command::Test(args) => run_test(&client, &namespace, &args).await,
        Command::Dump(args) => run_dump(&client, &namespace, &args).await,
        Command::Install(args) => run_install(&client, &namespace, &config, &args).await,
        Command::Uninstall(args) => run_uninstall(&client, &namespace, &config, &args).await,
    }
}

async fn run_test(client: &Client, namespace: &str, args: &TestArgs) -> Result<()> {
    let (test, outcome) = cmd::create_test(client, namespace, &args.source).await?;
    let name = test.metadata.name.unwrap_or_default();
    match outcome {
        ApplyOutcome::Replaced => println!("test \"{}\" updated", name),
        _ => println!("test \"{}\" created", name),
    }
    Ok(())
}

async fn run_dump(client: &Client, namespace: &str, args: &DumpArgs) -> Result<()> {
    let options = DumpOptions {
        test: args.test.clone(),
        includes: args.includes.clone(),
        lines: args.lines,
    };

    let mut out: Box<dyn Write> = match &args.filename {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    match &options.test {
        Some(test) => cmd::dump_test(client, test, namespace, out.as_mut(), &options).await?,
        None => cmd::dump_all(client, namespace, out.as_mut(), &options).await?,
    }
    out.flush()?;
    Ok(())
}

async fn run_install(client: &Client, namespace: &str, config: &Config, args: &InstallArgs) -> Result<()> {
    let mut collection = args.output.map(|_| Collection::new());

    if args.skip_cluster_setup {
        if collection.is_none() {
            install::operator_startup_optional_tools(client).await;
        }
    } else {
        install::setup_cluster_wide_resources_or_collect(client, collection.as_mut(), config.crd_wait_timeout)
            .await
            .context("Failed to set up cluster-wide resources")?;
    }

    if args.olm {
        let options = args.olm_args.merge(&config.olm);
        if collection.is_none() && !olm::has_permission_to_install(client, namespace, args.global, &options).await? {
            bail!(
                "current user is not allowed to install the operator via OLM in namespace {}",
                namespace
            );
        }

        let installed = olm::install(
            client,
            namespace,
            args.global,
            &options,
            &args.operator_env,
            collection.as_mut(),
        )
        .await?;
        if collection.is_none() {
            if installed {
                println!("OLM is available in the cluster, operator installed via subscription");
            } else {
                println!("Operator is already installed via OLM");
            }
        }
    }

    match collection {
        Some(collection) => print!("{}", collection.to_yaml()?),
        None => info!("Installation in namespace {} finished", namespace),
    }
    Ok(())
}

async fn run_uninstall(client: &Client, namespace: &str, config: &Config, args: &UninstallArgs) -> Result<()> {
    if !args.olm {
        bail!("only operators installed via OLM can be uninstalled, use --olm");
    }

    let options = args.olm_args.merge(&config.olm);
    olm::uninstall(client, namespace, args.global, &options).await?;
    println!("Operator uninstalled from OLM");
    Ok(())
}
