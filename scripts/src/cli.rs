//! Definitions of CLI arguments and commands for deploy scripts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use deploy_core::{
    artifacts::ArtifactDir,
    constants::DEFAULT_MARKET,
    context::{DeploymentContext, Market, Network},
    ledger::DeploymentLedger,
    Deployer,
};

use crate::{
    client::AlloyClient,
    commands::{materialize, resolve, show, wire, ScriptDeployer},
    errors::ScriptError,
    upgrades::AlloyUpgradeManager,
    utils::{parse_address, setup_client},
};

/// Deploy and wire contracts, skipping every step that is already done
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Private key of the deployer
    #[arg(short, long, env = "PKEY")]
    pub priv_key: Option<String>,

    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL", default_value = "http://localhost:8545")]
    pub rpc_url: String,

    /// The network being deployed to
    #[arg(short, long)]
    pub network: Network,

    /// The market namespace within the network
    #[arg(short, long, default_value = DEFAULT_MARKET)]
    pub market: String,

    /// The root directory of the deployment ledger
    #[arg(long, default_value = "deployments")]
    pub deployments_dir: PathBuf,

    /// The directory holding the `.abi` and `.bin` artifacts of every kind
    #[arg(long, default_value = "artifacts")]
    pub artifacts_dir: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The deploy script commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Deploy a resource unless the ledger already records it
    Materialize(MaterializeArgs),
    /// Point an address-valued setting of a recorded resource at a value,
    /// unless it already points there
    Wire(WireArgs),
    /// Print the resources recorded for the network and market
    Show,
    /// Print the kind deployed for a logical resource on the network
    Resolve(ResolveArgs),
}

impl Cli {
    /// Run the selected command
    pub async fn run(self) -> Result<(), ScriptError> {
        let ctx = DeploymentContext::new(self.network, Market::new(&self.market))?;
        let ledger = DeploymentLedger::new(&self.deployments_dir);

        match &self.command {
            Command::Materialize(args) => {
                let deployer = self.deployer(ctx, ledger, args.owner.as_deref())?;
                materialize(args, deployer).await
            }
            Command::Wire(args) => {
                let deployer = self.deployer(ctx, ledger, None /* owner */)?;
                wire(args, &deployer).await
            }
            Command::Show => show(&ctx, &ledger).await,
            Command::Resolve(args) => resolve(&ctx, args),
        }
    }

    /// Connect to the network and set up a deployer for `ctx`
    fn deployer(
        &self,
        ctx: DeploymentContext,
        ledger: DeploymentLedger,
        owner: Option<&str>,
    ) -> Result<ScriptDeployer, ScriptError> {
        let priv_key = self.priv_key.as_deref().ok_or_else(|| {
            ScriptError::ClientInitialization("no private key, pass --priv-key or set PKEY".into())
        })?;
        let (provider, signer) = setup_client(priv_key, &self.rpc_url)?;
        let owner = owner.map(parse_address).transpose()?.unwrap_or(signer);

        let client = AlloyClient::new(provider);
        let artifacts = ArtifactDir::new(&self.artifacts_dir);
        let upgrades = AlloyUpgradeManager::new(client.clone(), owner);

        Ok(Deployer::new(ctx, ledger, client, upgrades, artifacts))
    }
}

/// Deploy a resource of a logical kind.
///
/// With `--upgradeable` the resource is an implementation contract deployed
/// behind a `TransparentUpgradeableProxy`, and `--args` is the initializer
/// calldata passed through the proxy.
#[derive(Args, Debug)]
pub struct MaterializeArgs {
    /// The resource name the deployment is recorded under
    #[arg(long)]
    pub name: String,

    /// The logical kind, resolved to a concrete kind for the network
    #[arg(short, long)]
    pub kind: String,

    /// ABI-encoded constructor arguments, or initializer calldata, in hex
    #[arg(short, long)]
    pub args: Option<String>,

    /// Deploy behind an upgradeable proxy
    #[arg(short, long)]
    pub upgradeable: bool,

    /// Owner of the proxy admin, defaults to the deployer
    #[arg(short, long)]
    pub owner: Option<String>,

    /// Fail instead of warning when the recorded deployment was made from a
    /// different image or arguments
    #[arg(long)]
    pub strict: bool,
}

/// Reconcile an address-valued setting
#[derive(Args, Debug)]
pub struct WireArgs {
    /// The label the step is reported under
    #[arg(short, long)]
    pub label: String,

    /// The recorded resource being configured
    #[arg(short, long)]
    pub resource: String,

    /// Signature of the getter reading the setting, e.g. `fujiAdmin()`
    #[arg(short, long)]
    pub getter: String,

    /// Signature of the setter writing the setting, e.g. `setFujiAdmin(address)`
    #[arg(short, long)]
    pub setter: String,

    /// The desired value: an address, or `@<resource>` for a recorded resource
    #[arg(short, long)]
    pub value: String,
}

/// Resolve a logical kind
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// The logical kind, e.g. `vault`
    #[arg(short, long)]
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_materialize() {
        let cli = Cli::try_parse_from([
            "deploy-scripts",
            "--network",
            "fantom",
            "materialize",
            "--name",
            "vaultFTMDAI",
            "--kind",
            "vault",
            "--upgradeable",
        ])
        .unwrap();

        assert_eq!(cli.network, Network::Fantom);
        assert_eq!(cli.market, DEFAULT_MARKET);
        assert_eq!(cli.deployments_dir, PathBuf::from("deployments"));
        match cli.command {
            Command::Materialize(args) => {
                assert_eq!(args.name, "vaultFTMDAI");
                assert!(args.upgradeable);
                assert!(!args.strict);
                assert!(args.args.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_unknown_network_is_rejected() {
        let res = Cli::try_parse_from(["deploy-scripts", "--network", "solana", "show"]);
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn test_unknown_market_is_rejected() {
        let cli = Cli::try_parse_from([
            "deploy-scripts",
            "--network",
            "fantom",
            "--market",
            "fuse",
            "resolve",
            "--kind",
            "vault",
        ])
        .unwrap();

        assert!(matches!(cli.run().await, Err(ScriptError::Config(_))));
    }
}
