//! Implementations of the various deploy scripts

use alloy_primitives::Address;
use deploy_core::{
    client::LedgerClient,
    context::DeploymentContext,
    ledger::DeploymentLedger,
    resolver,
    types::{DeploymentStrategy, StalePolicy},
    Deployer,
};
use itertools::Itertools;
use tracing::info;

use crate::{
    cli::{MaterializeArgs, ResolveArgs, WireArgs},
    client::AlloyClient,
    errors::ScriptError,
    upgrades::AlloyUpgradeManager,
    utils::{decode_address, getter_calldata, parse_hex_bytes, setter_calldata, AddressValue},
};

/// The deployer the scripts run
pub type ScriptDeployer = Deployer<AlloyClient, AlloyUpgradeManager>;

/// Resolve the kind of a resource and deploy it unless it is recorded
pub async fn materialize(
    args: &MaterializeArgs,
    deployer: ScriptDeployer,
) -> Result<(), ScriptError> {
    let kind_name = deployer.resolve_kind(&args.kind)?;
    let ctor_args = args.args.as_deref().map(parse_hex_bytes).transpose()?.unwrap_or_default();
    let strategy = if args.upgradeable {
        DeploymentStrategy::Upgradeable
    } else {
        DeploymentStrategy::Plain
    };

    let deployer = if args.strict {
        deployer.with_stale_policy(StalePolicy::Deny)
    } else {
        deployer
    };

    info!(
        context = %deployer.context(),
        resource = %args.name,
        kind = kind_name,
        "materializing"
    );
    let handle = deployer
        .materialize_if_needed(&args.name, kind_name, ctor_args, strategy)
        .await?;

    println!("{} deployed at {:#x}", handle.resource_name, handle.address);
    if let Some(implementation) = handle.implementation {
        println!("\timplementation: {implementation:#x}");
    }

    Ok(())
}

/// Point an address-valued setting of a recorded resource at the desired
/// value, unless it already points there
pub async fn wire(args: &WireArgs, deployer: &ScriptDeployer) -> Result<(), ScriptError> {
    let target = recorded_address(deployer, &args.resource).await?;
    let value = match args.value.parse::<AddressValue>()? {
        AddressValue::Literal(address) => address,
        AddressValue::Resource(name) => recorded_address(deployer, &name).await?,
    };

    let getter = getter_calldata(&args.getter);
    let setter = setter_calldata(&args.setter, value);
    let client = deployer.client();

    let status = deployer
        .apply_if_needed(
            &args.label,
            move || {
                let getter = getter.clone();
                async move {
                    let current = client.call(target, getter).await?;
                    Ok(decode_address(&current)? == value)
                }
            },
            move || async move {
                client.send(target, setter).await?;
                Ok(())
            },
        )
        .await?;

    println!("{}: {status}", args.label);
    Ok(())
}

/// Print the records of the context's partition
pub async fn show(ctx: &DeploymentContext, ledger: &DeploymentLedger) -> Result<(), ScriptError> {
    let records = ledger.records(&ctx.ledger_key()).await?;
    if records.is_empty() {
        println!("no deployments recorded for {ctx}");
        return Ok(());
    }

    let lines = records
        .iter()
        .map(|(name, record)| match record.implementation {
            Some(implementation) => format!(
                "{name}: {} at {:#x} (implementation {implementation:#x})",
                record.kind, record.address
            ),
            None => format!("{name}: {} at {:#x}", record.kind, record.address),
        })
        .join("\n");

    println!("{lines}");
    Ok(())
}

/// Print the concrete kind of a logical resource
pub fn resolve(ctx: &DeploymentContext, args: &ResolveArgs) -> Result<(), ScriptError> {
    let kind_name = resolver::resolve_kind(ctx, &args.kind)?;
    println!("{kind_name}");
    Ok(())
}

// -----------
// | Helpers |
// -----------

/// The address of a resource recorded in the deployer's partition
async fn recorded_address(
    deployer: &ScriptDeployer,
    resource_name: &str,
) -> Result<Address, ScriptError> {
    deployer
        .lookup(resource_name)
        .await?
        .map(|handle| handle.address)
        .ok_or_else(|| ScriptError::UnknownResource(resource_name.to_string()))
}
