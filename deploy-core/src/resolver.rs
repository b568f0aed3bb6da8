//! Maps logical resource names to the concrete kind deployed on each network,
//! and checks which markets each network carries

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use crate::{
    constants::{DEFAULT_MARKET, FUSE_MARKET},
    context::{DeploymentContext, Market, Network},
    errors::ConfigError,
};

/// The logical kinds of resource a deployment script works with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A borrowing vault
    Vault,
    /// The flash-close liquidator
    Fliquidator,
    /// The vault rebalancing controller
    Controller,
    /// The admin registry every resource points to
    Admin,
    /// The price oracle
    Oracle,
    /// The debt and collateral position token
    Erc1155,
    /// The flash loan router
    Flasher,
    /// The DEX swap router
    Swapper,
}

impl ResourceKind {
    /// All logical kinds, in a fixed order
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::Vault,
        ResourceKind::Fliquidator,
        ResourceKind::Controller,
        ResourceKind::Admin,
        ResourceKind::Oracle,
        ResourceKind::Erc1155,
        ResourceKind::Flasher,
        ResourceKind::Swapper,
    ];

    /// The logical name scripts refer to this kind by
    pub fn logical_name(&self) -> &'static str {
        match self {
            ResourceKind::Vault => "vault",
            ResourceKind::Fliquidator => "fliquidator",
            ResourceKind::Controller => "controller",
            ResourceKind::Admin => "admin",
            ResourceKind::Oracle => "oracle",
            ResourceKind::Erc1155 => "erc1155",
            ResourceKind::Flasher => "flasher",
            ResourceKind::Swapper => "swapper",
        }
    }

    /// The concrete kind deployed for this logical kind on `network`
    pub fn kind_name(&self, network: Network) -> &'static str {
        use Network::*;
        use ResourceKind::*;

        match (self, network) {
            (Vault, Fantom) => "FujiVaultFTM",
            (Vault, Bsc) => "FujiVaultBSC",
            (Vault, _) => "FujiVault",

            (Fliquidator, Fantom) => "FliquidatorFTM",
            (Fliquidator, Bsc) => "FliquidatorBSC",
            (Fliquidator, _) => "Fliquidator",

            (Flasher, Fantom) => "FlasherFTM",
            (Flasher, Bsc) => "FlasherBSC",
            (Flasher, _) => "Flasher",

            (Controller, _) => "Controller",
            (Admin, _) => "FujiAdmin",
            (Oracle, _) => "FujiOracle",
            (Erc1155, _) => "FujiERC1155",
            (Swapper, _) => "Swapper",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.logical_name())
    }
}

impl FromStr for ResourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.logical_name() == s)
            .ok_or_else(|| ConfigError::UnknownKind(s.to_string()))
    }
}

/// The markets deployed on `network`
pub fn markets(network: Network) -> &'static [&'static str] {
    match network {
        Network::Ethereum | Network::Local => &[DEFAULT_MARKET, FUSE_MARKET],
        Network::Fantom
        | Network::Bsc
        | Network::Polygon
        | Network::Arbitrum
        | Network::Optimism => &[DEFAULT_MARKET],
    }
}

/// Check that `market` is deployed on `network`
pub fn check_market(network: Network, market: &Market) -> Result<(), ConfigError> {
    if markets(network).contains(&market.as_str()) {
        Ok(())
    } else {
        Err(ConfigError::UnknownMarket {
            network: network.to_string(),
            market: market.to_string(),
        })
    }
}

/// Resolve the concrete kind name for a logical resource name in `ctx`
pub fn resolve_kind(ctx: &DeploymentContext, logical: &str) -> Result<&'static str, ConfigError> {
    let kind: ResourceKind = logical.parse()?;
    Ok(kind.kind_name(ctx.network()))
}
