//! The deployment context a script runs in: which network, which market

use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::{
    constants::{DEFAULT_MARKET, LEDGER_EXTENSION},
    errors::ConfigError,
};

/// The networks deployments can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    /// Ethereum mainnet
    Ethereum,
    /// Fantom opera
    Fantom,
    /// BNB smart chain
    Bsc,
    /// Polygon PoS
    Polygon,
    /// Arbitrum one
    Arbitrum,
    /// Optimism
    Optimism,
    /// A local devnet node
    Local,
}

impl Network {
    /// All networks, in a fixed order
    pub const ALL: [Network; 7] = [
        Network::Ethereum,
        Network::Fantom,
        Network::Bsc,
        Network::Polygon,
        Network::Arbitrum,
        Network::Optimism,
        Network::Local,
    ];

    /// The identifier of the network, used in ledger paths and on the CLI
    pub fn id(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Fantom => "fantom",
            Network::Bsc => "bsc",
            Network::Polygon => "polygon",
            Network::Arbitrum => "arbitrum",
            Network::Optimism => "optimism",
            Network::Local => "local",
        }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::ALL
            .into_iter()
            .find(|network| network.id() == s)
            .ok_or_else(|| ConfigError::UnknownNetwork(s.to_string()))
    }
}

/// An operator-chosen partition separating otherwise-identical deployments
/// on the same network
///
/// Markets are validated against the network by the
/// [`resolver`](crate::resolver) when a context is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Market(String);

impl Market {
    /// Create a market from its name
    pub fn new(name: impl Into<String>) -> Self {
        Market(name.into())
    }

    /// The name of the market
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Market {
    fn default() -> Self {
        Market::new(DEFAULT_MARKET)
    }
}

impl Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The network and market every materialization and reconciliation call
/// runs against
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeploymentContext {
    /// The target network
    network: Network,
    /// The target market
    market: Market,
}

impl DeploymentContext {
    /// Build a context, failing if the market is not deployed on the network
    pub fn new(network: Network, market: Market) -> Result<Self, ConfigError> {
        crate::resolver::check_market(network, &market)?;
        Ok(Self { network, market })
    }

    /// Parse a context from the network and market names given by an operator
    pub fn parse(network: &str, market: &str) -> Result<Self, ConfigError> {
        Self::new(network.parse()?, Market::new(market))
    }

    /// The target network
    pub fn network(&self) -> Network {
        self.network
    }

    /// The target market
    pub fn market(&self) -> &Market {
        &self.market
    }

    /// The ledger partition this context reads and writes
    pub fn ledger_key(&self) -> LedgerKey {
        LedgerKey {
            network_id: self.network.id().to_string(),
            namespace: self.market.as_str().to_string(),
        }
    }
}

impl Display for DeploymentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.market)
    }
}

/// The key of a ledger partition
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LedgerKey {
    /// The network identifier
    pub network_id: String,
    /// The market the partition belongs to
    pub namespace: String,
}

impl LedgerKey {
    /// The path of the partition file under the given ledger root
    pub fn path_under(&self, root: &Path) -> PathBuf {
        root.join(&self.network_id)
            .join(format!("{}.{LEDGER_EXTENSION}", self.namespace))
    }
}
