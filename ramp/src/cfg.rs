use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::primitives::{Address, address};
use anyhow::{Context, Result, anyhow};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{digest::TransmitDomain, proxy::Genesis};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The chain this bridge instance is deployed on.
    #[serde(default = "chain_id_default")]
    pub chain_id: u64,
    /// The address of the bridge. Oracle signatures are bound to it.
    #[serde(default = "ramp_address_default")]
    pub ramp_address: Address,
    /// The account allowed to administer the bridge.
    pub owner: Address,
    /// Where the first logic module is deployed.
    #[serde(default = "implementation_address_default")]
    pub implementation_address: Address,
    /// The initial oracle committee.
    pub oracle_nodes: Vec<Address>,
    /// Accounts allowed to send requests from the start.
    #[serde(default)]
    pub ramp_senders: Vec<Address>,
    #[serde(default)]
    pub chain_whitelist: Vec<ChainPair>,
    #[serde(default)]
    pub domain: DomainConfig,
    /// Further logic modules deployed on the chain, which the bridge can be upgraded to.
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
    /// Directory for the bridge database. If not set, state is kept in memory and lost on exit.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainPair {
    pub source_chain_id: u64,
    pub target_chain_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    pub address: Address,
    #[serde(default)]
    pub domain: DomainConfig,
}

/// The EIP-712 domain oracle nodes sign under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainConfig {
    #[serde(default = "domain_name_default")]
    pub name: String,
    #[serde(default = "domain_version_default")]
    pub version: String,
}

impl Default for DomainConfig {
    fn default() -> Self {
        DomainConfig {
            name: domain_name_default(),
            version: domain_version_default(),
        }
    }
}

pub fn chain_id_default() -> u64 {
    31337
}

pub fn ramp_address_default() -> Address {
    address!("0xe7f1725e7734ce288f8367e1bb143e90bb3f0512")
}

pub fn implementation_address_default() -> Address {
    address!("0x5fbdb2315678afecb367f032d93f642f64180aa3")
}

pub fn domain_name_default() -> String {
    "Ramp".to_owned()
}

pub fn domain_version_default() -> String {
    "1".to_owned()
}

impl Config {
    /// Reads and merges the given TOML files. A top-level key may only be set by one file.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Config> {
        let mut merged = toml::Table::new();
        for path in paths {
            let path = path.as_ref();
            let contents =
                fs::read_to_string(path).with_context(|| format!("Unable to read {path:?}"))?;
            let table: toml::Table =
                toml::from_str(&contents).with_context(|| format!("Unable to parse {path:?}"))?;
            for key in table.keys() {
                if merged.contains_key(key) {
                    return Err(anyhow!(
                        "configuration conflict: {path:?} contained a key {key:?} that was already included in an earlier file"
                    ));
                }
            }
            merged.extend(table);
        }

        let config = Config::deserialize(toml::Value::Table(merged))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.owner.is_zero() {
            return Err(anyhow!("owner must not be the zero address"));
        }
        if self.oracle_nodes.is_empty() {
            return Err(anyhow!("at least one oracle node must be configured"));
        }
        if let Some(duplicate) = self.oracle_nodes.iter().duplicates().next() {
            return Err(anyhow!("oracle node {duplicate} is configured more than once"));
        }
        let code = self
            .modules
            .iter()
            .map(|m| m.address)
            .chain([self.ramp_address, self.implementation_address]);
        if let Some(duplicate) = code.duplicates().next() {
            return Err(anyhow!("address {duplicate} is configured for more than one contract"));
        }
        Ok(())
    }

    pub fn genesis(&self) -> Genesis {
        Genesis {
            owner: self.owner,
            implementation: self.implementation_address,
            oracle_nodes: self.oracle_nodes.clone(),
            chain_whitelist: self
                .chain_whitelist
                .iter()
                .map(|pair| (pair.source_chain_id, pair.target_chain_id))
                .collect(),
            ramp_senders: self.ramp_senders.clone(),
        }
    }

    /// The domain of the logic module deployed at `implementation`, if one is configured there.
    pub fn module_domain(&self, implementation: Address) -> Option<&DomainConfig> {
        if implementation == self.implementation_address {
            return Some(&self.domain);
        }
        self.modules
            .iter()
            .find(|m| m.address == implementation)
            .map(|m| &m.domain)
    }

    /// The domain reports must be signed under while `implementation` is active.
    pub fn transmit_domain(&self, implementation: Address) -> Option<TransmitDomain> {
        let domain = self.module_domain(implementation)?;
        Some(TransmitDomain {
            name: domain.name.clone(),
            version: domain.version.clone(),
            chain_id: self.chain_id,
            verifying_contract: self.ramp_address,
        })
    }
}
