// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command-line configuration for the operator process.
//!
//! The management cluster flags identify the cluster whose cloud account hosts
//! every bucket; they are resolved into a cloud context on each reconciliation.

use crate::constants::{PROVIDER_CAPA, PROVIDER_CAPZ};
use crate::errors::{Error, Result};
use clap::Parser;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Object storage operator command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "object-storage-operator", version, about)]
pub struct OperatorArgs {
    /// Address the metrics endpoint binds to
    #[arg(long, env = "METRICS_BIND_ADDRESS", default_value = "0.0.0.0:8080")]
    pub metrics_bind_address: SocketAddr,

    /// Address the health probe endpoint binds to
    #[arg(long, env = "HEALTH_PROBE_BIND_ADDRESS", default_value = "0.0.0.0:8081")]
    pub health_probe_bind_address: SocketAddr,

    /// Enable leader election, ensuring only one active controller
    #[arg(long, env = "LEADER_ELECT", default_value_t = false)]
    pub leader_elect: bool,

    /// Name of the leader election lease
    #[arg(long, default_value = "object-storage-operator-leader")]
    pub lease_name: String,

    /// Namespace of the leader election lease
    #[arg(long, env = "POD_NAMESPACE", default_value = "default")]
    pub lease_namespace: String,

    /// Base domain of the management cluster
    #[arg(long)]
    pub management_cluster_base_domain: String,

    /// Name of the management cluster
    #[arg(long)]
    pub management_cluster_name: String,

    /// Namespace holding the management cluster infrastructure records
    #[arg(long)]
    pub management_cluster_namespace: String,

    /// Cluster API provider of the management cluster (capa or capz)
    #[arg(long)]
    pub management_cluster_provider: String,

    /// Cloud region of the management cluster
    #[arg(long)]
    pub management_cluster_region: String,
}

/// Cloud provider hosting the management cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Cluster API Provider AWS
    Aws,
    /// Cluster API Provider Azure
    Azure,
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            PROVIDER_CAPA => Ok(Self::Aws),
            PROVIDER_CAPZ => Ok(Self::Azure),
            other => Err(Error::UnsupportedProvider(other.to_string())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Aws => "aws",
            Self::Azure => "azure",
        })
    }
}

/// The management cluster that owns the cloud account buckets live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementCluster {
    /// Cluster name
    pub name: String,
    /// Namespace of the cluster's infrastructure records
    pub namespace: String,
    /// Base domain, used to derive the OIDC issuer
    pub base_domain: String,
    /// Cloud provider
    pub provider: Provider,
    /// Cloud region
    pub region: String,
}

impl TryFrom<&OperatorArgs> for ManagementCluster {
    type Error = Error;

    fn try_from(args: &OperatorArgs) -> Result<Self> {
        Ok(Self {
            name: args.management_cluster_name.clone(),
            namespace: args.management_cluster_namespace.clone(),
            base_domain: args.management_cluster_base_domain.clone(),
            provider: args.management_cluster_provider.parse()?,
            region: args.management_cluster_region.clone(),
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
