//! # CLI Interface
//!
//! `clap` derive definitions for the `pledge-node` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pledge_contracts::{CampaignId, Instruction};
use pledge_protocol::config::{DEFAULT_METRICS_PORT, DEFAULT_RPC_PORT, SLOT_TIME_MS};

use crate::logging::LogFormat;

/// Single-node crowdfunding ledger.
///
/// Runs time-bounded, all-or-nothing campaigns: contributions held in
/// custody until the deadline, then paid to the owner if the goal was met
/// or refunded to each contributor if it was not.
#[derive(Parser, Debug)]
#[command(
    name = "pledge-node",
    about = "All-or-nothing crowdfunding ledger node",
    version,
    propagate_version = true
)]
pub struct PledgeNodeCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node.
    Run(RunArgs),
    /// Create the data directory and generate a signing key.
    Init(InitArgs),
    /// Sign an instruction with a key file and print the call as JSON.
    Sign(SignArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Directory holding the ledger database and keys.
    #[arg(long, short = 'd', env = "PLEDGE_DATA_DIR", default_value = ".pledge")]
    pub data_dir: PathBuf,

    /// Port for the REST and WebSocket API.
    #[arg(long, env = "PLEDGE_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "PLEDGE_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Slot length in milliseconds.
    #[arg(long, env = "PLEDGE_SLOT_MS", default_value_t = SLOT_TIME_MS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub slot_ms: u64,

    #[arg(long, env = "PLEDGE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Turn off `POST /faucet`.
    #[arg(long, env = "PLEDGE_DISABLE_FAUCET")]
    pub disable_faucet: bool,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    #[arg(long, short = 'd', env = "PLEDGE_DATA_DIR", default_value = ".pledge")]
    pub data_dir: PathBuf,
}

#[derive(Parser, Debug)]
pub struct SignArgs {
    /// File holding a hex-encoded Ed25519 secret key.
    #[arg(long, short = 'k')]
    pub key: PathBuf,

    /// Caller's current nonce, as reported by `GET /accounts/:address`.
    #[arg(long, short = 'n')]
    pub nonce: u64,

    #[command(subcommand)]
    pub instruction: InstructionArgs,
}

#[derive(Subcommand, Debug)]
pub enum InstructionArgs {
    /// Open a campaign owned by the signer.
    Create {
        #[arg(long)]
        goal: u64,
        /// Slots until the deadline.
        #[arg(long)]
        duration: u64,
    },
    Contribute {
        #[arg(long)]
        campaign: CampaignId,
        #[arg(long)]
        amount: u64,
    },
    Withdraw {
        #[arg(long)]
        campaign: CampaignId,
    },
    Refund {
        #[arg(long)]
        campaign: CampaignId,
    },
    Finalize {
        #[arg(long)]
        campaign: CampaignId,
    },
}

impl From<InstructionArgs> for Instruction {
    fn from(args: InstructionArgs) -> Self {
        match args {
            InstructionArgs::Create { goal, duration } => Instruction::Create { goal, duration },
            InstructionArgs::Contribute { campaign, amount } => {
                Instruction::Contribute { campaign, amount }
            }
            InstructionArgs::Withdraw { campaign } => Instruction::Withdraw { campaign },
            InstructionArgs::Refund { campaign } => Instruction::Refund { campaign },
            InstructionArgs::Finalize { campaign } => Instruction::Finalize { campaign },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        PledgeNodeCli::command().debug_assert();
    }

    #[test]
    fn parses_sign_contribute() {
        let id = CampaignId::new();
        let cli = PledgeNodeCli::parse_from([
            "pledge-node",
            "sign",
            "--key",
            "k.hex",
            "--nonce",
            "2",
            "contribute",
            "--campaign",
            &id.to_string(),
            "--amount",
            "75",
        ]);
        let Commands::Sign(args) = cli.command else {
            panic!("expected sign");
        };
        assert_eq!(args.nonce, 2);
        assert_eq!(
            Instruction::from(args.instruction),
            Instruction::Contribute {
                campaign: id,
                amount: 75
            }
        );
    }
}
