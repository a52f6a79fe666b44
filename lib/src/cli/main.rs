// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Command line utility for interacting with the Ledger Mavryk Baking App

use clap::Parser;
use log::{debug, info, LevelFilter};

use ledger_mavryk::{
    apdu::{hwm::Hwm, path::BipPath, scheme::SigScheme},
    keys::Signature,
    TcpClient, TcpOptions,
};

mod helpers;
use helpers::*;

/// Ledger command line utility
#[derive(Clone, PartialEq, Debug, Parser)]
struct Options {
    /// Speculos APDU socket
    #[clap(flatten)]
    tcp: TcpOptions,

    /// Subcommand to execute
    #[clap(subcommand)]
    cmd: Actions,

    /// Enable verbose logging
    #[clap(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: LevelFilter,
}

/// Key selection arguments
#[derive(Clone, PartialEq, Debug, Parser)]
struct KeyArgs {
    /// BIP32 derivation path
    #[clap(long, default_value = "m/44'/1969'/0'/0'")]
    path: BipPath,

    /// Signature scheme
    #[clap(long, default_value = "ED25519")]
    scheme: SigScheme,
}

#[derive(Clone, PartialEq, Debug, Parser)]
#[non_exhaustive]
enum Actions {
    /// Fetch application version
    Version,

    /// Fetch application git commit
    Git,

    /// Fetch a public key
    PublicKey {
        #[clap(flatten)]
        key: KeyArgs,

        /// Display the key on the device for confirmation
        #[clap(long)]
        prompt: bool,
    },

    /// Authorize a baking key
    Authorize {
        #[clap(flatten)]
        key: KeyArgs,
    },

    /// Remove the authorized baking key
    Deauthorize,

    /// Fetch the authorized baking key
    AuthKey,

    /// Fetch high watermarks and main chain id
    Hwm,

    /// Reset high watermarks
    Reset {
        /// Level to reset to
        #[clap(long)]
        level: u32,
    },

    /// Setup chain, watermarks and baking key
    Setup {
        #[clap(flatten)]
        key: KeyArgs,

        /// Main chain id
        #[clap(long, default_value = "NetXdQprcVkpaWU")]
        chain_id: String,

        #[clap(long, default_value = "0")]
        main_level: u32,

        #[clap(long, default_value = "0")]
        main_round: u32,

        #[clap(long, default_value = "0")]
        test_level: u32,

        #[clap(long, default_value = "0")]
        test_round: u32,
    },

    /// Sign a hex encoded message
    Sign {
        #[clap(flatten)]
        key: KeyArgs,

        /// Hex encoded message
        message: HexData,

        /// Also fetch the message hash
        #[clap(long)]
        with_hash: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Options::parse();

    // Setup logging
    simplelog::SimpleLogger::init(args.log_level, simplelog::Config::default())?;

    debug!("Connecting to {:?}", args.tcp);

    // Connect to device
    let c = TcpClient::connect(args.tcp.clone()).await?;

    // Execute command
    execute(c, args.cmd).await
}

/// Execute a command with the provided client
async fn execute(c: TcpClient, cmd: Actions) -> anyhow::Result<()> {
    debug!("Executing command: {:?}", cmd);

    match cmd {
        Actions::Version => {
            let v = c.version().await?;
            info!("version: {} (class: {:?})", v, v.app_class());
        }
        Actions::Git => {
            info!("commit: {}", c.git().await?);
        }
        Actions::PublicKey { key, prompt } => {
            let k = (key.path, key.scheme);
            let pk = match prompt {
                true => c.get_public_key_prompt(&k).await?,
                false => c.get_public_key_silent(&k).await?,
            };

            info!("public key: {}", pk);
            info!("address:    {}", pk.address());
        }
        Actions::Authorize { key } => {
            let k = (key.path, key.scheme);
            let r = c.authorize_baking(Some(&k)).await?;

            info!("authorized: {}", hex::encode(r));
        }
        Actions::Deauthorize => {
            c.deauthorize().await?;
            info!("deauthorized");
        }
        Actions::AuthKey => {
            let (scheme, path) = c.get_auth_key_with_curve().await?;
            info!("authorized key: {} ({})", path, scheme);
        }
        Actions::Hwm => {
            let (chain_id, main, test) = c.get_all_hwm().await?;

            info!("chain id: {}", chain_id);
            info!("main hwm: {:?}", main);
            info!("test hwm: {:?}", test);
        }
        Actions::Reset { level } => {
            c.reset_app_context(level).await?;
            info!("reset to level {}", level);
        }
        Actions::Setup {
            key,
            chain_id,
            main_level,
            main_round,
            test_level,
            test_round,
        } => {
            let k = (key.path, key.scheme);
            let pk = c
                .setup_app_context(
                    &k,
                    &chain_id,
                    &Hwm::new(main_level, main_round),
                    &Hwm::new(test_level, test_round),
                )
                .await?;

            info!("setup complete, baking key: {}", pk);
        }
        Actions::Sign {
            key,
            message,
            with_hash,
        } => {
            let scheme = key.scheme;
            let k = (key.path, key.scheme);

            let sig = match with_hash {
                true => {
                    let (h, s) = c.sign_message_with_hash(&k, message.as_ref()).await?;
                    info!("hash: {}", hex::encode(h));
                    s
                }
                false => c.sign_message(&k, message.as_ref()).await?,
            };

            info!("signature: {}", Signature::from_bytes(&sig, scheme)?);
        }
    }

    Ok(())
}
