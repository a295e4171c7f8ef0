use color_eyre::eyre::{
    Result,
    eyre,
};
use dragonkeep::{
    chain::{
        Address,
        Session,
        fake::FakeChain,
        gateway::{
            GatewayChain,
            GatewayClient,
        },
    },
    client,
    deployment::{
        self,
        DeploymentEnv,
        DeploymentStore,
    },
    wallets,
};
use std::sync::OnceLock;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: dragonkeep [--demo] [--dev | --test | --local] [--gateway-url <url>]\n\
         [--wallet <name>] [--wallet-dir <path>] [--address <0x..>]\n\
         \n\
         Flags:\n\
           --demo              Run against an in-process fake chain\n\
           --dev               Use the devnet deployment record\n\
           --test              Use the testnet deployment record\n\
           --local             Use the local deployment record (default)\n\
           --gateway-url <url> Override the gateway URL from the record\n\
           --wallet <name>     Keystore to unlock for the player account\n\
           --wallet-dir <path> Override the keystore directory\n\
                               (defaults to ~/.dragonkeep/wallets)\n\
           --address <0x..>    Watch with a bare address, no keystore",
    );
    std::process::exit(0);
}

struct CliArgs {
    demo: bool,
    env: Option<DeploymentEnv>,
    gateway_url: Option<String>,
    wallet: Option<String>,
    wallet_dir: Option<String>,
    address: Option<String>,
}

fn parse_cli_args() -> Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut parsed = CliArgs {
        demo: false,
        env: None,
        gateway_url: None,
        wallet: None,
        wallet_dir: None,
        address: None,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--demo" => parsed.demo = true,
            "--dev" | "--test" | "--local" => {
                if parsed.env.is_some() {
                    return Err(eyre!(
                        "Multiple environment flags provided; choose one of --dev/--test/--local"
                    ));
                }
                parsed.env = Some(match arg.as_str() {
                    "--dev" => DeploymentEnv::Dev,
                    "--test" => DeploymentEnv::Test,
                    _ => DeploymentEnv::Local,
                });
            }
            "--gateway-url" => {
                let url = args
                    .next()
                    .ok_or_else(|| eyre!("--gateway-url requires a URL argument"))?;
                if parsed.gateway_url.is_some() {
                    return Err(eyre!("--gateway-url may only be specified once"));
                }
                parsed.gateway_url = Some(url);
            }
            "--wallet" => {
                let name = args
                    .next()
                    .ok_or_else(|| eyre!("--wallet requires a wallet name"))?;
                if parsed.wallet.is_some() {
                    return Err(eyre!("--wallet may only be specified once"));
                }
                parsed.wallet = Some(name);
            }
            "--wallet-dir" => {
                let dir = args
                    .next()
                    .ok_or_else(|| eyre!("--wallet-dir requires a path argument"))?;
                if parsed.wallet_dir.is_some() {
                    return Err(eyre!("--wallet-dir may only be specified once"));
                }
                parsed.wallet_dir = Some(dir);
            }
            "--address" => {
                let address = args
                    .next()
                    .ok_or_else(|| eyre!("--address requires an address argument"))?;
                if parsed.address.is_some() {
                    return Err(eyre!("--address may only be specified once"));
                }
                parsed.address = Some(address);
            }
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    Ok(parsed)
}

fn init_tracing() {
    // stdout belongs to the TUI; logs go to a rolling file
    let file = rolling::daily("logs", "dragonkeep.log");
    let (writer, guard) = tracing_appender::non_blocking(file);
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    let _ = LOG_GUARD.set(guard);
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    tracing::info!("starting dragonkeep client");
    color_eyre::install()?;
    deployment::ensure_structure()?;
    let args = parse_cli_args()?;

    if args.demo {
        let session =
            Session::connect(FakeChain::demo(), FakeChain::demo_player()).await?;
        return client::run_app(session).await;
    }

    let env = args.env.unwrap_or(DeploymentEnv::Local);
    let store = DeploymentStore::new(env)?;
    let record = store.load()?.ok_or_else(|| {
        eyre!(
            "No deployment record for {env}; write one to {} first",
            store.path().display()
        )
    })?;
    let gateway_url = args.gateway_url.unwrap_or(record.gateway_url);

    let address: Address = match (&args.address, &args.wallet) {
        (Some(raw), _) => raw.parse()?,
        (None, Some(name)) => {
            let dir = wallets::resolve_keystore_dir(args.wallet_dir.as_deref())?;
            let entry = wallets::find_keystore(&dir, name)?;
            wallets::unlock(&entry)?
        }
        (None, None) => {
            return Err(eyre!(
                "Specify --wallet <name> or --address <0x..> to pick the player account"
            ));
        }
    };

    let gateway = GatewayClient::new(gateway_url)?;
    let chain = GatewayChain::new(gateway, record.dragons);
    let session = Session::connect(chain, address).await?;
    client::run_app(session).await
}
