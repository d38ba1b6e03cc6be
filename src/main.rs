//! smartvault 命令行入口
//!
//! 用法：
//!   smartvault [--config <path>] resolve <user_key> [--refresh]
//!   smartvault [--config <path>] clear <user_key>
//!   smartvault [--config <path>] invest <user_key> <basket> <amount>
//!   smartvault [--config <path>] confirm-swap <user_key> <amount> <tx_hash>

use anyhow::{Context, Result};
use smartvault::{
    config::Config,
    domain::TransactionId,
    infrastructure::logging,
    service::InvestmentSubmission,
    AppState,
};

#[derive(Debug)]
enum Command {
    Resolve { user_key: String, refresh: bool },
    Clear { user_key: String },
    Invest { submission: InvestmentSubmission },
    ConfirmSwap {
        user_key: String,
        amount: String,
        transaction_id: String,
    },
}

struct Args {
    config_path: Option<String>,
    command: Command,
}

fn usage() -> &'static str {
    "usage: smartvault [--config <path>] <resolve <user_key> [--refresh] | clear <user_key> | invest <user_key> <basket> <amount> | confirm-swap <user_key> <amount> <tx_hash>>"
}

fn parse_args() -> Result<Args> {
    let mut config_path = std::env::var("CONFIG_PATH").ok();
    let mut refresh = false;
    let mut positional = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config_path = Some(args.next().context("--config requires a path")?);
            }
            "--refresh" => refresh = true,
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let name = positional.next().context(usage())?;
    let mut next = |what: &str| {
        positional
            .next()
            .with_context(|| format!("missing <{}>\n{}", what, usage()))
    };

    let command = match name.as_str() {
        "resolve" => Command::Resolve {
            user_key: next("user_key")?,
            refresh,
        },
        "clear" => Command::Clear {
            user_key: next("user_key")?,
        },
        "invest" => Command::Invest {
            submission: InvestmentSubmission {
                user_key: next("user_key")?,
                basket: next("basket")?,
                amount: next("amount")?,
            },
        },
        "confirm-swap" => Command::ConfirmSwap {
            user_key: next("user_key")?,
            amount: next("amount")?,
            transaction_id: next("tx_hash")?,
        },
        other => anyhow::bail!("unknown command '{}'\n{}", other, usage()),
    };

    Ok(Args {
        config_path,
        command,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载环境变量
    dotenvy::dotenv().ok();

    let args = parse_args()?;

    // 2. 加载配置（配置文件优先）
    let config = Config::from_env_and_file(args.config_path.as_deref())?;

    // 3. 初始化日志
    if let Err(e) = logging::init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    // 4. 组装服务
    let state = AppState::from_config(config)?;

    let output = match args.command {
        Command::Resolve { user_key, refresh } => {
            let record = state.resolver.resolve(&user_key, refresh).await?;
            serde_json::to_string_pretty(&record)?
        }
        Command::Clear { user_key } => {
            state.resolver.clear(&user_key).await?;
            serde_json::json!({ "cleared": user_key }).to_string()
        }
        Command::Invest { submission } => {
            match state.investments.submit_funded_investment(&submission).await {
                Ok(receipt) => serde_json::to_string_pretty(&receipt)?,
                Err(e) => {
                    let failure = serde_json::json!({
                        "code": e.code().as_str(),
                        "message": e.to_string(),
                        "funds_moved": e.funds_moved(),
                        "transaction_id": e.transaction_id(),
                    });
                    println!("{}", serde_json::to_string_pretty(&failure)?);
                    anyhow::bail!(e);
                }
            }
        }
        Command::ConfirmSwap {
            user_key,
            amount,
            transaction_id,
        } => {
            let transaction_id =
                TransactionId::parse(&transaction_id).context("tx_hash must not be empty")?;
            let confirmation = state
                .orchestrator
                .confirm_swap(&user_key, &amount, &transaction_id)
                .await?;
            serde_json::to_string_pretty(&confirmation)?
        }
    };

    println!("{}", output);
    Ok(())
}
