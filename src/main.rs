use clap::{Args, Parser, Subcommand};
use start_sdk::utils::logger;
use start_sdk::{
    Card, CardError, ChallengeSurface, ClientConfig, StartClient, TokenEngine, TokenOutcome,
    TokenParams,
};
use tokio::io::AsyncBufReadExt;

#[derive(Debug, Parser)]
#[command(name = "start-sdk")]
#[command(about = "Card validation and token issuance against the Start gateway")]
struct Cli {
    #[arg(long, help = "Enable verbose output")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate card fields and show the detected brand
    Validate(CardArgs),
    /// Issue a single-use token for a card
    Tokenize {
        #[command(flatten)]
        card: CardArgs,

        #[arg(long)]
        api_key: String,

        #[arg(long, default_value = start_sdk::config::DEFAULT_BASE_URL)]
        base_url: String,

        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        amount: Option<u64>,

        #[arg(long, requires = "amount")]
        currency: Option<String>,
    },
}

#[derive(Debug, Args)]
struct CardArgs {
    #[arg(long)]
    number: String,

    #[arg(long)]
    cvc: String,

    #[arg(long)]
    month: u32,

    #[arg(long)]
    year: i32,

    #[arg(long)]
    owner: String,
}

impl CardArgs {
    fn build(&self) -> Result<Card, CardError> {
        Card::new(&self.number, &self.cvc, self.month, self.year, &self.owner)
    }
}

/// Challenge surface for the terminal: prints the verification URL and
/// treats Enter as the user dismissing the page.
struct ConsoleSurface;

#[async_trait::async_trait]
impl ChallengeSurface for ConsoleSurface {
    async fn present(&self, url: &url::Url) {
        println!("🔐 Your bank requires additional verification.");
        println!("   Open this page in a browser: {}", url);
        println!("   Press Enter to abort while waiting for the result.");

        let mut line = String::new();
        let mut stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let _ = stdin.read_line(&mut line).await;
    }

    async fn close(&self) {
        println!("✅ Verification finished.");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    match cli.command {
        Command::Validate(args) => match args.build() {
            Ok(card) => {
                println!("✅ Card is valid");
                println!("   brand: {}", card.brand());
                println!("   bin: {}", card.bin());
                println!("   last digits: {}", card.last_digits());
            }
            Err(e) => {
                eprintln!("❌ {}", e);
                std::process::exit(1);
            }
        },
        Command::Tokenize {
            card,
            api_key,
            base_url,
            amount,
            currency,
        } => {
            let card = match card.build() {
                Ok(card) => card,
                Err(e) => {
                    eprintln!("❌ {}", e);
                    std::process::exit(1);
                }
            };

            let mut config = ClientConfig::new(&api_key);
            config.base_url = base_url;

            let client = StartClient::new(&config)?;
            let engine = TokenEngine::with_retry_policy(
                client,
                ConsoleSurface,
                config.max_request_attempts,
                config.retry_delay(),
            );

            let params = TokenParams {
                amount_in_cents: amount,
                currency,
            };

            tracing::info!(
                "requesting token for {} card ending in {}",
                card.brand(),
                card.last_digits()
            );
            match engine.issue_token(&card, params).await {
                Ok(TokenOutcome::Issued(token)) => {
                    println!("✅ Token issued: {}", token.id);
                }
                Ok(TokenOutcome::Cancelled) => {
                    println!("🚫 Verification cancelled, no token issued");
                    std::process::exit(2);
                }
                Err(e) => {
                    eprintln!("❌ Token issuance failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
