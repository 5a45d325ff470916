use clap::Parser;
use gemini_stream::{generate, Client, Error, GenerateOptions, DEFAULT_MODEL};

/// Send a prompt to Gemini and print the answer as it streams in.
#[derive(Debug, Parser)]
#[command(name = "gemini-stream", version)]
struct Cli {
    /// Prompt text
    #[arg(short, long)]
    prompt: String,

    /// Model name
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Don't echo fragments as they arrive; print the full answer at the end
    #[arg(long)]
    no_stream: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // A missing .env is fine, the real environment still applies.
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let client = Client::from_env()?;
    let options = GenerateOptions::default()
        .model(cli.model)
        .echo(!cli.no_stream);

    let text = generate(&client, &cli.prompt, &options).await?;

    if cli.no_stream {
        println!("{text}");
    } else if !text.is_empty() {
        println!();
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
