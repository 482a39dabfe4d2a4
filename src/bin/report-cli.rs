use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "report-cli")]
#[command(about = "Command-line client for the stock report proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check proxy status and which providers are configured
    Health,
    /// Search ticker symbols by keyword
    Search { keyword: String },
    /// Latest quote for a ticker
    Quote { ticker: String },
    /// Company overview for a ticker
    Overview { ticker: String },
    /// Consolidated report (quote, overview, income statement, earnings)
    Report { ticker: String },
    /// Generate analytical report sections from a prompt
    Generate { prompt: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
        Commands::Search { keyword } => {
            client.get(format!("{}/api/alpha-vantage/search/{}", base, keyword)).send().await?
        }
        Commands::Quote { ticker } => {
            client.get(format!("{}/api/alpha-vantage/global-quote/{}", base, ticker)).send().await?
        }
        Commands::Overview { ticker } => {
            client.get(format!("{}/api/alpha-vantage/overview/{}", base, ticker)).send().await?
        }
        Commands::Report { ticker } => {
            client.get(format!("{}/api/alpha-vantage/full-report/{}", base, ticker)).send().await?
        }
        Commands::Generate { prompt } => {
            client
                .post(format!("{}/api/gemini/generate-report-sections", base))
                .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: proxy returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let mut json: Value = res.json().await?;
    // Generated sections arrive as JSON text; show them as JSON.
    let sections = json
        .get("generated_content")
        .and_then(Value::as_str)
        .and_then(|text| serde_json::from_str::<Value>(text).ok());
    if let Some(sections) = sections {
        json["generated_content"] = sections;
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
