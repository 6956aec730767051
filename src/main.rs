use chrome_verify::browser::Browser;
use chrome_verify::commands::TypeOptions;
use chrome_verify::condition;
use chrome_verify::config::VerifyConfig;
use chrome_verify::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Retrying assertions and paced typing against a running Chrome
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Chrome DevTools host
    #[arg(long, default_value = "localhost")]
    chrome_host: String,

    /// Chrome DevTools port
    #[arg(long, default_value_t = 9222)]
    chrome_port: u16,

    /// Tab to attach to (defaults to the first debuggable tab)
    #[arg(long)]
    tab: Option<String>,

    /// JSON file with assertion timing
    #[arg(long)]
    config: Option<PathBuf>,

    /// Assertion timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Pause between assertion attempts in milliseconds
    #[arg(long)]
    polling_interval_ms: Option<u64>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assert that every element matching a selector has the given attribute values
    Attributes {
        /// CSS selector of the collection
        selector: String,

        /// Attribute name
        attribute: String,

        /// Expected values, one per element, in document order
        #[arg(required = true)]
        values: Vec<String>,

        /// Explanation shown when the assertion fails
        #[arg(long)]
        because: Option<String>,
    },

    /// Type text into the first element matching a selector
    Type {
        /// CSS selector of the input
        selector: String,

        /// Text to type
        text: String,

        /// Pause after each character in milliseconds
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,

        /// Append to the current content instead of clearing it first
        #[arg(long)]
        no_clear: bool,
    },
}

impl Args {
    fn verify_config(&self) -> Result<VerifyConfig> {
        let mut config = match &self.config {
            Some(path) => VerifyConfig::from_file(path)?,
            None => VerifyConfig::default(),
        };
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if let Some(polling_interval_ms) = self.polling_interval_ms {
            config.polling_interval_ms = polling_interval_ms;
        }
        Ok(config)
    }
}

async fn run(args: &Args) -> Result<()> {
    let config = args.verify_config()?;
    let browser = Browser::connect(&args.chrome_host, args.chrome_port, args.tab.as_deref(), config).await?;

    match &args.command {
        Command::Attributes {
            selector,
            attribute,
            values,
            because,
        } => {
            let mut condition = condition::attributes(attribute.as_str(), values.iter().cloned())?;
            if let Some(reason) = because {
                condition = condition.because(reason.as_str());
            }
            browser.elements(selector).should_have(&condition).await?;
            info!("{} has {}", selector, condition);
        }
        Command::Type {
            selector,
            text,
            delay_ms,
            no_clear,
        } => {
            let options = TypeOptions::text(text.as_str())
                .with_delay(Duration::from_millis(*delay_ms))
                .clear_first(!no_clear);
            browser.element(selector).type_text(options).await?;
            info!("Typed into {}", selector);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr) // stdout carries the failure report
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(false)
                .compact(),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    if let Err(e) = run(&args).await {
        error!("{}", e);
        println!("{}", serde_json::to_string_pretty(&e.report())?);
        std::process::exit(1);
    }

    Ok(())
}
