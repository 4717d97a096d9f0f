use clap::Args;
use reflectin_core::reminder::DelayPolicy;
use reflectin_core::{Config, SentimentScore};
use serde::Serialize;

#[derive(Args)]
pub struct DelayArgs {
    /// Sentiment score of the reply; omit for "unknown"
    #[arg(long, allow_negative_numbers = true)]
    score: Option<f64>,
}

#[derive(Serialize)]
struct DelayReport {
    score: Option<f64>,
    tier: reflectin_core::DelayTier,
    delay_secs: u64,
}

/// Print the reminder delay the current config gives a score.
pub fn run(args: DelayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let policy = DelayPolicy::from_config(&config.reminder);
    let score = args.score.and_then(SentimentScore::new);
    let decision = policy.decide(score);

    let report = DelayReport {
        score: score.map(SentimentScore::value),
        tier: decision.tier,
        delay_secs: decision.delay.as_secs(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
