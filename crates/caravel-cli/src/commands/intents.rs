use super::{json_pretty, EXIT_SUCCESS};
use caravel_store::IntentQueue;

pub fn run(queue: &IntentQueue, json: bool) -> Result<u8, String> {
    let intents = queue.pending().map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&intents)?);
    } else if intents.is_empty() {
        println!("no pending deploy intents");
    } else {
        println!("{:<24} {:<10} REQUESTED_AT", "APP_ID", "SEQUENCE");
        for intent in &intents {
            println!(
                "{:<24} {:<10} {}",
                intent.app_id, intent.sequence, intent.requested_at
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
