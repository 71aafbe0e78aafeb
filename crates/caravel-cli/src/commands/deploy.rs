use super::{json_pretty, EXIT_BLOCKED, EXIT_NOT_FOUND, EXIT_STORE_ERROR, EXIT_SUCCESS};
use caravel_core::{Trigger, TriggerError};
use caravel_schema::{AppSlug, DeployOptions};
use serde::Serialize;

#[derive(Serialize)]
struct DeployOutput<'a> {
    slug: &'a str,
    sequence: u64,
    status: &'a str,
}

pub fn run(
    trigger: &Trigger,
    slug: &str,
    sequence: u64,
    options: DeployOptions,
    json: bool,
) -> Result<u8, String> {
    match trigger.deploy(&AppSlug::new(slug), sequence, options) {
        Ok(()) => {
            if json {
                println!(
                    "{}",
                    json_pretty(&DeployOutput {
                        slug,
                        sequence,
                        status: "triggered",
                    })?
                );
            } else {
                println!("deploy triggered: {slug} sequence {sequence}");
            }
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            let code = match e {
                TriggerError::AppNotFound(_) => EXIT_NOT_FOUND,
                TriggerError::PendingConfig { .. } | TriggerError::NoDownstream(_) => EXIT_BLOCKED,
                TriggerError::Lookup(_) | TriggerError::Mutation(_) | TriggerError::Deploy(_) => {
                    EXIT_STORE_ERROR
                }
            };
            eprintln!("error: {e}");
            Ok(code)
        }
    }
}
