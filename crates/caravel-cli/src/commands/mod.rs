pub mod deploy;
pub mod intents;
pub mod list;
pub mod policy;
pub mod register;
pub mod status;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NOT_FOUND: u8 = 2;
pub const EXIT_STORE_ERROR: u8 = 3;
/// The trigger refused the request (pending config, no downstream).
pub const EXIT_BLOCKED: u8 = 4;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}
