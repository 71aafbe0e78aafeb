use super::{EXIT_NOT_FOUND, EXIT_SUCCESS};
use caravel_core::{UpdateChecker, UpdateScheduler};
use caravel_schema::{AppSlug, AutoDeployPolicy};
use caravel_store::Store;
use tracing::warn;

pub fn run(
    store: &dyn Store,
    checker: &UpdateChecker,
    slug: &str,
    policy: AutoDeployPolicy,
) -> Result<u8, String> {
    let app = match store.get_app_by_slug(&AppSlug::new(slug)) {
        Ok(app) => app,
        Err(e) if e.is_not_found() => {
            eprintln!("error: {e}");
            return Ok(EXIT_NOT_FOUND);
        }
        Err(e) => return Err(e.to_string()),
    };

    store
        .set_auto_deploy_policy(&app.app_id, policy)
        .map_err(|e| e.to_string())?;

    // Re-arm the update checker so the new policy takes effect now. A
    // failure here only delays pickup until the next restart.
    if let Err(e) = checker.reconfigure(&app.app_id) {
        warn!("failed to reconfigure update checker: {e}");
    }

    println!("auto-deploy for {slug}: {policy}");
    Ok(EXIT_SUCCESS)
}
