use super::{json_pretty, EXIT_NOT_FOUND, EXIT_SUCCESS};
use caravel_schema::AppSlug;
use caravel_store::Store;
use serde::Serialize;

#[derive(Serialize)]
struct StatusOutput {
    slug: String,
    cluster: String,
    sequence: u64,
    status: String,
    classification: &'static str,
}

pub fn run(store: &dyn Store, slug: &str, sequence: u64, json: bool) -> Result<u8, String> {
    let app = match store.get_app_by_slug(&AppSlug::new(slug)) {
        Ok(app) => app,
        Err(e) if e.is_not_found() => {
            eprintln!("error: {e}");
            return Ok(EXIT_NOT_FOUND);
        }
        Err(e) => return Err(e.to_string()),
    };

    let Some(target) = app.downstreams.first() else {
        eprintln!("error: application {slug} has no downstream cluster");
        return Ok(EXIT_NOT_FOUND);
    };

    let status = store
        .get_deploy_status(&app.app_id, &target.cluster_id, sequence)
        .map_err(|e| e.to_string())?;
    let history = store
        .get_version_history(&app.app_id, &target.cluster_id)
        .map_err(|e| e.to_string())?;
    let classification = if history.is_past(sequence) {
        "past"
    } else {
        "current/future"
    };

    if json {
        println!(
            "{}",
            json_pretty(&StatusOutput {
                slug: slug.to_owned(),
                cluster: target.cluster_id.to_string(),
                sequence,
                status: status.to_string(),
                classification,
            })?
        );
    } else {
        println!(
            "{slug} sequence {sequence} on {}: {status} ({classification})",
            target.cluster_id
        );
    }
    Ok(EXIT_SUCCESS)
}
