use super::{json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use caravel_schema::{
    validate_slug, AppId, AppSlug, Application, AutoDeployPolicy, ClusterId, DownstreamCluster,
};
use caravel_store::Store;

pub fn run(
    store: &dyn Store,
    slug: &str,
    name: Option<&str>,
    clusters: &[String],
    json: bool,
) -> Result<u8, String> {
    if let Err(e) = validate_slug(slug) {
        eprintln!("error: {e}");
        return Ok(EXIT_FAILURE);
    }
    if store.get_app_by_slug(&AppSlug::new(slug)).is_ok() {
        eprintln!("error: application '{slug}' already exists");
        return Ok(EXIT_FAILURE);
    }

    let app = Application {
        app_id: AppId::new(format!("app-{slug}")),
        slug: AppSlug::new(slug),
        name: name.map(str::to_owned),
        auto_deploy: AutoDeployPolicy::Enabled,
        downstreams: clusters
            .iter()
            .map(|c| DownstreamCluster {
                cluster_id: ClusterId::new(c.as_str()),
                name: None,
            })
            .collect(),
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    store.put_app(&app).map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&app)?);
    } else {
        println!("registered application {slug} ({} clusters)", clusters.len());
    }
    Ok(EXIT_SUCCESS)
}
