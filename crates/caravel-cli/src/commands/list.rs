use super::{json_pretty, EXIT_SUCCESS};
use caravel_store::Store;

pub fn run(store: &dyn Store, json: bool) -> Result<u8, String> {
    let apps = store.list_apps().map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&apps)?);
    } else if apps.is_empty() {
        println!("no applications registered");
    } else {
        println!("{:<24} {:<20} {:<10} CLUSTERS", "SLUG", "NAME", "POLICY");
        for app in &apps {
            let name = app.name.as_deref().unwrap_or("");
            let clusters: Vec<&str> = app
                .downstreams
                .iter()
                .map(|d| d.cluster_id.as_str())
                .collect();
            println!(
                "{:<24} {:<20} {:<10} {}",
                app.slug,
                name,
                app.auto_deploy.to_string(),
                clusters.join(",")
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
