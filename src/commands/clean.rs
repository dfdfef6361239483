use crate::{CleanArgs, build::base_path_from_config, config::SiteConfig};

pub fn run(args: &CleanArgs) -> Result<(), anyhow::Error> {
    let config_path = SiteConfig::resolve_path(args.config_file.as_deref())?;
    let config = SiteConfig::load_from_file(&config_path)?;

    let base_path = base_path_from_config(&config_path);
    let site_path = if config.output.is_relative() {
        base_path.join(&config.output)
    } else {
        config.output.clone()
    };

    // The output dir must not contain the config
    if base_path.starts_with(&site_path) {
        anyhow::bail!(
            "refusing to delete {}: it contains the site configuration",
            site_path.display()
        );
    }

    if site_path.exists() {
        if args.dry_run {
            println!("Would delete {}", site_path.display());
        } else {
            std::fs::remove_dir_all(&site_path)?;
            println!("Deleted {}", site_path.display());
        }
    } else {
        tracing::debug!(path = %site_path.display(), "nothing to clean");
    }

    Ok(())
}
