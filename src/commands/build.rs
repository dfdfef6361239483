use crate::{
    BuildArgs,
    build::{Builder, base_path_from_config},
    config::SiteConfig,
};

pub fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let config_path = SiteConfig::resolve_path(args.config_file.as_deref())?;
    let config = SiteConfig::load_from_file(&config_path)?;

    // Relative paths in the config resolve against its directory
    let base_path = base_path_from_config(&config_path);

    let report = Builder::new(config, base_path).build()?;

    let display_output = report
        .output_dir
        .canonicalize()
        .unwrap_or(report.output_dir.clone());
    println!(
        "Built site to {} ({} posts, {} pages, {} files written)",
        display_output.display(),
        report.posts,
        report.pages,
        report.written
    );

    if !report.issues.is_empty() {
        println!(
            "{} error(s), {} warning(s):",
            report.error_count(),
            report.warning_count()
        );
        for issue in &report.issues {
            println!("  {}", issue);
        }
    }

    if report.has_errors() {
        anyhow::bail!(
            "build finished with {} error(s); successful output was still written",
            report.error_count()
        );
    }

    Ok(())
}
