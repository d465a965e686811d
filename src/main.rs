use anyhow::Result;

mod cli;
mod config;
mod figures;
mod filters;
mod io;
mod mesh;
mod render;

use cli::get_args;
use config::FigureConfig;
use figures::Project;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Configuration
    let args = get_args();
    let config = FigureConfig::load(args.config.as_deref())?;
    let jobs = args.threads();
    let project = Project::new(&args.root, args.format);

    println!("\nFigure Configuration:");
    println!("  Project root: {:?}", args.root);
    println!("  Cases: {}", config.cases.join(", "));
    println!("  Format: {}", args.format.extension());
    println!("  Threads: {}", jobs);

    figures::run(args.command, &project, &config, jobs)?;

    println!("\n{:?} complete.", args.command);
    Ok(())
}
