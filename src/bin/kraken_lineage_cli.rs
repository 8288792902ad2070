use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::process;

use kraken_lineage::{run_with_progress, Cli, PipelineError, RunConfig, Stage};

fn spinner(color: &str, msg: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template(&format!("{{spinner:.{color}}} {{msg}}"))
            .expect("Invalid spinner template"),
    );
    spinner.set_message(msg);
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

fn execute(config: &RunConfig) -> Result<(), PipelineError> {
    let mut sp: Option<ProgressBar> = None;

    run_with_progress(config, |stage| match stage {
        Stage::Reading => sp = Some(spinner("blue", "Reading Kraken report...")),
        Stage::Resolving => sp = Some(spinner("green", "Resolving lineages...")),
        Stage::Writing => sp = Some(spinner("yellow", "Writing output files...")),
        Stage::Read { rows } => finish(&mut sp, format!("Read {rows} report rows.")),
        Stage::Resolved { stats } => finish(
            &mut sp,
            format!(
                "Resolved {} of {} taxids.",
                stats.distinct_tax_ids - stats.unresolved_tax_ids,
                stats.distinct_tax_ids
            ),
        ),
        Stage::Written { paths } => finish(&mut sp, format!("Wrote {} files.", paths.len())),
    })
    .inspect_err(|_| {
        if let Some(bar) = sp.take() {
            bar.abandon();
        }
    })?;

    println!("All outputs written to:\n  Directory: {}/", config.outdir.display());
    if let Some(xlsx) = &config.output.workbook {
        println!("  Excel file: {}", xlsx.display());
    }
    Ok(())
}

fn finish(sp: &mut Option<ProgressBar>, msg: String) {
    if let Some(bar) = sp.take() {
        bar.finish_with_message(msg);
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = cli.into_config().and_then(|config| execute(&config));

    if let Err(e) = result {
        log::error!("Run failed: {e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
