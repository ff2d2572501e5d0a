use crate::cli::RunArgs;
use crate::config::PartialSettings;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use confmatch::{
    core::io::methods::MethodList, engine::progress::ProgressReporter, workflows,
    workflows::compare::ComparisonResult,
};
use tracing::{info, warn};

pub async fn run(args: RunArgs) -> Result<()> {
    let partial_settings = PartialSettings::load(args.config.as_deref())?;
    info!("Merging settings from file and CLI arguments...");
    let app_config = partial_settings.merge_with_cli(&args)?;

    info!("Reading method list from {:?}", &app_config.methods_path);
    let methods = MethodList::from_path(&app_config.methods_path)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Comparing {} method(s) against reference '{}' (RMSD cutoff {:.3} Å)...",
        methods.len(),
        methods.reference().label,
        app_config.compare.analysis.rmsd_cutoff
    );
    info!("Invoking the core comparison workflow...");

    let result = tokio::task::block_in_place(|| {
        workflows::compare::run(&methods, &app_config.compare, &reporter)
    })?;

    print_summary(&result, progress_handler.diagnostic_count());
    Ok(())
}

fn print_summary(result: &ComparisonResult, diagnostics_shown: usize) {
    if result.from_checkpoint {
        println!("Matched conformers restored from checkpoint.");
    }
    if result.state.is_empty() {
        warn!("Comparison completed but no molecules were analyzed.");
        println!("Warning: no molecules were analyzed.");
        return;
    }

    println!("Analyzed {} molecule(s).", result.state.len());
    if !result.skipped_single_conformer.is_empty() {
        println!(
            "Skipped {} single-conformer molecule(s).",
            result.skipped_single_conformer.len()
        );
    }
    if diagnostics_shown > 0 {
        println!("{} diagnostic(s) reported above.", diagnostics_shown);
    }

    let files = &result.files;
    if !files.reports.is_empty() {
        println!("✓ {} energy report(s) written.", files.reports.len());
    }
    if !files.plots.is_empty() {
        println!("✓ {} plot(s) written.", files.plots.len());
    }
    if let Some(summary) = &files.summary {
        println!("✓ Summary written to: {}", summary.display());
    }
}
