use crate::cli::CheckArgs;
use crate::error::{CliError, Result};
use confmatch::core::io::methods::MethodList;
use tracing::info;

/// Parses a method list and reports which structure files exist.
pub async fn run(args: CheckArgs) -> Result<()> {
    let content = std::fs::read_to_string(&args.input).map_err(|e| CliError::FileParsing {
        path: args.input.clone(),
        source: e.into(),
    })?;
    let methods = MethodList::parse(&content)?;
    info!("Method list parsed: {} method(s).", methods.len());

    for (i, method) in methods.methods().iter().enumerate() {
        let role = if i == 0 {
            "reference"
        } else if methods.is_self_reference(i) {
            "reference structures"
        } else {
            "own structures"
        };
        println!(
            "{:>3}. {:<16} tag '{}' ({})",
            i + 1,
            method.label,
            method.energy_tag,
            role
        );
    }

    methods.verify_files()?;
    for (path, _) in methods.file_listing() {
        println!("  [found] {}", path.display());
    }
    Ok(())
}
