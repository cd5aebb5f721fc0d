use std::io;

use anyhow::Result;

use super::input::{gather_paths, load_detector};
use crate::cli::InputArgs;
use crate::output;

pub fn explain_selection(args: &InputArgs) -> Result<()> {
    let detector = load_detector(args)?;
    log::info!(
        "Model: {} features, {} bundles, {} buckets",
        detector.graph().catalog().len(),
        detector.graph().bundle_count(),
        detector.index().len()
    );
    let paths = gather_paths(args)?;
    let report = detector.analyze(&paths)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    output::write_report(&mut out, &report, args.format.into())
}
