use std::io;

use anyhow::Result;

use super::input::{gather_paths, load_detector};
use crate::cli::InputArgs;
use crate::output;

/// Print whether `bucket` must run and return the answer.
pub fn should_run(bucket: &str, args: &InputArgs) -> Result<bool> {
    let detector = load_detector(args)?;
    if !detector.index().contains(bucket) {
        log::warn!("Bucket [ {} ] is not in the snapshot", bucket);
    }
    let paths = gather_paths(args)?;
    let run = detector.should_run(bucket, &paths)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    output::write_should_run(&mut out, bucket, run, args.format.into())?;
    Ok(run)
}
