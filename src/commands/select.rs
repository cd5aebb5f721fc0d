use std::io;

use anyhow::Result;

use super::input::{gather_paths, load_detector};
use crate::cli::InputArgs;
use crate::output;

pub fn select_buckets(args: &InputArgs) -> Result<()> {
    let detector = load_detector(args)?;
    let paths = gather_paths(args)?;
    let selection = detector.fats_to_run(&paths)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    output::write_selection(&mut out, &selection, args.format.into())
}
