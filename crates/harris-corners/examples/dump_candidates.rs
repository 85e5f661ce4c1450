use anyhow::Context;
use harris_corners::app::{load_image, CandidateOut};
use harris_corners::{logger, HarrisParams, StageTimings};
use harris_corners_core::detect::find_candidates_with_trace;
use log::{info, LevelFilter};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    logger::init(LevelFilter::Info)?;

    let mut args = std::env::args().skip(1);
    let input: PathBuf = args
        .next()
        .context("usage: dump_candidates <image> [--threshold T] [--repeat N]")?
        .into();

    let mut params = HarrisParams::default();
    let mut repeat: u32 = 1;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--threshold" => {
                let v = args.next().context("expected a number after --threshold")?;
                params.threshold_abs = v.parse().context("could not parse threshold")?;
            }
            "--repeat" => {
                let v = args.next().context("expected an integer after --repeat")?;
                repeat = v.parse().context("could not parse repeat count")?;
                if repeat == 0 {
                    anyhow::bail!("repeat must be >= 1");
                }
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    let img = load_image(&input)?;
    let mut timings = StageTimings::new();
    let mut last = None;
    for _ in 0..repeat {
        last = Some(find_candidates_with_trace(img.view(), &params, &mut timings));
    }
    let res = last.context("no detection run")?;
    info!(
        "{} candidates, scores {:.3} ms, maxima {:.3} ms",
        res.candidates.len(),
        res.scores_ms,
        res.maxima_ms
    );
    eprint!("{}", timings.summary());

    let out: Vec<CandidateOut> = res.candidates.iter().map(CandidateOut::from).collect();
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
