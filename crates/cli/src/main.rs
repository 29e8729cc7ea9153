use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use roi_cutter_core::{
    capture::capture_async,
    egui,
    export::{collect_exports, export_rois, DirectorySink},
    init,
    ui::DEFAULT_EXPORT_DIR,
    Category, RoiCutter, RoiRect,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open an image in the interactive ROI editor
    Edit {
        /// Image to annotate
        image: PathBuf,
    },

    /// Cut ROIs out of an image without opening a window
    Crop {
        /// Image to cut from
        image: PathBuf,

        /// ROI as x,y,width,height in image pixels (repeatable)
        #[arg(long = "roi", value_parser = parse_roi, required = true)]
        rois: Vec<RoiRect>,

        /// Category to tag every ROI with (teamA, teamB, referee)
        #[arg(short, long)]
        category: Category,

        /// Directory to write crops and records into
        #[arg(short, long, default_value = DEFAULT_EXPORT_DIR)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    // Setup
    init();
    let args = Args::parse();

    let app = RoiCutter::new().context("Failed to load configuration")?;

    match args.command {
        Command::Edit { image } => {
            let image = app
                .open_image(&image)
                .with_context(|| format!("Failed to open {}", image.display()))?;
            // The window must own the main thread, and the editor brings its
            // own capture runtime.
            app.run_editor(image)?;
        }
        Command::Crop {
            image,
            rois,
            category,
            out,
        } => {
            let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
            runtime.block_on(crop(&app, image, rois, category, out))?;
        }
    }

    Ok(())
}

async fn crop(
    app: &RoiCutter,
    path: PathBuf,
    rects: Vec<RoiRect>,
    category: Category,
    out: PathBuf,
) -> Result<()> {
    let image = app
        .open_image(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut document = app.new_document(&image);

    let mut jobs = Vec::new();
    for rect in rects {
        document.select(None);
        let from = egui::pos2(rect.x, rect.y);
        let to = egui::pos2(rect.right(), rect.bottom());
        match document.draw(from, to) {
            Some(job) => {
                document.set_category(job.roi, Some(category));
                jobs.push(job);
            }
            None => tracing::warn!(
                ?rect,
                "ROI starts inside an earlier ROI, skipped"
            ),
        }
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.green} {msg}")?,
    );
    spinner.set_message(format!("Capturing {} ROI(s)...", jobs.len()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcomes = join_all(
        jobs.into_iter()
            .map(|job| capture_async(job, Some(image.clone()))),
    )
    .await;
    for outcome in outcomes {
        if outcome.payload.is_none() {
            tracing::warn!(roi = %outcome.roi, "Capture produced no pixels");
        }
        document.apply_capture(outcome);
    }
    spinner.finish_and_clear();

    let items = collect_exports(&document, Utc::now());
    if items.is_empty() {
        bail!("No ROI produced a capture");
    }

    let bar = ProgressBar::new(items.len() as u64);
    bar.set_style(ProgressStyle::default_bar().template("{bar:30.green} {pos}/{len} {msg}")?);
    bar.set_message("exporting");

    let mut sink = DirectorySink::new(&out)
        .with_context(|| format!("Failed to create {}", out.display()))?;
    let report = export_rois(&items, &mut sink, |done, _| bar.set_position(done as u64))
        .context("Export failed")?;
    bar.finish_and_clear();

    for (item, location) in items.iter().zip(&report.locations) {
        println!("{} {}", item.record.image_name, location);
    }
    println!("Exported {} ROI(s) to {}", report.exported, sink.root().display());

    Ok(())
}

/// Parses `x,y,width,height`.
fn parse_roi(value: &str) -> std::result::Result<RoiRect, String> {
    let parts: Vec<f32> = value
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| format!("invalid number in '{}': {}", value, e))?;

    match parts.as_slice() {
        [x, y, width, height] if *width > 0.0 && *height > 0.0 => {
            Ok(RoiRect::new(*x, *y, *width, *height))
        }
        [_, _, _, _] => Err(format!("'{}': width and height must be positive", value)),
        _ => Err(format!("expected x,y,width,height, got '{}'", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roi_argument() {
        assert_eq!(
            parse_roi("10, 20,30,40").unwrap(),
            RoiRect::new(10.0, 20.0, 30.0, 40.0)
        );
        assert!(parse_roi("10,20,30").is_err());
        assert!(parse_roi("10,20,0,40").is_err());
        assert!(parse_roi("a,b,c,d").is_err());
    }

    #[test]
    fn crop_subcommand_collects_repeated_rois() {
        let args = Args::try_parse_from([
            "roi-cutter",
            "crop",
            "frame.png",
            "--roi",
            "0,0,50,50",
            "--roi",
            "100,100,40,40",
            "--category",
            "referee",
        ])
        .unwrap();
        match args.command {
            Command::Crop {
                rois, category, out, ..
            } => {
                assert_eq!(rois.len(), 2);
                assert_eq!(category, Category::Referee);
                assert_eq!(out, PathBuf::from(DEFAULT_EXPORT_DIR));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
