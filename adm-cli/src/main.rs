//! adm CLI - Perceptual video quality metric
//!
//! Compare a reference and a distorted video (or still image) and compute
//! the ADM detail-loss score frame by frame.

use std::fs::File;
use std::io::{self, BufReader, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use adm::{AdmParams, AdmScore, AdmStream, Img, PixelFormat, StreamSummary, VideoInfo};
use anyhow::{bail, Context};
use clap::{ArgAction, ColorChoice, Parser, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// ADM perceptual video quality metric
///
/// Measures how much of the reference's spatial detail survives in the
/// distorted input. Higher scores mean better quality. A score of 1 means
/// no detail was lost; scores can exceed 1 when detail is enhanced.
///
/// Score interpretation:
///   0.98+       - Excellent, no visible loss
///   0.95 - 0.98 - Good
///   0.90 - 0.95 - Fair
///   0.80 - 0.90 - Poor
///   below 0.80  - Bad
#[derive(Parser, Debug)]
#[command(name = "adm")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    Compare two y4m videos:
        adm reference.y4m encoded.y4m

    Compare raw 10-bit planar video:
        adm --size 1920x1080 --pix-fmt yuv420p10le ref.yuv dist.yuv

    Compare two still images (luma only):
        adm original.png compressed.jpg

    CI mode - fail if the average drops below a threshold:
        adm --min-score 0.95 reference.y4m encoded.y4m

    Output JSON with per-scale diagnostics:
        adm --json reference.y4m encoded.y4m

EXIT CODES:
    0 - Success (average within threshold if --min-score specified)
    1 - Average below threshold (--min-score)
    2 - Error (file not found, unsupported format, size mismatch, etc.)")]
struct Cli {
    /// Reference input (.y4m, raw .yuv, or still image)
    #[arg(value_name = "REFERENCE")]
    reference: PathBuf,

    /// Distorted input (.y4m, raw .yuv, or still image)
    #[arg(value_name = "DISTORTED")]
    distorted: PathBuf,

    /// Frame size of raw inputs
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    size: Option<(usize, usize)>,

    /// Pixel format of raw inputs
    #[arg(long, default_value = "yuv420p", value_name = "FORMAT")]
    pix_fmt: PixelFormat,

    /// Maximum number of frames to compare
    #[arg(long, value_name = "N")]
    frames: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Output JSON (shorthand for --format json)
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Quiet mode - only output the average score
    #[arg(long, short = 's', action = ArgAction::SetTrue)]
    quiet: bool,

    /// Minimum acceptable average score (exit code 1 if below)
    #[arg(long, value_name = "SCORE")]
    min_score: Option<f64>,

    /// Viewing distance in display heights
    #[arg(long, default_value = "3.0", value_name = "HEIGHTS")]
    view_distance: f32,

    /// Display height in pixels used for the contrast sensitivity weights
    #[arg(long, default_value = "1080", value_name = "PIXELS")]
    display_height: f32,

    /// Fraction of each band border excluded from pooling
    #[arg(long, default_value = "0.1", value_name = "FACTOR")]
    border_factor: f64,

    /// Control color output
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Per-frame scores and the average with a quality rating
    Text,
    /// JSON with per-frame diagnostics and a summary
    Json,
    /// Minimal - just the average score
    Score,
}

#[derive(Serialize)]
struct JsonOutput {
    reference: String,
    distorted: String,
    width: usize,
    height: usize,
    pix_fmt: String,
    params: JsonParams,
    frames: Vec<JsonFrame>,
    summary: JsonSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    below_threshold: Option<bool>,
}

#[derive(Serialize)]
struct JsonParams {
    view_distance: f32,
    display_height: f32,
    border_factor: f64,
}

#[derive(Serialize)]
struct JsonFrame {
    frame: u64,
    score: f64,
    num: f64,
    den: f64,
    /// Per-scale (num, den) pairs, finest scale first.
    scales: [f64; 8],
}

#[derive(Serialize)]
struct JsonSummary {
    frames: u64,
    mean: f64,
    min: f64,
    max: f64,
    quality_rating: String,
}

fn parse_size(s: &str) -> Result<(usize, usize), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
    let w = w.trim().parse::<usize>().map_err(|e| format!("bad width '{w}': {e}"))?;
    let h = h.trim().parse::<usize>().map_err(|e| format!("bad height '{h}': {e}"))?;
    Ok((w, h))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_colors(&cli);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {e:#}", "error".red().bold());
            ExitCode::from(2)
        }
    }
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn setup_colors(cli: &Cli) {
    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {
            if !io::stdout().is_terminal() {
                colored::control::set_override(false);
            }
        }
    }
}

fn get_format(cli: &Cli) -> OutputFormat {
    if cli.json {
        OutputFormat::Json
    } else if cli.quiet {
        OutputFormat::Score
    } else {
        cli.format
    }
}

// ============================================================================
// Inputs
// ============================================================================

enum Source {
    Y4m(y4m::Decoder<BufReader<File>>),
    Raw(BufReader<File>),
    Still(Option<Vec<u8>>),
}

/// One opened input yielding luma planes as raw little-endian bytes.
struct Input {
    path: PathBuf,
    info: VideoInfo,
    source: Source,
}

impl Input {
    fn open(path: &Path, cli: &Cli) -> anyhow::Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let (info, source) = match ext.as_str() {
            "y4m" => {
                let file = File::open(path)
                    .with_context(|| format!("failed to open '{}'", path.display()))?;
                let decoder = y4m::decode(BufReader::new(file)).map_err(|e| {
                    anyhow::anyhow!("failed to read y4m header of '{}': {e:?}", path.display())
                })?;
                let format = map_colorspace(decoder.get_colorspace())
                    .with_context(|| format!("unsupported input '{}'", path.display()))?;
                let info = VideoInfo::new(decoder.get_width(), decoder.get_height(), format);
                (info, Source::Y4m(decoder))
            }
            "yuv" | "raw" => {
                let Some((width, height)) = cli.size else {
                    bail!("raw input '{}' requires --size WxH", path.display());
                };
                let file = File::open(path)
                    .with_context(|| format!("failed to open '{}'", path.display()))?;
                let info = VideoInfo::new(width, height, cli.pix_fmt);
                (info, Source::Raw(BufReader::new(file)))
            }
            _ => {
                let img = image::open(path)
                    .with_context(|| format!("failed to load '{}'", path.display()))?;
                let luma = img.to_luma8();
                let info = VideoInfo::new(
                    luma.width() as usize,
                    luma.height() as usize,
                    PixelFormat::Yuv444p,
                );
                (info, Source::Still(Some(luma.into_raw())))
            }
        };

        tracing::debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            format = %info.format,
            "opened input"
        );
        Ok(Self {
            path: path.to_path_buf(),
            info,
            source,
        })
    }

    /// Reads the next luma plane into `luma`. Returns `false` at end of input.
    fn next_frame(&mut self, luma: &mut Vec<u8>) -> anyhow::Result<bool> {
        let luma_len = self.info.format.luma_len(self.info.width, self.info.height);
        match &mut self.source {
            Source::Y4m(decoder) => match decoder.read_frame() {
                Ok(frame) => {
                    let y = frame.get_y_plane();
                    if y.len() < luma_len {
                        bail!("short luma plane in '{}'", self.path.display());
                    }
                    luma.clear();
                    luma.extend_from_slice(&y[..luma_len]);
                    Ok(true)
                }
                Err(y4m::Error::EOF) => Ok(false),
                Err(e) => bail!("failed to read frame from '{}': {e:?}", self.path.display()),
            },
            Source::Raw(reader) => {
                let frame_len = self.info.format.frame_len(self.info.width, self.info.height);
                let mut frame = vec![0u8; frame_len];
                let filled = read_full(reader, &mut frame)
                    .with_context(|| format!("failed to read '{}'", self.path.display()))?;
                if filled < frame_len {
                    if filled > 0 {
                        tracing::warn!(
                            path = %self.path.display(),
                            bytes = filled,
                            "ignoring truncated trailing frame"
                        );
                    }
                    return Ok(false);
                }
                frame.truncate(luma_len);
                *luma = frame;
                Ok(true)
            }
            Source::Still(data) => match data.take() {
                Some(data) => {
                    *luma = data;
                    Ok(true)
                }
                None => Ok(false),
            },
        }
    }
}

/// Fills `buf` as far as the reader allows, returning the bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn map_colorspace(colorspace: y4m::Colorspace) -> anyhow::Result<PixelFormat> {
    use y4m::Colorspace::*;
    Ok(match colorspace {
        C420 | C420jpeg | C420paldv | C420mpeg2 => PixelFormat::Yuv420p,
        C422 => PixelFormat::Yuv422p,
        C444 => PixelFormat::Yuv444p,
        C420p10 => PixelFormat::Yuv420p10le,
        C422p10 => PixelFormat::Yuv422p10le,
        C444p10 => PixelFormat::Yuv444p10le,
        other => bail!("colorspace {other:?} is not supported"),
    })
}

fn to_words(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect()
}

// ============================================================================
// Scoring
// ============================================================================

struct FrameRecord {
    index: u64,
    score: AdmScore,
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let params = AdmParams::default()
        .with_view_distance(cli.view_distance)
        .with_display_height(cli.display_height)
        .with_border_factor(cli.border_factor);

    let mut reference = Input::open(&cli.reference, cli)?;
    let mut distorted = Input::open(&cli.distorted, cli)?;
    let info = reference.info;

    let mut stream = AdmStream::open(reference.info, distorted.info, params)
        .context("inputs cannot be compared")?;

    let (width, height) = (info.width, info.height);
    let mut ref_luma = Vec::new();
    let mut dist_luma = Vec::new();
    let mut records = Vec::new();

    for index in 0.. {
        if cli.frames.is_some_and(|limit| index >= limit) {
            break;
        }
        let has_ref = reference.next_frame(&mut ref_luma)?;
        let has_dist = distorted.next_frame(&mut dist_luma)?;
        if !has_ref || !has_dist {
            if has_ref != has_dist {
                let shorter = if has_ref { &distorted } else { &reference };
                tracing::warn!(
                    frames = index,
                    "'{}' ended first; stopping at the shorter stream",
                    shorter.path.display()
                );
            }
            break;
        }

        let result = if info.format.bytes_per_sample() == 2 {
            let (r, d) = (to_words(&ref_luma), to_words(&dist_luma));
            stream.process(
                Img::new(r.as_slice(), width, height),
                Img::new(d.as_slice(), width, height),
            )
        } else {
            stream.process(
                Img::new(ref_luma.as_slice(), width, height),
                Img::new(dist_luma.as_slice(), width, height),
            )
        };
        let score = result.with_context(|| format!("frame {index}"))?;

        tracing::debug!(frame = index, score = score.score, "scored frame");
        records.push(FrameRecord { index, score });
    }

    if records.is_empty() {
        bail!("no frames to compare");
    }

    let params = stream.params().clone();
    let summary = stream.finish();
    output_results(cli, &info, &params, &records, &summary)?;

    if let Some(min_score) = cli.min_score {
        if summary.mean < min_score {
            return Ok(ExitCode::from(1));
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Output
// ============================================================================

fn quality_rating(score: f64) -> (&'static str, colored::Color) {
    use colored::Color;
    if score >= 0.98 {
        ("excellent", Color::Green)
    } else if score >= 0.95 {
        ("good", Color::Green)
    } else if score >= 0.90 {
        ("fair", Color::Yellow)
    } else if score >= 0.80 {
        ("poor", Color::Red)
    } else {
        ("bad", Color::Red)
    }
}

fn output_results(
    cli: &Cli,
    info: &VideoInfo,
    params: &AdmParams,
    records: &[FrameRecord],
    summary: &StreamSummary,
) -> anyhow::Result<()> {
    let (rating, color) = quality_rating(summary.mean);

    match get_format(cli) {
        OutputFormat::Score => {
            println!("{:.6}", summary.mean);
        }
        OutputFormat::Text => {
            if records.len() > 1 {
                for record in records {
                    println!("frame {:>5}: {:.6}", record.index, record.score.score);
                }
            }
            let score_str = format!("{:.4}", summary.mean);
            println!(
                "ADM score: {} ({})",
                score_str.color(color),
                rating.color(color).bold()
            );
            if records.len() > 1 {
                println!(
                    "  Frames: {}  min={:.4}  max={:.4}",
                    summary.frames, summary.min, summary.max
                );
            }
            if let Some(min_score) = cli.min_score {
                if summary.mean < min_score {
                    println!(
                        "{}",
                        format!("Threshold failed: {:.4} < {}", summary.mean, min_score)
                            .red()
                            .bold()
                    );
                } else {
                    println!(
                        "{}",
                        format!("Threshold passed: {:.4} >= {}", summary.mean, min_score).green()
                    );
                }
            }
        }
        OutputFormat::Json => {
            let output = JsonOutput {
                reference: cli.reference.display().to_string(),
                distorted: cli.distorted.display().to_string(),
                width: info.width,
                height: info.height,
                pix_fmt: info.format.to_string(),
                params: JsonParams {
                    view_distance: params.view_distance(),
                    display_height: params.display_height(),
                    border_factor: params.border_factor(),
                },
                frames: records
                    .iter()
                    .map(|r| JsonFrame {
                        frame: r.index,
                        score: r.score.score,
                        num: r.score.score_num,
                        den: r.score.score_den,
                        scales: r.score.diagnostics(),
                    })
                    .collect(),
                summary: JsonSummary {
                    frames: summary.frames,
                    mean: summary.mean,
                    min: summary.min,
                    max: summary.max,
                    quality_rating: rating.to_string(),
                },
                below_threshold: cli.min_score.map(|min| summary.mean < min),
            };
            let json =
                serde_json::to_string_pretty(&output).context("failed to serialize JSON")?;
            println!("{json}");
        }
    }

    let _ = io::stdout().flush();
    Ok(())
}
