use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use video_slicer::{
    Archive, ChunkPlan, EmbedOptions, FfmpegLogLevel, MediaFile, ProgressCallback, ProgressInfo,
    SliceOptions, Slicer, TagEmbedder, TagTemplate, match_pairs, read_tag_fields,
};

const CLI_AFTER_HELP: &str = "Examples:\n  video-slicer slice input.mp4 --rate 8 --out slices.zip --progress\n  video-slicer embed slices.zip --out tagged.zip\n  video-slicer plan --duration 10.6 --rate 8 --json\n  video-slicer pairs slices.zip\n  video-slicer completions zsh > _video-slicer";

const MAX_RATE: u32 = 60;

#[derive(Debug, Parser)]
#[command(
    name = "video-slicer",
    version,
    about = "Slice videos into audio/cover pairs and embed covers back into audio tags",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Slice a video into numbered audio clips and cover frames.
    #[command(
        about = "Slice a video into audio/cover pairs",
        after_help = "Examples:\n  video-slicer slice input.mp4 --out slices.zip\n  video-slicer slice input.mp4 --rate 2 --out slices.zip --progress"
    )]
    Slice {
        /// Input video path.
        input: PathBuf,
        /// Chunks per second of source (1-60).
        #[arg(long, default_value_t = 8, value_parser = parse_rate)]
        rate: u32,
        /// Output zip archive.
        #[arg(long)]
        out: PathBuf,
        /// Encode chunks across all cores.
        #[cfg(feature = "rayon")]
        #[arg(long)]
        parallel: bool,
    },

    /// Embed covers and tags into paired audio entries of an archive.
    #[command(
        about = "Embed covers into paired audio files",
        after_help = "Examples:\n  video-slicer embed slices.zip --out tagged.zip\n  video-slicer embed slices.zip --out tagged.zip --artist \"Me\" --album \"Clips\""
    )]
    Embed {
        /// Input zip archive holding audio_NNN.* and cover_NNN.* entries.
        input: PathBuf,
        /// Output zip archive.
        #[arg(long)]
        out: PathBuf,
        /// Prefix of each track title; the pair index is appended.
        #[arg(long)]
        title_prefix: Option<String>,
        /// Artist written into every track.
        #[arg(long)]
        artist: Option<String>,
        /// Album written into every track.
        #[arg(long)]
        album: Option<String>,
    },

    /// Print the chunk plan for a duration and rate.
    #[command(about = "Print the chunk plan")]
    Plan {
        /// Source duration in seconds.
        #[arg(long)]
        duration: f64,
        /// Chunks per second (1-60).
        #[arg(long, default_value_t = 8, value_parser = parse_rate)]
        rate: u32,
        /// Output the plan as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the audio/cover pairs an archive would be tagged with.
    #[command(about = "List matched pairs in an archive")]
    Pairs {
        /// Input zip archive.
        input: PathBuf,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print source video metadata.
    #[command(about = "Print source metadata", visible_alias = "probe")]
    Metadata {
        /// Input video path.
        input: PathBuf,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the tag fields embedded in an audio file.
    #[command(about = "Inspect embedded tags")]
    Inspect {
        /// Audio file (mp3 or wav).
        input: PathBuf,
        /// Write the embedded cover to this path.
        #[arg(long)]
        cover_out: Option<PathBuf>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_rate(value: &str) -> Result<u32, String> {
    let rate: u32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid rate: {value}"))?;
    if (1..=MAX_RATE).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("rate must be between 1 and {MAX_RATE}, got {rate}"))
    }
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Some(level) = &global.log_level {
        let parsed =
            FfmpegLogLevel::parse(level).ok_or(format!("unsupported --log-level: {level}"))?;
        video_slicer::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:40.cyan/blue} {pos:>3}% {msg}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.overall_percentage.round() as u64);
        match &info.message {
            Some(message) => self.bar.set_message(format!("{} {message}", info.phase)),
            None => self.bar.set_message(info.phase.to_string()),
        }
    }
}

fn progress_bar(global: &GlobalOptions) -> Result<Option<Arc<TerminalProgress>>, Box<dyn std::error::Error>> {
    if global.progress {
        Ok(Some(Arc::new(TerminalProgress::new()?)))
    } else {
        Ok(None)
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Slice {
            input,
            rate,
            out,
            #[cfg(feature = "rayon")]
            parallel,
        } => {
            ensure_writable_path(&out, cli.global.overwrite)?;
            let progress = progress_bar(&cli.global)?;
            let mut options = SliceOptions::new();
            if let Some(progress) = &progress {
                options = options.with_progress(progress.clone());
            }

            let source = MediaFile::open(&input)?;
            if cli.global.verbose {
                let duration = source.metadata().duration.as_secs_f64();
                eprintln!(
                    "{} {:.3}s source, {} chunks at {rate}/s",
                    "plan".cyan().bold(),
                    duration,
                    video_slicer::chunk_count(duration, rate)
                );
            }

            let mut slicer = Slicer::new(rate)?;
            #[cfg(feature = "rayon")]
            let zip = if parallel {
                slicer.run_parallel(source, &options)?
            } else {
                slicer.run(source, &options)?
            };
            #[cfg(not(feature = "rayon"))]
            let zip = slicer.run(source, &options)?;

            if let Some(progress) = progress {
                progress.bar.finish_and_clear();
            }
            fs::write(&out, zip)?;
            println!("{} saved {}", "success:".green().bold(), out.display());
        }
        Commands::Embed {
            input,
            out,
            title_prefix,
            artist,
            album,
        } => {
            ensure_writable_path(&out, cli.global.overwrite)?;
            let mut template = TagTemplate::default();
            if let Some(prefix) = title_prefix {
                template.title_prefix = prefix;
            }
            if let Some(artist) = artist {
                template.artist = artist;
            }
            if let Some(album) = album {
                template.album = album;
            }

            let progress = progress_bar(&cli.global)?;
            let mut options = EmbedOptions::new().with_template(template);
            if let Some(progress) = &progress {
                options = options.with_progress(progress.clone());
            }

            let bytes = fs::read(&input)?;
            let tagged = TagEmbedder::new().run(&bytes, &options)?;
            if let Some(progress) = progress {
                progress.bar.finish_and_clear();
            }
            fs::write(&out, tagged)?;
            println!("{} saved {}", "success:".green().bold(), out.display());
        }
        Commands::Plan {
            duration,
            rate,
            json,
        } => {
            let plan = ChunkPlan::new(duration, rate)?;
            if json {
                let payload = json!({
                    "duration_seconds": duration,
                    "rate": plan.rate(),
                    "whole_seconds": plan.whole_seconds(),
                    "chunk_duration": plan.chunk_duration(),
                    "chunks": plan.iter().map(|chunk| json!({
                        "index": chunk.index,
                        "label": chunk.label(),
                        "start": chunk.start_time,
                        "end": chunk.end_time(),
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "{} chunks of {:.4}s ({}s x {}/s)",
                    plan.len(),
                    plan.chunk_duration(),
                    plan.whole_seconds(),
                    plan.rate()
                );
                for chunk in &plan {
                    println!(
                        "{}  {:>10.4}s  {:>10.4}s",
                        chunk.label(),
                        chunk.start_time,
                        chunk.end_time()
                    );
                }
            }
        }
        Commands::Pairs { input, json } => {
            let archive = Archive::from_zip_bytes(&fs::read(&input)?)?;
            let pairs = match_pairs(archive.names());
            if json {
                let payload = json!({
                    "entries": archive.len(),
                    "pairs": pairs.iter().map(|pair| json!({
                        "index": pair.index,
                        "audio": pair.audio,
                        "cover": pair.cover,
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for pair in &pairs {
                    println!("{}  {}  {}", pair.index.bold(), pair.audio, pair.cover);
                }
                println!(
                    "{} {} pairs from {} entries",
                    "matched".green().bold(),
                    pairs.len(),
                    archive.len()
                );
            }
        }
        Commands::Metadata { input, json } => {
            let source = MediaFile::open(&input)?;
            let metadata = source.metadata();
            if json {
                let payload = json!({
                    "format": metadata.format,
                    "duration_seconds": metadata.duration.as_secs_f64(),
                    "video": metadata.video.as_ref().map(|video| json!({
                        "width": video.width,
                        "height": video.height,
                        "fps": video.frames_per_second,
                        "codec": video.codec,
                    })),
                    "audio": metadata.audio.as_ref().map(|audio| json!({
                        "sample_rate": audio.sample_rate,
                        "channels": audio.channels,
                        "codec": audio.codec,
                    })),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!("Duration: {:?}", metadata.duration);
                if let Some(video) = &metadata.video {
                    println!(
                        "Video: {}x{} @ {:.2} fps [{}]",
                        video.width, video.height, video.frames_per_second, video.codec,
                    );
                }
                if let Some(audio) = &metadata.audio {
                    println!(
                        "Audio: {} Hz, {} ch [{}]",
                        audio.sample_rate, audio.channels, audio.codec,
                    );
                }
            }
        }
        Commands::Inspect {
            input,
            cover_out,
            json,
        } => {
            let contents = read_tag_fields(&fs::read(&input)?)?;
            if json {
                let payload = json!({
                    "id3_version": contents.version,
                    "title": contents.title,
                    "artist": contents.artist,
                    "album": contents.album,
                    "picture": contents.picture.as_ref().map(|picture| json!({
                        "mime": picture.mime,
                        "type": picture.picture_type,
                        "bytes": picture.data.len(),
                    })),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                match contents.version {
                    Some(version) => println!("Tag: ID3v2.{version}"),
                    None => println!("Tag: none"),
                }
                println!("Title: {}", contents.title.as_deref().unwrap_or("-"));
                println!("Artist: {}", contents.artist.as_deref().unwrap_or("-"));
                println!("Album: {}", contents.album.as_deref().unwrap_or("-"));
                if let Some(picture) = &contents.picture {
                    println!("Picture: {} ({} bytes)", picture.mime, picture.data.len());
                }
            }

            if let Some(path) = cover_out {
                let picture = contents
                    .picture
                    .ok_or_else(|| format!("{} has no embedded picture", input.display()))?;
                ensure_writable_path(&path, cli.global.overwrite)?;
                fs::write(&path, picture.data)?;
                println!("{} saved {}", "success:".green().bold(), path.display());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "video-slicer", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
