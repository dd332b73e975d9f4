mod cli;

use dubmerge::{
    config,
    processor::{MergeService, RunOutcome},
    schedule,
    server::{self, AppContext},
};
use dubmerge_av::actions::ffmpeg_args;
use dubmerge_av::probe::{FfprobeProber, Prober};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

async fn serve(host: Option<String>, port: Option<u16>, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting dubmerge with {} task(s)", config.tasks.len());

    let period = config.general.processing_interval();
    let (host, port) = (config.server.host.clone(), config.server.port);
    let service = Arc::new(MergeService::from_config(Arc::new(config)));
    let cancel = CancellationToken::new();

    let scheduler = tokio::spawn(schedule::run_periodically(
        Arc::clone(&service),
        period,
        cancel.clone(),
    ));

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        server::shutdown_signal().await;
        signal_cancel.cancel();
    });

    let ctx = AppContext {
        service,
        cancel: cancel.clone(),
    };
    let server_result = server::start_server(&host, port, ctx).await;

    tracing::info!("Shutting down...");
    cancel.cancel();
    let _ = scheduler.await;

    server_result
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "dubmerge=trace,dubmerge_av=trace,tower_http=debug".to_string()
        } else {
            "dubmerge=debug,dubmerge_av=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Serve { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(serve(host, port, cli.config.as_deref()))
        }
        Commands::Run => run_once(cli.config.as_deref()),
        Commands::Plan {
            task,
            season,
            episode,
            json,
        } => plan_episode(cli.config.as_deref(), &task, season, episode, json),
        Commands::Probe { file, json } => probe_file(cli.config.as_deref(), &file, json),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("dubmerge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_once(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let service = MergeService::from_config(Arc::new(config));

    let cancel = CancellationToken::new();
    let report = match service.start_run(&cancel) {
        RunOutcome::Finished(report) => report,
        RunOutcome::AlreadyRunning => anyhow::bail!("Processing is already in progress."),
    };

    let status = service.status();
    println!("{}", status.last_message);
    if report.failed > 0 || report.aborted_tasks > 0 {
        anyhow::bail!(
            "{} episode(s) failed, {} task(s) aborted",
            report.failed,
            report.aborted_tasks
        );
    }
    Ok(())
}

fn plan_episode(
    config_path: Option<&Path>,
    task: &str,
    season: u32,
    episode: u32,
    json: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let service = MergeService::from_config(Arc::new(config));
    let plan = service.plan_episode(task, season, episode)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Output: {}", plan.output.display());
    println!("\nInputs: {}", plan.inputs.len());
    for (input, outcome) in plan.inputs.iter().zip(&plan.classifications) {
        println!("  {} ({:?})", input.path.display(), outcome);
    }

    println!("\nAudio Tracks: {}", plan.audio_tracks.len());
    for track in &plan.audio_tracks {
        println!(
            "  [{}] {} ({}) from {} - {}",
            track.index, track.title, track.language, track.map, track.codec
        );
    }

    if !plan.filter_graph.is_empty() {
        println!("\nFilter graph: {}", plan.filter_graph);
    }

    let ffmpeg = service.config().tools.ffmpeg();
    println!("\n{} {}", ffmpeg.display(), ffmpeg_args(&plan).join(" "));
    Ok(())
}

fn probe_file(config_path: Option<&Path>, file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let prober = FfprobeProber::new(config.tools.ffprobe());
    let media_info = prober.probe(file)?;

    if json {
        let json_str = serde_json::to_string_pretty(&media_info)?;
        println!("{}", json_str);
        return Ok(());
    }

    println!("File: {}", media_info.file_path.display());
    println!("Container: {}", media_info.container);
    println!("Size: {} bytes", media_info.file_size);
    if let Some(duration) = media_info.video_duration().or(media_info.duration) {
        let secs = duration.as_secs();
        let mins = secs / 60;
        let hours = mins / 60;
        println!("Duration: {:02}:{:02}:{:02}", hours, mins % 60, secs % 60);
    }

    println!("\nVideo Tracks: {}", media_info.video_tracks.len());
    for (i, track) in media_info.video_tracks.iter().enumerate() {
        print!("  [{}] {} {}x{}", i, track.codec, track.width, track.height);
        if let Some(fps) = track.frame_rate {
            print!(", {:.3} fps", fps);
        }
        println!();
    }

    println!("\nAudio Tracks: {}", media_info.audio_tracks.len());
    for (i, track) in media_info.audio_tracks.iter().enumerate() {
        print!("  [{}] {} {}ch", i, track.codec, track.channels);
        if let Some(ref lang) = track.language {
            print!(" ({})", lang);
        }
        if track.default {
            print!(" [default]");
        }
        println!();
    }

    match prober.probe_facts(file) {
        Ok(facts) => println!(
            "\nUsable for merging: {:.3} fps, {:.3}s",
            facts.frame_rate,
            facts.duration.as_secs_f64()
        ),
        Err(e) => println!("\nNot usable for merging: {}", e),
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    let tools = dubmerge_av::check_tools(&config.tools.ffmpeg(), &config.tools.ffprobe());
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to enable merging.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!(
                "  Processing interval: {}s",
                config.general.processing_interval_secs
            );
            println!("  Tasks: {}", config.tasks.len());
            for task in &config.tasks {
                println!(
                    "    {}: {} -> {}",
                    task.title,
                    task.source_path.display(),
                    task.target_path.display()
                );
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
