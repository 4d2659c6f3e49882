//! tvd-workflows CLI: talking-face and one-face workflows, one-off propagation and parsing.
//!
//! Usage:
//!   tvd-workflows talking-face --episode 1 --episode 2 [--workdir /work] [--series GameOfThrones]
//!   tvd-workflows one-face --episode 3
//!   tvd-workflows parse [--sequences list.txt] --output talking.json
//!   tvd-workflows propagate --source clusters.json --target talking.json --output labeled.json
//!   tvd-workflows show labeled.json
//!
//! Configuration comes from `--config`, `$TVD_CONFIG` or `config/tvd.toml`, then `TVD__*`
//! environment variables (a `.env` file is honored), then the flags below.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tokio::task::JoinSet;
use tracing::{error, info};
use tvd_annotation::{json, ConservativeTagger, SequenceDescriptor, TalkingFaceParser};
use tvd_workflows::{
    logging, one_face_workflow, talking_face_workflow, EpisodePaths, WorkflowConfig,
    WorkflowGraph, WorkflowResult,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "tvd-workflows", version, about = "Talking-face workflows over temporal annotations")]
struct Cli {
    /// Configuration file (TOML, extension optional)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Overrides {
    #[arg(long, global = true)]
    workdir: Option<PathBuf>,
    #[arg(long, global = true)]
    series: Option<String>,
    #[arg(long, global = true)]
    season: Option<u32>,
    /// Talking-face experiment name (log directory)
    #[arg(long, global = true)]
    exp: Option<String>,
    /// Talking-face log modality suffix
    #[arg(long, global = true)]
    modality: Option<String>,
}

impl Overrides {
    fn apply(self, config: &mut WorkflowConfig) {
        if let Some(workdir) = self.workdir {
            config.workdir = workdir;
        }
        if let Some(series) = self.series {
            config.series = series;
        }
        if let Some(season) = self.season {
            config.season = season;
        }
        if let Some(exp) = self.exp {
            config.talking_face.exp = exp;
        }
        if let Some(modality) = self.modality {
            config.talking_face.modality = modality;
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run the talking-face workflow; several episodes run concurrently
    TalkingFace {
        /// Episode number (repeatable; defaults to the configured episode)
        #[arg(long = "episode")]
        episodes: Vec<u32>,
    },
    /// Run the one-face workflow (speech turns tagged straight from face clusters)
    OneFace {
        #[arg(long = "episode")]
        episodes: Vec<u32>,
    },
    /// Parse talking-face detection logs into an annotation file
    Parse {
        #[arg(long)]
        episode: Option<u32>,
        /// Sequence list (defaults to the episode's list under workdir)
        #[arg(long)]
        sequences: Option<PathBuf>,
        #[arg(long)]
        output: PathBuf,
    },
    /// Label TARGET entries from overlapping SOURCE entries with the same track
    Propagate {
        #[arg(long)]
        source: PathBuf,
        #[arg(long)]
        target: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Print the entries of an annotation file
    Show { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();
    let mut config = match cli.config.as_deref() {
        Some(path) => WorkflowConfig::load_from(Some(path), true)?,
        None => WorkflowConfig::load()?,
    };
    cli.overrides.apply(&mut config);

    match cli.command {
        Command::TalkingFace { episodes } => {
            run_episodes(config, episodes, talking_face_workflow).await
        }
        Command::OneFace { episodes } => run_episodes(config, episodes, one_face_workflow).await,
        Command::Parse {
            episode,
            sequences,
            output,
        } => {
            if let Some(episode) = episode {
                config.episode = episode;
            }
            let paths = EpisodePaths::new(&config);
            let list = sequences.unwrap_or_else(|| paths.sequence_list());
            let parser = TalkingFaceParser::new(|d: &SequenceDescriptor| {
                paths.sequence_log(d.identifier, d.index)
            })
            .with_label(config.talking_face.label.as_str());
            let (annotation, report) = parser.parse_list(&list)?;
            json::dump_to_path(&annotation.with_uri(paths.episode()), &output)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Propagate {
            source,
            target,
            output,
        } => {
            let source = json::load_from_path(&source)?;
            let target = json::load_from_path(&target)?;
            let result = ConservativeTagger::new().tag(&target, &source);
            json::dump_to_path(&result.annotation, &output)?;
            println!("{}", serde_json::to_string_pretty(&result.report)?);
            Ok(())
        }
        Command::Show { file } => {
            let annotation = json::load_from_path(&file)?;
            if let Some(uri) = annotation.uri() {
                println!("# {}", uri);
            }
            for entry in annotation.iter() {
                println!("{} {} {}", entry.segment, entry.track, entry.label);
            }
            Ok(())
        }
    }
}

type Build = fn(&WorkflowConfig) -> WorkflowResult<WorkflowGraph>;

/// One workflow per episode, each on its own blocking task. Runs share no state.
async fn run_episodes(
    config: WorkflowConfig,
    episodes: Vec<u32>,
    build: Build,
) -> Result<(), BoxError> {
    let episodes = if episodes.is_empty() {
        vec![config.episode]
    } else {
        episodes
    };
    let total = episodes.len();

    let mut tasks = JoinSet::new();
    for episode in episodes {
        let episode_config = config.for_episode(episode);
        tasks.spawn_blocking(move || {
            let id = episode_config.episode_id();
            let summary = build(&episode_config).and_then(|graph| graph.run());
            (id, summary)
        });
    }

    let mut failed = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((id, Ok(summary))) => {
                info!(episode = %id, "done");
                println!("{}", serde_json::to_string(&summary)?);
            }
            Ok((id, Err(e))) => {
                failed += 1;
                error!(episode = %id, error = %e, "workflow failed");
            }
            Err(e) => {
                failed += 1;
                error!(error = %e, "workflow task panicked or was cancelled");
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} episode(s) failed", failed, total).into());
    }
    Ok(())
}
