use clap::{Args, Parser, Subcommand};
use postbox::composer::{Composer, Identity, ValidationReport, validate_content};
use postbox::config::{self, AppConfig};
use postbox::imaging::{
    ClipboardItem, EncodedImage, ImageProcessingFailed, NormalizeSettings, RawImage, RustBackend,
    jpeg_file_names, normalize_image,
};
use postbox::output::{self, NormalizeReport};
use postbox::posts::{JsonFileStore, PostId, PostStore, PostUpdate};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "postbox")]
#[command(version)]
#[command(about = "Post text and images, with every image normalized before it is stored")]
#[command(long_about = "\
Post text and images, with every image normalized before it is stored

Attached images are decoded, scaled down so the longer side fits within
800x600 (never enlarged), and re-encoded as JPEG at quality 70. The result
is embedded in the post as a data URI.

Supported inputs: JPEG, PNG, GIF, WebP.

Run 'postbox gen-config' to generate a documented postbox.toml.")]
struct Cli {
    /// Config file (defaults to ./postbox.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Post store file, overriding `store.path` from the config
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log pipeline and store activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize images to bounded JPEGs
    Normalize {
        /// Image files to normalize
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Write `<name>.jpg` for each input into this directory (`<name>-2.jpg`
        /// and so on when names repeat)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Print the data URI a post would embed for an image
    DataUri {
        input: PathBuf,
    },
    /// Create, list and edit posts
    #[command(subcommand)]
    Post(PostCommand),
    /// Load and validate the config, then print the effective values
    CheckConfig,
    /// Print a stock postbox.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum PostCommand {
    /// Compose and submit a new post
    Add(AddArgs),
    /// List posts, oldest first
    List {
        /// Only posts by this author
        #[arg(long)]
        user_email: Option<String>,

        /// Print the stored JSON documents
        #[arg(long)]
        json: bool,
    },
    /// Show a single post
    Show { id: String },
    /// Change the content or image of a post
    Update {
        id: String,

        #[arg(long)]
        content: Option<String>,

        /// Replace the image with this file
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Delete a post
    Delete { id: String },
}

#[derive(Args)]
struct AddArgs {
    /// Author email of the signed-in user
    #[arg(long)]
    email: String,

    #[arg(long, default_value = "")]
    content: String,

    /// Attach an image file
    #[arg(long, conflicts_with = "paste")]
    image: Option<PathBuf>,

    /// Treat these files as one clipboard paste; the first image that
    /// normalizes is attached
    #[arg(long, num_args = 1..)]
    paste: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Normalize { inputs, out_dir } => {
            let config = load_config(cli.config.as_deref())?;
            init_thread_pool(&config.processing);
            let settings = NormalizeSettings::from_config(&config.image);
            normalize_files(&inputs, out_dir.as_deref(), &settings)?;
        }
        Command::DataUri { input } => {
            let config = load_config(cli.config.as_deref())?;
            let settings = NormalizeSettings::from_config(&config.image);
            let raw = RawImage::from_path(&input)?;
            let image =
                normalize_image(&RustBackend::new(), &raw, &settings).map_err(user_facing)?;
            println!("{}", image.to_data_uri());
        }
        Command::Post(command) => {
            let config = load_config(cli.config.as_deref())?;
            let store = open_store(&config, cli.store.as_deref())?;
            run_post_command(command, &config, &store).await?;
        }
        Command::CheckConfig => {
            let config = load_config(cli.config.as_deref())?;
            print!("{}", toml::to_string_pretty(&config)?);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays clean for data URIs and JSON.
///
/// `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores; config can lower it, not raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, config::ConfigError> {
    let config = config::load_config(path)?;
    debug!(?config, "config loaded");
    Ok(config)
}

fn open_store(
    config: &AppConfig,
    override_path: Option<&Path>,
) -> Result<JsonFileStore, Box<dyn std::error::Error>> {
    let path = override_path.unwrap_or(config.store.path.as_path());
    Ok(JsonFileStore::open(path)?)
}

fn normalize_files(
    inputs: &[PathBuf],
    out_dir: Option<&Path>,
    settings: &NormalizeSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    let raws = inputs
        .iter()
        .map(|path| RawImage::from_path(path))
        .collect::<Result<Vec<_>, _>>()?;

    let backend = RustBackend::new();
    let results: Vec<Result<EncodedImage, ImageProcessingFailed>> = raws
        .par_iter()
        .map(|raw| normalize_image(&backend, raw, settings))
        .collect();

    let mut outputs = Vec::with_capacity(results.len());
    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir)?;
    }
    for (name, result) in jpeg_file_names(inputs).iter().zip(&results) {
        let written = match (out_dir, result) {
            (Some(dir), Ok(image)) => {
                let target = dir.join(name);
                std::fs::write(&target, &image.bytes)?;
                Some(target)
            }
            _ => None,
        };
        outputs.push(written);
    }

    let labels: Vec<String> = inputs.iter().map(|p| p.display().to_string()).collect();
    let reports: Vec<NormalizeReport<'_>> = labels
        .iter()
        .zip(&results)
        .zip(&outputs)
        .map(|((input, result), output)| NormalizeReport {
            input,
            result,
            output: output.as_deref(),
        })
        .collect();
    output::print_normalize_output(&reports);

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        return Err(format!("{failed} of {} images failed", results.len()).into());
    }
    Ok(())
}

async fn run_post_command(
    command: PostCommand,
    config: &AppConfig,
    store: &dyn PostStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = NormalizeSettings::from_config(&config.image);
    match command {
        PostCommand::Add(args) => {
            let composer =
                Composer::new(RustBackend::new(), settings, config.post.max_content_chars);

            if let Some(path) = &args.image {
                let raw = RawImage::from_path(path)?;
                composer.attach(raw).await.map_err(user_facing)?;
            } else if !args.paste.is_empty() {
                let items = args
                    .paste
                    .iter()
                    .map(|path| {
                        RawImage::from_path(path).map(|raw| ClipboardItem::new(raw.mime, raw.bytes))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if composer.paste(items).await.map_err(user_facing)?.is_none() {
                    warn!("pasted files contain no image; posting without one");
                }
            }

            let identity = Identity::new(args.email);
            let post = composer.submit(&args.content, Some(&identity), store)?;
            output::print_post_detail(&post);
        }
        PostCommand::List { user_email, json } => {
            let posts = store.list(user_email.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&posts)?);
            } else {
                output::print_post_list(&posts);
            }
        }
        PostCommand::Show { id } => {
            let post = store.get(&PostId::from(id.as_str()))?;
            output::print_post_detail(&post);
        }
        PostCommand::Update { id, content, image } => {
            if let Some(content) = &content {
                let mut report = ValidationReport::default();
                validate_content(content, config.post.max_content_chars, &mut report);
                if !report.is_valid() {
                    return Err(report.to_string().into());
                }
            }
            let image_url = match image {
                Some(path) => {
                    let raw = RawImage::from_path(&path)?;
                    let image = normalize_image(&RustBackend::new(), &raw, &settings)
                        .map_err(user_facing)?;
                    Some(image.to_data_uri())
                }
                None => None,
            };

            let update = PostUpdate { content, image_url };
            if update.is_empty() {
                return Err("nothing to update: pass --content or --image".into());
            }
            let post = store.update(&PostId::from(id.as_str()), update)?;
            output::print_post_detail(&post);
        }
        PostCommand::Delete { id } => {
            let post = store.delete(&PostId::from(id.as_str()))?;
            println!("Deleted {}", post.id);
        }
    }
    Ok(())
}

/// Lead with the short notice shown to users, keep the cause for context.
fn user_facing(error: ImageProcessingFailed) -> Box<dyn std::error::Error> {
    format!("{} ({error})", error.user_message()).into()
}
