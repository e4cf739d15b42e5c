use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;

mod catalog;
mod client;
mod config;
mod models;
mod playlist;


use crate::catalog::{Catalog, sync_catalog};
use crate::client::SpotifyClient;
use crate::config::{Config, load_api_config, load_config};
use crate::playlist::{
    GeneratedPlaylist, PlaylistAssembler, PlaylistConfig, PlaylistGenerator, PlaylistSink,
};

#[derive(Parser)]
#[command(name = "liked-shuffle")]
#[command(about = "Weighted playlists from your liked tracks")]
#[command(version)]
struct Args {
    /// Path to the local track catalog (overrides CATALOG_PATH)
    #[arg(long = "catalog", global = true)]
    catalog: Option<PathBuf>,

    /// Print playlists to stdout instead of uploading them
    #[arg(short = 'd', long = "dry-run", global = true)]
    dry_run: bool,

    /// Quiet mode - reduce output verbosity
    #[arg(short = 'q', long = "quiet", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pull liked tracks into the local catalog, keeping existing ratings
    Sync,
    /// Upload an unweighted shuffle of the whole catalog
    Shuffle {
        #[arg(short = 'n', long = "length", default_value_t = playlist::DEFAULT_TARGET_LENGTH)]
        length: usize,
        #[arg(long = "name", default_value = "Liked Shuffle all")]
        name: String,
        /// Sync the catalog first
        #[arg(long = "sync")]
        sync: bool,
    },
    /// Generate weighted playlists from a recipe file
    Generate {
        /// JSON array of playlist recipes; the built-in recipe is used when omitted
        #[arg(short = 'c', long = "config")]
        config_file: Option<String>,
        /// Seed the random generator for a reproducible run
        #[arg(long = "seed")]
        seed: Option<u64>,
        /// Publish a short playlist when the cooldown cannot be satisfied
        #[arg(long = "allow-short")]
        allow_short: bool,
        /// Sync the catalog first
        #[arg(long = "sync")]
        sync: bool,
    },
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

/// Load the catalog, syncing it first when asked to or when it is empty
fn prepare_catalog(config: &Config, sync: bool) -> Result<Catalog> {
    let catalog = Catalog::load(&config.catalog_path)?;
    if !sync && !catalog.is_empty() {
        return Ok(catalog);
    }

    println!("Syncing with liked songs...");
    let client = SpotifyClient::new(load_api_config()?);
    let synced = sync_catalog(&client, &catalog, &config.audio_features)?;
    synced.save(&config.catalog_path)?;
    println!(
        "Catalog now holds {} tracks ({} new)",
        synced.len(),
        synced.len() - catalog.len()
    );
    Ok(synced)
}

fn print_playlist(playlist: &GeneratedPlaylist, catalog: &Catalog) {
    println!(
        "\nDRY RUN: Playlist '{}' ({}/{} tracks, {} distinct)",
        playlist.name,
        playlist.track_ids.len(),
        playlist.target_length,
        playlist.distinct_tracks()
    );
    println!("   {}", playlist.description);
    for (i, id) in playlist.track_ids.iter().enumerate() {
        match catalog.get(id) {
            Some(track) => println!(
                "     {}. {} [{}/10] | ID: {}",
                i + 1,
                track.display_name(),
                track.rating.value(),
                id
            ),
            None => println!("     {}. ID: {}", i + 1, id),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.quiet);

    let mut config = load_config();
    if let Some(path) = args.catalog {
        config.catalog_path = path;
    }
    debug!("Using catalog at {}", config.catalog_path.display());

    let (playlists, catalog): (Vec<Result<GeneratedPlaylist, (String, String)>>, Catalog) =
        match args.command {
            Command::Sync => {
                prepare_catalog(&config, true)?;
                return Ok(());
            }
            Command::Shuffle { length, name, sync } => {
                let catalog = prepare_catalog(&config, sync)?;
                let mut rng = StdRng::from_entropy();
                let playlist = PlaylistGenerator::shuffle_all(&catalog, &name, length, &mut rng);
                (vec![Ok(playlist)], catalog)
            }
            Command::Generate {
                config_file,
                seed,
                allow_short,
                sync,
            } => {
                let recipes = match &config_file {
                    Some(path) => {
                        if !std::path::Path::new(path).exists() {
                            eprintln!("Error: Playlist configuration file '{path}' not found.");
                            return Err(anyhow::anyhow!("Configuration file '{}' not found", path));
                        }
                        let recipes = PlaylistConfig::load_all_from_file(path)
                            .map_err(|e| anyhow::anyhow!("Failed to load playlist configurations: {}", e))?;
                        info!("Loaded {} playlist configurations from {path}", recipes.len());
                        recipes
                    }
                    None => vec![PlaylistConfig::default()],
                };

                let catalog = prepare_catalog(&config, sync)?;
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                let now = Utc::now();

                let playlists = recipes
                    .into_iter()
                    .map(|recipe| {
                        let name = recipe.name.clone();
                        let generator = PlaylistGenerator::new(recipe);
                        let result = if allow_short {
                            generator.generate_allowing_short(&catalog, now, &mut rng)
                        } else {
                            generator.generate(&catalog, now, &mut rng)
                        };
                        result.map_err(|e| (name, e.to_string()))
                    })
                    .collect();
                (playlists, catalog)
            }
        };

    let sink = if args.dry_run {
        None
    } else {
        Some(SpotifyClient::new(load_api_config()?))
    };

    // (name, success, message) per playlist, summarised at the end
    let mut creation_results = Vec::new();

    for result in playlists {
        let playlist = match result {
            Ok(playlist) => playlist,
            Err((name, message)) => {
                eprintln!("✗ Failed to generate '{name}': {message}");
                creation_results.push((name, false, message));
                continue;
            }
        };

        match &sink {
            None => {
                print_playlist(&playlist, &catalog);
                creation_results.push((
                    playlist.name.clone(),
                    true,
                    "Dry run - not uploaded".to_string(),
                ));
            }
            Some(client) => {
                println!("\nCreating playlist '{}'...", playlist.name);
                let sink: &dyn PlaylistSink = client;
                match PlaylistAssembler::publish(
                    sink,
                    &playlist.name,
                    &playlist.description,
                    &playlist.track_ids,
                ) {
                    Ok(handle) => {
                        println!("✓ Created '{}': {}", playlist.name, handle);
                        creation_results.push((playlist.name.clone(), true, handle));
                    }
                    Err(e) => {
                        eprintln!("✗ Failed to create playlist '{}': {e:#}", playlist.name);
                        creation_results.push((playlist.name.clone(), false, format!("Error: {e}")));
                    }
                }
            }
        }
    }

    println!("\n=== PLAYLIST CREATION SUMMARY ===");
    let successful_creations = creation_results
        .iter()
        .filter(|(_, success, _)| *success)
        .count();
    let total_attempts = creation_results.len();
    println!("Successfully created {successful_creations}/{total_attempts} playlists");
    for (name, success, message) in &creation_results {
        let status = if *success { "✓" } else { "✗" };
        println!("{status} {name}: {message}");
    }

    if successful_creations == 0 {
        return Err(anyhow::anyhow!("Playlist creation failed"));
    }
    Ok(())
}
