use anyhow::Result;
use clap::{Parser, Subcommand};

use khinsider_client::{AppState, Category, KhinsiderClient};

#[derive(Parser)]
#[command(name = "khinsider-client", about = "Browse KHInsider soundtrack listings")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List albums from a category page
    Albums {
        #[arg(long, value_enum, default_value = "latest")]
        category: Category,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// List the tracks of an album page
    Tracks { url: String },
    /// List the cover image links of an album page
    Covers { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let state = AppState::init();
    let client = KhinsiderClient::new(&state.current())?;

    match cli.command {
        Command::Albums { category, limit } => {
            for album in client.fetch_albums_by_category(category, limit).await {
                println!(
                    "{} [{}] ({}, {})\n    {}",
                    album.title, album.platform, album.album_type, album.year, album.url
                );
            }
        }
        Command::Tracks { url } => {
            for (i, track) in client.fetch_album_tracks(&url).await.iter().enumerate() {
                match &track.duration {
                    Some(d) => println!("{}. {} - {}", i + 1, track.name, d),
                    None => println!("{}. {}", i + 1, track.name),
                }
            }
        }
        Command::Covers { url } => {
            for cover in client.fetch_album_covers(&url).await {
                println!("{}", cover);
            }
        }
    }
    Ok(())
}
