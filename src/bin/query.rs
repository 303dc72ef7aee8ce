//! ipdb-query: CLI tool for looking up addresses in IPDB files.

use clap::{Parser, Subcommand};
use ipdb::{Reader, ReaderConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::{Instant, UNIX_EPOCH};

#[derive(Parser)]
#[command(name = "ipdb-query")]
#[command(author = "Kaitu.io")]
#[command(version = "0.1.0")]
#[command(about = "Look up IP addresses in IPDB geolocation files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up one or more addresses
    Lookup {
        /// Database file
        #[arg(short, long)]
        db: PathBuf,

        /// Language code
        #[arg(short, long, default_value = "CN")]
        language: String,

        /// Print field names with values as JSON
        #[arg(short, long)]
        map: bool,

        /// Memory-map the file instead of reading it
        #[arg(long)]
        mmap: bool,

        /// Addresses to look up
        #[arg(required = true)]
        ips: Vec<String>,
    },

    /// Show database metadata
    Info {
        /// Database file
        #[arg(short, long)]
        db: PathBuf,
    },

    /// Measure lookup throughput over random IPv4 addresses
    Bench {
        /// Database file
        #[arg(short, long)]
        db: PathBuf,

        /// Number of lookups
        #[arg(short, long, default_value_t = 100_000)]
        count: usize,

        /// Language code
        #[arg(short, long, default_value = "CN")]
        language: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Lookup {
            db,
            language,
            map,
            mmap,
            ips,
        } => lookup(&db, &language, map, mmap, &ips),
        Commands::Info { db } => info(&db),
        Commands::Bench {
            db,
            count,
            language,
        } => bench(&db, count, &language),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn lookup(
    db: &PathBuf,
    language: &str,
    map: bool,
    mmap: bool,
    ips: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let config = if mmap {
        ReaderConfig::mmap()
    } else {
        ReaderConfig::default()
    };
    let reader = Reader::open_with_config(db, &config)?;

    for ip in ips {
        if map {
            match reader.lookup_map(ip, language)? {
                Some(fields) => println!("{}\t{}", ip, serde_json::to_string(&fields)?),
                None => println!("{}\tnot found", ip),
            }
        } else {
            match reader.lookup(ip, language)? {
                Some(values) => println!("{}\t{}", ip, values.join("\t")),
                None => println!("{}\tnot found", ip),
            }
        }
    }

    Ok(())
}

fn info(db: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let reader = Reader::open(db)?;
    let meta = reader.metadata();

    println!("{}", serde_json::to_string_pretty(meta)?);

    let build = reader
        .build_time()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    println!("Build:       {}", build);
    println!("IPv4:        {}", reader.supports_v4());
    println!("IPv6:        {}", reader.supports_v6());
    println!("File size:   {} bytes", reader.database().len());
    println!("SHA-256:     {}", reader.fingerprint());

    Ok(())
}

fn bench(db: &PathBuf, count: usize, language: &str) -> Result<(), Box<dyn std::error::Error>> {
    let reader = Reader::open_with_config(db, &ReaderConfig::unshared())?;

    // Fixed seed for reproducibility
    let mut rng = StdRng::seed_from_u64(42);
    let addrs: Vec<IpAddr> = (0..count)
        .map(|_| IpAddr::V4(Ipv4Addr::from(rng.random::<u32>())))
        .collect();

    let mut found = 0usize;
    let start = Instant::now();
    for addr in &addrs {
        if reader.lookup_addr(*addr, language)?.is_some() {
            found += 1;
        }
    }
    let elapsed = start.elapsed();

    let per_lookup = elapsed.as_nanos() as f64 / count.max(1) as f64;
    println!("Lookups:     {}", count);
    println!("Found:       {}", found);
    println!("Elapsed:     {:.3?}", elapsed);
    println!("Per lookup:  {:.1} ns", per_lookup);
    if per_lookup > 0.0 {
        println!("Throughput:  {:.0} lookups/s", 1e9 / per_lookup);
    }

    Ok(())
}
