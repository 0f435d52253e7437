//! Command-line front end: header dump, directory listing, file extraction.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use fatimg::{ExtendedInfo, FatVolume};

const COPY_BUF_SIZE: usize = 8 * 1024;

#[derive(Parser)]
#[command(name = "fatimg", about = "Read-only FAT16/FAT32 image inspector")]
struct Cli {
    /// Path to the raw filesystem image
    image: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print boot sector and variant-specific header fields
    Info,
    /// List the entries of a directory
    Ls {
        /// Backslash-delimited path, e.g. \INCLUDE
        #[arg(default_value = "\\")]
        path: String,
    },
    /// Stream a file's contents to stdout or a local file
    Cat {
        /// Backslash-delimited path, e.g. \INCLUDE\WIFI.H
        path: String,
        /// Write to FILE instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let file = File::open(&cli.image)
        .with_context(|| format!("cannot open {}", cli.image.display()))?;
    let mut volume = FatVolume::mount(BufReader::new(file))
        .with_context(|| format!("cannot mount {}", cli.image.display()))?;

    match cli.command {
        Commands::Info => print_info(&volume),
        Commands::Ls { path } => list_dir(&mut volume, &path)?,
        Commands::Cat { path, output } => extract(&mut volume, &path, output)?,
    }
    Ok(())
}

fn print_info<S>(volume: &FatVolume<S>) {
    let boot = volume.boot_sector();
    println!("Formatted OS name: {}", String::from_utf8_lossy(&boot.oem_name).trim_end());
    println!("Bytes per sector: {}", boot.bytes_per_sector);
    println!("Sectors per cluster: {}", boot.sectors_per_cluster);
    println!("Reserved sectors count: {}", boot.reserved_sectors);
    println!("Number of FATs: {}", boot.num_fats);
    println!("Root directory entries count: {}", boot.root_entry_count);
    println!("Media code: {:X}", boot.media_type);
    if boot.total_sectors_16 != 0 {
        println!("Total sectors count (small): {}", boot.total_sectors_16);
    } else {
        println!("Total sectors count (large): {}", boot.total_sectors_32);
    }
    println!();
    println!("FAT type: {}", volume.variant());
    match volume.extended_info() {
        ExtendedInfo::Fat16(info) => {
            println!("Volume serial number: {:X}", info.volume_id);
            println!("Volume label: {}", info.volume_label_str());
        }
        ExtendedInfo::Fat32(info) => {
            println!("FAT size in sectors: {}", info.fat_size_32);
            println!("Root directory cluster: {}", info.root_cluster);
            println!("Volume serial number: {:X}", info.tail.volume_id);
            println!("Volume label: {}", info.tail.volume_label_str());
        }
    }
}

fn list_dir<S: Read + Seek>(volume: &mut FatVolume<S>, path: &str) -> Result<()> {
    let dir = volume
        .lookup(path)
        .with_context(|| format!("cannot resolve {path}"))?;
    if !dir.is_dir() {
        bail!("{path} is not a directory");
    }
    for entry in volume.read_dir(&dir)? {
        if entry.is_dir() {
            println!("{:<14} <DIR>", entry.name());
        } else {
            println!("{:<14} {:>10}", entry.name(), entry.size);
        }
    }
    Ok(())
}

fn extract<S: Read + Seek>(
    volume: &mut FatVolume<S>,
    path: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let entry = volume
        .lookup(path)
        .with_context(|| format!("cannot resolve {path}"))?;
    if entry.is_dir() {
        bail!("{path} is a directory");
    }

    let mut sink: Box<dyn Write> = match &output {
        Some(target) => Box::new(
            File::create(target)
                .with_context(|| format!("cannot create {}", target.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    let mut cursor = volume.open(&entry);
    let mut buf = [0u8; COPY_BUF_SIZE];
    loop {
        let n = volume.read(&mut cursor, &mut buf)?;
        if n == 0 {
            break;
        }
        sink.write_all(&buf[..n])?;
    }
    sink.flush()?;
    Ok(())
}
