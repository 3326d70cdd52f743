use anyhow::{bail, Context as _};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mtarc::{
    archive::{
        Archive, ArchiveEntry, ArchiveOptions, CompressionScheme, FlagsLayout, LegacyArchive,
        LegacyOptions, Quality, Version,
    },
    blowfish::Blowfish,
    file_types::FileTypes,
    guess_format, hashing,
    prelude::*,
    resource::{ItemList, ItemListOptions},
    BString, ByteSlice as _, Endian, FileFormat,
};
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, BufWriter, Seek as _, SeekFrom, Write as _},
    path::{Path, PathBuf},
};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "mtarc", version, about = "Pack, unpack, and inspect MT Framework archives")]
struct Cli {
    /// Show debug messages. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pack the files under one or more directories into an archive
    Pack(PackArgs),
    /// Extract every entry of an archive
    Unpack(UnpackArgs),
    /// Print the header and index of an archive
    List(ListArgs),
    /// Export an item list to JSON
    Items(ItemsArgs),
}

#[derive(Args)]
struct KeyArgs {
    /// The cipher key for encrypted archives
    #[arg(long, env = "MTARC_KEY", hide_env_values = true)]
    key: Option<String>,

    /// The byte order of the two words in each cipher block. Archives made by the PC tools use little.
    #[arg(long, env = "MTARC_CIPHER_ENDIAN", value_enum, default_value_t = EndianArg::Big)]
    cipher_endian: EndianArg,

    /// The payload compression scheme
    #[arg(long, env = "MTARC_COMPRESSION", value_enum, default_value_t = CompressionArg::None)]
    compression: CompressionArg,

    /// The table of known file types
    #[arg(long, env = "MTARC_FILE_TYPES")]
    file_types: Option<PathBuf>,
}

#[derive(Args)]
struct PackArgs {
    output: PathBuf,

    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Encrypt the archive. Requires a key.
    #[arg(short, long)]
    encrypt: bool,

    #[arg(long, env = "MTARC_ENDIAN", value_enum, default_value_t = EndianArg::Little)]
    endian: EndianArg,

    /// The index record revision: 7, 8, or 17
    #[arg(long, env = "MTARC_VERSION", default_value_t = 7)]
    version: u16,

    #[command(flatten)]
    settings: KeyArgs,
}

#[derive(Args)]
struct UnpackArgs {
    input: PathBuf,

    /// Defaults to the input path without its extension
    output: Option<PathBuf>,

    /// Replace files that already exist
    #[arg(short, long)]
    overwrite: bool,

    /// Read the archive with the legacy codec, using the given flags layout
    #[arg(long, env = "MTARC_FLAGS_LAYOUT", value_enum)]
    legacy: Option<FlagsLayoutArg>,

    #[command(flatten)]
    settings: KeyArgs,
}

#[derive(Args)]
struct ListArgs {
    input: PathBuf,

    #[arg(long, env = "MTARC_FLAGS_LAYOUT", value_enum)]
    legacy: Option<FlagsLayoutArg>,

    #[command(flatten)]
    settings: KeyArgs,
}

#[derive(Args)]
struct ItemsArgs {
    input: PathBuf,

    /// Defaults to standard output
    output: Option<PathBuf>,

    /// Skip detection and read with this byte order
    #[arg(long, value_enum)]
    endian: Option<EndianArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum EndianArg {
    Little,
    Big,
}

impl From<EndianArg> for Endian {
    fn from(value: EndianArg) -> Self {
        match value {
            EndianArg::Little => Self::Little,
            EndianArg::Big => Self::Big,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CompressionArg {
    None,
    Zlib,
    ZlibHeaderless,
    Xcompress,
}

impl From<CompressionArg> for CompressionScheme {
    fn from(value: CompressionArg) -> Self {
        match value {
            CompressionArg::None => Self::None,
            CompressionArg::Zlib => Self::Zlib,
            CompressionArg::ZlibHeaderless => Self::ZlibHeaderless,
            CompressionArg::Xcompress => Self::XCompress,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FlagsLayoutArg {
    Lower,
    Upper,
}

impl From<FlagsLayoutArg> for FlagsLayout {
    fn from(value: FlagsLayoutArg) -> Self {
        match value {
            FlagsLayoutArg::Lower => Self::Lower,
            FlagsLayoutArg::Upper => Self::Upper,
        }
    }
}

impl KeyArgs {
    fn archive_options(&self) -> anyhow::Result<ArchiveOptions> {
        let mut builder = ArchiveOptions::builder()
            .cipher_endian(self.cipher_endian.into())
            .compression(self.compression.into());
        if let Some(key) = &self.key {
            builder = builder.cipher(Blowfish::new(key.as_bytes()).context("invalid cipher key")?);
        }
        Ok(builder.build())
    }

    fn file_types(&self) -> anyhow::Result<FileTypes> {
        let mut types = FileTypes::new();
        if let Some(path) = &self.file_types {
            types
                .load_from_path(path)
                .with_context(|| format!("failed to load file types from {}", path.display()))?;
            tracing::debug!(count = types.len(), "loaded file types");
        } else {
            tracing::warn!("no file types table given, so every type is unknown");
        }
        Ok(types)
    }
}

enum OpenedArchive {
    Current(Archive, ArchiveOptions),
    Legacy(LegacyArchive, LegacyOptions),
}

impl OpenedArchive {
    fn open(path: &Path, legacy: Option<FlagsLayoutArg>, settings: &KeyArgs) -> anyhow::Result<Self> {
        let opened = if let Some(layout) = legacy {
            let options = LegacyOptions::builder()
                .compression(settings.compression.into())
                .flags_layout(layout.into())
                .build();
            let archive = LegacyArchive::read(path, &options)
                .with_context(|| format!("failed to read archive: {}", path.display()))?;
            Self::Legacy(archive, options)
        } else {
            let options = settings.archive_options()?;
            let archive = Archive::read(path, &options)
                .with_context(|| format!("failed to read archive: {}", path.display()))?;
            Self::Current(archive, options)
        };
        Ok(opened)
    }

    fn entries(&self) -> &[ArchiveEntry] {
        match self {
            Self::Current(archive, _) => &archive.entries,
            Self::Legacy(archive, _) => &archive.entries,
        }
    }

    fn read_entry(&self, stream: &mut File, entry: &ArchiveEntry) -> anyhow::Result<Vec<u8>> {
        let data = match self {
            Self::Current(archive, options) => archive.read_entry(stream, entry, options)?,
            Self::Legacy(archive, options) => archive.read_entry(stream, entry, options)?,
        };
        Ok(data)
    }
}

struct PendingEntry {
    path: PathBuf,
    name: BString,
    type_hash: u32,
}

fn pack(args: &PackArgs) -> anyhow::Result<()> {
    let options = args.settings.archive_options()?;
    if args.encrypt && args.settings.key.is_none() {
        bail!("cannot enable encryption with no cipher key");
    }

    let types = args.settings.file_types()?;
    let mut pending: BTreeMap<String, PendingEntry> = BTreeMap::new();
    for root in &args.inputs {
        for entry in WalkDir::new(root) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(root)?;
            let key = relative
                .to_str()
                .with_context(|| format!("file name is not valid unicode: {}", relative.display()))?
                .to_lowercase();
            if let Some(previous) = pending.get(&key) {
                tracing::info!(
                    "ignoring duplicate of {}: {} (previously added from {})",
                    relative.display(),
                    entry.path().display(),
                    previous.path.display()
                );
                continue;
            }

            let extension = relative
                .extension()
                .map(|x| format!(".{}", x.to_string_lossy()))
                .unwrap_or_default();
            let type_hash = types.resolve_extension(&extension).with_context(|| {
                format!("unknown file extension \"{extension}\": {}", relative.display())
            })?;
            let mut name = BString::from(relative.with_extension("").to_string_lossy().as_bytes());
            hashing::normalize_name(&mut name);

            pending.insert(
                key,
                PendingEntry {
                    path: entry.into_path(),
                    name,
                    type_hash,
                },
            );
        }
    }

    let mut archive = Archive {
        endian: args.endian.into(),
        version: Version::try_from(args.version)?,
        encrypted: args.encrypt,
        entries: Vec::with_capacity(pending.len()),
    };

    let mut output = BufWriter::new(
        File::create(&args.output)
            .with_context(|| format!("failed to create archive: {}", args.output.display()))?,
    );
    output.seek(SeekFrom::Start(Archive::header_size(pending.len()).try_into()?))?;

    let total = pending.len();
    for (i, entry) in pending.into_values().enumerate() {
        let data = fs::read(&entry.path)
            .with_context(|| format!("failed to read file: {}", entry.path.display()))?;
        let stored = archive
            .pack_entry(&data, &options)
            .with_context(|| format!("failed to pack file: {}", entry.path.display()))?;
        let offset = output.stream_position()?;
        output.write_all(&stored)?;

        tracing::debug!("[{}/{total}] {}", i + 1, entry.name);
        archive.entries.push(ArchiveEntry {
            name: entry.name,
            type_hash: entry.type_hash,
            offset: offset.try_into()?,
            compressed_size: stored.len().try_into()?,
            uncompressed_size: data.len().try_into()?,
            quality: Quality::default(),
        });
    }

    output.seek(SeekFrom::Start(0))?;
    archive.write(&mut output, &options)?;
    output.flush()?;

    tracing::info!(
        "packed {} entries into {}",
        archive.entries.len(),
        args.output.display()
    );
    Ok(())
}

fn unpack(args: &UnpackArgs) -> anyhow::Result<()> {
    let types = args.settings.file_types()?;
    let archive = OpenedArchive::open(&args.input, args.legacy, &args.settings)?;
    let root = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension(""));

    let mut stream = File::open(&args.input)?;
    let total = archive.entries().len();
    let mut written = 0usize;
    for (i, entry) in archive.entries().iter().enumerate() {
        let file_name = types.file_name(entry.name.as_bstr(), entry.type_hash);
        let path = file_name
            .to_str_lossy()
            .split('\\')
            .fold(root.clone(), |path, part| path.join(part));
        if !args.overwrite && path.exists() {
            tracing::debug!("skipping existing file: {}", path.display());
            continue;
        }

        tracing::debug!("[{}/{total}] {file_name}", i + 1);
        let data = archive
            .read_entry(&mut stream, entry)
            .with_context(|| format!("failed to read entry: {}", entry.name))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)
            .with_context(|| format!("failed to write file: {}", path.display()))?;
        written += 1;
    }

    tracing::info!("extracted {written} of {total} entries to {}", root.display());
    Ok(())
}

fn list(args: &ListArgs) -> anyhow::Result<()> {
    let mut file = File::open(&args.input)
        .with_context(|| format!("failed to open file: {}", args.input.display()))?;
    let (format, endian) = guess_format(&mut file)
        .with_context(|| format!("unrecognized file format: {}", args.input.display()))?;
    println!("format: {format:?}, {endian:?} endian");

    if format == FileFormat::ItemList {
        let list = ItemList::read(args.input.as_path(), &ItemListOptions::default())?;
        println!("{} items", list.items.len());
        return Ok(());
    }

    let types = args.settings.file_types()?;
    let archive = OpenedArchive::open(&args.input, args.legacy, &args.settings)?;
    if let OpenedArchive::Current(archive, _) = &archive {
        println!("version: {:?}", archive.version);
    }

    println!(
        "{:<64} {:>10} {:>10} {:>10}  {:<8} type",
        "name", "offset", "stored", "size", "quality"
    );
    for entry in archive.entries() {
        let type_name = types
            .name(entry.type_hash)
            .map_or_else(|| format!("{:08X}", entry.type_hash), str::to_owned);
        println!(
            "{:<64} {:>#10x} {:>10} {:>10}  {:<8} {type_name}",
            entry.name.to_str_lossy(),
            entry.offset,
            entry.compressed_size,
            entry.uncompressed_size,
            format!("{:?}", entry.quality),
        );
    }
    Ok(())
}

fn items(args: &ItemsArgs) -> anyhow::Result<()> {
    let mut builder = ItemListOptions::builder();
    if let Some(endian) = args.endian {
        builder = builder.endian(endian.into());
    }

    let list = ItemList::read(args.input.as_path(), &builder.build())
        .with_context(|| format!("failed to read item list: {}", args.input.display()))?;
    tracing::info!(count = list.items.len(), endian = ?list.endian, "read item list");

    match &args.output {
        Some(path) => {
            let mut output = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut output, &list)?;
            output.flush()?;
        }
        None => {
            let mut output = io::stdout().lock();
            serde_json::to_writer_pretty(&mut output, &list)?;
            writeln!(output)?;
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Pack(args) => pack(args),
        Command::Unpack(args) => unpack(args),
        Command::List(args) => list(args),
        Command::Items(args) => items(args),
    }
}
