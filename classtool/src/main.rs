mod dump;
mod mapping;
mod pool;
mod style;

use anyhow::{bail, Context, Result};
use classfile::{rename::rename, Class};
use mapping::{parse_rule, Mapping};
use style::Painter;
use std::{
    fs,
    path::{Path, PathBuf},
};
use structopt::StructOpt;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Debug, StructOpt)]
#[structopt(name = "classtool", about = "Inspect, verify and rename JVM class files")]
struct Opt {
    /// Log more (-v for info, -vv for debug, -vvv for trace)
    #[structopt(short, long, parse(from_occurrences), global = true)]
    verbose: u8,

    /// Disable coloured output
    #[structopt(long, global = true)]
    no_color: bool,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Print the declarations of a class file
    Dump {
        #[structopt(parse(from_os_str))]
        file: PathBuf,

        /// Print the constant pool instead
        #[structopt(short, long)]
        constant_pool: bool,
    },

    /// Rewrite binary class names throughout a class file
    Rename {
        #[structopt(parse(from_os_str))]
        input: PathBuf,

        #[structopt(short, long, parse(from_os_str))]
        output: PathBuf,

        /// Rename one class: `a/b/C=x/y/Z`
        #[structopt(long = "class", parse(try_from_str = parse_rule))]
        classes: Vec<(String, String)>,

        /// Move a package and its sub-packages: `a.b=x.y`
        #[structopt(long = "package", parse(try_from_str = parse_rule))]
        packages: Vec<(String, String)>,

        /// File with one `class F=T` or `package F=T` rule per line
        #[structopt(long, parse(from_os_str))]
        mapping_file: Option<PathBuf>,
    },

    /// Check that class files survive a decode/encode round trip
    Verify {
        #[structopt(parse(from_os_str), required = true)]
        files: Vec<PathBuf>,
    },
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn dump(file: &Path, constant_pool: bool, painter: Painter) -> Result<()> {
    let bytes = read(file)?;
    let class =
        Class::parse(&bytes).with_context(|| format!("failed to decode {}", file.display()))?;

    if constant_pool {
        print!("{}", dump::dump_pool(&class, painter));
    } else {
        print!("{}", dump::dump_class(&class, painter)?);
    }
    Ok(())
}

fn rename_file(input: &Path, output: &Path, mapping: &Mapping) -> Result<()> {
    if mapping.is_empty() {
        bail!("no renaming rules given, use --class, --package or --mapping-file");
    }

    let bytes = read(input)?;
    let class =
        Class::parse(&bytes).with_context(|| format!("failed to decode {}", input.display()))?;

    let renamed = rename(&class, |name| mapping.map(name))
        .with_context(|| format!("failed to rename {}", input.display()))?;
    let encoded = renamed
        .class
        .to_bytes()
        .with_context(|| format!("failed to encode {}", input.display()))?;
    fs::write(output, &encoded)
        .with_context(|| format!("failed to write {}", output.display()))?;

    if renamed.changed {
        println!(
            "{} -> {}: {} renamed to {}",
            input.display(),
            output.display(),
            class.this_class,
            renamed.class.this_class
        );
    } else {
        println!("{} -> {}: nothing to rename", input.display(), output.display());
    }
    Ok(())
}

/// Decodes, re-encodes and decodes again. Returns whether the aggregates
/// matched.
fn verify(file: &Path, painter: Painter) -> Result<bool> {
    let bytes = read(file)?;
    let class =
        Class::parse(&bytes).with_context(|| format!("failed to decode {}", file.display()))?;
    let encoded = class
        .to_bytes()
        .with_context(|| format!("failed to encode {}", file.display()))?;
    let again = Class::parse(&encoded)
        .with_context(|| format!("failed to decode re-encoded {}", file.display()))?;

    if again != class {
        println!("{}: {}", file.display(), painter.paint("error", "MISMATCH"));
        return Ok(false);
    }

    let note = if encoded == bytes {
        "identical bytes"
    } else {
        "equivalent, bytes differ"
    };
    println!("{}: ok ({})", file.display(), note);
    Ok(true)
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let painter = Painter {
        color: !opt.no_color,
    };

    match opt.command {
        Command::Dump {
            file,
            constant_pool,
        } => dump(&file, constant_pool, painter),

        Command::Rename {
            input,
            output,
            classes,
            packages,
            mapping_file,
        } => {
            let mut mapping = Mapping::default();
            if let Some(path) = &mapping_file {
                mapping.load(path)?;
            }
            for (from, to) in classes {
                mapping.add_class(from, to);
            }
            for (from, to) in packages {
                mapping.add_package(from, to);
            }
            rename_file(&input, &output, &mapping)
        }

        Command::Verify { files } => {
            let mut failed = 0;
            for file in &files {
                if !verify(file, painter)? {
                    failed += 1;
                }
            }
            if failed > 0 {
                bail!("{} of {} class file(s) did not round trip", failed, files.len());
            }
            Ok(())
        }
    }
}
