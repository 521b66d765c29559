use std::fmt::Display;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use interdigit::devices::fet::{DeviceShape, FetKind};
use interdigit::interdigitized::{
    two_nfet_interdigitized, two_pfet_interdigitized, two_transistor_interdigitized,
    DummySpec, InterdigitizedParams, RailClass, WrappedParams,
};
use interdigit::io::write_json;
use interdigit::layout::cell::Cell;
use interdigit::pdk::MappedPdk;
use log::info;
use sky130_mapped_pdk::{sky130, Sky130MappedPdk};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = "Generate the layout of an interdigitized transistor pair"
)]
pub struct Args {
    /// The output JSON file.
    #[arg(short, long)]
    pub output: PathBuf,
    /// The number of A-B column pairs.
    #[arg(short, long, default_value_t = 1)]
    pub numcols: usize,
    /// The device polarity, `nfet` or `pfet`.
    #[arg(short, long, default_value = "nfet")]
    pub kind: FetKind,
    /// Dummies at the row ends: `true`, `false`, or `left,right`.
    #[arg(short, long, default_value = "true")]
    pub dummy: DummySpec,
    /// Finger width, in nanometers.
    #[arg(long, default_value_t = 3000)]
    pub width: i64,
    /// Gate length, in nanometers.
    #[arg(long, default_value_t = 150)]
    pub length: i64,
    #[arg(long, default_value_t = 1)]
    pub fingers: u64,
    /// Terminal route width multiplier.
    #[arg(long, default_value_t = 1)]
    pub rmult: u64,
    /// Surround the pair with a well tie and substrate tap.
    #[arg(short, long)]
    pub wrapped: bool,
    /// Omit the well tie of the wrapped pair.
    #[arg(long, requires = "wrapped")]
    pub no_tie: bool,
    /// Omit the substrate tap of the wrapped pair.
    #[arg(long, requires = "wrapped")]
    pub no_substrate_tap: bool,
    /// A TOML rule deck to use instead of the bundled SKY130 deck.
    #[arg(long, requires = "layers")]
    pub rules: Option<PathBuf>,
    /// A CSV layer map to use instead of the bundled SKY130 layer map.
    #[arg(long, requires = "rules")]
    pub layers: Option<PathBuf>,
}

impl Args {
    fn shape(&self) -> DeviceShape {
        DeviceShape {
            width: self.width,
            length: self.length,
            fingers: self.fingers,
            rmult: self.rmult,
            ..Default::default()
        }
    }
}

/// What was generated, for printing.
#[derive(Debug, Clone)]
pub struct Summary {
    pub name: String,
    pub width: i64,
    pub height: i64,
    pub ports: usize,
    pub rails: Vec<String>,
    pub output: PathBuf,
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Generated {}", self.name)?;
        writeln!(f, "\tBounding box: {} x {} nm", self.width, self.height)?;
        writeln!(f, "\tPorts: {}", self.ports)?;
        for rail in self.rails.iter() {
            writeln!(f, "\t\t{rail}")?;
        }
        write!(f, "\tLayout: {:?}", self.output)
    }
}

/// Loads the rule deck and layer map given on the command line, if any.
fn load_pdk(args: &Args) -> anyhow::Result<Option<Sky130MappedPdk>> {
    match (&args.rules, &args.layers) {
        (Some(rules), Some(layers)) => Ok(Some(Sky130MappedPdk::from_files(rules, layers)?)),
        _ => Ok(None),
    }
}

fn generate(pdk: &dyn MappedPdk, args: &Args) -> anyhow::Result<Cell> {
    let cell = if args.wrapped {
        let params = WrappedParams {
            numcols: args.numcols,
            dummy: args.dummy,
            with_substrate_tap: !args.no_substrate_tap,
            with_tie: !args.no_tie,
            shape: args.shape(),
        };
        match args.kind {
            FetKind::Nfet => two_nfet_interdigitized(pdk, &params)?,
            FetKind::Pfet => two_pfet_interdigitized(pdk, &params)?,
        }
    } else {
        let params = InterdigitizedParams {
            numcols: args.numcols,
            kind: args.kind,
            dummy: args.dummy,
            shape: args.shape(),
        };
        two_transistor_interdigitized(pdk, &params)?
    };
    Ok(cell)
}

/// Generates the layout described by `args` and writes it to `args.output`.
pub fn run(args: &Args) -> anyhow::Result<Summary> {
    let custom = load_pdk(args).context("failed to load process rules")?;
    let pdk: &dyn MappedPdk = match custom.as_ref() {
        Some(pdk) => pdk,
        None => sky130().context("failed to load bundled process rules")?,
    };
    let cell = generate(pdk, args).context("failed to generate layout")?;
    write_json(pdk, &cell, &args.output).context("failed to write layout")?;
    info!("wrote {} to {:?}", cell.name(), args.output);

    let bbox = cell.bbox();
    let rails = RailClass::ALL
        .iter()
        .filter_map(|class| {
            let port = cell.port(&format!("{}_W", class.prefix())).ok()?;
            Some(format!(
                "{class}: {} track at {}",
                port.layer(),
                port.center()
            ))
        })
        .collect();
    Ok(Summary {
        name: cell.name().to_string(),
        width: bbox.width(),
        height: bbox.height(),
        ports: cell.port_map().len(),
        rails,
        output: args.output.clone(),
    })
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;

    fn parse(dir: &TempDir, extra: &[&str]) -> Args {
        let output = dir.path().join("out.json");
        let output = output.to_str().unwrap();
        let mut argv = vec!["idgen", "-o", output];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let dir = TempDir::new("idgen").unwrap();
        let args = parse(&dir, &[]);
        assert_eq!(args.numcols, 1);
        assert_eq!(args.kind, FetKind::Nfet);
        assert_eq!(args.dummy, DummySpec::Both(true));
        assert_eq!(args.shape(), DeviceShape::default());
    }

    #[test]
    fn test_run_core() {
        let dir = TempDir::new("idgen").unwrap();
        let args = parse(&dir, &["-n", "2", "--dummy", "true,false"]);
        let summary = run(&args).unwrap();
        assert_eq!(summary.rails.len(), 6);
        assert!(summary.name.contains("_c2_"));
        assert!(args.output.exists());
        assert!(summary.to_string().contains("A_source"));
    }

    #[test]
    fn test_run_wrapped_pfet() {
        let dir = TempDir::new("idgen").unwrap();
        let args = parse(&dir, &["-w", "-k", "pfet", "--no-tie"]);
        let summary = run(&args).unwrap();
        assert!(summary.name.starts_with("two_pfet_interdigitized"));
        assert!(summary.name.ends_with("_tie0_sub1"));
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let dir = TempDir::new("idgen").unwrap();
        let output = dir.path().join("out.json");
        let output = output.to_str().unwrap();
        assert!(Args::try_parse_from(["idgen", "-o", output, "-k", "cmos"]).is_err());
        assert!(Args::try_parse_from(["idgen", "-o", output, "--no-tie"]).is_err());

        let args = parse(&dir, &["-n", "0"]);
        assert!(run(&args).is_err());
    }
}
