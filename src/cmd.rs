use std::path::PathBuf;

use clap::Parser;

use crate::{
    app::approot::{run_app, Options},
    util::rw::{DescribedReader, WriteHandle},
};

const ABOUT: &str = "Interactive Brokers activity statement parser and tax summary tool";

fn get_long_about() -> String {
    "\
Reads an Interactive Brokers activity statement exported as CSV, and reports
its trades, dividends, withholding taxes, interest, fees, open positions, cash
and net asset value, along with any problems found while reading it.

Unless --no-tax is given, a cantonal tax summary (income tax, wealth tax and
foreign tax credit) is computed in the base currency. Tax rates, currency
rates and the symbol to country table are read from the file given with
--config, else from ~/.ibtax/config.json if it exists. Otherwise the
Basel-Landschaft defaults are used.

Set TRACE (eg. TRACE=ibtax::statement=debug) to log parsing decisions to stderr."
        .to_string()
}

#[derive(Parser, Debug)]
#[command(version = crate::app::APP_VERSION,
          about = ABOUT, long_about = get_long_about())]
pub struct Args {
    /// Activity statement CSV file
    #[arg(required = true)]
    pub statement_file: PathBuf,

    /// Print verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Tax configuration JSON file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Tax year. Defaults to the year the statement period ends in.
    #[arg(short = 'y', long)]
    pub tax_year: Option<i32>,

    /// Only parse and report the statement, without computing taxes
    #[arg(long, default_value_t = false)]
    pub no_tax: bool,

    /// Print all digits in output values
    #[arg(long, default_value_t = false)]
    pub print_full_values: bool,

    /// Write output as CSV to the specified directory.
    #[arg(short = 'd', long)]
    pub csv_output_dir: Option<PathBuf>,

    /// Also write all tables to this Excel workbook
    #[arg(long)]
    pub xlsx: Option<PathBuf>,

    /// Also write all tables to this PDF report
    #[arg(long)]
    pub pdf: Option<PathBuf>,

    /// Also export the parsed statement, diagnostics and tax summary as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,
}

impl Args {
    fn options(&self) -> Options {
        Options {
            render_full_values: self.print_full_values,
            csv_output_dir: self.csv_output_dir.clone(),
            xlsx_path: self.xlsx.clone(),
            pdf_path: self.pdf.clone(),
            json_path: self.json.clone(),
            config_path: self.config.clone(),
            tax_year: self.tax_year,
            no_tax: self.no_tax,
        }
    }
}

/// Returned Err is for exit code determination only.
pub fn run_with_args(args: Args, out_w: WriteHandle, err_w: WriteHandle) -> Result<(), ()> {
    crate::log::set_verbose(args.verbose);
    let options = args.options();
    let reader = DescribedReader::from_file_path(args.statement_file);
    run_app(reader, options, out_w, err_w).map(|_| ())
}

pub fn command_main() {
    let args = Args::parse();
    crate::tracing::setup_tracing(if args.verbose { Some("ibtax=info") } else { None });

    let res = run_with_args(
        args,
        WriteHandle::stdout_write_handle(),
        WriteHandle::stderr_write_handle(),
    );
    if res.is_err() {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::Args;

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "ibtax", "stmt.csv", "--no-tax", "-y", "2024", "--xlsx", "out.xlsx",
            "--print-full-values",
        ])
        .unwrap();
        assert_eq!(args.statement_file, PathBuf::from("stmt.csv"));
        let opts = args.options();
        assert!(opts.no_tax);
        assert!(opts.render_full_values);
        assert_eq!(opts.tax_year, Some(2024));
        assert_eq!(opts.xlsx_path, Some(PathBuf::from("out.xlsx")));
        assert_eq!(opts.csv_output_dir, None);

        assert!(Args::try_parse_from(["ibtax"]).is_err());
    }
}
