use clap::Parser;

/// For summary and analysis of a vegetation survey file.
///
/// The data of each survey is in its own sheet. The name of the site is in cell B2 and
/// the date of the survey in cell D2 of each sheet. The species follow from row 4.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The Excel (.xlsx) file containing the survey data. The summarized copy is
    /// written next to it, with the '_summarized' suffix.
    #[clap(short, long, value_parser)]
    pub data: String,
}
