//! Command-line definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use scaffold_core::form::{FieldName, InsideType, Location};
use scaffold_core::ExportFormat;

#[derive(Parser, Debug)]
#[command(name = "scaffold", version, about = "Scaffolding volume calculator")]
pub struct Cli {
    #[arg(long, global = true, help = "Calculation service base URL (overrides config and SCAFFOLD_API_URL)")]
    pub api_url: Option<String>,
    #[arg(long, global = true, help = "Token file (defaults to the platform config directory)")]
    pub token_file: Option<PathBuf>,
    #[arg(long, global = true, help = "Launch URL carrying token, userId/paymentId or error parameters")]
    pub url: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a calculation and print the result
    Calculate(CalculateArgs),
    /// Run a calculation and write the report document
    Export {
        #[command(flatten)]
        calc: CalculateArgs,
        #[arg(long, value_enum, default_value_t = FormatArg::Word)]
        format: FormatArg,
        #[arg(long, default_value = ".", help = "Directory the report is written to")]
        out_dir: PathBuf,
    },
    /// Manage the stored access token
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
    /// Exchange payment ids for an access token
    Redeem {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        payment_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TokenCommands {
    Set { token: String },
    Show,
    Clear,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CalculateArgs {
    #[arg(long, value_enum)]
    pub location: Option<LocationArg>,
    #[arg(long, value_enum)]
    pub inside_type: Option<InsideTypeArg>,
    #[arg(long, help = "Building height H, m")]
    pub height: Option<String>,
    #[arg(long, help = "Facade length L, m")]
    pub length: Option<String>,
    #[arg(long, help = "Room width A, m")]
    pub room_width: Option<String>,
    #[arg(long, help = "Room length B, m")]
    pub room_length: Option<String>,
    #[arg(long, help = "Scaffolding width, m")]
    pub scaffold_width: Option<String>,
    #[arg(long, help = "Total wall length, m")]
    pub walls_length: Option<String>,
    #[arg(long, help = "Access token (saved for later runs)")]
    pub token: Option<String>,
    #[arg(long, help = "Print the result as JSON")]
    pub json: bool,
    #[arg(long, help = "Never ask for missing values")]
    pub no_prompt: bool,
}

impl CalculateArgs {
    /// Value given on the command line for a field
    pub fn field(&self, name: FieldName) -> Option<&str> {
        let value = match name {
            FieldName::Height => &self.height,
            FieldName::Length => &self.length,
            FieldName::RoomWidth => &self.room_width,
            FieldName::RoomLength => &self.room_length,
            FieldName::ScaffoldWidth => &self.scaffold_width,
            FieldName::WallsLength => &self.walls_length,
        };
        value.as_deref()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LocationArg {
    Outside,
    Inside,
}

impl From<LocationArg> for Location {
    fn from(value: LocationArg) -> Self {
        match value {
            LocationArg::Outside => Location::Outside,
            LocationArg::Inside => Location::Inside,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum InsideTypeArg {
    Ceiling,
    Walls,
}

impl From<InsideTypeArg> for InsideType {
    fn from(value: InsideTypeArg) -> Self {
        match value {
            InsideTypeArg::Ceiling => InsideType::Ceiling,
            InsideTypeArg::Walls => InsideType::Walls,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Word,
    Pdf,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Word => ExportFormat::Word,
            FormatArg::Pdf => ExportFormat::Pdf,
        }
    }
}
