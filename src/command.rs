//! The operator's command language.

use std::str::FromStr;

use color_eyre::eyre::{Result, eyre};

use crate::sampler::Family;

pub const DEFAULT_CPU_FILE: &str = "cpu_stats.csv";
pub const DEFAULT_VM_FILE: &str = "vm_stats.csv";

pub const USAGE: &str = "\
Usage:
 *** Collecting ***
  s: Start collecting data
  e: End collecting data
 *** Plotting ***
  ls <category:cpu/vmstat>: List items in <category>
  p <item>: Plot data for <item>, <item> should be in the format <category>.<key> (e.g. cpu.user, vmstat.pgpgin)
  pd <item>: Plot data for <item> with values as difference from the first value
 *** Data management ***
  export [abs|diff] [file1 file2]: Export data to files (default: cpu_stats.csv, vm_stats.csv)
  import [file1 file2]: Import data from files (default: cpu_stats.csv, vm_stats.csv)
 *** Special plotting ***
  p2 <file1 file2> <item>: Plot data for <item> from <file1> and <file2>
 *** Others ***
  q: Quit the program
  h: Help message";

/// Why an input line is not a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unbalanced quotes")]
    UnbalancedQuotes,
    #[error("Empty command")]
    Empty,
    #[error("Category not provided")]
    MissingCategory,
    #[error("Item not provided")]
    MissingItem,
    #[error("Usage: p2 <file1> <file2> <item>")]
    CompareUsage,
    #[error("Unknown command: {0}")]
    Unknown(String),
}

impl CommandError {
    /// Whether the help text should follow the error.
    pub fn shows_usage(&self) -> bool {
        matches!(self, CommandError::Unknown(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    List {
        family: String,
    },
    Plot {
        item: String,
    },
    PlotDelta {
        item: String,
    },
    Export {
        mode: String,
        cpu_file: String,
        vm_file: String,
    },
    Import {
        cpu_file: String,
        vm_file: String,
    },
    Compare {
        file_a: String,
        file_b: String,
        item: String,
    },
    Quit,
    Help,
}

impl FromStr for Command {
    type Err = CommandError;

    /// Parse one input line. Arguments are split shell-style, so quoted
    /// file names may contain spaces.
    fn from_str(line: &str) -> Result<Self, CommandError> {
        let words = shlex::split(line).ok_or(CommandError::UnbalancedQuotes)?;
        let (name, args) = words.split_first().ok_or(CommandError::Empty)?;
        let arg = |i: usize| args.get(i).cloned();
        let command = match name.as_str() {
            "s" => Command::Start,
            "e" => Command::Stop,
            "ls" => Command::List {
                family: arg(0).ok_or(CommandError::MissingCategory)?,
            },
            "p" => Command::Plot {
                item: arg(0).ok_or(CommandError::MissingItem)?,
            },
            "pd" => Command::PlotDelta {
                item: arg(0).ok_or(CommandError::MissingItem)?,
            },
            "export" => Command::Export {
                mode: arg(0).unwrap_or_else(|| "abs".to_string()),
                cpu_file: arg(1).unwrap_or_else(|| DEFAULT_CPU_FILE.to_string()),
                vm_file: arg(2).unwrap_or_else(|| DEFAULT_VM_FILE.to_string()),
            },
            "import" => Command::Import {
                cpu_file: arg(0).unwrap_or_else(|| DEFAULT_CPU_FILE.to_string()),
                vm_file: arg(1).unwrap_or_else(|| DEFAULT_VM_FILE.to_string()),
            },
            "p2" => match args {
                [file_a, file_b, item, ..] => Command::Compare {
                    file_a: file_a.clone(),
                    file_b: file_b.clone(),
                    item: item.clone(),
                },
                _ => return Err(CommandError::CompareUsage),
            },
            "q" => Command::Quit,
            "h" => Command::Help,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

/// Split `family.key` into its parts.
pub fn split_item(item: &str) -> Result<(Family, &str)> {
    let (family, key) = item
        .split_once('.')
        .ok_or(eyre!("Item must look like <category>.<key>, got {:?}", item))?;
    Ok((family.parse()?, key))
}
