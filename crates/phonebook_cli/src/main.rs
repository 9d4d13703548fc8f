//! Terminal front end for the phonebook.
//!
//! # Responsibility
//! - Map `add`/`list`/`delete` onto the same form and service the mobile
//!   bridge uses.
//! - Keep stdout deterministic so the output can be scripted.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use phonebook_core::db::open_db;
use phonebook_core::{
    default_log_level, init_logging, Person, PersonForm, PersonService, SqlitePersonRepository,
    SubmitOutcome,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "phonebook",
    version,
    about = "Keep a local list of names and phone numbers"
)]
struct Cli {
    #[arg(
        long,
        env = "PHONEBOOK_DB_PATH",
        default_value = "phonebook.db",
        value_name = "PATH",
        help = "SQLite database file"
    )]
    db: PathBuf,

    #[arg(
        long,
        value_name = "DIR",
        help = "Write rolling log files to DIR (logging is off when omitted)"
    )]
    log_dir: Option<PathBuf>,

    #[arg(
        long,
        requires = "log_dir",
        value_name = "LEVEL",
        help = "trace|debug|info|warn|error (needs --log-dir)"
    )]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a person, or rename the entry that already has PHONE.
    Add { name: String, phone: String },
    /// Show every entry in the order it was first added.
    List {
        #[arg(long, help = "Print entries as a JSON array")]
        json: bool,
    },
    /// Remove the entry with PHONE. Unknown numbers are ignored.
    Delete { phone: String },
    /// Print the core library version.
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        let log_dir = absolutize(log_dir)?;
        init_logging(level, &log_dir.to_string_lossy()).map_err(|err| anyhow!(err))?;
    }

    let stdout = io::stdout();
    run(&cli, &mut stdout.lock())
}

fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    match &cli.command {
        Command::Add { name, phone } => with_service(&cli.db, |service| {
            let mut form = PersonForm::new();
            form.set_name(name.as_str());
            form.set_phone_number(phone.as_str());
            match form.submit(service)? {
                SubmitOutcome::Saved(person) => writeln!(out, "saved {}", person.phone_number)?,
                SubmitOutcome::Ignored => writeln!(out, "ignored: name and phone are required")?,
            }
            Ok(())
        }),
        Command::List { json } => with_service(&cli.db, |service| {
            let people = service.list_all()?;
            if *json {
                serde_json::to_writer_pretty(&mut *out, &people)?;
                writeln!(out)?;
            } else {
                write_table(out, &people)?;
            }
            Ok(())
        }),
        Command::Delete { phone } => with_service(&cli.db, |service| {
            service.delete(phone)?;
            writeln!(out, "deleted {phone}")?;
            Ok(())
        }),
        Command::Version => {
            writeln!(out, "{}", phonebook_core::core_version())?;
            Ok(())
        }
    }
}

fn with_service<T>(
    db: &Path,
    f: impl FnOnce(&PersonService<SqlitePersonRepository<'_>>) -> Result<T>,
) -> Result<T> {
    let conn = open_db(db)
        .with_context(|| format!("failed to open phonebook at `{}`", db.display()))?;
    let service = PersonService::new(SqlitePersonRepository::try_new(&conn)?);
    f(&service)
}

fn write_table(out: &mut impl Write, people: &[Person]) -> io::Result<()> {
    let width = people
        .iter()
        .map(|person| person.name.chars().count())
        .chain(std::iter::once("Name".len()))
        .max()
        .unwrap_or(0);

    writeln!(out, "{:<width$}  Phone", "Name")?;
    for person in people {
        writeln!(out, "{:<width$}  {}", person.name, person.phone_number)?;
    }
    Ok(())
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

#[cfg(test)]
mod tests {
    use super::{run, Cli};
    use clap::Parser;
    use std::path::Path;

    fn exec(db: &Path, args: &[&str]) -> String {
        let db = db.to_str().unwrap();
        let argv = ["phonebook", "--db", db]
            .into_iter()
            .chain(args.iter().copied());
        let cli = Cli::try_parse_from(argv).unwrap();
        let mut out = Vec::new();
        run(&cli, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn add_then_list_prints_table() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("cli.db");

        assert_eq!(exec(&db, &["add", "Ana", "111"]), "saved 111\n");
        assert_eq!(exec(&db, &["add", "Ana Maria", "111"]), "saved 111\n");

        let table = exec(&db, &["list"]);
        assert_eq!(table, "Name       Phone\nAna Maria  111\n");
    }

    #[test]
    fn add_with_empty_name_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("cli.db");

        let output = exec(&db, &["add", "", "111"]);
        assert!(output.starts_with("ignored"));
        assert_eq!(exec(&db, &["list", "--json"]), "[]\n");
    }

    #[test]
    fn add_keeps_whitespace_in_phone_number() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("cli.db");

        assert_eq!(exec(&db, &["add", "Ana", "111 "]), "saved 111 \n");
        let listed: Vec<phonebook_core::Person> =
            serde_json::from_str(&exec(&db, &["list", "--json"])).unwrap();
        assert_eq!(listed, vec![phonebook_core::Person::new("Ana", "111 ")]);
    }

    #[test]
    fn log_level_without_log_dir_is_rejected() {
        let err = Cli::try_parse_from(["phonebook", "--log-level", "debug", "list"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let cli = Cli::try_parse_from([
            "phonebook",
            "--log-dir",
            "/tmp/phonebook-logs",
            "--log-level",
            "debug",
            "list",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn delete_then_list_json_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("cli.db");

        exec(&db, &["add", "Bea", "222"]);
        assert_eq!(exec(&db, &["delete", "222"]), "deleted 222\n");
        assert_eq!(exec(&db, &["delete", "222"]), "deleted 222\n");

        let listed: Vec<phonebook_core::Person> =
            serde_json::from_str(&exec(&db, &["list", "--json"])).unwrap();
        assert!(listed.is_empty());
    }

    #[test]
    fn version_does_not_touch_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("never-created.db");

        assert!(!exec(&db, &["version"]).trim().is_empty());
        assert!(!db.exists());
    }
}
