//! Admin command-line host for provincial official records.
//!
//! # Responsibility
//! - Translate command-line input into core forms and queries.
//! - Render listings as JSON and action outcomes as one status line.

use clap::{Parser, Subcommand};
use log::error;
use officials_core::db::migrations::{apply_migrations, current_version, revert_to};
use officials_core::db::open_db;
use officials_core::{
    init_logging, AppConfig, OfficialForm, OfficialId, OfficialListQuery, OfficialService,
    OfficialServiceError, Position, SqliteOfficialRepository, UploadedImage,
};
use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tempfile::TempPath;

#[derive(Debug, Parser)]
#[command(name = "officials", version, about = "Manage provincial official records")]
struct Cli {
    /// TOML config file; defaults and `OFFICIALS_*` env vars apply without it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List officials, optionally filtered.
    List {
        #[arg(long)]
        position: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Create an official.
    Create {
        #[command(flatten)]
        fields: FormArgs,
    },
    /// Update an existing official.
    Update {
        id: OfficialId,
        #[command(flatten)]
        fields: FormArgs,
        /// Drop the stored profile image (ignored when --image is given).
        #[arg(long)]
        remove_image: bool,
    },
    /// Delete an official and its profile image.
    Delete { id: OfficialId },
    /// Print the selectable positions.
    Positions,
    /// Apply or revert schema migrations.
    Migrate {
        #[command(subcommand)]
        direction: MigrateDirection,
    },
}

#[derive(Debug, clap::Args)]
struct FormArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    position: Option<String>,
    /// Image file to copy into the upload directory; the original stays put.
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum MigrateDirection {
    Up,
    Down {
        /// Target schema version; 0 drops every table.
        #[arg(long, default_value_t = 0)]
        to: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    let config = AppConfig::load(cli.config.as_deref())?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let mut conn = open_db(&config.database_path)?;

    if let Command::Migrate { direction } = &cli.command {
        match direction {
            MigrateDirection::Up => apply_migrations(&mut conn)?,
            MigrateDirection::Down { to } => revert_to(&mut conn, *to)?,
        }
        println!("schema version {}", current_version(&conn)?);
        return Ok(ExitCode::SUCCESS);
    }

    let service = OfficialService::new(SqliteOfficialRepository::new(&conn), config.image_store());
    let outcome = match cli.command {
        Command::List { position, search } => {
            let listing = service.list(&OfficialListQuery { position, search })?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
            return Ok(ExitCode::SUCCESS);
        }
        Command::Positions => {
            for position in Position::ALL {
                println!("{position}");
            }
            return Ok(ExitCode::SUCCESS);
        }
        Command::Create { fields } => {
            let (form, _staged) = fields.into_form(false)?;
            service.store(form)
        }
        Command::Update {
            id,
            fields,
            remove_image,
        } => {
            let (form, _staged) = fields.into_form(remove_image)?;
            service.update(id, form)
        }
        Command::Delete { id } => service.destroy(id),
        Command::Migrate { .. } => return Ok(ExitCode::SUCCESS),
    };

    match outcome {
        Ok(outcome) => {
            println!("{} (id={})", outcome.message, outcome.official_id);
            Ok(ExitCode::SUCCESS)
        }
        Err(OfficialServiceError::Validation(errors)) => {
            for (field, message) in errors.iter() {
                eprintln!("{field}: {message}");
            }
            Ok(ExitCode::from(2))
        }
        Err(err) => Err(err.into()),
    }
}

impl FormArgs {
    /// Builds the core form. `--image` is staged as a temporary copy for the
    /// core to move; the returned guard removes it if left unclaimed.
    fn into_form(self, remove_image: bool) -> io::Result<(OfficialForm, Option<TempPath>)> {
        let mut staged = None;
        let profile_image = match self.image {
            Some(path) => {
                let original_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let copy = tempfile::Builder::new()
                    .prefix("officials-upload-")
                    .tempfile()?
                    .into_temp_path();
                std::fs::copy(&path, &copy)?;
                let upload = UploadedImage::new(copy.to_path_buf(), original_name);
                staged = Some(copy);
                Some(upload)
            }
            None => None,
        };
        let form = OfficialForm {
            name: self.name,
            position: self.position,
            profile_image,
            remove_image,
        };
        Ok((form, staged))
    }
}
