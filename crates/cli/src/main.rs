use anyhow::Context;
use carelink_core::{
    CoreConfig, CoreError, IdentifierQueryValidator, InMemoryRecordStore, KnownIdentifierTypes,
    MutationMode, PatientMappingService, RecordId, RegistrationService, ResourceMappers,
    ValidationError,
};
use clap::{Parser, Subcommand};
use fhir::Patient;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "carelink")]
#[command(about = "Care Connect patient record mapping and validation CLI")]
struct Cli {
    /// YAML configuration file
    #[arg(long, env = "CARELINK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// YAML record fixture used as the record store
    #[arg(long, env = "CARELINK_RECORDS", global = true)]
    records: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate identifier search parameters (system|value)
    ValidateIdentifier {
        /// Use the practitioner search policy instead of the patient one
        #[arg(long)]
        practitioner: bool,
        /// Raw identifier parameters; exactly one is accepted
        identifiers: Vec<String>,
    },
    /// Enhance a JSON resource with the stored record it identifies
    Enhance {
        /// Path to the resource JSON
        file: PathBuf,
    },
    /// Extract a record from a JSON resource and print it as YAML
    ToRecord {
        /// Path to the resource JSON
        file: PathBuf,
        /// Record id to stamp (a new one is generated if omitted)
        #[arg(long)]
        id: Option<String>,
    },
    /// Validate a Patient registration without storing it
    Validate {
        /// Path to the Patient JSON
        file: PathBuf,
        /// Apply the temporary registration rules
        #[arg(long)]
        temporary: bool,
    },
    /// Register a Patient and write the record fixture back
    Register {
        /// Path to the Patient JSON
        file: PathBuf,
        /// Register as a temporary patient
        #[arg(long)]
        temporary: bool,
    },
    /// Fetch a stored Patient by record id
    Fetch {
        /// Record id
        id: String,
    },
}

/// Services built once from configuration.
struct App {
    cfg: Arc<CoreConfig>,
    store: Arc<InMemoryRecordStore>,
}

impl App {
    fn load(cli: &Cli) -> anyhow::Result<Self> {
        let cfg = match &cli.config {
            Some(path) => CoreConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => CoreConfig::default(),
        }
        .with_records_path(cli.records.clone());

        let store = match cfg.records_path() {
            Some(path) => InMemoryRecordStore::load(path)
                .with_context(|| format!("loading records {}", path.display()))?,
            None => InMemoryRecordStore::new(),
        };
        let records = store.len().context("counting stored records")?;
        tracing::debug!(records, "record store ready");

        Ok(Self {
            cfg: Arc::new(cfg),
            store: Arc::new(store),
        })
    }

    fn identifier_validator(&self, practitioner: bool) -> IdentifierQueryValidator {
        let directory = Arc::new(KnownIdentifierTypes::from_config(&self.cfg));
        if practitioner {
            IdentifierQueryValidator::for_practitioner_search(directory)
        } else {
            IdentifierQueryValidator::for_patient_search(directory)
        }
    }

    fn mappers(&self) -> ResourceMappers {
        ResourceMappers::new(PatientMappingService::new(self.store.clone()))
    }

    fn registration(&self) -> RegistrationService {
        RegistrationService::new(self.store.clone())
    }

    fn persist(&self) -> anyhow::Result<()> {
        if let Some(path) = self.cfg.records_path() {
            self.store
                .write_to(path)
                .with_context(|| format!("writing records {}", path.display()))?;
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("carelink=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let app = App::load(&cli)?;

    match run(&app, cli.command) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(CoreError::Validation(err)) => {
            print_outcome(&err)?;
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}

fn run(app: &App, command: Commands) -> Result<(), CoreError> {
    match command {
        Commands::ValidateIdentifier {
            practitioner,
            identifiers,
        } => {
            let token = app.identifier_validator(practitioner).validate(identifiers.as_slice())?;
            println!("system: {}\nvalue: {}", token.system, token.value);
        }
        Commands::Enhance { file } => {
            let json = read_input(&file)?;
            println!("{}", app.mappers().enhance_json(&json)?);
        }
        Commands::ToRecord { file, id } => {
            let json = read_input(&file)?;
            let id = match id {
                Some(raw) => RecordId::parse(&raw)
                    .map_err(|e| CoreError::InvalidInput(format!("record id: {e}")))?,
                None => RecordId::new(),
            };
            print!("{}", app.mappers().to_record_yaml(&json, id)?);
        }
        Commands::Validate { file, temporary } => {
            let resource = Patient::parse(&read_input(&file)?)?;
            app.registration()
                .validate_mutation(&resource, mode(temporary))?;
            println!("valid");
        }
        Commands::Register { file, temporary } => {
            let resource = Patient::parse(&read_input(&file)?)?;
            let registered = app.registration().register(resource, mode(temporary))?;
            app.persist()
                .map_err(|e| CoreError::InvalidInput(format!("{e:#}")))?;
            println!("{}", Patient::render(&registered)?);
        }
        Commands::Fetch { id } => {
            let resource = app.registration().fetch(&id)?;
            println!("{}", Patient::render(&resource)?);
        }
    }
    Ok(())
}

fn mode(temporary: bool) -> MutationMode {
    if temporary {
        MutationMode::TemporaryRegistration
    } else {
        MutationMode::Registration
    }
}

fn read_input(path: &Path) -> Result<String, CoreError> {
    Ok(std::fs::read_to_string(path)?)
}

fn print_outcome(err: &ValidationError) -> anyhow::Result<()> {
    tracing::debug!(kind = %err.kind(), "request rejected");
    let outcome = serde_json::to_string_pretty(&err.to_operation_outcome())?;
    println!("{outcome}");
    Ok(())
}
