use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use herd_core::{
    diagnose, welcome_message, BookingConstraint, BookingRequest, CurrentUser, NewAnimal,
    ProviderOrder, Species, TriageEngine, UserRole, SPECIALIZATIONS,
};
use herd_desk::{ClinicDesk, ConsultationInput, DeskConfig};
use herd_observability::{init_tracing, AppMetrics};
use herd_storage::Store;

#[derive(Debug, Parser)]
#[command(name = "herdcare")]
#[command(about = "HerdCare livestock triage and veterinarian booking")]
struct Cli {
    /// SQLite URL, e.g. sqlite://herdcare.db?mode=rwc. Uses memory when unset.
    #[arg(long, env = "HERDCARE_DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify a symptom description without touching storage.
    Diagnose { text: Vec<String> },
    Consult {
        #[arg(long)]
        animal_id: Option<String>,
        #[arg(long)]
        animal_name: Option<String>,
    },
    Vets {
        #[command(subcommand)]
        command: VetsCommand,
    },
    Book {
        #[arg(long)]
        vet: String,
        #[arg(long, default_value = "")]
        animal: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        slot: String,
    },
    Dates,
    Animals {
        #[command(subcommand)]
        command: AnimalsCommand,
    },
    Bookings {
        #[arg(long)]
        vet: String,
    },
    Serve,
}

#[derive(Debug, Subcommand)]
enum VetsCommand {
    Search {
        #[arg(long, default_value = "")]
        specialization: String,
        #[arg(long, default_value = "")]
        max_fee: String,
        #[arg(long, default_value = "")]
        location: String,
        /// listed, rating, fee or experience
        #[arg(long, default_value = "listed")]
        sort: String,
    },
    Specializations,
    Show {
        #[arg(long)]
        id: String,
    },
    /// Edit a listed veterinarian's fee, schedule or address.
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        fee: Option<u32>,
        /// Comma separated, e.g. "09:00 AM,02:00 PM"
        #[arg(long, value_delimiter = ',')]
        slots: Option<Vec<String>>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum AnimalsCommand {
    Add {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "cow")]
        species: String,
        #[arg(long)]
        breed: Option<String>,
        #[arg(long)]
        age: Option<String>,
        #[arg(long)]
        weight_kg: Option<f32>,
        #[arg(long)]
        dob: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },
    List {
        #[arg(long)]
        owner: String,
    },
    /// Show one animal with its bookings and consultations.
    Show {
        #[arg(long)]
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("herd_cli");
    let cli = Cli::parse();

    let mut config = DeskConfig::from_env();
    config.database_url = cli.database_url.clone();

    match cli.command {
        Command::Diagnose { text } => {
            let text = text.join(" ");
            anyhow::ensure!(!text.trim().is_empty(), "describe at least one symptom");
            println!("{}", serde_json::to_string_pretty(&diagnose(&text))?);
        }
        Command::Consult {
            animal_id,
            animal_name,
        } => {
            let desk = build_desk(&config).await?;
            run_consultation(desk, animal_id, animal_name.as_deref()).await?;
        }
        Command::Vets { command } => match command {
            VetsCommand::Search {
                specialization,
                max_fee,
                location,
                sort,
            } => {
                let order = ProviderOrder::parse(&sort).context("invalid --sort value")?;
                let constraint = BookingConstraint {
                    specialization,
                    max_fee,
                    location,
                };
                let desk = build_desk(&config).await?;
                let vets = desk.search_veterinarians(&constraint, order).await?;
                println!("{}", serde_json::to_string_pretty(&vets)?);
            }
            VetsCommand::Specializations => {
                println!("{}", serde_json::to_string_pretty(&SPECIALIZATIONS)?);
            }
            VetsCommand::Show { id } => {
                let desk = build_desk(&config).await?;
                let vet = desk.veterinarian(&id).await?;
                println!("{}", serde_json::to_string_pretty(&vet)?);
            }
            VetsCommand::Update {
                id,
                fee,
                slots,
                address,
                location,
            } => {
                let desk = build_desk(&config).await?;
                let mut vet = desk.veterinarian(&id).await?;
                if let Some(fee) = fee {
                    vet.appointment_fee = fee;
                }
                if let Some(slots) = slots {
                    vet.available_slots = slots;
                }
                if let Some(address) = address {
                    vet.clinic_address = address;
                }
                if let Some(location) = location {
                    vet.location = location;
                }
                let vet = desk.update_veterinarian(vet).await?;
                println!("{}", serde_json::to_string_pretty(&vet)?);
            }
        },
        Command::Book {
            vet,
            animal,
            date,
            slot,
        } => {
            let desk = build_desk(&config).await?;
            let booking = desk
                .book(BookingRequest {
                    veterinarian_id: vet,
                    animal_id: animal,
                    date,
                    time_slot: slot,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&booking)?);
        }
        Command::Dates => {
            let dates = herd_core::available_dates()
                .into_iter()
                .map(|date| date.format("%Y-%m-%d").to_string())
                .collect::<Vec<_>>();
            println!("{}", serde_json::to_string_pretty(&dates)?);
        }
        Command::Animals { command } => match command {
            AnimalsCommand::Add {
                owner,
                name,
                species,
                breed,
                age,
                weight_kg,
                dob,
                notes,
            } => {
                let species = Species::parse(&species).context("invalid --species value")?;
                let owner = CurrentUser {
                    name: owner.clone(),
                    id: owner,
                    role: UserRole::Farmer,
                };
                let desk = build_desk(&config).await?;
                let animal = desk
                    .register_animal(
                        &owner,
                        NewAnimal {
                            name,
                            species,
                            breed,
                            age,
                            weight_kg,
                            date_of_birth: dob,
                            notes,
                        },
                    )
                    .await?;
                println!("{}", serde_json::to_string_pretty(&animal)?);
            }
            AnimalsCommand::List { owner } => {
                let desk = build_desk(&config).await?;
                let animals = desk.list_animals(&owner).await?;
                println!("{}", serde_json::to_string_pretty(&animals)?);
            }
            AnimalsCommand::Show { id } => {
                let desk = build_desk(&config).await?;
                let profile = desk.animal_profile(&id).await?;
                println!("{}", serde_json::to_string_pretty(&profile)?);
            }
        },
        Command::Bookings { vet } => {
            let desk = build_desk(&config).await?;
            let bookings = desk.bookings_for_veterinarian(&vet).await?;
            println!("{}", serde_json::to_string_pretty(&bookings)?);
        }
        Command::Serve => herd_api::serve(&config).await?,
    }

    Ok(())
}

async fn run_consultation(
    desk: ClinicDesk<Store>,
    animal_id: Option<String>,
    animal_name: Option<&str>,
) -> Result<()> {
    println!("{}", welcome_message(animal_name));
    println!("(type 'exit' to quit)");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let reply = desk
            .consult(ConsultationInput {
                animal_id: animal_id.clone(),
                text: message.to_string(),
            })
            .await?;

        println!("\n{}\n", reply.reply_text);
    }

    Ok(())
}

async fn build_desk(config: &DeskConfig) -> Result<ClinicDesk<Store>> {
    let store = config
        .open_store()
        .await
        .context("failed opening herdcare store")?;

    let desk = ClinicDesk::new(
        TriageEngine::standard(),
        Arc::new(store),
        AppMetrics::shared(),
    );
    if config.seed_directory {
        desk.seed_directory_if_empty().await?;
    }

    Ok(desk)
}
